//! Atom-level SMILES tokenizer with a fixed vocabulary.
//!
//! Tokenization is a single regex pass: bracket atoms, two-letter elements
//! and `%nn` ring closures match as one token each, and a trailing catch-all
//! keeps the tokenizer total over arbitrary input (unrecognized characters
//! become single-character tokens that map to `<UNK>` at id conversion).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Numeric token id
///
/// Signed because label tensors carry a negative ignore value alongside
/// ordinary ids.
pub type TokenId = i64;

/// SMILES token pattern: bracket atoms, two-letter elements, aromatic
/// two-letter elements, organic-subset atoms, `%nn` ring closures, digits,
/// bond/branch symbols, then a catch-all for anything else
static SMILES_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\[[^\]]+\]|Br|Cl|se|te|[BCNOPSFI]|[bcnops]|%\d{2}|\d|[-=#$:+\\/().~@?><*%]|.)")
        .expect("SMILES token pattern is valid")
});

/// Non-special vocabulary entries: atoms, bonds, branches, ring digits and a
/// few bracket atoms common in drug-like molecules
const CHEM_TOKENS: &[&str] = &[
    // organic subset
    "B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I",
    // aromatic atoms
    "b", "c", "n", "o", "p", "s", "se", "te",
    // bonds, branches, misc symbols
    "-", "=", "#", "$", ":", "+", ".", "/", "\\", "~", "@", "?", ">", "<", "*", "%", "(", ")",
    // ring digits
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
    // frequent bracket atoms
    "[nH]", "[C@H]", "[C@@H]", "[O-]", "[N+]", "[NH+]", "[NH2+]", "[NH3+]", "[Na+]", "[Cl-]",
];

/// String forms of the reserved special tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialTokens {
    pub pad: String,
    pub unk: String,
    pub bos: String,
    pub eos: String,
    pub mask: String,
    pub sep: String,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            pad: "<PAD>".to_string(),
            unk: "<UNK>".to_string(),
            bos: "<BOS>".to_string(),
            eos: "<EOS>".to_string(),
            mask: "<MASK>".to_string(),
            sep: "<SEP>".to_string(),
        }
    }
}

/// Regex SMILES tokenizer with reserved special ids
///
/// Special tokens always occupy ids 0..6 in the order pad, unk, bos, eos,
/// mask, sep; the chemical vocabulary follows in sorted order.
#[derive(Debug, Clone)]
pub struct SmilesTokenizer {
    vocab: Vec<String>,
    stoi: HashMap<String, TokenId>,
    special: SpecialTokens,
    chem_ids: Vec<TokenId>,
}

impl Default for SmilesTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SmilesTokenizer {
    /// Build the tokenizer with the built-in chemical vocabulary
    #[must_use]
    pub fn new() -> Self {
        Self::with_extra_tokens(&[])
    }

    /// Build the tokenizer with extra vocabulary entries (for example
    /// corpus-specific bracket atoms)
    #[must_use]
    pub fn with_extra_tokens(extra: &[&str]) -> Self {
        let special = SpecialTokens::default();
        let mut vocab: Vec<String> = vec![
            special.pad.clone(),
            special.unk.clone(),
            special.bos.clone(),
            special.eos.clone(),
            special.mask.clone(),
            special.sep.clone(),
        ];

        let mut chem: Vec<String> =
            CHEM_TOKENS.iter().chain(extra.iter()).map(|t| (*t).to_string()).collect();
        chem.sort();
        chem.dedup();
        chem.retain(|t| !vocab.contains(t));
        vocab.extend(chem);

        let stoi: HashMap<String, TokenId> = vocab
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as TokenId))
            .collect();
        let chem_ids: Vec<TokenId> = (6..vocab.len() as TokenId).collect();

        Self { vocab, stoi, special, chem_ids }
    }

    /// The compiled token-matching pattern
    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &SMILES_TOKEN_PATTERN
    }

    /// Split one string into vocabulary tokens
    #[must_use]
    pub fn tokenize_one(&self, smiles: &str) -> Vec<String> {
        SMILES_TOKEN_PATTERN.find_iter(smiles).map(|m| m.as_str().to_string()).collect()
    }

    /// Tokenize every string in a batch independently
    #[must_use]
    pub fn tokenize_batch(&self, batch: &[String]) -> Vec<Vec<String>> {
        batch.iter().map(|s| self.tokenize_one(s)).collect()
    }

    /// Convert token sequences to id sequences; unknown tokens map to unk
    #[must_use]
    pub fn convert_tokens_to_ids(&self, sequences: &[Vec<String>]) -> Vec<Vec<TokenId>> {
        sequences
            .iter()
            .map(|tokens| {
                tokens
                    .iter()
                    .map(|t| self.stoi.get(t).copied().unwrap_or_else(|| self.unk_id()))
                    .collect()
            })
            .collect()
    }

    /// Id for a token, if in the vocabulary
    #[must_use]
    pub fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.stoi.get(token).copied()
    }

    /// Token for an id, if in range
    #[must_use]
    pub fn id_to_token(&self, id: TokenId) -> Option<&str> {
        usize::try_from(id).ok().and_then(|i| self.vocab.get(i)).map(String::as_str)
    }

    /// Ids of the non-special vocabulary entries
    #[must_use]
    pub fn chem_token_ids(&self) -> &[TokenId] {
        &self.chem_ids
    }

    /// Vocabulary size including special tokens
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    #[must_use]
    pub fn pad_id(&self) -> TokenId {
        0
    }

    #[must_use]
    pub fn unk_id(&self) -> TokenId {
        1
    }

    #[must_use]
    pub fn bos_id(&self) -> TokenId {
        2
    }

    #[must_use]
    pub fn eos_id(&self) -> TokenId {
        3
    }

    #[must_use]
    pub fn mask_id(&self) -> TokenId {
        4
    }

    #[must_use]
    pub fn sep_id(&self) -> TokenId {
        5
    }

    #[must_use]
    pub fn pad_token(&self) -> &str {
        &self.special.pad
    }

    #[must_use]
    pub fn unk_token(&self) -> &str {
        &self.special.unk
    }

    /// Beginning-of-sequence marker in string form
    #[must_use]
    pub fn begin_token(&self) -> &str {
        &self.special.bos
    }

    /// End-of-sequence marker in string form
    #[must_use]
    pub fn end_token(&self) -> &str {
        &self.special.eos
    }

    #[must_use]
    pub fn mask_token(&self) -> &str {
        &self.special.mask
    }

    #[must_use]
    pub fn sep_token(&self) -> &str {
        &self.special.sep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_chain() {
        let tokenizer = SmilesTokenizer::new();
        assert_eq!(tokenizer.tokenize_one("CCO"), vec!["C", "C", "O"]);
    }

    #[test]
    fn test_tokenize_aromatic_ring() {
        let tokenizer = SmilesTokenizer::new();
        let tokens = tokenizer.tokenize_one("c1ccccc1");
        assert_eq!(tokens, vec!["c", "1", "c", "c", "c", "c", "c", "1"]);
    }

    #[test]
    fn test_tokenize_two_letter_elements() {
        let tokenizer = SmilesTokenizer::new();
        assert_eq!(tokenizer.tokenize_one("ClCBr"), vec!["Cl", "C", "Br"]);
    }

    #[test]
    fn test_tokenize_bracket_atom_as_one_token() {
        let tokenizer = SmilesTokenizer::new();
        let tokens = tokenizer.tokenize_one("C[NH3+]C");
        assert_eq!(tokens, vec!["C", "[NH3+]", "C"]);
    }

    #[test]
    fn test_tokenize_percent_ring_closure() {
        let tokenizer = SmilesTokenizer::new();
        let tokens = tokenizer.tokenize_one("C%12CC%12");
        assert_eq!(tokens, vec!["C", "%12", "C", "C", "%12"]);
    }

    #[test]
    fn test_unknown_token_maps_to_unk_id() {
        let tokenizer = SmilesTokenizer::new();
        let tokens = tokenizer.tokenize_one("C!C");
        assert_eq!(tokens[1], "!");
        let ids = tokenizer.convert_tokens_to_ids(&[tokens]);
        assert_eq!(ids[0][1], tokenizer.unk_id());
    }

    #[test]
    fn test_special_ids_are_reserved() {
        let tokenizer = SmilesTokenizer::new();
        assert_eq!(tokenizer.token_to_id("<PAD>"), Some(tokenizer.pad_id()));
        assert_eq!(tokenizer.token_to_id("<MASK>"), Some(tokenizer.mask_id()));
        assert_eq!(tokenizer.id_to_token(tokenizer.bos_id()), Some("<BOS>"));
        assert!(!tokenizer.chem_token_ids().contains(&tokenizer.mask_id()));
    }

    #[test]
    fn test_id_round_trip() {
        let tokenizer = SmilesTokenizer::new();
        let tokens = tokenizer.tokenize_one("CC(=O)O");
        let ids = tokenizer.convert_tokens_to_ids(&[tokens.clone()]);
        let back: Vec<&str> =
            ids[0].iter().map(|&id| tokenizer.id_to_token(id).unwrap()).collect();
        assert_eq!(back, tokens.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_extra_tokens_extend_vocabulary() {
        let base = SmilesTokenizer::new();
        let extended = SmilesTokenizer::with_extra_tokens(&["[Fe+2]"]);
        assert_eq!(extended.vocab_size(), base.vocab_size() + 1);
        assert!(extended.token_to_id("[Fe+2]").is_some());
    }
}
