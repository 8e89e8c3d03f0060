//! Per-side token preparation: tokenize, optionally mask, truncate.

use rand::Rng;

use crate::masker::TokenMasker;
use crate::tokenizer::SmilesTokenizer;

/// Tokens plus the masker's per-token activity mask for one batch side
#[derive(Debug, Clone)]
pub struct PreparedTokens {
    pub tokens: Vec<Vec<String>>,
    /// `true` marks a masked position when masking was applied, otherwise
    /// every position is `true` ("real content")
    pub mask: Vec<Vec<bool>>,
}

/// Prepares one side (encoder or decoder) of a batch
#[derive(Debug)]
pub struct SequencePreparer<'a> {
    tokenizer: &'a SmilesTokenizer,
    masker: &'a TokenMasker,
    seq_length: usize,
}

impl<'a> SequencePreparer<'a> {
    pub fn new(tokenizer: &'a SmilesTokenizer, masker: &'a TokenMasker, seq_length: usize) -> Self {
        Self { tokenizer, masker, seq_length }
    }

    /// Tokenize a string batch, mask if requested, and enforce the length limit
    ///
    /// Each string is tokenized independently. Without masking the activity
    /// mask is all-true. Sequences are truncated, never padded: padding is
    /// deferred to collation because encoder and decoder add different
    /// marker tokens first.
    pub fn prepare<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        batch: &[String],
        apply_masking: bool,
    ) -> PreparedTokens {
        let tokens = self.tokenizer.tokenize_batch(batch);

        let (tokens, mask) = if apply_masking {
            let mut masked_tokens = Vec::with_capacity(tokens.len());
            let mut masks = Vec::with_capacity(tokens.len());
            for sequence in &tokens {
                let (masked, token_mask) = self.masker.mask(rng, self.tokenizer, sequence);
                masked_tokens.push(masked);
                masks.push(token_mask);
            }
            (masked_tokens, masks)
        } else {
            let masks = tokens.iter().map(|ts| vec![true; ts.len()]).collect();
            (tokens, masks)
        };

        self.check_seq_len(tokens, mask)
    }

    /// Truncate every sequence (tokens and mask in lock-step) when the batch
    /// maximum exceeds the configured limit
    fn check_seq_len(
        &self,
        mut tokens: Vec<Vec<String>>,
        mut mask: Vec<Vec<bool>>,
    ) -> PreparedTokens {
        let longest = tokens.iter().map(Vec::len).max().unwrap_or(0);
        if longest > self.seq_length {
            log::warn!(
                "tokenized sequence length {longest} exceeds limit {}, truncating batch",
                self.seq_length
            );
            for ts in &mut tokens {
                ts.truncate(self.seq_length);
            }
            for ms in &mut mask {
                ms.truncate(self.seq_length);
            }
        }
        PreparedTokens { tokens, mask }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollateConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixture(seq_length: usize, mask_prob: f64) -> (SmilesTokenizer, TokenMasker, usize) {
        let config =
            CollateConfig::default().with_seq_length(seq_length).with_mask_prob(mask_prob);
        (SmilesTokenizer::new(), TokenMasker::new(&config).unwrap(), seq_length)
    }

    #[test]
    fn test_prepare_without_masking_is_all_true() {
        let (tokenizer, masker, seq_length) = fixture(512, 0.5);
        let preparer = SequencePreparer::new(&tokenizer, &masker, seq_length);
        let mut rng = StdRng::seed_from_u64(0);
        let out = preparer.prepare(&mut rng, &["CCO".to_string()], false);
        assert_eq!(out.tokens[0], vec!["C", "C", "O"]);
        assert_eq!(out.mask[0], vec![true, true, true]);
    }

    #[test]
    fn test_prepare_with_masking_flags_positions() {
        let (tokenizer, masker, seq_length) = fixture(512, 1.0);
        let preparer = SequencePreparer::new(&tokenizer, &masker, seq_length);
        let mut rng = StdRng::seed_from_u64(0);
        let out = preparer.prepare(&mut rng, &["CCO".to_string()], true);
        assert!(out.mask[0].iter().all(|&m| m));
        assert!(out.tokens[0].iter().all(|t| t == tokenizer.mask_token()));
    }

    #[test]
    fn test_truncation_applies_to_whole_batch() {
        let (tokenizer, masker, seq_length) = fixture(3, 0.0);
        let preparer = SequencePreparer::new(&tokenizer, &masker, seq_length);
        let mut rng = StdRng::seed_from_u64(0);
        let batch = vec!["CCOCC".to_string(), "CC".to_string()];
        let out = preparer.prepare(&mut rng, &batch, false);
        assert_eq!(out.tokens[0], vec!["C", "C", "O"]);
        assert_eq!(out.mask[0].len(), 3);
        // short sequences are never padded up
        assert_eq!(out.tokens[1].len(), 2);
        assert_eq!(out.mask[1].len(), 2);
    }

    #[test]
    fn test_no_truncation_below_limit() {
        let (tokenizer, masker, seq_length) = fixture(16, 0.0);
        let preparer = SequencePreparer::new(&tokenizer, &masker, seq_length);
        let mut rng = StdRng::seed_from_u64(0);
        let out = preparer.prepare(&mut rng, &["c1ccccc1".to_string()], false);
        assert_eq!(out.tokens[0].len(), 8);
    }
}
