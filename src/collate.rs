//! Batch collation: from raw SMILES strings to encoder/decoder tensors.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::augment::augment_smiles;
use crate::config::CollateConfig;
use crate::error::{PrepareError, Result};
use crate::masker::TokenMasker;
use crate::pad::pad_sequences;
use crate::prepare::SequencePreparer;
use crate::tokenizer::{SmilesTokenizer, TokenId};

/// One training batch for an encoder-decoder pair
///
/// All tensors are `[batch, length]`; encoder, decoder and label tensors are
/// padded independently and may differ in width. Label positions whose loss
/// mask is 0 hold the configured ignore value.
#[derive(Debug, Clone)]
pub struct TrainingBatch {
    pub encoder_input: Array2<i64>,
    pub encoder_pad_mask: Array2<i64>,
    pub decoder_input: Array2<i64>,
    pub decoder_pad_mask: Array2<i64>,
    pub labels: Array2<i64>,
    pub loss_mask: Array2<i64>,
    /// Canonical reference strings, for human-readable evaluation
    pub target_smiles: Vec<String>,
}

/// Output of the single-sequence tokenization entry point
#[derive(Debug, Clone)]
pub struct TokenizeOutput {
    pub original_tokens: Vec<Vec<String>>,
    /// Present when masking was requested
    pub masked_tokens: Option<Vec<Vec<String>>>,
    /// Per-token activity masks, present when masking was requested
    pub token_masks: Option<Vec<Vec<bool>>>,
}

/// Batch-preparation pipeline for SMILES sequence-to-sequence training
///
/// Owns the tokenizer, the immutable configuration and a per-instance RNG.
/// Parallel data-loading workers should each construct their own collator
/// with a distinct seed; instances share nothing mutable.
#[derive(Debug)]
pub struct MoleculeCollator {
    tokenizer: SmilesTokenizer,
    config: CollateConfig,
    masker: TokenMasker,
    rng: StdRng,
}

impl MoleculeCollator {
    /// Build a collator seeded from OS entropy
    ///
    /// # Errors
    /// Returns `PrepareError::InvalidConfig` when the configuration fails
    /// validation.
    pub fn new(tokenizer: SmilesTokenizer, config: CollateConfig) -> Result<Self> {
        let masker = TokenMasker::new(&config)?;
        Ok(Self { tokenizer, config, masker, rng: StdRng::from_os_rng() })
    }

    /// Build a collator with a fixed seed, for reproducible augmentation
    ///
    /// # Errors
    /// Returns `PrepareError::InvalidConfig` when the configuration fails
    /// validation.
    pub fn with_seed(tokenizer: SmilesTokenizer, config: CollateConfig, seed: u64) -> Result<Self> {
        let masker = TokenMasker::new(&config)?;
        Ok(Self { tokenizer, config, masker, rng: StdRng::seed_from_u64(seed) })
    }

    /// The owned tokenizer
    #[must_use]
    pub fn tokenizer(&self) -> &SmilesTokenizer {
        &self.tokenizer
    }

    /// The collation configuration
    #[must_use]
    pub fn config(&self) -> &CollateConfig {
        &self.config
    }

    /// Collate a batch of raw SMILES strings into training tensors
    ///
    /// Encoder side: augment/canonicalize each molecule, tokenize with the
    /// encoder masking setting, convert to ids and pad. Decoder side: reuse
    /// the encoder's augmented strings (or re-augment them when decoder
    /// augmentation is on), tokenize with the decoder masking setting, then
    /// build teacher-forcing inputs and labels: the label sequence is the
    /// decoder ids with the end marker appended, computed before the begin
    /// marker is prepended to the decoder input. Ignored label positions
    /// hold `config.label_pad`.
    ///
    /// # Errors
    /// Returns `PrepareError::InvalidSmiles` when any input fails to parse.
    pub fn collate(&mut self, batch: &[String]) -> Result<TrainingBatch> {
        // Encoder
        let mut encoder_smiles = Vec::with_capacity(batch.len());
        let mut target_smiles = Vec::with_capacity(batch.len());
        for smiles in batch {
            let (variant, canonical) = augment_smiles(
                &mut self.rng,
                smiles,
                self.config.encoder_augment,
                self.config.canonicalize_input,
            )?;
            encoder_smiles.push(variant);
            target_smiles.push(canonical);
        }

        let preparer =
            SequencePreparer::new(&self.tokenizer, &self.masker, self.config.seq_length);
        let encoder_prepared =
            preparer.prepare(&mut self.rng, &encoder_smiles, self.config.encoder_mask);
        let encoder_ids = self.tokenizer.convert_tokens_to_ids(&encoder_prepared.tokens);
        let (encoder_ids, encoder_pad_mask) = pad_sequences(
            &encoder_ids,
            &self.tokenizer.pad_id(),
            self.config.pad_size_divisible_by_8,
        );

        // Decoder: reuses the encoder's augmented strings, never the raw input
        let decoder_smiles = if self.config.decoder_augment {
            let mut augmented = Vec::with_capacity(encoder_smiles.len());
            for smiles in &encoder_smiles {
                let (variant, _) = augment_smiles(&mut self.rng, smiles, true, false)?;
                augmented.push(variant);
            }
            augmented
        } else {
            encoder_smiles
        };

        let decoder_prepared =
            preparer.prepare(&mut self.rng, &decoder_smiles, self.config.decoder_mask);
        let decoder_ids = self.tokenizer.convert_tokens_to_ids(&decoder_prepared.tokens);

        // labels take the end marker before the begin marker joins the input
        let labels: Vec<Vec<TokenId>> = decoder_ids
            .iter()
            .map(|ids| {
                let mut row = ids.clone();
                row.push(self.tokenizer.eos_id());
                row
            })
            .collect();
        let decoder_inputs: Vec<Vec<TokenId>> = decoder_ids
            .into_iter()
            .map(|ids| {
                let mut row = vec![self.tokenizer.bos_id()];
                row.extend(ids);
                row
            })
            .collect();

        let (decoder_inputs, decoder_pad_mask) = pad_sequences(
            &decoder_inputs,
            &self.tokenizer.pad_id(),
            self.config.pad_size_divisible_by_8,
        );
        let (mut labels, loss_mask) = pad_sequences(
            &labels,
            &self.tokenizer.pad_id(),
            self.config.pad_size_divisible_by_8,
        );
        for (label_row, mask_row) in labels.iter_mut().zip(&loss_mask) {
            for (label, &valid) in label_row.iter_mut().zip(mask_row) {
                if valid == 0 {
                    *label = self.config.label_pad;
                }
            }
        }

        Ok(TrainingBatch {
            encoder_input: to_array2(encoder_ids)?,
            encoder_pad_mask: to_array2(encoder_pad_mask)?,
            decoder_input: to_array2(decoder_inputs)?,
            decoder_pad_mask: to_array2(decoder_pad_mask)?,
            labels: to_array2(labels)?,
            loss_mask: to_array2(loss_mask)?,
            target_smiles,
        })
    }

    /// Tokenize a batch without collation, optionally with masking
    ///
    /// Legacy single-sequence entry point: no truncation, no marker tokens.
    /// Tokenizer-level padding is permanently disabled and fails loudly;
    /// padding belongs to [`MoleculeCollator::collate`].
    ///
    /// # Errors
    /// Returns `PrepareError::Unsupported` when `pad` is requested.
    pub fn tokenize(
        &mut self,
        batch: &[String],
        mask: bool,
        pad: bool,
    ) -> Result<TokenizeOutput> {
        if pad {
            return Err(PrepareError::Unsupported(
                "tokenizer-level padding; sequences are padded during collation",
            ));
        }

        let original_tokens = self.tokenizer.tokenize_batch(batch);
        if !mask {
            return Ok(TokenizeOutput {
                original_tokens,
                masked_tokens: None,
                token_masks: None,
            });
        }

        let mut masked_tokens = Vec::with_capacity(original_tokens.len());
        let mut token_masks = Vec::with_capacity(original_tokens.len());
        for sequence in &original_tokens {
            let (masked, token_mask) = self.masker.mask(&mut self.rng, &self.tokenizer, sequence);
            masked_tokens.push(masked);
            token_masks.push(token_mask);
        }
        Ok(TokenizeOutput {
            original_tokens,
            masked_tokens: Some(masked_tokens),
            token_masks: Some(token_masks),
        })
    }

    /// Join token sequences back into strings
    ///
    /// Drops one leading begin marker if present and truncates at the first
    /// end marker; remaining tokens are concatenated verbatim.
    #[must_use]
    pub fn detokenize(&self, token_lists: &[Vec<String>]) -> Vec<String> {
        token_lists
            .iter()
            .map(|tokens| {
                let body = match tokens.first() {
                    Some(first) if first == self.tokenizer.begin_token() => &tokens[1..],
                    _ => &tokens[..],
                };
                let end = body
                    .iter()
                    .position(|t| t == self.tokenizer.end_token())
                    .unwrap_or(body.len());
                body[..end].concat()
            })
            .collect()
    }
}

fn to_array2(rows: Vec<Vec<i64>>) -> Result<Array2<i64>> {
    let batch = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    let flat: Vec<i64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((batch, width), flat)
        .map_err(|e| PrepareError::Shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collator(config: CollateConfig) -> MoleculeCollator {
        MoleculeCollator::with_seed(SmilesTokenizer::new(), config, 11).unwrap()
    }

    #[test]
    fn test_tokenize_rejects_padding_loudly() {
        let mut c = collator(CollateConfig::default());
        let err = c.tokenize(&["CCO".to_string()], false, true).unwrap_err();
        assert!(matches!(err, PrepareError::Unsupported(_)));
    }

    #[test]
    fn test_tokenize_without_masking() {
        let mut c = collator(CollateConfig::default());
        let out = c.tokenize(&["CCO".to_string()], false, false).unwrap();
        assert_eq!(out.original_tokens[0], vec!["C", "C", "O"]);
        assert!(out.masked_tokens.is_none());
        assert!(out.token_masks.is_none());
    }

    #[test]
    fn test_tokenize_with_masking_returns_masks() {
        let config = CollateConfig::default().with_mask_prob(1.0);
        let mut c = collator(config);
        let out = c.tokenize(&["CCO".to_string()], true, false).unwrap();
        let masked = out.masked_tokens.unwrap();
        let masks = out.token_masks.unwrap();
        assert!(masked[0].iter().all(|t| t == "<MASK>"));
        assert!(masks[0].iter().all(|&m| m));
        // originals are untouched
        assert_eq!(out.original_tokens[0], vec!["C", "C", "O"]);
    }

    #[test]
    fn test_detokenize_strips_markers() {
        let c = collator(CollateConfig::default());
        let tokens = vec![vec![
            "<BOS>".to_string(),
            "C".to_string(),
            "C".to_string(),
            "O".to_string(),
            "<EOS>".to_string(),
            "<PAD>".to_string(),
        ]];
        assert_eq!(c.detokenize(&tokens), vec!["CCO".to_string()]);
    }

    #[test]
    fn test_detokenize_without_markers() {
        let c = collator(CollateConfig::default());
        let tokens = vec![vec!["C".to_string(), "O".to_string()]];
        assert_eq!(c.detokenize(&tokens), vec!["CO".to_string()]);
    }

    #[test]
    fn test_label_shift_construction() {
        let mut c = collator(CollateConfig::default());
        let batch = vec!["CCO".to_string()];
        let out = c.collate(&batch).unwrap();

        let t = c.tokenizer();
        let (c_id, o_id) = (t.token_to_id("C").unwrap(), t.token_to_id("O").unwrap());
        // decoder input: bos then the sequence
        assert_eq!(
            out.decoder_input.row(0).to_vec(),
            vec![t.bos_id(), c_id, c_id, o_id]
        );
        // labels: the sequence then eos, no bos
        assert_eq!(out.labels.row(0).to_vec(), vec![c_id, c_id, o_id, t.eos_id()]);
        assert_eq!(out.loss_mask.row(0).to_vec(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_ignored_label_positions_hold_label_pad() {
        let config = CollateConfig::default().with_label_pad(-100);
        let mut c = collator(config);
        let batch = vec!["C".to_string(), "CCCC".to_string()];
        let out = c.collate(&batch).unwrap();

        // first row: [C, eos] then padding overwritten with the ignore value
        let row = out.labels.row(0).to_vec();
        assert_eq!(row.len(), 5);
        assert_eq!(&row[2..], &[-100, -100, -100]);
        assert_eq!(out.loss_mask.row(0).to_vec(), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_alignment_padding_rounds_up_to_8() {
        let config = CollateConfig::default().with_pad_size_divisible_by_8(true);
        let mut c = collator(config);
        let out = c.collate(&["CCO".to_string()]).unwrap();
        assert_eq!(out.encoder_input.ncols(), 8);
        assert_eq!(out.decoder_input.ncols(), 8);
        assert_eq!(out.labels.ncols(), 8);
    }
}
