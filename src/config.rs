//! Pipeline configuration types.

use serde::{Deserialize, Serialize};

use crate::error::{PrepareError, Result};

/// Token corruption scheme for the denoising objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskScheme {
    /// Replace contiguous runs of tokens with a single placeholder
    Span,
    /// Replace flagged single positions with a placeholder, a random
    /// chemical token, or the original token
    Replace,
}

/// Immutable collation configuration, fixed at pipeline construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateConfig {
    /// Maximum token-sequence length; longer sequences are truncated
    pub seq_length: usize,
    /// Randomize encoder-side atom order
    pub encoder_augment: bool,
    /// Apply the mask scheme to encoder tokens
    pub encoder_mask: bool,
    /// Re-randomize decoder-side atom order
    pub decoder_augment: bool,
    /// Apply the mask scheme to decoder tokens
    pub decoder_mask: bool,
    /// Canonicalize the raw input for the target strings
    pub canonicalize_input: bool,
    /// Round padded lengths up to a multiple of 8
    pub pad_size_divisible_by_8: bool,
    /// Which corruption scheme the masker runs
    pub mask_scheme: MaskScheme,
    /// Per-position Bernoulli masking probability, in [0, 1]
    pub mask_prob: f64,
    /// Mean of the Poisson span-length distribution, > 0
    pub span_lambda: f64,
    /// Replace scheme only: probability a flagged token becomes the
    /// placeholder rather than a random or unchanged token, in [0, 1]
    pub show_mask_token_prob: f64,
    /// Value written into label positions the loss must ignore
    pub label_pad: i64,
}

impl Default for CollateConfig {
    fn default() -> Self {
        Self {
            seq_length: 512,
            encoder_augment: false,
            encoder_mask: false,
            decoder_augment: false,
            decoder_mask: false,
            canonicalize_input: true,
            pad_size_divisible_by_8: false,
            mask_scheme: MaskScheme::Span,
            mask_prob: 0.1,
            span_lambda: 3.0,
            show_mask_token_prob: 1.0,
            label_pad: -1,
        }
    }
}

impl CollateConfig {
    /// Set the sequence-length limit
    #[must_use]
    pub fn with_seq_length(mut self, seq_length: usize) -> Self {
        self.seq_length = seq_length;
        self
    }

    /// Enable encoder-side augmentation
    #[must_use]
    pub fn with_encoder_augment(mut self, augment: bool) -> Self {
        self.encoder_augment = augment;
        self
    }

    /// Enable encoder-side masking
    #[must_use]
    pub fn with_encoder_mask(mut self, mask: bool) -> Self {
        self.encoder_mask = mask;
        self
    }

    /// Enable decoder-side augmentation
    #[must_use]
    pub fn with_decoder_augment(mut self, augment: bool) -> Self {
        self.decoder_augment = augment;
        self
    }

    /// Enable decoder-side masking
    #[must_use]
    pub fn with_decoder_mask(mut self, mask: bool) -> Self {
        self.decoder_mask = mask;
        self
    }

    /// Enable canonicalization of the raw input
    #[must_use]
    pub fn with_canonicalize_input(mut self, canonicalize: bool) -> Self {
        self.canonicalize_input = canonicalize;
        self
    }

    /// Round padded lengths up to a multiple of 8
    #[must_use]
    pub fn with_pad_size_divisible_by_8(mut self, divisible: bool) -> Self {
        self.pad_size_divisible_by_8 = divisible;
        self
    }

    /// Select the corruption scheme
    #[must_use]
    pub fn with_mask_scheme(mut self, scheme: MaskScheme) -> Self {
        self.mask_scheme = scheme;
        self
    }

    /// Set the per-position masking probability
    #[must_use]
    pub fn with_mask_prob(mut self, prob: f64) -> Self {
        self.mask_prob = prob;
        self
    }

    /// Set the mean span length
    #[must_use]
    pub fn with_span_lambda(mut self, lambda: f64) -> Self {
        self.span_lambda = lambda;
        self
    }

    /// Set the placeholder probability for the replace scheme
    #[must_use]
    pub fn with_show_mask_token_prob(mut self, prob: f64) -> Self {
        self.show_mask_token_prob = prob;
        self
    }

    /// Set the label ignore value
    #[must_use]
    pub fn with_label_pad(mut self, label_pad: i64) -> Self {
        self.label_pad = label_pad;
        self
    }

    /// Check all values are in range
    ///
    /// # Errors
    /// Returns `PrepareError::InvalidConfig` for a zero sequence length,
    /// probabilities outside [0, 1], or a non-positive span mean.
    pub fn validate(&self) -> Result<()> {
        if self.seq_length == 0 {
            return Err(PrepareError::InvalidConfig(
                "seq_length must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mask_prob) {
            return Err(PrepareError::InvalidConfig(format!(
                "mask_prob must be in [0, 1], got {}",
                self.mask_prob
            )));
        }
        if !(0.0..=1.0).contains(&self.show_mask_token_prob) {
            return Err(PrepareError::InvalidConfig(format!(
                "show_mask_token_prob must be in [0, 1], got {}",
                self.show_mask_token_prob
            )));
        }
        if self.span_lambda <= 0.0 || !self.span_lambda.is_finite() {
            return Err(PrepareError::InvalidConfig(format!(
                "span_lambda must be a positive finite value, got {}",
                self.span_lambda
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CollateConfig::default();
        assert_eq!(config.seq_length, 512);
        assert_eq!(config.mask_scheme, MaskScheme::Span);
        assert!(config.canonicalize_input);
        assert!(!config.encoder_augment);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = CollateConfig::default()
            .with_seq_length(64)
            .with_encoder_augment(true)
            .with_decoder_mask(true)
            .with_mask_scheme(MaskScheme::Replace)
            .with_mask_prob(0.3)
            .with_span_lambda(2.5)
            .with_label_pad(-100);
        assert_eq!(config.seq_length, 64);
        assert!(config.encoder_augment);
        assert!(config.decoder_mask);
        assert_eq!(config.mask_scheme, MaskScheme::Replace);
        assert_eq!(config.label_pad, -100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_mask_prob() {
        let config = CollateConfig::default().with_mask_prob(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_span_lambda() {
        let config = CollateConfig::default().with_span_lambda(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_seq_length() {
        let config = CollateConfig::default().with_seq_length(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = CollateConfig::default().with_mask_prob(0.25);
        let json = serde_json::to_string(&config).unwrap();
        let back: CollateConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mask_prob, 0.25);
        assert_eq!(back.mask_scheme, MaskScheme::Span);
    }
}
