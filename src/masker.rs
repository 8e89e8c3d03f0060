//! Token corruption for the denoising objective.

use rand::Rng;
use rand_distr::{Distribution, Poisson};

use crate::config::{CollateConfig, MaskScheme};
use crate::error::{PrepareError, Result};
use crate::tokenizer::SmilesTokenizer;

/// Token masker with a selectable corruption scheme
///
/// The boolean mask returned alongside the corrupted tokens marks which
/// output positions were altered (`true` = masked). It is unrelated to the
/// padding validity masks produced later in the pipeline.
#[derive(Debug, Clone)]
pub struct TokenMasker {
    scheme: MaskScheme,
    mask_prob: f64,
    show_mask_token_prob: f64,
    span: Poisson<f64>,
}

impl TokenMasker {
    /// Build a masker from a validated configuration
    ///
    /// # Errors
    /// Returns `PrepareError::InvalidConfig` for out-of-range probabilities
    /// or a non-positive span mean.
    pub fn new(config: &CollateConfig) -> Result<Self> {
        config.validate()?;
        let span = Poisson::new(config.span_lambda).map_err(|e| {
            PrepareError::InvalidConfig(format!(
                "span_lambda {} is not a valid Poisson mean: {e}",
                config.span_lambda
            ))
        })?;
        Ok(Self {
            scheme: config.mask_scheme,
            mask_prob: config.mask_prob,
            show_mask_token_prob: config.show_mask_token_prob,
            span,
        })
    }

    /// Corrupt one token sequence, returning `(masked_tokens, token_mask)`
    pub fn mask<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        tokenizer: &SmilesTokenizer,
        tokens: &[String],
    ) -> (Vec<String>, Vec<bool>) {
        match self.scheme {
            MaskScheme::Span => self.mask_span(rng, tokenizer, tokens),
            MaskScheme::Replace => self.mask_replace(rng, tokenizer, tokens),
        }
    }

    /// Span scheme: a flagged position emits one placeholder and consumes a
    /// Poisson-length run of input positions
    ///
    /// The cursor advance is clamped to at least 1 so a zero-length draw
    /// cannot stall the scan; the output may be shorter than the input.
    fn mask_span<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        tokenizer: &SmilesTokenizer,
        tokens: &[String],
    ) -> (Vec<String>, Vec<bool>) {
        let flagged: Vec<bool> =
            (0..tokens.len()).map(|_| rng.random_bool(self.mask_prob)).collect();

        let mut masked = Vec::with_capacity(tokens.len());
        let mut token_mask = Vec::with_capacity(tokens.len());
        let mut cursor = 0;
        while cursor < tokens.len() {
            if flagged[cursor] {
                masked.push(tokenizer.mask_token().to_string());
                token_mask.push(true);
                let span_len = self.span.sample(rng) as usize;
                cursor += span_len.max(1);
            } else {
                masked.push(tokens[cursor].clone());
                token_mask.push(false);
                cursor += 1;
            }
        }
        (masked, token_mask)
    }

    /// Replace scheme: each flagged position independently becomes the
    /// placeholder, a random chemical token, or stays unchanged
    fn mask_replace<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        tokenizer: &SmilesTokenizer,
        tokens: &[String],
    ) -> (Vec<String>, Vec<bool>) {
        let mut masked = Vec::with_capacity(tokens.len());
        let mut token_mask = Vec::with_capacity(tokens.len());
        for token in tokens {
            let flagged = rng.random_bool(self.mask_prob);
            token_mask.push(flagged);
            if flagged {
                masked.push(self.replacement_token(rng, tokenizer, token));
            } else {
                masked.push(token.clone());
            }
        }
        (masked, token_mask)
    }

    fn replacement_token<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        tokenizer: &SmilesTokenizer,
        original: &str,
    ) -> String {
        let draw: f64 = rng.random();
        if draw < self.show_mask_token_prob {
            return tokenizer.mask_token().to_string();
        }
        if draw < self.show_mask_token_prob + (1.0 - self.show_mask_token_prob) / 2.0 {
            let chem = tokenizer.chem_token_ids();
            let id = chem[rng.random_range(0..chem.len())];
            if let Some(token) = tokenizer.id_to_token(id) {
                return token.to_string();
            }
        }
        original.to_string()
    }
}
