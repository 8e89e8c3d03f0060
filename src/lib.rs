//! Batch preparation for SMILES sequence-to-sequence training.
//!
//! Turns batches of molecular line-notation (SMILES) strings into training
//! tensors for an encoder-decoder model: each molecule is optionally
//! re-serialized under a random atom order (augmentation), tokenized at atom
//! level, optionally corrupted with span masking for a denoising objective,
//! padded to a uniform length and assembled into teacher-forcing inputs,
//! labels and loss masks.
//!
//! # Example
//!
//! ```
//! use preparar::{CollateConfig, MoleculeCollator, SmilesTokenizer};
//!
//! fn example() -> preparar::Result<()> {
//!     let config = CollateConfig::default().with_seq_length(128);
//!     let mut collator = MoleculeCollator::with_seed(SmilesTokenizer::new(), config, 7)?;
//!
//!     let batch = vec!["CCO".to_string(), "c1ccccc1".to_string()];
//!     let prepared = collator.collate(&batch)?;
//!     assert_eq!(prepared.target_smiles.len(), 2);
//!     assert_eq!(prepared.encoder_input.nrows(), 2);
//!     Ok(())
//! }
//! ```
//!
//! Augmentation and masking draw from an RNG owned by each collator, so
//! parallel data-loading workers construct independently seeded instances
//! and share nothing mutable.

pub mod augment;
pub mod collate;
pub mod config;
pub mod error;
pub mod masker;
pub mod molecule;
pub mod pad;
pub mod prepare;
pub mod tokenizer;

pub use augment::augment_smiles;
pub use collate::{MoleculeCollator, TokenizeOutput, TrainingBatch};
pub use config::{CollateConfig, MaskScheme};
pub use error::{PrepareError, Result};
pub use masker::TokenMasker;
pub use pad::pad_sequences;
pub use prepare::{PreparedTokens, SequencePreparer};
pub use tokenizer::{SmilesTokenizer, SpecialTokens, TokenId};
