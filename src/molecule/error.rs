//! Molecular graph error types.

use thiserror::Error;

/// Errors raised while parsing or serializing SMILES
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unclosed bracket atom starting at position {0}")]
    UnclosedBracket(usize),

    #[error("bracket atom at position {0} has no element symbol")]
    EmptyBracket(usize),

    #[error("unbalanced branch parenthesis at position {0}")]
    UnbalancedParen(usize),

    #[error("branch at position {0} has no preceding atom")]
    DanglingBranch(usize),

    #[error("ring bond {0} was opened but never closed")]
    OpenRingBond(u32),

    #[error("ring bond {0} closes onto its own opening atom")]
    SelfRingBond(u32),

    #[error("bond symbol at position {0} is not followed by an atom")]
    DanglingBond(usize),

    #[error("atom order {0:?} is not a permutation of 0..{1}")]
    BadPermutation(Vec<usize>, usize),

    #[error("cannot serialize molecular graph: {0}")]
    Write(String),
}
