//! Minimal molecular-graph backend for SMILES strings.
//!
//! Provides exactly the operations the batch-preparation pipeline needs from
//! a chemistry backend: parse a SMILES string into a graph, permute the atom
//! ordering, and serialize the graph back out, canonically or not. It is not
//! a cheminformatics toolkit; aromaticity perception, implicit hydrogens and
//! stereochemistry are carried through as written, never recomputed.
//!
//! # Example
//!
//! ```
//! use preparar::molecule::MolGraph;
//!
//! fn example() -> Result<(), preparar::molecule::SmilesError> {
//!     let graph = MolGraph::parse("OCC")?;
//!     assert_eq!(graph.atom_count(), 3);
//!     assert_eq!(graph.write(true)?, "CCO");
//!     Ok(())
//! }
//! ```

mod error;
mod graph;
mod write;

pub use error::SmilesError;
pub use graph::{Atom, AtomId, Bond, BondOrder, MolGraph};
