//! SMILES augmentation: randomized atom-order variants plus canonical forms.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;
use crate::molecule::MolGraph;

/// Regularize one SMILES string, returning `(variant, canonical)`
///
/// The input is parsed into a molecular graph; parsing failure is fatal, so
/// callers must filter invalid molecules upstream. The canonical string is
/// the graph's canonical serialization when `canonicalize` is set, otherwise
/// the input string unchanged. When `augment` is set the variant is a
/// non-canonical serialization of the graph under a uniformly random atom
/// permutation; otherwise it is a non-canonical serialization of the graph
/// as parsed.
///
/// A failure to serialize the permuted graph is recovered locally by
/// substituting the canonical form and logging, never surfaced to the
/// caller.
///
/// # Errors
/// Returns `PrepareError::InvalidSmiles` when the input does not parse.
///
/// # Panics
/// Panics if either output string is empty; a successfully parsed molecule
/// always serializes to at least one token.
pub fn augment_smiles<R: Rng + ?Sized>(
    rng: &mut R,
    smiles: &str,
    augment: bool,
    canonicalize: bool,
) -> Result<(String, String)> {
    let mol = MolGraph::parse(smiles)?;
    let canonical = if canonicalize { mol.write(true)? } else { smiles.to_string() };

    let variant = if augment {
        let mut atom_order: Vec<usize> = (0..mol.atom_count()).collect();
        atom_order.shuffle(rng);
        let permuted = mol.renumber(&atom_order)?;
        match permuted.write(false) {
            Ok(s) => s,
            Err(err) => {
                log::info!(
                    "could not serialize augmented form of {smiles}, forcing canonicalization: {err}"
                );
                if canonicalize {
                    canonical.clone()
                } else {
                    mol.write(true)?
                }
            }
        }
    } else {
        mol.write(false)?
    };

    assert!(!variant.is_empty(), "augmented SMILES string is empty");
    assert!(!canonical.is_empty(), "canonical SMILES string is empty");
    Ok((variant, canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn canon(smiles: &str) -> String {
        MolGraph::parse(smiles).unwrap().write(true).unwrap()
    }

    #[test]
    fn test_augment_off_returns_input_traversal() {
        let mut rng = StdRng::seed_from_u64(0);
        let (variant, canonical) = augment_smiles(&mut rng, "CCO", false, true).unwrap();
        assert_eq!(variant, "CCO");
        assert_eq!(canonical, "CCO");
    }

    #[test]
    fn test_canonicalize_off_returns_input_verbatim() {
        let mut rng = StdRng::seed_from_u64(0);
        let (_, canonical) = augment_smiles(&mut rng, "OCC", false, false).unwrap();
        assert_eq!(canonical, "OCC");
    }

    #[test]
    fn test_variant_represents_same_molecule() {
        let mut rng = StdRng::seed_from_u64(42);
        for smiles in ["CCO", "CC(=O)O", "c1ccccc1", "C1CCCCC1"] {
            let (variant, canonical) = augment_smiles(&mut rng, smiles, true, true).unwrap();
            assert!(!variant.is_empty());
            assert_eq!(canon(&variant), canonical, "variant of {smiles} diverged");
        }
    }

    #[test]
    fn test_augmentation_varies_traversal_order() {
        // with enough draws some permutation must start from a non-default atom
        let mut rng = StdRng::seed_from_u64(7);
        let variants: Vec<String> = (0..32)
            .map(|_| augment_smiles(&mut rng, "CC(=O)OC", true, false).unwrap().0)
            .collect();
        assert!(variants.iter().any(|v| v != &variants[0]));
    }

    #[test]
    fn test_invalid_smiles_is_fatal() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(augment_smiles(&mut rng, "C(C", false, true).is_err());
        assert!(augment_smiles(&mut rng, "", false, true).is_err());
    }
}
