//! Batch padding with validity masks.

/// Right-pad every sequence to the batch maximum, returning the padded
/// sequences and a validity mask of the same shape
///
/// The target length is the longest sequence in `sequences`, rounded up to
/// the next multiple of 8 when `divisible_by_8` is set (an alignment
/// requirement of some accelerator kernels). The validity mask holds 1 for
/// original positions and 0 for padding; it is the padding-validity
/// semantic, distinct from the masker's per-token activity mask.
pub fn pad_sequences<T: Clone>(
    sequences: &[Vec<T>],
    pad_value: &T,
    divisible_by_8: bool,
) -> (Vec<Vec<T>>, Vec<Vec<i64>>) {
    let mut target = sequences.iter().map(Vec::len).max().unwrap_or(0);
    if divisible_by_8 {
        target = target.div_ceil(8) * 8;
    }

    let mut padded = Vec::with_capacity(sequences.len());
    let mut validity = Vec::with_capacity(sequences.len());
    for sequence in sequences {
        let mut row = sequence.clone();
        row.resize(target, pad_value.clone());
        padded.push(row);

        let mut mask = vec![1i64; sequence.len()];
        mask.resize(target, 0);
        validity.push(mask);
    }
    (padded, validity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pad_to_batch_max() {
        let sequences = vec![vec![1, 2], vec![1, 2, 3, 4]];
        let (padded, validity) = pad_sequences(&sequences, &0, false);
        assert_eq!(padded[0], vec![1, 2, 0, 0]);
        assert_eq!(padded[1], vec![1, 2, 3, 4]);
        assert_eq!(validity[0], vec![1, 1, 0, 0]);
        assert_eq!(validity[1], vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_pad_aligned_to_multiple_of_8() {
        let sequences = vec![vec![7; 3], vec![7; 5]];
        let (padded, validity) = pad_sequences(&sequences, &0, true);
        assert_eq!(padded[0].len(), 8);
        assert_eq!(validity[1], vec![1, 1, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_pad_exact_multiple_is_unchanged() {
        let sequences = vec![vec![1; 8]];
        let (padded, _) = pad_sequences(&sequences, &0, true);
        assert_eq!(padded[0].len(), 8);
    }

    #[test]
    fn test_pad_empty_batch() {
        let sequences: Vec<Vec<i64>> = Vec::new();
        let (padded, validity) = pad_sequences(&sequences, &0, false);
        assert!(padded.is_empty());
        assert!(validity.is_empty());
    }

    #[test]
    fn test_pad_string_tokens() {
        let sequences = vec![vec!["C".to_string()], vec!["C".to_string(), "O".to_string()]];
        let pad = "<PAD>".to_string();
        let (padded, _) = pad_sequences(&sequences, &pad, false);
        assert_eq!(padded[0], vec!["C".to_string(), "<PAD>".to_string()]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_pad_round_trip(
            sequences in prop::collection::vec(prop::collection::vec(any::<i32>(), 0..24), 1..8),
            align in any::<bool>(),
        ) {
            let (padded, validity) = pad_sequences(&sequences, &i32::MIN, align);
            for (row, (padded_row, mask_row)) in
                sequences.iter().zip(padded.iter().zip(validity.iter()))
            {
                let stripped: Vec<i32> = padded_row
                    .iter()
                    .zip(mask_row.iter())
                    .filter(|&(_, &m)| m == 1)
                    .map(|(&v, _)| v)
                    .collect();
                prop_assert_eq!(&stripped, row);
            }
        }

        #[test]
        fn prop_aligned_length_is_smallest_multiple_of_8(
            sequences in prop::collection::vec(prop::collection::vec(any::<i32>(), 0..40), 1..6),
        ) {
            let (padded, _) = pad_sequences(&sequences, &0, true);
            let natural = sequences.iter().map(Vec::len).max().unwrap_or(0);
            let width = padded[0].len();
            prop_assert_eq!(width % 8, 0);
            prop_assert!(width >= natural);
            prop_assert!(width < natural + 8);
        }

        #[test]
        fn prop_all_rows_share_one_length(
            sequences in prop::collection::vec(prop::collection::vec(any::<i32>(), 0..24), 1..8),
        ) {
            let (padded, validity) = pad_sequences(&sequences, &0, false);
            let width = padded[0].len();
            prop_assert!(padded.iter().all(|row| row.len() == width));
            prop_assert!(validity.iter().all(|row| row.len() == width));
        }
    }
}
