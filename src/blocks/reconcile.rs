use tracing::debug;

use crate::error::AlignError;

use super::{count_blocks, trim_to_blocks};

/// How the common block count of two sequences is chosen.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Use the block count of the reference.
    MatchReference,
    /// Use whichever block count is smaller.
    MatchMinimum,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<T> {
    pub primary: Vec<T>,
    pub reference: Vec<T>,
    /// Block count both sequences were trimmed to.
    pub blocks: usize,
}

/// Trim `primary` and `reference` to a common number of blocks.
///
/// No ordering between the two inputs is assumed, which is what the evaluation
/// path needs when predictions and references disagree arbitrarily.
pub fn reconcile<T: PartialEq + Clone>(
    primary: &[T],
    reference: &[T],
    sep: &T,
    strategy: Strategy,
) -> Reconciled<T> {
    let blocks = match strategy {
        Strategy::MatchReference => count_blocks(reference, sep),
        Strategy::MatchMinimum => count_blocks(primary, sep).min(count_blocks(reference, sep)),
    };
    Reconciled {
        primary: trim_to_blocks(primary, blocks, sep),
        reference: trim_to_blocks(reference, blocks, sep),
        blocks,
    }
}

/// Reconcile a plain-text input stream against its morph-annotated counterpart.
///
/// The plain stream is derived from the same words with less text per word, so
/// it can never hold fewer blocks than the annotated one; if it does, the
/// tokenizer produced something inconsistent and the example must not be used.
pub fn reconcile_model_input<T: PartialEq + Clone>(
    primary: &[T],
    reference: &[T],
    sep: &T,
) -> Result<Reconciled<T>, AlignError> {
    let primary_blocks = count_blocks(primary, sep);
    let reference_blocks = count_blocks(reference, sep);
    if primary_blocks < reference_blocks {
        return Err(AlignError::InconsistentBlockCount {
            primary: primary_blocks,
            reference: reference_blocks,
        });
    }

    let out = reconcile(primary, reference, sep, Strategy::MatchReference);
    if out.primary.is_empty() {
        return Err(AlignError::EmptyResult);
    }
    if primary_blocks > out.blocks {
        debug!(from = primary_blocks, to = out.blocks, "trimmed primary stream");
    }
    Ok(out)
}

/// Make sure `seq` ends with `end_marker` without growing past `max_length`.
///
/// A sequence that is already full, or already ends with the marker, gets its
/// last element overwritten (truncation may have cut a block in half);
/// otherwise the marker is appended.
pub fn ensure_terminal_marker<T: PartialEq + Clone>(
    seq: &[T],
    max_length: usize,
    end_marker: &T,
) -> Result<Vec<T>, AlignError> {
    let at_capacity = seq.len() >= max_length;
    let mut out = seq.to_vec();
    match out.last_mut() {
        Some(last) if at_capacity || *last == *end_marker => *last = end_marker.clone(),
        _ => out.push(end_marker.clone()),
    }
    if out.len() > max_length {
        return Err(AlignError::LengthExceeded { length: out.len(), max_length });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEP: u32 = 42;

    #[test]
    fn minimum_trims_longer_primary() {
        let arr = [1u32, 42, 2, 42, 3, 42, 4, 42, 42];
        let reference = [1u32, 42, 2, 42, 3, 42];
        let out = reconcile(&arr, &reference, &SEP, Strategy::MatchMinimum);
        assert_eq!(out.primary, vec![1, 42, 2, 42, 3, 42]);
        assert_eq!(out.reference, vec![1, 42, 2, 42, 3, 42]);
        assert_eq!(out.blocks, 3);
    }

    #[test]
    fn minimum_keeps_incomplete_trailing_block() {
        let arr = [1u32, 42, 2, 42, 3, 42, 4, 42];
        let reference = [1u32, 42, 2, 42, 3, 42, 4];
        let out = reconcile(&arr, &reference, &SEP, Strategy::MatchMinimum);
        assert_eq!(out.primary, arr.to_vec());
        assert_eq!(out.reference, reference.to_vec());
    }

    #[test]
    fn minimum_handles_uneven_block_widths() {
        let arr = [11u32, 12, 13, 42, 21, 22, 42, 31, 32, 42, 4, 4, 42, 5, 42, 6];
        let reference = [1u32, 42, 2, 42, 3, 3, 42, 4, 4, 42, 5];
        let out = reconcile(&arr, &reference, &SEP, Strategy::MatchMinimum);
        assert_eq!(out.primary, vec![11, 12, 13, 42, 21, 22, 42, 31, 32, 42, 4, 4, 42, 5, 42]);
        assert_eq!(out.reference, reference.to_vec());
    }

    #[test]
    fn minimum_is_symmetric_in_block_count() {
        let seqs: [&[u32]; 5] = [&[], &[1, 42], &[1, 42, 2], &[42, 42, 42, 42], &[7, 8, 42, 9, 42, 10]];
        for a in seqs {
            for b in seqs {
                let out = reconcile(a, b, &SEP, Strategy::MatchMinimum);
                let expected = count_blocks(a, &SEP).min(count_blocks(b, &SEP));
                assert_eq!(count_blocks(&out.primary, &SEP), expected);
                assert_eq!(count_blocks(&out.reference, &SEP), expected);
            }
        }
    }

    #[test]
    fn match_reference_trims_to_reference_count() {
        // primary A B C D, reference A B C
        let primary = [1u32, 42, 2, 42, 3, 42, 4, 42];
        let reference = [1u32, 9, 42, 2, 9, 42, 3, 9];
        let out = reconcile_model_input(&primary, &reference, &SEP).unwrap();
        assert_eq!(out.blocks, 3);
        assert_eq!(out.primary, vec![1, 42, 2, 42, 3, 42]);
        assert_eq!(out.reference, reference.to_vec());
    }

    #[test]
    fn model_input_rejects_primary_with_fewer_blocks() {
        let primary = [1u32, 42, 2, 42, 3, 42, 4, 42];
        let reference = [1u32, 42, 2, 42, 3, 42, 4, 42, 5];
        let err = reconcile_model_input(&primary, &reference, &SEP).unwrap_err();
        assert_eq!(err, AlignError::InconsistentBlockCount { primary: 4, reference: 5 });
    }

    #[test]
    fn model_input_rejects_empty_result() {
        let err = reconcile_model_input::<u32>(&[1, 2], &[], &SEP).unwrap_err();
        assert_eq!(err, AlignError::EmptyResult);
    }

    #[test]
    fn terminal_marker_is_appended_when_room_left() {
        assert_eq!(ensure_terminal_marker(&[5u32, 6], 4, &1).unwrap(), vec![5, 6, 1]);
        assert_eq!(ensure_terminal_marker::<u32>(&[], 4, &1).unwrap(), vec![1]);
    }

    #[test]
    fn terminal_marker_overwrites_when_full_or_present() {
        assert_eq!(ensure_terminal_marker(&[5u32, 6, 7], 3, &1).unwrap(), vec![5, 6, 1]);
        assert_eq!(ensure_terminal_marker(&[5u32, 1], 8, &1).unwrap(), vec![5, 1]);
    }

    #[test]
    fn terminal_marker_reports_length_exceeded() {
        let err = ensure_terminal_marker(&[5u32, 6, 7, 8], 3, &1).unwrap_err();
        assert_eq!(err, AlignError::LengthExceeded { length: 4, max_length: 3 });
        assert!(ensure_terminal_marker::<u32>(&[], 0, &1).is_err());
    }
}
