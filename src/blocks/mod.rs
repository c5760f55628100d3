//! Block structure of separator-delimited sequences.
//!
//! A block is a maximal run that ends with (and includes) one separator, or the
//! trailing run after the last separator. Blocks are never empty and always
//! reassemble to the input.

pub mod reconcile;

pub use reconcile::{ensure_terminal_marker, reconcile, reconcile_model_input, Reconciled, Strategy};

use crate::error::AlignError;

/// Split `seq` right after every occurrence of `sep`.
///
/// Works for token ids as well as for word-level string tokens.
pub fn partition<'a, T: PartialEq>(seq: &'a [T], sep: &T) -> Vec<&'a [T]> {
    seq.split_inclusive(|tok| tok == sep).collect()
}

pub fn count_blocks<T: PartialEq>(seq: &[T], sep: &T) -> usize {
    seq.split_inclusive(|tok| tok == sep).count()
}

/// Keep the first `n` blocks of `seq`. Asking for more blocks than exist returns
/// the whole sequence.
pub fn trim_to_blocks<T: PartialEq + Clone>(seq: &[T], n: usize, sep: &T) -> Vec<T> {
    let end: usize = seq
        .split_inclusive(|tok| tok == sep)
        .take(n)
        .map(<[T]>::len)
        .sum();
    seq[..end].to_vec()
}

/// Convert a block count coming from signed external data.
pub fn checked_block_count(n: i64) -> Result<usize, AlignError> {
    usize::try_from(n)
        .map_err(|_| AlignError::InvalidArgument(format!("block count must be non-negative, got {n}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEP: u32 = 0;

    fn samples() -> Vec<Vec<u32>> {
        vec![
            vec![],
            vec![5, 6, 7],
            vec![0, 0, 0],
            vec![0, 1, 2],
            vec![1, 0, 2, 0],
            vec![1, 0, 2],
            vec![1, 0, 0],
            vec![11, 12, 13, 0, 21, 22, 0, 31, 0, 4, 4, 0, 5, 0, 6],
        ]
    }

    #[test]
    fn partition_keeps_separator_with_its_block() {
        let blocks = partition(&[5u32, 1, 7, 1, 1], &1);
        assert_eq!(blocks, vec![&[5u32, 1][..], &[7u32, 1][..], &[1u32][..]]);
    }

    #[test]
    fn partition_edge_cases() {
        assert!(partition::<u32>(&[], &SEP).is_empty());
        assert_eq!(partition(&[3u32, 4], &SEP), vec![&[3u32, 4][..]]);
        assert_eq!(partition(&[0u32, 0, 0], &SEP).len(), 3);
        assert_eq!(partition(&[0u32, 9], &SEP), vec![&[0u32][..], &[9u32][..]]);
    }

    #[test]
    fn partition_reassembles_input() {
        for seq in samples() {
            let joined: Vec<u32> = partition(&seq, &SEP).concat();
            assert_eq!(joined, seq);
            assert!(partition(&seq, &SEP).iter().all(|b| !b.is_empty()));
        }
    }

    #[test]
    fn partition_works_on_words() {
        let words = ["this", "is", "<s>", "an", "example", "<s>"];
        let blocks = partition(&words, &"<s>");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1], &["an", "example", "<s>"][..]);
    }

    #[test]
    fn count_blocks_counts_trailing_incomplete_block() {
        assert_eq!(count_blocks(&[1u32, 0, 2, 0], &SEP), 2);
        assert_eq!(count_blocks(&[1u32, 0, 2], &SEP), 2);
        assert_eq!(count_blocks::<u32>(&[], &SEP), 0);
        assert_eq!(count_blocks(&[0u32, 0, 0], &SEP), 3);
        assert_eq!(count_blocks(&[1u32, 0, 0], &SEP), 2);
    }

    #[test]
    fn trim_to_blocks_examples() {
        assert_eq!(trim_to_blocks(&[1u32, 0, 2, 0, 3, 0], 2, &SEP), vec![1, 0, 2, 0]);
        assert_eq!(trim_to_blocks(&[1u32, 0, 2], 2, &SEP), vec![1, 0, 2]);
        assert_eq!(trim_to_blocks(&[1u32, 0, 2, 0, 3, 0], 4, &SEP), vec![1, 0, 2, 0, 3, 0]);
        assert!(trim_to_blocks(&[1u32, 0, 2], 0, &SEP).is_empty());
    }

    #[test]
    fn trimmed_block_count_is_min_of_request_and_available() {
        for seq in samples() {
            let available = count_blocks(&seq, &SEP);
            for n in 0..6 {
                let trimmed = trim_to_blocks(&seq, n, &SEP);
                assert_eq!(count_blocks(&trimmed, &SEP), n.min(available), "seq={seq:?} n={n}");
            }
        }
    }

    #[test]
    fn trimming_is_idempotent() {
        for seq in samples() {
            for n in 0..6 {
                let once = trim_to_blocks(&seq, n, &SEP);
                assert_eq!(trim_to_blocks(&once, n, &SEP), once);
            }
        }
    }

    #[test]
    fn negative_block_count_is_invalid() {
        assert_eq!(checked_block_count(3), Ok(3));
        assert!(matches!(checked_block_count(-1), Err(AlignError::InvalidArgument(_))));
    }
}
