/// Normalized indel similarity: `1 - indel / (len_a + len_b)`, with `1.0`
/// for two empty inputs.
///
/// Indel distance counts insertions and deletions only, so it equals
/// `len_a + len_b - 2 * lcs`.
pub fn ratio<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let lcs = lcs_len(a, b);
    let indel = total - 2 * lcs;
    1.0 - indel as f64 / total as f64
}

/// [`ratio`] over the characters of two strings.
pub fn str_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio(&a, &b)
}

// single-row dynamic programming over the shorter side
fn lcs_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];
    for x in long {
        let mut diag = 0;
        for (j, y) in short.iter().enumerate() {
            let up = row[j + 1];
            row[j + 1] = if x == y { diag + 1 } else { up.max(row[j]) };
            diag = up;
        }
    }
    row[short.len()]
}
