use crate::error::AlignError;

/// `w1 {sep}w2 {sep}w3`: the separator is glued to the following word so the
/// tokenizer sees it as a standalone token after a space.
pub fn join_with_separator<S: AsRef<str>>(words: &[S], separator: &str) -> String {
    let glue = format!(" {separator}");
    words.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(&glue)
}

/// `w1 {meta}T1 {block}w2 {meta}T2`
pub fn text_with_morphs<S: AsRef<str>, T: AsRef<str>>(
    words: &[S],
    tags: &[T],
    block_sep: &str,
    meta_sep: &str,
) -> Result<String, AlignError> {
    if words.len() != tags.len() {
        return Err(AlignError::BlockCountMismatch { expected: words.len(), found: tags.len() });
    }
    let blocks: Vec<String> = words
        .iter()
        .zip(tags)
        .map(|(word, tag)| join_with_separator(&[word.as_ref(), tag.as_ref()], meta_sep))
        .collect();
    Ok(join_with_separator(&blocks, block_sep))
}
