use ndarray::Array2;

use crate::error::AlignError;
use crate::morph::TagId;
use crate::tokenizer::TokenId;

use super::ModelInput;

/// Label value ignored by the loss.
pub const LABEL_PAD: i64 = -100;

/// Right-padded tensors for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub input_ids: Array2<i64>,
    pub attention_mask: Array2<i64>,
    pub labels: Array2<i64>,
    /// Same shape as `input_ids` whenever present.
    pub morph_tags: Option<Array2<i64>>,
}

/// Pad `inputs` to the longest input (and labels to the longest label).
///
/// Either every input carries morph tags or none does.
pub fn collate(inputs: &[ModelInput], pad_id: TokenId, pad_tag: TagId) -> Result<Batch, AlignError> {
    if inputs.is_empty() {
        return Err(AlignError::InvalidArgument("cannot collate an empty batch".into()));
    }
    let with_tags = inputs.iter().filter(|i| i.morph_tags.is_some()).count();
    if with_tags != 0 && with_tags != inputs.len() {
        return Err(AlignError::InvalidArgument(format!(
            "{with_tags} of {} inputs carry morph tags",
            inputs.len()
        )));
    }

    let batch = inputs.len();
    let max_len = inputs.iter().map(|i| i.input_ids.len()).max().unwrap_or(0);
    let max_label = inputs.iter().map(|i| i.labels.len()).max().unwrap_or(0);

    let mut ids = Array2::<i64>::from_elem((batch, max_len), pad_id as i64);
    let mut mask = Array2::<i64>::zeros((batch, max_len));
    let mut labels = Array2::<i64>::from_elem((batch, max_label), LABEL_PAD);
    let mut tags = (with_tags > 0).then(|| Array2::<i64>::from_elem((batch, max_len), pad_tag as i64));

    for (i, input) in inputs.iter().enumerate() {
        for (j, &id) in input.input_ids.iter().enumerate() {
            ids[[i, j]] = id as i64;
        }
        for (j, &m) in input.attention_mask.iter().enumerate().take(max_len) {
            mask[[i, j]] = m as i64;
        }
        for (j, &label) in input.labels.iter().enumerate() {
            labels[[i, j]] = label as i64;
        }
        if let (Some(out), Some(morph)) = (tags.as_mut(), input.morph_tags.as_ref()) {
            if morph.len() != input.input_ids.len() {
                return Err(AlignError::BlockCountMismatch { expected: input.input_ids.len(), found: morph.len() });
            }
            for (j, &tag) in morph.iter().enumerate() {
                out[[i, j]] = tag as i64;
            }
        }
    }

    Ok(Batch { input_ids: ids, attention_mask: mask, labels, morph_tags: tags })
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn input(ids: &[u32], labels: &[u32], tags: Option<&[u32]>) -> ModelInput {
        ModelInput {
            input_ids: ids.to_vec(),
            attention_mask: vec![1; ids.len()],
            labels: labels.to_vec(),
            morph_tags: tags.map(<[u32]>::to_vec),
        }
    }

    #[test]
    fn pads_each_field_with_its_own_value() {
        let batch = collate(
            &[input(&[7, 3, 1], &[9, 1], Some(&[4, 3, 1])), input(&[8, 1], &[9, 9, 9, 1], Some(&[5, 1]))],
            0,
            0,
        )
        .unwrap();
        assert_eq!(batch.input_ids, array![[7i64, 3, 1], [8, 1, 0]]);
        assert_eq!(batch.attention_mask, array![[1i64, 1, 1], [1, 1, 0]]);
        assert_eq!(batch.labels, array![[9i64, 1, -100, -100], [9, 9, 9, 1]]);
        let tags = batch.morph_tags.unwrap();
        assert_eq!(tags, array![[4i64, 3, 1], [5, 1, 0]]);
        assert_eq!(tags.shape(), batch.input_ids.shape());
    }

    #[test]
    fn no_tags_without_embeddings() {
        let batch = collate(&[input(&[7, 1], &[1], None)], 0, 0).unwrap();
        assert!(batch.morph_tags.is_none());
    }

    #[test]
    fn mixed_tag_presence_is_rejected() {
        let err = collate(&[input(&[7, 1], &[1], None), input(&[7, 1], &[1], Some(&[4, 1]))], 0, 0).unwrap_err();
        assert!(matches!(err, AlignError::InvalidArgument(_)));
        assert!(collate(&[], 0, 0).is_err());
    }
}
