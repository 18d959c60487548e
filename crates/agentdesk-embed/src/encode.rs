use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{EncodeInput, Tokenizer};

/// Padded `(input_ids, token_type_ids, attention_mask)`, each `[B,T]` where `T`
/// is the longest encoding in the batch capped at `max_len`.
pub fn encode_batch<'s, E>(tokenizer: &Tokenizer, inputs: Vec<E>, max_len: usize, device: &Device) -> Result<(Tensor, Tensor, Tensor)>
where
    E: Into<EncodeInput<'s>>,
{
    let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
    let mut rows = Vec::with_capacity(inputs.len());
    for input in inputs {
        let enc = tokenizer.encode(input, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut types = enc.get_type_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        types.truncate(max_len);
        mask.truncate(max_len);
        rows.push((ids, types, mask));
    }
    let batch = rows.len();
    let width = rows.iter().map(|(ids, _, _)| ids.len()).max().unwrap_or(0).max(1);

    let (mut all_ids, mut all_types, mut all_mask) =
        (Vec::with_capacity(batch * width), Vec::with_capacity(batch * width), Vec::with_capacity(batch * width));
    for (ids, types, mask) in rows {
        let pad = width - ids.len();
        all_ids.extend(ids.into_iter().chain(std::iter::repeat(pad_id).take(pad)));
        all_types.extend(types.into_iter().chain(std::iter::repeat(0).take(pad)));
        all_mask.extend(mask.into_iter().chain(std::iter::repeat(0).take(pad)));
    }
    let input_ids = Tensor::from_vec(all_ids, (batch, width), device)?;
    let token_type_ids = Tensor::from_vec(all_types, (batch, width), device)?;
    let attention_mask = Tensor::from_vec(all_mask, (batch, width), device)?;
    Ok((input_ids, token_type_ids, attention_mask))
}
