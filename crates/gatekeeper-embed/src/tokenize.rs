use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// XLM-R padding token id.
const PAD_ID: u32 = 1;

/// Tokenize a batch into `[B, max_len]` id and attention-mask tensors,
/// truncating or right-padding every row to `max_len`.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = Vec::with_capacity(texts.len() * max_len);
    let mut mask = Vec::with_capacity(texts.len() * max_len);
    for enc in &encodings {
        let n = enc.get_ids().len().min(max_len);
        ids.extend_from_slice(&enc.get_ids()[..n]);
        mask.extend_from_slice(&enc.get_attention_mask()[..n]);
        ids.extend(std::iter::repeat(PAD_ID).take(max_len - n));
        mask.extend(std::iter::repeat(0u32).take(max_len - n));
    }
    let input_ids = Tensor::from_vec(ids, (encodings.len(), max_len), device)?;
    let attention_mask = Tensor::from_vec(mask, (encodings.len(), max_len), device)?;
    Ok((input_ids, attention_mask))
}
