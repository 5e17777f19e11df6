use anyhow::{anyhow, ensure, Result};
use candle_core::{Device, Tensor};
use docinsight_core::config::MIN_MAX_LEN;
use tokenizers::{Tokenizer, TruncationParams};

/// Model inputs for one padded batch, all `[B, T]` u32 tensors.
pub struct TokenBatch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Replace whatever padding and truncation `tokenizer.json` ships with:
/// no tokenizer-side padding, truncation at `max_len` tokens including the
/// special tokens, so `[SEP]` survives a cut.
pub fn configure_tokenizer(tokenizer: &mut Tokenizer, max_len: usize) -> Result<()> {
    ensure!(max_len >= MIN_MAX_LEN, "max_len must be at least {MIN_MAX_LEN}, got {max_len}");
    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
        .map_err(|e| anyhow!("Failed to set truncation: {}", e))?;
    Ok(())
}

/// Tokenize `texts` and right-pad the batch to its longest row with `pad_id`.
/// Truncation is the tokenizer's job; see `configure_tokenizer`.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    pad_id: u32,
    device: &Device,
) -> Result<TokenBatch> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        rows.push((enc.get_ids().to_vec(), enc.get_attention_mask().to_vec()));
    }

    let width = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut flat_ids = Vec::with_capacity(rows.len() * width);
    let mut flat_mask = Vec::with_capacity(rows.len() * width);
    for (mut ids, mut mask) in rows {
        ids.resize(width, pad_id);
        mask.resize(width, 0);
        flat_ids.extend(ids);
        flat_mask.extend(mask);
    }

    let shape = (texts.len(), width);
    let input_ids = Tensor::from_vec(flat_ids, shape, device)?;
    let attention_mask = Tensor::from_vec(flat_mask, shape, device)?;
    let token_type_ids = input_ids.zeros_like()?;
    Ok(TokenBatch { input_ids, attention_mask, token_type_ids })
}
