use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Mean over unmasked tokens followed by L2 normalization.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` (any numeric dtype,
/// 1 for real tokens). Returns `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _tokens, hidden_dim) = hidden.dims3()?;

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let sum = (hidden * &mask_3d)?.sum(1)?;
    let lengths = mask.sum_keepdim(1)?;
    let mean = sum.broadcast_div(&lengths)?;

    let eps_val = match hidden.dtype() {
        DType::F16 => 1e-6f32,
        _ => 1e-12f32,
    };
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, f64::from(eps_val))?;
    let normalized = mean.broadcast_div(&norm)?;
    ensure!(
        normalized.dims() == [batch, hidden_dim],
        "pooled shape {:?} != [{batch}, {hidden_dim}]",
        normalized.dims()
    );
    Ok(normalized)
}
