//! Euclidean norms along a single tensor axis.
//!
//! `sqrt` has an unbounded derivative at zero, so a plain
//! `x.powf_scalar(2.0).sum_dim(dim).sqrt()` turns all-zero vectors into NaN
//! gradients. The norm here masks those positions out before the square root
//! and restores an exact zero afterwards, which gives the zero subgradient.

use burn::prelude::*;

/// Euclidean norm of `tensor` along `dim`. The reduced axis is kept with size one.
///
/// # Shapes
/// - input: `[d_0, ..., d_dim, ..., d_n]`
/// - output: `[d_0, ..., 1, ..., d_n]`
pub fn l2_norm_dim<B: Backend, const D: usize>(tensor: Tensor<B, D>, dim: usize) -> Tensor<B, D> {
    let squared = tensor.powf_scalar(2.0).sum_dim(dim);
    let zero = squared.clone().equal_elem(0.0);

    squared.mask_fill(zero.clone(), 1.0).sqrt().mask_fill(zero, 0.0)
}

/// Per-sample magnitude of a batch of maps: the channel-axis Euclidean norm
/// averaged over both spatial axes.
///
/// # Shapes
/// - input: `[batch, channels, height, width]`
/// - output: `[batch, 1, 1, 1]`
pub fn mean_channel_norm<B: Backend>(maps: Tensor<B, 4>) -> Tensor<B, 4> {
    l2_norm_dim(maps, 1).mean_dim(2).mean_dim(3)
}
