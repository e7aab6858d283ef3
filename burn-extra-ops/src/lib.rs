//! Additional operations for the Burn deep learning framework
//!
//! This crate provides tensor helpers used by the CycleGAN-DN training step that
//! are not available in the core Burn framework.

use burn::prelude::*;

mod norm;

// Convenient re-exports
pub use norm::{l2_norm_dim, mean_channel_norm};

/// Additional operations for Burn tensors
pub trait TensorExtraOps<B: Backend, const D: usize> {
    /// Euclidean norm along `dim`, keeping the reduced axis
    fn l2_norm_dim(self, dim: usize) -> Self;

    /// Copy the values to the host as `f32`, whatever the backend float type is
    fn to_f32_vec(self) -> Vec<f32>;
}

impl<B: Backend, const D: usize> TensorExtraOps<B, D> for Tensor<B, D> {
    fn l2_norm_dim(self, dim: usize) -> Self {
        norm::l2_norm_dim(self, dim)
    }

    fn to_f32_vec(self) -> Vec<f32> {
        self.into_data().iter::<f32>().collect()
    }
}
