//! Mean Absolute Error (L1) loss.

use burn::prelude::*;

/// Mean absolute difference over every element.
pub fn l1_loss<B: Backend>(pred: Tensor<B, 4>, target: Tensor<B, 4>) -> Tensor<B, 1> {
    (pred - target).abs().mean()
}
