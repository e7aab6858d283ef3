//! Difference-consistency loss.
//!
//! Both change maps are rescaled to unit per-sample magnitude, so the term only
//! compares where change happens and in which channel direction, not how strong
//! it is. The magnitude of a sample is its channel-axis Euclidean norm averaged
//! over the spatial axes.

use burn::prelude::*;
use burn_extra_ops::{mean_channel_norm, TensorExtraOps};

use crate::{
    config::Domain,
    error::{CycleGanError, CycleGanResult},
};

/// Distance between the directions of a generated and a reference difference map.
///
/// Each map is divided by its own per-sample magnitude. The loss is the mean over
/// batch and spatial positions of the channel-axis Euclidean norm of the
/// difference of the two unit maps. It is 0 for maps that are positive multiples
/// of each other.
///
/// # Shapes
/// - generated: `[batch_size, channels, height, width]`
/// - reference: `[batch_size, channels, height, width]`
///
/// # Errors
///
/// - `CycleGanError::InvalidTensorShape` if the two maps differ in shape.
/// - `CycleGanError::DegenerateDifferenceNorm` if a sample of either map has a
///   magnitude at or below `min_norm`, or a non-finite one.
pub fn difference_consistency<B: Backend>(
    generated: Tensor<B, 4>,
    reference: Tensor<B, 4>,
    min_norm: f64,
    domain: Domain,
) -> CycleGanResult<Tensor<B, 1>> {
    if generated.dims() != reference.dims() {
        return Err(CycleGanError::InvalidTensorShape {
            tensor: format!("real_diff_{domain}"),
            expected: format!("{:?}", generated.dims()),
            actual: format!("{:?}", reference.dims()),
        });
    }

    let reference_norm = checked_norm(reference.clone(), min_norm, domain, "reference")?;
    let generated_norm = checked_norm(generated.clone(), min_norm, domain, "generated")?;

    let reference_unit = reference / reference_norm;
    let generated_unit = generated / generated_norm;

    Ok((generated_unit - reference_unit).l2_norm_dim(1).mean())
}

/// Per-sample magnitude `[batch_size, 1, 1, 1]`, rejected if any sample is degenerate.
fn checked_norm<B: Backend>(
    map: Tensor<B, 4>,
    min_norm: f64,
    domain: Domain,
    name: &'static str,
) -> CycleGanResult<Tensor<B, 4>> {
    let norm = mean_channel_norm(map);

    let degenerate = norm
        .clone()
        .to_f32_vec()
        .into_iter()
        .enumerate()
        .find(|&(_, value)| !value.is_finite() || f64::from(value) <= min_norm);

    if let Some((sample, value)) = degenerate {
        return Err(CycleGanError::DegenerateDifferenceNorm {
            domain,
            map: name,
            sample,
            norm: value,
        });
    }

    Ok(norm)
}
