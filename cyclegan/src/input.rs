//! Model inputs.
//!
//! A dataset item is turned into a [`CycleGanInput`] once, up front. The variant
//! records whether reference difference maps exist, so the loss code matches on
//! it instead of probing for optional tensors.

use burn::prelude::*;

use crate::{
    config::{Direction, Domain, InputConfig},
    error::{CycleGanError, CycleGanResult},
};

/// One dataset item as loaded, before the direction is applied.
#[derive(Debug, Clone)]
pub struct DomainBatch<B: Backend> {
    /// Images of the dataset's A side, `[batch_size, channels, height, width]`.
    pub a: Tensor<B, 4>,
    /// Images of the dataset's B side.
    pub b: Tensor<B, 4>,
    /// Reference difference map of the A side (A_2 - A_1), when the dataset provides one.
    pub a_reference: Option<Tensor<B, 4>>,
    /// Reference difference map of the B side (B_2 - B_1).
    pub b_reference: Option<Tensor<B, 4>>,
}

impl<B: Backend> DomainBatch<B> {
    /// A batch without reference difference maps.
    pub fn new(a: Tensor<B, 4>, b: Tensor<B, 4>) -> Self {
        Self {
            a,
            b,
            a_reference: None,
            b_reference: None,
        }
    }

    /// Attach reference difference maps for both sides.
    #[must_use]
    pub fn with_references(mut self, a_reference: Tensor<B, 4>, b_reference: Tensor<B, 4>) -> Self {
        self.a_reference = Some(a_reference);
        self.b_reference = Some(b_reference);
        self
    }
}

/// Input of one training iteration.
#[derive(Debug, Clone)]
pub enum CycleGanInput<B: Backend> {
    /// Unpaired images only. The difference-consistency term is skipped.
    Unpaired {
        real_a: Tensor<B, 4>,
        real_b: Tensor<B, 4>,
    },
    /// Images together with the ground-truth change map of each domain.
    WithReference {
        real_a: Tensor<B, 4>,
        real_b: Tensor<B, 4>,
        real_diff_a: Tensor<B, 4>,
        real_diff_b: Tensor<B, 4>,
    },
}

impl<B: Backend> CycleGanInput<B> {
    /// Unpaired input.
    pub fn unpaired(real_a: Tensor<B, 4>, real_b: Tensor<B, 4>) -> Self {
        Self::Unpaired { real_a, real_b }
    }

    /// Input carrying reference difference maps.
    ///
    /// # Errors
    ///
    /// Returns `Err(CycleGanError::InvalidTensorShape)` if a reference does not cover
    /// the same batch and spatial extent as its domain sample.
    pub fn with_reference(
        real_a: Tensor<B, 4>,
        real_b: Tensor<B, 4>,
        real_diff_a: Tensor<B, 4>,
        real_diff_b: Tensor<B, 4>,
    ) -> CycleGanResult<Self> {
        check_reference(Domain::A, &real_a, &real_diff_a)?;
        check_reference(Domain::B, &real_b, &real_diff_b)?;

        Ok(Self::WithReference {
            real_a,
            real_b,
            real_diff_a,
            real_diff_b,
        })
    }

    /// Build the input of one iteration from a dataset item.
    ///
    /// `Direction::BtoA` swaps the two sides. References are kept only when the
    /// configuration expects them (remote-sensing dataset, training phase).
    ///
    /// # Errors
    ///
    /// Returns `Err(CycleGanError::MissingReference)` if references are expected
    /// but the batch lacks one.
    pub fn from_batch(batch: DomainBatch<B>, config: &InputConfig) -> CycleGanResult<Self> {
        let DomainBatch {
            a,
            b,
            a_reference,
            b_reference,
        } = batch;

        let (real_a, real_b, diff_a, diff_b) = match config.direction {
            Direction::AtoB => (a, b, a_reference, b_reference),
            Direction::BtoA => (b, a, b_reference, a_reference),
        };

        if !config.expects_reference() {
            return Ok(Self::unpaired(real_a, real_b));
        }

        let real_diff_a = diff_a.ok_or(CycleGanError::MissingReference { domain: Domain::A })?;
        let real_diff_b = diff_b.ok_or(CycleGanError::MissingReference { domain: Domain::B })?;

        Self::with_reference(real_a, real_b, real_diff_a, real_diff_b)
    }

    /// Domain A sample.
    pub fn real_a(&self) -> &Tensor<B, 4> {
        match self {
            Self::Unpaired { real_a, .. } | Self::WithReference { real_a, .. } => real_a,
        }
    }

    /// Domain B sample.
    pub fn real_b(&self) -> &Tensor<B, 4> {
        match self {
            Self::Unpaired { real_b, .. } | Self::WithReference { real_b, .. } => real_b,
        }
    }
}

fn check_reference<B: Backend>(
    domain: Domain,
    real: &Tensor<B, 4>,
    reference: &Tensor<B, 4>,
) -> CycleGanResult<()> {
    let [batch, _, height, width] = real.dims();
    let [ref_batch, _, ref_height, ref_width] = reference.dims();

    if (batch, height, width) != (ref_batch, ref_height, ref_width) {
        return Err(CycleGanError::InvalidTensorShape {
            tensor: format!("real_diff_{domain}"),
            expected: format!("[{batch}, _, {height}, {width}]"),
            actual: format!("{:?}", reference.dims()),
        });
    }

    Ok(())
}
