//! Adversarial losses.

use burn::prelude::*;
use networks::PatchDiscriminator;

use crate::config::GanMode;

/// Configuration for [`GanLoss`].
#[derive(Config, Debug)]
pub struct GanLossConfig {
    #[config(default = "GanMode::Lsgan")]
    pub mode: GanMode,
}

impl GanLossConfig {
    /// Initialize a new adversarial loss with the given configuration.
    pub fn init<B: Backend>(&self) -> GanLoss<B> {
        GanLoss {
            mode: self.mode.clone(),
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Adversarial loss against an all-real or all-fake label map.
#[derive(Debug, Clone)]
pub struct GanLoss<B: Backend> {
    mode: GanMode,
    _phantom: std::marker::PhantomData<B>,
}

impl<B: Backend> GanLoss<B> {
    /// Objective in use.
    pub const fn mode(&self) -> &GanMode {
        &self.mode
    }

    /// Loss of a discriminator score map against the real (`true`) or fake (`false`) label.
    pub fn forward(&self, pred: Tensor<B, 4>, target_is_real: bool) -> Tensor<B, 1> {
        let label = if target_is_real { 1.0 } else { 0.0 };

        match self.mode {
            GanMode::Lsgan => (pred.clone() - pred.ones_like().mul_scalar(label))
                .powf_scalar(2.0)
                .mean(),
            GanMode::Vanilla => {
                // Binary cross-entropy on logits: max(x, 0) - x * t + log(1 + exp(-|x|))
                let softplus = pred.clone().abs().neg().exp().log1p();
                (pred.clone().clamp_min(0.0) - pred.mul_scalar(label) + softplus).mean()
            }
            GanMode::Wgangp => {
                if target_is_real {
                    pred.mean().neg()
                } else {
                    pred.mean()
                }
            }
        }
    }

    /// Discriminator objective: the average of the real-batch loss and the
    /// fake-batch loss. The fake batch is detached so no gradient reaches the
    /// generator that produced it.
    pub fn discriminator<D: PatchDiscriminator<B>>(
        &self,
        discriminator: &D,
        real: Tensor<B, 4>,
        fake: Tensor<B, 4>,
    ) -> Tensor<B, 1> {
        let loss_real = self.forward(discriminator.score(real), true);
        let loss_fake = self.forward(discriminator.score(fake.detach()), false);

        (loss_real + loss_fake).mul_scalar(0.5)
    }
}
