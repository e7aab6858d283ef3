//! Core configuration structures for CycleGAN-DN.
//!
//! This module contains the configuration of the training step: loss weights,
//! adversarial objective, image pools, optimizers, and how dataset items are
//! turned into model inputs.

use burn::{optim::AdamConfig, prelude::*};

use crate::error::{CycleGanError, CycleGanResult};

use super::enums::*;

/// Main configuration for the CycleGAN-DN training step.
///
/// A = source domain, B = target domain.
/// Generators: G_A: A -> B; G_B: B -> A.
/// Discriminators: D_A: G_A(A) vs. B; D_B: G_B(B) vs. A.
#[derive(Config, Debug)]
pub struct CycleGanConfig {
    /// Channels of domain A images.
    #[config(default = "3")]
    pub input_channels: usize,
    /// Channels of domain B images.
    #[config(default = "3")]
    pub output_channels: usize,
    /// Loss term weights.
    #[config(default = "LossWeightsConfig::new()")]
    pub weights: LossWeightsConfig,
    /// Adversarial objective shared by generators and discriminators.
    #[config(default = "GanMode::Lsgan")]
    pub gan_mode: GanMode,
    /// Number of previously generated images kept per domain. 0 disables the pools.
    #[config(default = "50")]
    pub pool_size: usize,
    /// Settings of both optimizers.
    #[config(default = "OptimizerConfig::new()")]
    pub optimizer: OptimizerConfig,
    /// Per-sample difference-map magnitudes at or below this value are rejected.
    #[config(default = 1e-12)]
    pub min_difference_norm: f64,
    /// Seed for the image pools.
    #[config(default = 0)]
    pub seed: u64,
}

/// Weights of the generator loss terms.
#[derive(Config, Debug)]
pub struct LossWeightsConfig {
    /// Weight for cycle loss (A -> B -> A).
    #[config(default = 10.0)]
    pub lambda_a: f64,
    /// Weight for cycle loss (B -> A -> B).
    #[config(default = 10.0)]
    pub lambda_b: f64,
    /// Scale of the identity loss on target-domain inputs, ||G_A(B) - B|| and ||G_B(A) - A||.
    #[config(default = 0.5)]
    pub lambda_identity_target: f64,
    /// Scale of the identity loss on source-domain inputs, ||G_A(A) - A|| and ||G_B(B) - B||.
    #[config(default = 0.0)]
    pub lambda_identity_source: f64,
    /// Scale of the difference-consistency loss of domain A.
    #[config(default = 1.0)]
    pub lambda_diff_source: f64,
    /// Scale of the difference-consistency loss of domain B.
    #[config(default = 1.0)]
    pub lambda_diff_target: f64,
}

impl LossWeightsConfig {
    /// Whether any identity term has a non-zero weight.
    #[must_use]
    pub fn identity_enabled(&self) -> bool {
        self.lambda_identity_target > 0.0 || self.lambda_identity_source > 0.0
    }

    fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("lambda_a", self.lambda_a),
            ("lambda_b", self.lambda_b),
            ("lambda_identity_target", self.lambda_identity_target),
            ("lambda_identity_source", self.lambda_identity_source),
            ("lambda_diff_source", self.lambda_diff_source),
            ("lambda_diff_target", self.lambda_diff_target),
        ]
    }
}

/// Adam settings shared by the generator and discriminator optimizers.
#[derive(Config, Debug)]
pub struct OptimizerConfig {
    /// Initial learning rate.
    #[config(default = 0.0002)]
    pub learning_rate: f64,
    /// Momentum term of Adam.
    #[config(default = 0.5)]
    pub beta_1: f32,
    #[config(default = 0.999)]
    pub beta_2: f32,
}

impl OptimizerConfig {
    /// Adam configuration with these betas.
    pub fn adam(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.beta_1)
            .with_beta_2(self.beta_2)
    }
}

/// How dataset items are mapped onto model inputs.
#[derive(Config, Debug)]
pub struct InputConfig {
    #[config(default = "Direction::AtoB")]
    pub direction: Direction,
    #[config(default = "DatasetMode::RemoteSensingImages")]
    pub dataset_mode: DatasetMode,
    #[config(default = "RunPhase::Train")]
    pub phase: RunPhase,
}

impl InputConfig {
    /// Whether inputs built with this configuration carry reference difference maps.
    #[must_use]
    pub fn expects_reference(&self) -> bool {
        self.dataset_mode == DatasetMode::RemoteSensingImages && self.phase == RunPhase::Train
    }
}

impl CycleGanConfig {
    /// Validate the configuration and return appropriate errors for invalid settings.
    ///
    /// # Errors
    ///
    /// Returns `Err(CycleGanError::InvalidConfiguration)` if any validation rule is violated.
    pub fn validate(&self) -> CycleGanResult<()> {
        // 1. Channel counts
        if self.input_channels == 0 || self.output_channels == 0 {
            return Err(CycleGanError::InvalidConfiguration {
                reason: format!(
                    "Channel counts must be positive, got input_channels={} and output_channels={}",
                    self.input_channels, self.output_channels
                ),
            });
        }

        // 2. Weights are scales, never negative
        for (name, value) in self.weights.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(CycleGanError::InvalidConfiguration {
                    reason: format!("{name} must be a finite non-negative number, got {value}"),
                });
            }
        }

        // 3. Identity mapping only works when both domains have the same number of channels
        if self.weights.identity_enabled() && self.input_channels != self.output_channels {
            return Err(CycleGanError::InvalidConfiguration {
                reason: format!(
                    "Identity loss requires input_channels == output_channels, got {} and {}",
                    self.input_channels, self.output_channels
                ),
            });
        }

        // 4. Optimizer
        if self.optimizer.learning_rate.is_nan() || self.optimizer.learning_rate <= 0.0 {
            return Err(CycleGanError::InvalidConfiguration {
                reason: format!(
                    "Learning rate must be positive, got {}",
                    self.optimizer.learning_rate
                ),
            });
        }

        // 5. Degenerate-norm threshold
        if self.min_difference_norm.is_nan() || self.min_difference_norm < 0.0 {
            return Err(CycleGanError::InvalidConfiguration {
                reason: format!(
                    "min_difference_norm must be non-negative, got {}",
                    self.min_difference_norm
                ),
            });
        }

        Ok(())
    }
}
