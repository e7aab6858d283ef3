//! Enumeration types for CycleGAN-DN configuration.

use core::fmt;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Adversarial objective.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum GanMode {
    /// Least-squares GAN: mean squared error against the target label.
    Lsgan,
    /// Classic GAN: binary cross-entropy on logits.
    Vanilla,
    /// Wasserstein critic: minus the mean score for real, the mean score for fake.
    Wgangp,
}

/// Which batch of a dataset item is treated as domain A.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Direction {
    AtoB,
    BtoA,
}

/// Kind of dataset feeding the model.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum DatasetMode {
    /// Plain unpaired images. No reference difference maps.
    CommonImages,
    /// Bi-temporal remote-sensing tiles, with reference difference maps during training.
    RemoteSensingImages,
}

/// Whether the model is being trained or evaluated.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Train,
    Test,
}

/// One of the two image domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    A,
    B,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}
