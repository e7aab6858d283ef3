//! Configuration module for CycleGAN-DN.
//!
//! This module provides configuration structures and enums for the training step.
//! It is organized into two main submodules:
//! - `core`: Contains the main configuration structures
//! - `enums`: Contains all enumeration types used in configurations

pub mod core;
pub mod enums;

// Re-export all configuration structures from core
pub use self::core::{CycleGanConfig, InputConfig, LossWeightsConfig, OptimizerConfig};

// Re-export all enums from enums
pub use enums::{DatasetMode, Direction, Domain, GanMode, RunPhase};
