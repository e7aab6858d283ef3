//! # CycleGAN-Burn
//!
//! Training step of CycleGAN-DN, an unpaired image-to-image translation model for
//! remote-sensing change detection, built on the Burn deep learning framework.
//!
//! Besides the adversarial, cycle and identity terms of CycleGAN, the generators are
//! trained to produce a difference map whose direction matches a reference change
//! map of the same tile.
//!
//! ## Modules
//!
//! - `config`: Configuration structures for the loss weights, optimizers and input handling.
//! - `error`: Defines the custom error types used throughout the crate.
//! - `input`: Turns dataset items into tagged model inputs.
//! - `image_pool`: History buffers of generated images fed to the discriminators.
//! - `losses`: Adversarial, L1 and difference-consistency losses.
//! - `model`: The model and its training iteration.
//!
//! ## Key Components
//!
//! - `CycleGan`: Generators, discriminators, optimizers and image pools.
//! - `CycleGanConfig`: The primary configuration struct.
//! - `CycleGanError`: The enum for all possible errors.

mod config;
mod error;
pub mod image_pool;
pub mod input;
pub mod losses;
mod model;

#[doc(inline)]
pub use config::{
    CycleGanConfig, DatasetMode, Direction, Domain, GanMode, InputConfig, LossWeightsConfig,
    OptimizerConfig, RunPhase,
};
#[doc(inline)]
pub use error::{CycleGanError, CycleGanResult};
#[doc(inline)]
pub use image_pool::ImagePool;
#[doc(inline)]
pub use input::{CycleGanInput, DomainBatch};
#[doc(inline)]
pub use model::{
    CycleGan, CycleGanLosses, DiscriminatorLosses, ForwardOutput, GeneratorLosses, Phase,
};
pub use networks::{GeneratorOutput, PatchDiscriminator, TranslationGenerator};
