//! Network implementations for CycleGAN-DN
//!
//! This crate defines the two network roles the training step depends on, a
//! generator that translates a batch and reports a difference map, and a
//! discriminator that scores realism per patch, together with reference
//! ResNet and PatchGAN implementations of both.

use burn::prelude::*;

mod discriminator;
mod generator;

pub use discriminator::{
    NLayerDiscriminator, NLayerDiscriminatorConfig, PixelDiscriminator, PixelDiscriminatorConfig,
};
pub use generator::{DifferenceMap, ResnetBlock, ResnetGenerator, ResnetGeneratorConfig};

/// Output of one generator evaluation.
#[derive(Debug, Clone)]
pub struct GeneratorOutput<B: Backend> {
    /// Translated batch, `[batch_size, output_channels, height, width]`.
    pub image: Tensor<B, 4>,
    /// Auxiliary change signal produced alongside the translation.
    pub difference: Tensor<B, 4>,
}

/// A generator network mapping one image domain onto the other.
pub trait TranslationGenerator<B: Backend>: Module<B> {
    /// Translate a batch
    ///
    /// # Arguments
    /// * `images` - Input tensor of shape `[batch_size, channels, height, width]`
    fn translate(&self, images: Tensor<B, 4>) -> GeneratorOutput<B>;
}

/// A discriminator network scoring how real each patch of a batch looks.
pub trait PatchDiscriminator<B: Backend>: Module<B> {
    /// Score a batch
    ///
    /// # Returns
    /// Score map of shape `[batch_size, 1, patches_h, patches_w]`
    fn score(&self, images: Tensor<B, 4>) -> Tensor<B, 4>;
}

impl<B: Backend> TranslationGenerator<B> for ResnetGenerator<B> {
    fn translate(&self, images: Tensor<B, 4>) -> GeneratorOutput<B> {
        let (image, difference) = self.forward(images);
        GeneratorOutput { image, difference }
    }
}

impl<B: Backend> PatchDiscriminator<B> for NLayerDiscriminator<B> {
    fn score(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self.forward(images)
    }
}

impl<B: Backend> PatchDiscriminator<B> for PixelDiscriminator<B> {
    fn score(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self.forward(images)
    }
}
