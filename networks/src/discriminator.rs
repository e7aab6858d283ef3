//! PatchGAN discriminators.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        InstanceNorm, InstanceNormConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::leaky_relu,
};

use crate::generator::initializer;

const NEGATIVE_SLOPE: f64 = 0.2;
const MAX_FILTER_MULT: usize = 8;

/// Configuration for [`NLayerDiscriminator`].
#[derive(Config, Debug)]
pub struct NLayerDiscriminatorConfig {
    /// Channels of the scored batch.
    pub input_channels: usize,
    /// Filters of the first convolution.
    #[config(default = "64")]
    pub base_filters: usize,
    /// Number of stride-2 convolutions after the first one, plus one.
    #[config(default = "3")]
    pub num_layers: usize,
}

impl NLayerDiscriminatorConfig {
    /// Initialize a new [`NLayerDiscriminator`].
    pub fn init<B: Backend>(&self, device: &B::Device) -> NLayerDiscriminator<B> {
        let conv = |in_channels: usize, out_channels: usize, stride: usize| {
            Conv2dConfig::new([in_channels, out_channels], [4, 4])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_initializer(initializer())
                .init(device)
        };
        let filters = |n: usize| self.base_filters * (1 << n).min(MAX_FILTER_MULT);

        let input = conv(self.input_channels, self.base_filters, 2);

        let mut layers = Vec::with_capacity(self.num_layers);
        for n in 1..=self.num_layers {
            let stride = if n < self.num_layers { 2 } else { 1 };
            layers.push(ConvNormBlock {
                conv: conv(filters(n - 1), filters(n), stride),
                norm: InstanceNormConfig::new(filters(n))
                    .with_affine(false)
                    .init(device),
            });
        }

        NLayerDiscriminator {
            input,
            layers,
            head: conv(filters(self.num_layers), 1, 1),
        }
    }
}

/// PatchGAN discriminator: each output element scores one receptive-field patch.
#[derive(Module, Debug)]
pub struct NLayerDiscriminator<B: Backend> {
    input: Conv2d<B>,
    layers: Vec<ConvNormBlock<B>>,
    head: Conv2d<B>,
}

impl<B: Backend> NLayerDiscriminator<B> {
    /// Forward pass.
    ///
    /// # Shapes
    /// - input: `[batch_size, input_channels, height, width]`
    /// - output: `[batch_size, 1, patches_h, patches_w]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = leaky_relu(self.input.forward(input), NEGATIVE_SLOPE);
        for layer in &self.layers {
            x = layer.forward(x);
        }
        self.head.forward(x)
    }
}

/// Convolution, instance norm, leaky ReLU.
#[derive(Module, Debug)]
pub struct ConvNormBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: InstanceNorm<B>,
}

impl<B: Backend> ConvNormBlock<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.norm.forward(self.conv.forward(input));
        leaky_relu(out, NEGATIVE_SLOPE)
    }
}

/// Configuration for [`PixelDiscriminator`].
#[derive(Config, Debug)]
pub struct PixelDiscriminatorConfig {
    pub input_channels: usize,
    #[config(default = "64")]
    pub base_filters: usize,
}

impl PixelDiscriminatorConfig {
    /// Initialize a new [`PixelDiscriminator`].
    pub fn init<B: Backend>(&self, device: &B::Device) -> PixelDiscriminator<B> {
        let pointwise = |in_channels: usize, out_channels: usize, bias: bool| {
            Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_bias(bias)
                .with_initializer(initializer())
                .init(device)
        };

        PixelDiscriminator {
            conv1: pointwise(self.input_channels, self.base_filters, true),
            conv2: pointwise(self.base_filters, self.base_filters * 2, false),
            norm2: InstanceNormConfig::new(self.base_filters * 2)
                .with_affine(false)
                .init(device),
            conv3: pointwise(self.base_filters * 2, 1, false),
        }
    }
}

/// 1x1 PatchGAN: scores every pixel independently.
#[derive(Module, Debug)]
pub struct PixelDiscriminator<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    norm2: InstanceNorm<B>,
    conv3: Conv2d<B>,
}

impl<B: Backend> PixelDiscriminator<B> {
    /// Forward pass. The output keeps the input resolution.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = leaky_relu(self.conv1.forward(input), NEGATIVE_SLOPE);
        let x = self.norm2.forward(self.conv2.forward(x));
        let x = leaky_relu(x, NEGATIVE_SLOPE);
        self.conv3.forward(x)
    }
}
