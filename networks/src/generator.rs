//! ResNet generator with an auxiliary difference map.
//!
//! Layout follows the CycleGAN ResNet generator: a 7x7 stem, strided
//! downsampling convolutions, a stack of residual blocks, transposed
//! convolutions back to the input resolution and a 7x7 projection head.
//! Instance normalisation is used throughout.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        Initializer, InstanceNorm, InstanceNormConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
    tensor::activation::tanh,
};

/// Weights are drawn from N(0, 0.02), as in the pix2pix/CycleGAN family.
pub(crate) const fn initializer() -> Initializer {
    Initializer::Normal {
        mean: 0.0,
        std: 0.02,
    }
}

/// How the generator derives its difference map from the translated batch.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum DifferenceMap {
    /// Input and output stack two acquisitions along the channel axis.
    /// The map is the second acquisition minus the first.
    Temporal,
    /// The map is the translated batch minus the input batch.
    Residual,
}

/// Configuration for [`ResnetGenerator`].
#[derive(Config, Debug)]
pub struct ResnetGeneratorConfig {
    /// Channels of the input batch.
    pub input_channels: usize,
    /// Channels of the translated batch.
    pub output_channels: usize,
    /// Filters of the first convolution.
    #[config(default = "64")]
    pub base_filters: usize,
    /// Number of residual blocks at the bottleneck.
    #[config(default = "9")]
    pub num_blocks: usize,
    /// Number of stride-2 stages. Input height and width must be divisible by `2^num_downsampling`.
    #[config(default = "2")]
    pub num_downsampling: usize,
    /// Skip the final `tanh`.
    #[config(default = "false")]
    pub linear_output: bool,
    /// Difference map derivation.
    #[config(default = "DifferenceMap::Temporal")]
    pub difference: DifferenceMap,
}

impl ResnetGeneratorConfig {
    /// Initialize a new [`ResnetGenerator`].
    ///
    /// # Panics
    ///
    /// Panics if `Temporal` is selected with an odd number of output channels, or
    /// `Residual` with differing input and output channels.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResnetGenerator<B> {
        match self.difference {
            DifferenceMap::Temporal => assert!(
                self.output_channels % 2 == 0,
                "Temporal difference maps need an even number of output channels, got {}",
                self.output_channels
            ),
            DifferenceMap::Residual => assert_eq!(
                self.input_channels, self.output_channels,
                "Residual difference maps need matching input and output channels"
            ),
        }

        let stem = ConvNormRelu::new(self.input_channels, self.base_filters, 7, 1, 3, device);

        let mut channels = self.base_filters;
        let down = (0..self.num_downsampling)
            .map(|_| {
                let layer = ConvNormRelu::new(channels, channels * 2, 3, 2, 1, device);
                channels *= 2;
                layer
            })
            .collect();

        let blocks = (0..self.num_blocks)
            .map(|_| ResnetBlock::new(channels, device))
            .collect();

        let up = (0..self.num_downsampling)
            .map(|_| {
                let layer = UpBlock::new(channels, channels / 2, device);
                channels /= 2;
                layer
            })
            .collect();

        let head = Conv2dConfig::new([channels, self.output_channels], [7, 7])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_initializer(initializer())
            .init(device);

        ResnetGenerator {
            stem,
            down,
            blocks,
            up,
            head,
            linear_output: self.linear_output,
            temporal: self.difference == DifferenceMap::Temporal,
        }
    }
}

/// ResNet generator returning the translated batch and a difference map.
#[derive(Module, Debug)]
pub struct ResnetGenerator<B: Backend> {
    stem: ConvNormRelu<B>,
    down: Vec<ConvNormRelu<B>>,
    blocks: Vec<ResnetBlock<B>>,
    up: Vec<UpBlock<B>>,
    head: Conv2d<B>,
    linear_output: bool,
    temporal: bool,
}

impl<B: Backend> ResnetGenerator<B> {
    /// Forward pass.
    ///
    /// # Shapes
    /// - input: `[batch_size, input_channels, height, width]`
    /// - image: `[batch_size, output_channels, height, width]`
    /// - difference: `[batch_size, output_channels / 2, height, width]` (temporal) or
    ///   `[batch_size, output_channels, height, width]` (residual)
    pub fn forward(&self, input: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let mut x = self.stem.forward(input.clone());
        for layer in &self.down {
            x = layer.forward(x);
        }
        for block in &self.blocks {
            x = block.forward(x);
        }
        for layer in &self.up {
            x = layer.forward(x);
        }
        let x = self.head.forward(x);
        let image = if self.linear_output { x } else { tanh(x) };

        let difference = if self.temporal {
            let half = image.dims()[1] / 2;
            image.clone().narrow(1, half, half) - image.clone().narrow(1, 0, half)
        } else {
            image.clone() - input
        };

        (image, difference)
    }
}

/// Convolution, instance norm, ReLU.
#[derive(Module, Debug)]
pub struct ConvNormRelu<B: Backend> {
    conv: Conv2d<B>,
    norm: InstanceNorm<B>,
    relu: Relu,
}

impl<B: Backend> ConvNormRelu<B> {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
        stride: usize,
        padding: usize,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel, kernel])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .with_initializer(initializer())
            .init(device);

        Self {
            conv,
            norm: InstanceNormConfig::new(out_channels)
                .with_affine(false)
                .init(device),
            relu: Relu::new(),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.conv.forward(input);
        let out = self.norm.forward(out);
        self.relu.forward(out)
    }
}

/// Transposed convolution doubling the resolution, instance norm, ReLU.
#[derive(Module, Debug)]
pub struct UpBlock<B: Backend> {
    conv: ConvTranspose2d<B>,
    norm: InstanceNorm<B>,
    relu: Relu,
}

impl<B: Backend> UpBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = ConvTranspose2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([2, 2])
            .with_padding([1, 1])
            .with_padding_out([1, 1])
            .with_initializer(initializer())
            .init(device);

        Self {
            conv,
            norm: InstanceNormConfig::new(out_channels)
                .with_affine(false)
                .init(device),
            relu: Relu::new(),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.conv.forward(input);
        let out = self.norm.forward(out);
        self.relu.forward(out)
    }
}

/// Residual block: two 3x3 convolutions with a skip connection.
#[derive(Module, Debug)]
pub struct ResnetBlock<B: Backend> {
    conv1: ConvNormRelu<B>,
    conv2: Conv2d<B>,
    norm2: InstanceNorm<B>,
}

impl<B: Backend> ResnetBlock<B> {
    /// Create a new residual block keeping `channels` constant.
    pub fn new(channels: usize, device: &B::Device) -> Self {
        let conv2 = Conv2dConfig::new([channels, channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_initializer(initializer())
            .init(device);

        Self {
            conv1: ConvNormRelu::new(channels, channels, 3, 1, 1, device),
            conv2,
            norm2: InstanceNormConfig::new(channels)
                .with_affine(false)
                .init(device),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.conv1.forward(input.clone());
        let out = self.conv2.forward(out);
        input + self.norm2.forward(out)
    }
}
