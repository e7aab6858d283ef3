//! CycleGAN-DN training step.
//!
//! One call to [`CycleGan::optimize_parameters`] runs the four generator
//! evaluations, scores the fakes with frozen discriminators, updates both
//! generators through a single backward pass, and then updates both
//! discriminators on pooled fakes with a second backward pass.
//!
//! Everything that can fail is evaluated before the first optimizer step. An
//! iteration that returns an error leaves the networks, the optimizer states and
//! the image pools as they were.

use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
    LearningRate,
};
use burn_extra_ops::TensorExtraOps;
use networks::{PatchDiscriminator, TranslationGenerator};
use serde::Serialize;

use crate::{
    config::{CycleGanConfig, Domain},
    error::{CycleGanError, CycleGanResult},
    image_pool::ImagePool,
    input::CycleGanInput,
    losses::{difference_consistency, l1_loss, GanLoss, GanLossConfig},
};

const G_A: usize = 0;
const G_B: usize = 1;
const D_A: usize = 0;
const D_B: usize = 1;

/// Tensors derived by one forward pass.
#[derive(Debug, Clone)]
pub struct ForwardOutput<B: Backend> {
    /// G_A(real_A).
    pub fake_b: Tensor<B, 4>,
    /// Difference map produced alongside `fake_b`.
    pub diff_a: Tensor<B, 4>,
    /// G_B(G_A(real_A)).
    pub rec_a: Tensor<B, 4>,
    /// G_B(real_B).
    pub fake_a: Tensor<B, 4>,
    /// Difference map produced alongside `fake_a`.
    pub diff_b: Tensor<B, 4>,
    /// G_A(G_B(real_B)).
    pub rec_b: Tensor<B, 4>,
}

/// The eight weighted generator terms of one iteration.
#[derive(Debug, Clone)]
pub struct GeneratorLosses<B: Backend> {
    pub g_a: Tensor<B, 1>,
    pub g_b: Tensor<B, 1>,
    pub cycle_a: Tensor<B, 1>,
    pub cycle_b: Tensor<B, 1>,
    pub idt_a: Tensor<B, 1>,
    pub idt_b: Tensor<B, 1>,
    pub diff_a: Tensor<B, 1>,
    pub diff_b: Tensor<B, 1>,
}

impl<B: Backend> GeneratorLosses<B> {
    /// Sum of all eight terms, the objective of the generator update.
    pub fn total(&self) -> Tensor<B, 1> {
        self.g_a.clone()
            + self.g_b.clone()
            + self.cycle_a.clone()
            + self.cycle_b.clone()
            + self.idt_a.clone()
            + self.idt_b.clone()
            + self.diff_a.clone()
            + self.diff_b.clone()
    }
}

/// Discriminator objectives of one iteration.
#[derive(Debug, Clone)]
pub struct DiscriminatorLosses<B: Backend> {
    pub d_a: Tensor<B, 1>,
    pub d_b: Tensor<B, 1>,
}

impl<B: Backend> DiscriminatorLosses<B> {
    /// Sum of both objectives. The two discriminators share no parameter, so one
    /// backward pass on the sum yields the gradients of each.
    pub fn total(&self) -> Tensor<B, 1> {
        self.d_a.clone() + self.d_b.clone()
    }
}

/// Scalar losses of one iteration, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleGanLosses {
    pub d_a: f32,
    pub g_a: f32,
    pub cycle_a: f32,
    pub idt_a: f32,
    pub diff_a: f32,
    pub d_b: f32,
    pub g_b: f32,
    pub cycle_b: f32,
    pub idt_b: f32,
    pub diff_b: f32,
}

impl CycleGanLosses {
    /// Reporting names, in the order of [`CycleGanLosses::iter`].
    pub const LOSS_NAMES: [&'static str; 10] = [
        "D_A", "G_A", "cycle_A", "idt_A", "diff_A", "D_B", "G_B", "cycle_B", "idt_B", "diff_B",
    ];

    const fn values(&self) -> [f32; 10] {
        [
            self.d_a,
            self.g_a,
            self.cycle_a,
            self.idt_a,
            self.diff_a,
            self.d_b,
            self.g_b,
            self.cycle_b,
            self.idt_b,
            self.diff_b,
        ]
    }

    /// `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> {
        Self::LOSS_NAMES.into_iter().zip(self.values())
    }

    /// Read all ten losses back from the device with a single transfer.
    fn collect<B: Backend>(generator: &GeneratorLosses<B>, discriminator: &DiscriminatorLosses<B>) -> Self {
        let stacked = Tensor::cat(
            vec![
                discriminator.d_a.clone(),
                generator.g_a.clone(),
                generator.cycle_a.clone(),
                generator.idt_a.clone(),
                generator.diff_a.clone(),
                discriminator.d_b.clone(),
                generator.g_b.clone(),
                generator.cycle_b.clone(),
                generator.idt_b.clone(),
                generator.diff_b.clone(),
            ],
            0,
        )
        .detach();

        let mut values = stacked.to_f32_vec().into_iter();
        let mut next = || values.next().unwrap_or(f32::NAN);

        Self {
            d_a: next(),
            g_a: next(),
            cycle_a: next(),
            idt_a: next(),
            diff_a: next(),
            d_b: next(),
            g_b: next(),
            cycle_b: next(),
            idt_b: next(),
            diff_b: next(),
        }
    }

    /// The first loss that is NaN or infinite.
    fn ensure_finite(&self) -> CycleGanResult<()> {
        match self.iter().find(|(_, value)| !value.is_finite()) {
            Some((name, value)) => Err(CycleGanError::NonFiniteLoss { name, value }),
            None => Ok(()),
        }
    }
}

/// Which update the discriminators are evaluated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Discriminators only score fakes; their parameters are frozen.
    Generator,
    /// Discriminators are being trained.
    Discriminator,
}

/// Losses and pool states of an iteration that passed every check.
struct PreparedIteration<B: Backend> {
    generator: GeneratorLosses<B>,
    discriminator: DiscriminatorLosses<B>,
    losses: CycleGanLosses,
    fake_a_pool: ImagePool<B>,
    fake_b_pool: ImagePool<B>,
}

/// CycleGAN-DN model: two generators, two discriminators and their optimizers.
///
/// A = source domain, B = target domain. `G_A: A -> B`, `G_B: B -> A`.
/// `D_A` tells `G_A(A)` from real B images, `D_B` tells `G_B(B)` from real A images.
pub struct CycleGan<B, G, D, OG, OD>
where
    B: AutodiffBackend,
    G: TranslationGenerator<B> + AutodiffModule<B>,
    D: PatchDiscriminator<B> + AutodiffModule<B>,
    OG: Optimizer<[G; 2], B>,
    OD: Optimizer<[D; 2], B>,
{
    config: CycleGanConfig,
    generators: [G; 2],
    discriminators: [D; 2],
    optimizer_g: OG,
    optimizer_d: OD,
    fake_a_pool: ImagePool<B>,
    fake_b_pool: ImagePool<B>,
    gan_loss: GanLoss<B>,
    learning_rate: LearningRate,
}

impl CycleGanConfig {
    /// Build a model that trains both network pairs with Adam.
    ///
    /// # Errors
    ///
    /// Returns `Err(CycleGanError::InvalidConfiguration)` if the configuration is invalid.
    #[allow(clippy::type_complexity)]
    pub fn init<B, G, D>(
        &self,
        g_a: G,
        g_b: G,
        d_a: D,
        d_b: D,
    ) -> CycleGanResult<CycleGan<B, G, D, impl Optimizer<[G; 2], B>, impl Optimizer<[D; 2], B>>>
    where
        B: AutodiffBackend,
        G: TranslationGenerator<B> + AutodiffModule<B>,
        D: PatchDiscriminator<B> + AutodiffModule<B>,
    {
        self.validate()?;

        let optimizer_g = self.optimizer.adam().init::<B, [G; 2]>();
        let optimizer_d = self.optimizer.adam().init::<B, [D; 2]>();

        CycleGan::new(self.clone(), [g_a, g_b], [d_a, d_b], optimizer_g, optimizer_d)
    }
}

impl<B, G, D, OG, OD> CycleGan<B, G, D, OG, OD>
where
    B: AutodiffBackend,
    G: TranslationGenerator<B> + AutodiffModule<B>,
    D: PatchDiscriminator<B> + AutodiffModule<B>,
    OG: Optimizer<[G; 2], B>,
    OD: Optimizer<[D; 2], B>,
{
    /// Assemble a model from `[G_A, G_B]`, `[D_A, D_B]` and one optimizer per pair.
    ///
    /// # Errors
    ///
    /// Returns `Err(CycleGanError::InvalidConfiguration)` if the configuration is invalid.
    pub fn new(
        config: CycleGanConfig,
        generators: [G; 2],
        discriminators: [D; 2],
        optimizer_g: OG,
        optimizer_d: OD,
    ) -> CycleGanResult<Self> {
        config.validate()?;

        tracing::info!(
            generator_params = generators.num_params(),
            discriminator_params = discriminators.num_params(),
            gan_mode = ?config.gan_mode,
            pool_size = config.pool_size,
            "CycleGAN-DN model created"
        );

        Ok(Self {
            fake_a_pool: ImagePool::new(config.pool_size, config.seed),
            fake_b_pool: ImagePool::new(config.pool_size, config.seed.wrapping_add(1)),
            gan_loss: GanLossConfig::new()
                .with_mode(config.gan_mode.clone())
                .init(),
            learning_rate: config.optimizer.learning_rate,
            config,
            generators,
            discriminators,
            optimizer_g,
            optimizer_d,
        })
    }

    pub const fn config(&self) -> &CycleGanConfig {
        &self.config
    }

    /// `[G_A, G_B]`.
    pub const fn generators(&self) -> &[G; 2] {
        &self.generators
    }

    /// `[D_A, D_B]`.
    pub const fn discriminators(&self) -> &[D; 2] {
        &self.discriminators
    }

    /// Learning rate used by the next optimizer steps.
    pub const fn learning_rate(&self) -> LearningRate {
        self.learning_rate
    }

    /// Change the learning rate of both optimizers, e.g. from an external schedule.
    pub fn set_learning_rate(&mut self, learning_rate: LearningRate) {
        tracing::info!(
            from = self.learning_rate,
            to = learning_rate,
            "learning rate updated"
        );
        self.learning_rate = learning_rate;
    }

    /// Run both generators forward, and each on the other's output.
    pub fn forward(&self, real_a: Tensor<B, 4>, real_b: Tensor<B, 4>) -> ForwardOutput<B> {
        Self::forward_with(&self.generators, real_a, real_b)
    }

    /// Forward pass without tracking gradients.
    pub fn test(&self, real_a: Tensor<B, 4>, real_b: Tensor<B, 4>) -> ForwardOutput<B> {
        let generators = self.generators.clone().no_grad();
        Self::forward_with(&generators, real_a.detach(), real_b.detach())
    }

    fn forward_with(generators: &[G; 2], real_a: Tensor<B, 4>, real_b: Tensor<B, 4>) -> ForwardOutput<B> {
        let [g_a, g_b] = generators;

        let translated_a = g_a.translate(real_a);
        let rec_a = g_b.translate(translated_a.image.clone()).image;
        let translated_b = g_b.translate(real_b);
        let rec_b = g_a.translate(translated_b.image.clone()).image;

        ForwardOutput {
            fake_b: translated_a.image,
            diff_a: translated_a.difference,
            rec_a,
            fake_a: translated_b.image,
            diff_b: translated_b.difference,
            rec_b,
        }
    }

    /// Discriminators as seen by the given phase. The generator phase gets a copy
    /// whose parameters do not require gradients.
    pub fn discriminator_view(&self, phase: Phase) -> [D; 2] {
        match phase {
            Phase::Generator => self.discriminators.clone().no_grad(),
            Phase::Discriminator => self.discriminators.clone(),
        }
    }

    /// Weighted generator terms.
    ///
    /// # Errors
    ///
    /// Returns `Err(CycleGanError::DegenerateDifferenceNorm)` or
    /// `Err(CycleGanError::InvalidTensorShape)` from the difference-consistency term.
    pub fn generator_losses(
        &self,
        input: &CycleGanInput<B>,
        forward: &ForwardOutput<B>,
        discriminators: &[D; 2],
    ) -> CycleGanResult<GeneratorLosses<B>> {
        let weights = &self.config.weights;
        let real_a = input.real_a().clone();
        let real_b = input.real_b().clone();

        let (idt_a, idt_b) = self.identity_losses(&real_a, &real_b);

        let (diff_a, diff_b) = match input {
            CycleGanInput::WithReference {
                real_diff_a,
                real_diff_b,
                ..
            } => {
                let min_norm = self.config.min_difference_norm;
                let diff_a = difference_consistency(
                    forward.diff_a.clone(),
                    real_diff_a.clone(),
                    min_norm,
                    Domain::A,
                )?;
                let diff_b = difference_consistency(
                    forward.diff_b.clone(),
                    real_diff_b.clone(),
                    min_norm,
                    Domain::B,
                )?;
                (
                    diff_a.mul_scalar(weights.lambda_a * weights.lambda_diff_source),
                    diff_b.mul_scalar(weights.lambda_b * weights.lambda_diff_target),
                )
            }
            CycleGanInput::Unpaired { .. } => (zero(&real_a.device()), zero(&real_a.device())),
        };

        let g_a = self
            .gan_loss
            .forward(discriminators[D_A].score(forward.fake_b.clone()), true);
        let g_b = self
            .gan_loss
            .forward(discriminators[D_B].score(forward.fake_a.clone()), true);

        let cycle_a = l1_loss(forward.rec_a.clone(), real_a).mul_scalar(weights.lambda_a);
        let cycle_b = l1_loss(forward.rec_b.clone(), real_b).mul_scalar(weights.lambda_b);

        Ok(GeneratorLosses {
            g_a,
            g_b,
            cycle_a,
            cycle_b,
            idt_a,
            idt_b,
            diff_a,
            diff_b,
        })
    }

    /// Identity terms. Generators are only evaluated on the inputs whose weight is non-zero.
    fn identity_losses(&self, real_a: &Tensor<B, 4>, real_b: &Tensor<B, 4>) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let weights = &self.config.weights;
        let device = real_a.device();
        let mut idt_a = zero(&device);
        let mut idt_b = zero(&device);

        if !weights.identity_enabled() {
            return (idt_a, idt_b);
        }

        let [g_a, g_b] = &self.generators;

        if weights.lambda_identity_target > 0.0 {
            let same_b = g_a.translate(real_b.clone()).image;
            let same_a = g_b.translate(real_a.clone()).image;
            idt_a = idt_a
                + l1_loss(same_b, real_b.clone())
                    .mul_scalar(weights.lambda_b * weights.lambda_identity_target);
            idt_b = idt_b
                + l1_loss(same_a, real_a.clone())
                    .mul_scalar(weights.lambda_a * weights.lambda_identity_target);
        }

        if weights.lambda_identity_source > 0.0 {
            let same_a = g_a.translate(real_a.clone()).image;
            let same_b = g_b.translate(real_b.clone()).image;
            idt_a = idt_a
                + l1_loss(same_a, real_a.clone())
                    .mul_scalar(weights.lambda_a * weights.lambda_identity_source);
            idt_b = idt_b
                + l1_loss(same_b, real_b.clone())
                    .mul_scalar(weights.lambda_b * weights.lambda_identity_source);
        }

        (idt_a, idt_b)
    }

    /// `D_A` on real B against pooled fake B, `D_B` on real A against pooled fake A.
    pub fn discriminator_losses(
        &self,
        input: &CycleGanInput<B>,
        pooled_fake_a: Tensor<B, 4>,
        pooled_fake_b: Tensor<B, 4>,
        discriminators: &[D; 2],
    ) -> DiscriminatorLosses<B> {
        let d_a = self.gan_loss.discriminator(
            &discriminators[D_A],
            input.real_b().clone(),
            pooled_fake_b,
        );
        let d_b = self.gan_loss.discriminator(
            &discriminators[D_B],
            input.real_a().clone(),
            pooled_fake_a,
        );

        DiscriminatorLosses { d_a, d_b }
    }

    /// Run one training iteration: update `G_A` and `G_B`, then `D_A` and `D_B`.
    ///
    /// # Errors
    ///
    /// - `CycleGanError::DegenerateDifferenceNorm` if a difference map has no magnitude.
    /// - `CycleGanError::NonFiniteLoss` if any of the ten losses is NaN or infinite.
    /// - `CycleGanError::InvalidTensorShape` if a reference map does not match the
    ///   generated one.
    ///
    /// No parameter, optimizer state or pool is changed when an error is returned.
    pub fn optimize_parameters(&mut self, input: &CycleGanInput<B>) -> CycleGanResult<CycleGanLosses> {
        let prepared = self.prepare(input).inspect_err(|error| {
            tracing::warn!(%error, "training iteration rejected");
        })?;

        self.step_generators(prepared.generator.total());
        self.step_discriminators(prepared.discriminator.total());
        self.fake_a_pool = prepared.fake_a_pool;
        self.fake_b_pool = prepared.fake_b_pool;

        let losses = prepared.losses;
        tracing::debug!(
            d_a = losses.d_a,
            g_a = losses.g_a,
            cycle_a = losses.cycle_a,
            idt_a = losses.idt_a,
            diff_a = losses.diff_a,
            d_b = losses.d_b,
            g_b = losses.g_b,
            cycle_b = losses.cycle_b,
            idt_b = losses.idt_b,
            diff_b = losses.diff_b,
            "training iteration"
        );

        Ok(losses)
    }

    /// Evaluate every loss of the iteration without touching `self`.
    fn prepare(&self, input: &CycleGanInput<B>) -> CycleGanResult<PreparedIteration<B>> {
        let forward = self.forward(input.real_a().clone(), input.real_b().clone());

        let frozen = self.discriminator_view(Phase::Generator);
        let generator = self.generator_losses(input, &forward, &frozen)?;

        let mut fake_a_pool = self.fake_a_pool.clone();
        let mut fake_b_pool = self.fake_b_pool.clone();
        let pooled_fake_b = fake_b_pool.query(forward.fake_b);
        let pooled_fake_a = fake_a_pool.query(forward.fake_a);

        let live = self.discriminator_view(Phase::Discriminator);
        let discriminator = self.discriminator_losses(input, pooled_fake_a, pooled_fake_b, &live);

        let losses = CycleGanLosses::collect(&generator, &discriminator);
        losses.ensure_finite()?;

        Ok(PreparedIteration {
            generator,
            discriminator,
            losses,
            fake_a_pool,
            fake_b_pool,
        })
    }

    fn step_generators(&mut self, loss: Tensor<B, 1>) {
        let grads = GradientsParams::from_grads::<B, _>(loss.backward(), &self.generators);
        self.generators = self
            .optimizer_g
            .step(self.learning_rate, self.generators.clone(), grads);
    }

    fn step_discriminators(&mut self, loss: Tensor<B, 1>) {
        let grads = GradientsParams::from_grads::<B, _>(loss.backward(), &self.discriminators);
        self.discriminators = self
            .optimizer_d
            .step(self.learning_rate, self.discriminators.clone(), grads);
    }
}

fn zero<B: Backend>(device: &B::Device) -> Tensor<B, 1> {
    Tensor::zeros([1], device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{LossWeightsConfig, OptimizerConfig},
        input::DomainBatch,
    };
    use burn::{
        backend::{ndarray::NdArray, Autodiff},
        tensor::Distribution,
    };
    use networks::{
        DifferenceMap, NLayerDiscriminator, NLayerDiscriminatorConfig, ResnetGenerator,
        ResnetGeneratorConfig,
    };

    type TestBackend = Autodiff<NdArray<f32>>;

    fn generator(input: usize, output: usize, difference: DifferenceMap) -> ResnetGenerator<TestBackend> {
        ResnetGeneratorConfig::new(input, output)
            .with_base_filters(2)
            .with_num_blocks(1)
            .with_difference(difference)
            .init(&Default::default())
    }

    fn discriminator(channels: usize) -> NLayerDiscriminator<TestBackend> {
        NLayerDiscriminatorConfig::new(channels)
            .with_base_filters(2)
            .with_num_layers(1)
            .init(&Default::default())
    }

    fn residual_config() -> CycleGanConfig {
        CycleGanConfig::new()
            .with_weights(
                LossWeightsConfig::new()
                    .with_lambda_a(10.0)
                    .with_lambda_b(10.0)
                    .with_lambda_identity_target(0.5)
                    .with_lambda_identity_source(0.0),
            )
            .with_pool_size(4)
            .with_optimizer(OptimizerConfig::new().with_learning_rate(0.01))
    }

    fn residual_model(
        config: &CycleGanConfig,
    ) -> CycleGan<
        TestBackend,
        ResnetGenerator<TestBackend>,
        NLayerDiscriminator<TestBackend>,
        impl Optimizer<[ResnetGenerator<TestBackend>; 2], TestBackend>,
        impl Optimizer<[NLayerDiscriminator<TestBackend>; 2], TestBackend>,
    > {
        config
            .init(
                generator(3, 3, DifferenceMap::Residual),
                generator(3, 3, DifferenceMap::Residual),
                discriminator(3),
                discriminator(3),
            )
            .unwrap()
    }

    fn random(shape: [usize; 4]) -> Tensor<TestBackend, 4> {
        Tensor::random(shape, Distribution::Uniform(-1.0, 1.0), &Default::default())
    }

    fn values(tensor: Tensor<TestBackend, 4>) -> Vec<f32> {
        tensor.to_f32_vec()
    }

    /// Outputs of all four networks on fixed probes, to detect parameter changes.
    struct Probe {
        generators: [Vec<f32>; 2],
        discriminators: [Vec<f32>; 2],
    }

    impl Probe {
        fn take<G, D>(generators: &[G; 2], discriminators: &[D; 2], images: &Tensor<TestBackend, 4>) -> Self
        where
            G: TranslationGenerator<TestBackend>,
            D: PatchDiscriminator<TestBackend>,
        {
            Self {
                generators: [
                    values(generators[G_A].translate(images.clone()).image),
                    values(generators[G_B].translate(images.clone()).image),
                ],
                discriminators: [
                    values(discriminators[D_A].score(images.clone())),
                    values(discriminators[D_B].score(images.clone())),
                ],
            }
        }
    }

    #[test]
    fn forward_keeps_shapes() {
        let model = residual_model(&residual_config());
        let real_a = random([2, 3, 16, 16]);
        let real_b = random([2, 3, 16, 16]);

        let output = model.forward(real_a, real_b);

        for tensor in [
            output.fake_b,
            output.diff_a,
            output.rec_a,
            output.fake_a,
            output.diff_b,
            output.rec_b,
        ] {
            assert_eq!(tensor.dims(), [2, 3, 16, 16]);
        }
    }

    #[test]
    fn identity_terms_are_lazy() {
        // A has 2 channels and B has 4, so any identity evaluation would fail.
        let config = CycleGanConfig::new()
            .with_input_channels(2)
            .with_output_channels(4)
            .with_weights(
                LossWeightsConfig::new()
                    .with_lambda_identity_target(0.0)
                    .with_lambda_identity_source(0.0),
            );
        let mut model = config
            .init(
                generator(2, 4, DifferenceMap::Temporal),
                generator(4, 2, DifferenceMap::Temporal),
                discriminator(4),
                discriminator(2),
            )
            .unwrap();
        let input = CycleGanInput::unpaired(random([1, 2, 8, 8]), random([1, 4, 8, 8]));

        let losses = model.optimize_parameters(&input).unwrap();

        assert_eq!(losses.idt_a, 0.0);
        assert_eq!(losses.idt_b, 0.0);
        assert_eq!(losses.diff_a, 0.0);
        assert_eq!(losses.diff_b, 0.0);
    }

    #[test]
    fn discriminator_loss_gives_no_generator_gradients() {
        let model = residual_model(&residual_config());
        let input = CycleGanInput::unpaired(random([1, 3, 8, 8]), random([1, 3, 8, 8]));
        let forward = model.forward(input.real_a().clone(), input.real_b().clone());
        let live = model.discriminator_view(Phase::Discriminator);

        let losses = model.discriminator_losses(&input, forward.fake_a, forward.fake_b, &live);
        let grads = losses.total().backward();

        let generator_grads = GradientsParams::from_grads::<TestBackend, _>(grads, &model.generators);
        assert!(generator_grads.is_empty());
    }

    #[test]
    fn generator_loss_gives_no_discriminator_gradients() {
        let model = residual_model(&residual_config());
        let input = CycleGanInput::unpaired(random([1, 3, 8, 8]), random([1, 3, 8, 8]));
        let forward = model.forward(input.real_a().clone(), input.real_b().clone());
        let frozen = model.discriminator_view(Phase::Generator);

        let grads = model
            .generator_losses(&input, &forward, &frozen)
            .unwrap()
            .total()
            .backward();

        let discriminator_grads =
            GradientsParams::from_grads::<TestBackend, _>(grads, &model.discriminators);
        assert!(discriminator_grads.is_empty());
    }

    #[test]
    fn generator_loss_reaches_both_generators() {
        let model = residual_model(&residual_config());
        let input = CycleGanInput::unpaired(random([1, 3, 8, 8]), random([1, 3, 8, 8]));
        let forward = model.forward(input.real_a().clone(), input.real_b().clone());
        let frozen = model.discriminator_view(Phase::Generator);

        let mut grads = model
            .generator_losses(&input, &forward, &frozen)
            .unwrap()
            .total()
            .backward();

        let [g_a, g_b] = &model.generators;
        assert!(!GradientsParams::from_module::<TestBackend, _>(&mut grads, g_a).is_empty());
        assert!(!GradientsParams::from_module::<TestBackend, _>(&mut grads, g_b).is_empty());
    }

    #[test]
    fn each_step_only_moves_its_own_pair() {
        let mut model = residual_model(&residual_config());
        let input = CycleGanInput::unpaired(random([1, 3, 8, 8]), random([1, 3, 8, 8]));
        let probe_images = random([1, 3, 8, 8]);

        let before = Probe::take(&model.generators, &model.discriminators, &probe_images);
        let forward = model.forward(input.real_a().clone(), input.real_b().clone());
        let frozen = model.discriminator_view(Phase::Generator);
        let generator_loss = model.generator_losses(&input, &forward, &frozen).unwrap().total();
        model.step_generators(generator_loss);
        let after_g = Probe::take(&model.generators, &model.discriminators, &probe_images);

        assert_ne!(before.generators[G_A], after_g.generators[G_A]);
        assert_ne!(before.generators[G_B], after_g.generators[G_B]);
        assert_eq!(before.discriminators[D_A], after_g.discriminators[D_A]);
        assert_eq!(before.discriminators[D_B], after_g.discriminators[D_B]);

        let live = model.discriminator_view(Phase::Discriminator);
        let discriminator_loss = model
            .discriminator_losses(&input, forward.fake_a, forward.fake_b, &live)
            .total();
        model.step_discriminators(discriminator_loss);
        let after_d = Probe::take(&model.generators, &model.discriminators, &probe_images);

        assert_eq!(after_g.generators[G_A], after_d.generators[G_A]);
        assert_eq!(after_g.generators[G_B], after_d.generators[G_B]);
        assert_ne!(after_g.discriminators[D_A], after_d.discriminators[D_A]);
        assert_ne!(after_g.discriminators[D_B], after_d.discriminators[D_B]);
    }

    #[test]
    fn full_iteration_on_remote_sensing_tiles() {
        let config = residual_config();
        let mut model = residual_model(&config);
        let device = Default::default();
        let batch = DomainBatch::new(random([1, 3, 256, 256]), random([1, 3, 256, 256]))
            .with_references(
                Tensor::random([1, 3, 256, 256], Distribution::Uniform(0.1, 1.0), &device),
                Tensor::random([1, 3, 256, 256], Distribution::Uniform(0.1, 1.0), &device),
            );
        let input = CycleGanInput::from_batch(batch, &crate::config::InputConfig::new()).unwrap();
        let probe_images = random([1, 3, 16, 16]);

        let before = Probe::take(&model.generators, &model.discriminators, &probe_images);
        let losses = model.optimize_parameters(&input).unwrap();
        let after = Probe::take(&model.generators, &model.discriminators, &probe_images);

        assert_eq!(losses.iter().count(), 10);
        assert!(losses.iter().all(|(_, value)| value.is_finite()));
        assert!(losses.idt_a > 0.0 && losses.idt_b > 0.0);
        assert!(losses.diff_a > 0.0 && losses.diff_b > 0.0);
        assert!(losses.d_a >= 0.0 && losses.d_b >= 0.0);
        for index in 0..2 {
            assert_ne!(before.generators[index], after.generators[index]);
            assert_ne!(before.discriminators[index], after.discriminators[index]);
        }
        assert_eq!(model.fake_a_pool.len(), 1);
        assert_eq!(model.fake_b_pool.len(), 1);
    }

    #[test]
    fn degenerate_reference_leaves_model_untouched() {
        let mut model = residual_model(&residual_config());
        let input = CycleGanInput::with_reference(
            random([1, 3, 8, 8]),
            random([1, 3, 8, 8]),
            Tensor::zeros([1, 3, 8, 8], &Default::default()),
            random([1, 3, 8, 8]),
        )
        .unwrap();
        let probe_images = random([1, 3, 8, 8]);

        let before = Probe::take(&model.generators, &model.discriminators, &probe_images);
        let result = model.optimize_parameters(&input);
        let after = Probe::take(&model.generators, &model.discriminators, &probe_images);

        match result {
            Err(CycleGanError::DegenerateDifferenceNorm { domain, map, .. }) => {
                assert_eq!(domain, Domain::A);
                assert_eq!(map, "reference");
            }
            _ => panic!("Expected DegenerateDifferenceNorm error"),
        }
        assert_eq!(before.generators, after.generators);
        assert_eq!(before.discriminators, after.discriminators);
        assert!(model.fake_a_pool.is_empty());
        assert!(model.fake_b_pool.is_empty());
    }

    #[test]
    fn inference_tracks_no_gradients() {
        let model = residual_model(&residual_config());
        let real_a = random([1, 3, 8, 8]).require_grad();

        let output = model.test(real_a.clone(), random([1, 3, 8, 8]));
        let grads = output.rec_a.sum().backward();

        assert!(real_a.grad(&grads).is_none());
    }

    #[test]
    fn learning_rate_can_be_changed() {
        let mut model = residual_model(&residual_config());
        assert_eq!(model.learning_rate(), 0.01);

        model.set_learning_rate(0.005);

        assert_eq!(model.learning_rate(), 0.005);
    }

    #[test]
    fn loss_names_follow_reporting_order() {
        let losses = CycleGanLosses {
            d_a: 0.0,
            g_a: 1.0,
            cycle_a: 2.0,
            idt_a: 3.0,
            diff_a: 4.0,
            d_b: 5.0,
            g_b: 6.0,
            cycle_b: 7.0,
            idt_b: 8.0,
            diff_b: 9.0,
        };

        for (index, (name, value)) in losses.iter().enumerate() {
            assert_eq!(name, CycleGanLosses::LOSS_NAMES[index]);
            assert_eq!(value, index as f32);
        }
    }

    #[test]
    fn non_finite_loss_is_named() {
        let mut losses = CycleGanLosses {
            d_a: 0.0,
            g_a: 0.0,
            cycle_a: 0.0,
            idt_a: 0.0,
            diff_a: 0.0,
            d_b: 0.0,
            g_b: 0.0,
            cycle_b: 0.0,
            idt_b: 0.0,
            diff_b: 0.0,
        };
        assert!(losses.ensure_finite().is_ok());

        losses.cycle_b = f32::NAN;

        match losses.ensure_finite() {
            Err(CycleGanError::NonFiniteLoss { name, .. }) => assert_eq!(name, "cycle_B"),
            _ => panic!("Expected NonFiniteLoss error"),
        }
    }
}
