use thiserror::Error;

use crate::config::Domain;

/// The error type for CycleGAN-DN operations.
///
/// Everything that can abort a training iteration is reported through this enum.
/// An iteration that returns an error has not stepped either optimizer.
#[derive(Error, Debug)]
pub enum CycleGanError {
    /// Error for when an invalid model configuration is provided.
    /// This can happen if configuration parameters are logically inconsistent.
    #[error("Invalid model configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error for when an input tensor has an invalid shape.
    #[error("Invalid input tensor shape for {tensor}: expected {expected}, got {actual}")]
    InvalidTensorShape {
        /// Which tensor was rejected.
        tensor: String,
        /// The expected tensor shape.
        expected: String,
        /// The actual tensor shape.
        actual: String,
    },

    /// A training batch of the remote-sensing dataset came without its reference difference map.
    #[error("Missing reference difference map for domain {domain}")]
    MissingReference {
        /// Domain whose reference is missing, after applying the direction.
        domain: Domain,
    },

    /// A difference map has a (near) zero magnitude, so it has no direction to compare.
    #[error("Degenerate {map} difference map for domain {domain}: sample {sample} has norm {norm}")]
    DegenerateDifferenceNorm {
        /// Domain of the difference-consistency term.
        domain: Domain,
        /// `"reference"` or `"generated"`.
        map: &'static str,
        /// Index of the offending sample in the batch.
        sample: usize,
        /// The measured per-sample magnitude.
        norm: f32,
    },

    /// A loss evaluated to NaN or infinity.
    #[error("Loss {name} is not finite: {value}")]
    NonFiniteLoss {
        /// Reported loss name, e.g. `cycle_A`.
        name: &'static str,
        /// The offending value.
        value: f32,
    },
}

/// A specialized `Result` type for CycleGAN-DN operations.
pub type CycleGanResult<T> = Result<T, CycleGanError>;
