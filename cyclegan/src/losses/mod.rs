//! Loss functions of the CycleGAN-DN training step.
//!
//! Adversarial terms for both network roles, the L1 distance used by the cycle
//! and identity terms, and the difference-consistency term that aligns the
//! generated change map with the reference one.

pub mod difference;
pub mod gan;
pub mod mae;

pub use difference::difference_consistency;
pub use gan::{GanLoss, GanLossConfig};
pub use mae::l1_loss;
