//! Over-damped Langevin propagation and Markov-state lagtime-switching.

pub mod langevin;
pub mod msm_switch;

pub use langevin::{ExternalPotential, ForceTorque, PairPotential};
pub use msm_switch::resync_msm;
