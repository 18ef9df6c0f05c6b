//! Error kinds for the MSM/RD engine.
//!
//! The integrator never retries: every fatal condition below aborts the
//! run that hit it. Variants carry whatever context the caller needs to
//! reproduce the failure (step index, offending pair, compound id).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MsmrdError {
    /// Rate-matrix row doesn't sum to the expected value, partition
    /// parameters are incompatible, or an unknown bodytype was supplied.
    /// Reported at construction time.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// A quaternion drifted past the renormalization tolerance during
    /// integration. Should never occur; indicates numerical drift beyond
    /// what silent renormalization can absorb.
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// Bookkeeping inconsistency (bound-state lists, compound membership)
    /// that should be structurally impossible.
    #[error("logic invariant violated at step {step}: {reason} (pair={pair:?}, compound={compound:?})")]
    LogicInvariant {
        reason: String,
        step: u64,
        pair: Option<(usize, usize)>,
        compound: Option<usize>,
    },

    /// Surfaced from a trajectory writer collaborator; the core treats it
    /// as fatal and aborts the run.
    #[error("I/O failure: {reason}")]
    IoFailure { reason: String },
}
