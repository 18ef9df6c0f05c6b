//! MSM/RD coupling engine: a hybrid stochastic simulator fusing
//! over-damped Langevin particle dynamics with a discrete Markov-state
//! model of binding and conformational change.
//!
//! The crate is organized leaves-first, matching the dependency order
//! described for the simulation core: math/random/partition primitives at
//! the bottom, the particle and Markov models above them, the Langevin and
//! Markov-switching propagators above those, and the event manager,
//! compound registry, and integrator tying everything together at the top.

pub mod compound;
pub mod config;
pub mod error;
pub mod event;
pub mod integrator;
pub mod markov;
pub mod math;
pub mod particle;
pub mod partition;
pub mod propagate;
pub mod random;

pub use compound::{Compound, CompoundRegistry};
pub use config::{BoundStateTolerance, CouplingMode, SimulationConfig};
pub use error::MsmrdError;
pub use event::{Event, EventKind, EventManager};
pub use integrator::{Integrator, MAX_VALENCE};
pub use markov::{MarkovModel, TimeKind};
pub use particle::{BodyType, BoundPeer, Particle};
pub use partition::{PositionOrientationPartition, QuaternionPartition, SpherePartition, UNBOUND_SECTION};
pub use propagate::{ExternalPotential, ForceTorque, PairPotential};
pub use random::{RngSource, SeededRng};
