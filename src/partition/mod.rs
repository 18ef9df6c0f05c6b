//! Discretization of position and orientation space.
//!
//! `position_orientation::PositionOrientationPartition::section_of` expects
//! `delta_r` already rotated into particle 1's reference frame — the
//! caller supplies `particle[i].orientation.conjugate() * delta_r`, which
//! is equivalent to fixing the surface partition to particle 1 and
//! rotating the relative position back into its frame rather than rotating
//! the (much larger) partition itself.

pub mod position_orientation;
pub mod quaternion;
pub mod sphere;

pub use position_orientation::{PositionOrientationPartition, UNBOUND_SECTION};
pub use quaternion::QuaternionPartition;
pub use sphere::SpherePartition;
