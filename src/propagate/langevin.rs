//! Over-damped Langevin translation/rotation update.
//!
//! Potentials are expressed as one pair of `Option<Quat>`-parameterized
//! traits rather than separate point/rod/rigid-solid families, matched at
//! call sites by `BodyType` instead.

use crate::math::axis_angle_to_quat;
use crate::particle::Particle;
use crate::random::RngSource;
use glam::{Quat, Vec3};

#[derive(Clone, Copy, Default, Debug)]
pub struct ForceTorque {
    pub force: Vec3,
    pub torque: Vec3,
}

/// A potential acting on a single particle against an external field.
/// `orientation` is `None` for [`crate::particle::BodyType::Point`] bodies.
pub trait ExternalPotential: Send + Sync {
    fn evaluate(&self, pos: Vec3, orientation: Option<Quat>) -> f64;
    fn force_torque(&self, pos: Vec3, orientation: Option<Quat>) -> ForceTorque;
}

/// A potential between two particles. Returns the force/torque acting on
/// particle 1; the force on particle 2 is its negation (Newton's third
/// law), torque on particle 2 is computed by the caller from its own
/// orientation.
pub trait PairPotential: Send + Sync {
    fn evaluate(&self, pos1: Vec3, pos2: Vec3, o1: Option<Quat>, o2: Option<Quat>) -> f64;
    fn force_torque(
        &self,
        pos1: Vec3,
        pos2: Vec3,
        o1: Option<Quat>,
        o2: Option<Quat>,
    ) -> (ForceTorque, ForceTorque);
}

/// A potential that never contributes; used when a particle has no
/// external field and the call site still wants a concrete value.
pub struct NullExternalPotential;

impl ExternalPotential for NullExternalPotential {
    fn evaluate(&self, _pos: Vec3, _orientation: Option<Quat>) -> f64 {
        0.0
    }

    fn force_torque(&self, _pos: Vec3, _orientation: Option<Quat>) -> ForceTorque {
        ForceTorque::default()
    }
}

pub struct NullPairPotential;

impl PairPotential for NullPairPotential {
    fn evaluate(&self, _pos1: Vec3, _pos2: Vec3, _o1: Option<Quat>, _o2: Option<Quat>) -> f64 {
        0.0
    }

    fn force_torque(
        &self,
        _pos1: Vec3,
        _pos2: Vec3,
        _o1: Option<Quat>,
        _o2: Option<Quat>,
    ) -> (ForceTorque, ForceTorque) {
        (ForceTorque::default(), ForceTorque::default())
    }
}

/// Displaces `particle` by one Euler-Maruyama step under `force` over
/// `dt`: `dr = force * dt * D / kb_t + sqrt(2 * dt * D) * N(0,1)^3`.
pub fn step_translation(
    particle: &Particle,
    force: Vec3,
    dt: f64,
    kb_t: f64,
    rng: &mut dyn RngSource,
) -> Vec3 {
    let drift = force * ((dt * particle.d_trans / kb_t) as f32);
    let noise_scale = (2.0 * dt * particle.d_trans).sqrt() as f32;
    let noise = Vec3::new(rng.gaussian() as f32, rng.gaussian() as f32, rng.gaussian() as f32);
    particle.position + drift + noise * noise_scale
}

/// Applies one Euler-Maruyama rotational step under `torque` over `dt` to
/// `particle` in place, via an axis-angle delta construction:
/// `dphi = torque * dt * Drot / kb_t + sqrt(2 * dt * Drot) * N(0,1)^3`,
/// then `orientation' = exp(dphi) * orientation`. For rod-like bodies the
/// same rotation delta is applied to `rod_axis` so the stored axis tracks
/// the body frame instead of drifting away from it.
pub fn step_rotation(
    particle: &mut Particle,
    torque: Vec3,
    dt: f64,
    kb_t: f64,
    rng: &mut dyn RngSource,
) {
    let drift = torque * ((dt * particle.d_rot / kb_t) as f32);
    let noise_scale = (2.0 * dt * particle.d_rot).sqrt() as f32;
    let noise = Vec3::new(rng.gaussian() as f32, rng.gaussian() as f32, rng.gaussian() as f32);
    let dphi = drift + noise * noise_scale;
    let angle = dphi.length();
    let dquat = if angle < 1.0e-12 {
        Quat::IDENTITY
    } else {
        axis_angle_to_quat(dphi / angle, angle)
    };
    particle.orientation = (dquat * particle.orientation).normalize();
    if let Some(axis) = particle.rod_axis {
        particle.rod_axis = Some(dquat * axis);
    }
}
