//! Lagtime-synchronized integration: runs over-damped Langevin sub-steps
//! while keeping a particle's Markov-state clock in sync with the outer
//! fixed timestep.
//!
//! Interleaves propagating the Markov state (when due) with translation/
//! rotation sub-steps over whatever fraction of `dt` remains before the
//! next propagation is due, carrying the remainder lagtime into the next
//! outer step. The force/torque recomputation is folded into the same
//! sub-step loop via a caller-supplied closure, so a particle can keep
//! responding to pair/external potentials between Markov resyncs instead
//! of assuming free diffusion throughout.

use crate::markov::MarkovModel;
use crate::particle::Particle;
use crate::propagate::langevin::{step_rotation, step_translation, ForceTorque};
use crate::random::RngSource;

/// Advances `particle` by exactly `dt`, propagating its Markov state via
/// `msm` as many times as its `lagtime` requires and updating
/// `d_trans`/`d_rot` to match the new state after each propagation.
/// `force_torque_fn` is called once per sub-step to evaluate the
/// force/torque acting on the particle at its current position/orientation.
pub fn resync_msm(
    particle: &mut Particle,
    dt: f64,
    msm: &MarkovModel,
    kb_t: f64,
    rng: &mut dyn RngSource,
    mut force_torque_fn: impl FnMut(&Particle) -> ForceTorque,
) {
    if particle.lagtime > dt {
        let ft = force_torque_fn(particle);
        particle.position = step_translation(particle, ft.force, dt, kb_t, rng);
        step_rotation(particle, ft.torque, dt, kb_t, rng);
        particle.lagtime -= dt;
        particle.propagate_tmsm = particle.lagtime == 0.0;
        return;
    }

    let mut elapsed = 0.0;
    while elapsed < dt {
        if particle.propagate_tmsm {
            let (dwell, next_state) = msm.calculate_transition(particle.msm_state.max(1), rng);
            particle.msm_state = next_state;
            particle.lagtime = dwell;
            let row = msm.get_msm_index(next_state) as usize;
            particle.d_trans = msm.d_list[row];
            particle.d_rot = msm.d_rot_list[row];
        }

        let ft = force_torque_fn(particle);
        if elapsed + particle.lagtime < dt {
            particle.position = step_translation(particle, ft.force, particle.lagtime, kb_t, rng);
            step_rotation(particle, ft.torque, particle.lagtime, kb_t, rng);
            elapsed += particle.lagtime;
            particle.propagate_tmsm = true;
        } else {
            let remaining = dt - elapsed;
            particle.position = step_translation(particle, ft.force, remaining, kb_t, rng);
            step_rotation(particle, ft.torque, remaining, kb_t, rng);
            particle.lagtime = particle.lagtime + elapsed - dt;
            elapsed = dt;
            particle.propagate_tmsm = particle.lagtime == 0.0;
        }
    }
}
