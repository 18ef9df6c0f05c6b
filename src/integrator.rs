//! MSM/RD integrator: the main control loop tying together partitions, the
//! Markov model, the Langevin propagator, the event manager, and the
//! compound registry.
//!
//! Each call to [`Integrator::step`] runs six phases in order: diffuse all
//! active particles, advance the event clock, schedule new transitions from
//! both free (transition-state) and bound pairs, fire whatever events are
//! now due, and drop any event whose precondition no longer holds.

use crate::compound::CompoundRegistry;
use crate::config::CouplingMode;
use crate::error::MsmrdError;
use crate::event::{Event, EventKind, EventManager};
use crate::markov::MarkovModel;
use crate::math::renormalize_if_drifted;
use crate::particle::{BoundPeer, Particle};
use crate::partition::{PositionOrientationPartition, UNBOUND_SECTION};
use crate::propagate::langevin::{ExternalPotential, ForceTorque, PairPotential};
use crate::propagate::msm_switch::resync_msm;
use crate::random::RngSource;
use glam::{Quat, Vec3};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Two-patch valence: a particle can bind to at most this many peers at
/// once (the two-patch case).
pub const MAX_VALENCE: usize = 2;

/// How far a quaternion's norm may drift from 1 during a step before it is
/// treated as a real bug rather than float noise: renormalize silently
/// within this tolerance, fatal past it.
const GEOMETRY_DRIFT_TOLERANCE: f64 = 1.0e-6;

pub struct Integrator {
    pub particles: Vec<Particle>,
    pub compounds: CompoundRegistry,
    events: EventManager,
    partition: PositionOrientationPartition,
    markov: MarkovModel,
    dt: f64,
    kb_t: f64,
    step_count: u64,
    compaction_stride: u64,
    coupling_mode: CouplingMode,
    /// `CouplingMode::CoreMsm` bookkeeping: the last discrete section
    /// reported for each in-cutoff, unbound pair, so repeated geometric
    /// jitter across a section boundary doesn't get reported as a fresh
    /// transition until an actual event fires. Unused under
    /// `FullDiscretization`.
    core_msm_last_section: HashMap<(usize, usize), u32>,
}

impl Integrator {
    pub fn new(
        particles: Vec<Particle>,
        partition: PositionOrientationPartition,
        markov: MarkovModel,
        dt: f64,
        kb_t: f64,
        compaction_stride: u64,
        coupling_mode: CouplingMode,
    ) -> Self {
        Self {
            particles,
            compounds: CompoundRegistry::new(),
            events: EventManager::new(),
            partition,
            markov,
            dt,
            kb_t,
            step_count: 0,
            compaction_stride,
            coupling_mode,
            core_msm_last_section: HashMap::new(),
        }
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Drives `steps` calls to [`Integrator::step`], invoking `sample` with
    /// the step index and the current particle slice every `sample_stride`
    /// steps (stride 0 disables sampling). This crate never writes a
    /// trajectory itself; `sample` is the caller's hook for that.
    pub fn run<S: FnMut(u64, &[Particle])>(
        &mut self,
        steps: u64,
        rng: &mut dyn RngSource,
        external_potential: &dyn ExternalPotential,
        pair_potential: &dyn PairPotential,
        sample_stride: u64,
        mut sample: S,
    ) -> Result<(), MsmrdError> {
        for _ in 0..steps {
            self.step(rng, external_potential, pair_potential)?;
            if sample_stride != 0 && self.step_count % sample_stride == 0 {
                sample(self.step_count, &self.particles);
            }
        }
        Ok(())
    }

    /// Advances the simulation by one fixed timestep: diffuse, decrement,
    /// schedule-from-transition, schedule-from-bound, fire, cleanup.
    #[instrument(skip_all, fields(step = self.step_count))]
    pub fn step(
        &mut self,
        rng: &mut dyn RngSource,
        external_potential: &dyn ExternalPotential,
        pair_potential: &dyn PairPotential,
    ) -> Result<(), MsmrdError> {
        self.diffuse(rng, external_potential, pair_potential)?;
        self.events.advance(self.dt);
        self.compute_transitions_from_transition_states(rng)?;
        self.compute_transitions_from_bound_states(rng)?;
        self.fire_ready_events(rng)?;
        self.remove_unrealized_events();

        self.step_count += 1;
        if self.step_count % self.compaction_stride == 0 {
            self.compact_compounds();
        }
        Ok(())
    }

    /// Integrates all active particles. A particle that is a
    /// non-representative member of a compound is pinned to the
    /// representative's frame rather than independently diffused; the
    /// representative itself is derived at query time rather than stored.
    fn diffuse(
        &mut self,
        rng: &mut dyn RngSource,
        external_potential: &dyn ExternalPotential,
        pair_potential: &dyn PairPotential,
    ) -> Result<(), MsmrdError> {
        let pinned: Vec<(usize, usize)> = self
            .particles
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| p.compound_id.map(|c| (idx, c)))
            .filter(|&(idx, c)| self.compounds.get(c).representative() != idx)
            .collect();

        // A particle is independently simulated ("active") iff it belongs
        // to no compound, or it is that compound's representative — derived
        // here once per step rather than stored on the particle, so it can
        // never desync from which particle a merge actually left in charge.
        let active_mask: Vec<bool> = self
            .particles
            .iter()
            .enumerate()
            .map(|(idx, p)| match p.compound_id {
                None => true,
                Some(c) => self.compounds.get(c).representative() == idx,
            })
            .collect();

        // Snapshot positions/orientations before mutating: force/torque
        // evaluation for this step reads the state as of the start of the
        // diffuse phase, not partially-updated peers: potentials are
        // read-only and may be invoked in any order, which only holds if
        // they all see the same snapshot.
        let snapshot = self.particles.clone();
        let dt = self.dt;
        let kb_t = self.kb_t;

        for i in 0..self.particles.len() {
            if pinned.iter().any(|&(idx, _)| idx == i) {
                continue;
            }
            resync_msm(
                &mut self.particles[i],
                dt,
                &self.markov,
                kb_t,
                rng,
                |p| {
                    let mut ft = pair_force_torque(i, p, &snapshot, &active_mask, pair_potential);
                    let orientation = (!matches!(p.bodytype, crate::particle::BodyType::Point))
                        .then_some(p.orientation);
                    let external = external_potential.force_torque(p.position, orientation);
                    ft.force += external.force;
                    ft.torque += external.torque;
                    ft
                },
            );
            self.particles[i].orientation =
                renormalize_if_drifted(self.particles[i].orientation, GEOMETRY_DRIFT_TOLERANCE)?;
        }

        for &(idx, compound_id) in &pinned {
            let rep = self.compounds.get(compound_id).representative();
            let rep_particle = self.particles[rep].clone();
            let reference = self.compounds.get(compound_id).position_reference;
            let orientation_reference = self.compounds.get(compound_id).orientation_reference;
            let delta = rep_particle.orientation * orientation_reference.conjugate();
            let offset = rep_particle.position - delta * reference;
            self.particles[idx].position = delta * self.particles[idx].position + offset;
            self.particles[idx].orientation = renormalize_if_drifted(
                delta * self.particles[idx].orientation,
                GEOMETRY_DRIFT_TOLERANCE,
            )?;
        }

        Ok(())
    }

    /// Schedules a transition for every free pair that has entered a
    /// transition section.
    fn compute_transitions_from_transition_states(
        &mut self,
        rng: &mut dyn RngSource,
    ) -> Result<(), MsmrdError> {
        let n = self.particles.len();
        let base = self.markov.max_bound_states();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.particles[i].free_slots(MAX_VALENCE) == 0
                    || self.particles[j].free_slots(MAX_VALENCE) == 0
                {
                    continue;
                }

                let previous = self.events.get_event(i, j);
                let current_section = match previous.kind {
                    EventKind::Empty => self.section_for_transition(i, j),
                    EventKind::InTransition => {
                        self.events.remove_event(i, j);
                        Some(previous.end_state)
                    }
                    _ => None,
                };

                let Some(section) = current_section else {
                    continue;
                };
                if section == UNBOUND_SECTION {
                    continue;
                }

                let (dwell, next) = self.markov.calculate_transition(section, rng);
                let kind = if next <= base {
                    EventKind::Binding
                } else {
                    EventKind::Transition2Transition
                };
                self.events.add_event(dwell, i, j, section, next, kind);
            }
        }
        Ok(())
    }

    /// Schedules a transition for every already-bound pair.
    fn compute_transitions_from_bound_states(
        &mut self,
        rng: &mut dyn RngSource,
    ) -> Result<(), MsmrdError> {
        let base = self.markov.max_bound_states();
        let n = self.particles.len();
        for i in 0..n {
            let bound_peers: Vec<BoundPeer> = self.particles[i].bound.clone();
            for peer in bound_peers {
                if peer.peer <= i {
                    continue;
                }
                let previous = self.events.get_event(i, peer.peer);
                if previous.kind != EventKind::Empty {
                    continue;
                }
                let (dwell, next) = self.markov.calculate_transition(peer.bound_state, rng);
                let kind = if next <= base {
                    EventKind::Bound2Bound
                } else {
                    EventKind::Unbinding
                };
                self.events
                    .add_event(dwell, i, peer.peer, peer.bound_state, next, kind);
            }
        }
        Ok(())
    }

    /// Fires every event whose scheduled time has arrived.
    fn fire_ready_events(&mut self, rng: &mut dyn RngSource) -> Result<(), MsmrdError> {
        for event in self.events.next_ready() {
            let (i, j) = event.pair;
            match event.kind {
                EventKind::Binding => self.fire_binding(i, j, event.end_state)?,
                EventKind::Bound2Bound => self.fire_bound2bound(i, j, event.end_state)?,
                EventKind::Unbinding => self.fire_unbinding(i, j, event.end_state, rng)?,
                EventKind::Transition2Transition => {
                    self.events.add_event(
                        0.0,
                        i,
                        j,
                        event.start_state,
                        event.end_state,
                        EventKind::InTransition,
                    );
                }
                EventKind::Empty | EventKind::InTransition => {}
            }
            self.events.remove_event(i, j);
        }
        Ok(())
    }

    fn fire_binding(&mut self, i: usize, j: usize, end_state: u32) -> Result<(), MsmrdError> {
        if self.particles[i].free_slots(MAX_VALENCE) == 0
            || self.particles[j].free_slots(MAX_VALENCE) == 0
        {
            debug!(i, j, "binding event preconditions invalidated, dropping");
            return Ok(());
        }

        self.particles[i].bound.push(BoundPeer { peer: j, bound_state: end_state });
        self.particles[j].bound.push(BoundPeer { peer: i, bound_state: end_state });

        let pos_i = self.particles[i].position;
        let pos_j = self.particles[j].position;
        let orient_i = self.particles[i].orientation;
        let compound_of = {
            let particles = &self.particles;
            move |idx: usize| particles[idx].compound_id
        };
        let (compound_id, _main_size) =
            self.compounds.bind(i, j, end_state, compound_of, pos_i, pos_j, orient_i);
        self.particles[i].compound_id = Some(compound_id);
        self.particles[j].compound_id = Some(compound_id);

        // Diffusion constants for the new bound state apply to whichever
        // particle actually ends up carrying the compound's kinematics, not
        // necessarily `i` — a merge of two pre-existing compounds can leave
        // the representative as neither `i` nor `j`.
        let row = self.markov.get_msm_index(end_state) as usize;
        let d = self.markov.d_list[row];
        let d_rot = self.markov.d_rot_list[row];
        let representative = self.compounds.get(compound_id).representative();
        self.particles[representative].set_diffusion(d, d_rot);
        Ok(())
    }

    fn fire_bound2bound(&mut self, i: usize, j: usize, end_state: u32) -> Result<(), MsmrdError> {
        let Some(slot_i) = self.particles[i].bound.iter_mut().find(|b| b.peer == j) else {
            return Err(MsmrdError::LogicInvariant {
                reason: "bound2bound fired on a pair with no bound entry".into(),
                step: self.step_count,
                pair: Some((i, j)),
                compound: None,
            });
        };
        slot_i.bound_state = end_state;
        if let Some(slot_j) = self.particles[j].bound.iter_mut().find(|b| b.peer == i) {
            slot_j.bound_state = end_state;
        }
        let row = self.markov.get_msm_index(end_state) as usize;
        let d = self.markov.d_list[row];
        let d_rot = self.markov.d_rot_list[row];
        self.particles[i].set_diffusion(d, d_rot);
        self.particles[j].set_diffusion(d, d_rot);
        Ok(())
    }

    fn fire_unbinding(
        &mut self,
        i: usize,
        j: usize,
        exit_section: u32,
        rng: &mut dyn RngSource,
    ) -> Result<(), MsmrdError> {
        self.particles[i].bound.retain(|b| b.peer != j);
        self.particles[j].bound.retain(|b| b.peer != i);

        let Some(compound_id) = self.particles[i].compound_id else {
            return Err(MsmrdError::LogicInvariant {
                reason: "unbinding fired on a particle with no compound".into(),
                step: self.step_count,
                pair: Some((i, j)),
                compound: None,
            });
        };
        let new_ids = self.compounds.unbind(compound_id, i, j);

        if !self.compounds.get(compound_id).active && new_ids.is_empty() {
            // the two-member compound fully dissolved
            self.particles[i].compound_id = None;
            self.particles[j].compound_id = None;
        } else if let Some(&new_id) = new_ids.first() {
            for &member in &self.compounds.get(new_id).members.clone() {
                self.particles[member].compound_id = Some(new_id);
            }
        }

        let (delta_r, delta_q) = self.partition.center_of(exit_section);
        let orientation_i = self.particles[i].orientation;
        self.particles[j].position = self.particles[i].position + orientation_i * delta_r;
        self.particles[j].orientation = (orientation_i * delta_q).normalize();
        // consume the RNG draw reserved for exact re-placement jitter within the section
        let _ = rng.uniform();

        self.events
            .add_event(0.0, i, j, exit_section, exit_section, EventKind::InTransition);
        Ok(())
    }

    /// Drops events whose preconditions no longer hold.
    fn remove_unrealized_events(&mut self) {
        let stale: Vec<(usize, usize)> = self
            .events
            .next_ready()
            .into_iter()
            .chain(self.events_all())
            .filter(|e| !self.event_precondition_holds(e))
            .map(|e| e.pair)
            .collect();
        for (i, j) in stale {
            warn!(i, j, "discarding event with invalidated precondition");
            self.events.remove_event(i, j);
        }
    }

    fn events_all(&self) -> Vec<Event> {
        // EventManager doesn't expose a full iterator beyond next_ready by
        // design; re-derive candidates from the particle list instead of
        // reaching into internals.
        let mut all = Vec::new();
        for i in 0..self.particles.len() {
            for j in (i + 1)..self.particles.len() {
                let e = self.events.get_event(i, j);
                if e.kind != EventKind::Empty {
                    all.push(e);
                }
            }
        }
        all
    }

    fn event_precondition_holds(&self, event: &Event) -> bool {
        let (i, j) = event.pair;
        match event.kind {
            EventKind::Binding | EventKind::Transition2Transition | EventKind::InTransition => {
                self.particles[i].free_slots(MAX_VALENCE) > 0
                    && self.particles[j].free_slots(MAX_VALENCE) > 0
            }
            EventKind::Bound2Bound | EventKind::Unbinding => {
                self.particles[i].is_bound_to(j) && self.particles[j].is_bound_to(i)
            }
            EventKind::Empty => true,
        }
    }

    fn transition_section(&self, i: usize, j: usize) -> Option<u32> {
        let orient_i = self.particles[i].orientation;
        let delta_r = orient_i.conjugate() * (self.particles[j].position - self.particles[i].position);
        let delta_q = self.particles[j].orientation * orient_i.conjugate();
        let section = self.partition.section_of(delta_r, delta_q);
        (section != UNBOUND_SECTION).then_some(section)
    }

    /// Resolves which section to report for a free, in-cutoff pair,
    /// honoring `coupling_mode`. Under `FullDiscretization` this is just
    /// the raw geometric section. Under `CoreMsm` a pair that already has a
    /// reported section keeps reporting it until it actually leaves the
    /// cutoff, so geometric jitter across a section boundary doesn't read
    /// as a fresh transition.
    fn section_for_transition(&mut self, i: usize, j: usize) -> Option<u32> {
        let fresh = self.transition_section(i, j);
        match self.coupling_mode {
            CouplingMode::FullDiscretization => fresh,
            CouplingMode::CoreMsm => {
                let pair = (i.min(j), i.max(j));
                match fresh {
                    Some(section) => {
                        Some(*self.core_msm_last_section.entry(pair).or_insert(section))
                    }
                    None => {
                        self.core_msm_last_section.remove(&pair);
                        None
                    }
                }
            }
        }
    }

    fn compact_compounds(&mut self) {
        let remap = self.compounds.compact();
        for p in &mut self.particles {
            if let Some(old_id) = p.compound_id {
                p.compound_id = remap.get(&old_id).copied();
            }
        }
    }
}

fn pair_force_torque(
    i: usize,
    particle_i: &Particle,
    particles: &[Particle],
    active_mask: &[bool],
    pair_potential: &dyn PairPotential,
) -> ForceTorque {
    let mut total = ForceTorque::default();
    for (j, other) in particles.iter().enumerate() {
        if i == j || !active_mask[j] {
            continue;
        }
        let (ft, _) = pair_potential.force_torque(
            particle_i.position,
            other.position,
            Some(particle_i.orientation),
            Some(other.orientation),
        );
        total.force += ft.force;
        total.torque += ft.torque;
    }
    total
}
