//! Per-particle state.

use glam::{Quat, Vec3};

/// Which capability-dispatch family a particle's potentials route through:
/// a tagged sum over point/rod/rigid-solid rather than a deep inheritance
/// hierarchy.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BodyType {
    Point,
    Rod,
    RigidSolid,
}

/// A single bound neighbor and the bound-state id governing that pair. One
/// sequence of these rather than parallel peer/state vectors, so the
/// length-equality invariant is structural instead of something that has
/// to be checked.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BoundPeer {
    pub peer: usize,
    pub bound_state: u32,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec3,
    pub orientation: Quat,
    pub d_trans: f64,
    pub d_rot: f64,
    pub msm_state: u32,
    pub bodytype: BodyType,
    pub bound: Vec<BoundPeer>,
    /// Index into the compound registry. `None` iff the particle belongs
    /// to no compound. A particle with no compound is always independently
    /// simulated; a particle that belongs to one is only independently
    /// simulated when it is that compound's representative (see
    /// `Compound::representative`) — there is no separate stored flag for
    /// this, it is derived from compound membership at query time so it
    /// can never desync from which particle is actually the representative.
    pub compound_id: Option<usize>,
    /// Remaining time until this particle's next Markov-state propagation
    /// step.
    pub lagtime: f64,
    /// Set when `lagtime` hit zero exactly at a sub-step boundary; tells
    /// the Markov-switching propagator to advance the state on the next
    /// sub-step.
    pub propagate_tmsm: bool,
    /// Stored orientation vector for rod-like bodies, rotated alongside
    /// `orientation`.
    pub rod_axis: Option<Vec3>,
}

impl Particle {
    pub fn new(position: Vec3, orientation: Quat, d_trans: f64, d_rot: f64, bodytype: BodyType) -> Self {
        let rod_axis = matches!(bodytype, BodyType::Rod).then_some(Vec3::Z);
        Self {
            position,
            orientation,
            d_trans,
            d_rot,
            msm_state: 0,
            bodytype,
            bound: Vec::new(),
            compound_id: None,
            lagtime: 0.0,
            propagate_tmsm: true,
            rod_axis,
        }
    }

    /// Number of free binding slots remaining. The two-patch case caps
    /// valence at 2.
    pub fn free_slots(&self, max_valence: usize) -> usize {
        max_valence.saturating_sub(self.bound.len())
    }

    pub fn is_bound_to(&self, peer: usize) -> bool {
        self.bound.iter().any(|b| b.peer == peer)
    }

    pub fn bound_state_with(&self, peer: usize) -> Option<u32> {
        self.bound.iter().find(|b| b.peer == peer).map(|b| b.bound_state)
    }

    pub fn set_diffusion(&mut self, d_trans: f64, d_rot: f64) {
        self.d_trans = d_trans;
        self.d_rot = d_rot;
    }
}
