//! Composite index over relative-position/relative-orientation sections,
//! with a hard cutoff beyond which a pair counts as unbound.

use super::quaternion::QuaternionPartition;
use super::sphere::SpherePartition;
use glam::{Quat, Vec3};

/// Sentinel section id meaning "unbound / out of range".
pub const UNBOUND_SECTION: u32 = 0;

pub struct PositionOrientationPartition {
    cutoff: f64,
    sphere: SpherePartition,
    quat: QuaternionPartition,
    /// Max bound-state count *B*; transition sections start at `base + 1`.
    base: u32,
}

impl PositionOrientationPartition {
    pub fn new(
        cutoff: f64,
        n_sphere_sections: u32,
        n_quat_radial: u32,
        n_quat_angular: u32,
        base: u32,
    ) -> Self {
        Self {
            cutoff,
            sphere: SpherePartition::new(n_sphere_sections),
            quat: QuaternionPartition::new(n_quat_radial, n_quat_angular),
            base,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// Total number of transition sections (excludes the unbound sentinel
    /// and the bound states below `base`).
    pub fn n_transition_sections(&self) -> u32 {
        self.sphere.n_sections() * self.quat.n_sections()
    }

    /// Section for relative position `delta_r` (already rotated into
    /// particle 1's reference frame by the caller — see module docs on
    /// [`crate::partition`]) and relative quaternion `delta_q`. Returns
    /// [`UNBOUND_SECTION`] when `‖delta_r‖ >= cutoff` (the boundary itself
    /// counts as unbound).
    pub fn section_of(&self, delta_r: Vec3, delta_q: Quat) -> u32 {
        let dist = delta_r.length() as f64;
        if dist >= self.cutoff {
            return UNBOUND_SECTION;
        }
        let pos_sec = self.sphere.section_of(delta_r);
        let quat_sec = self.quat.section_of(delta_q);
        self.base + (quat_sec - 1) * self.sphere.n_sections() + pos_sec
    }

    /// Pure arithmetic inverse of [`section_of`]: decomposes a transition
    /// section id into `(pos_sec, quat_sec)`.
    pub fn section_of_inverse(&self, k: u32) -> (u32, u32) {
        assert!(k > self.base, "section {k} is not a transition section");
        let local = k - self.base - 1;
        let n = self.sphere.n_sections();
        let pos_sec = local % n + 1;
        let quat_sec = local / n + 1;
        (pos_sec, quat_sec)
    }

    /// Representative relative position/orientation at the center of
    /// transition section `k`, for reconstructing post-unbinding geometry.
    pub fn center_of(&self, k: u32) -> (Vec3, Quat) {
        let (pos_sec, quat_sec) = self.section_of_inverse(k);
        (self.sphere.center_of(pos_sec), self.quat.center_of(quat_sec))
    }
}
