//! Partition of the unit ball used as the parameter space for unit
//! quaternions.
//!
//! A unit quaternion is identified with a point of the 3-ball via its
//! vector part; the scalar part is recovered as `sqrt(1 - |v|^2)` under the
//! convention that the scalar is non-negative, which collapses antipodal
//! quaternions (`q` and `-q` represent the same rotation and map to the
//! same ball point). The ball is cut into `R` radial shells of equal
//! thickness, each reusing an `M`-section [`SpherePartition`] for the
//! angular part.

use super::sphere::SpherePartition;
use glam::{Quat, Vec3};

pub struct QuaternionPartition {
    shells: u32,
    angular: SpherePartition,
}

impl QuaternionPartition {
    pub fn new(shells: u32, sections_per_shell: u32) -> Self {
        assert!(shells >= 1, "QuaternionPartition requires at least one shell");
        Self {
            shells,
            angular: SpherePartition::new(sections_per_shell),
        }
    }

    pub fn n_shells(&self) -> u32 {
        self.shells
    }

    pub fn n_per_shell(&self) -> u32 {
        self.angular.n_sections()
    }

    pub fn n_sections(&self) -> u32 {
        self.shells * self.angular.n_sections()
    }

    /// Non-negative-scalar vector part of `q`, collapsing `q` and `-q`.
    fn vector_part(q: Quat) -> Vec3 {
        if q.w < 0.0 {
            Vec3::new(-q.x, -q.y, -q.z)
        } else {
            Vec3::new(q.x, q.y, q.z)
        }
    }

    /// Section index (1-based) for `q`.
    pub fn section_of(&self, q: Quat) -> u32 {
        let q = q.normalize();
        let v = Self::vector_part(q);
        let r = v.length().clamp(0.0, 1.0);
        let shell = ((r * self.shells as f32) as u32).min(self.shells - 1) + 1;
        let direction = if r < 1.0e-9 { Vec3::Z } else { v / r };
        let angular = self.angular.section_of(direction);
        (shell - 1) * self.angular.n_sections() + angular
    }

    /// Representative unit quaternion at the center of section `k`.
    pub fn center_of(&self, k: u32) -> Quat {
        let per_shell = self.angular.n_sections();
        let shell = (k - 1) / per_shell + 1;
        let angular = (k - 1) % per_shell + 1;
        let r_mid = (shell as f32 - 0.5) / self.shells as f32;
        let direction = self.angular.center_of(angular);
        let v = direction * r_mid;
        let w = (1.0 - v.length_squared()).max(0.0).sqrt();
        Quat::from_xyzw(v.x, v.y, v.z, w).normalize()
    }
}
