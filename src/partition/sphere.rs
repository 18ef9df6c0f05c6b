//! Equal-area partition of the unit sphere surface.
//!
//! Construction follows the recursive zonal equal-area scheme (Leopardi
//! 2006): one polar cap at each pole sized to the ideal region area,
//! filled in between by collars of equal latitude thickness, each collar
//! cut into an integer number of equal-azimuth sectors chosen by rounding
//! a running cumulative ideal region count so the total comes out exactly
//! `n`.

use glam::Vec3;
use std::f64::consts::PI;

/// One latitude band of the partition: either a polar cap (`n_sectors ==
/// 1`) or a collar cut into `n_sectors` equal-azimuth wedges.
#[derive(Clone, Copy, Debug)]
struct Ring {
    theta_lo: f64,
    theta_hi: f64,
    n_sectors: u32,
    /// Global 1-based section index of this ring's first (phi == 0) sector.
    start_index: u32,
}

#[derive(Debug)]
pub struct SpherePartition {
    n: u32,
    rings: Vec<Ring>,
}

impl SpherePartition {
    /// Builds a partition of the sphere surface into `n` sections of equal
    /// area (`n >= 1`).
    pub fn new(n: u32) -> Self {
        assert!(n >= 1, "SpherePartition requires at least one section");

        if n == 1 {
            return Self {
                n,
                rings: vec![Ring {
                    theta_lo: 0.0,
                    theta_hi: PI,
                    n_sectors: 1,
                    start_index: 1,
                }],
            };
        }

        let ideal_area = 4.0 * PI / n as f64;
        let cap_colat = (1.0 - 2.0 / n as f64).acos();
        let remaining = PI - 2.0 * cap_colat;
        let ideal_collar_angle = ideal_area.sqrt();
        let ideal_n_collars = if ideal_collar_angle > 0.0 {
            remaining / ideal_collar_angle
        } else {
            0.0
        };
        let n_collars = if n > 2 {
            ideal_n_collars.round().max(1.0) as u32
        } else {
            0
        };
        let collar_angle = if n_collars > 0 {
            remaining / n_collars as f64
        } else {
            0.0
        };

        let mut rings = Vec::with_capacity(n_collars as usize + 2);
        let mut next_index: u32 = 1;
        rings.push(Ring {
            theta_lo: 0.0,
            theta_hi: cap_colat,
            n_sectors: 1,
            start_index: next_index,
        });
        next_index += 1;

        let mut cumulative_ideal = 1.0_f64;
        for i in 1..=n_collars {
            let theta_lo = cap_colat + (i - 1) as f64 * collar_angle;
            let theta_hi = cap_colat + i as f64 * collar_angle;
            let area = 2.0 * PI * (theta_lo.cos() - theta_hi.cos());
            cumulative_ideal += area / ideal_area;
            let target_cumulative = cumulative_ideal.round() as i64;
            let assigned_so_far = (next_index - 1) as i64;
            let n_i = (target_cumulative - assigned_so_far).max(1) as u32;
            rings.push(Ring {
                theta_lo,
                theta_hi,
                n_sectors: n_i,
                start_index: next_index,
            });
            next_index += n_i;
        }

        rings.push(Ring {
            theta_lo: PI - cap_colat,
            theta_hi: PI,
            n_sectors: 1,
            start_index: next_index,
        });
        next_index += 1;

        // Rounding of the per-collar region counts can occasionally land
        // one region short of or over `n`; fold the discrepancy into the
        // last collar (or the south cap if there are no collars) so the
        // total section count always matches the request exactly.
        let produced = next_index - 1;
        if produced != n {
            let delta = n as i64 - produced as i64;
            let adjust_idx = if rings.len() >= 3 { rings.len() - 2 } else { 0 };
            let new_count = (rings[adjust_idx].n_sectors as i64 + delta).max(1) as u32;
            let shift = new_count as i64 - rings[adjust_idx].n_sectors as i64;
            rings[adjust_idx].n_sectors = new_count;
            for ring in rings.iter_mut().skip(adjust_idx + 1) {
                ring.start_index = (ring.start_index as i64 + shift) as u32;
            }
        }

        Self { n, rings }
    }

    pub fn n_sections(&self) -> u32 {
        self.n
    }

    /// Total section index (1-based) containing `v`. Tie-breaking is
    /// right-closed in azimuth and upper-closed in polar angle: a point
    /// exactly on a boundary belongs to the ring/sector below it.
    pub fn section_of(&self, v: Vec3) -> u32 {
        let v = v.normalize();
        let theta = (v.z as f64).clamp(-1.0, 1.0).acos();
        let mut phi = (v.y as f64).atan2(v.x as f64);
        if phi < 0.0 {
            phi += 2.0 * PI;
        }

        let ring = self
            .rings
            .iter()
            .find(|r| theta <= r.theta_hi + 1e-12)
            .unwrap_or_else(|| self.rings.last().unwrap());

        if ring.n_sectors == 1 {
            return ring.start_index;
        }
        let width = 2.0 * PI / ring.n_sectors as f64;
        let idx = ((phi / width) - 1e-9)
            .floor()
            .clamp(0.0, (ring.n_sectors - 1) as f64) as u32;
        ring.start_index + idx
    }

    /// Angular bounds `(theta_lo, theta_hi, phi_lo, phi_hi)` of section `k`.
    pub fn bounds(&self, k: u32) -> (f64, f64, f64, f64) {
        let ring = self.ring_for(k);
        if ring.n_sectors == 1 {
            return (ring.theta_lo, ring.theta_hi, 0.0, 2.0 * PI);
        }
        let width = 2.0 * PI / ring.n_sectors as f64;
        let sector = (k - ring.start_index) as f64;
        (
            ring.theta_lo,
            ring.theta_hi,
            sector * width,
            (sector + 1.0) * width,
        )
    }

    /// Unit vector at the center of section `k`.
    pub fn center_of(&self, k: u32) -> Vec3 {
        let (theta_lo, theta_hi, phi_lo, phi_hi) = self.bounds(k);
        let theta = 0.5 * (theta_lo + theta_hi);
        let phi = 0.5 * (phi_lo + phi_hi);
        Vec3::new(
            (theta.sin() * phi.cos()) as f32,
            (theta.sin() * phi.sin()) as f32,
            theta.cos() as f32,
        )
    }

    fn ring_for(&self, k: u32) -> &Ring {
        self.rings
            .iter()
            .find(|r| k >= r.start_index && k < r.start_index + r.n_sectors)
            .expect("section index out of range")
    }
}
