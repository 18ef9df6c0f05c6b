//! Simulation configuration. Deserializable via `serde` so a host
//! application can feed it in; this crate does not parse TOML/JSON
//! itself, that belongs to whatever binary or binding layer embeds it.

use serde::{Deserialize, Serialize};

/// `FullDiscretization` always reports the current transition section id;
/// `CoreMsm` reports the last sampled discrete state while inside the
/// cutoff but unbound, reducing spurious transitions for models that don't
/// need section-level resolution.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CouplingMode {
    CoreMsm,
    FullDiscretization,
}

/// Tolerances for recognizing that a pair remains in a bound state despite
/// continuous drift. Exposed as constructor/field-settable values since
/// different models want different tolerances.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BoundStateTolerance {
    pub position: f64,
    pub orientation_radians: f64,
}

impl Default for BoundStateTolerance {
    fn default() -> Self {
        Self {
            position: 0.125,
            orientation_radians: 0.1 * std::f64::consts::TAU,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub dt: f64,
    pub num_steps: u64,
    pub sample_stride: u64,
    pub seed: i64,
    pub kb_temperature: f64,
    pub cutoff: f64,
    pub n_sphere_sections: u32,
    pub n_quat_radial: u32,
    pub n_quat_angular: u32,
    pub max_bound_states: u32,
    pub tolerance: BoundStateTolerance,
    pub coupling_mode: CouplingMode,
    pub rotation_enabled: bool,
    /// How many integrator steps pass between compound-registry
    /// compaction sweeps.
    pub compaction_stride: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            num_steps: 10_000,
            sample_stride: 100,
            seed: -1,
            kb_temperature: 1.0,
            cutoff: 2.0,
            n_sphere_sections: 6,
            n_quat_radial: 4,
            n_quat_angular: 5,
            max_bound_states: 1,
            tolerance: BoundStateTolerance::default(),
            coupling_mode: CouplingMode::FullDiscretization,
            rotation_enabled: true,
            compaction_stride: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_a_sensible_timestep_and_nonzero_steps() {
        let cfg = SimulationConfig::default();
        assert!(cfg.dt > 0.0);
        assert!(cfg.num_steps > 0);
    }

    #[test]
    fn default_tolerance_matches_the_documented_range() {
        let tol = BoundStateTolerance::default();
        assert!(tol.position >= 0.1 && tol.position <= 0.15);
    }
}
