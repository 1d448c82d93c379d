// ABOUTME: Validated runtime options for the flood-flow core, mirroring spec section 6 `configure`
// ABOUTME: Parsing option records from a file format is an external collaborator's job, not this crate's

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Options recognized by `configure()` (spec §6).
///
/// Units follow spec.md: lengths in meters, rates in m/s, `dt*` in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Depth threshold below which a cell is treated as dry for CFL purposes.
    pub hmin: f64,
    /// Flow-depth threshold below which momentum is bypassed for rain-routing.
    pub hf_min: f64,
    /// Maximum allowed bed/water-surface slope (reserved for future slope limiting).
    pub slmax: f64,
    /// Courant-Friedrichs-Lewy safety coefficient, in (0, 1].
    pub cfl: f64,
    /// Inertia weighting in the q-centered momentum scheme, in [0, 1].
    pub theta: f64,
    /// Kinematic velocity used for thin-film rain-routing (m/s).
    pub vrouting: f64,
    /// Upper bound on the adopted time step (s).
    pub dtmax: f64,
    /// Cadence, in seconds, at which infiltration is recomputed.
    pub dtinf: f64,
    /// Maximum tolerated cumulative relative volume error before aborting.
    pub max_error: f64,
    /// Gravitational acceleration (m/s^2).
    pub g: f64,
    /// Floor below which a CFL-selected `dt_next` is treated as a fatal collapse.
    pub dt_floor: f64,
    /// Use a deterministic tree reduction for the CFL min-reduction even when
    /// that costs some parallel efficiency (spec §5).
    pub deterministic: bool,
    /// Grid spacing in the column direction (m).
    pub dx: f64,
    /// Grid spacing in the row direction (m).
    pub dy: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            hmin: 1e-4,
            hf_min: 0.01,
            slmax: 1.0,
            cfl: 0.7,
            theta: 0.9,
            vrouting: 0.1,
            dtmax: 5.0,
            dtinf: 60.0,
            max_error: 1e-3,
            g: 9.81,
            dt_floor: 1e-6,
            deterministic: false,
            dx: 1.0,
            dy: 1.0,
        }
    }
}

impl Options {
    /// Validate ranges per spec §7 kind 4, rejecting the whole record at
    /// `configure` time before any kernel runs.
    pub fn validate(&self) -> CoreResult<()> {
        let checks: &[(bool, &str)] = &[
            (self.hmin >= 0.0, "hmin must be >= 0"),
            (self.hf_min > 0.0, "hf_min must be > 0"),
            (self.slmax > 0.0, "slmax must be > 0"),
            (self.cfl > 0.0 && self.cfl <= 1.0, "cfl must be in (0, 1]"),
            (
                (0.0..=1.0).contains(&self.theta),
                "theta must be in [0, 1]",
            ),
            (self.vrouting >= 0.0, "vrouting must be >= 0"),
            (self.dtmax > 0.0, "dtmax must be > 0"),
            (self.dtinf > 0.0, "dtinf must be > 0"),
            (self.max_error > 0.0, "max_error must be > 0"),
            (self.g > 0.0, "g must be > 0"),
            (self.dt_floor > 0.0, "dt_floor must be > 0"),
            (self.dt_floor < self.dtmax, "dt_floor must be < dtmax"),
            (self.dx > 0.0, "dx must be > 0"),
            (self.dy > 0.0, "dy must be > 0"),
        ];
        for (ok, reason) in checks {
            if !ok {
                return Err(CoreError::InvalidConfig {
                    reason: reason.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(Options::default().validate().is_ok());
    }

    #[test]
    fn rejects_cfl_out_of_range() {
        let mut opts = Options::default();
        opts.cfl = 0.0;
        assert!(opts.validate().is_err());
        opts.cfl = 1.5;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn rejects_theta_out_of_range() {
        let mut opts = Options::default();
        opts.theta = -0.1;
        assert!(opts.validate().is_err());
        opts.theta = 1.1;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn rejects_dt_floor_above_dtmax() {
        let mut opts = Options::default();
        opts.dt_floor = opts.dtmax * 2.0;
        assert!(opts.validate().is_err());
    }
}
