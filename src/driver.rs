// ABOUTME: Driver loop tying the kernels together into sub-steps and record boundaries
// ABOUTME: (spec section 4.7); owns the only cross-kernel state besides Fields and Options

use serde::{Deserialize, Serialize};

use crate::config::Options;
use crate::depth;
use crate::direction;
use crate::error::{CoreError, CoreResult};
use crate::fields::Fields;
use crate::hydrology;
use crate::momentum;
use crate::timestep;

/// Which infiltration kernel `Driver::advance` runs (spec §4.2 calls these
/// "two interchangeable variants"; selecting between them is left to the
/// caller, so it is modeled here as an `Options`-adjacent driver setting
/// rather than a per-cell flag).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfiltrationModel {
    Fixed,
    GreenAmpt,
    None,
}

/// Summary of the sub-steps an `advance` call ran (spec §6).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub steps: usize,
    pub dt_min: f64,
    pub dt_mean: f64,
    pub dt_max: f64,
    pub cumulative_relative_error: f64,
}

/// Per-record accumulators, reset after each emission (spec §4.7 step 9).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RecordAccumulators {
    pub mean_rain: f64,
    pub mean_infiltration: f64,
    pub mean_losses: f64,
    pub mean_herr: f64,
    pub mean_hfix: f64,
    samples: u64,
}

impl RecordAccumulators {
    fn accumulate(&mut self, fields: &Fields) {
        let n = fields.rain.data().len() as f64;
        let sum = |g: &crate::grid::Grid<f64>| g.sum();
        self.mean_rain += sum(&fields.rain) / n;
        self.mean_infiltration += sum(&fields.inf) / n;
        self.mean_losses += sum(&fields.losses_capped) / n;
        self.mean_herr += sum(&fields.herr) / n;
        self.mean_hfix += sum(&fields.hfix) / n;
        self.samples += 1;
    }

    fn finalize(mut self) -> Self {
        let n = self.samples.max(1) as f64;
        self.mean_rain /= n;
        self.mean_infiltration /= n;
        self.mean_losses /= n;
        self.mean_herr /= n;
        self.mean_hfix /= n;
        self
    }
}

/// Classify east/south face routing directions from the bed elevation `z`
/// (spec §4.3, driver step 4), writing `dire`/`dirs` for every interior cell.
/// Cheap enough to run every sub-step; the momentum solver's thin-film
/// rain-routing dispatch reads these labels.
fn classify_directions(fields: &mut Fields) {
    let (rows, cols) = fields.shape();
    if rows < 3 || cols < 3 {
        return;
    }
    let z = fields.z.clone();
    for r in 1..rows - 1 {
        for c in 1..cols - 1 {
            let zc = *z.get(r, c);

            let dz0 = zc - *z.get(r, c + 1);
            let dz1 = zc - *z.get(r, c - 1);
            let max_dz = dz0.max(dz1);
            fields
                .dire
                .set(r, c, direction::classify_face(max_dz, dz0, dz1).as_f64());

            let dz0 = zc - *z.get(r + 1, c);
            let dz1 = zc - *z.get(r - 1, c);
            let max_dz = dz0.max(dz1);
            fields
                .dirs
                .set(r, c, direction::classify_face(max_dz, dz0, dz1).as_f64());
        }
    }
}

/// Owns `Fields`/`Options` and drives them through sub-steps (spec §4.7, §9
/// "global state is limited to the configuration record and the grid
/// arrays").
pub struct Driver {
    fields: Fields,
    opts: Options,
    infiltration_model: InfiltrationModel,
    t: f64,
    dt_current: f64,
    time_since_infiltration: f64,
    cumulative_volume_error: f64,
    cumulative_volume_in: f64,
    record: RecordAccumulators,
}

impl Driver {
    pub fn new(fields: Fields, opts: Options, infiltration_model: InfiltrationModel) -> CoreResult<Self> {
        opts.validate()?;
        let dt_current = opts.dtmax;
        Ok(Self {
            fields,
            opts,
            infiltration_model,
            t: 0.0,
            dt_current,
            time_since_infiltration: f64::INFINITY,
            cumulative_volume_error: 0.0,
            cumulative_volume_in: 0.0,
            record: RecordAccumulators::default(),
        })
    }

    pub fn configure(&mut self, opts: Options) -> CoreResult<()> {
        opts.validate()?;
        self.opts = opts;
        Ok(())
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn get_field(&self, name: &str) -> CoreResult<&crate::grid::Grid<f64>> {
        self.fields.get_field(name)
    }

    pub fn set_field(&mut self, name: &str, value: crate::grid::Grid<f64>) -> CoreResult<()> {
        self.fields.set_field(name, value)
    }

    /// Drain the record accumulators, resetting them (spec §4.7 step 9).
    pub fn take_record_accumulators(&mut self) -> RecordAccumulators {
        std::mem::take(&mut self.record).finalize()
    }

    /// Run sub-steps until `self.t >= until`, aligning the final sub-step's
    /// `dt` with `until` exactly (spec §4.7 step 8).
    pub fn advance(&mut self, until: f64) -> CoreResult<StepReport> {
        let mut steps = 0usize;
        let mut dt_min = f64::INFINITY;
        let mut dt_max: f64 = 0.0;
        let mut dt_sum = 0.0;

        while self.t < until {
            let dt = self.dt_current.min(until - self.t);
            self.run_substep(dt)?;

            steps += 1;
            dt_min = dt_min.min(dt);
            dt_max = dt_max.max(dt);
            dt_sum += dt;

            self.t += dt;
            self.record.accumulate(&self.fields);

            let dt_next = timestep::next_timestep(&self.fields, &self.opts);
            if dt_next < self.opts.dt_floor {
                return Err(CoreError::CflCollapse {
                    dt_next,
                    floor: self.opts.dt_floor,
                });
            }
            self.dt_current = dt_next;

            if self.cumulative_volume_in.abs() > 0.0 {
                let relative = (self.cumulative_volume_error / self.cumulative_volume_in).abs();
                if relative > self.opts.max_error {
                    return Err(CoreError::MassErrorOverrun {
                        observed: relative,
                        max_error: self.opts.max_error,
                    });
                }
            }

            log::debug!(
                target: "flowcore::driver",
                "substep t={:.6} dt={:.6} cumulative_volume_error={:.3e}",
                self.t, dt, self.cumulative_volume_error
            );
        }

        Ok(StepReport {
            steps,
            dt_min: if steps == 0 { 0.0 } else { dt_min },
            dt_mean: if steps == 0 { 0.0 } else { dt_sum / steps as f64 },
            dt_max,
            cumulative_relative_error: if self.cumulative_volume_in.abs() > 0.0 {
                (self.cumulative_volume_error / self.cumulative_volume_in).abs()
            } else {
                0.0
            },
        })
    }

    fn run_substep(&mut self, dt: f64) -> CoreResult<()> {
        let cell_area = self.opts.dx * self.opts.dy;
        let mass_before: f64 = self.fields.h.sum() * cell_area;
        let hfix_before: f64 = self.fields.hfix.sum();
        let herr_before: f64 = self.fields.herr.sum();

        self.time_since_infiltration += dt;
        if self.time_since_infiltration >= self.opts.dtinf {
            // `inf_out` is reused unchanged between recomputations (spec
            // §4.7 step 2), so the rate cap and the Green-Ampt cumulative
            // depth must integrate over the elapsed time since the last
            // recomputation, not just this one sub-step's `dt`.
            let elapsed = self.time_since_infiltration;
            match self.infiltration_model {
                InfiltrationModel::Fixed => hydrology::infiltrate_fixed(&mut self.fields, elapsed),
                InfiltrationModel::GreenAmpt => {
                    hydrology::infiltrate_green_ampt(&mut self.fields, elapsed)
                }
                InfiltrationModel::None => {}
            }
            self.time_since_infiltration = 0.0;
        }

        hydrology::hydrology_source(&mut self.fields, dt);
        // `ext` as set by the external collaborator (inflow, drainage
        // coupling) is a standing field, not a per-step one-shot value, so
        // it must not be permanently folded into `eff_precip`. Combine the
        // two transiently for this sub-step's depth solve, then restore the
        // collaborator's baseline afterward.
        let ext_baseline = self.fields.ext.clone();
        {
            let eff_precip = self.fields.eff_precip.clone();
            self.fields
                .ext
                .data_mut()
                .iter_mut()
                .zip(eff_precip.data())
                .for_each(|(e, p)| *e += p);
        }

        classify_directions(&mut self.fields);
        momentum::solve_faces(&mut self.fields, &self.opts, dt);
        self.fields.swap_discharges();
        let ext_volume = self.fields.ext.sum() * cell_area * dt;
        depth::update_depth(&mut self.fields, &self.opts, dt);
        self.fields.ext = ext_baseline;

        let mass_after: f64 = self.fields.h.sum() * cell_area;
        let hfix_volume = (self.fields.hfix.sum() - hfix_before) * cell_area;
        let herr_volume = (self.fields.herr.sum() - herr_before) * cell_area;

        // Mass-balance identity (spec §8 property 3): the residual below
        // should be ~0 up to floating-point roundoff. Flux across the
        // domain boundary (the BC preprocessor's halo-face contribution) is
        // not separately observable from inside the core and is assumed
        // zero here; a collaborator driving open boundaries should account
        // for that flux itself when interpreting `cumulative_relative_error`.
        let residual = (mass_after - mass_before) - ext_volume - hfix_volume + herr_volume;
        self.cumulative_volume_in += ext_volume.abs();
        self.cumulative_volume_error += residual;

        Ok(())
    }
}
