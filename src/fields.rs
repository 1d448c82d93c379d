// ABOUTME: Named co-registered 2D arrays the core operates on (spec section 3 data model)
// ABOUTME: get_field/set_field give the external I/O and coupling collaborators raster-style access

use crate::error::{CoreError, CoreResult};
use crate::grid::Grid;

/// All simulation state, allocated once and reused across steps (spec §3 lifecycle).
///
/// Direction labels (`dire`, `dirs`) and boundary-type codes (`bct`) are
/// stored as `f64` alongside the other physical arrays: their values are
/// small integers (-1, 0, 1, or 0..=4) that round-trip through `f64` exactly,
/// and a uniform representation lets `get_field`/`set_field` hand back plain
/// 2D array views to raster I/O collaborators without a second code path.
#[derive(Clone, Debug)]
pub struct Fields {
    rows: usize,
    cols: usize,

    pub z: Grid<f64>,
    pub n: Grid<f64>,
    pub h: Grid<f64>,
    pub hmax: Grid<f64>,

    pub qe: Grid<f64>,
    pub qs: Grid<f64>,
    pub qe_new: Grid<f64>,
    pub qs_new: Grid<f64>,
    pub hfe: Grid<f64>,
    pub hfs: Grid<f64>,
    pub dire: Grid<f64>,
    pub dirs: Grid<f64>,

    pub rain: Grid<f64>,
    pub inf: Grid<f64>,
    pub losses_capped: Grid<f64>,
    pub eff_precip: Grid<f64>,
    pub ext: Grid<f64>,

    pub bct: Grid<f64>,
    pub bcv: Grid<f64>,
    pub hfix: Grid<f64>,
    pub herr: Grid<f64>,

    pub v: Grid<f64>,
    pub vdir: Grid<f64>,
    pub vmax: Grid<f64>,
    pub fr: Grid<f64>,

    // Green-Ampt infiltration state.
    pub eff_por: Grid<f64>,
    pub pressure: Grid<f64>,
    pub conduct: Grid<f64>,
    pub inf_amount: Grid<f64>,
    pub water_soil_content: Grid<f64>,
}

/// Boundary-type code for a fixed water depth cell (spec §6).
pub const BCT_FIXED_DEPTH: f64 = 4.0;

impl Fields {
    pub fn new(rows: usize, cols: usize) -> Self {
        let z = || Grid::new(rows, cols, 0.0);
        Self {
            rows,
            cols,
            z: z(),
            n: Grid::new(rows, cols, 0.03),
            h: z(),
            hmax: z(),
            qe: z(),
            qs: z(),
            qe_new: z(),
            qs_new: z(),
            hfe: z(),
            hfs: z(),
            dire: Grid::new(rows, cols, -1.0),
            dirs: Grid::new(rows, cols, -1.0),
            rain: z(),
            inf: z(),
            losses_capped: z(),
            eff_precip: z(),
            ext: z(),
            bct: z(),
            bcv: z(),
            hfix: z(),
            herr: z(),
            v: z(),
            vdir: z(),
            vmax: z(),
            fr: z(),
            eff_por: z(),
            pressure: z(),
            conduct: z(),
            // Initialized to a small positive depth so the Green-Ampt rate
            // (conduct * (1 + avail_por*(pressure+h)/F)) never divides by zero
            // on first use (spec §4.2).
            inf_amount: Grid::new(rows, cols, 1e-6),
            water_soil_content: z(),
        }
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Swap the double-buffered discharge fields: the new sub-step's
    /// `qe_new`/`qs_new` become the current `qe`/`qs` (spec §3 lifecycle,
    /// §4.7 step 6).
    pub fn swap_discharges(&mut self) {
        std::mem::swap(&mut self.qe, &mut self.qe_new);
        std::mem::swap(&mut self.qs, &mut self.qs_new);
    }

    pub fn get_field(&self, name: &str) -> CoreResult<&Grid<f64>> {
        Ok(match name {
            "z" => &self.z,
            "n" => &self.n,
            "h" => &self.h,
            "hmax" => &self.hmax,
            "qe" => &self.qe,
            "qs" => &self.qs,
            "qe_new" => &self.qe_new,
            "qs_new" => &self.qs_new,
            "hfe" => &self.hfe,
            "hfs" => &self.hfs,
            "dire" => &self.dire,
            "dirs" => &self.dirs,
            "rain" => &self.rain,
            "inf" => &self.inf,
            "losses_capped" => &self.losses_capped,
            "eff_precip" => &self.eff_precip,
            "ext" => &self.ext,
            "bct" => &self.bct,
            "bcv" => &self.bcv,
            "hfix" => &self.hfix,
            "herr" => &self.herr,
            "v" => &self.v,
            "vdir" => &self.vdir,
            "vmax" => &self.vmax,
            "fr" => &self.fr,
            "eff_por" => &self.eff_por,
            "pressure" => &self.pressure,
            "conduct" => &self.conduct,
            "inf_amount" => &self.inf_amount,
            "water_soil_content" => &self.water_soil_content,
            other => return Err(CoreError::UnknownField(other.to_string())),
        })
    }

    pub fn set_field(&mut self, name: &str, value: Grid<f64>) -> CoreResult<()> {
        if value.shape() != self.shape() {
            return Err(CoreError::ShapeMismatch {
                field: name.to_string(),
                expected: self.shape(),
                actual: value.shape(),
            });
        }
        let slot = match name {
            "z" => &mut self.z,
            "n" => &mut self.n,
            "h" => &mut self.h,
            "hmax" => &mut self.hmax,
            "qe" => &mut self.qe,
            "qs" => &mut self.qs,
            "qe_new" => &mut self.qe_new,
            "qs_new" => &mut self.qs_new,
            "hfe" => &mut self.hfe,
            "hfs" => &mut self.hfs,
            "dire" => &mut self.dire,
            "dirs" => &mut self.dirs,
            "rain" => &mut self.rain,
            "inf" => &mut self.inf,
            "losses_capped" => &mut self.losses_capped,
            "eff_precip" => &mut self.eff_precip,
            "ext" => &mut self.ext,
            "bct" => &mut self.bct,
            "bcv" => &mut self.bcv,
            "hfix" => &mut self.hfix,
            "herr" => &mut self.herr,
            "v" => &mut self.v,
            "vdir" => &mut self.vdir,
            "vmax" => &mut self.vmax,
            "fr" => &mut self.fr,
            "eff_por" => &mut self.eff_por,
            "pressure" => &mut self.pressure,
            "conduct" => &mut self.conduct,
            "inf_amount" => &mut self.inf_amount,
            "water_soil_content" => &mut self.water_soil_content,
            other => return Err(CoreError::UnknownField(other.to_string())),
        };
        *slot = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_allocates_all_arrays_at_shape() {
        let f = Fields::new(5, 7);
        assert_eq!(f.h.shape(), (5, 7));
        assert_eq!(f.dire.shape(), (5, 7));
    }

    #[test]
    fn get_set_field_roundtrip() {
        let mut f = Fields::new(3, 3);
        let mut h = Grid::new(3, 3, 0.0);
        h.set(1, 1, 0.5);
        f.set_field("h", h).unwrap();
        assert_eq!(*f.get_field("h").unwrap().get(1, 1), 0.5);
    }

    #[test]
    fn set_field_rejects_shape_mismatch() {
        let mut f = Fields::new(3, 3);
        let wrong = Grid::new(2, 2, 0.0);
        assert!(matches!(
            f.set_field("h", wrong),
            Err(CoreError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn get_field_rejects_unknown_name() {
        let f = Fields::new(3, 3);
        assert!(matches!(
            f.get_field("nonexistent"),
            Err(CoreError::UnknownField(_))
        ));
    }

    #[test]
    fn swap_discharges_exchanges_current_and_new() {
        let mut f = Fields::new(2, 2);
        f.qe_new.set(0, 0, 9.0);
        f.swap_discharges();
        assert_eq!(*f.qe.get(0, 0), 9.0);
        assert_eq!(*f.qe_new.get(0, 0), 0.0);
    }
}
