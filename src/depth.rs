// ABOUTME: Depth solver: continuity update, fixed-level BC, negative-depth clamp,
// ABOUTME: and cell-centered velocity/direction/Froude derivation (spec section 4.5)

use crate::config::Options;
use crate::fields::{Fields, BCT_FIXED_DEPTH};

const VELOCITY_EPS: f64 = 1e-12;

/// Integrate continuity for every interior cell and derive velocity,
/// direction and Froude number (spec §4.5).
///
/// Mutates `h`, `hmax`, `herr`, `hfix`, `v`, `vdir`, `vmax`, `fr` in place.
/// `qe`/`qs` (the current, just-solved discharges) and `hfe`/`hfs` are read
/// only. Halo rows/columns are left untouched — they are owned by the
/// external BC preprocessor (spec §9).
pub fn update_depth(fields: &mut Fields, opts: &Options, dt: f64) {
    let (rows, cols) = fields.shape();
    if rows < 3 || cols < 3 {
        return;
    }

    for r in 1..rows - 1 {
        for c in 1..cols - 1 {
            let qe = *fields.qe.get(r, c);
            let qw = *fields.qe.get(r, c - 1);
            let qn = *fields.qs.get(r - 1, c);
            let qs = *fields.qs.get(r, c);

            let div = (qw - qe) / opts.dx + (qn - qs) / opts.dy;
            let ext = *fields.ext.get(r, c);
            let mut h_star = fields.h.get(r, c) + (ext + div) * dt;

            if h_star < 0.0 {
                let clamp = -h_star;
                *fields.herr.get_mut(r, c) += clamp;
                h_star = 0.0;
            }

            if *fields.bct.get(r, c) == BCT_FIXED_DEPTH {
                let bcv = *fields.bcv.get(r, c);
                *fields.hfix.get_mut(r, c) += bcv - h_star;
                h_star = bcv;
            }

            if h_star > *fields.hmax.get(r, c) {
                fields.hmax.set(r, c, h_star);
            }
            fields.h.set(r, c, h_star);
        }
    }

    derive_velocity_and_froude(fields, opts);
}

fn branchless_face_velocity(q: f64, hf: f64) -> f64 {
    let denom = hf.max(VELOCITY_EPS);
    let gate = if hf > 0.0 { 1.0 } else { 0.0 };
    q / denom * gate
}

fn derive_velocity_and_froude(fields: &mut Fields, opts: &Options) {
    let (rows, cols) = fields.shape();
    for r in 1..rows - 1 {
        for c in 1..cols - 1 {
            let ve = branchless_face_velocity(*fields.qe.get(r, c), *fields.hfe.get(r, c));
            let vw = branchless_face_velocity(*fields.qe.get(r, c - 1), *fields.hfe.get(r, c - 1));
            let vs = branchless_face_velocity(*fields.qs.get(r, c), *fields.hfs.get(r, c));
            let vn = branchless_face_velocity(*fields.qs.get(r - 1, c), *fields.hfs.get(r - 1, c));

            let vx = 0.5 * (ve + vw);
            let vy = 0.5 * (vs + vn);
            let v = vx.hypot(vy);

            let mut vdir = (-vy).atan2(vx) * 180.0 / std::f64::consts::PI;
            if vdir < 0.0 {
                vdir += 360.0;
            }

            let h = *fields.h.get(r, c);
            // Froude is undefined at h==0; this implementation emits 0 there
            // rather than NaN (spec §9 open question) so downstream
            // aggregation/reporting never has to special-case NaN.
            let fr = if h > 0.0 {
                v / (opts.g * h).sqrt()
            } else {
                0.0
            };

            fields.v.set(r, c, v);
            fields.vdir.set(r, c, vdir);
            fields.fr.set(r, c, fr);
            if v > *fields.vmax.get(r, c) {
                fields.vmax.set(r, c, v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn negative_depth_clamps_and_accumulates_herr() {
        let mut f = Fields::new(3, 3);
        f.h.set(1, 1, 0.01);
        // Large outflow on the east face drains more than present.
        f.qe.set(1, 1, 10.0);
        let opts = Options::default();
        update_depth(&mut f, &opts, 1.0);
        assert_eq!(*f.h.get(1, 1), 0.0);
        assert!(*f.herr.get(1, 1) > 0.0);
    }

    #[test]
    fn fixed_level_bc_forces_depth_and_accumulates_hfix() {
        let mut f = Fields::new(5, 5);
        f.bct.set(2, 2, BCT_FIXED_DEPTH);
        f.bcv.set(2, 2, 0.5);
        let opts = Options::default();
        update_depth(&mut f, &opts, 0.1);
        assert_eq!(*f.h.get(2, 2), 0.5);
        assert_eq!(*f.hfix.get(2, 2), 0.5);
    }

    #[test]
    fn hmax_never_decreases() {
        let mut f = Fields::new(3, 3);
        f.hmax.set(1, 1, 1.0);
        f.h.set(1, 1, 0.2);
        let opts = Options::default();
        update_depth(&mut f, &opts, 0.1);
        assert!(*f.hmax.get(1, 1) >= 1.0);
    }

    #[test]
    fn froude_is_zero_at_zero_depth() {
        let mut f = Fields::new(3, 3);
        let opts = Options::default();
        update_depth(&mut f, &opts, 0.1);
        assert_eq!(*f.fr.get(1, 1), 0.0);
    }

    #[test]
    fn vdir_is_in_0_360_range() {
        let mut f = Fields::new(3, 3);
        f.h.fill(0.5);
        f.hfe = Grid::new(3, 3, 0.5);
        f.hfs = Grid::new(3, 3, 0.5);
        f.qs.set(0, 1, 2.0); // northward inflow -> negative vy contribution
        let opts = Options::default();
        update_depth(&mut f, &opts, 0.1);
        let d = *f.vdir.get(1, 1);
        assert!((0.0..360.0).contains(&d));
    }
}
