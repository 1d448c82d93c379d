// ABOUTME: Face-flow momentum solver: q-centered inertial scheme with Bates-2010 fallback
// ABOUTME: and thin-film rain-routing dispatch on a per-face basis (spec section 4.4)

use crate::config::Options;
use crate::direction::FlowDirection;
use crate::fields::Fields;
use crate::grid::Grid;

/// Sign-preserving thin-film rain-routing rate: `min(max(wse_hi-wse_lo,0), h_src) * min(vrouting, L/dt)`.
fn rain_route_rate(h_src: f64, wse_hi: f64, wse_lo: f64, vrouting: f64, length: f64, dt: f64) -> f64 {
    let dh = (wse_hi - wse_lo).clamp(0.0, h_src);
    dh * vrouting.min(length / dt)
}

/// One face's new discharge, dispatched by flow-depth regime (spec §4.4).
///
/// `q0` is the face's own discharge at time t; `q_axis_minus`/`q_axis_plus`
/// are the same-face-type neighbors one row/column over (used for the
/// inertia-averaged `A` term); `q_st` is the transverse stencil average used
/// for `q_norm`; `label` is this face's rain-routing direction.
#[allow(clippy::too_many_arguments)]
fn solve_face(
    z0: f64,
    z1: f64,
    h0: f64,
    h1: f64,
    n0: f64,
    n1: f64,
    q0: f64,
    q_axis_minus: f64,
    q_axis_plus: f64,
    q_st: f64,
    label: FlowDirection,
    length: f64,
    opts: &Options,
    dt: f64,
) -> (f64, f64) {
    let wse0 = z0 + h0;
    let wse1 = z1 + h1;
    let hf = wse0.max(wse1) - z0.max(z1);

    if hf <= 0.0 {
        return (0.0, hf);
    }

    if hf > opts.hf_min {
        let nbar = 0.5 * (n0 + n1);
        let q_norm = q0.hypot(q_st);
        let slope = (wse0 - wse1) / length;
        let mut a = opts.theta * q0 + (1.0 - opts.theta) * 0.5 * (q_axis_minus + q_axis_plus);
        let b = opts.g * hf * dt * slope;
        if a * b < 0.0 {
            // Flow and surface slope disagree: degrade to Bates-2010.
            a = q0;
        }
        let d = 1.0 + opts.g * dt * nbar * nbar * q_norm / hf.powf(7.0 / 3.0);
        return ((a + b) / d, hf);
    }

    // Thin film: momentum is bypassed in favor of kinematic rain-routing.
    let q_new = match label {
        FlowDirection::TowardPositive if wse1 > wse0 => {
            -rain_route_rate(h1, wse1, wse0, opts.vrouting, length, dt)
        }
        FlowDirection::TowardNegative if wse0 > wse1 => {
            rain_route_rate(h0, wse0, wse1, opts.vrouting, length, dt)
        }
        _ => 0.0,
    };
    (q_new, hf)
}

/// Solve all interior east/south face discharges for one sub-step,
/// producing `qe_new`/`qs_new`/`hfe`/`hfs` (spec §4.4).
///
/// Halo faces (row 0, row R-1, column 0, column C-1) and the last interior
/// row/column's far face (which would touch the halo) are left untouched,
/// per the edge rule in spec §4.4.
pub fn solve_faces(fields: &mut Fields, opts: &Options, dt: f64) {
    let (rows, cols) = fields.shape();
    if rows < 3 || cols < 3 {
        return;
    }

    let z = &fields.z;
    let h = &fields.h;
    let n = &fields.n;
    let qe = &fields.qe;
    let qs = &fields.qs;
    let dire = &fields.dire;
    let dirs = &fields.dirs;

    let mut qe_new = Grid::new(rows, cols, 0.0);
    let mut qs_new = Grid::new(rows, cols, 0.0);
    let mut hfe = Grid::new(rows, cols, 0.0);
    let mut hfs = Grid::new(rows, cols, 0.0);

    // Halo/edge faces keep their previous value.
    qe_new.data_mut().copy_from_slice(qe.data());
    qs_new.data_mut().copy_from_slice(qs.data());
    hfe.data_mut().copy_from_slice(fields.hfe.data());
    hfs.data_mut().copy_from_slice(fields.hfs.data());

    for r in 1..rows - 1 {
        for c in 1..cols - 1 {
            // East face: (r,c)-(r,c+1). Skip the last interior column (c == cols-2).
            if c < cols - 2 {
                let label = if *dire.get(r, c) == 0.0 {
                    FlowDirection::TowardPositive
                } else if *dire.get(r, c) == 1.0 {
                    FlowDirection::TowardNegative
                } else {
                    FlowDirection::None
                };
                let q_st = 0.25
                    * (qs.get(r, c) + qs.get(r, c + 1) + qs.get(r - 1, c) + qs.get(r - 1, c + 1));
                let (q, hf) = solve_face(
                    *z.get(r, c),
                    *z.get(r, c + 1),
                    *h.get(r, c),
                    *h.get(r, c + 1),
                    *n.get(r, c),
                    *n.get(r, c + 1),
                    *qe.get(r, c),
                    *qe.get(r, c - 1),
                    *qe.get(r, c + 1),
                    q_st,
                    label,
                    opts.dx,
                    opts,
                    dt,
                );
                qe_new.set(r, c, q);
                hfe.set(r, c, hf);
            }

            // South face: (r,c)-(r+1,c). Skip the last interior row (r == rows-2).
            if r < rows - 2 {
                let label = if *dirs.get(r, c) == 0.0 {
                    FlowDirection::TowardPositive
                } else if *dirs.get(r, c) == 1.0 {
                    FlowDirection::TowardNegative
                } else {
                    FlowDirection::None
                };
                let q_st = 0.25
                    * (qe.get(r, c) + qe.get(r + 1, c) + qe.get(r, c - 1) + qe.get(r + 1, c - 1));
                let (q, hf) = solve_face(
                    *z.get(r, c),
                    *z.get(r + 1, c),
                    *h.get(r, c),
                    *h.get(r + 1, c),
                    *n.get(r, c),
                    *n.get(r + 1, c),
                    *qs.get(r, c),
                    *qs.get(r - 1, c),
                    *qs.get(r + 1, c),
                    q_st,
                    label,
                    opts.dy,
                    opts,
                    dt,
                );
                qs_new.set(r, c, q);
                hfs.set(r, c, hf);
            }
        }
    }

    fields.qe_new = qe_new;
    fields.qs_new = qs_new;
    fields.hfe = hfe;
    fields.hfs = hfs;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_pond(rows: usize, cols: usize, depth: f64) -> Fields {
        let mut f = Fields::new(rows, cols);
        f.h.fill(depth);
        f.n.fill(0.03);
        f
    }

    #[test]
    fn dry_face_has_zero_discharge() {
        let mut f = Fields::new(3, 3);
        // all h=0 -> hf<=0 everywhere
        let opts = Options::default();
        solve_faces(&mut f, &opts, 0.1);
        assert_eq!(*f.qe_new.get(1, 1), 0.0);
    }

    #[test]
    fn hydrostatic_equilibrium_produces_near_zero_flux() {
        // Lake: h>0, flat bed -> |q| < eps on every face.
        let mut f = flat_pond(5, 5, 0.5);
        let opts = Options::default();
        solve_faces(&mut f, &opts, 0.1);
        for r in 1..4 {
            for c in 1..3 {
                assert!(f.qe_new.get(r, c).abs() < 1e-12, "qe at ({r},{c})");
            }
        }
        for r in 1..3 {
            for c in 1..4 {
                assert!(f.qs_new.get(r, c).abs() < 1e-12, "qs at ({r},{c})");
            }
        }
    }

    #[test]
    fn halo_faces_are_not_overwritten() {
        let mut f = flat_pond(4, 4, 0.3);
        f.qe.set(0, 0, 7.0);
        let opts = Options::default();
        solve_faces(&mut f, &opts, 0.1);
        assert_eq!(*f.qe_new.get(0, 0), 7.0);
    }

    #[test]
    fn last_interior_column_east_face_is_untouched() {
        let mut f = flat_pond(4, 4, 0.3);
        f.qe.set(1, 2, 3.3); // (rows-2, cols-2) = (2,2) edge; use row 1, col 2 = cols-2
        let opts = Options::default();
        solve_faces(&mut f, &opts, 0.1);
        assert_eq!(*f.qe_new.get(1, 2), 3.3);
    }

    #[test]
    fn hf_equals_max_wse_minus_max_z() {
        let mut f = Fields::new(4, 4);
        f.z.fill(1.0);
        f.z.set(1, 2, 0.5);
        f.h.fill(0.2);
        let opts = Options::default();
        solve_faces(&mut f, &opts, 0.1);
        let wse0 = 1.0 + 0.2;
        let wse1 = 0.5 + 0.2;
        let expected_hf = wse0.max(wse1) - 1.0_f64.max(0.5);
        assert!((f.hfe.get(1, 1) - expected_hf).abs() < 1e-12);
    }

    #[test]
    fn thin_film_routes_downhill_when_labeled() {
        let mut f = Fields::new(3, 4);
        f.h.set(1, 1, 0.005); // thin film, below default hf_min 0.01
        f.h.set(1, 2, 0.0);
        f.z.fill(0.0);
        f.dire.set(1, 1, 0.0); // toward positive index
        let opts = Options::default();
        solve_faces(&mut f, &opts, 0.1);
        // wse1 (0.0) is not > wse0 (0.005), so per spec's literal condition
        // (label==0 requires wse1>wse0) this face produces no flow; flip the bed
        // to exercise the opposite branch.
        assert_eq!(*f.qe_new.get(1, 1), 0.0);

        let mut f2 = Fields::new(3, 4);
        f2.h.set(1, 1, 0.0);
        f2.h.set(1, 2, 0.005);
        f2.z.fill(0.0);
        f2.dire.set(1, 1, 0.0);
        solve_faces(&mut f2, &opts, 0.1);
        assert!(*f2.qe_new.get(1, 1) < 0.0, "water should drain back toward index 1");
    }
}
