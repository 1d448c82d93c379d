// ABOUTME: Hydrology source kernel and infiltration kernels (spec sections 4.1, 4.2)
// ABOUTME: Element-wise, row-parallel; safe to call independently of the momentum solver

use crate::fields::Fields;

/// Combine rainfall, infiltration and capped losses into an effective
/// precipitation rate, floored so a single step cannot remove more water
/// than is present in the cell (spec §4.1).
///
/// `eff_precip = max(-h/dt, rain - inf - losses_capped)`
pub fn hydrology_source(fields: &mut Fields, dt: f64) {
    let rain = &fields.rain;
    let inf = &fields.inf;
    let losses = &fields.losses_capped;
    let h = &fields.h;
    let eff_precip = &mut fields.eff_precip;

    eff_precip.par_rows_mut(|r, row| {
        for (c, out) in row.iter_mut().enumerate() {
            let floor = -h.get(r, c) / dt;
            let demand = rain.get(r, c) - inf.get(r, c) - losses.get(r, c);
            *out = floor.max(demand);
        }
    });
}

/// User-fixed infiltration rate, capped so it never removes more water than
/// is present (spec §4.2): `inf_out = min(h/dt, inf_in)`.
///
/// `inf_in` is read from and written back to `fields.inf` in place: the
/// caller sets `fields.inf` to the externally supplied fixed rate before
/// calling this, and the capped rate is what remains afterwards.
pub fn infiltrate_fixed(fields: &mut Fields, dt: f64) {
    let h = &fields.h;
    let inf = &mut fields.inf;

    inf.par_rows_mut(|r, row| {
        for (c, out) in row.iter_mut().enumerate() {
            let cap = h.get(r, c) / dt;
            *out = cap.min(*out);
        }
    });
}

/// Green-Ampt infiltration (spec §4.2).
///
/// `avail_por = max(eff_por - water_soil_content, 0)`, `F = inf_amount`,
/// uncapped rate `conduct * (1 + avail_por*(pressure+h)/F)`, then
/// `inf_out = min(h/dt, rate)` and `inf_amount += inf_out*dt`.
///
/// The caller must ensure `inf_amount > 0` on first use; [`Fields::new`]
/// initializes it to a small positive depth for exactly this reason.
pub fn infiltrate_green_ampt(fields: &mut Fields, dt: f64) {
    let h = &fields.h;
    let eff_por = &fields.eff_por;
    let water_soil_content = &fields.water_soil_content;
    let pressure = &fields.pressure;
    let conduct = &fields.conduct;
    let cols = fields.shape().1;
    let rows = fields.shape().0;

    // inf and inf_amount are both written; borrow them together by row.
    for r in 0..rows {
        let inf_row = fields.inf.row_mut(r);
        let f_row = fields.inf_amount.row_mut(r);
        for c in 0..cols {
            let depth = *h.get(r, c);
            let avail_por = (eff_por.get(r, c) - water_soil_content.get(r, c)).max(0.0);
            let f = f_row[c];
            let rate = conduct.get(r, c) * (1.0 + avail_por * (pressure.get(r, c) + depth) / f);
            let capped = (depth / dt).min(rate);
            inf_row[c] = capped;
            f_row[c] += capped * dt;
        }
    }
}
