// ABOUTME: Flow-direction classifier for thin-film rain-routing (spec section 4.3)
// ABOUTME: Cheap per-face label; may be recomputed every step or only when routing inputs change

/// Routing direction label for a face.
///
/// `0` routes toward the positive index, `1` toward the negative index, and
/// `-1` disables routing on that face (dry/flat bed, or an ambiguous slope
/// that matches neither downhill candidate).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowDirection {
    TowardPositive = 0,
    TowardNegative = 1,
    None = -1,
}

impl FlowDirection {
    pub fn as_f64(self) -> f64 {
        self as i8 as f64
    }
}

/// Classify one face given the three slope candidates (spec §4.3).
///
/// `max_dz` is the largest downhill slope observed at the cell; `dz0` is the
/// slope downhill toward the positive-index neighbor, `dz1` toward the
/// negative-index neighbor. When `max_dz > 0` matches both `dz0` and `dz1`
/// (a flat saddle), the tie resolves to `TowardPositive` — see `DESIGN.md`
/// for why that tie-break is preserved rather than "fixed".
pub fn classify_face(max_dz: f64, dz0: f64, dz1: f64) -> FlowDirection {
    if max_dz > 0.0 {
        if max_dz == dz0 {
            FlowDirection::TowardPositive
        } else if max_dz == dz1 {
            FlowDirection::TowardNegative
        } else {
            FlowDirection::None
        }
    } else {
        FlowDirection::None
    }
}
