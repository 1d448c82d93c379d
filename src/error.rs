// ABOUTME: Structured error taxonomy for the flood-flow core
// ABOUTME: Numerical clamps are not represented here; they are aggregated into StepReport instead

use thiserror::Error;

/// Fatal or rejection-level errors the core can surface.
///
/// Numerical clamp events (spec §7 kind 1) are deliberately absent: they are
/// never fatal individually and are reported as an aggregate on
/// [`crate::driver::StepReport`], not as an error variant.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Kind 2: the CFL-selected `dt_next` fell below the configured floor.
    #[error(
        "CFL collapse: dt_next {dt_next:e} s fell below the configured floor {floor:e} s"
    )]
    CflCollapse { dt_next: f64, floor: f64 },

    /// Kind 3: cumulative relative mass error exceeded `max_error`.
    #[error(
        "mass-error overrun: cumulative relative volume error {observed:e} exceeds max_error {max_error:e}"
    )]
    MassErrorOverrun { observed: f64, max_error: f64 },

    /// Kind 4: an option passed to `configure` was out of its valid range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Kind 5: an array passed to `set_field` did not match the grid shape.
    #[error(
        "shape mismatch for field \"{field}\": expected {expected:?}, got {actual:?}"
    )]
    ShapeMismatch {
        field: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// `get_field`/`set_field` was called with a name the core does not recognize.
    #[error("unknown field \"{0}\"")]
    UnknownField(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
