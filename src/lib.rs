// ABOUTME: Library interface for the flowcore inertial shallow-water flood-flow core
// ABOUTME: Exposes the kernel modules plus the driver's step-wise API for external collaborators

pub mod config;
pub mod depth;
pub mod direction;
pub mod driver;
pub mod error;
pub mod fields;
pub mod grid;
pub mod hydrology;
pub mod momentum;
pub mod timestep;

pub use config::Options;
pub use driver::{Driver, InfiltrationModel, RecordAccumulators, StepReport};
pub use error::{CoreError, CoreResult};
pub use fields::Fields;
pub use grid::Grid;
