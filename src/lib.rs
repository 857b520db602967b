//! Individual-plant growth projection for young forest stands.
//!
//! A [`Stand`] holds plots and plants. A [`Session`] pairs a [`Variant`] with
//! its species and coefficient tables and drives imputation, annual
//! projection, thinning and summaries.

pub mod error;
pub mod io;
pub mod models;
pub mod simulation;
pub mod variants;
pub mod visualization;

pub use error::{ConifersError, ReturnCode};
pub use io::{SimulationConfig, StandReader, StandWriter};
pub use models::{CoefficientTable, LifeForm, Plant, Plot, SpeciesTable, Stand};
pub use simulation::{Control, SamplingDesign, Session, StandReport, ThinType, YearSummary};
pub use variants::{GrowthModel, Variant};
