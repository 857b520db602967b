mod aggregate;
mod impute;
mod mortality;
mod project;
mod rng;
mod session;
mod statistics;
mod summary;
mod thin;

pub use aggregate::{quadratic_mean_diameter, recompute, stand_density_index};
pub use impute::{impute, SamplingDesign, MIN_HEIGHT};
pub use mortality::{
    apply_sdi_mortality, fit_x0, mortality_proportion, stand_max_sdi, trajectory_density,
    MortalityAssessment, DEFAULT_MAX_SDI, MORTALITY_ONSET, TRAJECTORY_SHAPE,
};
pub use project::{project, project_year, Control, YearSummary};
pub use rng::{RandomSource, SeededRandom};
pub use session::{Session, StandReport};
pub use statistics::{ConfidenceInterval, PlotSample, SamplingStatistics};
pub use summary::{
    plant_biomass, stem_volume, summarize_by_fsp, summarize_by_species, summarize_stand,
    top_height, SummaryRecord, STAND_CODE, TOP_HEIGHT_STEMS,
};
pub use thin::{thin, ThinOutcome, ThinType};
