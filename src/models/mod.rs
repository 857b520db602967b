mod plant;
mod plot;
mod species;
mod coeffs;
mod stand;

pub use plant::{
    crown_area, diameter_area, Increments, Plant, PlantErrors, BA_FACTOR, BREAST_HEIGHT,
    SQ_FT_PER_ACRE,
};
pub use plot::{
    plots_from_plants, size_bin, CompetitionTable, LifeFormTotals, Plot, PlotAggregates,
    AIT_BIN_RES, AIT_SIZE, COMPETITOR_FORMS, REINEKE_B1,
};
pub use species::{default_species_table, SpeciesRecord, SpeciesTable};
pub use coeffs::{coeffs, CoefficientRecord, CoefficientTable, Coefficients, LifeForm, N_COEFFS};
pub use stand::{PlotRange, Stand};
