use serde::{Deserialize, Serialize};

use super::coeffs::LifeForm;
use super::plant::{Plant, SQ_FT_PER_ACRE};

/// Number of size bins in each competition table.
pub const AIT_SIZE: usize = 100;

/// Width of a competition bin (feet for height, inches for dbh).
pub const AIT_BIN_RES: f64 = 2.0;

/// Reineke stand density index exponent.
pub const REINEKE_B1: f64 = 1.605;

/// Life forms that contribute to the competition tables, in table order.
pub const COMPETITOR_FORMS: [LifeForm; 3] =
    [LifeForm::Conifer, LifeForm::Hardwood, LifeForm::Shrub];

/// Bin index for a height (ft) or dbh (in). Sizes beyond the table land in the last bin.
pub fn size_bin(size: f64) -> usize {
    if size.is_nan() || size <= 0.0 {
        return 0;
    }
    ((size / AIT_BIN_RES) as usize).min(AIT_SIZE - 1)
}

/// Size-binned cumulative competition for the conifer, hardwood and shrub life forms.
///
/// Entry `bin` holds the total contributed by plants whose own bin is strictly
/// greater than `bin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionTable {
    rows: [Vec<f64>; 3],
}

impl Default for CompetitionTable {
    fn default() -> Self {
        Self {
            rows: [vec![0.0; AIT_SIZE], vec![0.0; AIT_SIZE], vec![0.0; AIT_SIZE]],
        }
    }
}

impl CompetitionTable {
    fn row_index(life_form: LifeForm) -> Option<usize> {
        COMPETITOR_FORMS.iter().position(|lf| *lf == life_form)
    }

    pub fn reset(&mut self) {
        for row in self.rows.iter_mut() {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// Add `value` to every bin below `own_bin`.
    pub fn inject(&mut self, life_form: LifeForm, own_bin: usize, value: f64) {
        let Some(r) = Self::row_index(life_form) else {
            return;
        };
        let upper = own_bin.min(AIT_SIZE);
        for v in self.rows[r][..upper].iter_mut() {
            *v += value;
        }
    }

    pub fn get(&self, life_form: LifeForm, bin: usize) -> f64 {
        match Self::row_index(life_form) {
            Some(r) => self.rows[r][bin.min(AIT_SIZE - 1)],
            None => 0.0,
        }
    }

    /// Sum over the tree life forms at a bin.
    pub fn trees(&self, bin: usize) -> f64 {
        self.get(LifeForm::Conifer, bin) + self.get(LifeForm::Hardwood, bin)
    }

    /// Sum over all competing life forms at a bin.
    pub fn total(&self, bin: usize) -> f64 {
        self.trees(bin) + self.get(LifeForm::Shrub, bin)
    }
}

/// Per-life-form accumulators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LifeFormTotals {
    pub basal_area: f64,
    pub crown_area: f64,
    pub expf: f64,
    pub pct_cover: f64,
}

/// Aggregate plot state. Recomputed from scratch on every aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotAggregates {
    /// Basal area per acre of trees with a dbh, sq ft
    pub basal_area: f64,
    pub d6_area: f64,
    pub expf: f64,
    /// Stems per acre of trees taller than breast height
    pub bh_expf: f64,
    pub conifer: LifeFormTotals,
    pub hardwood: LifeFormTotals,
    pub shrub: LifeFormTotals,
    pub forb: LifeFormTotals,
    pub shrub_mean_height: f64,
    pub qmd: f64,
    pub sdi: f64,
    pub ccf: f64,
    /// Basal area in taller plants, by height bin
    pub bait: CompetitionTable,
    /// Crown area in taller plants, by height bin
    pub cait: CompetitionTable,
    /// Basal area in larger plants, by dbh bin
    pub bal: CompetitionTable,
}

impl PlotAggregates {
    pub fn reset(&mut self) {
        let bait = std::mem::take(&mut self.bait);
        let cait = std::mem::take(&mut self.cait);
        let bal = std::mem::take(&mut self.bal);
        *self = PlotAggregates { bait, cait, bal, ..PlotAggregates::default() };
        self.bait.reset();
        self.cait.reset();
        self.bal.reset();
    }

    pub fn totals_mut(&mut self, life_form: LifeForm) -> Option<&mut LifeFormTotals> {
        match life_form {
            LifeForm::Conifer => Some(&mut self.conifer),
            LifeForm::Hardwood => Some(&mut self.hardwood),
            LifeForm::Shrub => Some(&mut self.shrub),
            LifeForm::Forb => Some(&mut self.forb),
            LifeForm::NonStocked => None,
        }
    }

    /// Percent cover of taller trees and shrubs at a height.
    pub fn cover_in_taller(&self, height: f64) -> f64 {
        self.cait.total(size_bin(height)) / SQ_FT_PER_ACRE * 100.0
    }

    /// Basal area of taller trees at a height, sq ft/acre.
    pub fn basal_area_in_taller(&self, height: f64) -> f64 {
        self.bait.trees(size_bin(height))
    }

    /// Basal area of trees with a larger dbh, sq ft/acre.
    pub fn basal_area_in_larger(&self, dbh: f64) -> f64 {
        self.bal.trees(size_bin(dbh))
    }

    /// Shrub plus forb cover, percent.
    pub fn vegetation_cover(&self) -> f64 {
        self.shrub.pct_cover + self.forb.pct_cover
    }
}

/// A sample plot: static site covariates plus derived aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    /// Unique plot identifier
    pub plot: u32,
    /// Elevation in feet
    #[serde(default)]
    pub elevation: f64,
    /// Slope percentage
    #[serde(default)]
    pub slope: f64,
    /// Aspect in degrees (0-360)
    #[serde(default)]
    pub aspect: f64,
    /// Soil water holding capacity, inches
    #[serde(default)]
    pub water_capacity: f64,
    /// Mean annual precipitation, inches
    #[serde(default)]
    pub mean_annual_precip: f64,
    /// Growing season precipitation, inches
    #[serde(default)]
    pub growing_season_precip: f64,
    /// Site index, feet
    #[serde(default)]
    pub site_index: f64,
    /// Mean monthly temperature (°C), January first
    #[serde(default)]
    pub monthly_temperature: [f64; 12],
    /// Mean daily solar radiation by month (MJ/m²/day)
    #[serde(default)]
    pub monthly_solar_radiation: [f64; 12],
    #[serde(skip)]
    pub aggregates: PlotAggregates,
}

impl Plot {
    /// A plot with every covariate zero.
    pub fn new(plot: u32) -> Self {
        Self {
            plot,
            elevation: 0.0,
            slope: 0.0,
            aspect: 0.0,
            water_capacity: 0.0,
            mean_annual_precip: 0.0,
            growing_season_precip: 0.0,
            site_index: 0.0,
            monthly_temperature: [0.0; 12],
            monthly_solar_radiation: [0.0; 12],
            aggregates: PlotAggregates::default(),
        }
    }
}

/// Build one plot per distinct plot id in the plant sample, copying covariates from `template`.
pub fn plots_from_plants(plants: &[Plant], template: &Plot) -> Vec<Plot> {
    let mut ids: Vec<u32> = plants.iter().map(|p| p.plot).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.into_iter()
        .map(|id| Plot { plot: id, ..template.clone() })
        .collect()
}
