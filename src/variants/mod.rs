//! Variant-specific growth equations.
//!
//! Every variant implements [`GrowthModel`]. The orchestration that is common to
//! all of them (damage and error draws, the height → diameter → dbh/crown →
//! crown ratio ordering, floors) lives in [`project_plant`], so a variant only
//! supplies closed-form equations. [`Variant`] is the closed set of variants and
//! dispatches statically.

mod base;
mod cips;
mod hybrid;
mod smc;
mod swo;

use serde::{Deserialize, Serialize};

use crate::error::{ConifersError, Result};
use crate::models::{
    diameter_area, CoefficientRecord, CoefficientTable, Increments, Plant, Plot,
    PlotAggregates, SpeciesRecord, BREAST_HEIGHT,
};
use crate::simulation::RandomSource;

pub use cips::Cips;
pub use hybrid::{climate_index, SwoHybrid};
pub use smc::{genetics_age_cut, Smc, GENETIC_GAIN_AGE};
pub use swo::Swo;

/// Deviates beyond this many standard deviations are clamped (10th-90th percentile band).
pub const NORMAL_CLAMP: f64 = 1.645;

/// Height growth multiplier for a browsed plant.
pub const BROWSE_FACTOR: f64 = 0.5;

/// Smallest crown ratio used inside logarithms.
pub const MIN_CROWN_RATIO: f64 = 0.05;

/// Growth model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Southwest Oregon
    #[default]
    Swo,
    /// Stand Management Cooperative
    Smc,
    /// Southwest Oregon with a climate response
    SwoHybrid,
    /// Center for Intensive Planted-forest Silviculture
    Cips,
}

impl Variant {
    /// Variant for a numeric id. Unrecognised ids fall back to SWO.
    pub fn from_id(id: i32) -> Self {
        match id {
            1 => Variant::Smc,
            2 => Variant::SwoHybrid,
            3 => Variant::Cips,
            _ => Variant::Swo,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Variant::Swo => 0,
            Variant::Smc => 1,
            Variant::SwoHybrid => 2,
            Variant::Cips => 3,
        }
    }

    /// Built-in coefficient set for the variant.
    pub fn coefficients(self) -> Result<VariantCoefficients> {
        let (records, coeffs_version, model_version) = match self {
            Variant::Swo => (swo::coefficients(), swo::COEFFS_VERSION, swo::MODEL_VERSION),
            Variant::Smc => (smc::coefficients(), smc::COEFFS_VERSION, smc::MODEL_VERSION),
            Variant::SwoHybrid => (
                hybrid::coefficients(),
                hybrid::COEFFS_VERSION,
                hybrid::MODEL_VERSION,
            ),
            Variant::Cips => (cips::coefficients(), cips::COEFFS_VERSION, cips::MODEL_VERSION),
        };
        Ok(VariantCoefficients {
            variant: self,
            table: CoefficientTable::new(records)?,
            coeffs_version,
            model_version,
        })
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Swo => write!(f, "SWO"),
            Variant::Smc => write!(f, "SMC"),
            Variant::SwoHybrid => write!(f, "SWO-Hybrid"),
            Variant::Cips => write!(f, "CIPS"),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = ConifersError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "swo" | "0" => Ok(Variant::Swo),
            "smc" | "1" => Ok(Variant::Smc),
            "swo_hybrid" | "swo-hybrid" | "hybrid" | "2" => Ok(Variant::SwoHybrid),
            "cips" | "3" => Ok(Variant::Cips),
            _ => Err(ConifersError::ParseError(format!(
                "Unknown variant: '{s}'. Use swo, smc, swo-hybrid or cips"
            ))),
        }
    }
}

/// A variant's coefficient table together with its version tags.
#[derive(Debug, Clone)]
pub struct VariantCoefficients {
    pub variant: Variant,
    pub table: CoefficientTable,
    pub coeffs_version: u32,
    pub model_version: &'static str,
}

/// Load the built-in coefficients for a numeric variant id.
pub fn init_coefficients(variant_id: i32) -> Result<VariantCoefficients> {
    Variant::from_id(variant_id).coefficients()
}

/// Everything a growth equation may read about one plant.
#[derive(Debug, Clone, Copy)]
pub struct PlantContext<'a> {
    pub plant: &'a Plant,
    pub plot: &'a Plot,
    pub species: &'a SpeciesRecord,
    pub coeffs: &'a CoefficientRecord,
    pub genetic_gains: bool,
    pub genetics_age_cut: Option<f64>,
}

impl PlantContext<'_> {
    pub fn aggregates(&self) -> &PlotAggregates {
        &self.plot.aggregates
    }

    /// Crown ratio bounded away from zero for use in logarithms.
    pub fn log_crown_ratio(&self) -> f64 {
        self.plant.cr.clamp(MIN_CROWN_RATIO, 1.0).ln()
    }
}

/// Natural log of a positive value; zero contribution otherwise.
pub fn ln_pos(x: f64) -> f64 {
    if x > 0.0 {
        x.ln()
    } else {
        0.0
    }
}

/// Floor a prediction at zero, treating non-finite values as zero.
pub fn non_negative(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

/// Per plant-year random draws.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StochasticDraws {
    /// Standard normal deviate clamped to ±[`NORMAL_CLAMP`]
    pub normal: f64,
    pub browsed: bool,
    pub broken: bool,
}

impl StochasticDraws {
    /// No damage and no error term.
    pub fn none() -> Self {
        Self::default()
    }

    /// One normal and two uniform deviates.
    pub fn draw(rng: &mut dyn RandomSource, species: &SpeciesRecord) -> Self {
        let normal = rng.standard_normal().clamp(-NORMAL_CLAMP, NORMAL_CLAMP);
        let browsed = rng.uniform() < species.browse_damage;
        let broken = rng.uniform() < species.mechanical_damage;
        Self { normal, browsed, broken }
    }
}

/// Switches that shape a single plant's growth.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthOptions {
    pub use_random_error: bool,
    pub endemic_mortality: bool,
    pub genetic_gains: bool,
    pub genetics_age_cut: Option<f64>,
}

/// Closed-form equations a variant supplies.
///
/// Growth methods return raw predictions; [`project_plant`] applies the floors.
/// The static relationships are used by imputation and by the default growth
/// methods, which predict growth as the change in a static prediction.
pub trait GrowthModel {
    /// Height growth in feet before damage and error.
    fn height_growth(&self, ctx: &PlantContext<'_>) -> f64;

    /// Basal diameter growth in inches. Only called when height growth is positive.
    fn diameter_growth(&self, ctx: &PlantContext<'_>, height_growth: f64) -> f64;

    /// Dbh growth in inches. When the plant has no dbh yet this is the full
    /// predicted dbh once the new height passes breast height.
    fn dbh_growth(&self, ctx: &PlantContext<'_>, d6_growth: f64, height_growth: f64) -> f64 {
        let p = ctx.plant;
        let c = ctx.coeffs;
        let new_tht = p.tht + height_growth;
        if new_tht <= BREAST_HEIGHT {
            return 0.0;
        }
        let new_dbh = self.dbh_from_d6_height(c, p.d6 + d6_growth, new_tht);
        if p.dbh <= 0.0 {
            return new_dbh;
        }
        new_dbh - self.dbh_from_d6_height(c, p.d6, p.tht)
    }

    /// Crown width growth in feet.
    fn crown_width_growth(
        &self,
        ctx: &PlantContext<'_>,
        d6_growth: f64,
        height_growth: f64,
    ) -> f64 {
        let p = ctx.plant;
        if p.crown_width <= 0.0 {
            return 0.0;
        }
        let new_d6_area = diameter_area(p.d6 + d6_growth);
        self.crown_width(ctx.coeffs, new_d6_area, p.tht + height_growth)
            - self.crown_width(ctx.coeffs, p.d6_area, p.tht)
    }

    /// Signed crown ratio change. The crown base never moves down the stem.
    fn crown_ratio_growth(&self, ctx: &PlantContext<'_>, height_growth: f64) -> f64 {
        let p = ctx.plant;
        let new_tht = p.tht + height_growth;
        if p.tht <= 0.0 || new_tht <= 0.0 {
            return 0.0;
        }
        let predicted =
            self.crown_ratio(ctx.coeffs, new_tht, p.d6, ctx.aggregates());
        let crown_base = p.tht * (1.0 - p.cr.clamp(0.0, 1.0));
        let new_base = (new_tht * (1.0 - predicted)).max(crown_base);
        (1.0 - new_base / new_tht).clamp(0.0, 1.0) - p.cr
    }

    /// Annual endemic mortality proportion.
    fn endemic_mortality(&self, ctx: &PlantContext<'_>) -> f64 {
        let m = &ctx.coeffs.mortality;
        let cover = ctx.aggregates().cover_in_taller(ctx.plant.tht);
        ctx.species.endemic_mortality * (m[0] + m[1] * ctx.plant.cr + m[2] * cover).exp()
    }

    /// Basal diameter predicted from total height.
    fn d6_from_height(&self, c: &CoefficientRecord, tht: f64) -> f64 {
        let k = &c.d6_height;
        if tht <= 0.0 {
            return 0.0;
        }
        non_negative(k[0] * tht.powf(k[1]))
    }

    /// Total height predicted from basal diameter (inverse of [`Self::d6_from_height`]).
    fn height_from_d6(&self, c: &CoefficientRecord, d6: f64) -> f64 {
        let k = &c.d6_height;
        if d6 <= 0.0 || k[0] <= 0.0 || k[1] == 0.0 {
            return 0.0;
        }
        non_negative((d6 / k[0]).powf(1.0 / k[1]))
    }

    /// Basal diameter from total height and dbh. Never smaller than dbh.
    fn d6_from_height_dbh(&self, c: &CoefficientRecord, tht: f64, dbh: f64) -> f64 {
        if dbh <= 0.0 || tht <= BREAST_HEIGHT {
            return self.d6_from_height(c, tht);
        }
        let k = &c.d6_height_dbh;
        (k[0] + k[1] * dbh + k[2] * dbh * BREAST_HEIGHT / tht).max(dbh)
    }

    /// Dbh from basal diameter and height; zero at or below breast height.
    fn dbh_from_d6_height(&self, c: &CoefficientRecord, d6: f64, tht: f64) -> f64 {
        if d6 <= 0.0 || tht <= BREAST_HEIGHT {
            return 0.0;
        }
        let k = &c.dbh_d6_height;
        let dbh = k[0] * d6.powf(k[1]) * (1.0 - (k[2] * (tht - BREAST_HEIGHT)).exp());
        non_negative(dbh).min(d6)
    }

    /// Crown width in feet from basal area at d6 (sq ft) and height.
    fn crown_width(&self, c: &CoefficientRecord, d6_area: f64, tht: f64) -> f64 {
        let k = &c.crown_width;
        let area = d6_area + k[3];
        if area <= 0.0 || tht <= 0.0 {
            return 0.0;
        }
        non_negative(k[0] * area.powf(k[1]) * tht.powf(k[2]))
    }

    /// Open-grown crown width in feet.
    fn max_crown_width(&self, c: &CoefficientRecord, d6: f64, tht: f64) -> f64 {
        if d6 <= 0.0 {
            return 0.0;
        }
        let k = &c.max_crown_width;
        non_negative(k[0] + k[1] * d6 + k[2] * tht)
    }

    /// Crown ratio from the in-taller competition at the given height.
    fn crown_ratio(&self, c: &CoefficientRecord, tht: f64, d6: f64, agg: &PlotAggregates) -> f64 {
        let k = &c.crown_ratio;
        let x = k[0]
            + k[1] * tht
            + k[2] * agg.cover_in_taller(tht)
            + k[3] * agg.basal_area_in_taller(tht)
            + k[4] * (d6.max(0.0) + 1.0).ln();
        logistic(x)
    }
}

pub(crate) fn logistic(x: f64) -> f64 {
    let v = 1.0 / (1.0 + (-x).exp());
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            Variant::Swo => {
                let $m = &Swo;
                $body
            }
            Variant::Smc => {
                let $m = &Smc;
                $body
            }
            Variant::SwoHybrid => {
                let $m = &SwoHybrid;
                $body
            }
            Variant::Cips => {
                let $m = &Cips;
                $body
            }
        }
    };
}

impl GrowthModel for Variant {
    fn height_growth(&self, ctx: &PlantContext<'_>) -> f64 {
        dispatch!(self, m => m.height_growth(ctx))
    }

    fn diameter_growth(&self, ctx: &PlantContext<'_>, height_growth: f64) -> f64 {
        dispatch!(self, m => m.diameter_growth(ctx, height_growth))
    }

    fn dbh_growth(&self, ctx: &PlantContext<'_>, d6_growth: f64, height_growth: f64) -> f64 {
        dispatch!(self, m => m.dbh_growth(ctx, d6_growth, height_growth))
    }

    fn crown_width_growth(
        &self,
        ctx: &PlantContext<'_>,
        d6_growth: f64,
        height_growth: f64,
    ) -> f64 {
        dispatch!(self, m => m.crown_width_growth(ctx, d6_growth, height_growth))
    }

    fn crown_ratio_growth(&self, ctx: &PlantContext<'_>, height_growth: f64) -> f64 {
        dispatch!(self, m => m.crown_ratio_growth(ctx, height_growth))
    }

    fn endemic_mortality(&self, ctx: &PlantContext<'_>) -> f64 {
        dispatch!(self, m => m.endemic_mortality(ctx))
    }

    fn d6_from_height(&self, c: &CoefficientRecord, tht: f64) -> f64 {
        dispatch!(self, m => m.d6_from_height(c, tht))
    }

    fn height_from_d6(&self, c: &CoefficientRecord, d6: f64) -> f64 {
        dispatch!(self, m => m.height_from_d6(c, d6))
    }

    fn d6_from_height_dbh(&self, c: &CoefficientRecord, tht: f64, dbh: f64) -> f64 {
        dispatch!(self, m => m.d6_from_height_dbh(c, tht, dbh))
    }

    fn dbh_from_d6_height(&self, c: &CoefficientRecord, d6: f64, tht: f64) -> f64 {
        dispatch!(self, m => m.dbh_from_d6_height(c, d6, tht))
    }

    fn crown_width(&self, c: &CoefficientRecord, d6_area: f64, tht: f64) -> f64 {
        dispatch!(self, m => m.crown_width(c, d6_area, tht))
    }

    fn max_crown_width(&self, c: &CoefficientRecord, d6: f64, tht: f64) -> f64 {
        dispatch!(self, m => m.max_crown_width(c, d6, tht))
    }

    fn crown_ratio(&self, c: &CoefficientRecord, tht: f64, d6: f64, agg: &PlotAggregates) -> f64 {
        dispatch!(self, m => m.crown_ratio(c, tht, d6, agg))
    }
}

/// Predict one year of growth for a plant.
///
/// Writes nothing; the caller records and applies the returned increments.
pub fn project_plant<M: GrowthModel + ?Sized>(
    model: &M,
    plant: &Plant,
    plot: &Plot,
    species: &SpeciesRecord,
    coeffs: Option<&CoefficientRecord>,
    options: &GrowthOptions,
    draws: &StochasticDraws,
) -> Result<Increments> {
    let coeffs = coeffs.ok_or_else(|| ConifersError::FailedProjectPlant {
        plot: plant.plot,
        plant: plant.plant,
        reason: format!("no coefficients for functional species {}", species.fsp),
    })?;

    let life_form = coeffs.life_form;
    if !life_form.grows() {
        return Ok(Increments::default());
    }

    let ctx = PlantContext {
        plant,
        plot,
        species,
        coeffs,
        genetic_gains: options.genetic_gains,
        genetics_age_cut: options.genetics_age_cut,
    };

    let mut hg = non_negative(model.height_growth(&ctx));
    if draws.broken {
        hg = 0.0;
    } else if draws.browsed {
        hg *= BROWSE_FACTOR;
    } else if options.use_random_error {
        hg += draws.normal * coeffs.hg_error_sd;
    }
    let hg = non_negative(hg);

    let dg = if hg > 0.0 {
        non_negative(model.diameter_growth(&ctx, hg))
    } else {
        0.0
    };

    let (dbh_g, cr_g) = if life_form.is_tree() {
        let dbh_g = non_negative(model.dbh_growth(&ctx, dg, hg));
        let cr_g = model.crown_ratio_growth(&ctx, hg);
        let cr_g = if cr_g.is_finite() {
            (plant.cr + cr_g).clamp(0.0, 1.0) - plant.cr
        } else {
            0.0
        };
        (dbh_g, cr_g)
    } else {
        (0.0, 0.0)
    };

    let cw_g = non_negative(model.crown_width_growth(&ctx, dg, hg));

    let expf_change = if options.endemic_mortality {
        let rate = model.endemic_mortality(&ctx);
        let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        -plant.expf * rate
    } else {
        0.0
    };

    Ok(Increments {
        d6: dg,
        dbh: dbh_g,
        tht: hg,
        cr: cr_g,
        crown_width: cw_g,
        expf_change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_species_table, LifeForm};
    use crate::simulation::SeededRandom;

    fn conifer_plant() -> Plant {
        let mut p = Plant::new(1, 1, 0);
        p.tht = 10.0;
        p.d6 = 2.0;
        p.cr = 0.5;
        p.expf = 10.0;
        p.crown_width = 3.5;
        p.update_derived();
        p
    }

    fn site_plot() -> Plot {
        let mut plot = Plot::new(1);
        plot.mean_annual_precip = 40.0;
        plot.growing_season_precip = 8.0;
        plot.water_capacity = 5.0;
        plot.site_index = 120.0;
        plot.monthly_temperature =
            [4.0, 5.0, 7.0, 9.0, 12.0, 16.0, 19.0, 19.0, 16.0, 11.0, 7.0, 4.0];
        plot.monthly_solar_radiation =
            [5.0, 8.0, 12.0, 17.0, 21.0, 24.0, 26.0, 23.0, 17.0, 11.0, 6.0, 4.0];
        plot
    }

    #[test]
    fn test_variant_from_id_defaults_to_swo() {
        assert_eq!(Variant::from_id(0), Variant::Swo);
        assert_eq!(Variant::from_id(1), Variant::Smc);
        assert_eq!(Variant::from_id(2), Variant::SwoHybrid);
        assert_eq!(Variant::from_id(3), Variant::Cips);
        assert_eq!(Variant::from_id(17), Variant::Swo);
        assert_eq!(Variant::from_id(-1), Variant::Swo);
    }

    #[test]
    fn test_variant_parse_and_display() {
        assert_eq!("SMC".parse::<Variant>().unwrap(), Variant::Smc);
        assert_eq!("swo-hybrid".parse::<Variant>().unwrap(), Variant::SwoHybrid);
        assert!("fvs".parse::<Variant>().is_err());
        assert_eq!(Variant::Cips.to_string(), "CIPS");
    }

    #[test]
    fn test_init_coefficients_sorted_for_every_variant() {
        for id in 0..4 {
            let vc = init_coefficients(id).unwrap();
            assert_eq!(vc.variant.id(), id);
            let fsps: Vec<u32> = vc.table.records().iter().map(|r| r.fsp).collect();
            let mut sorted = fsps.clone();
            sorted.sort_unstable();
            assert_eq!(fsps, sorted);
            assert!(vc.coeffs_version > 0);
            assert!(!vc.model_version.is_empty());
        }
    }

    #[test]
    fn test_every_default_species_has_coefficients() {
        let species = default_species_table();
        for id in 0..4 {
            let vc = init_coefficients(id).unwrap();
            for sp in species.records() {
                assert!(vc.table.get(sp.fsp).is_some(), "fsp {} missing", sp.fsp);
            }
        }
    }

    #[test]
    fn test_stochastic_draws_clamped() {
        let species = default_species_table();
        let df = species.get(0).unwrap();
        let mut rng = SeededRandom::new(7);
        for _ in 0..500 {
            let d = StochasticDraws::draw(&mut rng, df);
            assert!(d.normal.abs() <= NORMAL_CLAMP);
        }
    }

    #[test]
    fn test_project_plant_missing_coefficients_fails() {
        let species = default_species_table();
        let plant = conifer_plant();
        let result = project_plant(
            &Variant::Swo,
            &plant,
            &site_plot(),
            species.get(0).unwrap(),
            None,
            &GrowthOptions::default(),
            &StochasticDraws::none(),
        );
        assert!(matches!(result, Err(ConifersError::FailedProjectPlant { .. })));
    }

    #[test]
    fn test_project_plant_forb_has_no_growth() {
        let species = default_species_table();
        let vc = init_coefficients(0).unwrap();
        let forb = species.get(7).unwrap();
        let mut plant = conifer_plant();
        plant.species = 7;
        let inc = project_plant(
            &Variant::Swo,
            &plant,
            &site_plot(),
            forb,
            vc.table.get(forb.fsp),
            &GrowthOptions { endemic_mortality: true, ..GrowthOptions::default() },
            &StochasticDraws::none(),
        )
        .unwrap();
        assert_eq!(inc, Increments::default());
    }

    #[test]
    fn test_project_plant_positive_growth_all_variants() {
        let species = default_species_table();
        let df = species.get(0).unwrap();
        let plant = conifer_plant();
        let plot = site_plot();
        for id in 0..4 {
            let vc = init_coefficients(id).unwrap();
            let inc = project_plant(
                &vc.variant,
                &plant,
                &plot,
                df,
                vc.table.get(df.fsp),
                &GrowthOptions::default(),
                &StochasticDraws::none(),
            )
            .unwrap();
            assert!(inc.tht > 0.0, "{} height growth", vc.variant);
            assert!(inc.d6 > 0.0, "{} diameter growth", vc.variant);
            assert!(inc.dbh > 0.0, "{} first dbh", vc.variant);
            assert!(plant.cr + inc.cr >= 0.0 && plant.cr + inc.cr <= 1.0);
        }
    }

    #[test]
    fn test_broken_top_stops_height_and_diameter_growth() {
        let species = default_species_table();
        let df = species.get(0).unwrap();
        let vc = init_coefficients(0).unwrap();
        let draws = StochasticDraws { normal: 1.0, browsed: false, broken: true };
        let inc = project_plant(
            &Variant::Swo,
            &conifer_plant(),
            &site_plot(),
            df,
            vc.table.get(df.fsp),
            &GrowthOptions { use_random_error: true, ..GrowthOptions::default() },
            &draws,
        )
        .unwrap();
        assert_eq!(inc.tht, 0.0);
        assert_eq!(inc.d6, 0.0);
    }

    #[test]
    fn test_browse_halves_height_growth_and_ignores_error() {
        let species = default_species_table();
        let df = species.get(0).unwrap();
        let vc = init_coefficients(0).unwrap();
        let base = project_plant(
            &Variant::Swo,
            &conifer_plant(),
            &site_plot(),
            df,
            vc.table.get(df.fsp),
            &GrowthOptions::default(),
            &StochasticDraws::none(),
        )
        .unwrap();
        let browsed = project_plant(
            &Variant::Swo,
            &conifer_plant(),
            &site_plot(),
            df,
            vc.table.get(df.fsp),
            &GrowthOptions { use_random_error: true, ..GrowthOptions::default() },
            &StochasticDraws { normal: 1.645, browsed: true, broken: false },
        )
        .unwrap();
        assert!((browsed.tht - base.tht * BROWSE_FACTOR).abs() < 1e-12);
    }

    #[test]
    fn test_error_term_ignored_when_disabled() {
        let species = default_species_table();
        let df = species.get(0).unwrap();
        let vc = init_coefficients(0).unwrap();
        let run = |draws: StochasticDraws| {
            project_plant(
                &Variant::Swo,
                &conifer_plant(),
                &site_plot(),
                df,
                vc.table.get(df.fsp),
                &GrowthOptions::default(),
                &draws,
            )
            .unwrap()
        };
        let a = run(StochasticDraws::none());
        let b = run(StochasticDraws { normal: -1.645, browsed: false, broken: false });
        assert_eq!(a, b);
    }

    #[test]
    fn test_endemic_mortality_reduces_expf() {
        let species = default_species_table();
        let df = species.get(0).unwrap();
        let vc = init_coefficients(0).unwrap();
        let inc = project_plant(
            &Variant::Swo,
            &conifer_plant(),
            &site_plot(),
            df,
            vc.table.get(df.fsp),
            &GrowthOptions { endemic_mortality: true, ..GrowthOptions::default() },
            &StochasticDraws::none(),
        )
        .unwrap();
        assert!(inc.expf_change < 0.0);
        assert!(inc.expf_change > -10.0);
    }

    #[test]
    fn test_shrub_has_no_dbh_or_crown_ratio_growth() {
        let species = default_species_table();
        let cv = species.get(5).unwrap();
        let vc = init_coefficients(0).unwrap();
        assert_eq!(vc.table.get(cv.fsp).unwrap().life_form, LifeForm::Shrub);
        let mut shrub = Plant::new(1, 2, 5);
        shrub.tht = 3.0;
        shrub.crown_width = 2.0;
        shrub.expf = 200.0;
        shrub.update_derived();
        let inc = project_plant(
            &Variant::Swo,
            &shrub,
            &site_plot(),
            cv,
            vc.table.get(cv.fsp),
            &GrowthOptions::default(),
            &StochasticDraws::none(),
        )
        .unwrap();
        assert!(inc.tht > 0.0);
        assert_eq!(inc.dbh, 0.0);
        assert_eq!(inc.cr, 0.0);
        assert!(inc.crown_width > 0.0);
    }

    #[test]
    fn test_static_relationships_consistent() {
        let vc = init_coefficients(0).unwrap();
        let df = vc.table.get(1).unwrap();
        let m = Variant::Swo;
        let d6 = m.d6_from_height(df, 10.0);
        assert!(d6 > 1.5 && d6 < 2.5);
        let back = m.height_from_d6(df, d6);
        assert!((back - 10.0).abs() < 1e-9);
        assert_eq!(m.dbh_from_d6_height(df, 2.0, 4.0), 0.0);
        let dbh = m.dbh_from_d6_height(df, 2.5, 12.0);
        assert!(dbh > 0.0 && dbh <= 2.5);
        assert!(m.d6_from_height_dbh(df, 30.0, 4.0) >= 4.0);
        assert!(m.crown_width(df, diameter_area(2.0), 10.0) > 0.0);
        assert!(m.max_crown_width(df, 2.0, 10.0) > m.crown_width(df, diameter_area(2.0), 10.0));
        let cr = m.crown_ratio(df, 10.0, 2.0, &PlotAggregates::default());
        assert!(cr > 0.5 && cr <= 1.0);
    }

    #[test]
    fn test_ln_pos_and_non_negative() {
        assert_eq!(ln_pos(0.0), 0.0);
        assert_eq!(ln_pos(-3.0), 0.0);
        assert!((ln_pos(std::f64::consts::E) - 1.0).abs() < 1e-12);
        assert_eq!(non_negative(-0.1), 0.0);
        assert_eq!(non_negative(f64::NAN), 0.0);
        assert_eq!(non_negative(f64::INFINITY), 0.0);
        assert_eq!(non_negative(0.3), 0.3);
    }
}
