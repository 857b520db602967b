//! SWO equations scaled by a monthly climate response.

use super::swo::{swo_diameter_growth, swo_height_growth};
use super::{swo, GrowthModel, PlantContext};
use crate::models::{CoefficientRecord, Plot, SpeciesRecord};

pub(super) const COEFFS_VERSION: u32 = 1;
pub(super) const MODEL_VERSION: &str = "SWO-Hybrid 1.0";

/// Months (zero-based) that make up the growing season, April through September.
const GROWING_SEASON: std::ops::RangeInclusive<usize> = 3..=8;

/// Radiation that gives a unit response, MJ/m²/day.
const REFERENCE_RADIATION: f64 = 20.0;
const MAX_RADIATION_RESPONSE: f64 = 1.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct SwoHybrid;

/// Temperature modifier in [0, 1]: zero outside the species' range and one at its optimum.
fn temperature_response(t: f64, species: &SpeciesRecord) -> f64 {
    let (lo, hi, opt) = (species.min_temp, species.max_temp, species.opt_temp);
    if opt <= lo || hi <= opt || t <= lo || t >= hi {
        return 0.0;
    }
    let shape = (hi - opt) / (opt - lo);
    ((t - lo) / (opt - lo)) * ((hi - t) / (hi - opt)).powf(shape)
}

/// Growing-season mean of the temperature response weighted by relative radiation.
pub fn climate_index(plot: &Plot, species: &SpeciesRecord) -> f64 {
    let months = GROWING_SEASON.count() as f64;
    let total: f64 = GROWING_SEASON
        .map(|m| {
            let radiation = (plot.monthly_solar_radiation[m] / REFERENCE_RADIATION)
                .clamp(0.0, MAX_RADIATION_RESPONSE);
            temperature_response(plot.monthly_temperature[m], species) * radiation
        })
        .sum();
    total / months
}

fn climate_multiplier(k: &[f64], ctx: &PlantContext<'_>) -> f64 {
    (k[8] + k[9] * climate_index(ctx.plot, ctx.species)).exp()
}

impl GrowthModel for SwoHybrid {
    fn height_growth(&self, ctx: &PlantContext<'_>) -> f64 {
        swo_height_growth(ctx) * climate_multiplier(&ctx.coeffs.height_growth, ctx)
    }

    fn diameter_growth(&self, ctx: &PlantContext<'_>, height_growth: f64) -> f64 {
        swo_diameter_growth(ctx, height_growth)
            * climate_multiplier(&ctx.coeffs.diameter_growth, ctx)
    }
}

pub(super) fn coefficients() -> Vec<CoefficientRecord> {
    let mut records = swo::coefficients();
    for r in records.iter_mut().filter(|r| r.life_form.grows()) {
        r.height_growth[8] = -0.35;
        r.height_growth[9] = 0.5;
        r.diameter_growth[8] = -0.21;
        r.diameter_growth[9] = 0.3;
    }
    records
}
