//! Stand Management Cooperative variant for intensively managed plantations.
//!
//! Potential height growth comes from site index and is reduced by competition.
//! Improved seed lots add a genetic gain that fades out as the stand ages.

use super::{base, logistic, GrowthModel, PlantContext};
use crate::models::{CoefficientRecord, PlotAggregates};

pub(super) const COEFFS_VERSION: u32 = 2;
pub(super) const MODEL_VERSION: &str = "SMC 2.1";

/// Stand age at which genetic gains have fully faded.
pub const GENETIC_GAIN_AGE: f64 = 20.0;

/// Site index base age, years.
const SI_BASE_AGE: f64 = 50.0;
const SI_RATE: f64 = 0.025;
const SI_SHAPE: f64 = 1.3;

#[derive(Debug, Clone, Copy, Default)]
pub struct Smc;

/// Effective stand age implied by top height on a site, inverting the site curve
/// `H = SI * ((1 - exp(-kA)) / (1 - exp(-50k)))^p`.
///
/// Returns `None` when either input is non-positive or the height is beyond the curve's asymptote.
pub fn genetics_age_cut(top_height: f64, site_index: f64) -> Option<f64> {
    if top_height <= 0.0 || site_index <= 0.0 {
        return None;
    }
    let ratio =
        (top_height / site_index).powf(1.0 / SI_SHAPE) * (1.0 - (-SI_RATE * SI_BASE_AGE).exp());
    if ratio >= 1.0 {
        return None;
    }
    Some(-(1.0 - ratio).ln() / SI_RATE)
}

/// Growth multiplier for a genetic worth percentage at an effective age.
fn genetic_gain(ctx: &PlantContext<'_>, worth: f64) -> f64 {
    match ctx.genetics_age_cut {
        Some(age) if ctx.genetic_gains => {
            1.0 + worth / 100.0 * (1.0 - age / GENETIC_GAIN_AGE).clamp(0.0, 1.0)
        }
        _ => 1.0,
    }
}

impl GrowthModel for Smc {
    /// `h0 * SI^h1 * tht^h2 * exp(h3 * tht)` times
    /// `exp(h4 * cover + h5 * shrub cover + h6 * (1 - cr) + h7 * ccf / 100)`.
    fn height_growth(&self, ctx: &PlantContext<'_>) -> f64 {
        let p = ctx.plant;
        let si = ctx.plot.site_index;
        if si <= 0.0 || p.tht <= 0.0 {
            return 0.0;
        }
        let h = &ctx.coeffs.height_growth;
        let agg = ctx.aggregates();
        let potential = h[0] * si.powf(h[1]) * p.tht.powf(h[2]) * (h[3] * p.tht).exp();
        let modifier = (h[4] * agg.cover_in_taller(p.tht)
            + h[5] * agg.shrub.pct_cover
            + h[6] * (1.0 - p.cr.clamp(0.0, 1.0))
            + h[7] * agg.ccf / 100.0)
            .exp();
        potential * modifier * genetic_gain(ctx, ctx.species.genetic_worth_h)
    }

    /// Terms `[1, ln hg, ln d6, ln cr, basal area in larger, ccf / 100]`.
    fn diameter_growth(&self, ctx: &PlantContext<'_>, height_growth: f64) -> f64 {
        let p = ctx.plant;
        if p.d6 <= 0.0 || height_growth <= 0.0 {
            return 0.0;
        }
        let d = &ctx.coeffs.diameter_growth;
        let agg = ctx.aggregates();
        let x = d[0]
            + d[1] * height_growth.ln()
            + d[2] * p.d6.ln()
            + d[3] * ctx.log_crown_ratio()
            + d[4] * agg.basal_area_in_larger(p.dbh)
            + d[5] * agg.ccf / 100.0;
        x.exp() * genetic_gain(ctx, ctx.species.genetic_worth_d)
    }

    fn crown_ratio(&self, c: &CoefficientRecord, tht: f64, d6: f64, agg: &PlotAggregates) -> f64 {
        let k = &c.crown_ratio;
        let x = k[0]
            + k[1] * tht
            + k[2] * agg.ccf / 100.0
            + k[3] * agg.basal_area_in_taller(tht)
            + k[4] * (d6.max(0.0) + 1.0).ln();
        logistic(x)
    }
}

pub(super) fn coefficients() -> Vec<CoefficientRecord> {
    let mut records = base::records();
    let growth: [(&str, &[f64], f64, &[f64]); 7] = [
        (
            "DF",
            &[0.05, 0.9, 0.1, -0.02, -0.006, -0.004, -0.6, -0.05],
            0.45,
            &[-1.4, 0.6, 0.3, 0.4, -0.008, -0.05],
        ),
        (
            "PP",
            &[0.045, 0.9, 0.1, -0.02, -0.007, -0.005, -0.55, -0.05],
            0.4,
            &[-1.5, 0.58, 0.32, 0.38, -0.009, -0.05],
        ),
        (
            "WH",
            &[0.048, 0.9, 0.1, -0.018, -0.004, -0.004, -0.5, -0.04],
            0.45,
            &[-1.5, 0.6, 0.3, 0.4, -0.007, -0.04],
        ),
        (
            "MA",
            &[0.04, 0.88, 0.1, -0.025, -0.008, -0.003, -0.5, -0.06],
            0.5,
            &[-1.4, 0.55, 0.3, 0.35, -0.01, -0.06],
        ),
        (
            "TO",
            &[0.04, 0.88, 0.1, -0.024, -0.005, -0.003, -0.5, -0.06],
            0.5,
            &[-1.45, 0.55, 0.3, 0.35, -0.009, -0.06],
        ),
        ("CV", &[0.12, 0.5, 0.2, -0.08, -0.01], 0.25, &[-1.8, 0.5, 0.3]),
        ("AV", &[0.1, 0.5, 0.2, -0.07, -0.01], 0.2, &[-2.0, 0.5, 0.3]),
    ];
    for (code, hg, sd, dg) in growth {
        base::with_growth(&mut records, code, hg, sd, dg);
    }
    for r in records.iter_mut().filter(|r| r.life_form.is_tree()) {
        // CCF replaces overtopping cover in the crown ratio equation.
        r.crown_ratio[2] = -0.4;
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_species_table, Plant, Plot};

    fn df_plant() -> Plant {
        let mut p = Plant::new(1, 1, 0);
        p.tht = 10.0;
        p.d6 = 2.0;
        p.cr = 0.5;
        p
    }

    #[test]
    fn test_age_cut_inverts_site_curve() {
        let si = 120.0;
        let age = genetics_age_cut(si, si).unwrap();
        assert!((age - SI_BASE_AGE).abs() < 1e-6);
        let young = genetics_age_cut(30.0, si).unwrap();
        assert!(young > 0.0 && young < age);
    }

    #[test]
    fn test_age_cut_degenerate_inputs() {
        assert!(genetics_age_cut(0.0, 120.0).is_none());
        assert!(genetics_age_cut(50.0, 0.0).is_none());
        assert!(genetics_age_cut(1000.0, 100.0).is_none());
    }

    #[test]
    fn test_site_index_drives_height_growth() {
        let species = default_species_table();
        let recs = coefficients();
        let df = recs.iter().find(|r| r.code == "DF").unwrap();
        let plant = df_plant();
        let mut low = Plot::new(1);
        low.site_index = 80.0;
        let mut high = Plot::new(1);
        high.site_index = 130.0;
        let bare = Plot::new(1);
        let sp = species.get(0).unwrap();
        let hg = |plot: &Plot| {
            Smc.height_growth(&PlantContext {
                plant: &plant,
                plot,
                species: sp,
                coeffs: df,
                genetic_gains: false,
                genetics_age_cut: None,
            })
        };
        let hg_low = hg(&low);
        let hg_high = hg(&high);
        assert!(hg_low > 0.0);
        assert!(hg_high > hg_low);
        assert_eq!(hg(&bare), 0.0);
    }

    #[test]
    fn test_genetic_gain_fades_with_age() {
        let species = default_species_table();
        let recs = coefficients();
        let df = recs.iter().find(|r| r.code == "DF").unwrap();
        let plant = df_plant();
        let mut plot = Plot::new(1);
        plot.site_index = 120.0;
        let ctx = |gains, age| PlantContext {
            plant: &plant,
            plot: &plot,
            species: species.get(0).unwrap(),
            coeffs: df,
            genetic_gains: gains,
            genetics_age_cut: age,
        };
        let base = Smc.height_growth(&ctx(false, Some(5.0)));
        let young = Smc.height_growth(&ctx(true, Some(5.0)));
        let old = Smc.height_growth(&ctx(true, Some(25.0)));
        assert!(young > base);
        assert!((old - base).abs() < 1e-12);
        let worth = species.get(0).unwrap().genetic_worth_h;
        assert!((young / base - (1.0 + worth / 100.0 * 0.75)).abs() < 1e-9);
    }
}
