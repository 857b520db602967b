//! Center for Intensive Planted-forest Silviculture variant for young plantations.
//!
//! Competing vegetation (shrubs and forbs) is the main driver.

use super::{base, ln_pos, GrowthModel, PlantContext};
use crate::models::CoefficientRecord;

pub(super) const COEFFS_VERSION: u32 = 3;
pub(super) const MODEL_VERSION: &str = "CIPS 3.0";

#[derive(Debug, Clone, Copy, Default)]
pub struct Cips;

impl GrowthModel for Cips {
    /// Terms `[1, ln tht, tht, ln cr, vegetation cover, ln growing season precip,
    /// ln site index, cover in taller]`.
    fn height_growth(&self, ctx: &PlantContext<'_>) -> f64 {
        let p = ctx.plant;
        if p.tht <= 0.0 {
            return 0.0;
        }
        let h = &ctx.coeffs.height_growth;
        let agg = ctx.aggregates();
        let x = h[0]
            + h[1] * p.tht.ln()
            + h[2] * p.tht
            + h[3] * ctx.log_crown_ratio()
            + h[4] * agg.vegetation_cover()
            + h[5] * ln_pos(ctx.plot.growing_season_precip)
            + h[6] * ln_pos(ctx.plot.site_index)
            + h[7] * agg.cover_in_taller(p.tht);
        x.exp()
    }

    /// Terms `[1, ln hg, ln d6, ln cr, vegetation cover, ln growing season precip,
    /// basal area in taller]`.
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
            + d[4] * agg.vegetation_cover()
            + d[5] * ln_pos(ctx.plot.growing_season_precip)
            + d[6] * agg.basal_area_in_taller(p.tht);
        x.exp()
    }

    fn endemic_mortality(&self, ctx: &PlantContext<'_>) -> f64 {
        let m = &ctx.coeffs.mortality;
        ctx.species.endemic_mortality
            * (m[0] + m[1] * ctx.plant.cr + m[2] * ctx.aggregates().vegetation_cover()).exp()
    }
}

pub(super) fn coefficients() -> Vec<CoefficientRecord> {
    let mut records = base::records();
    let growth: [(&str, &[f64], f64, &[f64]); 7] = [
        (
            "DF",
            &[-2.0, 0.7, -0.012, 0.3, -0.008, 0.15, 0.25, -0.004],
            0.35,
            &[-1.6, 0.6, 0.3, 0.4, -0.006, 0.1, -0.01],
        ),
        (
            "PP",
            &[-2.1, 0.68, -0.011, 0.28, -0.009, 0.16, 0.25, -0.005],
            0.3,
            &[-1.65, 0.58, 0.32, 0.38, -0.007, 0.1, -0.012],
        ),
        (
            "WH",
            &[-2.05, 0.7, -0.013, 0.3, -0.006, 0.14, 0.25, -0.003],
            0.35,
            &[-1.7, 0.6, 0.3, 0.4, -0.005, 0.1, -0.008],
        ),
        (
            "MA",
            &[-2.2, 0.66, -0.016, 0.28, -0.006, 0.14, 0.24, -0.006],
            0.4,
            &[-1.6, 0.55, 0.3, 0.35, -0.006, 0.08, -0.012],
        ),
        (
            "TO",
            &[-2.25, 0.66, -0.015, 0.28, -0.005, 0.14, 0.24, -0.004],
            0.4,
            &[-1.65, 0.55, 0.3, 0.35, -0.005, 0.08, -0.01],
        ),
        ("CV", &[-1.6, 0.5, -0.05, 0.0, -0.004, 0.1, 0.1], 0.25, &[-1.8, 0.5, 0.3]),
        ("AV", &[-1.9, 0.5, -0.04, 0.0, -0.004, 0.1, 0.1], 0.2, &[-2.0, 0.5, 0.3]),
    ];
    for (code, hg, sd, dg) in growth {
        base::with_growth(&mut records, code, hg, sd, dg);
    }
    records
}
