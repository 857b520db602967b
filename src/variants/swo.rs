//! Southwest Oregon variant.
//!
//! Height growth is a log-linear function of size, crown ratio, overtopping
//! cover, shrub competition and site moisture. Diameter growth is driven by the
//! year's height growth.

use super::{base, ln_pos, GrowthModel, PlantContext};
use crate::models::CoefficientRecord;

pub(super) const COEFFS_VERSION: u32 = 4;
pub(super) const MODEL_VERSION: &str = "SWO 4.0";

#[derive(Debug, Clone, Copy, Default)]
pub struct Swo;

/// Height growth with terms
/// `[1, ln tht, tht, ln cr, cover in taller, shrub cover, ln precip, water capacity]`.
pub(super) fn swo_height_growth(ctx: &PlantContext<'_>) -> f64 {
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
        + h[4] * agg.cover_in_taller(p.tht)
        + h[5] * agg.shrub.pct_cover
        + h[6] * ln_pos(ctx.plot.mean_annual_precip)
        + h[7] * ctx.plot.water_capacity;
    x.exp()
}

/// Diameter growth with terms
/// `[1, ln hg, ln d6, ln cr, basal area in taller, shrub cover, ln precip, water capacity]`.
pub(super) fn swo_diameter_growth(ctx: &PlantContext<'_>, height_growth: f64) -> f64 {
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
        + d[4] * agg.basal_area_in_taller(p.tht)
        + d[5] * agg.shrub.pct_cover
        + d[6] * ln_pos(ctx.plot.mean_annual_precip)
        + d[7] * ctx.plot.water_capacity;
    x.exp()
}

impl GrowthModel for Swo {
    fn height_growth(&self, ctx: &PlantContext<'_>) -> f64 {
        swo_height_growth(ctx)
    }

    fn diameter_growth(&self, ctx: &PlantContext<'_>, height_growth: f64) -> f64 {
        swo_diameter_growth(ctx, height_growth)
    }
}

pub(super) fn coefficients() -> Vec<CoefficientRecord> {
    let mut records = base::records();
    let growth: [(&str, &[f64], f64, &[f64]); 7] = [
        (
            "DF",
            &[-1.2, 0.75, -0.01, 0.35, -0.005, -0.004, 0.2, 0.02],
            0.4,
            &[-1.5, 0.6, 0.3, 0.4, -0.01, -0.003, 0.1, 0.01],
        ),
        (
            "PP",
            &[-1.35, 0.72, -0.009, 0.3, -0.006, -0.005, 0.22, 0.015],
            0.35,
            &[-1.55, 0.58, 0.32, 0.38, -0.012, -0.004, 0.1, 0.01],
        ),
        (
            "WH",
            &[-1.25, 0.74, -0.011, 0.32, -0.003, -0.004, 0.2, 0.025],
            0.4,
            &[-1.6, 0.6, 0.3, 0.4, -0.008, -0.003, 0.1, 0.012],
        ),
        (
            "MA",
            &[-1.4, 0.7, -0.015, 0.3, -0.007, -0.003, 0.18, 0.01],
            0.45,
            &[-1.45, 0.55, 0.3, 0.35, -0.012, -0.002, 0.08, 0.01],
        ),
        (
            "TO",
            &[-1.45, 0.7, -0.014, 0.3, -0.004, -0.003, 0.18, 0.01],
            0.45,
            &[-1.5, 0.55, 0.3, 0.35, -0.01, -0.002, 0.08, 0.01],
        ),
        (
            "CV",
            &[-1.0, 0.5, -0.05, 0.0, -0.01, 0.0, 0.1],
            0.25,
            &[-1.8, 0.5, 0.3],
        ),
        (
            "AV",
            &[-1.3, 0.5, -0.04, 0.0, -0.01, 0.0, 0.1],
            0.2,
            &[-2.0, 0.5, 0.3],
        ),
    ];
    for (code, hg, sd, dg) in growth {
        base::with_growth(&mut records, code, hg, sd, dg);
    }
    records
}
