//! Density-dependent mortality along a self-thinning trajectory.
//!
//! Relative density is stand SDI over the basal-area weighted maximum SDI of
//! the species present. The trajectory `r(D) = 1 / (1 + (x0 / D)^k)` gives the
//! relative density a stand follows as its quadratic mean diameter `D` grows;
//! `x0` is the diameter where it passes 0.5.

use std::f64::consts::LN_10;

use tracing::{debug, info};

use super::summary::SummaryRecord;
use super::thin::{thin, ThinType};
use crate::error::Result;
use crate::models::{CoefficientTable, SpeciesTable, Stand, REINEKE_B1};

/// Maximum SDI used when the stand has no tree basal area.
pub const DEFAULT_MAX_SDI: f64 = 450.0;

/// Relative density below which no density-dependent mortality occurs.
pub const MORTALITY_ONSET: f64 = 0.4;

/// Shape of the self-thinning trajectory.
pub const TRAJECTORY_SHAPE: f64 = 2.0;

/// Relative densities above this are clamped when fitting `x0`.
const MAX_FIT_DENSITY: f64 = 0.99;

/// Basal-area weighted maximum SDI over the conifers and hardwoods in the stand.
pub fn stand_max_sdi(stand: &Stand, species: &SpeciesTable, coeffs: &CoefficientTable) -> f64 {
    let mut ba_sum = 0.0;
    let mut weighted = 0.0;
    for p in &stand.plants {
        let Ok(sp) = species.get(p.species) else {
            continue;
        };
        let is_tree = coeffs.get(sp.fsp).is_some_and(|c| c.life_form.is_tree());
        let ba = p.basal_area * p.expf.max(0.0);
        if !is_tree || ba <= 0.0 {
            continue;
        }
        let max_sdi = if sp.max_sdi > 0.0 { sp.max_sdi } else { DEFAULT_MAX_SDI };
        ba_sum += ba;
        weighted += ba * (LN_10 + max_sdi.ln() / REINEKE_B1);
    }
    if ba_sum <= 0.0 {
        return DEFAULT_MAX_SDI;
    }
    ((weighted / ba_sum - LN_10) * REINEKE_B1).exp()
}

/// Relative density on the trajectory at a quadratic mean diameter.
pub fn trajectory_density(x0: f64, qmd: f64) -> f64 {
    if x0 <= 0.0 || qmd <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + (x0 / qmd).powf(TRAJECTORY_SHAPE))
}

/// Trajectory origin through a single (qmd, relative density) point.
fn origin_through(qmd: f64, rd: f64) -> Option<f64> {
    if qmd <= 0.0 || rd <= 0.0 {
        return None;
    }
    let r = rd.min(MAX_FIT_DENSITY);
    Some(qmd * (1.0 / r - 1.0).powf(1.0 / TRAJECTORY_SHAPE))
}

/// Fit `x0` from the relative densities before and after a growth year.
///
/// Uses the geometric mean of the two single-point estimates, or whichever one exists.
pub fn fit_x0(before: (f64, f64), after: (f64, f64)) -> f64 {
    match (origin_through(before.0, before.1), origin_through(after.0, after.1)) {
        (Some(a), Some(b)) => (a * b).sqrt(),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => 0.0,
    }
}

/// Proportion of stems that must die to bring relative density back to the trajectory.
pub fn mortality_proportion(x0: f64, qmd: f64, rd: f64, bh_expf: f64) -> f64 {
    if x0 <= 0.0 || bh_expf <= 0.0 || qmd <= 0.0 || rd <= MORTALITY_ONSET {
        return 0.0;
    }
    let on_trajectory = trajectory_density(x0, qmd);
    if rd <= on_trajectory {
        return 0.0;
    }
    (1.0 - on_trajectory / rd).clamp(0.0, 1.0)
}

/// Result of one year's density-dependent mortality.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MortalityAssessment {
    pub max_sdi: f64,
    pub relative_density: f64,
    pub x0: f64,
    pub proportion: f64,
}

/// Assess density-dependent mortality and remove it from the trees.
///
/// `x0` is fitted the first time this runs for a stand and kept afterwards.
pub fn apply_sdi_mortality(
    stand: &mut Stand,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
    before: &SummaryRecord,
    after: &SummaryRecord,
) -> Result<MortalityAssessment> {
    let max_sdi = stand_max_sdi(stand, species, coeffs);
    let rd_before = before.sdi / max_sdi;
    let rd_after = after.sdi / max_sdi;

    if stand.x0 <= 0.0 {
        stand.x0 = fit_x0((before.qmd, rd_before), (after.qmd, rd_after));
        debug!(x0 = stand.x0, "fitted self-thinning trajectory");
    }

    let proportion = mortality_proportion(stand.x0, after.qmd, rd_after, after.bh_expf);
    if proportion > 0.0 {
        thin(stand, species, coeffs, &ThinType::Proportional { proportion })?;
        info!(proportion, relative_density = rd_after, "density-dependent mortality");
    }
    Ok(MortalityAssessment {
        max_sdi,
        relative_density: rd_after,
        x0: stand.x0,
        proportion,
    })
}
