//! Static allometry shared by every variant.
//!
//! Each variant starts from these records and fills in its own growth
//! coefficients.

use crate::models::{coeffs, CoefficientRecord, LifeForm};

#[allow(clippy::too_many_arguments)]
fn allometry(
    fsp: u32,
    code: &str,
    life_form: LifeForm,
    d6_height: &[f64],
    d6_height_dbh: &[f64],
    dbh_d6_height: &[f64],
    crown_width: &[f64],
    max_crown_width: &[f64],
    crown_ratio: &[f64],
) -> CoefficientRecord {
    let mut r = CoefficientRecord::new(fsp, code, life_form);
    r.d6_height = coeffs(d6_height);
    r.d6_height_dbh = coeffs(d6_height_dbh);
    r.dbh_d6_height = coeffs(dbh_d6_height);
    r.crown_width = coeffs(crown_width);
    r.max_crown_width = coeffs(max_crown_width);
    r.crown_ratio = coeffs(crown_ratio);
    r
}

/// Baseline records keyed by functional species code.
pub(super) fn records() -> Vec<CoefficientRecord> {
    let mut out = vec![
        allometry(
            1,
            "DF",
            LifeForm::Conifer,
            &[0.16, 1.1],
            &[0.3, 1.05, 0.6],
            &[0.9, 1.0, -0.25],
            &[7.0, 0.35, 0.3],
            &[1.5, 1.4, 0.05],
            &[2.0, -0.02, -0.03, -0.02, 0.1],
        ),
        allometry(
            2,
            "PP",
            LifeForm::Conifer,
            &[0.18, 1.08],
            &[0.35, 1.06, 0.55],
            &[0.88, 1.0, -0.22],
            &[6.5, 0.36, 0.3],
            &[1.4, 1.3, 0.05],
            &[1.8, -0.018, -0.025, -0.02, 0.1],
        ),
        allometry(
            3,
            "WH",
            LifeForm::Conifer,
            &[0.15, 1.12],
            &[0.3, 1.04, 0.6],
            &[0.9, 1.0, -0.27],
            &[6.8, 0.34, 0.32],
            &[1.6, 1.35, 0.06],
            &[2.3, -0.015, -0.02, -0.015, 0.1],
        ),
        allometry(
            10,
            "MA",
            LifeForm::Hardwood,
            &[0.2, 1.05],
            &[0.4, 1.08, 0.5],
            &[0.85, 1.0, -0.2],
            &[8.5, 0.38, 0.25],
            &[2.0, 1.6, 0.04],
            &[1.6, -0.015, -0.035, -0.025, 0.12],
        ),
        allometry(
            11,
            "TO",
            LifeForm::Hardwood,
            &[0.19, 1.06],
            &[0.4, 1.07, 0.5],
            &[0.86, 1.0, -0.21],
            &[8.0, 0.37, 0.26],
            &[1.9, 1.5, 0.04],
            &[1.7, -0.016, -0.03, -0.025, 0.12],
        ),
        allometry(
            20,
            "CV",
            LifeForm::Shrub,
            &[0.12, 1.0],
            &[],
            &[],
            &[3.2, 0.25, 0.55, 0.02],
            &[1.0, 2.0, 0.4],
            &[],
        ),
        allometry(
            21,
            "AV",
            LifeForm::Shrub,
            &[0.1, 1.0],
            &[],
            &[],
            &[2.8, 0.25, 0.6, 0.02],
            &[1.0, 1.8, 0.45],
            &[],
        ),
        CoefficientRecord::new(30, "FB", LifeForm::Forb),
        CoefficientRecord::new(99, "NS", LifeForm::NonStocked),
    ];

    for r in out.iter_mut() {
        // cubic feet = v0 * dbh^2 * height
        r.volume = coeffs(match r.life_form {
            LifeForm::Conifer => &[0.002454],
            LifeForm::Hardwood => &[0.0021],
            _ => &[],
        });
        // pounds = exp(b0 + b1 * ln(d6))
        r.biomass = coeffs(match r.life_form {
            LifeForm::Conifer => &[0.5, 2.4],
            LifeForm::Hardwood => &[0.7, 2.35],
            LifeForm::Shrub => &[0.2, 2.1],
            _ => &[],
        });
        r.mortality = coeffs(match r.life_form {
            LifeForm::Conifer | LifeForm::Hardwood => &[0.0, -1.0, 0.01],
            LifeForm::Shrub => &[0.0, 0.0, 0.02],
            _ => &[],
        });
    }
    out
}

/// Look up a baseline record by code and overwrite its growth coefficients.
pub(super) fn with_growth(
    records: &mut [CoefficientRecord],
    code: &str,
    height_growth: &[f64],
    hg_error_sd: f64,
    diameter_growth: &[f64],
) {
    if let Some(r) = records.iter_mut().find(|r| r.code == code) {
        r.height_growth = coeffs(height_growth);
        r.hg_error_sd = hg_error_sd;
        r.diameter_growth = coeffs(diameter_growth);
    }
}
