use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::aggregate::{quadratic_mean_diameter, stand_density_index};
use crate::models::{CoefficientRecord, CoefficientTable, Plant, SpeciesRecord, SpeciesTable, Stand};

/// Code used for the whole-stand summary record.
pub const STAND_CODE: &str = "ALL";

/// Stems per acre that define top height.
pub const TOP_HEIGHT_STEMS: f64 = 40.0;

/// Per-acre summary of a group of plants, averaged over plots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Species code, functional species code, or `ALL`
    pub code: String,
    /// Stems per acre
    pub expf: f64,
    /// Stems per acre taller than breast height
    pub bh_expf: f64,
    /// Basal area, sq ft/acre
    pub basal_area: f64,
    /// Expansion-factor weighted mean height, feet
    pub mean_height: f64,
    pub min_dbh: f64,
    pub max_dbh: f64,
    pub qmd: f64,
    pub sdi: f64,
    /// Total stem volume, cu ft/acre
    pub volume: f64,
    /// Above-ground biomass, lbs/acre
    pub biomass: f64,
    /// Mean height of the 40 tallest stems per acre, feet
    pub height_40: f64,
}

#[derive(Default)]
struct Accum {
    expf: f64,
    bh_expf: f64,
    basal_area: f64,
    height_sum: f64,
    min_dbh: Option<f64>,
    max_dbh: f64,
    volume: f64,
    biomass: f64,
    height_40_sum: f64,
    height_40_plots: usize,
}

impl Accum {
    fn add(&mut self, p: &Plant, c: &CoefficientRecord) {
        let expf = p.expf.max(0.0);
        self.expf += expf;
        self.height_sum += p.tht * expf;
        if c.life_form.is_tree() && p.dbh > 0.0 {
            self.bh_expf += expf;
            self.basal_area += p.basal_area * expf;
            self.min_dbh = Some(self.min_dbh.map_or(p.dbh, |m| m.min(p.dbh)));
            self.max_dbh = self.max_dbh.max(p.dbh);
            self.volume += stem_volume(c, p.dbh, p.tht) * expf;
        }
        self.biomass += plant_biomass(c, p.d6) * expf;
    }

    fn finish(self, code: String, n_plots: f64) -> SummaryRecord {
        let per_acre = |v: f64| v / n_plots;
        let basal_area = per_acre(self.basal_area);
        let bh_expf = per_acre(self.bh_expf);
        let qmd = quadratic_mean_diameter(basal_area, bh_expf);
        SummaryRecord {
            code,
            expf: per_acre(self.expf),
            bh_expf,
            basal_area,
            mean_height: if self.expf > 0.0 { self.height_sum / self.expf } else { 0.0 },
            min_dbh: self.min_dbh.unwrap_or(0.0),
            max_dbh: self.max_dbh,
            qmd,
            sdi: stand_density_index(bh_expf, qmd),
            volume: per_acre(self.volume),
            biomass: per_acre(self.biomass),
            height_40: if self.height_40_plots > 0 {
                self.height_40_sum / self.height_40_plots as f64
            } else {
                0.0
            },
        }
    }
}

/// Combined-variable stem volume, cu ft.
pub fn stem_volume(c: &CoefficientRecord, dbh: f64, tht: f64) -> f64 {
    if dbh <= 0.0 || tht <= 0.0 {
        return 0.0;
    }
    (c.volume[0] * dbh * dbh * tht).max(0.0)
}

/// Allometric biomass from basal diameter, lbs.
pub fn plant_biomass(c: &CoefficientRecord, d6: f64) -> f64 {
    let b = &c.biomass;
    if d6 <= 0.0 || (b[0] == 0.0 && b[1] == 0.0) {
        return 0.0;
    }
    (b[0] + b[1] * d6.ln()).exp()
}

/// Expansion-factor weighted mean height of the tallest `TOP_HEIGHT_STEMS` stems per acre.
pub fn top_height(plants: &mut [&Plant]) -> f64 {
    plants.sort_by(|a, b| b.tht.total_cmp(&a.tht));
    let mut remaining = TOP_HEIGHT_STEMS;
    let mut weighted = 0.0;
    let mut stems = 0.0;
    for p in plants.iter() {
        if remaining <= 0.0 {
            break;
        }
        let take = p.expf.max(0.0).min(remaining);
        weighted += p.tht * take;
        stems += take;
        remaining -= take;
    }
    if stems > 0.0 {
        weighted / stems
    } else {
        0.0
    }
}

fn summarize<F>(
    stand: &Stand,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
    key: F,
) -> Vec<SummaryRecord>
where
    F: Fn(&SpeciesRecord, &CoefficientRecord) -> String,
{
    let mut accums: BTreeMap<String, Accum> = BTreeMap::new();
    let mut by_plot: BTreeMap<(u32, String), Vec<&Plant>> = BTreeMap::new();

    for p in &stand.plants {
        let Ok(sp) = species.get(p.species) else {
            continue;
        };
        let Some(c) = coeffs.get(sp.fsp) else {
            continue;
        };
        if !c.life_form.grows() {
            continue;
        }
        let k = key(sp, c);
        accums.entry(k.clone()).or_default().add(p, c);
        by_plot.entry((p.plot, k)).or_default().push(p);
    }

    for ((_, k), mut plants) in by_plot {
        if let Some(acc) = accums.get_mut(&k) {
            acc.height_40_sum += top_height(&mut plants);
            acc.height_40_plots += 1;
        }
    }

    let n_plots = stand.plots.len().max(1) as f64;
    accums
        .into_iter()
        .map(|(code, acc)| acc.finish(code, n_plots))
        .collect()
}

/// One record per species code.
pub fn summarize_by_species(
    stand: &Stand,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
) -> Vec<SummaryRecord> {
    summarize(stand, species, coeffs, |sp, _| sp.code.clone())
}

/// One record per functional species code.
pub fn summarize_by_fsp(
    stand: &Stand,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
) -> Vec<SummaryRecord> {
    summarize(stand, species, coeffs, |_, c| c.code.clone())
}

/// A single record for the whole stand.
pub fn summarize_stand(
    stand: &Stand,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
) -> SummaryRecord {
    summarize(stand, species, coeffs, |_, _| STAND_CODE.to_string())
        .pop()
        .unwrap_or_else(|| SummaryRecord {
            code: STAND_CODE.to_string(),
            ..SummaryRecord::default()
        })
}
