//! Filling missing plant measurements from the static relationships.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::aggregate::{lookup, recompute};
use crate::error::{ConifersError, Result};
use crate::models::{
    CoefficientTable, LifeForm, Plant, PlantErrors, SpeciesTable, Stand, BREAST_HEIGHT,
    SQ_FT_PER_ACRE,
};
use crate::variants::GrowthModel;

/// Shortest plant, in feet, that the imputer accepts.
pub const MIN_HEIGHT: f64 = 0.5;

/// How the plants were sampled, used to derive missing expansion factors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingDesign {
    /// Fixed plot radius in feet (0 when not a fixed-area design)
    pub fixed_plot_radius: f64,
    /// Smallest dbh tallied with the prism, inches
    pub min_dbh: f64,
    /// Basal area factor, sq ft/acre per tallied stem (0 when not a prism design)
    pub baf: f64,
}

impl SamplingDesign {
    /// Stems per acre represented by one tally, or zero when the design gives no answer.
    pub fn expansion_factor(&self, plant: &Plant, life_form: LifeForm) -> f64 {
        let stems = plant.n_stems.max(1.0);
        let in_prism = plant.dbh >= self.min_dbh && plant.basal_area > 0.0;
        if self.baf > 0.0 && life_form.is_tree() && in_prism {
            return self.baf / plant.basal_area * stems;
        }
        if self.fixed_plot_radius > 0.0 {
            return SQ_FT_PER_ACRE / (PI * self.fixed_plot_radius.powi(2)) * stems;
        }
        0.0
    }
}

fn flag(plant: &mut Plant, bit: PlantErrors, count: &mut usize, what: &str) {
    plant.errors.insert(bit);
    *count += 1;
    warn!(plot = plant.plot, plant = plant.plant, "{what}");
}

/// First pass: sizes, stems, expansion factor and crown width.
fn fill_dimensions<M: GrowthModel + ?Sized>(
    model: &M,
    plant: &mut Plant,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
    design: &SamplingDesign,
) -> usize {
    let mut count = 0;
    let c = match lookup(plant, species, coeffs) {
        Ok((_, c)) => c,
        Err(e) => {
            warn!(plot = plant.plot, plant = plant.plant, "{e}");
            return 1;
        }
    };
    let life_form = c.life_form;
    if plant.n_stems <= 0.0 {
        plant.n_stems = 1.0;
    }
    if plant.dbh > 0.0 && !life_form.is_tree() {
        flag(plant, PlantErrors::INVALID_DBH, &mut count, "dbh recorded for a non-tree");
    }
    if !life_form.grows() {
        if life_form == LifeForm::Forb && plant.expf <= 0.0 && plant.pct_cover > 0.0 {
            plant.update_derived();
            if plant.crown_area > 0.0 {
                plant.expf = plant.pct_cover / 100.0 * SQ_FT_PER_ACRE / plant.crown_area;
            }
        }
        return count;
    }

    if plant.tht <= 0.0 && plant.d6 > 0.0 {
        plant.tht = model.height_from_d6(c, plant.d6);
    }
    if plant.tht < MIN_HEIGHT {
        flag(plant, PlantErrors::INVALID_HEIGHT, &mut count, "height missing or below 0.5 ft");
        return count;
    }
    if plant.dbh > 0.0 && plant.tht < BREAST_HEIGHT {
        flag(plant, PlantErrors::INVALID_DBH, &mut count, "dbh recorded below breast height");
    }

    if plant.d6 <= 0.0 {
        plant.d6 = if plant.dbh > 0.0 {
            model.d6_from_height_dbh(c, plant.tht, plant.dbh)
        } else {
            model.d6_from_height(c, plant.tht)
        };
        if plant.d6 <= 0.0 {
            let reason = "basal diameter could not be predicted";
            flag(plant, PlantErrors::INVALID_D6, &mut count, reason);
        }
    }
    if life_form.is_tree() && plant.dbh <= 0.0 && plant.tht > BREAST_HEIGHT {
        plant.dbh = model.dbh_from_d6_height(c, plant.d6, plant.tht);
    }
    plant.update_derived();

    if plant.expf <= 0.0 {
        plant.expf = design.expansion_factor(plant, life_form);
    }
    if plant.crown_width <= 0.0 {
        plant.crown_width = model.crown_width(c, plant.d6_area, plant.tht);
        plant.update_derived();
        if plant.crown_width <= 0.0 {
            let reason = "crown width could not be predicted";
            flag(plant, PlantErrors::INVALID_CROWN_WIDTH, &mut count, reason);
        }
    }
    if plant.expf <= 0.0 && plant.pct_cover > 0.0 && plant.crown_area > 0.0 {
        plant.expf = plant.pct_cover / 100.0 * SQ_FT_PER_ACRE / plant.crown_area;
    }
    if plant.expf <= 0.0 {
        flag(plant, PlantErrors::INVALID_EXPF, &mut count, "expansion factor missing");
    }
    count
}

/// Fill missing values for every plant, then the values that need plot aggregates.
///
/// Returns [`ConifersError::FillValues`] when any plant could not be completed;
/// the values that could be filled are kept.
pub fn impute<M: GrowthModel + ?Sized>(
    model: &M,
    stand: &mut Stand,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
    design: &SamplingDesign,
) -> Result<()> {
    stand.check_counts()?;

    let mut count = 0;
    for plant in stand.plants.iter_mut() {
        plant.errors.clear();
        count += fill_dimensions(model, plant, species, coeffs, design);
    }

    // lookup failures were already counted above
    if let Err(e @ (ConifersError::InvalidPlotCount(_) | ConifersError::InvalidPlantCount(_))) =
        recompute(stand, species, coeffs)
    {
        return Err(e);
    }

    let ranges = stand.group_by_plot()?;
    for range in ranges {
        let agg = &stand.plots[range.plot_idx].aggregates;
        for plant in stand.plants[range.plants].iter_mut() {
            let Ok((_, c)) = lookup(plant, species, coeffs) else {
                continue;
            };
            if plant.pct_cover <= 0.0 {
                plant.pct_cover = plant.cover_from_expf();
            }
            if !c.life_form.is_tree() || plant.tht < MIN_HEIGHT {
                continue;
            }
            if plant.cr <= 0.0 || plant.cr > 1.0 {
                plant.cr = model.crown_ratio(c, plant.tht, plant.d6, agg);
                if plant.cr <= 0.0 {
                    let reason = "crown ratio could not be predicted";
                    flag(plant, PlantErrors::INVALID_CROWN_RATIO, &mut count, reason);
                }
            }
            if plant.max_crown_width <= 0.0 {
                plant.max_crown_width = model
                    .max_crown_width(c, plant.d6, plant.tht)
                    .max(plant.crown_width);
            }
        }
    }

    if count > 0 {
        warn!(count, "imputation left plants incomplete");
        return Err(ConifersError::FillValues { count });
    }
    debug!(plants = stand.plants.len(), "imputation complete");
    Ok(())
}
