//! Per-plot aggregation of plant records into density and competition statistics.

use tracing::debug;

use crate::error::{ConifersError, Result};
use crate::models::{
    crown_area, size_bin, CoefficientRecord, CoefficientTable, LifeForm, Plant, PlantErrors,
    PlotAggregates, SpeciesRecord, SpeciesTable, Stand, BA_FACTOR, REINEKE_B1, SQ_FT_PER_ACRE,
};

/// Resolve a plant's species and coefficient records, flagging the plant when either is missing.
pub(crate) fn lookup<'a>(
    plant: &mut Plant,
    species: &'a SpeciesTable,
    coeffs: &'a CoefficientTable,
) -> Result<(&'a SpeciesRecord, &'a CoefficientRecord)> {
    let sp = species.get(plant.species).inspect_err(|_| {
        plant.errors.insert(PlantErrors::INVALID_SPECIES);
    })?;
    let c = coeffs.get(sp.fsp).ok_or_else(|| {
        plant.errors.insert(PlantErrors::MISSING_COEFFICIENTS);
        ConifersError::InvalidCoeff(format!(
            "no coefficients for functional species {} (plot {}, plant {})",
            sp.fsp, plant.plot, plant.plant
        ))
    })?;
    Ok((sp, c))
}

/// Percent cover of a plant record, from its crown area when it has one.
pub(crate) fn plant_cover(p: &Plant) -> f64 {
    let from_crown = p.cover_from_expf();
    if from_crown > 0.0 {
        from_crown
    } else {
        p.pct_cover.max(0.0)
    }
}

/// Quadratic mean diameter, inches, from basal area and stems per acre.
pub fn quadratic_mean_diameter(basal_area: f64, stems: f64) -> f64 {
    if basal_area <= 0.0 || stems <= 0.0 {
        return 0.0;
    }
    ((basal_area / stems) / BA_FACTOR).sqrt()
}

/// Reineke stand density index.
pub fn stand_density_index(stems: f64, qmd: f64) -> f64 {
    if stems <= 0.0 || qmd <= 0.0 {
        return 0.0;
    }
    stems * (qmd / 10.0).powf(REINEKE_B1)
}

fn accumulate(
    agg: &mut PlotAggregates,
    plant: &Plant,
    life_form: LifeForm,
    ccf_area: &mut f64,
    shrub_height: &mut f64,
) {
    let expf = plant.expf.max(0.0);
    let cover = plant_cover(plant);
    let ba = plant.basal_area * expf;
    let ca = plant.crown_area * expf;

    if let Some(totals) = agg.totals_mut(life_form) {
        totals.basal_area += ba;
        totals.crown_area += ca;
        totals.expf += expf;
        totals.pct_cover += cover;
    }
    if !life_form.grows() {
        return;
    }

    agg.expf += expf;
    agg.d6_area += plant.d6_area * expf;

    let height_bin = size_bin(plant.tht);
    agg.bait.inject(life_form, height_bin, ba);
    agg.cait.inject(life_form, height_bin, ca);

    if life_form == LifeForm::Shrub {
        *shrub_height += plant.tht * expf;
        return;
    }
    if plant.dbh > 0.0 {
        agg.bal.inject(life_form, size_bin(plant.dbh), ba);
        agg.basal_area += ba;
        agg.bh_expf += expf;
    }
    *ccf_area += expf * crown_area(plant.max_crown_width);
}

/// Rebuild every plot's aggregates from its plants.
///
/// Plants whose species or coefficients cannot be found get an error bit and
/// are skipped; aggregation continues and the first such error is returned
/// once all plots are done.
pub fn recompute(
    stand: &mut Stand,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
) -> Result<()> {
    let ranges = stand.group_by_plot()?;
    for plot in stand.plots.iter_mut() {
        plot.aggregates.reset();
    }

    let mut first_error = None;
    for range in &ranges {
        let agg = &mut stand.plots[range.plot_idx].aggregates;
        let mut ccf_area = 0.0;
        let mut shrub_height = 0.0;

        for plant in stand.plants[range.plants.clone()].iter_mut() {
            let life_form = match lookup(plant, species, coeffs) {
                Ok((_, c)) => c.life_form,
                Err(e) => {
                    first_error.get_or_insert(e);
                    continue;
                }
            };
            accumulate(agg, plant, life_form, &mut ccf_area, &mut shrub_height);
        }

        agg.qmd = quadratic_mean_diameter(agg.basal_area, agg.bh_expf);
        agg.sdi = stand_density_index(agg.bh_expf, agg.qmd);
        agg.ccf = ccf_area / SQ_FT_PER_ACRE * 100.0;
        if agg.shrub.expf > 0.0 {
            agg.shrub_mean_height = shrub_height / agg.shrub.expf;
        }
    }

    debug!(
        plots = stand.plots.len(),
        plants = stand.plants.len(),
        "recomputed plot aggregates"
    );
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
