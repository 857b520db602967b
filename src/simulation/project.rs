use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::aggregate::recompute;
use super::mortality::apply_sdi_mortality;
use super::rng::RandomSource;
use super::summary::{summarize_stand, SummaryRecord};
use crate::error::Result;
use crate::models::{CoefficientTable, Increments, SpeciesTable, Stand};
use crate::variants::{genetics_age_cut, project_plant, GrowthOptions, StochasticDraws, Variant};

/// Switches for a projection run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Control {
    /// Add random height growth error and damage
    pub use_random_error: bool,
    pub random_seed: u64,
    pub endemic_mortality: bool,
    /// Apply density-dependent mortality after growth
    pub sdi_mortality: bool,
    /// Apply genetic gain multipliers (SMC only)
    pub genetic_gains: bool,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            use_random_error: false,
            random_seed: 0,
            endemic_mortality: true,
            sdi_mortality: true,
            genetic_gains: false,
        }
    }
}

/// Stand state at the end of one projected year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: i32,
    pub age: u32,
    pub summary: SummaryRecord,
    /// Fraction of tree stems removed by density-dependent mortality
    pub mortality_proportion: f64,
    pub x0: f64,
}

/// Grow the stand by one year.
///
/// Structural errors (missing plots, unknown species, missing coefficients)
/// are raised by the first `recompute`, before any plant grows. Growth is not
/// rolled back: an error after increments are applied leaves the grown stand.
pub fn project_year(
    variant: Variant,
    stand: &mut Stand,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
    control: &Control,
    rng: &mut dyn RandomSource,
) -> Result<YearSummary> {
    stand.check_counts()?;
    recompute(stand, species, coeffs)?;
    let before = summarize_stand(stand, species, coeffs);

    let ranges = stand.group_by_plot()?;
    let mut increments: Vec<(usize, Increments)> = Vec::with_capacity(stand.plants.len());
    for range in ranges {
        let plot = &stand.plots[range.plot_idx];
        let genetics = if variant == Variant::Smc && control.genetic_gains {
            genetics_age_cut(before.height_40, plot.site_index)
        } else {
            None
        };
        let options = GrowthOptions {
            use_random_error: control.use_random_error,
            endemic_mortality: control.endemic_mortality,
            genetic_gains: control.genetic_gains,
            genetics_age_cut: genetics,
        };
        for i in range.plants {
            let plant = &stand.plants[i];
            let sp = species.get(plant.species)?;
            let c = coeffs.get(sp.fsp);
            let draws = match c {
                Some(c) if control.use_random_error && c.life_form.grows() => {
                    StochasticDraws::draw(rng, sp)
                }
                _ => StochasticDraws::none(),
            };
            let inc = project_plant(&variant, plant, plot, sp, c, &options, &draws)?;
            increments.push((i, inc));
        }
    }

    for (i, inc) in increments {
        let plant = &mut stand.plants[i];
        plant.record_growth(&inc);
        plant.apply_growth();
    }

    recompute(stand, species, coeffs)?;
    let mut mortality_proportion = 0.0;
    if control.sdi_mortality {
        let after = summarize_stand(stand, species, coeffs);
        let assessment = apply_sdi_mortality(stand, species, coeffs, &before, &after)?;
        mortality_proportion = assessment.proportion;
        if mortality_proportion > 0.0 {
            recompute(stand, species, coeffs)?;
        }
    }

    stand.age += 1;
    stand.n_years_projected += 1;
    let summary = summarize_stand(stand, species, coeffs);
    debug!(
        year = stand.current_year(),
        expf = summary.expf,
        basal_area = summary.basal_area,
        sdi = summary.sdi,
        "projected one year"
    );
    Ok(YearSummary {
        year: stand.current_year(),
        age: stand.age,
        summary,
        mortality_proportion,
        x0: stand.x0,
    })
}

/// Grow the stand for `n_years`, stopping at the first failed year.
pub fn project(
    variant: Variant,
    stand: &mut Stand,
    n_years: u32,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
    control: &Control,
    rng: &mut dyn RandomSource,
) -> Result<Vec<YearSummary>> {
    let mut years = Vec::with_capacity(n_years as usize);
    for _ in 0..n_years {
        years.push(project_year(variant, stand, species, coeffs, control, rng)?);
    }
    info!(
        variant = %variant,
        years = n_years,
        final_year = stand.current_year(),
        "projection complete"
    );
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConifersError;
    use crate::models::{default_species_table, Plant, Plot};
    use crate::simulation::SeededRandom;
    use crate::variants::init_coefficients;

    fn seedling(plot: u32, id: u32, species: u32) -> Plant {
        let mut p = Plant::new(plot, id, species);
        p.tht = 10.0;
        p.d6 = 2.0;
        p.cr = 0.5;
        p.expf = 300.0;
        p.crown_width = 3.5;
        p.max_crown_width = 4.0;
        p.update_derived();
        p.pct_cover = p.cover_from_expf();
        p
    }

    fn site_plot(id: u32) -> Plot {
        let mut plot = Plot::new(id);
        plot.mean_annual_precip = 40.0;
        plot.growing_season_precip = 8.0;
        plot.water_capacity = 5.0;
        plot.site_index = 120.0;
        plot
    }

    fn sample_stand() -> Stand {
        let mut stand = Stand::new("Project");
        stand.start_year = 2020;
        stand.age = 5;
        stand.plots = vec![site_plot(1), site_plot(2)];
        stand.plants = vec![seedling(1, 1, 0), seedling(1, 2, 3), seedling(2, 1, 0)];
        stand
    }

    #[test]
    fn test_single_year_grows_and_advances_counters() {
        let species = default_species_table();
        let coeffs = init_coefficients(0).unwrap().table;
        let mut stand = sample_stand();
        let mut rng = SeededRandom::new(1);
        let control = Control::default();
        let ys =
            project_year(Variant::Swo, &mut stand, &species, &coeffs, &control, &mut rng).unwrap();
        assert_eq!(ys.year, 2021);
        assert_eq!(ys.age, 6);
        assert_eq!(stand.n_years_projected, 1);
        let p = &stand.plants[0];
        assert!(p.tht > 10.0);
        assert!(p.d6 > 2.0);
        assert!(p.dbh > 0.0);
        assert!(p.tht_growth > 0.0);
        assert!(p.expf < 300.0);
    }

    fn overstocked_stand() -> Stand {
        let mut stand = Stand::new("Dense");
        stand.plots = vec![site_plot(1)];
        let mut p = Plant::new(1, 1, 0);
        p.dbh = 6.0;
        p.d6 = 7.2;
        p.tht = 40.0;
        p.cr = 0.4;
        p.expf = 1500.0;
        p.crown_width = 9.0;
        p.max_crown_width = 11.0;
        p.update_derived();
        p.pct_cover = p.cover_from_expf();
        stand.plants.push(p);
        stand
    }

    #[test]
    fn test_dense_stand_self_thins() {
        let species = default_species_table();
        let coeffs = init_coefficients(0).unwrap().table;
        let mut stand = overstocked_stand();
        let control = Control { endemic_mortality: false, ..Control::default() };
        let mut rng = SeededRandom::new(1);
        let ys =
            project_year(Variant::Swo, &mut stand, &species, &coeffs, &control, &mut rng).unwrap();
        assert!(ys.mortality_proportion > 0.0);
        assert!(stand.x0 > 0.0);
        assert!(stand.plants[0].expf < 1500.0);
    }

    #[test]
    fn test_disabled_mortality_keeps_expf() {
        let species = default_species_table();
        let coeffs = init_coefficients(0).unwrap().table;
        let mut stand = overstocked_stand();
        let control =
            Control { endemic_mortality: false, sdi_mortality: false, ..Control::default() };
        let mut rng = SeededRandom::new(1);
        let years =
            project(Variant::Swo, &mut stand, 3, &species, &coeffs, &control, &mut rng).unwrap();
        assert!(years.iter().all(|y| y.mortality_proportion == 0.0));
        assert_eq!(stand.plants[0].expf, 1500.0);
        assert!(stand.plants[0].tht > 40.0);
        assert_eq!(stand.x0, 0.0);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let species = default_species_table();
        let coeffs = init_coefficients(0).unwrap().table;
        let control = Control { use_random_error: true, ..Control::default() };
        let run = || {
            let mut stand = sample_stand();
            let mut rng = SeededRandom::new(99);
            project(Variant::Swo, &mut stand, 4, &species, &coeffs, &control, &mut rng).unwrap();
            stand.plants
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_every_variant_projects() {
        let species = default_species_table();
        for id in 0..4 {
            let vc = init_coefficients(id).unwrap();
            let mut stand = sample_stand();
            let control = Control { genetic_gains: true, ..Control::default() };
            let mut rng = SeededRandom::new(5);
            let years =
                project(vc.variant, &mut stand, 5, &species, &vc.table, &control, &mut rng)
                    .unwrap();
            assert_eq!(years.len(), 5);
            assert!(years[4].summary.mean_height > years[0].summary.mean_height);
            for p in &stand.plants {
                assert!(p.tht >= 0.0 && p.d6 >= 0.0 && p.dbh >= 0.0 && p.expf >= 0.0);
                assert!((0.0..=1.0).contains(&p.cr));
            }
        }
    }

    #[test]
    fn test_failed_year_leaves_stand_unchanged() {
        let species = default_species_table();
        let coeffs = init_coefficients(0).unwrap().table;
        let mut stand = sample_stand();
        stand.plants.push(seedling(2, 2, 42));
        let snapshot = stand.plants.clone();
        let mut rng = SeededRandom::new(1);
        let control = Control::default();
        let err = project_year(Variant::Swo, &mut stand, &species, &coeffs, &control, &mut rng)
            .unwrap_err();
        assert!(matches!(err, ConifersError::InvalidSpCode(_)));
        assert_eq!(stand.n_years_projected, 0);
        for (a, b) in stand.plants.iter().zip(&snapshot) {
            assert_eq!(a.tht, b.tht);
            assert_eq!(a.expf, b.expf);
        }
    }

    #[test]
    fn test_empty_stand_rejected() {
        let species = default_species_table();
        let coeffs = init_coefficients(0).unwrap().table;
        let mut stand = Stand::new("Empty");
        let mut rng = SeededRandom::new(1);
        let control = Control::default();
        let err = project(Variant::Swo, &mut stand, 1, &species, &coeffs, &control, &mut rng)
            .unwrap_err();
        assert!(matches!(err, ConifersError::InvalidPlantCount(_)));
    }
}
