use tracing::info;

use super::aggregate::recompute;
use super::impute::{impute, SamplingDesign};
use super::project::{project, Control, YearSummary};
use super::rng::{RandomSource, SeededRandom};
use super::statistics::SamplingStatistics;
use super::summary::{summarize_by_fsp, summarize_by_species, summarize_stand, SummaryRecord};
use super::thin::{thin, ThinOutcome, ThinType};
use crate::error::Result;
use crate::models::{default_species_table, CoefficientTable, SpeciesTable, Stand};
use crate::variants::{Variant, VariantCoefficients};

/// Everything a simulation needs besides the stand itself.
#[derive(Debug, Clone)]
pub struct Session {
    pub variant: Variant,
    pub species: SpeciesTable,
    pub coeffs: CoefficientTable,
    pub coeffs_version: u32,
    pub model_version: String,
}

impl Session {
    /// A session using the built-in species and coefficient tables for `variant`.
    pub fn new(variant: Variant) -> Result<Self> {
        Ok(Self::with_tables(variant.coefficients()?, default_species_table()))
    }

    pub fn with_tables(coefficients: VariantCoefficients, species: SpeciesTable) -> Self {
        Self {
            variant: coefficients.variant,
            species,
            coeffs: coefficients.table,
            coeffs_version: coefficients.coeffs_version,
            model_version: coefficients.model_version.to_string(),
        }
    }

    /// Project with the supplied random source.
    pub fn project(
        &self,
        stand: &mut Stand,
        n_years: u32,
        control: &Control,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<YearSummary>> {
        project(self.variant, stand, n_years, &self.species, &self.coeffs, control, rng)
    }

    /// Project with a generator seeded from `control.random_seed`.
    pub fn project_seeded(
        &self,
        stand: &mut Stand,
        n_years: u32,
        control: &Control,
    ) -> Result<Vec<YearSummary>> {
        let mut rng = SeededRandom::new(control.random_seed);
        self.project(stand, n_years, control, &mut rng)
    }

    pub fn impute(&self, stand: &mut Stand, design: &SamplingDesign) -> Result<()> {
        impute(&self.variant, stand, &self.species, &self.coeffs, design)
    }

    /// Thin, then bring the plot aggregates up to date.
    pub fn thin(&self, stand: &mut Stand, thin_type: &ThinType) -> Result<ThinOutcome> {
        let outcome = thin(stand, &self.species, &self.coeffs, thin_type)?;
        self.recompute(stand)?;
        Ok(outcome)
    }

    pub fn recompute(&self, stand: &mut Stand) -> Result<()> {
        recompute(stand, &self.species, &self.coeffs)
    }

    /// Stand total, then species and functional species breakdowns.
    pub fn summarize(&self, stand: &Stand) -> StandReport {
        StandReport {
            stand: summarize_stand(stand, &self.species, &self.coeffs),
            by_species: summarize_by_species(stand, &self.species, &self.coeffs),
            by_fsp: summarize_by_fsp(stand, &self.species, &self.coeffs),
        }
    }

    /// Recompute aggregates and compute between-plot sampling statistics.
    pub fn sampling_statistics(
        &self,
        stand: &mut Stand,
        confidence: f64,
    ) -> Result<SamplingStatistics> {
        self.recompute(stand)?;
        let stats = SamplingStatistics::compute(stand, confidence)?;
        info!(plots = stand.num_plots(), confidence, "computed sampling statistics");
        Ok(stats)
    }
}

/// Summaries of a stand at one point in time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StandReport {
    pub stand: SummaryRecord,
    pub by_species: Vec<SummaryRecord>,
    pub by_fsp: Vec<SummaryRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Plant, Plot};

    fn sample_stand() -> Stand {
        let mut stand = Stand::new("Session");
        stand.plots = vec![Plot::new(1), Plot::new(2)];
        for (plot, id, tht) in [(1, 1, 25.0), (1, 2, 12.0), (2, 1, 30.0)] {
            let mut p = Plant::new(plot, id, 0);
            p.tht = tht;
            stand.plants.push(p);
        }
        stand
    }

    #[test]
    fn test_session_versions() {
        let session = Session::new(Variant::Cips).unwrap();
        assert_eq!(session.variant, Variant::Cips);
        assert!(session.model_version.starts_with("CIPS"));
    }

    #[test]
    fn test_impute_then_project_then_thin() {
        let session = Session::new(Variant::Swo).unwrap();
        let mut stand = sample_stand();
        let design = SamplingDesign { fixed_plot_radius: 11.78, min_dbh: 0.0, baf: 0.0 };
        session.impute(&mut stand, &design).unwrap();
        assert!(stand.plants.iter().all(|p| p.expf > 0.0 && p.d6 > 0.0));

        let years = session.project_seeded(&mut stand, 2, &Control::default()).unwrap();
        assert_eq!(years.len(), 2);

        let outcome = session
            .thin(&mut stand, &ThinType::Percent { percent: 50.0 })
            .unwrap();
        assert!(outcome.plants_removed > 0.0);
        let report = session.summarize(&stand);
        assert_eq!(report.by_species.len(), 1);
        assert!((report.stand.expf - report.by_species[0].expf).abs() < 1e-9);
    }

    #[test]
    fn test_sampling_statistics() {
        let session = Session::new(Variant::Swo).unwrap();
        let mut stand = sample_stand();
        let design = SamplingDesign { fixed_plot_radius: 11.78, min_dbh: 0.0, baf: 0.0 };
        session.impute(&mut stand, &design).unwrap();
        let stats = session.sampling_statistics(&mut stand, 0.9).unwrap();
        assert_eq!(stats.basal_area.sample_size, 2);
    }
}
