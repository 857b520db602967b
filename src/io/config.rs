use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::Plot;
use crate::simulation::{Control, SamplingDesign, Session};
use crate::variants::Variant;

use super::json_io::{read_coefficients_json, read_species_json};

/// Run settings loaded from a TOML file.
///
/// ```toml
/// variant = "smc"
/// years = 10
/// start_year = 2024
///
/// [control]
/// use_random_error = true
/// random_seed = 42
///
/// [sampling]
/// fixed_plot_radius = 11.78
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub variant: Variant,
    pub years: u32,
    pub start_year: Option<i32>,
    /// Stand age at the start of the run
    pub age: Option<u32>,
    pub control: Control,
    pub sampling: SamplingDesign,
    /// Plot covariates applied to plots created from plant ids alone
    pub site: Option<Plot>,
    /// JSON species table replacing the built-in one
    pub species_file: Option<PathBuf>,
    /// JSON coefficient table replacing the variant's built-in one
    pub coefficients_file: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            years: 10,
            start_year: None,
            age: None,
            control: Control::default(),
            sampling: SamplingDesign::default(),
            site: None,
            species_file: None,
            coefficients_file: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), variant = %config.variant, "loaded config");
        Ok(config)
    }

    /// Template plot for stands read without a plot file.
    pub fn site_template(&self) -> Plot {
        self.site.clone().unwrap_or_else(|| Plot::new(0))
    }

    /// Build a session, swapping in table files when configured.
    pub fn session(&self) -> Result<Session> {
        let mut session = Session::new(self.variant)?;
        if let Some(path) = &self.species_file {
            session.species = read_species_json(path)?;
        }
        if let Some(path) = &self.coefficients_file {
            session.coeffs = read_coefficients_json(path)?;
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConifersError;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert!(config.control.sdi_mortality);
    }

    #[test]
    fn test_parse_full_config() {
        let config = SimulationConfig::from_toml_str(
            r#"
variant = "swo_hybrid"
years = 25
start_year = 2024
age = 5

[control]
use_random_error = true
random_seed = 42
genetic_gains = true

[sampling]
fixed_plot_radius = 11.78

[site]
plot = 0
site_index = 120.0
"#,
        )
        .unwrap();
        assert_eq!(config.variant, Variant::SwoHybrid);
        assert_eq!(config.years, 25);
        assert_eq!(config.start_year, Some(2024));
        assert!(config.control.use_random_error);
        assert!(config.control.endemic_mortality);
        assert_eq!(config.control.random_seed, 42);
        assert_eq!(config.sampling.fixed_plot_radius, 11.78);
        assert_eq!(config.site_template().site_index, 120.0);
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let err = SimulationConfig::from_toml_str("variant = \"pnw\"").unwrap_err();
        assert!(matches!(err, ConifersError::Config(_)));
    }

    #[test]
    fn test_load_and_session_with_species_file() {
        let dir = tempfile::tempdir().unwrap();
        let species_path = dir.path().join("species.json");
        let table = crate::models::default_species_table();
        super::super::json_io::write_json(table.records(), &species_path, false).unwrap();

        let config_path = dir.path().join("run.toml");
        std::fs::write(
            &config_path,
            format!(
                "variant = \"cips\"\nspecies_file = {:?}\n",
                species_path.display().to_string()
            ),
        )
        .unwrap();
        let config = SimulationConfig::load(&config_path).unwrap();
        let session = config.session().unwrap();
        assert_eq!(session.variant, Variant::Cips);
        assert_eq!(session.species.len(), table.len());
    }
}
