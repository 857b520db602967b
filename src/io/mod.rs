mod config;
mod csv_io;
mod json_io;

use std::path::{Path, PathBuf};

use crate::error::{ConifersError, Result};
use crate::models::{Plot, Stand};

pub use config::SimulationConfig;
pub use csv_io::{
    read_plants, read_plots, read_stand_csv, write_plants, write_plots, write_projection_csv,
    write_stand_csv, write_summaries_csv,
};
pub use json_io::{
    read_coefficients_json, read_species_json, read_stand_json, write_json, write_stand_json,
};

/// Trait for reading a stand from a file.
pub trait StandReader {
    fn read(&self, path: &Path) -> Result<Stand>;
}

/// Trait for writing a stand to a file.
pub trait StandWriter {
    fn write(&self, stand: &Stand, path: &Path) -> Result<()>;
}

/// CSV format reader/writer.
///
/// Plants live in the main file. Plot covariates come from `plots_path` when
/// set, otherwise from `template`.
#[derive(Debug, Clone)]
pub struct CsvFormat {
    pub plots_path: Option<PathBuf>,
    pub template: Plot,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self { plots_path: None, template: Plot::new(0) }
    }
}

impl StandReader for CsvFormat {
    fn read(&self, path: &Path) -> Result<Stand> {
        read_stand_csv(path, self.plots_path.as_deref(), &self.template)
    }
}

impl StandWriter for CsvFormat {
    fn write(&self, stand: &Stand, path: &Path) -> Result<()> {
        write_stand_csv(stand, path, self.plots_path.as_deref())
    }
}

/// JSON format reader/writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl StandReader for JsonFormat {
    fn read(&self, path: &Path) -> Result<Stand> {
        read_stand_json(path)
    }
}

impl StandWriter for JsonFormat {
    fn write(&self, stand: &Stand, path: &Path) -> Result<()> {
        write_stand_json(stand, path, self.pretty)
    }
}

/// File formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ConifersError::ParseError(format!(
                "Unsupported file format '{}' for {}. Use .csv or .json",
                ext,
                path.display()
            ))),
        }
    }
}

/// Read a stand, picking the format from the file extension.
pub fn read_stand(path: &Path, csv: &CsvFormat) -> Result<Stand> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => csv.read(path),
        FileFormat::Json => JsonFormat::default().read(path),
    }
}

/// Write a stand, picking the format from the file extension.
pub fn write_stand(stand: &Stand, path: &Path, csv: &CsvFormat) -> Result<()> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => csv.write(stand, path),
        FileFormat::Json => JsonFormat { pretty: true }.write(stand, path),
    }
}
