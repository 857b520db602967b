use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::models::{CoefficientRecord, CoefficientTable, SpeciesRecord, SpeciesTable, Stand};

/// Serialize any value to a JSON file.
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<()> {
    let content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path.as_ref(), content)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a stand (plots with monthly climate, plants and projection state).
pub fn read_stand_json(path: impl AsRef<Path>) -> Result<Stand> {
    let mut stand: Stand = read_json(path.as_ref())?;
    for plant in stand.plants.iter_mut() {
        plant.update_derived();
    }
    stand.sort();
    Ok(stand)
}

pub fn write_stand_json(stand: &Stand, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
    write_json(stand, path, pretty)
}

/// Read a species table from a JSON array of species records.
pub fn read_species_json(path: impl AsRef<Path>) -> Result<SpeciesTable> {
    let records: Vec<SpeciesRecord> = read_json(path.as_ref())?;
    SpeciesTable::new(records)
}

/// Read a coefficient table from a JSON array of coefficient records.
pub fn read_coefficients_json(path: impl AsRef<Path>) -> Result<CoefficientTable> {
    let records: Vec<CoefficientRecord> = read_json(path.as_ref())?;
    CoefficientTable::new(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConifersError;
    use crate::models::{default_species_table, Plant, Plot};
    use crate::variants::init_coefficients;

    #[test]
    fn test_stand_json_keeps_climate_and_state() {
        let mut stand = Stand::new("Json");
        let mut plot = Plot::new(1);
        plot.monthly_temperature[6] = 18.5;
        stand.plots.push(plot);
        let mut p = Plant::new(1, 1, 0);
        p.dbh = 4.0;
        stand.plants.push(p);
        stand.x0 = 7.5;
        stand.age = 12;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stand.json");
        write_stand_json(&stand, &path, true).unwrap();
        let back = read_stand_json(&path).unwrap();
        assert_eq!(back.plots[0].monthly_temperature[6], 18.5);
        assert_eq!(back.x0, 7.5);
        assert_eq!(back.age, 12);
        assert!(back.plants[0].basal_area > 0.0);
    }

    #[test]
    fn test_coefficient_table_from_json() {
        let table = init_coefficients(2).unwrap().table;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coeffs.json");
        write_json(table.records(), &path, false).unwrap();
        let back = read_coefficients_json(&path).unwrap();
        assert_eq!(back.len(), table.len());
        let (a, b) = (back.get(1).unwrap(), table.get(1).unwrap());
        assert_eq!(a.code, b.code);
        assert_eq!(a.life_form, b.life_form);
        for (x, y) in a.height_growth.iter().zip(&b.height_growth) {
            assert!((x - y).abs() <= 1e-12 * y.abs().max(1.0));
        }
    }

    #[test]
    fn test_species_table_from_json() {
        let table = default_species_table();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("species.json");
        write_json(table.records(), &path, true).unwrap();
        let back = read_species_json(&path).unwrap();
        assert_eq!(back.len(), table.len());
    }

    #[test]
    fn test_empty_coefficient_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            read_coefficients_json(&path),
            Err(ConifersError::InvalidCoeff(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            read_stand_json("/nonexistent/stand.json"),
            Err(ConifersError::Io(_))
        ));
    }
}
