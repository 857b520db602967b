use serde::{Deserialize, Serialize};

use crate::error::{ConifersError, Result};

/// Per-species parameters that are not regression coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    /// Sample-specific species index referenced by plant records
    pub idx: u32,
    /// Species code (e.g., "DF", "PP")
    pub code: String,
    pub common_name: String,
    /// Functional species code used to find the coefficient record
    pub fsp: u32,
    /// Annual background mortality rate (0.0 - 1.0)
    #[serde(default)]
    pub endemic_mortality: f64,
    /// Maximum stand density index for pure stands of this species
    #[serde(default)]
    pub max_sdi: f64,
    /// Annual probability of browse damage
    #[serde(default)]
    pub browse_damage: f64,
    /// Annual probability of top or mechanical damage
    #[serde(default)]
    pub mechanical_damage: f64,
    /// Genetic worth for height growth, percent gain
    #[serde(default)]
    pub genetic_worth_h: f64,
    /// Genetic worth for diameter growth, percent gain
    #[serde(default)]
    pub genetic_worth_d: f64,
    /// Cardinal temperatures (°C) used by the hybrid variant
    #[serde(default)]
    pub min_temp: f64,
    #[serde(default)]
    pub max_temp: f64,
    #[serde(default)]
    pub opt_temp: f64,
}

impl std::fmt::Display for SpeciesRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.common_name, self.code)
    }
}

/// Species lookup table, sorted by species index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesTable {
    records: Vec<SpeciesRecord>,
}

impl SpeciesTable {
    pub fn new(mut records: Vec<SpeciesRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ConifersError::InvalidSpCode(
                "species table is empty".to_string(),
            ));
        }
        records.sort_by_key(|r| r.idx);
        if let Some(w) = records.windows(2).find(|w| w[0].idx == w[1].idx) {
            return Err(ConifersError::InvalidSpCode(format!(
                "duplicate species index {}",
                w[0].idx
            )));
        }
        Ok(Self { records })
    }

    pub fn get(&self, idx: u32) -> Result<&SpeciesRecord> {
        self.records
            .binary_search_by_key(&idx, |r| r.idx)
            .map(|i| &self.records[i])
            .map_err(|_| ConifersError::InvalidSpCode(format!("species index {idx}")))
    }

    pub fn find_by_code(&self, code: &str) -> Option<&SpeciesRecord> {
        self.records
            .iter()
            .find(|r| r.code.eq_ignore_ascii_case(code))
    }

    pub fn records(&self) -> &[SpeciesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    idx: u32,
    code: &str,
    common_name: &str,
    fsp: u32,
    endemic_mortality: f64,
    max_sdi: f64,
    browse_damage: f64,
    mechanical_damage: f64,
    temps: (f64, f64, f64),
) -> SpeciesRecord {
    SpeciesRecord {
        idx,
        code: code.to_string(),
        common_name: common_name.to_string(),
        fsp,
        endemic_mortality,
        max_sdi,
        browse_damage,
        mechanical_damage,
        genetic_worth_h: 0.0,
        genetic_worth_d: 0.0,
        min_temp: temps.0,
        max_temp: temps.1,
        opt_temp: temps.2,
    }
}

/// Species table for southwest Oregon and coastal Douglas-fir plantations.
pub fn default_species_table() -> SpeciesTable {
    let mut df = record(0, "DF", "Douglas-fir", 1, 0.005, 595.0, 0.02, 0.01, (1.0, 35.0, 20.0));
    df.genetic_worth_h = 10.0;
    df.genetic_worth_d = 8.0;
    let records = vec![
        df,
        record(1, "PP", "Ponderosa pine", 2, 0.004, 571.0, 0.01, 0.01, (0.0, 38.0, 22.0)),
        record(2, "WH", "Western hemlock", 3, 0.006, 850.0, 0.02, 0.01, (0.0, 30.0, 17.0)),
        record(3, "MA", "Pacific madrone", 10, 0.008, 480.0, 0.03, 0.02, (2.0, 36.0, 21.0)),
        record(4, "TO", "Tanoak", 11, 0.008, 520.0, 0.05, 0.02, (2.0, 34.0, 20.0)),
        record(5, "CV", "Deerbrush ceanothus", 20, 0.02, 0.0, 0.10, 0.0, (0.0, 38.0, 22.0)),
        record(6, "AV", "Greenleaf manzanita", 21, 0.01, 0.0, 0.02, 0.0, (0.0, 40.0, 24.0)),
        record(7, "FB", "Forbs", 30, 0.0, 0.0, 0.0, 0.0, (0.0, 40.0, 20.0)),
        record(8, "NS", "Non-stocked", 99, 0.0, 0.0, 0.0, 0.0, (0.0, 0.0, 0.0)),
    ];
    // Indices are unique and the list is non-empty.
    SpeciesTable { records }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_lookup() {
        let table = default_species_table();
        let df = table.get(0).unwrap();
        assert_eq!(df.code, "DF");
        assert_eq!(df.fsp, 1);
        assert_eq!(df.to_string(), "Douglas-fir (DF)");
    }

    #[test]
    fn test_default_table_sorted_unique() {
        let table = default_species_table();
        let idx: Vec<u32> = table.records().iter().map(|r| r.idx).collect();
        let mut sorted = idx.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(idx, sorted);
    }

    #[test]
    fn test_unknown_index_is_invalid_sp_code() {
        let table = default_species_table();
        let err = table.get(404).unwrap_err();
        assert!(matches!(err, ConifersError::InvalidSpCode(_)));
    }

    #[test]
    fn test_find_by_code_case_insensitive() {
        let table = default_species_table();
        assert_eq!(table.find_by_code("pp").unwrap().idx, 1);
        assert!(table.find_by_code("XX").is_none());
    }

    #[test]
    fn test_new_sorts_records() {
        let table = SpeciesTable::new(vec![
            record(5, "B", "b", 2, 0.0, 0.0, 0.0, 0.0, (0.0, 0.0, 0.0)),
            record(1, "A", "a", 1, 0.0, 0.0, 0.0, 0.0, (0.0, 0.0, 0.0)),
        ])
        .unwrap();
        assert_eq!(table.records()[0].idx, 1);
        assert_eq!(table.get(5).unwrap().code, "B");
    }

    #[test]
    fn test_new_rejects_empty_and_duplicates() {
        assert!(SpeciesTable::new(Vec::new()).is_err());
        let dup = SpeciesTable::new(vec![
            record(1, "A", "a", 1, 0.0, 0.0, 0.0, 0.0, (0.0, 0.0, 0.0)),
            record(1, "B", "b", 2, 0.0, 0.0, 0.0, 0.0, (0.0, 0.0, 0.0)),
        ]);
        assert!(dup.is_err());
    }

    #[test]
    fn test_species_record_defaults_from_json() {
        let json = r#"{"idx": 2, "code": "RA", "common_name": "Red alder", "fsp": 12}"#;
        let sp: SpeciesRecord = serde_json::from_str(json).unwrap();
        assert_eq!(sp.max_sdi, 0.0);
        assert_eq!(sp.browse_damage, 0.0);
    }
}
