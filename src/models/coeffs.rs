use serde::{Deserialize, Serialize};

use crate::error::{ConifersError, Result};

/// Number of coefficients carried for each relationship.
pub const N_COEFFS: usize = 10;

/// Coefficient vector for one regression relationship. Unused trailing
/// entries are zero.
pub type Coefficients = [f64; N_COEFFS];

/// Life form of a functional species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeForm {
    Conifer,
    Hardwood,
    Shrub,
    Forb,
    NonStocked,
}

impl LifeForm {
    pub fn is_tree(self) -> bool {
        matches!(self, LifeForm::Conifer | LifeForm::Hardwood)
    }

    /// Trees and shrubs grow; forbs and non-stocked records do not.
    pub fn grows(self) -> bool {
        matches!(self, LifeForm::Conifer | LifeForm::Hardwood | LifeForm::Shrub)
    }
}

impl std::fmt::Display for LifeForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifeForm::Conifer => write!(f, "Conifer"),
            LifeForm::Hardwood => write!(f, "Hardwood"),
            LifeForm::Shrub => write!(f, "Shrub"),
            LifeForm::Forb => write!(f, "Forb"),
            LifeForm::NonStocked => write!(f, "Non-stocked"),
        }
    }
}

impl std::str::FromStr for LifeForm {
    type Err = ConifersError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conifer" | "c" => Ok(LifeForm::Conifer),
            "hardwood" | "h" => Ok(LifeForm::Hardwood),
            "shrub" | "s" => Ok(LifeForm::Shrub),
            "forb" | "f" => Ok(LifeForm::Forb),
            "non_stocked" | "non-stocked" | "nonstocked" | "n" => Ok(LifeForm::NonStocked),
            _ => Err(ConifersError::ParseError(format!("Unknown life form: '{s}'"))),
        }
    }
}

/// Regression coefficients for one functional species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRecord {
    /// Functional species code
    pub fsp: u32,
    pub code: String,
    pub life_form: LifeForm,
    pub height_growth: Coefficients,
    /// Standard deviation of the height growth error term, feet
    #[serde(default)]
    pub hg_error_sd: f64,
    pub diameter_growth: Coefficients,
    pub crown_ratio: Coefficients,
    pub crown_width: Coefficients,
    pub max_crown_width: Coefficients,
    /// Basal diameter from total height
    pub d6_height: Coefficients,
    /// Basal diameter from total height and dbh
    pub d6_height_dbh: Coefficients,
    /// Dbh from basal diameter and total height
    pub dbh_d6_height: Coefficients,
    pub mortality: Coefficients,
    pub volume: Coefficients,
    pub biomass: Coefficients,
}

impl CoefficientRecord {
    /// A record with every coefficient zero.
    pub fn new(fsp: u32, code: &str, life_form: LifeForm) -> Self {
        Self {
            fsp,
            code: code.to_string(),
            life_form,
            height_growth: [0.0; N_COEFFS],
            hg_error_sd: 0.0,
            diameter_growth: [0.0; N_COEFFS],
            crown_ratio: [0.0; N_COEFFS],
            crown_width: [0.0; N_COEFFS],
            max_crown_width: [0.0; N_COEFFS],
            d6_height: [0.0; N_COEFFS],
            d6_height_dbh: [0.0; N_COEFFS],
            dbh_d6_height: [0.0; N_COEFFS],
            mortality: [0.0; N_COEFFS],
            volume: [0.0; N_COEFFS],
            biomass: [0.0; N_COEFFS],
        }
    }

    fn all_finite(&self) -> bool {
        let groups = [
            &self.height_growth,
            &self.diameter_growth,
            &self.crown_ratio,
            &self.crown_width,
            &self.max_crown_width,
            &self.d6_height,
            &self.d6_height_dbh,
            &self.dbh_d6_height,
            &self.mortality,
            &self.volume,
            &self.biomass,
        ];
        self.hg_error_sd.is_finite() && groups.iter().all(|g| g.iter().all(|c| c.is_finite()))
    }
}

/// Fill the leading entries of a coefficient vector.
pub fn coeffs(values: &[f64]) -> Coefficients {
    let mut out = [0.0; N_COEFFS];
    for (slot, v) in out.iter_mut().zip(values) {
        *slot = *v;
    }
    out
}

/// Coefficient records sorted by functional species code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoefficientTable {
    records: Vec<CoefficientRecord>,
}

impl CoefficientTable {
    /// Sort and validate a set of records.
    pub fn new(mut records: Vec<CoefficientRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ConifersError::InvalidCoeff(
                "coefficient table is empty".to_string(),
            ));
        }
        records.sort_by_key(|r| r.fsp);
        if let Some(w) = records.windows(2).find(|w| w[0].fsp == w[1].fsp) {
            return Err(ConifersError::InvalidCoeff(format!(
                "duplicate functional species {}",
                w[0].fsp
            )));
        }
        if let Some(bad) = records.iter().find(|r| !r.all_finite()) {
            return Err(ConifersError::InvalidCoeff(format!(
                "non-finite coefficient for functional species {}",
                bad.fsp
            )));
        }
        Ok(Self { records })
    }

    /// Binary search for a functional species.
    pub fn get(&self, fsp: u32) -> Option<&CoefficientRecord> {
        self.records
            .binary_search_by_key(&fsp, |r| r.fsp)
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn records(&self) -> &[CoefficientRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_life_form_predicates() {
        assert!(LifeForm::Conifer.is_tree());
        assert!(LifeForm::Hardwood.is_tree());
        assert!(!LifeForm::Shrub.is_tree());
        assert!(LifeForm::Shrub.grows());
        assert!(!LifeForm::Forb.grows());
        assert!(!LifeForm::NonStocked.grows());
    }

    #[test]
    fn test_life_form_parse() {
        assert_eq!("conifer".parse::<LifeForm>().unwrap(), LifeForm::Conifer);
        assert_eq!("H".parse::<LifeForm>().unwrap(), LifeForm::Hardwood);
        assert_eq!("non-stocked".parse::<LifeForm>().unwrap(), LifeForm::NonStocked);
        assert!("tree".parse::<LifeForm>().is_err());
    }

    #[test]
    fn test_life_form_json_names() {
        let json = serde_json::to_string(&LifeForm::NonStocked).unwrap();
        assert_eq!(json, "\"non_stocked\"");
    }

    #[test]
    fn test_coeffs_pads_with_zero() {
        let c = coeffs(&[1.0, 2.0]);
        assert_eq!(c[0], 1.0);
        assert_eq!(c[1], 2.0);
        assert!(c[2..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_table_sorted_and_searchable() {
        let table = CoefficientTable::new(vec![
            CoefficientRecord::new(20, "CV", LifeForm::Shrub),
            CoefficientRecord::new(1, "DF", LifeForm::Conifer),
            CoefficientRecord::new(10, "MA", LifeForm::Hardwood),
        ])
        .unwrap();
        let fsps: Vec<u32> = table.records().iter().map(|r| r.fsp).collect();
        assert_eq!(fsps, vec![1, 10, 20]);
        assert_eq!(table.get(10).unwrap().code, "MA");
        assert!(table.get(11).is_none());
    }

    #[test]
    fn test_table_rejects_duplicates() {
        let result = CoefficientTable::new(vec![
            CoefficientRecord::new(1, "DF", LifeForm::Conifer),
            CoefficientRecord::new(1, "PP", LifeForm::Conifer),
        ]);
        assert!(matches!(result, Err(ConifersError::InvalidCoeff(_))));
    }

    #[test]
    fn test_table_rejects_non_finite() {
        let mut rec = CoefficientRecord::new(1, "DF", LifeForm::Conifer);
        rec.height_growth[3] = f64::NAN;
        assert!(CoefficientTable::new(vec![rec]).is_err());
    }

    #[test]
    fn test_table_rejects_empty() {
        assert!(CoefficientTable::new(Vec::new()).is_err());
    }
}
