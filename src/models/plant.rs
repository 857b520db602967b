use serde::{Deserialize, Serialize};

/// Square feet of cross-sectional area per square inch of diameter (π / 576).
pub const BA_FACTOR: f64 = 0.005454154;

/// Square feet in one acre.
pub const SQ_FT_PER_ACRE: f64 = 43_560.0;

/// Breast height in feet.
pub const BREAST_HEIGHT: f64 = 4.5;

/// Per-plant validation bitmask.
///
/// Bits are set by imputation and aggregation; growth never clears them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlantErrors(u32);

impl PlantErrors {
    pub const OK: PlantErrors = PlantErrors(0);
    pub const INVALID_HEIGHT: PlantErrors = PlantErrors(1 << 0);
    pub const INVALID_DBH: PlantErrors = PlantErrors(1 << 1);
    pub const INVALID_D6: PlantErrors = PlantErrors(1 << 2);
    pub const INVALID_CROWN_RATIO: PlantErrors = PlantErrors(1 << 3);
    pub const INVALID_CROWN_WIDTH: PlantErrors = PlantErrors(1 << 4);
    pub const INVALID_EXPF: PlantErrors = PlantErrors(1 << 5);
    pub const INVALID_PCT_COVER: PlantErrors = PlantErrors(1 << 6);
    pub const INVALID_SPECIES: PlantErrors = PlantErrors(1 << 7);
    pub const MISSING_COEFFICIENTS: PlantErrors = PlantErrors(1 << 8);

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: PlantErrors) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: PlantErrors) {
        self.0 |= other.0;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

impl std::fmt::Display for PlantErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NAMES: [(PlantErrors, &str); 9] = [
            (PlantErrors::INVALID_HEIGHT, "height"),
            (PlantErrors::INVALID_DBH, "dbh"),
            (PlantErrors::INVALID_D6, "d6"),
            (PlantErrors::INVALID_CROWN_RATIO, "crown_ratio"),
            (PlantErrors::INVALID_CROWN_WIDTH, "crown_width"),
            (PlantErrors::INVALID_EXPF, "expf"),
            (PlantErrors::INVALID_PCT_COVER, "pct_cover"),
            (PlantErrors::INVALID_SPECIES, "species"),
            (PlantErrors::MISSING_COEFFICIENTS, "coefficients"),
        ];
        if self.is_ok() {
            return write!(f, "ok");
        }
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "invalid {}", names.join("|"))
    }
}

/// One-year increments predicted for a plant.
///
/// Growth outputs are deltas; they are added to the plant's base state by the
/// projection driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Increments {
    pub d6: f64,
    pub dbh: f64,
    pub tht: f64,
    pub cr: f64,
    pub crown_width: f64,
    pub expf_change: f64,
}

/// A single plant record (tree, shrub or forb) on a sample plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    /// Plot this plant belongs to
    pub plot: u32,
    /// Plant identifier within the plot
    pub plant: u32,
    /// Index into the species table
    pub species: u32,
    /// Basal diameter 6 inches above ground, inches
    #[serde(default)]
    pub d6: f64,
    /// Cross-sectional area at d6, sq ft
    #[serde(default)]
    pub d6_area: f64,
    /// Diameter at breast height, inches
    #[serde(default)]
    pub dbh: f64,
    /// Cross-sectional area at breast height, sq ft
    #[serde(default)]
    pub basal_area: f64,
    /// Total height, feet
    #[serde(default)]
    pub tht: f64,
    /// Crown ratio (0.0 - 1.0)
    #[serde(default)]
    pub cr: f64,
    #[serde(default)]
    pub n_stems: f64,
    /// Stems per acre represented by this record
    #[serde(default)]
    pub expf: f64,
    #[serde(default)]
    pub pct_cover: f64,
    /// Crown width, feet
    #[serde(default)]
    pub crown_width: f64,
    /// Crown projection area, sq ft
    #[serde(default)]
    pub crown_area: f64,
    #[serde(default)]
    pub max_crown_width: f64,
    #[serde(default)]
    pub errors: PlantErrors,
    #[serde(default)]
    pub d6_growth: f64,
    #[serde(default)]
    pub dbh_growth: f64,
    #[serde(default)]
    pub tht_growth: f64,
    #[serde(default)]
    pub cr_growth: f64,
    #[serde(default)]
    pub cw_growth: f64,
    #[serde(default)]
    pub expf_change: f64,
}

impl Plant {
    /// Create a plant with every measurement missing.
    pub fn new(plot: u32, plant: u32, species: u32) -> Self {
        Self {
            plot,
            plant,
            species,
            d6: 0.0,
            d6_area: 0.0,
            dbh: 0.0,
            basal_area: 0.0,
            tht: 0.0,
            cr: 0.0,
            n_stems: 0.0,
            expf: 0.0,
            pct_cover: 0.0,
            crown_width: 0.0,
            crown_area: 0.0,
            max_crown_width: 0.0,
            errors: PlantErrors::OK,
            d6_growth: 0.0,
            dbh_growth: 0.0,
            tht_growth: 0.0,
            cr_growth: 0.0,
            cw_growth: 0.0,
            expf_change: 0.0,
        }
    }

    /// Recompute the areas that are pure functions of the base measurements.
    pub fn update_derived(&mut self) {
        self.d6_area = diameter_area(self.d6);
        self.basal_area = diameter_area(self.dbh);
        self.crown_area = crown_area(self.crown_width);
    }

    /// Expansion-factor weighted crown cover, percent of an acre.
    pub fn cover_from_expf(&self) -> f64 {
        self.expf * self.crown_area / SQ_FT_PER_ACRE * 100.0
    }

    /// Store this year's increments without touching the base state.
    pub fn record_growth(&mut self, inc: &Increments) {
        self.d6_growth = inc.d6;
        self.dbh_growth = inc.dbh;
        self.tht_growth = inc.tht;
        self.cr_growth = inc.cr;
        self.cw_growth = inc.crown_width;
        self.expf_change = inc.expf_change;
    }

    /// Add the recorded increments to the base state and refresh derived areas.
    pub fn apply_growth(&mut self) {
        self.d6 = (self.d6 + self.d6_growth).max(0.0);
        self.tht = (self.tht + self.tht_growth).max(0.0);
        self.dbh = (self.dbh + self.dbh_growth).max(0.0);
        self.cr = (self.cr + self.cr_growth).clamp(0.0, 1.0);
        self.crown_width = (self.crown_width + self.cw_growth).max(0.0);
        self.max_crown_width = self.max_crown_width.max(self.crown_width);
        self.expf = (self.expf + self.expf_change).max(0.0);
        self.update_derived();
        self.pct_cover = self.cover_from_expf();
    }

    /// Remove a proportion of this record's stems. Returns the stems per acre removed.
    pub fn remove_proportion(&mut self, proportion: f64) -> f64 {
        let p = proportion.clamp(0.0, 1.0);
        let removed = self.expf * p;
        self.expf = (self.expf - removed).max(0.0);
        self.expf_change -= removed;
        self.pct_cover = self.cover_from_expf();
        removed
    }
}

/// Cross-sectional area in sq ft of a stem with the given diameter in inches.
pub fn diameter_area(diameter: f64) -> f64 {
    if diameter <= 0.0 {
        return 0.0;
    }
    BA_FACTOR * diameter * diameter
}

/// Crown projection area in sq ft for the given crown width in feet.
pub fn crown_area(crown_width: f64) -> f64 {
    if crown_width <= 0.0 {
        return 0.0;
    }
    std::f64::consts::PI * (crown_width / 2.0).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_plant(d6: f64, dbh: f64, tht: f64, cw: f64, expf: f64) -> Plant {
        let mut p = Plant::new(1, 1, 0);
        p.d6 = d6;
        p.dbh = dbh;
        p.tht = tht;
        p.cr = 0.5;
        p.crown_width = cw;
        p.expf = expf;
        p.n_stems = 1.0;
        p.update_derived();
        p
    }

    #[test]
    fn test_diameter_area_12_inch() {
        // 0.005454154 * 144 = 0.7854
        assert!((diameter_area(12.0) - 0.7854).abs() < 0.001);
    }

    #[test]
    fn test_diameter_area_non_positive() {
        assert_eq!(diameter_area(0.0), 0.0);
        assert_eq!(diameter_area(-3.0), 0.0);
    }

    #[test]
    fn test_crown_area() {
        let area = crown_area(10.0);
        assert!((area - std::f64::consts::PI * 25.0).abs() < 1e-9);
        assert_eq!(crown_area(0.0), 0.0);
    }

    #[test]
    fn test_update_derived() {
        let p = make_plant(4.0, 2.0, 12.0, 6.0, 100.0);
        assert!((p.d6_area - BA_FACTOR * 16.0).abs() < 1e-12);
        assert!((p.basal_area - BA_FACTOR * 4.0).abs() < 1e-12);
        assert!((p.crown_area - crown_area(6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_cover_from_expf() {
        let p = make_plant(4.0, 2.0, 12.0, 6.0, 100.0);
        let expected = 100.0 * crown_area(6.0) / SQ_FT_PER_ACRE * 100.0;
        assert!((p.cover_from_expf() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_apply_growth_adds_deltas() {
        let mut p = make_plant(2.0, 0.0, 10.0, 4.0, 10.0);
        p.record_growth(&Increments {
            d6: 0.5,
            dbh: 1.2,
            tht: 2.0,
            cr: -0.05,
            crown_width: 0.8,
            expf_change: -1.0,
        });
        p.apply_growth();
        assert!((p.d6 - 2.5).abs() < 1e-12);
        assert!((p.dbh - 1.2).abs() < 1e-12);
        assert!((p.tht - 12.0).abs() < 1e-12);
        assert!((p.cr - 0.45).abs() < 1e-12);
        assert!((p.crown_width - 4.8).abs() < 1e-12);
        assert!((p.expf - 9.0).abs() < 1e-12);
        assert!((p.basal_area - BA_FACTOR * 1.44).abs() < 1e-12);
        assert!((p.max_crown_width - 4.8).abs() < 1e-12);
    }

    #[test]
    fn test_apply_growth_floors_expf_and_cr() {
        let mut p = make_plant(2.0, 0.0, 10.0, 4.0, 10.0);
        p.record_growth(&Increments {
            cr: 0.9,
            expf_change: -25.0,
            ..Increments::default()
        });
        p.apply_growth();
        assert_eq!(p.expf, 0.0);
        assert_eq!(p.cr, 1.0);
    }

    #[test]
    fn test_remove_proportion() {
        let mut p = make_plant(6.0, 5.0, 30.0, 8.0, 200.0);
        let removed = p.remove_proportion(0.25);
        assert!((removed - 50.0).abs() < 1e-9);
        assert!((p.expf - 150.0).abs() < 1e-9);
        assert!((p.expf_change + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_proportion_clamped() {
        let mut p = make_plant(6.0, 5.0, 30.0, 8.0, 200.0);
        let removed = p.remove_proportion(1.7);
        assert!((removed - 200.0).abs() < 1e-9);
        assert_eq!(p.expf, 0.0);
    }

    #[test]
    fn test_plant_errors_flags() {
        let mut e = PlantErrors::OK;
        assert!(e.is_ok());
        e.insert(PlantErrors::INVALID_DBH);
        e.insert(PlantErrors::INVALID_EXPF);
        assert!(e.contains(PlantErrors::INVALID_DBH));
        assert!(e.contains(PlantErrors::INVALID_EXPF));
        assert!(!e.contains(PlantErrors::INVALID_HEIGHT));
        assert_eq!(e.to_string(), "invalid dbh|expf");
        e.clear();
        assert!(e.is_ok());
        assert_eq!(e.to_string(), "ok");
    }

    #[test]
    fn test_plant_errors_serialize_as_mask() {
        let mut e = PlantErrors::INVALID_HEIGHT;
        e.insert(PlantErrors::INVALID_SPECIES);
        assert_eq!(serde_json::to_string(&e).unwrap(), "129");
        let back: PlantErrors = serde_json::from_str("129").unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn test_plant_json_roundtrip() {
        let mut p = make_plant(2.0, 0.0, 10.0, 4.0, 10.0);
        p.errors.insert(PlantErrors::INVALID_CROWN_RATIO);
        let json = serde_json::to_string(&p).unwrap();
        let back: Plant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_plant_json_defaults_missing_fields() {
        let json = r#"{"plot": 3, "plant": 7, "species": 1, "tht": 12.5}"#;
        let p: Plant = serde_json::from_str(json).unwrap();
        assert_eq!(p.plot, 3);
        assert_eq!(p.tht, 12.5);
        assert_eq!(p.d6, 0.0);
        assert!(p.errors.is_ok());
    }
}
