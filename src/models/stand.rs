use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::{Plant, Plot};
use crate::error::{ConifersError, Result};

/// Contiguous run of plants belonging to one plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRange {
    /// Position of the plot in `Stand::plots`
    pub plot_idx: usize,
    /// Positions of its plants in `Stand::plants`
    pub plants: Range<usize>,
}

/// A simulated stand: the plot and plant sample plus the state carried between years.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stand {
    /// Name or identifier for this stand
    pub name: String,
    pub plots: Vec<Plot>,
    pub plants: Vec<Plant>,
    /// Density trajectory origin; zero until the mortality engine sets it
    #[serde(default)]
    pub x0: f64,
    /// Stand age in years
    #[serde(default)]
    pub age: u32,
    /// Calendar year the projection started from
    #[serde(default)]
    pub start_year: i32,
    #[serde(default)]
    pub n_years_projected: u32,
}

impl Stand {
    /// Create a new empty stand.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plots: Vec::new(),
            plants: Vec::new(),
            x0: 0.0,
            age: 0,
            start_year: 0,
            n_years_projected: 0,
        }
    }

    pub fn num_plots(&self) -> usize {
        self.plots.len()
    }

    pub fn num_plants(&self) -> usize {
        self.plants.len()
    }

    /// Calendar year the stand has been projected to.
    pub fn current_year(&self) -> i32 {
        self.start_year + self.n_years_projected as i32
    }

    /// Sort plots by id and plants by (plot, plant).
    pub fn sort(&mut self) {
        self.plots.sort_by_key(|p| p.plot);
        self.plants.sort_by_key(|p| (p.plot, p.plant));
    }

    /// Sort, then map every plot to the contiguous range of its plants.
    ///
    /// Plots without plants get no entry. A plant whose plot id is not in the
    /// plot list is a structural error.
    pub fn group_by_plot(&mut self) -> Result<Vec<PlotRange>> {
        self.sort();
        let mut ranges = Vec::with_capacity(self.plots.len());
        let mut start = 0;
        while start < self.plants.len() {
            let id = self.plants[start].plot;
            let end = start
                + self.plants[start..]
                    .iter()
                    .take_while(|p| p.plot == id)
                    .count();
            let plot_idx = self
                .plots
                .binary_search_by_key(&id, |p| p.plot)
                .map_err(|_| {
                    ConifersError::InvalidPlotCount(format!(
                        "plant {} references plot {id}, which is not in the plot list",
                        self.plants[start].plant
                    ))
                })?;
            ranges.push(PlotRange {
                plot_idx,
                plants: start..end,
            });
            start = end;
        }
        Ok(ranges)
    }

    /// Reject stands with no plants or no plots.
    pub fn check_counts(&self) -> Result<()> {
        if self.plants.is_empty() {
            return Err(ConifersError::InvalidPlantCount(
                "stand has no plant records".to_string(),
            ));
        }
        if self.plots.is_empty() {
            return Err(ConifersError::InvalidPlotCount(
                "stand has no plots".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stand() -> Stand {
        let mut stand = Stand::new("Test");
        stand.plots = vec![Plot::new(2), Plot::new(1), Plot::new(5)];
        stand.plants = vec![
            Plant::new(2, 3, 0),
            Plant::new(1, 2, 0),
            Plant::new(2, 1, 0),
            Plant::new(1, 1, 0),
        ];
        stand
    }

    #[test]
    fn test_new_stand() {
        let stand = Stand::new("My Stand");
        assert_eq!(stand.name, "My Stand");
        assert_eq!(stand.num_plots(), 0);
        assert_eq!(stand.num_plants(), 0);
        assert_eq!(stand.x0, 0.0);
    }

    #[test]
    fn test_sort_orders_plants_by_plot_then_plant() {
        let mut stand = sample_stand();
        stand.sort();
        let keys: Vec<(u32, u32)> = stand.plants.iter().map(|p| (p.plot, p.plant)).collect();
        assert_eq!(keys, vec![(1, 1), (1, 2), (2, 1), (2, 3)]);
        let ids: Vec<u32> = stand.plots.iter().map(|p| p.plot).collect();
        assert_eq!(ids, vec![1, 2, 5]);
    }

    #[test]
    fn test_group_by_plot_ranges() {
        let mut stand = sample_stand();
        let ranges = stand.group_by_plot().unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], PlotRange { plot_idx: 0, plants: 0..2 });
        assert_eq!(ranges[1], PlotRange { plot_idx: 1, plants: 2..4 });
    }

    #[test]
    fn test_group_by_plot_unknown_plot() {
        let mut stand = sample_stand();
        stand.plants.push(Plant::new(9, 1, 0));
        let err = stand.group_by_plot().unwrap_err();
        assert!(matches!(err, ConifersError::InvalidPlotCount(_)));
    }

    #[test]
    fn test_check_counts() {
        let mut stand = Stand::new("Empty");
        assert!(matches!(
            stand.check_counts(),
            Err(ConifersError::InvalidPlantCount(_))
        ));
        stand.plants.push(Plant::new(1, 1, 0));
        assert!(matches!(
            stand.check_counts(),
            Err(ConifersError::InvalidPlotCount(_))
        ));
        stand.plots.push(Plot::new(1));
        assert!(stand.check_counts().is_ok());
    }

    #[test]
    fn test_current_year() {
        let mut stand = Stand::new("Years");
        stand.start_year = 2020;
        stand.n_years_projected = 5;
        assert_eq!(stand.current_year(), 2025);
    }

    #[test]
    fn test_stand_json_roundtrip() {
        let stand = sample_stand();
        let json = serde_json::to_string(&stand).unwrap();
        let back: Stand = serde_json::from_str(&json).unwrap();
        assert_eq!(back.num_plots(), 3);
        assert_eq!(back.num_plants(), 4);
    }
}
