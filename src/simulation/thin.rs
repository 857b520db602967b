//! Removal of stems from the tree component of a stand.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConifersError, Result};
use crate::models::{CoefficientTable, Plant, SpeciesTable, Stand};

/// Thinning prescription. Only conifers and hardwoods are removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThinType {
    /// Remove the same fraction (0-1) of every tree record
    Proportional { proportion: f64 },
    /// Remove a percentage (0-100) of every tree record
    Percent { percent: f64 },
    /// Remove a percentage of one species' records
    SpeciesPercent { species: u32, percent: f64 },
    /// Remove the smallest trees until each plot has at most `target` stems per acre
    FromBelowExpf { target: f64 },
    /// Remove the smallest trees until each plot has at most `target` sq ft/acre of basal area
    FromBelowBasalArea { target: f64 },
}

impl ThinType {
    fn validate(&self) -> Result<()> {
        let ok = match *self {
            ThinType::Proportional { proportion } => (0.0..=1.0).contains(&proportion),
            ThinType::Percent { percent } | ThinType::SpeciesPercent { percent, .. } => {
                (0.0..=100.0).contains(&percent)
            }
            ThinType::FromBelowExpf { target } | ThinType::FromBelowBasalArea { target } => {
                target.is_finite() && target >= 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(ConifersError::InvalidInputVal(format!(
                "thinning prescription out of range: {self:?}"
            )))
        }
    }
}

impl std::fmt::Display for ThinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThinType::Proportional { proportion } => write!(f, "proportional {proportion:.3}"),
            ThinType::Percent { percent } => write!(f, "{percent:.1}% of trees"),
            ThinType::SpeciesPercent { species, percent } => {
                write!(f, "{percent:.1}% of species {species}")
            }
            ThinType::FromBelowExpf { target } => write!(f, "from below to {target:.1} stems/ac"),
            ThinType::FromBelowBasalArea { target } => {
                write!(f, "from below to {target:.1} sq ft/ac")
            }
        }
    }
}

/// Per-acre amounts removed, averaged over plots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThinOutcome {
    /// Stems per acre removed
    pub plants_removed: f64,
    /// Basal area removed, sq ft/acre
    pub basal_area_removed: f64,
}

fn is_tree(plant: &Plant, species: &SpeciesTable, coeffs: &CoefficientTable) -> bool {
    species
        .get(plant.species)
        .ok()
        .and_then(|sp| coeffs.get(sp.fsp))
        .is_some_and(|c| c.life_form.is_tree())
}

/// Remove stems from the smallest trees first until `measure` summed over the
/// plot is at most `target`. Returns per-plant removal proportions.
fn from_below(
    plants: &[Plant],
    trees: &[usize],
    target: f64,
    measure: impl Fn(&Plant) -> f64,
) -> Vec<(usize, f64)> {
    let mut order = trees.to_vec();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (&plants[a], &plants[b]);
        pa.dbh.total_cmp(&pb.dbh).then(pa.tht.total_cmp(&pb.tht))
    });
    let mut excess: f64 = trees.iter().map(|&i| measure(&plants[i])).sum::<f64>() - target;
    let mut out = Vec::new();
    for i in order {
        if excess <= 0.0 {
            break;
        }
        let amount = measure(&plants[i]);
        if amount <= 0.0 {
            continue;
        }
        let p = (excess / amount).min(1.0);
        excess -= amount * p;
        out.push((i, p));
    }
    out
}

/// Apply a thinning prescription to every plot.
pub fn thin(
    stand: &mut Stand,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
    thin_type: &ThinType,
) -> Result<ThinOutcome> {
    thin_type.validate()?;
    stand.check_counts()?;
    let ranges = stand.group_by_plot()?;

    let mut removed_stems = 0.0;
    let mut removed_ba = 0.0;
    for range in ranges {
        let trees: Vec<usize> = range
            .plants
            .clone()
            .filter(|&i| is_tree(&stand.plants[i], species, coeffs))
            .collect();

        let removals: Vec<(usize, f64)> = match *thin_type {
            ThinType::Proportional { proportion } => {
                trees.iter().map(|&i| (i, proportion)).collect()
            }
            ThinType::Percent { percent } => trees.iter().map(|&i| (i, percent / 100.0)).collect(),
            ThinType::SpeciesPercent { species: sp, percent } => trees
                .iter()
                .filter(|&&i| stand.plants[i].species == sp)
                .map(|&i| (i, percent / 100.0))
                .collect(),
            ThinType::FromBelowExpf { target } => {
                from_below(&stand.plants, &trees, target, |p| p.expf.max(0.0))
            }
            ThinType::FromBelowBasalArea { target } => {
                from_below(&stand.plants, &trees, target, |p| p.expf.max(0.0) * p.basal_area)
            }
        };

        for (i, proportion) in removals {
            let plant = &mut stand.plants[i];
            let stems = plant.remove_proportion(proportion);
            removed_stems += stems;
            removed_ba += stems * plant.basal_area;
        }
    }

    let n_plots = stand.num_plots() as f64;
    let outcome = ThinOutcome {
        plants_removed: removed_stems / n_plots,
        basal_area_removed: removed_ba / n_plots,
    };
    info!(
        prescription = %thin_type,
        stems = outcome.plants_removed,
        basal_area = outcome.basal_area_removed,
        "thinned stand"
    );
    Ok(outcome)
}
