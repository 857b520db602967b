use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::models::{plots_from_plants, Plant, Plot, Stand};
use crate::simulation::{SummaryRecord, YearSummary};

/// CSV row for plant input. Blank cells are missing measurements.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct PlantRow {
    plot: u32,
    plant: u32,
    species: u32,
    d6: Option<f64>,
    dbh: Option<f64>,
    tht: Option<f64>,
    cr: Option<f64>,
    n_stems: Option<f64>,
    expf: Option<f64>,
    pct_cover: Option<f64>,
    crown_width: Option<f64>,
    max_crown_width: Option<f64>,
}

impl From<PlantRow> for Plant {
    fn from(row: PlantRow) -> Self {
        let mut p = Plant::new(row.plot, row.plant, row.species);
        p.d6 = row.d6.unwrap_or(0.0);
        p.dbh = row.dbh.unwrap_or(0.0);
        p.tht = row.tht.unwrap_or(0.0);
        p.cr = row.cr.unwrap_or(0.0);
        p.n_stems = row.n_stems.unwrap_or(0.0);
        p.expf = row.expf.unwrap_or(0.0);
        p.pct_cover = row.pct_cover.unwrap_or(0.0);
        p.crown_width = row.crown_width.unwrap_or(0.0);
        p.max_crown_width = row.max_crown_width.unwrap_or(0.0);
        p.update_derived();
        p
    }
}

/// CSV row for plot covariates. Monthly climate is only carried in JSON.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct PlotRow {
    plot: u32,
    elevation: Option<f64>,
    slope: Option<f64>,
    aspect: Option<f64>,
    water_capacity: Option<f64>,
    mean_annual_precip: Option<f64>,
    growing_season_precip: Option<f64>,
    site_index: Option<f64>,
}

impl From<PlotRow> for Plot {
    fn from(row: PlotRow) -> Self {
        let mut plot = Plot::new(row.plot);
        plot.elevation = row.elevation.unwrap_or(0.0);
        plot.slope = row.slope.unwrap_or(0.0);
        plot.aspect = row.aspect.unwrap_or(0.0);
        plot.water_capacity = row.water_capacity.unwrap_or(0.0);
        plot.mean_annual_precip = row.mean_annual_precip.unwrap_or(0.0);
        plot.growing_season_precip = row.growing_season_precip.unwrap_or(0.0);
        plot.site_index = row.site_index.unwrap_or(0.0);
        plot
    }
}

impl From<&Plot> for PlotRow {
    fn from(plot: &Plot) -> Self {
        Self {
            plot: plot.plot,
            elevation: Some(plot.elevation),
            slope: Some(plot.slope),
            aspect: Some(plot.aspect),
            water_capacity: Some(plot.water_capacity),
            mean_annual_precip: Some(plot.mean_annual_precip),
            growing_season_precip: Some(plot.growing_season_precip),
            site_index: Some(plot.site_index),
        }
    }
}

/// One projected year flattened for CSV output.
#[derive(Debug, serde::Serialize)]
struct YearRow<'a> {
    year: i32,
    age: u32,
    mortality_proportion: f64,
    x0: f64,
    code: &'a str,
    expf: f64,
    bh_expf: f64,
    basal_area: f64,
    mean_height: f64,
    qmd: f64,
    sdi: f64,
    volume: f64,
    biomass: f64,
    height_40: f64,
}

impl<'a> From<&'a YearSummary> for YearRow<'a> {
    fn from(y: &'a YearSummary) -> Self {
        let s = &y.summary;
        Self {
            year: y.year,
            age: y.age,
            mortality_proportion: y.mortality_proportion,
            x0: y.x0,
            code: &s.code,
            expf: s.expf,
            bh_expf: s.bh_expf,
            basal_area: s.basal_area,
            mean_height: s.mean_height,
            qmd: s.qmd,
            sdi: s.sdi,
            volume: s.volume,
            biomass: s.biomass,
            height_40: s.height_40,
        }
    }
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

/// Parse plant rows from any CSV source.
pub fn read_plants<R: Read>(source: R) -> Result<Vec<Plant>> {
    let mut rdr = reader(source);
    let mut plants = Vec::new();
    for result in rdr.deserialize() {
        let row: PlantRow = result?;
        plants.push(row.into());
    }
    Ok(plants)
}

/// Parse plot rows from any CSV source.
pub fn read_plots<R: Read>(source: R) -> Result<Vec<Plot>> {
    let mut rdr = reader(source);
    let mut plots = Vec::new();
    for result in rdr.deserialize() {
        let row: PlotRow = result?;
        plots.push(row.into());
    }
    Ok(plots)
}

/// Read a stand from a plant CSV and an optional plot CSV.
///
/// Without a plot file one plot per distinct plot id is created from `template`.
pub fn read_stand_csv(
    plants_path: impl AsRef<Path>,
    plots_path: Option<&Path>,
    template: &Plot,
) -> Result<Stand> {
    let plants_path = plants_path.as_ref();
    let plants = read_plants(std::fs::File::open(plants_path)?)?;
    let plots = match plots_path {
        Some(p) => read_plots(std::fs::File::open(p)?)?,
        None => plots_from_plants(&plants, template),
    };
    let mut stand = Stand::new(
        plants_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
    );
    stand.plots = plots;
    stand.plants = plants;
    stand.sort();
    Ok(stand)
}

/// Write every plant column, including derived areas, increments and error bits.
pub fn write_plants<W: Write>(plants: &[Plant], sink: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(sink);
    for p in plants {
        wtr.serialize(p)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_plots<W: Write>(plots: &[Plot], sink: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(sink);
    for plot in plots {
        wtr.serialize(PlotRow::from(plot))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a stand's plants to `plants_path` and, when given, its plots to `plots_path`.
pub fn write_stand_csv(
    stand: &Stand,
    plants_path: impl AsRef<Path>,
    plots_path: Option<&Path>,
) -> Result<()> {
    write_plants(&stand.plants, std::fs::File::create(plants_path.as_ref())?)?;
    if let Some(p) = plots_path {
        write_plots(&stand.plots, std::fs::File::create(p)?)?;
    }
    Ok(())
}

pub fn write_summaries_csv(records: &[SummaryRecord], path: impl AsRef<Path>) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per projected year with the stand summary columns.
pub fn write_projection_csv(years: &[YearSummary], path: impl AsRef<Path>) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    for y in years {
        wtr.serialize(YearRow::from(y))?;
    }
    wtr.flush()?;
    Ok(())
}
