use colored::Colorize;
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, ContentArrangement, Table,
};

use crate::models::{CoefficientTable, SpeciesTable};
use crate::simulation::{
    SamplingStatistics, StandReport, SummaryRecord, ThinOutcome, ThinType, YearSummary,
};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn heading(output: &mut String, title: &str, width: usize) {
    output.push_str(&format!("\n{}\n", title.bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(width)));
}

/// Format the stand-level summary as a metric/value/unit table.
pub fn format_stand_summary(name: &str, summary: &SummaryRecord) -> String {
    let mut output = String::new();
    heading(&mut output, &format!("Stand Summary: {name}"), 50);

    let mut table = new_table(vec!["Metric", "Value", "Unit"]);
    let rows = [
        ("Stems per Acre", format!("{:.1}", summary.expf), "stems/acre"),
        ("Stems Above Breast Height", format!("{:.1}", summary.bh_expf), "stems/acre"),
        ("Basal Area", format!("{:.1}", summary.basal_area), "sq ft/acre"),
        ("QMD", format!("{:.2}", summary.qmd), "inches"),
        ("Mean Height", format!("{:.1}", summary.mean_height), "feet"),
        ("Top Height", format!("{:.1}", summary.height_40), "feet"),
        ("SDI", format!("{:.1}", summary.sdi), ""),
        ("Volume", format!("{:.1}", summary.volume), "cu ft/acre"),
        ("Biomass", format!("{:.1}", summary.biomass), "lb/acre"),
    ];
    for (metric, value, unit) in rows {
        table.add_row(vec![Cell::new(metric), Cell::new(value), Cell::new(unit)]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_stand_summary(name: &str, summary: &SummaryRecord) {
    print!("{}", format_stand_summary(name, summary));
}

/// Format grouped summaries (species or functional species) as a string.
pub fn format_summary_table(title: &str, records: &[SummaryRecord]) -> String {
    let mut output = String::new();
    heading(&mut output, title, 60);

    let mut table = new_table(vec![
        "Code", "Stems/ac", "BA/ac", "QMD", "Min DBH", "Max DBH", "Mean Ht", "Top Ht", "Vol/ac",
    ]);
    for r in records {
        table.add_row(vec![
            Cell::new(&r.code),
            Cell::new(format!("{:.1}", r.expf)),
            Cell::new(format!("{:.1}", r.basal_area)),
            Cell::new(format!("{:.2}\"", r.qmd)),
            Cell::new(format!("{:.1}\"", r.min_dbh)),
            Cell::new(format!("{:.1}\"", r.max_dbh)),
            Cell::new(format!("{:.1}", r.mean_height)),
            Cell::new(format!("{:.1}", r.height_40)),
            Cell::new(format!("{:.1}", r.volume)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_summary_table(title: &str, records: &[SummaryRecord]) {
    print!("{}", format_summary_table(title, records));
}

/// Stand summary followed by the species and functional species breakdowns.
pub fn print_stand_report(name: &str, report: &StandReport) {
    print_stand_summary(name, &report.stand);
    print_summary_table("By Species", &report.by_species);
    print_summary_table("By Functional Species", &report.by_fsp);
}

/// Format sampling statistics table as a string.
pub fn format_statistics_table(stats: &SamplingStatistics) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Sampling Statistics".bold().green()));
    output.push_str(&format!(
        "{}\n",
        format!(
            "Confidence Level: {:.0}% | Sample Size: {} plots",
            stats.basal_area.confidence_level * 100.0,
            stats.basal_area.sample_size
        )
        .dimmed()
    ));
    output.push_str(&format!("{}\n", "=".repeat(70)));

    let mut table = new_table(vec![
        "Metric",
        "Mean",
        "Std Error",
        "Lower CI",
        "Upper CI",
        "Samp. Error %",
    ]);

    let metrics = [
        ("Stems/ac above BH", &stats.expf),
        ("Basal Area (sq ft/ac)", &stats.basal_area),
        ("SDI", &stats.sdi),
    ];

    for (name, ci) in &metrics {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.1}", ci.mean)),
            Cell::new(format!("{:.2}", ci.std_error)),
            Cell::new(format!("{:.1}", ci.lower)),
            Cell::new(format!("{:.1}", ci.upper)),
            Cell::new(format!("{:.1}%", ci.sampling_error_percent)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print sampling statistics table with confidence intervals.
pub fn print_statistics_table(stats: &SamplingStatistics) {
    print!("{}", format_statistics_table(stats));
}

/// Format the year-by-year projection as a string.
pub fn format_projection_table(years: &[YearSummary]) -> String {
    let mut output = String::new();
    heading(&mut output, "Growth Projection", 60);

    let mut table = new_table(vec![
        "Year", "Age", "Stems/ac", "BA/ac", "QMD", "Top Ht", "SDI", "Vol/ac", "Mortality",
    ]);
    for y in years {
        let s = &y.summary;
        table.add_row(vec![
            Cell::new(y.year),
            Cell::new(y.age),
            Cell::new(format!("{:.1}", s.expf)),
            Cell::new(format!("{:.1}", s.basal_area)),
            Cell::new(format!("{:.2}", s.qmd)),
            Cell::new(format!("{:.1}", s.height_40)),
            Cell::new(format!("{:.1}", s.sdi)),
            Cell::new(format!("{:.1}", s.volume)),
            Cell::new(format!("{:.2}%", y.mortality_proportion * 100.0)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_projection_table(years: &[YearSummary]) {
    print!("{}", format_projection_table(years));
}

/// Format the species table joined with the coefficient life forms.
pub fn format_coefficients_table(
    label: &str,
    species: &SpeciesTable,
    coeffs: &CoefficientTable,
) -> String {
    let mut output = String::new();
    heading(&mut output, &format!("Coefficients: {label}"), 60);

    let mut table = new_table(vec![
        "Idx", "Code", "Name", "FSP", "Life Form", "Max SDI", "HG Err SD", "Endemic Mort.",
    ]);
    for sp in species.records() {
        let record = coeffs.get(sp.fsp);
        table.add_row(vec![
            Cell::new(sp.idx),
            Cell::new(&sp.code),
            Cell::new(&sp.common_name),
            Cell::new(sp.fsp),
            Cell::new(record.map_or_else(|| "-".to_string(), |r| r.life_form.to_string())),
            Cell::new(format!("{:.0}", sp.max_sdi)),
            Cell::new(record.map_or_else(|| "-".to_string(), |r| format!("{:.3}", r.hg_error_sd))),
            Cell::new(format!("{:.4}", sp.endemic_mortality)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_coefficients_table(label: &str, species: &SpeciesTable, coeffs: &CoefficientTable) {
    print!("{}", format_coefficients_table(label, species, coeffs));
}

pub fn format_thin_outcome(thin_type: &ThinType, outcome: &ThinOutcome) -> String {
    format!(
        "{} thinned {}: removed {:.1} stems/ac and {:.1} sq ft/ac basal area\n",
        "Success:".green().bold(),
        thin_type,
        outcome.plants_removed,
        outcome.basal_area_removed
    )
}
