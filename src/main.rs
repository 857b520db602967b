use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use conifers::{
    error::{ConifersError, ReturnCode},
    io::{self, CsvFormat, SimulationConfig},
    simulation::{SamplingDesign, Session, ThinType},
    visualization::{
        format_thin_outcome, print_coefficients_table, print_projection_table,
        print_stand_report, print_statistics_table,
    },
    Stand, Variant,
};

#[derive(Parser)]
#[command(
    name = "conifers",
    about = "CONIFERS - individual-plant growth projection for young forest stands",
    version,
    author
)]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads a stand.
#[derive(Args)]
struct StandArgs {
    /// Path to the stand file (plant CSV or stand JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Plot covariate CSV to pair with a plant CSV
    #[arg(long)]
    plots: Option<PathBuf>,

    /// TOML run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Growth model variant: swo, smc, swo-hybrid or cips (overrides config)
    #[arg(long)]
    variant: Option<Variant>,
}

#[derive(Subcommand)]
enum Commands {
    /// Project stand growth year by year
    Project {
        #[command(flatten)]
        stand: StandArgs,

        /// Number of years to project (overrides config)
        #[arg(short, long)]
        years: Option<u32>,

        /// Seed for the random error stream (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Add random height growth error and damage
        #[arg(long)]
        random_error: bool,

        /// Disable density-dependent mortality
        #[arg(long)]
        no_sdi_mortality: bool,

        /// Fill missing measurements before projecting
        #[arg(long)]
        impute: bool,

        /// Write the projected stand here (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write one summary row per projected year to this CSV
        #[arg(long)]
        years_csv: Option<PathBuf>,
    },

    /// Fill missing plant measurements and expansion factors
    Impute {
        #[command(flatten)]
        stand: StandArgs,

        /// Fixed plot radius in feet
        #[arg(long)]
        plot_radius: Option<f64>,

        /// Basal area factor for prism-tallied trees
        #[arg(long)]
        baf: Option<f64>,

        /// Smallest dbh tallied with the prism, inches
        #[arg(long)]
        min_dbh: Option<f64>,

        /// Output stand file (.csv or .json)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Remove trees from a stand
    #[command(group(
        ArgGroup::new("method")
            .required(true)
            .args(["percent", "proportion", "target_expf", "target_ba"])
    ))]
    Thin {
        #[command(flatten)]
        stand: StandArgs,

        /// Remove this percentage (0-100) of every tree record
        #[arg(long)]
        percent: Option<f64>,

        /// Restrict a percentage thin to one species index
        #[arg(long, requires = "percent")]
        species: Option<u32>,

        /// Remove this fraction (0-1) of every tree record
        #[arg(long)]
        proportion: Option<f64>,

        /// Thin from below to this many stems per acre
        #[arg(long)]
        target_expf: Option<f64>,

        /// Thin from below to this basal area, sq ft/acre
        #[arg(long)]
        target_ba: Option<f64>,

        /// Output stand file (.csv or .json)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Summarize a stand by species and functional species
    Summary {
        #[command(flatten)]
        stand: StandArgs,

        /// Confidence level for between-plot statistics (0.0-1.0)
        #[arg(long, default_value = "0.95")]
        confidence: f64,

        /// Write the stand, species and functional species rows to this CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show the species and coefficient tables for a variant
    Coefficients {
        /// Growth model variant
        #[arg(long, default_value = "swo")]
        variant: Variant,

        /// Export the species table as JSON
        #[arg(long)]
        species_out: Option<PathBuf>,

        /// Export the coefficient table as JSON
        #[arg(long)]
        coeffs_out: Option<PathBuf>,
    },
}

struct Loaded {
    config: SimulationConfig,
    session: Session,
    stand: Stand,
}

fn load(args: &StandArgs) -> Result<Loaded> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    let session = config.session()?;

    let csv = CsvFormat { plots_path: args.plots.clone(), template: config.site_template() };
    let mut stand = io::read_stand(&args.input, &csv)
        .with_context(|| format!("reading stand {}", args.input.display()))?;
    if let Some(age) = config.age {
        stand.age = age;
    }
    if let Some(year) = config.start_year {
        stand.start_year = year;
    }
    info!(
        plots = stand.num_plots(),
        plants = stand.num_plants(),
        variant = %session.variant,
        "loaded stand"
    );
    Ok(Loaded { config, session, stand })
}

fn save(stand: &Stand, path: &Path) -> Result<()> {
    io::write_stand(stand, path, &CsvFormat::default())
        .with_context(|| format!("writing stand {}", path.display()))?;
    println!("{} wrote {}", "Success:".green().bold(), path.display());
    Ok(())
}

/// Imputation keeps whatever it could fill; incomplete plants are reported, not fatal.
fn impute_lenient(session: &Session, stand: &mut Stand, design: &SamplingDesign) -> Result<()> {
    match session.impute(stand, design) {
        Err(ConifersError::FillValues { count }) => {
            eprintln!(
                "{}: {count} plant(s) could not be completed; see their error flags",
                "Warning".yellow()
            );
            Ok(())
        }
        other => Ok(other?),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Project {
            stand: args,
            years,
            seed,
            random_error,
            no_sdi_mortality,
            impute,
            output,
            years_csv,
        } => {
            let Loaded { config, session, mut stand } = load(&args)?;
            let mut control = config.control;
            if let Some(seed) = seed {
                control.random_seed = seed;
            }
            control.use_random_error |= random_error;
            if no_sdi_mortality {
                control.sdi_mortality = false;
            }
            let years = years.unwrap_or(config.years);

            println!(
                "\n{}",
                format!(
                    "Growth Projection: {} ({}, {} years)",
                    stand.name, session.model_version, years
                )
                .bold()
                .cyan()
            );

            if impute {
                impute_lenient(&session, &mut stand, &config.sampling)?;
            }
            let summaries = session.project_seeded(&mut stand, years, &control)?;
            print_projection_table(&summaries);
            print_stand_report(&stand.name, &session.summarize(&stand));

            if let Some(path) = years_csv {
                io::write_projection_csv(&summaries, &path)?;
                println!("{} wrote {}", "Success:".green().bold(), path.display());
            }
            if let Some(path) = output {
                save(&stand, &path)?;
            }
        }

        Commands::Impute {
            stand: args,
            plot_radius,
            baf,
            min_dbh,
            output,
        } => {
            let Loaded { config, session, mut stand } = load(&args)?;
            let mut design = config.sampling;
            if let Some(r) = plot_radius {
                design.fixed_plot_radius = r;
            }
            if let Some(b) = baf {
                design.baf = b;
            }
            if let Some(d) = min_dbh {
                design.min_dbh = d;
            }
            impute_lenient(&session, &mut stand, &design)?;
            save(&stand, &output)?;
        }

        Commands::Thin {
            stand: args,
            percent,
            species,
            proportion,
            target_expf,
            target_ba,
            output,
        } => {
            let thin_type = match (percent, species, proportion, target_expf, target_ba) {
                (Some(percent), Some(species), ..) => ThinType::SpeciesPercent { species, percent },
                (Some(percent), None, ..) => ThinType::Percent { percent },
                (_, _, Some(proportion), ..) => ThinType::Proportional { proportion },
                (_, _, _, Some(target), _) => ThinType::FromBelowExpf { target },
                (_, _, _, _, Some(target)) => ThinType::FromBelowBasalArea { target },
                _ => anyhow::bail!("No thinning method given"),
            };
            let Loaded { session, mut stand, .. } = load(&args)?;
            session.recompute(&mut stand)?;
            let outcome = session.thin(&mut stand, &thin_type)?;
            print!("{}", format_thin_outcome(&thin_type, &outcome));
            save(&stand, &output)?;
        }

        Commands::Summary {
            stand: args,
            confidence,
            csv,
        } => {
            let Loaded { session, mut stand, .. } = load(&args)?;
            let stats = session.sampling_statistics(&mut stand, confidence);
            let report = session.summarize(&stand);
            print_stand_report(&stand.name, &report);
            match stats {
                Ok(stats) => print_statistics_table(&stats),
                Err(e) => eprintln!("{}: {e}", "Warning".yellow()),
            }
            if let Some(path) = csv {
                let mut rows = vec![report.stand];
                rows.extend(report.by_species);
                rows.extend(report.by_fsp);
                io::write_summaries_csv(&rows, &path)?;
                println!("{} wrote {}", "Success:".green().bold(), path.display());
            }
        }

        Commands::Coefficients {
            variant,
            species_out,
            coeffs_out,
        } => {
            let session = Session::new(variant)?;
            println!(
                "  Model {} | coefficient set v{}",
                session.model_version, session.coeffs_version
            );
            print_coefficients_table(&variant.to_string(), &session.species, &session.coeffs);
            if let Some(path) = species_out {
                io::write_json(session.species.records(), &path, true)?;
                println!("{} wrote {}", "Success:".green().bold(), path.display());
            }
            if let Some(path) = coeffs_out {
                io::write_json(session.coeffs.records(), &path, true)?;
                println!("{} wrote {}", "Success:".green().bold(), path.display());
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e
                .downcast_ref::<ConifersError>()
                .map(ReturnCode::from)
                .unwrap_or(ReturnCode::Error);
            warn!(return_code = %code, "command failed");
            eprintln!("{}: {e:#}", "Error".red().bold());
            ExitCode::from(code.code() as u8)
        }
    }
}
