//! nc2shp command-line tool.
//!
//! Reads a netCDF field (local file or OPeNDAP), contours it at the requested
//! levels and writes the contour lines to a polyline shapefile, optionally
//! with a filled-contour figure.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use grid_common::ContourError;
use netcdf_parser::silence_hdf5_errors;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use nc2shp::{execute, RunConfig, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "nc2shp")]
#[command(about = "Create a shapefile from netCDF data contours")]
struct Args {
    /// Input netCDF file or OPeNDAP URL (date placeholders allowed)
    #[arg(short = 'i', long = "ifile", env = "NC2SHP_INPUT")]
    input: Option<String>,

    /// Data start year (default: yesterday)
    #[arg(short, long)]
    year: Option<i32>,

    /// Data start month (default: yesterday)
    #[arg(short, long)]
    month: Option<u32>,

    /// Data start day (default: yesterday)
    #[arg(short, long)]
    day: Option<u32>,

    /// Time window in hours
    #[arg(short = 't', long)]
    time_window: Option<u32>,

    /// Variables to use; several are summed
    #[arg(short = 'v', long = "ncvars", num_args = 1..)]
    variables: Option<Vec<String>>,

    /// Scale factor applied after aggregation
    #[arg(short = 's', long = "ncscal", allow_negative_numbers = true)]
    scale: Option<f32>,

    /// Temporal aggregation: mean, min or max
    #[arg(short, long)]
    func: Option<String>,

    /// Contour levels
    #[arg(short = 'c', long = "contours", num_args = 1.., allow_negative_numbers = true)]
    levels: Option<Vec<f64>>,

    /// Generate levels as multiples of this value instead of --contours
    #[arg(long, conflicts_with = "levels")]
    interval: Option<f64>,

    /// Chaikin smoothing passes applied to each contour
    #[arg(long)]
    smooth: Option<u32>,

    /// Output shapefile path template
    #[arg(short = 'o', long)]
    shapefile: Option<String>,

    /// Extra shapefile attribute holding the level
    #[arg(short = 'p', long)]
    propname: Option<String>,

    /// Filled-contour figure path template
    #[arg(long, alias = "fillfig-name")]
    figure: Option<String>,

    /// Level painted in the filled figure (default: first level)
    #[arg(long, alias = "fillfig-contour", allow_negative_numbers = true)]
    fill_level: Option<f64>,

    /// Figure title template
    #[arg(long, alias = "fillfig-title")]
    title: Option<String>,

    /// Contour-lines figure path template
    #[arg(long, alias = "contour-figname")]
    contour_figure: Option<String>,

    /// Longitude placed at the center of the grid
    #[arg(long, allow_negative_numbers = true)]
    central_longitude: Option<f64>,

    /// Crop box: west east south north
    #[arg(long, num_args = 4, value_names = ["WEST", "EAST", "SOUTH", "NORTH"], allow_negative_numbers = true)]
    extent: Option<Vec<f64>>,

    /// TrueType font used for the figure title
    #[arg(long)]
    font: Option<PathBuf>,

    /// Figure width in pixels
    #[arg(long)]
    figure_width: Option<u32>,

    /// Figure height in pixels
    #[arg(long)]
    figure_height: Option<u32>,

    /// YAML run file providing defaults for every option
    #[arg(long, env = "NC2SHP_CONFIG")]
    config: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    summary_json: bool,

    /// Log level
    #[arg(long, env = "NC2SHP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    fn apply(self, config: &mut RunConfig) {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = self.$field { config.$field = v; })*
            };
        }
        macro_rules! set_opt {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = self.$field { config.$field = Some(v); })*
            };
        }

        set!(
            input,
            time_window,
            variables,
            scale,
            func,
            smooth,
            shapefile,
            figure_width,
            figure_height,
        );
        set_opt!(
            year,
            month,
            day,
            interval,
            propname,
            figure,
            fill_level,
            title,
            contour_figure,
            central_longitude,
            font,
        );

        if let Some(levels) = self.levels {
            config.levels = levels;
            config.interval = None;
        }
        // clap enforces exactly four values
        if let Some(extent) = self
            .extent
            .as_deref()
            .and_then(|e| <[f64; 4]>::try_from(e).ok())
        {
            config.extent = Some(extent);
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_config(args: Args) -> Result<(RunConfig, bool)> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load run configuration from {:?}", path))?,
        None => RunConfig::default(),
    };
    let summary_json = args.summary_json;
    args.apply(&mut config);
    Ok((config, summary_json))
}

fn try_main(args: Args) -> Result<()> {
    let (config, summary_json) = load_config(args)?;
    info!(
        input = %config.input,
        variables = ?config.variables,
        levels = ?config.levels,
        "Starting nc2shp"
    );

    let summary: RunSummary = execute(&config)?;

    if summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Err(e) = init_tracing(&args.log_level, args.log_json) {
        eprintln!("cannot initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    silence_hdf5_errors();

    match try_main(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run failed");
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<ContourError>()
                .map(ContourError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}
