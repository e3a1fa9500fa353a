//! FieldCAD 命令行程序
//!
//! 图纸配准导入、测点与宗地导出、放样与量测。

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fieldcad_core::crs::CrsRegistry;
use fieldcad_core::math::LatLng;
use fieldcad_file::ExportFormat;

mod commands;
mod config;

use commands::{parse_lat_lng, GeorefArgs};
use config::AppConfig;

#[derive(Parser)]
#[command(name = "fieldcad")]
#[command(about = "Field surveying CAD overlay and export tool", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON 配置文件
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available coordinate reference systems
    Crs,

    /// Georeference a DXF drawing and print it as GeoJSON
    Import {
        /// DXF drawing
        #[arg(value_hint = clap::ValueHint::FilePath)]
        drawing: PathBuf,

        #[command(flatten)]
        georef: GeorefArgs,

        /// Sub-layer to hide (repeatable)
        #[arg(long = "hide")]
        hidden: Vec<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export recorded points as a coordinate list or DXF
    ExportPoints {
        /// JSON point list or .fcp project
        #[arg(value_hint = clap::ValueHint::FilePath)]
        points: PathBuf,

        /// Target CRS (defaults to the configured export CRS)
        #[arg(long)]
        crs: Option<String>,

        #[arg(short, long, default_value = "txt")]
        format: PointFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export parcel polygons from GeoJSON to DXF
    ExportParcels {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        parcels: PathBuf,

        /// Target CRS (automatic 3° zone when omitted)
        #[arg(long)]
        crs: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the edge lengths of parcel polygons in a GeoJSON file
    ParcelEdges {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        parcels: PathBuf,
    },

    /// Distance and bearing from the current position to a target
    Stakeout {
        #[arg(long, value_parser = parse_lat_lng, allow_hyphen_values = true)]
        from: LatLng,

        #[arg(long, value_parser = parse_lat_lng, allow_hyphen_values = true)]
        to: LatLng,
    },

    /// Measure a path of `lat,lng` points
    Measure {
        #[arg(value_parser = parse_lat_lng, allow_hyphen_values = true, num_args = 2..)]
        points: Vec<LatLng>,
    },

    /// Record a point into a project, snapping to nearby points
    Capture {
        /// .fcp project (created when missing)
        project: PathBuf,

        #[arg(value_parser = parse_lat_lng, allow_hyphen_values = true)]
        position: LatLng,

        /// Disable snapping
        #[arg(long)]
        no_snap: bool,
    },

    /// List the points of a project in its export CRS
    Points {
        project: PathBuf,
    },

    /// Add a DXF drawing or GeoJSON file to a project as a layer
    AddLayer {
        project: PathBuf,

        #[arg(value_hint = clap::ValueHint::FilePath)]
        source: PathBuf,

        #[command(flatten)]
        georef: GeorefArgs,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum PointFormat {
    Txt,
    Dxf,
}

impl From<PointFormat> for ExportFormat {
    fn from(format: PointFormat) -> Self {
        match format {
            PointFormat::Txt => ExportFormat::Text,
            PointFormat::Dxf => ExportFormat::Dxf,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    // 初始化日志（输出到 stderr，不干扰 stdout 上的导出内容）
    let level = if cli.verbose { Level::DEBUG } else { config.level() };
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish(),
    )?;

    info!("Starting FieldCAD...");

    let registry = CrsRegistry::builtin();

    match cli.command {
        Commands::Crs => commands::list_crs(&registry),

        Commands::Import {
            drawing,
            georef,
            hidden,
            output,
        } => commands::import(&registry, &config, &drawing, &georef, &hidden, output.as_deref()),

        Commands::ExportPoints {
            points,
            crs,
            format,
            output,
        } => commands::export_points(
            &registry,
            &config,
            &points,
            crs.as_deref(),
            format.into(),
            output.as_deref(),
        ),

        Commands::ExportParcels {
            parcels,
            crs,
            output,
        } => commands::export_parcels(&registry, &parcels, crs.as_deref(), output.as_deref()),

        Commands::ParcelEdges { parcels } => commands::parcel_edges(&parcels),

        Commands::Stakeout { from, to } => commands::stakeout(&config, from, to),

        Commands::Measure { points } => commands::measure(&points),

        Commands::Capture {
            project,
            position,
            no_snap,
        } => commands::capture(&registry, &config, &project, position, no_snap),

        Commands::Points { project } => commands::list_points(&registry, &config, &project),

        Commands::AddLayer {
            project,
            source,
            georef,
        } => commands::add_layer(&registry, &config, &project, &source, &georef),
    }
}
