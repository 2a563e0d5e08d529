//! skyview command-line tool.
//!
//! Runs the image operations and overlay decimation/rendering on
//! JSON-encoded images and overlay catalogs.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use image_ops::{crop, crop_sky, flip_x, flip_y, rotate_by_angle, rotate_to_north, GeomOverrides};
use overlay::{DataType, DrawerConfig};
use sky_common::{CoordSys, ImageHeader, WorldPt};
use skyview_cli::commands::{self, OverlayDocument};
use skyview_cli::io::{read_image, read_json, write_bytes, write_json};

#[derive(Parser, Debug)]
#[command(name = "skyview")]
#[command(about = "Sky image operations and overlay rendering")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FlipAxis {
    X,
    Y,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Histogram statistics of an image
    Stats {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 256-entry stretch and equalization tables
    Stretch {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Crop by inclusive pixel bounds
    Crop {
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        min_x: i64,
        #[arg(long, allow_hyphen_values = true)]
        min_y: i64,
        #[arg(long, allow_hyphen_values = true)]
        max_x: i64,
        #[arg(long, allow_hyphen_values = true)]
        max_y: i64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Crop a box of the given radius around a sky position
    CropSky {
        input: PathBuf,
        #[arg(long)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Radius in degrees
        #[arg(long)]
        radius: f64,
        /// Coordinate system of the position
        #[arg(long, default_value = "EQ_J2000")]
        csys: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mirror an image along one axis
    Flip {
        input: PathBuf,
        #[arg(long, value_enum)]
        axis: FlipAxis,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rotate an image by an angle, or to north up when no angle is given
    Rotate {
        input: PathBuf,
        /// Counter-clockwise rotation in degrees
        #[arg(long, allow_hyphen_values = true)]
        angle: Option<f64>,
        /// Coordinate system whose north points up
        #[arg(long, default_value = "EQ_J2000")]
        csys: String,
        #[arg(long)]
        interpolation: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resample onto a reference header and/or WCS overrides
    Resample {
        input: PathBuf,
        /// Header JSON describing the output grid
        #[arg(long)]
        reference: Option<PathBuf>,
        /// GeomOverrides JSON
        #[arg(long)]
        overrides: Option<PathBuf>,
        #[arg(long)]
        crval1: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        crval2: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        crota2: Option<f64>,
        #[arg(long)]
        naxis1: Option<usize>,
        #[arg(long)]
        naxis2: Option<usize>,
        #[arg(long)]
        interpolation: Option<String>,
        #[arg(long)]
        tie_skip: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decimate an overlay catalog against a view
    Decimate {
        input: PathBuf,
        #[arg(long, default_value = "1.0")]
        zoom: f64,
        #[arg(long)]
        fuzz_level: Option<usize>,
        /// Color representatives by density
        #[arg(long)]
        colormap: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render an overlay catalog to a PNG
    Render {
        input: PathBuf,
        #[arg(long, default_value = "1.0")]
        zoom: f64,
        /// Disable decimation
        #[arg(long)]
        no_decimate: bool,
        #[arg(long)]
        colormap: bool,
        /// Data type hint: very_large, normal or small_and_simple
        #[arg(long, default_value = "normal")]
        data_type: String,
        #[arg(short, long)]
        output: PathBuf,
    },
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
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().with_thread_ids(true).finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level, args.json)?;

    let pretty = args.pretty;
    match args.command {
        Command::Stats { input, output } => {
            let image = read_image(&input)?;
            write_json(output.as_deref(), &commands::stats(&image), pretty)?;
        }

        Command::Stretch { input, output } => {
            let image = read_image(&input)?;
            write_json(output.as_deref(), &commands::stretch_tables(&image), pretty)?;
        }

        Command::Crop {
            input,
            min_x,
            min_y,
            max_x,
            max_y,
            output,
        } => {
            let image = read_image(&input)?;
            let out = crop(&image, min_x, min_y, max_x, max_y)?;
            info!(naxis1 = out.header.naxis1, naxis2 = out.header.naxis2, "Cropped image");
            write_json(output.as_deref(), &out, pretty)?;
        }

        Command::CropSky {
            input,
            lon,
            lat,
            radius,
            csys,
            output,
        } => {
            let image = read_image(&input)?;
            let center = WorldPt::with_csys(lon, lat, CoordSys::parse(&csys)?);
            let out = crop_sky(&image, &center, radius)?;
            info!(naxis1 = out.header.naxis1, naxis2 = out.header.naxis2, "Cropped image");
            write_json(output.as_deref(), &out, pretty)?;
        }

        Command::Flip { input, axis, output } => {
            let image = read_image(&input)?;
            let out = match axis {
                FlipAxis::X => flip_x(&image),
                FlipAxis::Y => flip_y(&image),
            };
            write_json(output.as_deref(), &out, pretty)?;
        }

        Command::Rotate {
            input,
            angle,
            csys,
            interpolation,
            output,
        } => {
            let image = read_image(&input)?;
            let geom = commands::geom_from_env(interpolation.as_deref(), None)?;
            let out = match angle {
                Some(angle) => rotate_by_angle(&geom, &image, angle)?,
                None => rotate_to_north(&geom, &image, CoordSys::parse(&csys)?)?,
            };
            write_json(output.as_deref(), &out, pretty)?;
        }

        Command::Resample {
            input,
            reference,
            overrides,
            crval1,
            crval2,
            crota2,
            naxis1,
            naxis2,
            interpolation,
            tie_skip,
            output,
        } => {
            let image = read_image(&input)?;
            let reference: Option<ImageHeader> = reference.as_deref().map(read_json::<ImageHeader>).transpose()?;
            let mut geom_overrides: GeomOverrides = match overrides.as_deref() {
                Some(path) => read_json(path)?,
                None => GeomOverrides::default(),
            };
            geom_overrides.crval1 = crval1.or(geom_overrides.crval1);
            geom_overrides.crval2 = crval2.or(geom_overrides.crval2);
            geom_overrides.crota2 = crota2.or(geom_overrides.crota2);
            geom_overrides.naxis1 = naxis1.or(geom_overrides.naxis1);
            geom_overrides.naxis2 = naxis2.or(geom_overrides.naxis2);

            let geom = commands::geom_from_env(interpolation.as_deref(), tie_skip)?;
            let out = geom.resample(&image, reference.as_ref(), &geom_overrides)?;
            write_json(output.as_deref(), &out, pretty)?;
        }

        Command::Decimate {
            input,
            zoom,
            fuzz_level,
            colormap,
            output,
        } => {
            let doc: OverlayDocument = read_json(&input)?;
            let mut config = DrawerConfig::from_env();
            if let Some(fuzz) = fuzz_level {
                config.fuzz_level = fuzz;
            }
            config.colormap |= colormap;
            let out = commands::decimate_overlay(&doc, &config, zoom)?;
            write_json(output.as_deref(), &out, pretty)?;
        }

        Command::Render {
            input,
            zoom,
            no_decimate,
            colormap,
            data_type,
            output,
        } => {
            let doc: OverlayDocument = read_json(&input)?;
            let mut config = DrawerConfig::from_env();
            config.decimate &= !no_decimate;
            config.colormap |= colormap;
            let png = commands::render_overlay(&doc, config, zoom, DataType::from_str(&data_type))?;
            write_bytes(&output, &png)?;
            info!(path = %output.display(), "Wrote PNG");
        }
    }

    Ok(())
}
