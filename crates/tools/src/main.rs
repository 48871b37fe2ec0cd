mod scene;

use std::env;
use std::error::Error;
use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formats::SceneConfig;
use foundation::math::{GeodeticPoint, ProjectedPoint};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::scene::InputOverrides;

const CONFIG_ENV: &str = "GLIDER_CONFIG";

#[derive(Parser, Debug)]
#[command(author, version, about = "Build a 3D glider flight scene from a log, a DEM tile and a map")]
struct Args {
    /// Scene configuration (JSON). Falls back to $GLIDER_CONFIG, then to
    /// the built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build terrain and trajectory and write a scene package
    Build {
        /// Output directory
        #[arg(long, default_value = "out/scene")]
        out: PathBuf,

        /// Elevation raster (overrides the configuration)
        #[arg(long)]
        elevation: Option<PathBuf>,

        /// Trajectory log (overrides the configuration)
        #[arg(long)]
        trajectory: Option<PathBuf>,

        /// Overlay image recorded in the package (overrides the configuration)
        #[arg(long)]
        map_image: Option<PathBuf>,
    },

    /// Print trajectory statistics
    Stats {
        /// Trajectory log (overrides the configuration)
        #[arg(long)]
        trajectory: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Geodetic lon/lat (degrees) to projected x/y
    Project {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },

    /// Projected x/y to geodetic lon/lat (degrees)
    Unproject {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },

    /// Print the default configuration as JSON
    DefaultConfig,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config_path = config_path(args.config, env::var_os(CONFIG_ENV));

    match args.command {
        Command::DefaultConfig => {
            println!("{}", SceneConfig::default().to_json_pretty()?);
        }
        Command::Build {
            out,
            elevation,
            trajectory,
            map_image,
        } => {
            let mut config = load_config(config_path)?;
            InputOverrides {
                elevation,
                trajectory,
                map_image,
            }
            .apply(&mut config);
            cmd_build(&config, out)?;
        }
        Command::Stats { trajectory, json } => {
            let mut config = load_config(config_path)?;
            InputOverrides {
                trajectory,
                ..InputOverrides::default()
            }
            .apply(&mut config);
            cmd_stats(&config, json)?;
        }
        Command::Project { lon, lat } => {
            let transform = load_config(config_path)?.transform()?;
            let p = transform.geodetic_to_projected(GeodeticPoint::new(lon, lat));
            println!("{:.3} {:.3}", p.x, p.y);
        }
        Command::Unproject { x, y } => {
            let transform = load_config(config_path)?.transform()?;
            let g = transform.projected_to_geodetic(ProjectedPoint::new(x, y));
            println!("{:.8} {:.8}", g.lon_deg, g.lat_deg);
        }
    }

    Ok(())
}

/// `--config` wins over the environment variable.
fn config_path(flag: Option<PathBuf>, env_value: Option<OsString>) -> Option<PathBuf> {
    flag.or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
}

fn load_config(path: Option<PathBuf>) -> Result<SceneConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading scene configuration");
            Ok(SceneConfig::load(&path)?)
        }
        None => Ok(SceneConfig::default()),
    }
}

fn cmd_build(config: &SceneConfig, out: PathBuf) -> Result<(), Box<dyn Error>> {
    let grid = scene::load_grid(config)?;
    let trajectory = scene::load_trajectory(config)?;
    let built = scene::build_scene(config, &grid, &trajectory)?;
    let manifest_path = scene::write_scene(&out, config, &built)?;
    info!(manifest = %manifest_path.display(), "scene package written");
    println!("{}", manifest_path.display());
    Ok(())
}

fn cmd_stats(config: &SceneConfig, json: bool) -> Result<(), Box<dyn Error>> {
    let summary = scene::load_trajectory(config)?.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("samples:             {}", summary.samples);
    println!("duration:            {} s", summary.duration_s);
    println!(
        "altitude:            {:.1} .. {:.1} m",
        summary.min_altitude, summary.max_altitude
    );
    println!(
        "vertical speed:      {:.2} .. {:.2} m/s",
        summary.min_vertical_speed, summary.max_vertical_speed
    );
    Ok(())
}
