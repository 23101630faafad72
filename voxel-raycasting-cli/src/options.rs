use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use nalgebra_glm::Vec3;

/// Workaround for parsing the different log level
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// CLI interface for voxelising CAD scenes and casting rays into them.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// The log level
    #[arg(short, value_enum, long, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// The voxel configuration file
    #[arg(short, long)]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

/// The query to run against the voxelised scene.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Prints statistics about the scene and its voxel grid
    Info,

    /// Finds the nearest triangle hit by a ray
    Hit {
        /// The origin of the ray, e.g., `1,2,1`
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        origin: Vec3,

        /// The direction of the ray, e.g., `1,0,0`
        #[arg(long, value_parser = parse_direction, allow_hyphen_values = true)]
        direction: Vec3,

        /// A triangle to skip
        #[arg(long)]
        ignore: Option<u32>,
    },

    /// Tests whether a point lies inside the scene
    Inside {
        /// The point to test, e.g., `2,1.5,3`
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        point: Vec3,
    },

    /// Tests whether the straight path between two points is free
    Visible {
        /// The start of the path
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        begin: Vec3,

        /// The end of the path
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        end: Vec3,
    },

    /// Writes the flattened voxel buffer for compute devices
    Export {
        /// The output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Parses a comma separated triple of numbers.
fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|e| format!("{}: {}", v, e)))
        .collect::<Result<Vec<f32>, String>>()?;

    match values.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("Expected three comma separated values, got '{}'", s)),
    }
}

/// Parses a comma separated triple of numbers that is usable as ray direction.
fn parse_direction(s: &str) -> Result<Vec3, String> {
    let dir = parse_vec3(s)?;

    if dir.iter().all(|x| x.is_finite()) && dir != Vec3::zeros() {
        Ok(dir)
    } else {
        Err(format!("'{}' is not a valid ray direction", s))
    }
}

impl Options {
    /// Dumps the options to the log.
    pub fn dump_to_log(&self) {
        info!("Log Level: {:?}", self.log_level);
        info!("Config file: {:?}", self.config);
        info!("Command: {:?}", self.command);
    }
}
