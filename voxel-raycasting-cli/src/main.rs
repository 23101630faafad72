use std::{fs::File, io::BufWriter, path::PathBuf, time::Instant};

use anyhow::Result;
use clap::Parser;
use log::{error, info, LevelFilter};
use options::{Command, Options};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use voxel_raycasting::{load_scenes, math::Ray, spatial::VoxelStorage, VoxelConfig, VoxelisedScene};

mod options;

/// Initializes the program logging
///
/// # Arguments
/// * `filter` - The log level filter, i.e., the minimum log level to be logged.
fn initialize_logging(filter: LevelFilter) {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    builder.filter_level(filter).init();
}

/// Expands the glob patterns of the configuration into the list of files to load. Unreadable
/// entries are skipped.
///
/// # Arguments
/// * `patterns` - The glob patterns for the CAD files.
fn expand_input_files(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(err) => {
                error!("Invalid input pattern '{}': {:?}", pattern, err);
                return Err(err.into());
            }
        };

        for entry in paths {
            match entry {
                Ok(path) => files.push(path),
                Err(err) => {
                    error!("Failed to read entry: {:?}", err);
                    info!("Skipping entry...");
                }
            }
        }
    }

    Ok(files)
}

/// Prints the scene and voxel grid information.
///
/// # Arguments
/// * `voxelised` - The voxelised scene to print the information for.
fn print_scene_info(voxelised: &VoxelisedScene) {
    let scene = voxelised.scene();
    let grid = voxelised.grid();
    let non_empty = grid.cells().iter().filter(|c| !c.is_empty()).count();

    info!("Scene information:");
    info!("  - Number of triangles: {}", scene.triangles().len());
    info!("  - Number of vertices: {}", scene.vertices().len());
    info!("  - Scene bounds: {}", scene.aabb());
    info!("Voxel grid information:");
    info!("  - Grid bounds: {}", grid.aabb());
    info!("  - Cells per axis: {}", grid.side());
    info!("  - Non-empty cells: {} of {}", non_empty, grid.cells().len());
    info!("  - Triangle references: {}", grid.num_references());
}

/// Runs the program.
///
/// # Arguments
/// * `options` - The program options.
fn run_program(options: Options) -> Result<()> {
    let config = VoxelConfig::read(File::open(&options.config)?)?;

    let t = Instant::now();
    let files = expand_input_files(&config.input)?;
    let scene = load_scenes(&files, config.surface)?;
    info!(
        "Loaded {} CAD files in {} ms",
        files.len(),
        t.elapsed().as_secs_f64() * 1e3f64
    );

    let t = Instant::now();
    let voxelised = VoxelisedScene::from_config(scene, &config)?;
    info!("Voxelised scene in {} ms", t.elapsed().as_secs_f64() * 1e3f64);

    match options.command {
        Command::Info => print_scene_info(&voxelised),
        Command::Hit {
            origin,
            direction,
            ignore,
        } => {
            let ray = Ray::new(origin, direction);
            match voxelised.nearest_hit(&ray, ignore) {
                Some(hit) => info!(
                    "Hit triangle {} at t={} (u={}, v={}), point {:?}",
                    hit.triangle,
                    hit.t(),
                    hit.hit.u,
                    hit.hit.v,
                    ray.at(hit.t())
                ),
                None => info!("No hit"),
            }
        }
        Command::Inside { point } => {
            let mut rng = match config.seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_os_rng(),
            };

            let inside = voxelised.is_inside(&point, &mut rng)?;
            let state = if inside { "inside" } else { "outside" };
            info!("Point {:?} is {}", point, state);
        }
        Command::Visible { begin, end } => {
            let visible = voxelised.is_visible(&begin, &end, None);
            let state = if visible { "free" } else { "blocked" };
            info!("Path from {:?} to {:?} is {}", begin, end, state);
        }
        Command::Export { output } => {
            let flat = voxelised.flatten();
            flat.write(BufWriter::new(File::create(&output)?))?;
            info!(
                "Wrote {} words of voxel data to {}",
                flat.data().len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn main() {
    let options = Options::parse();
    initialize_logging(options.log_level.into());
    options.dump_to_log();

    match run_program(options) {
        Ok(_) => {
            info!("Program completed successfully");
        }
        Err(err) => {
            error!("Program failed: {:?}", err);
            std::process::exit(1);
        }
    }
}
