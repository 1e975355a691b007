//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// multilod command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "multilod", about = "Distance-driven instance LOD")]
pub struct CliArgs {
    /// Fraction of the remaining instance gap closed per second.
    #[arg(long)]
    pub fade_speed: Option<f64>,

    /// Exponent shaping the distance-to-count curve.
    #[arg(long)]
    pub fade_exponent: Option<f64>,

    /// Global distance multiplier published by the manager.
    #[arg(long)]
    pub distance_multiplier: Option<f64>,

    /// Vertical camera field of view in degrees.
    #[arg(long)]
    pub fov: Option<f64>,

    /// Number of instanced objects in the demo scene.
    #[arg(long)]
    pub objects: Option<u32>,

    /// Number of simulated frames.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(speed) = args.fade_speed {
            self.lod.fade_speed = speed;
        }
        if let Some(exponent) = args.fade_exponent {
            self.lod.fade_exponent = exponent;
        }
        if let Some(multiplier) = args.distance_multiplier {
            self.manager.global_distance_multiplier = multiplier;
        }
        if let Some(fov) = args.fov {
            self.manager.fov_y_degrees = fov;
        }
        if let Some(objects) = args.objects {
            self.demo.object_count = objects;
        }
        if let Some(frames) = args.frames {
            self.demo.frames = frames;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
