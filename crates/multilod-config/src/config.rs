//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use multilod_lod::{LodSettings, ManagerSettings};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Default per-object LOD settings.
    pub lod: LodSettings,
    /// Shared manager settings.
    pub manager: ManagerSettings,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Headless demo scene.
    pub demo: DemoConfig,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Seconds of simulated time between progress reports.
    pub report_interval_s: f64,
}

/// Demo scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of instanced patches scattered in the scene.
    pub object_count: u32,
    /// Instances per patch.
    pub instances_per_object: i64,
    /// Half-width of the square the patches are scattered over, in meters.
    pub field_half_extent_m: f64,
    /// Simulated frames to run.
    pub frames: u32,
    /// Simulated frame time in seconds.
    pub frame_time_s: f64,
    /// Camera speed in meters per second.
    pub camera_speed_m_s: f64,
    /// RNG seed for patch placement.
    pub seed: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            report_interval_s: 1.0,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            object_count: 64,
            instances_per_object: 2_000,
            field_half_extent_m: 150.0,
            frames: 1_800,
            frame_time_s: 1.0 / 60.0,
            camera_speed_m_s: 12.0,
            seed: 42,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

// --- Validation ---

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

impl Config {
    /// Check the invariants the LOD math relies on but never enforces itself.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lod = &self.lod;
        if !(lod.fade_speed.is_finite() && lod.fade_speed > 0.0) {
            return Err(invalid(
                "lod.fade_speed",
                format!("must be > 0, got {}", lod.fade_speed),
            ));
        }
        if !(lod.fade_exponent.is_finite() && lod.fade_exponent >= 0.0) {
            return Err(invalid(
                "lod.fade_exponent",
                format!("must be >= 0, got {}", lod.fade_exponent),
            ));
        }
        if lod.max_count >= 0 && lod.max_count < lod.min_count {
            return Err(invalid(
                "lod.max_count",
                format!("{} is below min_count {}", lod.max_count, lod.min_count),
            ));
        }
        if lod.use_screen_percentage {
            let finite = lod.min_ratio.is_finite() && lod.max_ratio.is_finite();
            if !(finite && lod.min_ratio > 0.0 && lod.max_ratio > lod.min_ratio) {
                return Err(invalid(
                    "lod.max_ratio",
                    format!(
                        "need 0 < min_ratio < max_ratio, got {} and {}",
                        lod.min_ratio, lod.max_ratio
                    ),
                ));
            }
        } else if !(lod.min_distance.is_finite() && lod.max_distance > lod.min_distance) {
            return Err(invalid(
                "lod.max_distance",
                format!(
                    "{} must exceed min_distance {}",
                    lod.max_distance, lod.min_distance
                ),
            ));
        }
        let fov = self.manager.fov_y_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(invalid(
                "manager.fov_y_degrees",
                format!("must be in (0, 180), got {fov}"),
            ));
        }
        let multiplier = self.manager.global_distance_multiplier;
        if !(multiplier.is_finite() && multiplier >= 0.0) {
            return Err(invalid("manager.global_distance_multiplier", "must be >= 0"));
        }
        Ok(())
    }
}
