//! Headless demo: a camera flies across a field of instanced patches while
//! each patch fades its visible instance count with distance.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p multilod-demo -- --objects 128 --fade-speed 2`.

mod clock;
mod scene;

use std::path::PathBuf;

use clap::Parser;
use glam::DVec3;
use multilod_config::{CliArgs, Config};
use multilod_lod::{LodManager, LodObjectId, MultiMeshLod};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{info, warn};

use clock::FrameClock;
use scene::{FieldPatch, scatter_patches};

const MIN_FRAME_TIME: f64 = 1.0 / 1000.0;

struct DemoState {
    manager: LodManager,
    objects: Vec<MultiMeshLod<FieldPatch>>,
    camera: DVec3,
    velocity: DVec3,
    next_report: f64,
    report_interval: f64,
}

impl DemoState {
    fn new(config: &Config) -> Self {
        let mut manager = LodManager::new(config.manager.clone());
        let mut objects: Vec<_> = scatter_patches(&config.demo)
            .into_iter()
            .enumerate()
            .map(|(i, patch)| {
                MultiMeshLod::new(LodObjectId::new(i as u64), patch, config.lod.clone())
            })
            .collect();
        for object in &mut objects {
            object.activate(&mut manager);
        }
        info!(
            "Registered {} instanced objects ({} instances each)",
            manager.registered_count(),
            config.demo.instances_per_object
        );

        let start = -2.0 * config.demo.field_half_extent_m;
        Self {
            manager,
            objects,
            camera: DVec3::new(start, 2.0, 0.0),
            velocity: DVec3::new(config.demo.camera_speed_m_s, 0.0, 0.0),
            next_report: 0.0,
            report_interval: config.debug.report_interval_s.max(0.01),
        }
    }

    fn update(&mut self, dt: f64, sim_time: f64) {
        self.camera += self.velocity * dt;

        for object in &mut self.objects {
            if self.manager.is_registered(object.id()) {
                object.process_data(self.camera);
            }
        }
        for object in &mut self.objects {
            object.process(dt, &mut self.manager);
        }

        if sim_time >= self.next_report {
            self.report(sim_time);
            self.next_report += self.report_interval;
        }
    }

    /// Publish a new global multiplier and push it to every registered object.
    /// Unregistered objects pick it up when they are next activated.
    fn publish_multiplier(&mut self, multiplier: f64) {
        self.manager.set_global_distance_multiplier(multiplier);
        for object in &mut self.objects {
            if self.manager.is_registered(object.id()) {
                object.update_multiplier_from_manager(&self.manager);
            }
        }
        info!("Published global distance multiplier {multiplier}");
    }

    fn totals(&self) -> (i64, i64, usize) {
        self.objects.iter().fold((0, 0, 0), |(visible, target, shown), o| {
            (
                visible + o.visible_count(),
                target + o.target_count(),
                shown + usize::from(o.is_visible()),
            )
        })
    }

    fn report(&self, sim_time: f64) {
        let (visible, target, shown) = self.totals();
        info!(
            "t={:>5.1}s camera.x={:>7.1} visible={} target={} shown={}/{}",
            sim_time,
            self.camera.x,
            visible,
            target,
            shown,
            self.objects.len()
        );
    }
}

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join("multilod"))
            .unwrap_or_else(|| PathBuf::from(".multilod"))
    });

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    multilod_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        warn!("{e}; using default LOD and manager settings");
        config.lod = Default::default();
        config.manager = Default::default();
    }

    let mut state = DemoState::new(&config);
    let frame_time_s = config.demo.frame_time_s.max(MIN_FRAME_TIME);
    let mut clock = FrameClock::new(frame_time_s);
    let mut jitter = Xoshiro256StarStar::seed_from_u64(config.demo.seed ^ 0x5eed);

    let frames = config.demo.frames;
    let base_multiplier = config.manager.global_distance_multiplier;
    for frame in 0..frames {
        // Exercise the lifecycle: shrink the LOD range, drop one object, then bring both back.
        if frame == frames / 3 {
            state.publish_multiplier(base_multiplier * 0.5);
        }
        if frame == frames / 2
            && let Some(first) = state.objects.first_mut()
        {
            first.deactivate(&mut state.manager);
            info!("Deactivated {}", first.id());
        }
        if frame == frames * 3 / 4 {
            state.publish_multiplier(base_multiplier);
            if let Some(first) = state.objects.first_mut() {
                first.activate(&mut state.manager);
                info!("Reactivated {}", first.id());
            }
        }

        let frame_time = frame_time_s * jitter.gen_range(0.5..1.5);
        clock.tick(frame_time, |dt, sim_time| state.update(dt, sim_time));
    }

    let (visible, target, shown) = state.totals();
    if visible != target {
        warn!("Finished with {visible} visible instances still converging toward {target}");
    }
    info!(
        "Simulated {} updates over {:.1}s: {} of {} objects shown, {} instances visible",
        clock.update_count(),
        clock.total_sim_time(),
        shown,
        state.objects.len(),
        visible
    );
}
