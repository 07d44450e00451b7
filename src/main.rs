//! Streetlevel - headless driving demo
//!
//! Loads a city scene, extracts its colliders, drives a vehicle while the HUD
//! poller samples telemetry, then transitions into an interior scene.

use std::path::Path;
use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector3};

use streetlevel::config::AppConfig;
use streetlevel::systems::{PlayerInput, SimulationSystem, TelemetryPoller};
use streetlevel_physics::{PhysicsWorldManager, Stepper, VehicleControls};
use streetlevel_scene::{ColliderExtractor, SceneGraph, SceneTemplate};

/// Fixed frame time for the headless run
const FRAME: f32 = 1.0 / 60.0;

/// Main application state
struct App {
    /// Application configuration
    config: AppConfig,
    /// Owner of the physics world
    manager: PhysicsWorldManager,
    simulation: SimulationSystem,
    telemetry: TelemetryPoller,
    /// Collider prefix of the scene currently loaded
    active_prefix: Option<String>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let physics = config.to_physics_config();
        let simulation = SimulationSystem::new(Stepper::from_config(&physics));
        let telemetry = TelemetryPoller::new(config.telemetry.poll_interval());

        Self {
            manager: PhysicsWorldManager::new(physics),
            simulation,
            telemetry,
            active_prefix: None,
            config,
        }
    }

    /// Load a scene template and add its colliders; returns bodies created
    fn enter_scene(&mut self, path: &str) -> usize {
        let template = match SceneTemplate::load(Path::new(path)) {
            Ok(template) => template,
            Err(e) => {
                log::warn!("Failed to load scene '{}': {}", path, e);
                return 0;
            }
        };

        let prefix = if self.config.scene.collider_prefix.is_empty() {
            template.prefix().to_string()
        } else {
            self.config.scene.collider_prefix.clone()
        };

        let mut graph = SceneGraph::new();
        template.instantiate(&mut graph);

        let Some(world) = self.manager.get_mut() else {
            log::warn!("No physics world, skipping colliders for '{}'", template.name);
            return 0;
        };
        let report = ColliderExtractor::with_default_rules().extract_all(&graph, world, &prefix);
        log::info!(
            "Entered '{}': {} boxes, {} trimeshes, {} skipped",
            template.name,
            report.boxes,
            report.trimeshes,
            report.skipped
        );

        self.active_prefix = Some(prefix);
        report.created()
    }

    /// Remove the active scene's colliders
    fn leave_scene(&mut self) {
        if let Some(prefix) = self.active_prefix.take() {
            let removed = self.manager.remove_bodies_by_prefix(&prefix);
            log::info!("Left scene '{}' ({} bodies removed)", prefix, removed);
        }
    }

    fn spawn_vehicle(&mut self) -> Option<String> {
        let scene = &self.config.scene;
        let spec = self.config.vehicle.to_vehicle_spec();
        let world = self.manager.get_mut()?;

        match world.spawn_vehicle(
            &scene.vehicle_id,
            Vector3::from(scene.vehicle_spawn),
            UnitQuaternion::identity(),
            spec,
        ) {
            Ok(_) => Some(scene.vehicle_id.clone()),
            Err(e) => {
                log::error!("Failed to spawn vehicle '{}': {}", scene.vehicle_id, e);
                None
            }
        }
    }

    /// Run `seconds` of fixed frames with the given driver input
    fn drive(&mut self, controls: VehicleControls, seconds: f32) {
        if let Some(id) = self.telemetry.vehicle_id().map(str::to_string) {
            if let Err(e) = self.manager.set_vehicle_controls(&id, controls) {
                log::warn!("{}", e);
            }
        }

        let frames = (seconds / FRAME).round() as usize;
        let mut since_report = 0.0;
        for _ in 0..frames {
            self.simulation
                .update_with_delta(&mut self.manager, PlayerInput::default(), FRAME);
            self.telemetry
                .tick(&self.manager, Duration::from_secs_f32(FRAME));

            since_report += FRAME;
            if since_report >= 1.0 {
                since_report = 0.0;
                match self.telemetry.latest() {
                    Some(state) => log::info!(
                        "HUD: gear {:>2}  {:>5.1} m/s  {:>5.0} rpm",
                        state.gear,
                        state.speed,
                        state.rpm
                    ),
                    None => log::info!("HUD: no vehicle"),
                }
            }
        }
    }

    fn run(&mut self) {
        if self.manager.acquire(true).is_none() {
            log::error!("Failed to create the physics world");
            return;
        }

        let city = self.config.scene.path.clone();
        self.enter_scene(&city);

        let vehicle = self.spawn_vehicle();
        self.telemetry.track(vehicle);

        self.drive(VehicleControls::new(1.0, 0.0, 0.0), 6.0);
        self.drive(VehicleControls::new(0.0, 1.0, 0.0), 3.0);
        self.drive(VehicleControls::new(-1.0, 0.0, 0.2), 2.0);

        // Park and walk inside
        if let Some(world) = self.manager.get_mut() {
            let id = self.config.scene.vehicle_id.as_str();
            world.remove_vehicle(id);
        }
        self.telemetry.track(None);
        self.leave_scene();

        let interior = self.config.scene.interior_path.clone();
        self.enter_scene(&interior);
        let spawn = self.config.to_physics_config().player_spawn_vector();
        self.manager.teleport_player(spawn, UnitQuaternion::identity());
        self.drive(VehicleControls::default(), 2.0);

        if let Some(position) = self.manager.player_position() {
            log::info!("Player settled at ({:.2}, {:.2}, {:.2})", position.x, position.y, position.z);
        }

        self.leave_scene();
        self.manager.release();
    }
}

fn main() {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    // Initialize logging; RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    log::info!("Starting Streetlevel");

    let mut app = App::new(config);
    app.run();
}
