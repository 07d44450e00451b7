//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`SL_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use nalgebra::Vector3;
use serde::{Serialize, Deserialize};
use std::path::Path;
use std::time::Duration;

use streetlevel_physics::{GearTable, VehicleSpec};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Physics and player configuration
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Vehicle dynamics and gear table
    #[serde(default)]
    pub vehicle: VehicleConfig,
    /// Scene loading configuration
    #[serde(default)]
    pub scene: SceneConfig,
    /// HUD telemetry polling
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`SL_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // SL_PHYSICS__GRAVITY=-20 -> physics.gravity = -20.0
        figment = figment.merge(Env::prefixed("SL_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }

    /// Physics crate config, with collider debugging taken from the debug section
    pub fn to_physics_config(&self) -> streetlevel_physics::PhysicsConfig {
        let physics = &self.physics;
        streetlevel_physics::PhysicsConfig {
            gravity: physics.gravity,
            max_delta: physics.max_delta,
            ground_height: physics.ground_height,
            player_spawn: physics.player_spawn,
            player_radius: physics.player_radius,
            player_half_height: physics.player_half_height,
            player_mass: physics.player_mass,
            jump_velocity: physics.jump_velocity,
            ground_probe_length: physics.ground_probe_length,
            debug_colliders: self.debug.show_colliders,
        }
    }
}

/// Physics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity (negative = downward)
    pub gravity: f32,
    /// Largest timestep one frame may inject (seconds)
    pub max_delta: f32,
    /// Ground plane Y position
    pub ground_height: f32,
    /// Player spawn position [x, y, z]
    pub player_spawn: [f32; 3],
    /// Player capsule radius
    pub player_radius: f32,
    /// Half height of the capsule's cylindrical part
    pub player_half_height: f32,
    /// Player mass (kg)
    pub player_mass: f32,
    /// Jump velocity
    pub jump_velocity: f32,
    /// How far below the feet the ground probe reaches
    pub ground_probe_length: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let defaults = streetlevel_physics::PhysicsConfig::default();
        Self {
            gravity: defaults.gravity,
            max_delta: defaults.max_delta,
            ground_height: defaults.ground_height,
            player_spawn: defaults.player_spawn,
            player_radius: defaults.player_radius,
            player_half_height: defaults.player_half_height,
            player_mass: defaults.player_mass,
            jump_velocity: defaults.jump_velocity,
            ground_probe_length: defaults.ground_probe_length,
        }
    }
}

/// Vehicle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Chassis half extents [x, y, z]
    pub chassis_half_extents: [f32; 3],
    /// Chassis mass (kg)
    pub mass: f32,
    pub wheel_radius: f32,
    pub wheel_friction: f32,
    /// Drive force at full throttle (N)
    pub engine_force: f32,
    /// Brake force at full brake (N)
    pub brake_force: f32,
    /// Yaw torque at full steer (N·m)
    pub steer_torque: f32,
    /// Speed at which steering reaches full authority (m/s)
    pub steer_reference_speed: f32,
    pub idle_rpm: f32,
    pub redline_rpm: f32,
    /// Reverse gear speed ceiling (m/s)
    pub reverse_max_speed: f32,
    /// Forward gear speed ceilings (m/s), ascending
    pub gear_max_speeds: Vec<f32>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        let spec = VehicleSpec::default();
        let he = spec.chassis_half_extents;
        Self {
            chassis_half_extents: [he.x, he.y, he.z],
            mass: spec.mass,
            wheel_radius: spec.wheel_radius,
            wheel_friction: spec.wheel_friction,
            engine_force: spec.engine_force,
            brake_force: spec.brake_force,
            steer_torque: spec.steer_torque,
            steer_reference_speed: spec.steer_reference_speed,
            idle_rpm: spec.gears.idle_rpm,
            redline_rpm: spec.gears.redline_rpm,
            reverse_max_speed: spec.gears.reverse_max_speed,
            gear_max_speeds: spec.gears.forward_max_speeds,
        }
    }
}

impl VehicleConfig {
    /// Convert to the physics crate's vehicle description
    pub fn to_vehicle_spec(&self) -> VehicleSpec {
        VehicleSpec {
            chassis_half_extents: Vector3::from(self.chassis_half_extents),
            mass: self.mass,
            wheel_radius: self.wheel_radius,
            wheel_friction: self.wheel_friction,
            engine_force: self.engine_force,
            brake_force: self.brake_force,
            steer_torque: self.steer_torque,
            steer_reference_speed: self.steer_reference_speed,
            gears: GearTable {
                reverse_max_speed: self.reverse_max_speed,
                forward_max_speeds: self.gear_max_speeds.clone(),
                idle_rpm: self.idle_rpm,
                redline_rpm: self.redline_rpm,
            },
        }
    }
}

/// Scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Path to the scene template loaded at startup (RON)
    pub path: String,
    /// Scene entered when the demo drive ends
    pub interior_path: String,
    /// Collider name prefix; the template's own prefix when empty
    pub collider_prefix: String,
    /// Vehicle spawned at startup
    pub vehicle_id: String,
    /// Where that vehicle is spawned [x, y, z]
    pub vehicle_spawn: [f32; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: "scenes/city.ron".to_string(),
            interior_path: "scenes/interior.ron".to_string(),
            collider_prefix: String::new(),
            vehicle_id: "taxi".to_string(),
            vehicle_spawn: [0.0, 1.0, 10.0],
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Poll interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
        }
    }
}

impl TelemetryConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Show physics colliders (debug builds only)
    pub show_colliders: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_colliders: false,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
