//! Vehicle simulation and derived telemetry
//!
//! A vehicle is a dynamic chassis body with four wheel colliders. The world
//! applies the stored controls before each step and updates an automatic
//! gearbox afterwards. Gear and speed are surfaced read-only; RPM is never
//! simulated, it is derived from speed and the gear table.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::body::{BodyDesc, BodyKey, BodyShape, ColliderAttachment};
use crate::collision::CollisionFilter;
use crate::error::PhysicsError;
use crate::world::PhysicsWorld;

/// Below this forward speed (m/s) a vehicle counts as stopped
pub const STOP_SPEED: f32 = 0.5;

/// Upshift once speed passes this fraction of the current gear's ceiling
const UPSHIFT_RATIO: f32 = 0.9;

/// Downshift once speed falls below this fraction of the lower gear's ceiling
const DOWNSHIFT_RATIO: f32 = 0.8;

/// Per-gear speed ceilings and the tachometer band
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearTable {
    /// Ceiling for gear -1 (m/s)
    pub reverse_max_speed: f32,
    /// Ceilings for gears 1..=N (m/s), ascending
    pub forward_max_speeds: Vec<f32>,
    pub idle_rpm: f32,
    pub redline_rpm: f32,
}

impl Default for GearTable {
    fn default() -> Self {
        Self {
            reverse_max_speed: 8.0,
            forward_max_speeds: vec![8.0, 16.0, 25.0, 35.0, 45.0],
            idle_rpm: 900.0,
            redline_rpm: 7000.0,
        }
    }
}

impl GearTable {
    /// Highest forward gear number
    pub fn top_gear(&self) -> i32 {
        self.forward_max_speeds.len() as i32
    }

    /// Speed ceiling for a gear
    ///
    /// Neutral and unknown gears fall back to the highest-gear ceiling.
    pub fn max_speed(&self, gear: i32) -> f32 {
        let highest = self
            .forward_max_speeds
            .last()
            .copied()
            .unwrap_or(self.reverse_max_speed);

        match gear {
            -1 => self.reverse_max_speed,
            g if g >= 1 => self
                .forward_max_speeds
                .get((g - 1) as usize)
                .copied()
                .unwrap_or(highest),
            _ => highest,
        }
    }
}

/// Derive engine RPM from speed and gear
///
/// `idle + (|speed| / ceiling) * (redline - idle)`, clamped to `[idle, redline]`.
/// An infinite speed saturates at redline; NaN reads as idle.
pub fn derive_rpm(speed: f32, gear: i32, table: &GearTable) -> f32 {
    let ceiling = table.max_speed(gear);
    if !(ceiling > 0.0) || speed.is_nan() {
        return table.idle_rpm;
    }

    let rpm = table.idle_rpm + (speed.abs() / ceiling) * (table.redline_rpm - table.idle_rpm);
    rpm.max(table.idle_rpm).min(table.redline_rpm)
}

/// Automatic gear selection from forward speed and throttle
pub fn select_gear(current: i32, speed: f32, throttle: f32, table: &GearTable) -> i32 {
    if speed < -STOP_SPEED || (throttle < 0.0 && speed <= STOP_SPEED) {
        return -1;
    }
    if speed.abs() <= STOP_SPEED && throttle <= 0.0 {
        return 0;
    }
    if table.top_gear() == 0 {
        return 0;
    }

    let mut gear = current.clamp(1, table.top_gear());
    while gear < table.top_gear() && speed > UPSHIFT_RATIO * table.max_speed(gear) {
        gear += 1;
    }
    while gear > 1 && speed < DOWNSHIFT_RATIO * table.max_speed(gear - 1) {
        gear -= 1;
    }
    gear
}

/// Physical parameters of a vehicle
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleSpec {
    pub chassis_half_extents: Vector3<f32>,
    /// Chassis mass (kg)
    pub mass: f32,
    pub wheel_radius: f32,
    pub wheel_friction: f32,
    /// Drive force at full throttle (N)
    pub engine_force: f32,
    /// Brake force at full brake (N)
    pub brake_force: f32,
    /// Yaw torque at full steer and reference speed (N·m)
    pub steer_torque: f32,
    /// Speed at which steering reaches full authority (m/s)
    pub steer_reference_speed: f32,
    pub gears: GearTable,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            chassis_half_extents: Vector3::new(0.9, 0.4, 2.1),
            mass: 1200.0,
            wheel_radius: 0.35,
            wheel_friction: 0.2,
            engine_force: 8000.0,
            brake_force: 12000.0,
            steer_torque: 4000.0,
            steer_reference_speed: 5.0,
            gears: GearTable::default(),
        }
    }
}

impl VehicleSpec {
    /// Wheel centers in chassis space: FL, FR, RL, RR
    pub fn wheel_offsets(&self) -> [Vector3<f32>; 4] {
        let he = self.chassis_half_extents;
        let x = he.x;
        let y = -he.y;
        let z = (he.z - self.wheel_radius).max(0.0);
        [
            Vector3::new(-x, y, z),
            Vector3::new(x, y, z),
            Vector3::new(-x, y, -z),
            Vector3::new(x, y, -z),
        ]
    }

    fn body_desc(&self, position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> BodyDesc {
        let mut desc = BodyDesc::dynamic(BodyShape::Cuboid {
            half_extents: self.chassis_half_extents,
        })
        .at(position)
        .with_rotation(rotation)
        .with_filter(CollisionFilter::VEHICLE_BODY)
        .with_mass(self.mass)
        .with_friction(0.3);

        for offset in self.wheel_offsets() {
            desc = desc.with_attachment(ColliderAttachment {
                shape: BodyShape::Ball {
                    radius: self.wheel_radius,
                },
                offset,
                filter: CollisionFilter::VEHICLE_WHEEL,
                friction: self.wheel_friction,
            });
        }
        desc
    }
}

/// Driver input, each axis clamped to its range
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleControls {
    /// -1.0 (full reverse) ..= 1.0 (full forward)
    pub throttle: f32,
    /// 0.0 ..= 1.0
    pub brake: f32,
    /// -1.0 (full left) ..= 1.0 (full right)
    pub steer: f32,
}

impl VehicleControls {
    pub fn new(throttle: f32, brake: f32, steer: f32) -> Self {
        Self {
            throttle: axis(throttle, -1.0),
            brake: axis(brake, 0.0),
            steer: axis(steer, -1.0),
        }
    }

    /// Copy with every axis forced back into range; NaN becomes 0
    pub fn clamped(self) -> Self {
        Self::new(self.throttle, self.brake, self.steer)
    }
}

fn axis(value: f32, min: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, 1.0)
    }
}

/// Read-only telemetry for one vehicle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// -1 = reverse, 0 = neutral, 1..N = forward
    pub gear: i32,
    /// Signed speed along the chassis forward axis (m/s)
    pub speed: f32,
    pub rpm: f32,
}

/// A registered vehicle
#[derive(Clone, Debug)]
pub struct Vehicle {
    pub(crate) body: BodyKey,
    pub(crate) spec: VehicleSpec,
    pub(crate) controls: VehicleControls,
    pub(crate) gear: i32,
    pub(crate) speed: f32,
}

impl Vehicle {
    pub fn state(&self) -> VehicleState {
        VehicleState {
            gear: self.gear,
            speed: self.speed,
            rpm: derive_rpm(self.speed, self.gear, &self.spec.gears),
        }
    }
}

/// Registry name of a vehicle's chassis body
pub fn vehicle_body_name(id: &str) -> String {
    format!("vehicle-{}", id)
}

impl PhysicsWorld {
    /// Spawn a vehicle, replacing any previous vehicle with the same id
    pub fn spawn_vehicle(
        &mut self,
        id: &str,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        spec: VehicleSpec,
    ) -> Result<BodyKey, PhysicsError> {
        self.remove_vehicle(id);

        let body = self.insert_body(vehicle_body_name(id), spec.body_desc(position, rotation))?;
        self.vehicles.insert(
            id.to_string(),
            Vehicle {
                body,
                spec,
                controls: VehicleControls::default(),
                gear: 0,
                speed: 0.0,
            },
        );
        log::info!("Spawned vehicle '{}'", id);
        Ok(body)
    }

    /// Remove a vehicle and its body; returns whether it existed
    pub fn remove_vehicle(&mut self, id: &str) -> bool {
        match self.vehicles.remove(id) {
            Some(vehicle) => {
                self.remove_body(vehicle.body);
                true
            }
            None => false,
        }
    }

    /// Store driver input for the next steps
    pub fn set_vehicle_controls(
        &mut self,
        id: &str,
        controls: VehicleControls,
    ) -> Result<(), PhysicsError> {
        let vehicle = self
            .vehicles
            .get_mut(id)
            .ok_or_else(|| PhysicsError::VehicleNotFound(id.to_string()))?;
        vehicle.controls = controls.clamped();
        Ok(())
    }

    /// Telemetry for a vehicle, `None` if it doesn't exist (yet)
    pub fn try_get_vehicle(&self, id: &str) -> Option<VehicleState> {
        self.vehicles.get(id).map(Vehicle::state)
    }

    /// Ids of all registered vehicles
    pub fn vehicle_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.vehicles.keys().map(String::as_str)
    }

    pub(crate) fn apply_vehicle_controls(&mut self) {
        for vehicle in self.vehicles.values() {
            let Some(record) = self.registry.get(vehicle.body) else {
                continue;
            };
            let Some(rb) = self.bodies.get_mut(record.handle) else {
                continue;
            };

            let spec = &vehicle.spec;
            let controls = vehicle.controls;
            let forward = rb.rotation() * Vector3::z();
            let speed = rb.linvel().dot(&forward);

            // Rev limiter: no drive past the ceiling of the direction's top gear
            let limit = if controls.throttle >= 0.0 {
                spec.gears.max_speed(spec.gears.top_gear())
            } else {
                spec.gears.reverse_max_speed
            };
            let drive = if speed.abs() < limit {
                controls.throttle * spec.engine_force
            } else {
                0.0
            };

            let mut force = forward * drive;
            if controls.brake > 0.0 && speed.abs() > 0.01 {
                force -= forward * (speed.signum() * controls.brake * spec.brake_force);
            }

            let authority = if spec.steer_reference_speed > 0.0 {
                (speed / spec.steer_reference_speed).clamp(-1.0, 1.0)
            } else {
                0.0
            };
            let torque = Vector3::y() * (-controls.steer * spec.steer_torque * authority);

            rb.reset_forces(true);
            rb.reset_torques(true);
            rb.add_force(force, true);
            rb.add_torque(torque, true);
        }
    }

    pub(crate) fn update_gearboxes(&mut self) {
        for vehicle in self.vehicles.values_mut() {
            let Some(record) = self.registry.get(vehicle.body) else {
                continue;
            };
            let Some(rb) = self.bodies.get(record.handle) else {
                continue;
            };

            let forward = rb.rotation() * Vector3::z();
            vehicle.speed = rb.linvel().dot(&forward);
            vehicle.gear = select_gear(
                vehicle.gear,
                vehicle.speed,
                vehicle.controls.throttle,
                &vehicle.spec.gears,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::PhysicsConfig;

    const EPSILON: f32 = 1.0e-3;

    #[test]
    fn test_rpm_idle_at_standstill() {
        let table = GearTable::default();
        for gear in -1..=table.top_gear() {
            assert!((derive_rpm(0.0, gear, &table) - table.idle_rpm).abs() < EPSILON);
        }
    }

    #[test]
    fn test_rpm_redline_at_gear_ceiling() {
        let table = GearTable::default();
        for gear in [-1, 1, 2, 3, 4, 5] {
            let rpm = derive_rpm(table.max_speed(gear), gear, &table);
            assert!((rpm - table.redline_rpm).abs() < EPSILON, "gear {}", gear);
        }
    }

    #[test]
    fn test_rpm_never_exceeds_redline() {
        let table = GearTable::default();
        for gear in -2..=7 {
            for speed in [-100.0, -8.0, 3.0, 44.9, 45.0, 1000.0, f32::INFINITY] {
                let rpm = derive_rpm(speed, gear, &table);
                assert!(rpm <= table.redline_rpm);
                assert!(rpm >= table.idle_rpm);
            }
        }
    }

    #[test]
    fn test_rpm_is_linear_within_gear() {
        let table = GearTable::default();
        let half = derive_rpm(table.max_speed(2) * 0.5, 2, &table);
        let expected = table.idle_rpm + 0.5 * (table.redline_rpm - table.idle_rpm);
        assert!((half - expected).abs() < EPSILON);
    }

    #[test]
    fn test_reverse_speed_uses_magnitude() {
        let table = GearTable::default();
        assert_eq!(derive_rpm(-4.0, -1, &table), derive_rpm(4.0, -1, &table));
    }

    #[test]
    fn test_unknown_gear_falls_back_to_highest_ceiling() {
        let table = GearTable::default();
        assert_eq!(table.max_speed(0), 45.0);
        assert_eq!(table.max_speed(9), 45.0);
        assert_eq!(table.max_speed(-3), 45.0);
        assert_eq!(derive_rpm(45.0, 9, &table), table.redline_rpm);
    }

    #[test]
    fn test_select_gear_neutral_when_stopped() {
        let table = GearTable::default();
        assert_eq!(select_gear(3, 0.0, 0.0, &table), 0);
        assert_eq!(select_gear(-1, 0.2, 0.0, &table), 0);
    }

    #[test]
    fn test_select_gear_reverse() {
        let table = GearTable::default();
        assert_eq!(select_gear(0, 0.0, -1.0, &table), -1);
        assert_eq!(select_gear(1, -2.0, 0.0, &table), -1);
    }

    #[test]
    fn test_select_gear_pulls_away_in_first() {
        let table = GearTable::default();
        assert_eq!(select_gear(0, 0.0, 1.0, &table), 1);
        assert_eq!(select_gear(-1, 0.1, 0.5, &table), 1);
    }

    #[test]
    fn test_select_gear_upshifts_and_downshifts() {
        let table = GearTable::default();
        // 0.9 * 8 = 7.2 -> second; 0.9 * 16 = 14.4 -> stays in second
        assert_eq!(select_gear(1, 10.0, 1.0, &table), 2);
        // Straight to the right gear even from first
        assert_eq!(select_gear(1, 40.0, 1.0, &table), 5);
        // 0.8 * 16 = 12.8 -> back down to second from fourth
        assert_eq!(select_gear(4, 12.0, 0.0, &table), 2);
    }

    #[test]
    fn test_controls_are_clamped() {
        let controls = VehicleControls::new(2.0, -1.0, -3.0);
        assert_eq!(controls, VehicleControls::new(1.0, 0.0, -1.0));
    }

    #[test]
    fn test_rpm_saturates_at_infinite_speed() {
        let table = GearTable::default();
        assert_eq!(derive_rpm(f32::INFINITY, 3, &table), table.redline_rpm);
        assert_eq!(derive_rpm(f32::NEG_INFINITY, -1, &table), table.redline_rpm);
        assert_eq!(derive_rpm(f32::NAN, 3, &table), table.idle_rpm);
    }

    #[test]
    fn test_nan_controls_become_neutral() {
        let controls = VehicleControls {
            throttle: f32::NAN,
            brake: f32::NAN,
            steer: f32::INFINITY,
        };
        assert_eq!(controls.clamped(), VehicleControls::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_out_of_range_controls_are_clamped_when_stored() {
        let mut world = PhysicsWorld::with_config(PhysicsConfig::new(-9.81));
        world.spawn_ground().unwrap();
        let spec = VehicleSpec::default();
        let rest_height = spec.chassis_half_extents.y + spec.wheel_radius + 0.05;
        for (id, x) in [("full", -10.0), ("overdriven", 10.0)] {
            world
                .spawn_vehicle(id, Vector3::new(x, rest_height, 0.0), UnitQuaternion::identity(), spec.clone())
                .unwrap();
        }

        world
            .set_vehicle_controls("full", VehicleControls::new(1.0, 0.0, 0.0))
            .unwrap();
        world
            .set_vehicle_controls(
                "overdriven",
                VehicleControls {
                    throttle: 5.0,
                    brake: 0.0,
                    steer: 0.0,
                },
            )
            .unwrap();
        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }

        let full = world.try_get_vehicle("full").unwrap().speed;
        let overdriven = world.try_get_vehicle("overdriven").unwrap().speed;
        assert!(full > STOP_SPEED, "speed={}", full);
        assert!((full - overdriven).abs() < 0.05, "{} vs {}", full, overdriven);
    }

    #[test]
    fn test_unknown_vehicle_is_absent() {
        let mut world = PhysicsWorld::new();
        assert!(world.try_get_vehicle("taxi").is_none());
        assert_eq!(
            world.set_vehicle_controls("taxi", VehicleControls::default()),
            Err(PhysicsError::VehicleNotFound("taxi".to_string()))
        );
        assert!(!world.remove_vehicle("taxi"));
    }

    #[test]
    fn test_spawned_vehicle_starts_in_neutral() {
        let mut world = PhysicsWorld::new();
        world
            .spawn_vehicle("taxi", Vector3::new(0.0, 1.0, 0.0), UnitQuaternion::identity(), VehicleSpec::default())
            .unwrap();

        let state = world.try_get_vehicle("taxi").unwrap();
        assert_eq!(state.gear, 0);
        assert_eq!(state.speed, 0.0);
        assert_eq!(state.rpm, GearTable::default().idle_rpm);
        assert_eq!(world.count_with_prefix("vehicle-taxi"), 1);
    }

    #[test]
    fn test_respawn_replaces_vehicle() {
        let mut world = PhysicsWorld::new();
        let spec = VehicleSpec::default();
        world
            .spawn_vehicle("taxi", Vector3::new(0.0, 1.0, 0.0), UnitQuaternion::identity(), spec.clone())
            .unwrap();
        world
            .spawn_vehicle("taxi", Vector3::new(5.0, 1.0, 0.0), UnitQuaternion::identity(), spec)
            .unwrap();

        assert_eq!(world.count_with_prefix("vehicle-"), 1);
        assert_eq!(world.vehicle_ids().count(), 1);
    }

    #[test]
    fn test_removing_body_by_prefix_drops_vehicle() {
        let mut world = PhysicsWorld::new();
        world
            .spawn_vehicle("taxi", Vector3::new(0.0, 1.0, 0.0), UnitQuaternion::identity(), VehicleSpec::default())
            .unwrap();

        world.remove_bodies_by_prefix("vehicle-");

        assert!(world.try_get_vehicle("taxi").is_none());
    }

    #[test]
    fn test_throttle_drives_forward_and_shifts_out_of_neutral() {
        let mut world = PhysicsWorld::with_config(PhysicsConfig::new(-9.81));
        world.spawn_ground().unwrap();
        let spec = VehicleSpec::default();
        let rest_height = spec.chassis_half_extents.y + spec.wheel_radius + 0.05;
        world
            .spawn_vehicle("taxi", Vector3::new(0.0, rest_height, 0.0), UnitQuaternion::identity(), spec)
            .unwrap();

        world
            .set_vehicle_controls("taxi", VehicleControls::new(1.0, 0.0, 0.0))
            .unwrap();
        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }

        let state = world.try_get_vehicle("taxi").unwrap();
        assert!(state.speed > STOP_SPEED, "speed={}", state.speed);
        assert!(state.gear >= 1);
        assert!(state.rpm > GearTable::default().idle_rpm);
    }

    #[test]
    fn test_negative_throttle_reverses() {
        let mut world = PhysicsWorld::with_config(PhysicsConfig::new(-9.81));
        world.spawn_ground().unwrap();
        let spec = VehicleSpec::default();
        let rest_height = spec.chassis_half_extents.y + spec.wheel_radius + 0.05;
        world
            .spawn_vehicle("taxi", Vector3::new(0.0, rest_height, 0.0), UnitQuaternion::identity(), spec)
            .unwrap();

        world
            .set_vehicle_controls("taxi", VehicleControls::new(-1.0, 0.0, 0.0))
            .unwrap();
        for _ in 0..90 {
            world.step(1.0 / 60.0);
        }

        let state = world.try_get_vehicle("taxi").unwrap();
        assert_eq!(state.gear, -1);
        assert!(state.speed < 0.0);
    }
}
