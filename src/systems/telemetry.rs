//! HUD telemetry polling
//!
//! The HUD never touches the physics world directly. It samples the active
//! vehicle's gear, speed and RPM at a fixed interval and holds on to the most
//! recent reading. A missing vehicle clears the reading instead of failing.

use std::time::Duration;

use log::debug;
use streetlevel_physics::{PhysicsWorldManager, VehicleState};

/// Samples one vehicle's telemetry at a fixed interval
#[derive(Clone, Debug)]
pub struct TelemetryPoller {
    interval: Duration,
    elapsed: Duration,
    vehicle_id: Option<String>,
    latest: Option<VehicleState>,
}

impl TelemetryPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            vehicle_id: None,
            latest: None,
        }
    }

    /// Follow a different vehicle (or none); the next tick polls immediately
    pub fn track(&mut self, vehicle_id: Option<String>) {
        self.vehicle_id = vehicle_id;
        self.latest = None;
        self.elapsed = self.interval;
    }

    pub fn vehicle_id(&self) -> Option<&str> {
        self.vehicle_id.as_deref()
    }

    /// Advance the poll clock by `dt`; returns true if a sample was taken
    pub fn tick(&mut self, manager: &PhysicsWorldManager, dt: Duration) -> bool {
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = Duration::ZERO;
        self.poll(manager);
        true
    }

    /// Sample now, regardless of the interval
    pub fn poll(&mut self, manager: &PhysicsWorldManager) -> Option<VehicleState> {
        self.latest = self
            .vehicle_id
            .as_deref()
            .and_then(|id| manager.try_get_vehicle(id));

        if let Some(state) = self.latest {
            debug!(
                "Telemetry: gear {} speed {:.1} m/s rpm {:.0}",
                state.gear, state.speed, state.rpm
            );
        }
        self.latest
    }

    /// Most recent sample, `None` if no vehicle is tracked or it has gone away
    pub fn latest(&self) -> Option<VehicleState> {
        self.latest
    }
}

impl Default for TelemetryPoller {
    fn default() -> Self {
        // 20 Hz
        Self::new(Duration::from_millis(50))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{UnitQuaternion, Vector3};
    use streetlevel_physics::{PhysicsConfig, VehicleSpec};

    fn manager_with_vehicle(id: &str) -> PhysicsWorldManager {
        let mut manager = PhysicsWorldManager::new(PhysicsConfig::default());
        let world = manager.acquire(true).unwrap();
        world
            .spawn_vehicle(id, Vector3::new(0.0, 1.0, 0.0), UnitQuaternion::identity(), VehicleSpec::default())
            .unwrap();
        manager
    }

    #[test]
    fn test_polls_at_interval() {
        let manager = manager_with_vehicle("taxi");
        let mut poller = TelemetryPoller::default();
        poller.track(Some("taxi".to_string()));

        // Tracking forces an immediate sample
        assert!(poller.tick(&manager, Duration::ZERO));
        assert!(poller.latest().is_some());

        assert!(!poller.tick(&manager, Duration::from_millis(20)));
        assert!(!poller.tick(&manager, Duration::from_millis(20)));
        assert!(poller.tick(&manager, Duration::from_millis(20)));
    }

    #[test]
    fn test_parked_vehicle_reads_idle() {
        let manager = manager_with_vehicle("taxi");
        let mut poller = TelemetryPoller::default();
        poller.track(Some("taxi".to_string()));

        let state = poller.poll(&manager).unwrap();
        assert_eq!(state.gear, 0);
        assert_eq!(state.rpm, VehicleSpec::default().gears.idle_rpm);
    }

    #[test]
    fn test_missing_vehicle_clears_reading() {
        let mut manager = manager_with_vehicle("taxi");
        let mut poller = TelemetryPoller::default();
        poller.track(Some("taxi".to_string()));
        poller.poll(&manager);
        assert!(poller.latest().is_some());

        manager.get_mut().unwrap().remove_vehicle("taxi");

        assert_eq!(poller.poll(&manager), None);
        assert_eq!(poller.latest(), None);
    }

    #[test]
    fn test_untracked_reads_nothing() {
        let manager = manager_with_vehicle("taxi");
        let mut poller = TelemetryPoller::default();

        assert!(poller.tick(&manager, Duration::from_millis(60)));
        assert_eq!(poller.latest(), None);
        assert_eq!(poller.vehicle_id(), None);
    }

    #[test]
    fn test_no_world_reads_nothing() {
        let manager = PhysicsWorldManager::default();
        let mut poller = TelemetryPoller::default();
        poller.track(Some("taxi".to_string()));

        assert_eq!(poller.poll(&manager), None);
    }
}
