//! Physics world lifecycle
//!
//! One [`PhysicsWorldManager`] is owned by the application and passed by
//! reference to every consumer. It holds at most one world at a time and
//! counts the owners that asked for it with `create_body = true`; the world is
//! disposed when the last of them releases it.

use log::{error, info};

use crate::debug::DebugVisualizer;
use crate::world::{PhysicsConfig, PhysicsWorld};

/// Owner of the single simulation world
pub struct PhysicsWorldManager {
    config: PhysicsConfig,
    world: Option<PhysicsWorld>,
    ref_count: usize,
    debug: Option<DebugVisualizer>,
}

impl PhysicsWorldManager {
    /// Create a manager; no world exists until the first `acquire(true)`
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            world: None,
            ref_count: 0,
            debug: None,
        }
    }

    /// Get the world, creating it on first authoritative request
    ///
    /// - world exists: returns it, counting one more owner only if `create_body`
    /// - no world, `create_body`: builds the world with ground plane and player
    ///   body, attaches the debug visualizer in debug builds
    /// - no world, `!create_body`: returns `None` and changes nothing
    pub fn acquire(&mut self, create_body: bool) -> Option<&mut PhysicsWorld> {
        if self.world.is_some() {
            if create_body {
                self.ref_count += 1;
            }
            return self.world.as_mut();
        }
        if !create_body {
            return None;
        }

        let mut world = PhysicsWorld::with_config(self.config.clone());
        if let Err(e) = world.spawn_ground().and_then(|_| world.spawn_player()) {
            error!("Failed to bootstrap physics world: {}", e);
            return None;
        }

        if cfg!(debug_assertions) && self.config.debug_colliders {
            let mut debug = DebugVisualizer::new();
            debug.update(&world);
            self.debug = Some(debug);
        }

        info!(
            "Created physics world (gravity {}, max delta {}s)",
            self.config.gravity, self.config.max_delta
        );
        self.ref_count = 1;
        self.world = Some(world);
        self.world.as_mut()
    }

    /// Drop one owner; disposes the world when none are left
    ///
    /// Extra releases are ignored, the count never goes below zero.
    pub fn release(&mut self) {
        if self.ref_count == 0 {
            return;
        }

        self.ref_count -= 1;
        if self.ref_count == 0 {
            if let Some(world) = self.world.take() {
                info!("Disposed physics world ({} bodies)", world.body_count());
            }
            self.debug = None;
        }
    }

    /// The world, if one exists; never creates one
    pub fn get(&self) -> Option<&PhysicsWorld> {
        self.world.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut PhysicsWorld> {
        self.world.as_mut()
    }

    /// Number of authoritative owners
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    pub fn is_active(&self) -> bool {
        self.world.is_some()
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// The debug visualizer, present only in debug builds with colliders enabled
    pub fn debug_visualizer(&self) -> Option<&DebugVisualizer> {
        self.debug.as_ref()
    }

    pub(crate) fn refresh_debug(&mut self) {
        if let (Some(world), Some(debug)) = (self.world.as_ref(), self.debug.as_mut()) {
            debug.update(world);
        }
    }
}

impl Default for PhysicsWorldManager {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}
