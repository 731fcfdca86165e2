//! Force-based motion integration
//!
//! The integrator only ever writes `candidate_position`. The session commits it
//! after tile resolution has had a chance to clamp it.

use super::entity::{Entity, MotionPolicy};
use super::vector::{Vector2, VectorExt};
use super::world::World;
use crate::config::SimConfig;

/// Advances velocity and candidate position per motion policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionIntegrator {
    /// Frame delta to simulation step factor
    pub time_scale: f64,
    /// Snap threshold for velocity and candidate position
    pub epsilon: f64,
    /// Kinematic velocities below this stop
    pub kinematic_threshold: f64,
}

impl Default for MotionIntegrator {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

impl MotionIntegrator {
    pub fn new(time_scale: f64, epsilon: f64, kinematic_threshold: f64) -> Self {
        Self {
            time_scale,
            epsilon,
            kinematic_threshold,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.time_scale, config.epsilon, config.kinematic_threshold)
    }

    /// Integrate one entity over `dt` milliseconds
    pub fn integrate(&self, world: &World, entity: &mut Entity, dt: f64) {
        match entity.policy {
            MotionPolicy::Static => {}
            MotionPolicy::Kinematic => self.integrate_kinematic(entity),
            MotionPolicy::Dynamic => self.integrate_dynamic(world, entity, dt),
        }
    }

    fn integrate_kinematic(&self, entity: &mut Entity) {
        entity.pending_forces.clear();
        if entity.is_in_contact {
            entity.velocity *= entity.material.friction;
        }
        entity.velocity = entity.velocity.threshold(self.kinematic_threshold);
        entity.candidate_position = entity.position() + entity.velocity;
    }

    fn integrate_dynamic(&self, world: &World, entity: &mut Entity, dt: f64) {
        let t = dt * self.time_scale;

        let impulses: Vector2 = entity.pending_forces.drain(..).sum();
        let combined = impulses + world.external_forces();

        // Accumulates across ticks; mass and step both divide in here
        let mut acceleration =
            (entity.acceleration + world.gravity() + combined) / entity.mass() * t;
        if entity.is_in_contact {
            // Ground contact suppresses further acceleration, not existing velocity
            acceleration *= entity.material.friction;
        }
        entity.acceleration = acceleration;

        let mut velocity = (entity.velocity + acceleration * (t * t)).threshold(self.epsilon);
        if let Some(max) = entity.max_speed {
            velocity = velocity.clamp_length_max(max);
        }
        entity.velocity = velocity;

        entity.candidate_position =
            (entity.position() + velocity * (0.5 * t)).threshold(self.epsilon);
    }
}
