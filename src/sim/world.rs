//! Persistent world forces
//!
//! Gravity is just the force named `"gravity"`; removing it gives zero-g.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::vector::Vector2;

/// Name under which gravity is stored
pub const GRAVITY_KEY: &str = "gravity";

/// Named forces acting on every dynamic entity
///
/// A `BTreeMap` keeps summation order stable between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    forces: BTreeMap<String, Vector2>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Vector2::new(0.0, crate::consts::GRAVITY))
    }
}

impl World {
    pub fn new(gravity: Vector2) -> Self {
        let mut forces = BTreeMap::new();
        forces.insert(GRAVITY_KEY.to_string(), gravity);
        Self { forces }
    }

    /// World without gravity
    pub fn zero_gravity() -> Self {
        Self {
            forces: BTreeMap::new(),
        }
    }

    /// Current gravity, zero when removed
    pub fn gravity(&self) -> Vector2 {
        self.force(GRAVITY_KEY).unwrap_or(Vector2::ZERO)
    }

    pub fn set_gravity(&mut self, gravity: Vector2) {
        self.add_force(GRAVITY_KEY, gravity);
    }

    /// Add or replace a named force (wind, currents, ...)
    pub fn add_force(&mut self, name: &str, force: Vector2) {
        self.forces.insert(name.to_string(), force);
    }

    pub fn remove_force(&mut self, name: &str) -> Option<Vector2> {
        self.forces.remove(name)
    }

    pub fn force(&self, name: &str) -> Option<Vector2> {
        self.forces.get(name).copied()
    }

    /// Sum of every force, gravity included
    pub fn total(&self) -> Vector2 {
        self.forces.values().copied().sum()
    }

    /// Sum of every force except gravity
    pub fn external_forces(&self) -> Vector2 {
        self.forces
            .iter()
            .filter(|(name, _)| name.as_str() != GRAVITY_KEY)
            .map(|(_, f)| *f)
            .sum()
    }

    /// Force names in summation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.forces.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_is_a_named_force() {
        let world = World::new(Vector2::new(0.0, 2.0));
        assert_eq!(world.force("gravity"), Some(Vector2::new(0.0, 2.0)));
        assert_eq!(world.total(), Vector2::new(0.0, 2.0));
        assert_eq!(world.external_forces(), Vector2::ZERO);
    }

    #[test]
    fn test_named_forces_sum() {
        let mut world = World::new(Vector2::new(0.0, 1.0));
        world.add_force("wind", Vector2::new(0.5, 0.0));
        world.add_force("current", Vector2::new(0.25, -0.5));
        assert_eq!(world.total(), Vector2::new(0.75, 0.5));
        assert_eq!(world.external_forces(), Vector2::new(0.75, -0.5));
        assert_eq!(world.names().collect::<Vec<_>>(), ["current", "gravity", "wind"]);

        world.add_force("wind", Vector2::new(-0.5, 0.0));
        assert_eq!(world.external_forces(), Vector2::new(-0.25, -0.5));
    }

    #[test]
    fn test_removing_gravity_gives_zero_g() {
        let mut world = World::default();
        assert!(world.gravity().y > 0.0);
        assert!(world.remove_force(GRAVITY_KEY).is_some());
        assert_eq!(world.gravity(), Vector2::ZERO);
        assert_eq!(world.total(), Vector2::ZERO);
        world.set_gravity(Vector2::new(0.0, -1.0));
        assert_eq!(world.gravity(), Vector2::new(0.0, -1.0));
        assert_eq!(World::zero_gravity().total(), Vector2::ZERO);
    }
}
