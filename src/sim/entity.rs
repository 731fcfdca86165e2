//! Simulated entities and the population that owns them
//!
//! Position, size and insets are private so the bounding box can never fall
//! out of sync with them. Everything the integrator and resolvers write each
//! tick is public.

use serde::{Deserialize, Serialize};

use super::material::Material;
use super::tiles::TileObject;
use super::vector::{Rect, Vector2};
use crate::error::CoreError;

/// Stable per-population entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// What an entity is, used to route collision events to game logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Item,
    Platform,
    Projectile,
    #[default]
    Generic,
}

/// How the integrator treats an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionPolicy {
    /// Never moved by the integrator
    Static,
    /// Moves by its velocity only, ignores forces
    Kinematic,
    /// Fully integrated: forces, gravity, mass
    #[default]
    Dynamic,
}

/// Margins between the sprite rectangle and the collision box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Insets {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// Named sample point, relative to the entity position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionPoint {
    pub name: String,
    pub offset: Vector2,
}

impl CollisionPoint {
    pub fn new(name: &str, offset: Vector2) -> Self {
        Self {
            name: name.to_string(),
            offset,
        }
    }

    /// Feet, head and flank probes for a body of the given size
    pub fn platformer_set(size: Vector2) -> Vec<Self> {
        vec![
            Self::new("feet-left", Vector2::new(1.0, size.y)),
            Self::new("feet-right", Vector2::new(size.x - 1.0, size.y)),
            Self::new("head", Vector2::new(size.x / 2.0, -1.0)),
            Self::new("left", Vector2::new(-1.0, size.y / 2.0)),
            Self::new("right", Vector2::new(size.x, size.y / 2.0)),
        ]
    }
}

/// One sampled cell, kept for the debug overlay
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub grid_x: i32,
    pub grid_y: i32,
    /// Pixel rectangle of the sampled cell
    pub rect: Rect,
    pub tile: Option<TileObject>,
}

/// Construction parameters for an entity
#[derive(Debug, Clone)]
pub struct EntityDesc {
    pub name: String,
    pub kind: EntityKind,
    pub position: Vector2,
    pub size: Vector2,
    pub insets: Insets,
    pub velocity: Vector2,
    pub mass: f64,
    pub material: Material,
    pub policy: MotionPolicy,
    /// Colon-separated name fragments, e.g. `"enemy:item"`
    pub collides_with: String,
    pub collision_points: Vec<CollisionPoint>,
    pub max_speed: Option<f64>,
}

impl Default for EntityDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: EntityKind::Generic,
            position: Vector2::ZERO,
            size: Vector2::new(16.0, 16.0),
            insets: Insets::default(),
            velocity: Vector2::ZERO,
            mass: 1.0,
            material: Material::default(),
            policy: MotionPolicy::Dynamic,
            collides_with: String::new(),
            collision_points: Vec::new(),
            max_speed: None,
        }
    }
}

/// A simulated object
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub policy: MotionPolicy,

    position: Vector2,
    size: Vector2,
    insets: Insets,
    bounding_box: Rect,

    /// Where the integrator wants to move; committed by the session
    pub candidate_position: Vector2,
    pub velocity: Vector2,
    pub acceleration: Vector2,
    /// One-shot forces, consumed by the next integration
    pub pending_forces: Vec<Vector2>,
    /// Optional speed cap applied after integration
    pub max_speed: Option<f64>,

    mass: f64,
    pub material: Material,

    /// Touched a tile during the last resolution pass
    pub is_in_contact: bool,
    /// Standing on a blocking tile
    pub grounded: bool,
    /// Inactive entities are skipped by the broker
    pub active: bool,
    /// Last entity this one collided with (for highlighting)
    pub last_collider: Option<EntityId>,

    collides_with: Vec<String>,
    pub collision_points: Vec<CollisionPoint>,
    /// Rebuilt on every tile check while tracing is enabled
    pub debug_trace: Vec<TraceRecord>,
}

impl Entity {
    /// Build an entity, rejecting non-physical parameters
    pub fn new(id: EntityId, desc: EntityDesc) -> Result<Self, CoreError> {
        if !desc.mass.is_finite() || desc.mass <= 0.0 {
            return Err(CoreError::InvalidMass { mass: desc.mass });
        }
        desc.material.validate()?;
        check_size(desc.size, &desc.insets)?;

        let mut entity = Self {
            id,
            name: desc.name,
            kind: desc.kind,
            policy: desc.policy,
            position: desc.position,
            size: desc.size,
            insets: desc.insets,
            bounding_box: Rect::default(),
            candidate_position: desc.position,
            velocity: desc.velocity,
            acceleration: Vector2::ZERO,
            pending_forces: Vec::new(),
            max_speed: desc.max_speed,
            mass: desc.mass,
            material: desc.material,
            is_in_contact: false,
            grounded: false,
            active: true,
            last_collider: None,
            collides_with: Vec::new(),
            collision_points: desc.collision_points,
            debug_trace: Vec::new(),
        };
        entity.set_collides_with(&desc.collides_with);
        entity.update_bounding_box();
        Ok(entity)
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Vector2 {
        self.position
    }

    #[inline]
    pub fn size(&self) -> Vector2 {
        self.size
    }

    #[inline]
    pub fn insets(&self) -> Insets {
        self.insets
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Collision box, always in sync with position, size and insets
    #[inline]
    pub fn bounding_box(&self) -> Rect {
        self.bounding_box
    }

    /// Collision box the entity would have at its candidate position
    pub fn candidate_box(&self) -> Rect {
        let offset = self.candidate_position - self.position;
        Rect {
            x: self.bounding_box.x + offset.x,
            y: self.bounding_box.y + offset.y,
            ..self.bounding_box
        }
    }

    /// Teleport; also resets the candidate so a stale one is never committed
    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
        self.candidate_position = position;
        self.update_bounding_box();
    }

    pub fn translate(&mut self, delta: Vector2) {
        self.set_position(self.position + delta);
    }

    pub fn set_size(&mut self, size: Vector2) -> Result<(), CoreError> {
        check_size(size, &self.insets)?;
        self.size = size;
        self.update_bounding_box();
        Ok(())
    }

    pub fn set_insets(&mut self, insets: Insets) -> Result<(), CoreError> {
        check_size(self.size, &insets)?;
        self.insets = insets;
        self.update_bounding_box();
        Ok(())
    }

    pub fn set_mass(&mut self, mass: f64) -> Result<(), CoreError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(CoreError::InvalidMass { mass });
        }
        self.mass = mass;
        Ok(())
    }

    /// Move to the candidate position computed by the integrator
    pub fn commit(&mut self) {
        let candidate = self.candidate_position;
        self.set_position(candidate);
    }

    /// Queue a one-shot force for the next integration
    pub fn add_force(&mut self, force: Vector2) {
        self.pending_forces.push(force);
    }

    /// Replace the collision whitelist from a colon-separated list
    pub fn set_collides_with(&mut self, tags: &str) {
        self.collides_with = tags
            .split(':')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
    }

    pub fn collides_with_tags(&self) -> &[String] {
        &self.collides_with
    }

    /// Whether any whitelist fragment occurs in `name`. Empty whitelist matches nothing.
    pub fn collides_with_name(&self, name: &str) -> bool {
        self.collides_with.iter().any(|tag| name.contains(tag.as_str()))
    }

    fn update_bounding_box(&mut self) {
        self.bounding_box = Rect::new(
            self.position.x + self.insets.left,
            self.position.y + self.insets.top,
            self.size.x - self.insets.left - self.insets.right,
            self.size.y - self.insets.top - self.insets.bottom,
        );
    }
}

fn check_size(size: Vector2, insets: &Insets) -> Result<(), CoreError> {
    let width = size.x - insets.left - insets.right;
    let height = size.y - insets.top - insets.bottom;
    if !(size.is_finite() && width > 0.0 && height > 0.0) {
        return Err(CoreError::InvalidSize);
    }
    Ok(())
}

/// Owns the entity population and hands out ids
///
/// Entities are kept sorted by id so iteration order is stable.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: Vec<Entity>,
    next_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and add the entity
    pub fn spawn(&mut self, desc: EntityDesc) -> Result<EntityId, CoreError> {
        let id = EntityId(self.next_id);
        let entity = Entity::new(id, desc)?;
        self.next_id += 1;
        log::trace!("Spawned {:?} `{}` ({:?})", id, entity.name, entity.kind);
        self.entities.push(entity);
        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(|i| &mut self.entities[i])
    }

    /// Look up an entity that must exist
    pub fn require(&self, id: EntityId) -> Result<&Entity, CoreError> {
        self.get(id).ok_or(CoreError::UnknownEntity(id))
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.index_of(id).map(|i| self.entities.remove(i))
    }

    /// Two distinct entities at once
    pub fn pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (lo, hi) = self.entities.split_at_mut(ib);
            Some((&mut lo[ia], &mut hi[0]))
        } else {
            let (lo, hi) = self.entities.split_at_mut(ia);
            Some((&mut hi[0], &mut lo[ib]))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> EntityDesc {
        EntityDesc {
            name: "player".to_string(),
            position: Vector2::new(10.0, 20.0),
            size: Vector2::new(16.0, 32.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_non_positive_mass() {
        for mass in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let d = EntityDesc { mass, ..desc() };
            assert!(matches!(
                Entity::new(EntityId(0), d),
                Err(CoreError::InvalidMass { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_insets_larger_than_body() {
        let d = EntityDesc {
            insets: Insets {
                left: 10.0,
                right: 10.0,
                ..Default::default()
            },
            ..desc()
        };
        assert!(matches!(Entity::new(EntityId(0), d), Err(CoreError::InvalidSize)));
    }

    #[test]
    fn test_rejects_invalid_material() {
        let mut d = desc();
        d.material.friction = 2.0;
        assert!(matches!(
            Entity::new(EntityId(0), d),
            Err(CoreError::InvalidMaterial { .. })
        ));
    }

    #[test]
    fn test_bounding_box_follows_mutators() {
        let d = EntityDesc {
            insets: Insets {
                top: 4.0,
                bottom: 0.0,
                left: 2.0,
                right: 2.0,
            },
            ..desc()
        };
        let mut e = Entity::new(EntityId(0), d).unwrap();
        assert_eq!(e.bounding_box(), Rect::new(12.0, 24.0, 12.0, 28.0));

        e.set_position(Vector2::new(0.0, 0.0));
        assert_eq!(e.bounding_box(), Rect::new(2.0, 4.0, 12.0, 28.0));

        e.translate(Vector2::new(5.0, -1.0));
        assert_eq!(e.bounding_box(), Rect::new(7.0, 3.0, 12.0, 28.0));

        e.set_size(Vector2::new(20.0, 20.0)).unwrap();
        assert_eq!(e.bounding_box(), Rect::new(7.0, 3.0, 16.0, 16.0));

        e.set_insets(Insets::default()).unwrap();
        assert_eq!(e.bounding_box(), Rect::new(5.0, -1.0, 20.0, 20.0));

        e.candidate_position = Vector2::new(8.0, 0.0);
        assert_eq!(e.candidate_box(), Rect::new(8.0, 0.0, 20.0, 20.0));
        e.commit();
        assert_eq!(e.position(), Vector2::new(8.0, 0.0));
        assert_eq!(e.bounding_box(), Rect::new(8.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn test_tag_whitelist_substring_match() {
        let mut e = Entity::new(EntityId(0), desc()).unwrap();
        assert!(!e.collides_with_name("enemy_3"));

        e.set_collides_with("enemy:item");
        assert_eq!(e.collides_with_tags(), ["enemy", "item"]);
        assert!(e.collides_with_name("enemy_3"));
        assert!(e.collides_with_name("item_gold"));
        assert!(!e.collides_with_name("platform_1"));

        e.set_collides_with("::");
        assert!(e.collides_with_tags().is_empty());
    }

    #[test]
    fn test_store_allocates_sequential_ids() {
        let mut store = EntityStore::new();
        let a = store.spawn(desc()).unwrap();
        let b = store.spawn(desc()).unwrap();
        assert_eq!(a, EntityId(0));
        assert_eq!(b, EntityId(1));

        // A failed spawn does not burn an id
        assert!(store.spawn(EntityDesc { mass: 0.0, ..desc() }).is_err());
        let c = store.spawn(desc()).unwrap();
        assert_eq!(c, EntityId(2));

        assert!(store.remove(b).is_some());
        assert!(store.get(b).is_none());
        assert!(matches!(store.require(b), Err(CoreError::UnknownEntity(id)) if id == b));
        assert_eq!(store.iter().map(|e| e.id()).collect::<Vec<_>>(), [a, c]);
    }

    #[test]
    fn test_pair_mut_is_order_independent() {
        let mut store = EntityStore::new();
        let a = store.spawn(desc()).unwrap();
        let b = store.spawn(desc()).unwrap();
        let (eb, ea) = store.pair_mut(b, a).unwrap();
        assert_eq!(eb.id(), b);
        assert_eq!(ea.id(), a);
        assert!(store.pair_mut(a, a).is_none());
    }
}
