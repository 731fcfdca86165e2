//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - No RNG
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod broker;
pub mod entity;
pub mod events;
pub mod integrator;
pub mod material;
pub mod quadtree;
pub mod tick;
pub mod tile_resolver;
pub mod tiles;
pub mod vector;
pub mod world;

pub use broker::{CollisionBroker, resolve_penetration};
pub use entity::{
    CollisionPoint, Entity, EntityDesc, EntityId, EntityKind, EntityStore, Insets, MotionPolicy,
    TraceRecord,
};
pub use events::{
    CollisionContext, CollisionEvent, CollisionListener, EventKind, EventQueue, ListenerRegistry,
};
pub use integrator::MotionIntegrator;
pub use material::{Material, MaterialRegistry, presets};
pub use quadtree::{QuadTree, Quadrant};
pub use tick::{Simulation, TickStats};
pub use tile_resolver::{Side, TileCollisionResolver, TileContact};
pub use tiles::{Layer, TileKind, TileObject};
pub use vector::{Rect, Vector2, VectorExt};
pub use world::World;
