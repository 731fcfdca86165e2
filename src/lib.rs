//! tilephys - physics core for tile-grid platformers
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion integration, broad phase, tile contacts)
//! - `config`: Data-driven tuning, loadable from JSON
//! - `error`: Construction-time failures

pub mod config;
pub mod error;
pub mod sim;

pub use config::SimConfig;
pub use error::CoreError;
pub use sim::{
    CollisionBroker, CollisionContext, CollisionEvent, CollisionListener, Entity, EntityDesc,
    EntityId, EntityKind, EntityStore, Layer, ListenerRegistry, Material, MotionIntegrator,
    MotionPolicy, QuadTree, Rect, Simulation, TileCollisionResolver, TileKind, TileObject,
    Vector2, VectorExt, World,
};

/// Simulation constants
pub mod consts {
    /// Scales the caller's frame delta (milliseconds) into simulation units.
    ///
    /// Visual speed depends on this together with the squared step used for
    /// velocity, so retune both if either changes.
    pub const TIME_SCALE: f64 = 0.06;
    /// Components smaller than this snap to zero after integration
    pub const EPSILON: f64 = 0.005;
    /// Kinematic velocities below this are treated as stopped
    pub const KINEMATIC_THRESHOLD: f64 = 0.01;

    /// Default world extent used by the broad phase
    pub const WORLD_WIDTH: f64 = 4096.0;
    pub const WORLD_HEIGHT: f64 = 4096.0;

    /// Quadtree split threshold
    pub const MAX_OBJECTS_PER_NODE: usize = 10;
    /// Quadtree recursion ceiling
    pub const MAX_DEPTH: u32 = 5;

    /// Pair events kept per tick; the rest are dropped
    pub const EVENT_CAPACITY: usize = 500;

    /// Debug level above which tile sampling leaves a trace on the entity
    pub const TRACE_THRESHOLD: u8 = 2;

    /// Default gravity (y grows downward)
    pub const GRAVITY: f64 = 0.981;

    /// Keeps right/bottom edge samples inside the body's own cells
    pub const EDGE_INSET: f64 = 0.01;
}
