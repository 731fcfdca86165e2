//! Simulation session and the fixed-order tick
//!
//! One tick runs, strictly in order:
//! 1. motion integration for every entity
//! 2. tile resolution against the candidate position, clamp, commit
//! 3. broad-phase rebuild and pair detection
//! 4. dispatch: tile contacts first, then queued pair events
//!
//! `tick` must not be called concurrently with itself or with entity mutation
//! from another thread. Nothing here locks.

use super::broker::CollisionBroker;
use super::entity::{Entity, EntityDesc, EntityId, EntityStore, MotionPolicy};
use super::events::{CollisionContext, CollisionEvent, CollisionListener, ListenerRegistry};
use super::integrator::MotionIntegrator;
use super::material::MaterialRegistry;
use super::tile_resolver::{TileCollisionResolver, TileContact};
use super::tiles::Layer;
use super::vector::{Rect, Vector2};
use super::world::World;
use crate::config::SimConfig;
use crate::error::CoreError;

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub tile_contacts: usize,
    pub pair_events: usize,
    /// Pair events lost to queue overflow
    pub dropped: usize,
}

/// Owns everything that outlives a tick
pub struct Simulation {
    config: SimConfig,
    pub world: World,
    pub entities: EntityStore,
    /// Collision layer; without one, tile resolution is skipped
    pub layer: Option<Layer>,
    pub materials: MaterialRegistry,
    pub listeners: ListenerRegistry,

    integrator: MotionIntegrator,
    resolver: TileCollisionResolver,
    broker: CollisionBroker,
    tile_contacts: Vec<TileContact>,
    tick_count: u64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        log::info!(
            "Simulation created: bounds {}x{}, capacity {}, tracing {}",
            config.world_bounds.width,
            config.world_bounds.height,
            config.event_capacity,
            config.tracing()
        );
        Self {
            world: World::new(Vector2::new(0.0, config.gravity)),
            entities: EntityStore::new(),
            layer: None,
            materials: MaterialRegistry::with_presets(),
            listeners: ListenerRegistry::new(),
            integrator: MotionIntegrator::from_config(&config),
            resolver: TileCollisionResolver::from_config(&config),
            broker: CollisionBroker::from_config(&config),
            tile_contacts: Vec::new(),
            tick_count: 0,
            config,
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.set_layer(layer);
        self
    }

    /// Attach a collision layer, returning the previous one
    pub fn set_layer(&mut self, layer: Layer) -> Option<Layer> {
        log::info!(
            "Layer `{}` attached ({}x{} cells)",
            layer.name,
            layer.width(),
            layer.height()
        );
        self.layer.replace(layer)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Add an entity; it takes part in pair detection until told otherwise
    pub fn spawn(&mut self, desc: EntityDesc) -> Result<EntityId, CoreError> {
        let id = self.entities.spawn(desc)?;
        self.broker.register(id);
        Ok(id)
    }

    /// Spawn with a material looked up by name in the registry
    pub fn spawn_with_material(
        &mut self,
        desc: EntityDesc,
        material: &str,
    ) -> Result<EntityId, CoreError> {
        let material = self
            .materials
            .get(material)
            .cloned()
            .ok_or_else(|| CoreError::InvalidMaterial {
                name: material.to_string(),
                reason: "not registered",
            })?;
        self.spawn(EntityDesc { material, ..desc })
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.broker.unregister(id);
        self.entities.remove(id)
    }

    /// Include or exclude an entity from pair detection
    pub fn set_collidable(&mut self, id: EntityId, collidable: bool) -> Result<(), CoreError> {
        self.entities.require(id)?;
        if collidable {
            self.broker.register(id);
        } else {
            self.broker.unregister(id);
        }
        Ok(())
    }

    /// Advance by `dt` milliseconds
    pub fn tick(&mut self, dt: f64) -> TickStats {
        for entity in self.entities.iter_mut() {
            self.integrator.integrate(&self.world, entity, dt);
        }

        self.tile_contacts.clear();
        for entity in self.entities.iter_mut() {
            if entity.policy == MotionPolicy::Static {
                continue;
            }
            if let Some(layer) = &self.layer {
                let start = self.tile_contacts.len();
                let moving = self
                    .resolver
                    .check_motion(layer, entity, &mut self.tile_contacts);
                if self.config.clamp_blocking {
                    self.resolver
                        .clamp_motion(layer, entity, &self.tile_contacts[start..]);
                }
                entity.commit();
                let sampled = self
                    .resolver
                    .check_points(layer, entity, &mut self.tile_contacts);
                entity.is_in_contact = moving || sampled;
            } else {
                entity.commit();
            }
        }

        self.broker.update(&mut self.entities);

        let stats = TickStats {
            tile_contacts: self.tile_contacts.len(),
            pair_events: self.broker.queue().len(),
            dropped: self.broker.dropped_events(),
        };

        let mut ctx = CollisionContext {
            entities: &mut self.entities,
            layer: self.layer.as_mut(),
            world: &mut self.world,
        };
        for contact in self.tile_contacts.drain(..) {
            self.listeners
                .collide(&CollisionEvent::TileContact(contact), &mut ctx);
        }
        self.broker.process_events(&mut self.listeners, &mut ctx);

        self.tick_count += 1;
        if stats.dropped > 0 {
            log::debug!("Tick {}: {:?}", self.tick_count, stats);
        }
        stats
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn broker(&self) -> &CollisionBroker {
        &self.broker
    }

    /// Quadtree node rectangles from the last tick (debug overlay)
    pub fn debug_nodes(&self) -> Vec<Rect> {
        self.broker.index().node_bounds()
    }
}
