//! Collision reporting
//!
//! Detection produces `CollisionEvent`s; game logic consumes them through a
//! `CollisionListener`. Every event is delivered at most once and never
//! outlives the tick that produced it.

use std::collections::HashMap;

use super::entity::{EntityId, EntityKind, EntityStore};
use super::tile_resolver::TileContact;
use super::tiles::Layer;
use super::world::World;

/// Event discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EntityPair,
    TileContact,
}

/// A detected contact
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEvent {
    /// `primary`'s box overlaps `secondary`'s and `primary` whitelists it
    EntityPair {
        primary: EntityId,
        secondary: EntityId,
    },
    /// A sample point of an entity landed on a tile
    TileContact(TileContact),
}

impl CollisionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CollisionEvent::EntityPair { .. } => EventKind::EntityPair,
            CollisionEvent::TileContact(_) => EventKind::TileContact,
        }
    }

    /// Entity the event is reported for
    pub fn primary(&self) -> EntityId {
        match self {
            CollisionEvent::EntityPair { primary, .. } => *primary,
            CollisionEvent::TileContact(contact) => contact.entity,
        }
    }
}

/// Fixed-capacity event buffer. Pushes past capacity are dropped.
#[derive(Debug, Clone)]
pub struct EventQueue {
    events: Vec<CollisionEvent>,
    capacity: usize,
    dropped: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Queue an event; returns false when it was dropped
    pub fn push(&mut self, event: CollisionEvent) -> bool {
        if self.events.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.events.push(event);
        true
    }

    /// Remove all events in insertion order
    pub fn drain(&mut self) -> std::vec::Drain<'_, CollisionEvent> {
        self.events.drain(..)
    }

    /// Empty the queue and reset the drop counter
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events dropped since the last `clear`
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Session state a listener may mutate while reacting to an event
pub struct CollisionContext<'a> {
    pub entities: &'a mut EntityStore,
    pub layer: Option<&'a mut Layer>,
    pub world: &'a mut World,
}

impl CollisionContext<'_> {
    pub fn layer_mut(&mut self) -> Option<&mut Layer> {
        self.layer.as_deref_mut()
    }
}

/// Game-logic callback
pub trait CollisionListener {
    fn collide(&mut self, event: &CollisionEvent, ctx: &mut CollisionContext<'_>);
}

struct FnListener<F>(F);

impl<F> CollisionListener for FnListener<F>
where
    F: FnMut(&CollisionEvent, &mut CollisionContext<'_>),
{
    fn collide(&mut self, event: &CollisionEvent, ctx: &mut CollisionContext<'_>) {
        (self.0)(event, ctx)
    }
}

/// Routes events to a listener chosen by the primary entity's kind
#[derive(Default)]
pub struct ListenerRegistry {
    by_kind: HashMap<EntityKind, Box<dyn CollisionListener>>,
    fallback: Option<Box<dyn CollisionListener>>,
    unrouted: usize,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener for events whose primary entity has `kind`
    pub fn register(&mut self, kind: EntityKind, listener: impl CollisionListener + 'static) {
        self.by_kind.insert(kind, Box::new(listener));
    }

    /// Closure form of `register`
    pub fn register_fn<F>(&mut self, kind: EntityKind, f: F)
    where
        F: FnMut(&CollisionEvent, &mut CollisionContext<'_>) + 'static,
    {
        self.register(kind, FnListener(f));
    }

    pub fn unregister(&mut self, kind: EntityKind) -> bool {
        self.by_kind.remove(&kind).is_some()
    }

    /// Listener for kinds without a dedicated one
    pub fn set_fallback(&mut self, listener: impl CollisionListener + 'static) {
        self.fallback = Some(Box::new(listener));
    }

    pub fn set_fallback_fn<F>(&mut self, f: F)
    where
        F: FnMut(&CollisionEvent, &mut CollisionContext<'_>) + 'static,
    {
        self.set_fallback(FnListener(f));
    }

    /// Events that found no listener (or whose entity was gone)
    pub fn unrouted(&self) -> usize {
        self.unrouted
    }
}

impl CollisionListener for ListenerRegistry {
    fn collide(&mut self, event: &CollisionEvent, ctx: &mut CollisionContext<'_>) {
        let Some(kind) = ctx.entities.get(event.primary()).map(|e| e.kind) else {
            log::trace!("Dropping {:?}: entity {:?} is gone", event.kind(), event.primary());
            self.unrouted += 1;
            return;
        };
        match self.by_kind.get_mut(&kind).or(self.fallback.as_mut()) {
            Some(listener) => listener.collide(event, ctx),
            None => {
                log::trace!("No listener for {:?}, dropping {:?}", kind, event.kind());
                self.unrouted += 1;
            }
        }
    }
}
