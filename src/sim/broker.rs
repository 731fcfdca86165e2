//! Entity-vs-entity broad and narrow phase

use std::collections::BTreeSet;

use super::entity::{Entity, EntityId, EntityStore};
use super::events::{CollisionContext, CollisionEvent, CollisionListener, EventQueue};
use super::quadtree::QuadTree;
use super::vector::{Rect, Vector2};
use crate::config::SimConfig;

/// Rebuilds the spatial index each tick and queues overlapping pairs
#[derive(Debug, Clone)]
pub struct CollisionBroker {
    index: QuadTree<EntityId>,
    queue: EventQueue,
    /// Ordered so event order only depends on ids
    collidables: BTreeSet<EntityId>,
    candidates: Vec<EntityId>,
}

impl CollisionBroker {
    pub fn new(bounds: Rect, max_objects: usize, max_depth: u32, capacity: usize) -> Self {
        Self {
            index: QuadTree::new(bounds, max_objects, max_depth),
            queue: EventQueue::new(capacity),
            collidables: BTreeSet::new(),
            candidates: Vec::new(),
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            config.world_bounds,
            config.max_objects_per_node,
            config.max_depth,
            config.event_capacity,
        )
    }

    /// Take part in pair detection from the next update on
    pub fn register(&mut self, id: EntityId) -> bool {
        self.collidables.insert(id)
    }

    pub fn unregister(&mut self, id: EntityId) -> bool {
        self.collidables.remove(&id)
    }

    pub fn is_registered(&self, id: EntityId) -> bool {
        self.collidables.contains(&id)
    }

    /// Rebuild the index and queue this tick's pair events.
    ///
    /// Events left over from the previous tick are discarded first. Registered
    /// ids that no longer exist in `entities` are pruned.
    pub fn update(&mut self, entities: &mut EntityStore) {
        self.index.clear();
        self.queue.clear();
        self.collidables.retain(|id| entities.get(*id).is_some());

        for id in &self.collidables {
            if let Some(e) = entities.get(*id).filter(|e| e.active) {
                self.index.insert(e.bounding_box(), *id);
            }
        }

        let mut hits = Vec::new();
        for &id in &self.collidables {
            let Some(primary) = entities.get(id).filter(|e| e.active) else {
                continue;
            };
            let bounds = primary.bounding_box();

            self.candidates.clear();
            self.index.retrieve(&mut self.candidates, &bounds);
            for &other in &self.candidates {
                if other == id {
                    continue;
                }
                let Some(secondary) = entities.get(other).filter(|e| e.active) else {
                    continue;
                };
                if !primary.collides_with_name(&secondary.name) {
                    continue;
                }
                if bounds.intersects(&secondary.bounding_box()) {
                    hits.push((id, other));
                    self.queue.push(CollisionEvent::EntityPair {
                        primary: id,
                        secondary: other,
                    });
                }
            }
        }

        for (a, b) in hits {
            if let Some(e) = entities.get_mut(a) {
                e.last_collider = Some(b);
            }
            if let Some(e) = entities.get_mut(b) {
                e.last_collider = Some(a);
            }
        }

        if self.queue.dropped() > 0 {
            log::debug!(
                "Event queue full: kept {}, dropped {}",
                self.queue.len(),
                self.queue.dropped()
            );
        }
    }

    /// Hand every queued event to `listener` once, in detection order.
    ///
    /// Returns the number of events delivered. The queue is empty afterwards.
    pub fn process_events(
        &mut self,
        listener: &mut dyn CollisionListener,
        ctx: &mut CollisionContext<'_>,
    ) -> usize {
        let mut delivered = 0;
        for event in self.queue.drain() {
            listener.collide(&event, ctx);
            delivered += 1;
        }
        delivered
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Events dropped by the last update
    pub fn dropped_events(&self) -> usize {
        self.queue.dropped()
    }

    pub fn index(&self) -> &QuadTree<EntityId> {
        &self.index
    }

    /// Registered ids in update order
    pub fn collidables(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.collidables.iter().copied()
    }
}

/// Push `a` out of `b` along the axis of shallower penetration.
///
/// Only `a` moves. Returns the translation applied, zero if the boxes do not
/// overlap.
pub fn resolve_penetration(a: &mut Entity, b: &Entity) -> Vector2 {
    let (ab, bb) = (a.bounding_box(), b.bounding_box());
    let overlap = ab.overlap(&bb);
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return Vector2::ZERO;
    }

    let (ca, cb) = (ab.center(), bb.center());
    let push = if overlap.x < overlap.y {
        let dir = if ca.x < cb.x { -1.0 } else { 1.0 };
        Vector2::new(dir * overlap.x, 0.0)
    } else {
        let dir = if ca.y < cb.y { -1.0 } else { 1.0 };
        Vector2::new(0.0, dir * overlap.y)
    };
    a.translate(push);
    push
}
