//! Narrow phase against the tile grid
//!
//! The resolver samples cells around an entity and reports what it finds. It
//! never writes to the grid; clearing collected tiles is up to the listener.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, TraceRecord};
use super::tiles::{Layer, TileObject};
use super::vector::{Rect, Vector2};
use crate::config::SimConfig;
use crate::consts::EDGE_INSET;

/// Which probe found the tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
    /// Index into the entity's `collision_points`
    Sample(usize),
}

/// One entity sample point resting on a tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileContact {
    pub entity: EntityId,
    pub tile: TileObject,
    pub grid_x: i32,
    pub grid_y: i32,
    /// Id of the layer the tile belongs to
    pub layer: u32,
    pub side: Side,
    /// Pixel position that was sampled
    pub point: Vector2,
}

/// Samples tiles under an entity's probes
#[derive(Debug, Clone, Copy, Default)]
pub struct TileCollisionResolver {
    /// Record a `TraceRecord` per sampled cell on the entity
    pub tracing: bool,
}

impl TileCollisionResolver {
    pub fn new(tracing: bool) -> Self {
        Self { tracing }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.tracing())
    }

    /// Test every configured collision point at the entity's current position.
    ///
    /// Sets `is_in_contact` iff at least one point lands on a tile.
    pub fn check_collision(
        &self,
        layer: &Layer,
        entity: &mut Entity,
        out: &mut Vec<TileContact>,
    ) -> bool {
        self.begin(entity);
        self.check_points(layer, entity, out)
    }

    /// `check_collision` without resetting contact state or the trace first.
    ///
    /// Used after `check_motion` so both passes contribute to one tick's result.
    pub fn check_points(
        &self,
        layer: &Layer,
        entity: &mut Entity,
        out: &mut Vec<TileContact>,
    ) -> bool {
        let before = out.len();
        let origin = entity.position();
        let points: Vec<(Side, Vector2)> = entity
            .collision_points
            .iter()
            .enumerate()
            .map(|(i, p)| (Side::Sample(i), origin + p.offset))
            .collect();

        for (side, point) in points {
            let (gx, gy) = layer.cell_at(point);
            self.sample(layer, entity, side, point, gx, gy, out);
        }
        out.len() > before
    }

    /// Direction-gated check of the move from `position` to `candidate_position`.
    ///
    /// - right/left: the leading edge, one sample per tile row the body spans
    /// - up: the two top corners
    /// - down or still: the two bottom corners, scanning every row between the
    ///   old and new bottom edge and stopping at the first row with a blocking
    ///   tile; non-blocking tiles passed on the way are still reported
    ///
    /// Only rows inside the grid are visited.
    ///
    /// Also sets `grounded` when a bottom probe lands on a blocking tile.
    pub fn check_motion(
        &self,
        layer: &Layer,
        entity: &mut Entity,
        out: &mut Vec<TileContact>,
    ) -> bool {
        self.begin(entity);
        entity.grounded = false;

        let old = entity.bounding_box();
        let new = entity.candidate_box();
        let delta = entity.candidate_position - entity.position();

        if delta.x != 0.0 {
            let (side, x) = if delta.x > 0.0 {
                (Side::Right, new.right())
            } else {
                (Side::Left, new.x - EDGE_INSET)
            };
            let (_, row0) = layer.cell_at(Vector2::new(x, new.y));
            let (_, row1) = layer.cell_at(Vector2::new(x, new.bottom() - EDGE_INSET));
            for row in grid_rows(layer, row0, row1) {
                let y = new.y.max(row as f64 * layer.tile_height).min(new.bottom() - EDGE_INSET);
                let point = Vector2::new(x, y);
                let (gx, _) = layer.cell_at(point);
                self.sample(layer, entity, side, point, gx, row, out);
            }
        }

        if delta.y < 0.0 {
            let y = new.y - EDGE_INSET;
            let (_, gy) = layer.cell_at(Vector2::new(new.x, y));
            for (gx, point) in corner_cells(layer, &new, y) {
                self.sample(layer, entity, Side::Top, point, gx, gy, out);
            }
        } else {
            let (_, row0) = layer.cell_at(Vector2::new(new.x, old.bottom()));
            let (_, row1) = layer.cell_at(Vector2::new(new.x, new.bottom()));
            for row in grid_rows(layer, row0, row1) {
                let y = (row as f64 * layer.tile_height).max(old.bottom()).min(new.bottom());
                let before = out.len();
                for (gx, point) in corner_cells(layer, &new, y) {
                    self.sample(layer, entity, Side::Bottom, point, gx, row, out);
                }
                if out[before..].iter().any(|c| c.tile.blocking) {
                    entity.grounded = true;
                    break;
                }
            }
        }

        entity.is_in_contact
    }

    /// Pull the candidate position back so blocking tiles are not entered.
    ///
    /// Zeroes the velocity component along each blocked axis.
    pub fn clamp_motion(&self, layer: &Layer, entity: &mut Entity, contacts: &[TileContact]) {
        let offset = entity.bounding_box().min() - entity.position();
        let size = entity.bounding_box().size();
        let mut candidate = entity.candidate_position;

        for contact in contacts.iter().filter(|c| c.tile.blocking) {
            let cell = layer.cell_rect(contact.grid_x, contact.grid_y);
            match contact.side {
                Side::Bottom => {
                    candidate.y = candidate.y.min(cell.y - size.y - offset.y);
                    entity.velocity.y = entity.velocity.y.min(0.0);
                }
                Side::Top => {
                    candidate.y = candidate.y.max(cell.bottom() - offset.y);
                    entity.velocity.y = entity.velocity.y.max(0.0);
                }
                Side::Right => {
                    candidate.x = candidate.x.min(cell.x - size.x - offset.x);
                    entity.velocity.x = entity.velocity.x.min(0.0);
                }
                Side::Left => {
                    candidate.x = candidate.x.max(cell.right() - offset.x);
                    entity.velocity.x = entity.velocity.x.max(0.0);
                }
                Side::Sample(_) => {}
            }
        }

        entity.candidate_position = candidate;
    }

    fn begin(&self, entity: &mut Entity) {
        entity.is_in_contact = false;
        if self.tracing {
            entity.debug_trace.clear();
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn sample(
        &self,
        layer: &Layer,
        entity: &mut Entity,
        side: Side,
        point: Vector2,
        gx: i32,
        gy: i32,
        out: &mut Vec<TileContact>,
    ) {
        let tile = layer.get_tile(gx, gy).copied();
        if self.tracing {
            entity.debug_trace.push(TraceRecord {
                grid_x: gx,
                grid_y: gy,
                rect: layer.cell_rect(gx, gy),
                tile,
            });
        }
        if let Some(tile) = tile {
            entity.is_in_contact = true;
            out.push(TileContact {
                entity: entity.id(),
                tile,
                grid_x: gx,
                grid_y: gy,
                layer: layer.id,
                side,
                point,
            });
        }
    }
}

/// Rows `from..=to` that exist in the grid; empty when none do
fn grid_rows(layer: &Layer, from: i32, to: i32) -> std::ops::RangeInclusive<i32> {
    let last = i32::try_from(layer.height()).unwrap_or(i32::MAX) - 1;
    from.max(0)..=to.min(last)
}

/// Left and right corner samples at height `y`, one per distinct column
fn corner_cells(layer: &Layer, rect: &Rect, y: f64) -> Vec<(i32, Vector2)> {
    let mut cells: Vec<(i32, Vector2)> = Vec::with_capacity(2);
    for x in [rect.x, rect.right() - EDGE_INSET] {
        let point = Vector2::new(x, y);
        let (gx, _) = layer.cell_at(point);
        if cells.last().is_none_or(|&(last, _)| last != gx) {
            cells.push((gx, point));
        }
    }
    cells
}
