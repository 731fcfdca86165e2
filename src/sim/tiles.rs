//! Tile grid layers
//!
//! Cells are stored column-major so `tiles[x][y]` addressing maps onto one flat
//! vector. Lookups outside the grid return `None`.

use serde::{Deserialize, Serialize};

use super::vector::{Rect, Vector2};
use crate::error::CoreError;

/// What a tile represents in the level data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Tile,
    Object,
    Item,
    Player,
    Enemy,
    Light,
}

/// Immutable tile description placed in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TileObject {
    /// Tileset index, for the renderer and game logic
    pub id: u32,
    pub kind: TileKind,
    /// Halts motion along the axis of approach
    pub blocking: bool,
    /// Removed from the grid by game logic when touched
    pub collectible: bool,
    pub climbable: bool,
    #[serde(default)]
    pub money: i32,
    #[serde(default)]
    pub damage: i32,
    #[serde(default)]
    pub energy: i32,
}

impl TileObject {
    /// Solid ground/wall tile
    pub fn solid(id: u32) -> Self {
        Self {
            id,
            kind: TileKind::Tile,
            blocking: true,
            ..Default::default()
        }
    }

    /// Collectible item worth `money`
    pub fn coin(id: u32, money: i32) -> Self {
        Self {
            id,
            kind: TileKind::Item,
            collectible: true,
            money,
            ..Default::default()
        }
    }

    /// Non-blocking tile that hurts on contact
    pub fn hazard(id: u32, damage: i32) -> Self {
        Self {
            id,
            kind: TileKind::Tile,
            damage,
            ..Default::default()
        }
    }

    pub fn ladder(id: u32) -> Self {
        Self {
            id,
            kind: TileKind::Tile,
            climbable: true,
            ..Default::default()
        }
    }

    pub fn is_hazard(&self) -> bool {
        self.damage > 0
    }
}

/// A rectangular grid of optional tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: u32,
    pub name: String,
    width: usize,
    height: usize,
    pub tile_width: f64,
    pub tile_height: f64,
    tiles: Vec<Option<TileObject>>,
}

impl Layer {
    /// Empty layer of `width` x `height` cells.
    ///
    /// Tile sizes must be positive and finite; `cell_at` divides by them.
    pub fn new(
        id: u32,
        name: &str,
        width: usize,
        height: usize,
        tile_width: f64,
        tile_height: f64,
    ) -> Result<Self, CoreError> {
        let valid = |s: f64| s.is_finite() && s > 0.0;
        if !(valid(tile_width) && valid(tile_height)) {
            return Err(CoreError::InvalidTileSize {
                width: tile_width,
                height: tile_height,
            });
        }
        Ok(Self {
            id,
            name: name.to_string(),
            width,
            height,
            tile_width,
            tile_height,
            tiles: vec![None; width * height],
        })
    }

    /// Build from text rows; `legend` maps characters to tiles, anything else is empty
    pub fn from_rows(
        id: u32,
        name: &str,
        rows: &[&str],
        tile_size: f64,
        legend: impl Fn(char) -> Option<TileObject>,
    ) -> Result<Self, CoreError> {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut layer = Self::new(id, name, width, height, tile_size, tile_size)?;
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                layer.set(x as i32, y as i32, legend(c));
            }
        }
        Ok(layer)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(x * self.height + y)
    }

    /// Tile at cell `(x, y)`, `None` for empty or out-of-range cells
    #[inline]
    pub fn get_tile(&self, x: i32, y: i32) -> Option<&TileObject> {
        self.index(x, y)
            .and_then(|i| self.tiles.get(i))
            .and_then(Option::as_ref)
    }

    /// Replace a cell; out-of-range writes are ignored. Returns the old tile.
    pub fn set(&mut self, x: i32, y: i32, tile: Option<TileObject>) -> Option<TileObject> {
        let i = self.index(x, y)?;
        std::mem::replace(self.tiles.get_mut(i)?, tile)
    }

    /// Clear a cell (collected item); returns what was there
    pub fn clear_tile(&mut self, x: i32, y: i32) -> Option<TileObject> {
        self.set(x, y, None)
    }

    /// Cell containing a pixel position
    #[inline]
    pub fn cell_at(&self, p: Vector2) -> (i32, i32) {
        (
            (p.x / self.tile_width).floor() as i32,
            (p.y / self.tile_height).floor() as i32,
        )
    }

    /// Pixel rectangle of a cell
    pub fn cell_rect(&self, x: i32, y: i32) -> Rect {
        Rect::new(
            x as f64 * self.tile_width,
            y as f64 * self.tile_height,
            self.tile_width,
            self.tile_height,
        )
    }

    /// Layer extent in pixels
    pub fn pixel_bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width as f64 * self.tile_width,
            self.height as f64 * self.tile_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn level() -> Layer {
        Layer::from_rows(
            1,
            "collision",
            &["....", "..$.", "####"],
            16.0,
            |c| match c {
                '#' => Some(TileObject::solid(1)),
                '$' => Some(TileObject::coin(2, 10)),
                _ => None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows_addresses_x_then_y() {
        let layer = level();
        assert_eq!(layer.width(), 4);
        assert_eq!(layer.height(), 3);
        assert!(layer.get_tile(2, 1).is_some_and(|t| t.collectible));
        assert!(layer.get_tile(0, 2).is_some_and(|t| t.blocking));
        assert!(layer.get_tile(1, 1).is_none());
    }

    #[test]
    fn test_cell_mapping() {
        let layer = level();
        assert_eq!(layer.cell_at(Vector2::new(15.9, 16.0)), (0, 1));
        assert_eq!(layer.cell_at(Vector2::new(-0.1, 0.0)), (-1, 0));
        assert_eq!(layer.cell_rect(2, 1), Rect::new(32.0, 16.0, 16.0, 16.0));
        assert_eq!(layer.pixel_bounds(), Rect::new(0.0, 0.0, 64.0, 48.0));
    }

    #[test]
    fn test_clear_tile() {
        let mut layer = level();
        let coin = layer.clear_tile(2, 1);
        assert_eq!(coin.map(|t| t.money), Some(10));
        assert!(layer.get_tile(2, 1).is_none());
        assert!(layer.clear_tile(2, 1).is_none());
        assert!(layer.clear_tile(99, 1).is_none());
    }

    #[test]
    fn test_rejects_degenerate_tile_size() {
        for (w, h) in [(0.0, 16.0), (16.0, -1.0), (f64::NAN, 16.0), (16.0, f64::INFINITY)] {
            assert!(matches!(
                Layer::new(0, "bad", 4, 4, w, h),
                Err(CoreError::InvalidTileSize { .. })
            ));
        }
        assert!(Layer::from_rows(0, "bad", &["#"], 0.0, |_| None).is_err());
        assert!(Layer::new(0, "ok", 0, 0, 8.0, 8.0).is_ok());
    }

    proptest! {
        #[test]
        fn prop_out_of_range_is_absent(x in -1000i32..1000, y in -1000i32..1000) {
            let layer = level();
            let inside = (0..4).contains(&x) && (0..3).contains(&y);
            if !inside {
                prop_assert!(layer.get_tile(x, y).is_none());
            }
        }
    }
}
