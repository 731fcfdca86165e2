//! Region quadtree for the entity broad phase
//!
//! Rebuilt from scratch every tick: `clear()` then `insert` every collidable.
//! An object lives in the deepest node whose single quadrant fully contains it;
//! objects straddling a midline stay at the parent and are returned for every
//! probe that reaches that node.

use super::vector::Rect;

/// Child slot of a node. Order matches the child array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopRight = 0,
    TopLeft = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopRight,
        Quadrant::TopLeft,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Quadrant of `bounds` that fully contains `rect` on both axes.
    ///
    /// `None` when the rect touches or crosses either midline; such objects are
    /// never assigned to a child.
    pub fn of(bounds: &Rect, rect: &Rect) -> Option<Quadrant> {
        let mid = bounds.center();
        let top = rect.y < mid.y && rect.bottom() < mid.y;
        let bottom = rect.y > mid.y;
        let left = rect.x < mid.x && rect.right() < mid.x;
        let right = rect.x > mid.x;

        match (top, bottom, left, right) {
            (true, _, _, true) => Some(Quadrant::TopRight),
            (true, _, true, _) => Some(Quadrant::TopLeft),
            (_, true, true, _) => Some(Quadrant::BottomLeft),
            (_, true, _, true) => Some(Quadrant::BottomRight),
            _ => None,
        }
    }

    /// Whether `probe` can intersect anything `of` would place in this quadrant.
    ///
    /// The test uses half-planes rather than the child's rectangle so objects
    /// lying outside the root bounds are still found.
    pub fn may_contain(self, bounds: &Rect, probe: &Rect) -> bool {
        let mid = bounds.center();
        let (vertical, horizontal) = match self {
            Quadrant::TopRight => (probe.y < mid.y, probe.right() > mid.x),
            Quadrant::TopLeft => (probe.y < mid.y, probe.x < mid.x),
            Quadrant::BottomLeft => (probe.bottom() > mid.y, probe.x < mid.x),
            Quadrant::BottomRight => (probe.bottom() > mid.y, probe.right() > mid.x),
        };
        vertical && horizontal
    }

    /// Sub-rectangle of `bounds` covered by this quadrant
    pub fn bounds_in(self, bounds: &Rect) -> Rect {
        let hw = bounds.width / 2.0;
        let hh = bounds.height / 2.0;
        let (x, y) = match self {
            Quadrant::TopRight => (bounds.x + hw, bounds.y),
            Quadrant::TopLeft => (bounds.x, bounds.y),
            Quadrant::BottomLeft => (bounds.x, bounds.y + hh),
            Quadrant::BottomRight => (bounds.x + hw, bounds.y + hh),
        };
        Rect::new(x, y, hw, hh)
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    bounds: Rect,
    depth: u32,
    items: Vec<(Rect, T)>,
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T: Copy> Node<T> {
    fn new(bounds: Rect, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, rect: Rect, item: T, max_objects: usize, max_depth: u32) {
        if let Some(children) = self.children.as_mut() {
            if let Some(q) = Quadrant::of(&self.bounds, &rect) {
                children[q.index()].insert(rect, item, max_objects, max_depth);
                return;
            }
        }

        self.items.push((rect, item));

        if self.items.len() > max_objects && self.depth < max_depth {
            let bounds = self.bounds;
            let depth = self.depth;
            let children = self.children.get_or_insert_with(|| {
                log::trace!("Quadtree split at depth {} ({:?})", depth, bounds);
                Box::new(Quadrant::ALL.map(|q| Node::new(q.bounds_in(&bounds), depth + 1)))
            });

            // Push down everything that now fits a child
            let items = std::mem::take(&mut self.items);
            for (r, it) in items {
                match Quadrant::of(&bounds, &r) {
                    Some(q) => children[q.index()].insert(r, it, max_objects, max_depth),
                    None => self.items.push((r, it)),
                }
            }
        }
    }

    fn retrieve(&self, out: &mut Vec<T>, probe: &Rect) {
        if let Some(children) = self.children.as_ref() {
            for q in Quadrant::ALL {
                if q.may_contain(&self.bounds, probe) {
                    children[q.index()].retrieve(out, probe);
                }
            }
        }
        out.extend(self.items.iter().map(|(_, it)| *it));
    }

    fn collect_bounds(&self, out: &mut Vec<Rect>) {
        out.push(self.bounds);
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.collect_bounds(out);
            }
        }
    }

    fn max_depth(&self) -> u32 {
        self.children
            .as_ref()
            .map(|c| c.iter().map(Node::max_depth).max().unwrap_or(self.depth))
            .unwrap_or(self.depth)
    }
}

/// Broad-phase index over axis-aligned boxes
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    root: Node<T>,
    max_objects: usize,
    max_depth: u32,
    len: usize,
}

impl<T: Copy> QuadTree<T> {
    /// Empty tree over `bounds`
    pub fn new(bounds: Rect, max_objects: usize, max_depth: u32) -> Self {
        Self {
            root: Node::new(bounds, 0),
            max_objects,
            max_depth,
            len: 0,
        }
    }

    /// Drop every node and object
    pub fn clear(&mut self) {
        self.root = Node::new(self.root.bounds, 0);
        self.len = 0;
    }

    pub fn insert(&mut self, rect: Rect, item: T) {
        self.root.insert(rect, item, self.max_objects, self.max_depth);
        self.len += 1;
    }

    /// Append every object that could overlap `probe` to `out`.
    ///
    /// Never misses an intersecting object; may return non-intersecting ones.
    pub fn retrieve<'a>(&self, out: &'a mut Vec<T>, probe: &Rect) -> &'a mut Vec<T> {
        self.root.retrieve(out, probe);
        out
    }

    /// Rectangles of every node, root first (debug overlay)
    pub fn node_bounds(&self) -> Vec<Rect> {
        let mut out = Vec::new();
        self.root.collect_bounds(&mut out);
        out
    }

    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    /// Deepest node currently allocated
    pub fn depth(&self) -> u32 {
        self.root.max_depth()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::vector::Vector2;
    use proptest::prelude::*;

    const WORLD: Rect = Rect::new(0.0, 0.0, 256.0, 256.0);

    fn small(x: f64, y: f64) -> Rect {
        Rect::new(x, y, 4.0, 4.0)
    }

    #[test]
    fn test_quadrant_of() {
        assert_eq!(Quadrant::of(&WORLD, &small(10.0, 10.0)), Some(Quadrant::TopLeft));
        assert_eq!(Quadrant::of(&WORLD, &small(200.0, 10.0)), Some(Quadrant::TopRight));
        assert_eq!(Quadrant::of(&WORLD, &small(10.0, 200.0)), Some(Quadrant::BottomLeft));
        assert_eq!(Quadrant::of(&WORLD, &small(200.0, 200.0)), Some(Quadrant::BottomRight));
    }

    #[test]
    fn test_midline_straddlers_have_no_quadrant() {
        // Crosses vertical midline, fits top half
        assert_eq!(Quadrant::of(&WORLD, &Rect::new(120.0, 10.0, 16.0, 4.0)), None);
        // Crosses horizontal midline, fits left half
        assert_eq!(Quadrant::of(&WORLD, &Rect::new(10.0, 120.0, 4.0, 16.0)), None);
        // Touches the midline exactly
        assert_eq!(Quadrant::of(&WORLD, &Rect::new(124.0, 10.0, 4.0, 4.0)), None);
        assert_eq!(Quadrant::of(&WORLD, &Rect::new(128.0, 10.0, 4.0, 4.0)), None);
    }

    #[test]
    fn test_split_after_threshold() {
        let mut tree = QuadTree::new(WORLD, 2, 4);
        tree.insert(small(10.0, 10.0), 1u32);
        tree.insert(small(200.0, 10.0), 2);
        assert_eq!(tree.node_bounds().len(), 1);

        tree.insert(small(10.0, 200.0), 3);
        let nodes = tree.node_bounds();
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[1], Rect::new(128.0, 0.0, 128.0, 128.0));
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_max_depth_stops_splitting() {
        let mut tree = QuadTree::new(WORLD, 1, 3);
        for i in 0..50u32 {
            tree.insert(small(1.0, 1.0), i);
        }
        assert_eq!(tree.depth(), 3);
        // 1 root + 3 levels of 4 children along one branch
        assert_eq!(tree.node_bounds().len(), 13);

        let mut out = Vec::new();
        tree.retrieve(&mut out, &small(1.0, 1.0));
        assert_eq!(out.len(), 50);
    }

    #[test]
    fn test_retrieve_prunes_other_quadrants() {
        let mut tree = QuadTree::new(WORLD, 1, 4);
        tree.insert(small(10.0, 10.0), 1u32);
        tree.insert(small(200.0, 10.0), 2);
        tree.insert(small(10.0, 200.0), 3);
        tree.insert(small(200.0, 200.0), 4);
        tree.insert(Rect::new(120.0, 120.0, 16.0, 16.0), 99);

        let mut out = Vec::new();
        tree.retrieve(&mut out, &small(12.0, 12.0));
        out.sort_unstable();
        // Own quadrant plus the root straddler
        assert_eq!(out, vec![1, 99]);
    }

    #[test]
    fn test_straddling_probe_reaches_touched_children() {
        let mut tree = QuadTree::new(WORLD, 1, 4);
        tree.insert(Rect::new(110.0, 10.0, 10.0, 10.0), 1u32);
        tree.insert(small(200.0, 200.0), 2);
        tree.insert(small(10.0, 200.0), 3);

        let mut out = Vec::new();
        tree.retrieve(&mut out, &Rect::new(115.0, 5.0, 40.0, 10.0));
        assert!(out.contains(&1));
        assert!(!out.contains(&2));
        assert!(!out.contains(&3));
    }

    #[test]
    fn test_clear_resets_tree() {
        let mut tree = QuadTree::new(WORLD, 1, 4);
        for i in 0..10u32 {
            tree.insert(small(i as f64 * 20.0, 5.0), i);
        }
        assert!(tree.node_bounds().len() > 1);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_bounds(), vec![WORLD]);
        let mut out = Vec::new();
        assert!(tree.retrieve(&mut out, &WORLD).is_empty());
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-40.0f64..296.0, -40.0f64..296.0, 0.0f64..48.0, 0.0f64..48.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_quadrants_partition_points(px in 0.0f64..256.0, py in 0.0f64..256.0) {
            let p = Vector2::new(px, py);
            let owners = Quadrant::ALL
                .iter()
                .filter(|q| q.bounds_in(&WORLD).contains_point(p))
                .count();
            prop_assert_eq!(owners, 1);
        }

        #[test]
        fn prop_assigned_quadrant_contains_rect(r in arb_rect()) {
            if let Some(q) = Quadrant::of(&WORLD, &r) {
                let mid = WORLD.center();
                // Never on both sides of a midline
                prop_assert!(r.right() < mid.x || r.x > mid.x);
                prop_assert!(r.bottom() < mid.y || r.y > mid.y);
                prop_assert!(q.may_contain(&WORLD, &r));
            }
        }

        #[test]
        fn prop_retrieve_has_no_false_negatives(rects in proptest::collection::vec(arb_rect(), 1..80)) {
            let mut tree = QuadTree::new(WORLD, 3, 5);
            for (i, r) in rects.iter().enumerate() {
                tree.insert(*r, i);
            }
            let mut out = Vec::new();
            for (a, ra) in rects.iter().enumerate() {
                out.clear();
                tree.retrieve(&mut out, ra);
                for (b, rb) in rects.iter().enumerate() {
                    if ra.intersects(rb) {
                        prop_assert!(out.contains(&b), "probe {} missed {}", a, b);
                    }
                }
            }
        }
    }
}
