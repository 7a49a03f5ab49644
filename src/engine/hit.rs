// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Hit-testing and the selection set.
//!
//! Paint order is array order, so the topmost hit is the last matching item.
//! Handle grab radii are given in screen pixels and converted to world units
//! with the current scale, keeping the affordance a constant on-screen size.

use crate::models::item::{Item, ItemId};
use crate::util::geometry::{distance, handle_positions, Handle, Point, Rect};

/// Topmost item whose rectangle contains `point`.
pub fn item_at(point: Point, items: &[Item]) -> Option<ItemId> {
    items
        .iter()
        .rev()
        .find(|item| item.rect.contains(point))
        .map(|item| item.id)
}

/// Handle of `rect` within `margin_px` screen pixels of `point`.
///
/// When several handles are in range (small rectangles), the closest wins.
pub fn handle_at(
    rect: &Rect,
    point: Point,
    margin_px: f32,
    scale: f32,
    include_sides: bool,
) -> Option<Handle> {
    let margin = margin_px / scale;
    handle_positions(rect, include_sides)
        .into_iter()
        .map(|(handle, position)| (handle, distance(position, point)))
        .filter(|(_, d)| *d < margin)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(handle, _)| handle)
}

/// Items fully contained in `marquee`, in paint order.
pub fn items_in_rect(marquee: &Rect, items: &[Item]) -> Vec<ItemId> {
    items
        .iter()
        .filter(|item| marquee.contains_rect(&item.rect))
        .map(|item| item.id)
        .collect()
}

/// Ordered set of selected item ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: Vec<ItemId>,
}

impl Selection {
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The selected item when exactly one is selected.
    pub fn sole(&self) -> Option<ItemId> {
        match self.ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    /// Replace the selection. Returns whether it changed.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = ItemId>) -> bool {
        let mut next = Vec::new();
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        let changed = next != self.ids;
        self.ids = next;
        changed
    }

    /// Add ids not yet selected. Returns whether anything was added.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = ItemId>) -> bool {
        let before = self.ids.len();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
        self.ids.len() != before
    }

    pub fn toggle(&mut self, id: ItemId) {
        if let Some(index) = self.ids.iter().position(|&s| s == id) {
            self.ids.remove(index);
        } else {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: ItemId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&s| s != id);
        self.ids.len() != before
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    /// Drop ids that no longer exist in the scene.
    pub fn prune(&mut self, items: &[Item]) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| items.iter().any(|item| item.id == *id));
        self.ids.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RasterId;
    use crate::util::geometry::Size;

    fn item(id: u64, rect: Rect) -> Item {
        Item::new(ItemId(id), RasterId(id), rect, Size::new(rect.width, rect.height))
    }

    #[test]
    fn test_topmost_item_wins() {
        let items = vec![
            item(1, Rect::new(0.0, 0.0, 100.0, 100.0)),
            item(2, Rect::new(50.0, 50.0, 100.0, 100.0)),
        ];
        assert_eq!(item_at(Point::new(75.0, 75.0), &items), Some(ItemId(2)));
        assert_eq!(item_at(Point::new(10.0, 10.0), &items), Some(ItemId(1)));
        assert_eq!(item_at(Point::new(500.0, 10.0), &items), None);
    }

    #[test]
    fn test_handle_margin_scales_with_zoom() {
        let rect = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let near = Point::new(1010.0, 1010.0);
        // 14 world units away: inside 20px at scale 1, outside at scale 2.
        assert_eq!(handle_at(&rect, near, 20.0, 1.0, false), Some(Handle::BottomRight));
        assert_eq!(handle_at(&rect, near, 20.0, 2.0, false), None);
        assert_eq!(handle_at(&rect, near, 20.0, 0.5, false), Some(Handle::BottomRight));
    }

    #[test]
    fn test_side_handles_only_when_requested() {
        let rect = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let side = Point::new(1000.0, 500.0);
        assert_eq!(handle_at(&rect, side, 20.0, 1.0, false), None);
        assert_eq!(handle_at(&rect, side, 20.0, 1.0, true), Some(Handle::Right));
    }

    #[test]
    fn test_marquee_excludes_partial_overlap() {
        let items = vec![
            item(1, Rect::new(10.0, 10.0, 20.0, 20.0)),
            item(2, Rect::new(90.0, 90.0, 20.0, 20.0)),
            item(3, Rect::new(50.0, 10.0, 10.0, 10.0)),
        ];
        let marquee = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(items_in_rect(&marquee, &items), vec![ItemId(1), ItemId(3)]);
    }

    #[test]
    fn test_selection_operations() {
        let mut selection = Selection::default();
        assert!(selection.replace([ItemId(1), ItemId(1), ItemId(2)]));
        assert_eq!(selection.ids(), &[ItemId(1), ItemId(2)]);
        assert_eq!(selection.sole(), None);
        selection.toggle(ItemId(1));
        assert_eq!(selection.sole(), Some(ItemId(2)));
        assert!(!selection.extend([ItemId(2)]));
        assert!(selection.clear());
        assert!(!selection.clear());
    }
}
