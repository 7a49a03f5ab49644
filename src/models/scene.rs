// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene state management.
//!
//! The scene is the ordered list of items (paint order, last is topmost)
//! plus the id counters. Counters live outside the item list so that ids
//! are never reused across undo/redo.

use super::item::{Item, ItemId};
use super::layer::LayerId;
use super::RasterId;

#[derive(Debug, Clone, Default)]
pub struct Scene {
    items: Vec<Item>,
    next_item: u64,
    next_layer: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_item_id(&mut self) -> ItemId {
        self.next_item += 1;
        ItemId(self.next_item)
    }

    pub fn next_layer_id(&mut self) -> LayerId {
        self.next_layer += 1;
        LayerId(self.next_layer)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Add an item on top of the paint order.
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let index = self.index_of(id)?;
        Some(self.items.remove(index))
    }

    /// Swap in a new version of an existing item, keeping its paint position.
    pub fn replace(&mut self, item: Item) -> bool {
        match self.get_mut(item.id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Move an item to the top of the paint order.
    pub fn bring_to_front(&mut self, id: ItemId) -> bool {
        match self.index_of(id) {
            Some(index) if index + 1 < self.items.len() => {
                let item = self.items.remove(index);
                self.items.push(item);
                true
            }
            _ => false,
        }
    }

    /// Replace the item list with a history snapshot.
    pub fn restore(&mut self, items: Vec<Item>) {
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn raster_ids(&self) -> impl Iterator<Item = RasterId> + '_ {
        self.items.iter().flat_map(|item| item.raster_ids())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::geometry::{Rect, Size};

    fn add(scene: &mut Scene) -> ItemId {
        let id = scene.next_item_id();
        scene.push(Item::new(
            id,
            RasterId(id.0),
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Size::new(10.0, 10.0),
        ));
        id
    }

    #[test]
    fn test_ids_are_not_reused_after_restore() {
        let mut scene = Scene::new();
        let a = add(&mut scene);
        let snapshot = scene.items().to_vec();
        let b = add(&mut scene);
        scene.restore(snapshot);
        let c = add(&mut scene);
        assert_ne!(b, c);
        assert_ne!(a, c);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_bring_to_front_reorders() {
        let mut scene = Scene::new();
        let a = add(&mut scene);
        let b = add(&mut scene);
        assert!(scene.bring_to_front(a));
        assert_eq!(scene.items()[1].id, a);
        assert_eq!(scene.items()[0].id, b);
        assert!(!scene.bring_to_front(a));
    }
}
