//! Layout store: the icon arrangement of the room currently being authored.

use log::debug;

use crate::escape::storage::{load_snapshot, save_snapshot_lossy, SharedStore, LAYOUT_KEY};
use crate::escape::types::{clamp_coordinate, IconType, PlacedItem};

pub struct LayoutStore {
    store: SharedStore,
}

impl LayoutStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Current layout; empty when nothing is stored or the snapshot is unreadable.
    pub fn load(&self) -> Vec<PlacedItem> {
        load_snapshot(self.store.as_ref(), LAYOUT_KEY).unwrap_or_default()
    }

    pub fn save(&self, items: &[PlacedItem]) {
        save_snapshot_lossy(self.store.as_ref(), LAYOUT_KEY, items);
    }

    pub fn get(&self, item_id: &str) -> Option<PlacedItem> {
        self.load().into_iter().find(|item| item.id == item_id)
    }

    /// Append a new icon at the canvas center and return it.
    pub fn add(&self, icon_type: IconType) -> PlacedItem {
        let mut items = self.load();
        let item = PlacedItem::new(icon_type);
        items.push(item.clone());
        self.save(&items);
        debug!("Layout: added {} {}", icon_type, item.id);
        item
    }

    /// Move an icon, clamping into the canvas. Returns the stored position,
    /// or `None` when the id is unknown.
    pub fn move_to(&self, item_id: &str, x: f64, y: f64) -> Option<(f64, f64)> {
        let mut items = self.load();
        let item = items.iter_mut().find(|item| item.id == item_id)?;
        let (x, y) = (clamp_coordinate(x), clamp_coordinate(y));
        if item.x == x && item.y == y {
            return Some((x, y));
        }
        item.x = x;
        item.y = y;
        self.save(&items);
        Some((x, y))
    }

    /// Remove an icon. Returns the removed item, `None` if it was not present.
    pub fn remove(&self, item_id: &str) -> Option<PlacedItem> {
        let mut items = self.load();
        let pos = items.iter().position(|item| item.id == item_id)?;
        let removed = items.remove(pos);
        self.save(&items);
        debug!("Layout: removed {} {}", removed.icon_type, removed.id);
        Some(removed)
    }

    pub fn clear(&self) {
        self.save(&[]);
    }
}
