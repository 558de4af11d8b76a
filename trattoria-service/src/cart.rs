//! Order cart assembled while browsing the menu.
//!
//! Quantities are keyed by a composite tag such as `course-1` or `menu-3`.
//! The cart never talks to the database; a snapshot of its entries is what a
//! reservation submission carries.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Course,
    Menu,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Debug)]
pub struct CartKey {
    pub item_type: ItemType,
    pub id: i32,
}

impl CartKey {
    pub fn course(id: i32) -> Self {
        Self {
            item_type: ItemType::Course,
            id,
        }
    }

    pub fn menu(id: i32) -> Self {
        Self {
            item_type: ItemType::Menu,
            id,
        }
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item_type {
            ItemType::Course => write!(f, "course-{}", self.id),
            ItemType::Menu => write!(f, "menu-{}", self.id),
        }
    }
}

impl FromStr for CartKey {
    type Err = ServiceError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let invalid = || ServiceError::validation(format!("Invalid cart key: {tag}"));
        let (kind, id) = tag.split_once('-').ok_or_else(invalid)?;
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let id = id.parse::<i32>().map_err(|_| invalid())?;
        if id == 0 {
            return Err(invalid());
        }
        match kind {
            "course" => Ok(CartKey::course(id)),
            "menu" => Ok(CartKey::menu(id)),
            _ => Err(invalid()),
        }
    }
}

/// One line of a cart snapshot, as stored client-side and posted with a
/// reservation.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct CartEntry {
    pub id: i32,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub quantity: i32,
    #[serde(default)]
    pub name: Option<String>,
}

impl CartEntry {
    pub fn key(&self) -> CartKey {
        CartKey {
            item_type: self.item_type,
            id: self.id,
        }
    }
}

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum CartKind {
    Empty,
    Courses,
    MenuItems,
    Mixed,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Cart {
    quantities: BTreeMap<CartKey, u32>,
    names: BTreeMap<CartKey, String>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quantity(&self, key: &CartKey) -> u32 {
        self.quantities.get(key).copied().unwrap_or(0)
    }

    pub fn set_quantity(&mut self, key: CartKey, quantity: u32) {
        if quantity == 0 {
            self.quantities.remove(&key);
            self.names.remove(&key);
        } else {
            self.quantities.insert(key, quantity);
        }
    }

    pub fn set_name(&mut self, key: CartKey, name: impl Into<String>) {
        self.names.insert(key, name.into());
    }

    pub fn increment(&mut self, key: CartKey) {
        let next = self.quantity(&key).saturating_add(1);
        self.set_quantity(key, next);
    }

    pub fn decrement(&mut self, key: CartKey) {
        let next = self.quantity(&key).saturating_sub(1);
        self.set_quantity(key, next);
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    pub fn kind(&self) -> CartKind {
        kind_of(self.quantities.keys().map(|k| k.item_type))
    }

    /// Positive entries in key order: courses first, then menu items, each by id.
    pub fn entries(&self) -> Vec<CartEntry> {
        self.quantities
            .iter()
            .map(|(key, quantity)| CartEntry {
                id: key.id,
                item_type: key.item_type,
                quantity: i32::try_from(*quantity).unwrap_or(i32::MAX),
                name: self.names.get(key).cloned(),
            })
            .collect()
    }

    /// Rebuilds a cart from a snapshot, summing repeated keys.
    pub fn from_entries(entries: &[CartEntry]) -> Result<Self, ServiceError> {
        let mut cart = Cart::new();
        for entry in entries {
            if entry.quantity <= 0 {
                return Err(ServiceError::validation(format!(
                    "Quantity for {} must be at least 1",
                    entry.key()
                )));
            }
            let key = entry.key();
            let quantity = i32::try_from(cart.quantity(&key))
                .ok()
                .and_then(|current| current.checked_add(entry.quantity))
                .ok_or_else(|| {
                    ServiceError::validation(format!("Quantity for {key} is too large"))
                })?;
            cart.set_quantity(key, quantity as u32);
            if let Some(name) = &entry.name {
                cart.set_name(key, name.clone());
            }
        }
        Ok(cart)
    }
}

pub fn kind_of(types: impl IntoIterator<Item = ItemType>) -> CartKind {
    let (mut courses, mut menus) = (false, false);
    for item_type in types {
        match item_type {
            ItemType::Course => courses = true,
            ItemType::Menu => menus = true,
        }
    }
    match (courses, menus) {
        (false, false) => CartKind::Empty,
        (true, false) => CartKind::Courses,
        (false, true) => CartKind::MenuItems,
        (true, true) => CartKind::Mixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_composite_tags() {
        assert_eq!("course-1".parse::<CartKey>().unwrap(), CartKey::course(1));
        assert_eq!("menu-42".parse::<CartKey>().unwrap(), CartKey::menu(42));
        assert_eq!(CartKey::menu(3).to_string(), "menu-3");
    }

    #[test]
    fn rejects_malformed_tags() {
        for tag in [
            "course", "drink-1", "menu-x", "menu-", "", "menu--5", "menu-+3", "course-0",
        ] {
            assert!(
                matches!(tag.parse::<CartKey>(), Err(ServiceError::Validation(_))),
                "{tag} should be rejected"
            );
        }
    }

    #[test]
    fn zero_quantity_removes_entry() {
        let mut cart = Cart::new();
        cart.set_quantity(CartKey::menu(1), 2);
        cart.set_name(CartKey::menu(1), "Carbonara");
        cart.set_quantity(CartKey::menu(1), 0);

        assert!(cart.is_empty());
        assert_eq!(cart.kind(), CartKind::Empty);
        assert!(cart.entries().is_empty());
    }

    #[test]
    fn decrement_stops_at_zero() {
        let mut cart = Cart::new();
        cart.increment(CartKey::course(2));
        cart.decrement(CartKey::course(2));
        cart.decrement(CartKey::course(2));

        assert_eq!(cart.quantity(&CartKey::course(2)), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn detects_mixed_carts() {
        let mut cart = Cart::new();
        cart.increment(CartKey::menu(1));
        assert_eq!(cart.kind(), CartKind::MenuItems);

        cart.increment(CartKey::course(1));
        assert_eq!(cart.kind(), CartKind::Mixed);

        cart.set_quantity(CartKey::menu(1), 0);
        assert_eq!(cart.kind(), CartKind::Courses);
    }

    #[test]
    fn snapshot_matches_stored_format() {
        let mut cart = Cart::new();
        cart.set_quantity(CartKey::menu(3), 2);
        cart.set_name(CartKey::menu(3), "Margherita");

        let json = serde_json::to_value(cart.entries()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "id": 3, "type": "menu", "quantity": 2, "name": "Margherita" }
            ])
        );
    }

    #[test]
    fn from_entries_merges_duplicates() {
        let entries: Vec<CartEntry> = serde_json::from_str(
            r#"[
                {"id": 5, "type": "menu", "quantity": 1},
                {"id": 5, "type": "menu", "quantity": 2, "name": "Tiramisu"}
            ]"#,
        )
        .unwrap();

        let cart = Cart::from_entries(&entries).unwrap();
        assert_eq!(cart.quantity(&CartKey::menu(5)), 3);
        assert_eq!(cart.entries().len(), 1);
        assert_eq!(cart.entries()[0].name.as_deref(), Some("Tiramisu"));
    }

    #[test]
    fn from_entries_rejects_non_positive_quantity() {
        let entries = vec![CartEntry {
            id: 1,
            item_type: ItemType::Course,
            quantity: 0,
            name: None,
        }];

        assert!(matches!(
            Cart::from_entries(&entries),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn from_entries_rejects_overflowing_quantity() {
        let entry = CartEntry {
            id: 1,
            item_type: ItemType::Menu,
            quantity: i32::MAX,
            name: None,
        };

        assert!(Cart::from_entries(&[entry.clone()]).is_ok());
        assert!(matches!(
            Cart::from_entries(&[entry.clone(), entry]),
            Err(ServiceError::Validation(_))
        ));
    }
}
