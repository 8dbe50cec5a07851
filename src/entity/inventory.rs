//! Ordered inventory with a weapon slot and one armor slot per body part.

use crate::core::error::{GameError, GameResult};
use crate::items::{ArmorSlot, Item, ItemCategory, ItemId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<Item>,
    weapon: Option<ItemId>,
    armor: BTreeMap<ArmorSlot, ItemId>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
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
        self.items.iter().find(|i| i.id == id)
    }

    pub fn count_of(&self, id: ItemId) -> u32 {
        self.get(id).map_or(0, Item::count)
    }

    /// Adds an item, merging it into a matching stack when one exists.
    /// Returns the id of the stack that now holds it.
    pub fn add_item(&mut self, item: Item) -> ItemId {
        if let Some(stack) = self.items.iter_mut().find(|i| i.stacks_with(&item)) {
            let total = stack.count().saturating_add(item.count());
            stack.set_count(total);
            return stack.id;
        }
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Removes `count` units of an item and returns how many remain.
    ///
    /// Fails without touching the inventory when fewer than `count` are held.
    /// Emptying a stack drops it and clears any slot it occupied.
    pub fn remove_item(&mut self, id: ItemId, count: u32) -> GameResult<u32> {
        let held = self.count_of(id);
        if count > held || held == 0 {
            return Err(GameError::InsufficientQuantity {
                item: id,
                requested: count,
                held,
            });
        }
        let remaining = held - count;
        if remaining == 0 {
            self.items.retain(|i| i.id != id);
            self.unequip(id);
        } else if let Some(stack) = self.items.iter_mut().find(|i| i.id == id) {
            stack.set_count(remaining);
        }
        Ok(remaining)
    }

    /// Puts a held weapon or armor piece into its slot. Returns whatever it
    /// replaced. The error is a short reason for the caller to attribute.
    pub fn equip(&mut self, id: ItemId) -> Result<Option<ItemId>, &'static str> {
        let category = self
            .get(id)
            .ok_or("that item is not in the inventory")?
            .category;
        match category {
            ItemCategory::Weapon => Ok(self.weapon.replace(id)),
            ItemCategory::Armor(slot) => Ok(self.armor.insert(slot, id)),
            ItemCategory::Consumable => Err("consumables cannot be equipped"),
        }
    }

    pub fn unequip(&mut self, id: ItemId) -> bool {
        if self.weapon == Some(id) {
            self.weapon = None;
            return true;
        }
        let worn = self.armor.len();
        self.armor.retain(|_, piece| *piece != id);
        self.armor.len() != worn
    }

    pub fn is_equipped(&self, id: ItemId) -> bool {
        self.weapon == Some(id) || self.armor.values().any(|piece| *piece == id)
    }

    pub fn weapon(&self) -> Option<&Item> {
        self.weapon.and_then(|id| self.get(id))
    }

    pub fn weapon_id(&self) -> Option<ItemId> {
        self.weapon
    }

    /// The piece worn in `slot`, if any.
    pub fn armor_in(&self, slot: ArmorSlot) -> Option<&Item> {
        self.armor.get(&slot).and_then(|id| self.get(*id))
    }

    /// Worn armor ids, head to feet.
    pub fn armor_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.armor.values().copied()
    }

    pub fn worn_armor(&self) -> impl Iterator<Item = &Item> + '_ {
        self.armor_ids().filter_map(|id| self.get(id))
    }

    /// (attack, defense) summed over the weapon and every worn piece.
    pub fn equipment_bonus(&self) -> (u32, u32) {
        self.weapon()
            .into_iter()
            .chain(self.worn_armor())
            .map(Item::modifier)
            .fold((0, 0), |(a, d), (ia, id)| (a + ia, d + id))
    }

    /// Takes every item out, emptying every slot. Used for looting.
    pub fn drain(&mut self) -> Vec<Item> {
        self.weapon = None;
        self.armor.clear();
        std::mem::take(&mut self.items)
    }

    /// Keeps only the items for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Item) -> bool) {
        self.items.retain(|i| keep(i));
        if self.weapon.is_some_and(|id| self.get(id).is_none()) {
            self.weapon = None;
        }
        let items = &self.items;
        self.armor
            .retain(|_, piece| items.iter().any(|i| i.id == *piece));
    }

    /// Rebuilds an inventory from stored parts, checking slot references.
    ///
    /// Two worn pieces that share a slot are rejected.
    pub(crate) fn restore(
        items: Vec<Item>,
        weapon: Option<ItemId>,
        armor: &[ItemId],
    ) -> Result<Self, String> {
        let mut inventory = Self {
            items,
            weapon,
            armor: BTreeMap::new(),
        };
        for (i, item) in inventory.items.iter().enumerate() {
            if inventory.items[..i].iter().any(|other| other.id == item.id) {
                return Err(format!("duplicate {} in inventory", item.id));
            }
        }
        if let Some(id) = weapon {
            match inventory.get(id) {
                Some(item) if item.category == ItemCategory::Weapon => {}
                _ => return Err(format!("weapon slot references missing or wrong {}", id)),
            }
        }
        for id in armor {
            let slot = inventory
                .get(*id)
                .and_then(|item| item.category.armor_slot())
                .ok_or_else(|| format!("armor slot references missing or wrong {}", id))?;
            if inventory.armor.insert(slot, *id).is_some() {
                return Err(format!("two pieces worn in the {} slot", slot.name()));
            }
        }
        Ok(inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{armor_of, healing_potion, weapon_of, Quality};

    fn stocked() -> Inventory {
        let mut inv = Inventory::new();
        inv.add_item(weapon_of(ItemId(1), Quality::Worn));
        inv.add_item(healing_potion(ItemId(2), Quality::Worn).with_count(2));
        inv
    }

    #[test]
    fn test_add_item_merges_stacks() {
        let mut inv = stocked();
        let landed = inv.add_item(healing_potion(ItemId(9), Quality::Worn).with_count(3));
        assert_eq!(landed, ItemId(2));
        assert_eq!(inv.count_of(ItemId(2)), 5);
        assert_eq!(inv.len(), 2);
    }

    #[test]
    fn test_remove_more_than_held_leaves_inventory_unchanged() {
        let mut inv = stocked();
        let before = inv.clone();

        let err = inv.remove_item(ItemId(2), 3).unwrap_err();
        assert!(matches!(
            err,
            GameError::InsufficientQuantity {
                requested: 3,
                held: 2,
                ..
            }
        ));
        assert_eq!(inv, before);

        let err = inv.remove_item(ItemId(77), 1).unwrap_err();
        assert!(matches!(err, GameError::InsufficientQuantity { held: 0, .. }));
        assert_eq!(inv, before);
    }

    #[test]
    fn test_remove_whole_stack_unequips() {
        let mut inv = stocked();
        inv.equip(ItemId(1)).unwrap();
        assert_eq!(inv.equipment_bonus(), (2, 0));

        assert_eq!(inv.remove_item(ItemId(1), 1).unwrap(), 0);
        assert!(inv.weapon().is_none());
        assert_eq!(inv.equipment_bonus(), (0, 0));
    }

    #[test]
    fn test_remove_partial_stack() {
        let mut inv = stocked();
        assert_eq!(inv.remove_item(ItemId(2), 1).unwrap(), 1);
        assert_eq!(inv.count_of(ItemId(2)), 1);
    }

    #[test]
    fn test_equip_rejects_consumables_and_missing() {
        let mut inv = stocked();
        assert!(inv.equip(ItemId(2)).is_err());
        assert!(inv.equip(ItemId(42)).is_err());
        assert_eq!(inv.equip(ItemId(1)), Ok(None));
        assert_eq!(inv.equip(ItemId(1)), Ok(Some(ItemId(1))));
    }

    #[test]
    fn test_one_piece_per_armor_slot() {
        let mut inv = stocked();
        inv.add_item(armor_of(ItemId(3), ArmorSlot::Chestplate, Quality::Worn));
        inv.add_item(armor_of(ItemId(4), ArmorSlot::Helmet, Quality::Fine));
        inv.add_item(armor_of(ItemId(5), ArmorSlot::Chestplate, Quality::Fine));

        assert_eq!(inv.equip(ItemId(3)), Ok(None));
        assert_eq!(inv.equip(ItemId(4)), Ok(None));
        assert_eq!(inv.equipment_bonus(), (0, 2 + 3));

        assert_eq!(inv.equip(ItemId(5)), Ok(Some(ItemId(3))));
        assert!(!inv.is_equipped(ItemId(3)));
        assert_eq!(inv.armor_in(ArmorSlot::Chestplate).map(|i| i.id), Some(ItemId(5)));
        assert_eq!(inv.equipment_bonus(), (0, 5 + 3));
        assert_eq!(inv.armor_ids().collect::<Vec<_>>(), vec![ItemId(4), ItemId(5)]);

        assert!(inv.unequip(ItemId(4)));
        assert!(!inv.unequip(ItemId(4)));
        assert_eq!(inv.equipment_bonus(), (0, 5));
    }

    #[test]
    fn test_drain_empties_every_slot() {
        let mut inv = stocked();
        inv.add_item(armor_of(ItemId(3), ArmorSlot::Boots, Quality::Worn));
        inv.equip(ItemId(1)).unwrap();
        inv.equip(ItemId(3)).unwrap();

        assert_eq!(inv.drain().len(), 3);
        assert_eq!(inv.equipment_bonus(), (0, 0));
        assert_eq!(inv.worn_armor().count(), 0);
    }

    #[test]
    fn test_restore_checks_slot_references() {
        let items = stocked().items().to_vec();
        assert!(Inventory::restore(items.clone(), Some(ItemId(1)), &[]).is_ok());
        assert!(Inventory::restore(items.clone(), Some(ItemId(2)), &[]).is_err());
        assert!(Inventory::restore(items, None, &[ItemId(5)]).is_err());
    }

    #[test]
    fn test_restore_rejects_two_pieces_in_one_slot() {
        let mut items = stocked().items().to_vec();
        items.push(armor_of(ItemId(3), ArmorSlot::Leggings, Quality::Worn));
        items.push(armor_of(ItemId(4), ArmorSlot::Leggings, Quality::Fine));
        items.push(armor_of(ItemId(5), ArmorSlot::Boots, Quality::Fine));

        let worn = Inventory::restore(items.clone(), None, &[ItemId(3), ItemId(5)]).unwrap();
        assert_eq!(worn.equipment_bonus(), (0, 2 + 3));

        let err = Inventory::restore(items, None, &[ItemId(3), ItemId(4)]).unwrap_err();
        assert_eq!(err, "two pieces worn in the Leggings slot");
    }
}
