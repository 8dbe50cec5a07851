//! Town shops: who keeps them, who drinks in them and what is on the shelf.

use crate::core::constants::{MAX_TOWN_SHOPS, SHOP_WARES};
use crate::items::{
    armor_of, fire_bomb, healing_potion, poison_vial, roll_quality, snare_net, stamina_tonic,
    strength_draught, weapon_of, ArmorSlot, Item, ItemId, Quality,
};
use crate::world::names::NameGenerator;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShopKind {
    Blacksmith,
    Tavern,
    Emporium,
}

impl ShopKind {
    pub const ALL: [ShopKind; 3] = [ShopKind::Blacksmith, ShopKind::Tavern, ShopKind::Emporium];

    pub fn name(&self) -> &'static str {
        match self {
            ShopKind::Blacksmith => "Blacksmith",
            ShopKind::Tavern => "Tavern",
            ShopKind::Emporium => "Emporium",
        }
    }

    /// Most patrons that hang around besides the owner.
    pub fn max_patrons(&self) -> usize {
        match self {
            ShopKind::Blacksmith => 3,
            ShopKind::Tavern => 7,
            ShopKind::Emporium => 2,
        }
    }

    fn stock<R: Rng + ?Sized>(&self, id: ItemId, rng: &mut R) -> Item {
        let quality = roll_quality(rng, Quality::Worn, Quality::Fine);
        match self {
            ShopKind::Blacksmith => match rng.gen_range(0..3) {
                0 => weapon_of(id, quality),
                _ => armor_of(id, ArmorSlot::ALL[rng.gen_range(0..ArmorSlot::ALL.len())], quality),
            },
            ShopKind::Tavern => match rng.gen_range(0..3) {
                0 => stamina_tonic(id, quality),
                _ => healing_potion(id, quality),
            }
            .with_count(rng.gen_range(1..=3)),
            ShopKind::Emporium => match rng.gen_range(0..4) {
                0 => fire_bomb(id, quality),
                1 => poison_vial(id, quality),
                2 => snare_net(id, quality),
                _ => strength_draught(id, quality),
            },
        }
    }
}

/// A shop in town. The owner keeps the wares; patrons are flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shop {
    pub kind: ShopKind,
    pub owner: String,
    pub patrons: Vec<String>,
    pub wares: Vec<Item>,
}

impl Shop {
    /// "Mara's Tavern".
    pub fn name(&self) -> String {
        format!("{}'s {}", self.owner, self.kind.name())
    }
}

/// Opens one shop of `kind` with a named owner, some patrons and a shelf of
/// wares. Matching wares share a stack.
pub fn open_shop<R: Rng + ?Sized>(
    kind: ShopKind,
    names: &mut dyn NameGenerator,
    rng: &mut R,
    mut next_item: impl FnMut() -> ItemId,
) -> Shop {
    let owner = names.person_name();
    let patrons = (0..rng.gen_range(1..=kind.max_patrons()))
        .map(|_| names.person_name())
        .collect();
    let mut wares: Vec<Item> = Vec::with_capacity(SHOP_WARES);
    for _ in 0..SHOP_WARES {
        let item = kind.stock(next_item(), rng);
        match wares.iter_mut().find(|w| w.stacks_with(&item)) {
            Some(stack) => stack.set_count(stack.count() + item.count()),
            None => wares.push(item),
        }
    }
    Shop {
        kind,
        owner,
        patrons,
        wares,
    }
}

/// One to three shops of distinct kinds, listed in kind order.
pub fn open_town_shops<R: Rng + ?Sized>(
    names: &mut dyn NameGenerator,
    rng: &mut R,
    mut next_item: impl FnMut() -> ItemId,
) -> Vec<Shop> {
    let mut kinds = ShopKind::ALL.to_vec();
    kinds.shuffle(rng);
    kinds.truncate(rng.gen_range(1..=MAX_TOWN_SHOPS));
    kinds.sort();
    kinds
        .into_iter()
        .map(|kind| open_shop(kind, names, rng, &mut next_item))
        .collect()
}
