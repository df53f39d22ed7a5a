//! Display names for counted classnames and capability flags.

use crate::classify::Capability;

pub const WEAPON_NAMES: &[(&str, &str)] = &[
    ("weapon_rocketlauncher", "Rocket launcher"),
    ("weapon_grenadelauncher", "Grenade launcher"),
    ("weapon_lightning", "Lightning gun"),
    ("weapon_plasmagun", "Plasma gun"),
    ("weapon_shotgun", "Shotgun"),
    ("weapon_railgun", "Railgun"),
    ("weapon_bfg", "BFG"),
    // team arena
    ("weapon_chaingun", "Chaingun"),
    ("weapon_prox_launcher", "Proximity Launcher"),
    ("weapon_nailgun", "Nailgun"),
];

pub const ITEM_NAMES: &[(&str, &str)] = &[
    ("item_armor_shard", "Armor shard"),
    ("item_health_small", "Small health (green)"),
    ("item_health", "Health (yellow)"),
    ("item_health_large", "Large health (orange)"),
    ("item_armor_body", "Body armor (yellow)"),
    ("item_armor_combat", "Combat armor (red)"),
    ("item_armor_jacket", "Armor jacket (green)"),
    ("item_health_mega", "Megahealth"),
    ("item_quad", "Quad damage"),
    ("item_regen", "Regeneration"),
    ("item_invis", "Invisibility"),
    ("item_enviro", "Battle Suit"),
    ("item_haste", "Haste"),
    ("item_flight", "Flight"),
    ("ammo_bullets", "Bullets"),
    ("ammo_shells", "Shotgun shells"),
    ("ammo_grenades", "Grenades"),
    ("ammo_rockets", "Rockets"),
    ("ammo_cells", "Plasma cells"),
    ("ammo_lightning", "Lightning charge"),
    ("ammo_slugs", "Slugs"),
    ("ammo_belt", "Chaingun ammo"),
    ("ammo_nails", "Nails"),
    ("ammo_mines", "Proximity mines"),
    ("ammo_bfg", "BFG Ammo"),
    ("item_guard", "Guard"),
    ("item_doubler", "Doubler"),
    ("item_scout", "Scout"),
    ("item_ammoregen", "Ammo regen"),
    ("holdable_kamikaze", "Kamikaze"),
    ("holdable_medkit", "Medkit"),
    ("holdable_teleporter", "Teleporter"),
];

pub fn weapon_name(classname: &str) -> Option<&'static str> {
    lookup(WEAPON_NAMES, classname)
}

pub fn item_name(classname: &str) -> Option<&'static str> {
    lookup(ITEM_NAMES, classname)
}

pub fn capability_label(capability: Capability) -> &'static str {
    match capability {
        Capability::RequiresTeamArena => "Requires team arena",
        Capability::Ctf => "CTF capable",
        Capability::OneFlagCtf => "One flag CTF capable",
        Capability::Overload => "Overload capable",
        Capability::Harvester => "Harvester capable",
    }
}

/// Width of the longest label any listing can print.
pub fn label_width() -> usize {
    let names = WEAPON_NAMES
        .iter()
        .chain(ITEM_NAMES)
        .map(|(_, name)| name.chars().count());
    let flags = Capability::ALL
        .iter()
        .map(|capability| capability_label(*capability).chars().count());
    names.chain(flags).max().unwrap_or(0)
}

fn lookup(table: &'static [(&'static str, &'static str)], classname: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(class, _)| *class == classname)
        .map(|(_, name)| *name)
}
