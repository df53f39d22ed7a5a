//! Turns a map's entity records into counted, flagged summaries.

use std::collections::HashMap;

use compat_quake::checksum::Fingerprint;
use compat_quake::diagnostic::{Diagnostic, DiagnosticSink};
use compat_quake::entities::EntityRecord;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::SurveyError;
use crate::model::MapEntities;

const WORLDSPAWN: &str = "worldspawn";
const TITLE_KEY: &str = "message";

const TEAM_ARENA_CLASSES: [&str; 11] = [
    "item_guard",
    "item_doubler",
    "item_scout",
    "item_ammoregen",
    "weapon_chaingun",
    "weapon_prox_launcher",
    "weapon_nailgun",
    "ammo_belt",
    "ammo_mines",
    "ammo_nails",
    "holdable_kamikaze",
];

const UNCOUNTED_ITEMS: [&str; 1] = ["item_botroam"];

/// Records grouped by classname, groups in first-seen order.
#[derive(Debug, Default)]
pub struct ClassGroups<'a> {
    groups: Vec<(&'a str, Vec<&'a EntityRecord>)>,
    index: HashMap<&'a str, usize>,
}

impl<'a> ClassGroups<'a> {
    pub fn from_records(records: &'a [EntityRecord]) -> Self {
        let mut grouped = ClassGroups::default();
        for record in records {
            let Some(classname) = record.classname() else {
                continue;
            };
            let slot = *grouped.index.entry(classname).or_insert_with(|| {
                grouped.groups.push((classname, Vec::new()));
                grouped.groups.len() - 1
            });
            grouped.groups[slot].1.push(record);
        }
        grouped
    }

    pub fn get(&self, classname: &str) -> Option<&[&'a EntityRecord]> {
        self.index
            .get(classname)
            .map(|slot| self.groups[*slot].1.as_slice())
    }

    pub fn contains(&self, classname: &str) -> bool {
        self.index.contains_key(classname)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, usize)> + '_ {
        self.groups
            .iter()
            .map(|(classname, records)| (*classname, records.len()))
    }

    /// Occurrence counts for every group whose classname passes `keep`.
    pub fn counts(&self, keep: impl Fn(&str) -> bool) -> ClassCounts {
        ClassCounts(
            self.iter()
                .filter(|(classname, _)| keep(classname))
                .map(|(classname, count)| (classname.to_string(), count))
                .collect(),
        )
    }
}

/// Classname to occurrence count, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassCounts(Vec<(String, usize)>);

impl ClassCounts {
    pub fn get(&self, classname: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(class, _)| class == classname)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(class, count)| (class.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ClassCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (class, count) in &self.0 {
            map.serialize_entry(class, count)?;
        }
        map.end()
    }
}

/// Game modes a map can host, in listing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    RequiresTeamArena,
    Ctf,
    OneFlagCtf,
    Overload,
    Harvester,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::RequiresTeamArena,
        Capability::Ctf,
        Capability::OneFlagCtf,
        Capability::Overload,
        Capability::Harvester,
    ];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
    pub ctf_capable: bool,
    pub overload_capable: bool,
    pub harvester_capable: bool,
    pub ctf_1f_capable: bool,
    pub requires_ta: bool,
}

impl Flags {
    pub fn from_groups(groups: &ClassGroups<'_>) -> Self {
        // Only the blue flag is checked for CTF.
        let ctf_capable = groups.contains("team_CTF_blueflag");
        let ctf_1f_capable = groups.contains("team_CTF_neutralflag");
        let overload_capable =
            groups.contains("team_redobelisk") && groups.contains("team_blueobelisk");
        let harvester_capable = groups.contains("team_neutralobelisk");
        let requires_ta = overload_capable
            || harvester_capable
            || ctf_1f_capable
            || TEAM_ARENA_CLASSES
                .iter()
                .any(|classname| groups.contains(classname));
        Self {
            ctf_capable,
            overload_capable,
            harvester_capable,
            ctf_1f_capable,
            requires_ta,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::RequiresTeamArena => self.requires_ta,
            Capability::Ctf => self.ctf_capable,
            Capability::OneFlagCtf => self.ctf_1f_capable,
            Capability::Overload => self.overload_capable,
            Capability::Harvester => self.harvester_capable,
        }
    }

    pub fn any(&self) -> bool {
        Capability::ALL.iter().any(|capability| self.has(*capability))
    }
}

/// The reporting view of one map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportedMap {
    pub map_title: String,
    pub map_name: String,
    pub fingerprint: Fingerprint,
    pub aggregated_items: ClassCounts,
    pub aggregated_weapons: ClassCounts,
    pub flags: Flags,
}

pub fn is_counted_item(classname: &str) -> bool {
    classname.starts_with("ammo_")
        || classname.starts_with("holdable_")
        || (classname.starts_with("item_") && !UNCOUNTED_ITEMS.contains(&classname))
}

pub fn is_weapon(classname: &str) -> bool {
    classname.starts_with("weapon_")
}

pub fn classify<S: DiagnosticSink>(
    map: &MapEntities,
    mut sink: S,
) -> Result<ReportedMap, SurveyError> {
    let groups = ClassGroups::from_records(&map.entities);
    // With several worldspawn entities the last one wins.
    let worldspawn = groups
        .get(WORLDSPAWN)
        .and_then(|records| records.last())
        .ok_or_else(|| SurveyError::NoWorldspawn {
            map: map.map_name.clone(),
        })?;
    let map_title = match worldspawn.get(TITLE_KEY) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => {
            sink.report(Diagnostic::MissingTitle {
                map: map.map_name.clone(),
            });
            map.map_name.clone()
        }
    };

    Ok(ReportedMap {
        map_title,
        map_name: map.map_name.clone(),
        fingerprint: map.fingerprint,
        aggregated_items: groups.counts(is_counted_item),
        aggregated_weapons: groups.counts(is_weapon),
        flags: Flags::from_groups(&groups),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(classname: &str) -> EntityRecord {
        [("classname", classname)].into_iter().collect()
    }

    fn map_of(records: Vec<EntityRecord>) -> MapEntities {
        MapEntities {
            map_name: "testmap".to_string(),
            fingerprint: Fingerprint::from_bytes([0xde, 0xad, 0xbe, 0xef]),
            entities: records,
        }
    }

    fn worldspawn(title: &str) -> EntityRecord {
        [("classname", "worldspawn"), ("message", title)]
            .into_iter()
            .collect()
    }

    #[test]
    fn counts_items_and_weapons() {
        let map = map_of(vec![
            worldspawn("Arena"),
            entity("weapon_rocketlauncher"),
            entity("item_quad"),
            entity("weapon_rocketlauncher"),
            entity("ammo_rockets"),
            entity("holdable_medkit"),
            entity("item_botroam"),
            entity("info_player_deathmatch"),
            entity("item_unheard_of"),
        ]);
        let mut diagnostics = Vec::new();
        let reported = classify(&map, &mut diagnostics).expect("classify ok");
        assert_eq!(reported.map_title, "Arena");
        assert_eq!(reported.fingerprint.to_hex(), "deadbeef");
        assert_eq!(reported.aggregated_weapons.get("weapon_rocketlauncher"), Some(2));
        assert_eq!(reported.aggregated_weapons.len(), 1);
        let items: Vec<(&str, usize)> = reported.aggregated_items.iter().collect();
        assert_eq!(
            items,
            vec![
                ("item_quad", 1),
                ("ammo_rockets", 1),
                ("holdable_medkit", 1),
                ("item_unheard_of", 1),
            ]
        );
        assert!(!reported.flags.any());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn missing_worldspawn_is_an_error() {
        let map = map_of(vec![entity("item_quad")]);
        let err = classify(&map, Vec::new()).expect_err("should fail");
        assert!(matches!(err, SurveyError::NoWorldspawn { map } if map == "testmap"));
    }

    #[test]
    fn missing_title_falls_back_to_map_name() {
        let map = map_of(vec![entity("worldspawn")]);
        let mut diagnostics = Vec::new();
        let reported = classify(&map, &mut diagnostics).expect("classify ok");
        assert_eq!(reported.map_title, "testmap");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::MissingTitle {
                map: "testmap".to_string()
            }]
        );
    }

    #[test]
    fn empty_title_counts_as_missing() {
        let map = map_of(vec![worldspawn("")]);
        let reported = classify(&map, Vec::new()).expect("classify ok");
        assert_eq!(reported.map_title, "testmap");
    }

    #[test]
    fn last_worldspawn_wins() {
        let map = map_of(vec![worldspawn("First"), worldspawn("Second")]);
        let reported = classify(&map, Vec::new()).expect("classify ok");
        assert_eq!(reported.map_title, "Second");
    }

    #[test]
    fn ctf_needs_only_blue_flag() {
        let map = map_of(vec![worldspawn("Flags"), entity("team_CTF_blueflag")]);
        let flags = classify(&map, Vec::new()).expect("classify ok").flags;
        assert!(flags.ctf_capable);
        assert!(!flags.requires_ta);

        let map = map_of(vec![worldspawn("Flags"), entity("team_CTF_redflag")]);
        let flags = classify(&map, Vec::new()).expect("classify ok").flags;
        assert!(!flags.ctf_capable);
    }

    #[test]
    fn overload_needs_both_obelisks() {
        let map = map_of(vec![worldspawn("Overload"), entity("team_redobelisk")]);
        let flags = classify(&map, Vec::new()).expect("classify ok").flags;
        assert!(!flags.overload_capable);
        assert!(!flags.requires_ta);

        let map = map_of(vec![
            worldspawn("Overload"),
            entity("team_redobelisk"),
            entity("team_blueobelisk"),
        ]);
        let flags = classify(&map, Vec::new()).expect("classify ok").flags;
        assert!(flags.overload_capable);
        assert!(flags.requires_ta);
    }

    #[test]
    fn team_arena_modes_imply_team_arena() {
        for classname in ["team_neutralobelisk", "team_CTF_neutralflag"] {
            let map = map_of(vec![worldspawn("TA"), entity(classname)]);
            let flags = classify(&map, Vec::new()).expect("classify ok").flags;
            assert!(flags.requires_ta, "{} should require team arena", classname);
        }
    }

    #[test]
    fn team_arena_pickups_imply_team_arena() {
        for classname in TEAM_ARENA_CLASSES {
            let map = map_of(vec![worldspawn("TA"), entity(classname)]);
            let flags = classify(&map, Vec::new()).expect("classify ok").flags;
            assert!(flags.requires_ta, "{} should require team arena", classname);
            assert!(!flags.ctf_capable);
        }
    }

    #[test]
    fn flags_have_listing_accessors() {
        let flags = Flags {
            harvester_capable: true,
            ..Flags::default()
        };
        assert!(flags.any());
        assert!(flags.has(Capability::Harvester));
        assert!(!flags.has(Capability::Ctf));
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let records = vec![entity("light"), entity("worldspawn"), entity("light")];
        let groups = ClassGroups::from_records(&records);
        let order: Vec<(&str, usize)> = groups.iter().collect();
        assert_eq!(order, vec![("light", 2), ("worldspawn", 1)]);
        assert_eq!(groups.get("light").map(|group| group.len()), Some(2));
        assert!(groups.get("misc_model").is_none());
    }

    #[test]
    fn reported_map_serializes_with_hex_fingerprint() {
        let map = map_of(vec![worldspawn("Arena"), entity("weapon_railgun")]);
        let reported = classify(&map, Vec::new()).expect("classify ok");
        let value = serde_json::to_value(&reported).expect("serialize");
        assert_eq!(value["fingerprint"], "deadbeef");
        assert_eq!(value["aggregated_weapons"]["weapon_railgun"], 1);
        assert_eq!(value["flags"]["requires_ta"], false);
        assert_eq!(value["map_title"], "Arena");
    }
}
