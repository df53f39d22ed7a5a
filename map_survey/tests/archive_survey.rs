mod common;

use compat_quake::diagnostic::Diagnostic;
use map_survey::config::ScanConfig;
use map_survey::ingest::{fingerprint_file, survey_paths};
use map_survey::render::{render_entities_json, render_json, render_text};
use map_survey::{build_report, Report, Survey, SurveyError};

use common::{bsp_image, entity_text, write_pk3};

fn arena_map() -> Vec<u8> {
    bsp_image(&entity_text(&[
        &[("classname", "worldspawn"), ("message", "Harvest Moon")],
        &[("classname", "team_neutralobelisk"), ("origin", "0 0 64")],
        &[("classname", "team_CTF_blueflag")],
        &[("classname", "team_CTF_redflag")],
        &[("classname", "item_armor_shard")],
        &[("classname", "item_armor_shard")],
        &[("classname", "item_botroam")],
        &[("classname", "weapon_nailgun")],
    ]))
}

fn duel_map() -> Vec<u8> {
    bsp_image(&entity_text(&[
        &[("classname", "worldspawn"), ("message", "Small Room")],
        &[("classname", "weapon_shotgun")],
        &[("classname", "ammo_shells")],
    ]))
}

fn survey_one(path: &std::path::Path) -> Survey {
    let mut results = survey_paths(&[path], &ScanConfig::default(), Vec::new());
    assert_eq!(results.len(), 1);
    results.remove(0).expect("survey ok")
}

#[test]
fn archive_report_covers_every_map() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_pk3(
        dir.path(),
        "pack.pk3",
        &[
            ("maps/", Vec::new()),
            ("maps/harvest.bsp", arena_map()),
            ("maps/duel.bsp", duel_map()),
            ("levelshots/duel.tga", vec![7; 64]),
        ],
    );

    let survey = survey_one(&path);
    assert_eq!(survey.maps().len(), 2);
    let report = build_report(&survey, Vec::new()).expect("report ok");
    let Report::Archive(archive) = report else {
        panic!("expected archive report");
    };
    assert!(archive.is_complete());
    assert_eq!(archive.archive_name, path.display().to_string());

    let harvest = &archive.maps[0];
    assert_eq!(harvest.map_name, "harvest");
    assert_eq!(harvest.map_title, "Harvest Moon");
    assert_eq!(harvest.aggregated_items.get("item_armor_shard"), Some(2));
    assert_eq!(harvest.aggregated_items.get("item_botroam"), None);
    assert_eq!(harvest.aggregated_weapons.get("weapon_nailgun"), Some(1));
    assert!(harvest.flags.harvester_capable);
    assert!(harvest.flags.ctf_capable);
    assert!(harvest.flags.requires_ta);
    assert!(!harvest.flags.overload_capable);

    let duel = &archive.maps[1];
    assert_eq!(duel.map_name, "duel");
    assert!(!duel.flags.any());
}

#[test]
fn zero_size_members_do_not_change_the_fingerprint() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bare = write_pk3(
        dir.path(),
        "bare.pk3",
        &[("maps/duel.bsp", duel_map())],
    );
    let padded = write_pk3(
        dir.path(),
        "padded.pk3",
        &[
            ("maps/", Vec::new()),
            ("maps/duel.bsp", duel_map()),
            ("empty.cfg", Vec::new()),
        ],
    );
    let scan = ScanConfig::default();
    let bare_hash = fingerprint_file(&bare, &scan).expect("hash ok");
    assert_eq!(fingerprint_file(&padded, &scan).expect("hash ok"), bare_hash);
    assert_eq!(survey_one(&bare).fingerprint(), bare_hash);
}

#[test]
fn failing_map_is_listed_next_to_good_ones() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_pk3(
        dir.path(),
        "mixed.pk3",
        &[
            ("maps/duel.bsp", duel_map()),
            ("maps/nameless.bsp", bsp_image(&entity_text(&[&[("classname", "light")]]))),
            ("maps/binary.bsp", bsp_image("{\n\"message\" \"caf\u{e9}\"\n}\n")),
        ],
    );

    let survey = survey_one(&path);
    let Survey::Archive(entities) = &survey else {
        panic!("expected archive survey");
    };
    assert_eq!(entities.failures.len(), 1);
    assert!(matches!(
        entities.failures[0].error,
        SurveyError::Entities { .. }
    ));

    let Report::Archive(archive) = build_report(&survey, Vec::new()).expect("report ok") else {
        panic!("expected archive report");
    };
    let failed: Vec<(&str, &str)> = archive
        .failures
        .iter()
        .map(|failure| (failure.map_name.as_str(), failure.kind))
        .collect();
    assert_eq!(failed, vec![("binary", "encoding"), ("nameless", "data")]);
    assert_eq!(archive.maps.len(), 1);
}

#[test]
fn text_and_json_renderings() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_pk3(
        dir.path(),
        "pack.pk3",
        &[("maps/harvest.bsp", arena_map())],
    );

    let surveys: Vec<Survey> = survey_paths(&[dir.path()], &ScanConfig::default(), Vec::new())
        .into_iter()
        .map(|survey| survey.expect("survey ok"))
        .collect();
    let reports: Vec<Report> = surveys
        .iter()
        .map(|survey| build_report(survey, Vec::new()).expect("report ok"))
        .collect();

    let mut text = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    render_text(&reports, &mut text, &mut diagnostics).expect("render text");
    let text = String::from_utf8(text).expect("utf8");
    assert!(text.contains("\n  Harvest Moon\n  ============\n"));
    assert!(text.contains("\n  Armor shard.......... : ×2\n"));
    assert!(text.contains("\n  Nailgun.............. : ×1\n"));
    assert!(text.contains("\n  Requires team arena.. : Yes\n"));
    assert!(text.contains("\n  Harvester capable.... : Yes\n"));
    assert!(diagnostics.is_empty());

    let mut json = Vec::new();
    render_json(&reports, &mut json).expect("render json");
    let value: serde_json::Value = serde_json::from_slice(&json).expect("valid json");
    assert_eq!(value[0]["kind"], "archive");
    assert_eq!(value[0]["maps"][0]["map_name"], "harvest");

    let mut raw = Vec::new();
    render_entities_json(&surveys, &mut raw).expect("render entities");
    let value: serde_json::Value = serde_json::from_slice(&raw).expect("valid json");
    assert_eq!(value["harvest"][1]["origin"], "0 0 64");
    assert_eq!(value["harvest"].as_array().map(Vec::len), Some(8));
}
