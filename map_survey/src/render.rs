use std::io::{self, Write};

use compat_quake::diagnostic::{Diagnostic, DiagnosticSink};
use compat_quake::entities::EntityRecord;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::classify::{Capability, ClassCounts, ReportedMap};
use crate::model::Survey;
use crate::report::{ArchiveReport, Report};
use crate::tables::{capability_label, item_name, label_width, weapon_name};

const ARCHIVE_MAP_INDENT: &str = "  ";

/// Writes the human readable listing for every report, in order.
pub fn render_text<W, S>(reports: &[Report], out: &mut W, mut sink: S) -> io::Result<()>
where
    W: Write,
    S: DiagnosticSink,
{
    let mut renderer = TextRenderer {
        out,
        sink: &mut sink,
        width: label_width(),
    };
    for report in reports {
        match report {
            Report::Map(map) => renderer.map(map, "")?,
            Report::Archive(archive) => renderer.archive(archive)?,
        }
    }
    Ok(())
}

struct TextRenderer<'w, W, S> {
    out: &'w mut W,
    sink: S,
    width: usize,
}

impl<W: Write, S: DiagnosticSink> TextRenderer<'_, W, S> {
    fn archive(&mut self, archive: &ArchiveReport) -> io::Result<()> {
        self.section_title(&archive.archive_name, "", '-')?;
        writeln!(
            self.out,
            "CRC:  {} (sv_currentPak: {})",
            archive.fingerprint,
            archive.fingerprint.engine_value()
        )?;
        writeln!(self.out)?;
        for map in &archive.maps {
            self.map(map, ARCHIVE_MAP_INDENT)?;
        }
        Ok(())
    }

    fn map(&mut self, map: &ReportedMap, indent: &str) -> io::Result<()> {
        self.section_title(&map.map_title, indent, '=')?;
        writeln!(self.out, "{}Map name: {}", indent, map.map_name)?;
        writeln!(self.out)?;

        self.section_title("Items", indent, '-')?;
        self.class_counts(&map.aggregated_items, item_name, indent)?;
        writeln!(self.out)?;

        self.section_title("Weapons", indent, '-')?;
        self.class_counts(&map.aggregated_weapons, weapon_name, indent)?;
        writeln!(self.out)?;

        if map.flags.any() {
            self.section_title("Properties", indent, '-')?;
            for capability in Capability::ALL {
                if map.flags.has(capability) {
                    self.entry(indent, capability_label(capability), "Yes")?;
                }
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn class_counts(
        &mut self,
        counts: &ClassCounts,
        display_name: fn(&str) -> Option<&'static str>,
        indent: &str,
    ) -> io::Result<()> {
        for (classname, count) in counts.iter() {
            match display_name(classname) {
                Some(label) => self.entry(indent, label, &format!("×{}", count))?,
                None => self.sink.report(Diagnostic::UnknownClass {
                    classname: classname.to_string(),
                }),
            }
        }
        Ok(())
    }

    fn entry(&mut self, indent: &str, label: &str, value: &str) -> io::Result<()> {
        writeln!(
            self.out,
            "{}{:.<width$} : {}",
            indent,
            label,
            value,
            width = self.width
        )
    }

    fn section_title(&mut self, title: &str, indent: &str, underline: char) -> io::Result<()> {
        let rule: String = std::iter::repeat(underline)
            .take(title.chars().count())
            .collect();
        writeln!(self.out, "{}{}", indent, title)?;
        writeln!(self.out, "{}{}", indent, rule)?;
        writeln!(self.out)
    }
}

/// Writes all reports as one pretty-printed JSON array.
pub fn render_json<W: Write>(reports: &[Report], out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, reports)?;
    writeln!(out)
}

/// Writes the raw entity records of every surveyed map, keyed by map name.
/// A name seen twice keeps the later map's records in the earlier position.
pub fn render_entities_json<W: Write>(surveys: &[Survey], out: &mut W) -> io::Result<()> {
    let mut dump = EntityDump::default();
    for survey in surveys {
        for map in survey.maps() {
            dump.insert(&map.map_name, &map.entities);
        }
    }
    serde_json::to_writer_pretty(&mut *out, &dump)?;
    writeln!(out)
}

#[derive(Default)]
struct EntityDump<'a> {
    maps: Vec<(&'a str, &'a [EntityRecord])>,
}

impl<'a> EntityDump<'a> {
    fn insert(&mut self, name: &'a str, entities: &'a [EntityRecord]) {
        match self.maps.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = entities,
            None => self.maps.push((name, entities)),
        }
    }
}

impl Serialize for EntityDump<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.maps.len()))?;
        for (name, entities) in &self.maps {
            map.serialize_entry(name, entities)?;
        }
        map.end()
    }
}
