//! Entity lump text parsing.
//!
//! The lump is a line oriented sequence of brace delimited blocks, each line
//! inside a block holding one `"key" "value"` pair:
//!
//! ```text
//! {
//! "classname" "worldspawn"
//! "message" "SpineBender"
//! }
//! ```
//!
//! [`EntityParser`] walks the text once and yields records lazily. The first
//! grammar violation ends the sequence with an error; nothing after it is
//! produced.

use std::mem;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::diagnostic::{Diagnostic, DiagnosticSink};

pub const CLASSNAME_KEY: &str = "classname";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    #[error("entity lump is not ascii (byte {offset})")]
    NotAscii { offset: usize },
    #[error("expected object start at line {line}")]
    ExpectedObjectStart { line: usize },
    #[error("expected string literal key at line {line}")]
    ExpectedKey { line: usize },
    #[error("expected string literal value at line {line}")]
    ExpectedValue { line: usize },
}

impl EntityError {
    /// 1-based line number for grammar errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            EntityError::NotAscii { .. } => None,
            EntityError::ExpectedObjectStart { line }
            | EntityError::ExpectedKey { line }
            | EntityError::ExpectedValue { line } => Some(*line),
        }
    }
}

/// One entity block: keys in first-seen order, each key unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityRecord {
    fields: Vec<(String, String)>,
}

impl EntityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn classname(&self) -> Option<&str> {
        self.get(CLASSNAME_KEY)
    }

    /// Sets `key`, keeping its original position when it already exists.
    /// Returns the replaced value.
    pub fn insert(&mut self, key: String, value: String) -> Option<String> {
        match self.fields.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => Some(mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EntityRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = EntityRecord::new();
        for (key, value) in iter {
            record.insert(key.into(), value.into());
        }
        record
    }
}

impl Serialize for EntityRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Views lump bytes as text, rejecting anything outside 7-bit ASCII.
pub fn decode_lump(lump: &[u8]) -> Result<&str, EntityError> {
    if let Some(offset) = lump.iter().position(|byte| !byte.is_ascii()) {
        return Err(EntityError::NotAscii { offset });
    }
    std::str::from_utf8(lump).map_err(|err| EntityError::NotAscii {
        offset: err.valid_up_to(),
    })
}

/// Decodes and parses a whole lump, collecting every valid record.
pub fn read_entities<S: DiagnosticSink>(
    lump: &[u8],
    sink: S,
) -> Result<Vec<EntityRecord>, EntityError> {
    let text = decode_lump(lump)?;
    EntityParser::new(text, sink).collect()
}

enum ParseState {
    AwaitingObject,
    InObject {
        record: EntityRecord,
        opened_at: usize,
    },
}

/// Single-pass iterator over the records of an entity lump.
pub struct EntityParser<'a, S> {
    lines: LumpLines<'a>,
    line_no: usize,
    state: ParseState,
    sink: S,
    finished: bool,
}

impl<'a, S: DiagnosticSink> EntityParser<'a, S> {
    pub fn new(text: &'a str, sink: S) -> Self {
        Self {
            lines: LumpLines { rest: text },
            line_no: 0,
            state: ParseState::AwaitingObject,
            sink,
            finished: false,
        }
    }

    fn step(&mut self, line: &str) -> Result<Option<EntityRecord>, EntityError> {
        let line_no = self.line_no;
        match &mut self.state {
            ParseState::AwaitingObject => {
                if !is_brace_line(line, b'{') {
                    return Err(EntityError::ExpectedObjectStart { line: line_no });
                }
                self.state = ParseState::InObject {
                    record: EntityRecord::new(),
                    opened_at: line_no,
                };
                Ok(None)
            }
            ParseState::InObject { record, .. } => {
                if is_brace_line(line, b'}') {
                    let record = mem::take(record);
                    self.state = ParseState::AwaitingObject;
                    if record.classname().is_none() {
                        self.sink
                            .report(Diagnostic::ClasslessObject { line: line_no });
                        return Ok(None);
                    }
                    return Ok(Some(record));
                }
                let (key, value) = parse_key_value(line, line_no)?;
                if record.insert(key.to_string(), value.to_string()).is_some() {
                    self.sink.report(Diagnostic::DuplicateKey {
                        key: key.to_string(),
                        line: line_no,
                    });
                }
                Ok(None)
            }
        }
    }
}

impl<S: DiagnosticSink> Iterator for EntityParser<'_, S> {
    type Item = Result<EntityRecord, EntityError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let Some(line) = self.lines.next() else {
                self.finished = true;
                if let ParseState::InObject { opened_at, .. } =
                    mem::replace(&mut self.state, ParseState::AwaitingObject)
                {
                    self.sink
                        .report(Diagnostic::UnterminatedObject { line: opened_at });
                }
                return None;
            };
            self.line_no += 1;
            // Some compilers leave the lump terminator on a line of its own.
            if line == "\0" {
                continue;
            }
            match self.step(line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Splits on every ASCII line boundary (`\n`, `\r\n`, `\r`, vertical tab,
/// form feed and the file, group and record separators). A trailing
/// terminator does not produce an extra empty line.
struct LumpLines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for LumpLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        match self.rest.find(is_line_break) {
            Some(pos) => {
                let line = &self.rest[..pos];
                let skip = if self.rest[pos..].starts_with("\r\n") {
                    2
                } else {
                    1
                };
                self.rest = &self.rest[pos + skip..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = "";
                Some(line)
            }
        }
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e'
    )
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn skip_space(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && is_space(bytes[pos]) {
        pos += 1;
    }
    pos
}

fn is_brace_line(line: &str, brace: u8) -> bool {
    let bytes = line.as_bytes();
    let start = skip_space(bytes, 0);
    bytes.get(start) == Some(&brace) && skip_space(bytes, start + 1) == bytes.len()
}

/// Matches `\s*"[^"]*"\s*` at `pos`, returning the literal body and the
/// position after the trailing whitespace.
fn parse_quoted(line: &str, pos: usize) -> Option<(&str, usize)> {
    let bytes = line.as_bytes();
    let open = skip_space(bytes, pos);
    if bytes.get(open) != Some(&b'"') {
        return None;
    }
    let body_start = open + 1;
    let body_len = bytes[body_start..].iter().position(|&b| b == b'"')?;
    let body_end = body_start + body_len;
    Some((&line[body_start..body_end], skip_space(bytes, body_end + 1)))
}

fn parse_key_value(line: &str, line_no: usize) -> Result<(&str, &str), EntityError> {
    let (key, next) =
        parse_quoted(line, 0).ok_or(EntityError::ExpectedKey { line: line_no })?;
    match parse_quoted(line, next) {
        Some((value, end)) if end == line.len() => Ok((key, value)),
        _ => Err(EntityError::ExpectedValue { line: line_no }),
    }
}
