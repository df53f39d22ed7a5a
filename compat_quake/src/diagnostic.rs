use std::fmt;

/// A non-fatal finding raised while reading or summarizing map content.
///
/// Diagnostics never abort processing: the offending field or record is
/// dropped or substituted and the caller decides how to surface them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A key appeared twice in one entity block; the later value was kept.
    DuplicateKey { key: String, line: usize },
    /// An entity block closed without any `classname`; it was discarded.
    ClasslessObject { line: usize },
    /// The lump ended inside the block opened at `line`; the block was discarded.
    UnterminatedObject { line: usize },
    /// The worldspawn entity has no `message`; the map name stands in.
    MissingTitle { map: String },
    /// A counted classname has no display name and was left out of a listing.
    UnknownClass { classname: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateKey { key, line } => {
                write!(f, "duplicate key: {} at line {}", key, line)
            }
            Diagnostic::ClasslessObject { line } => {
                write!(f, "empty object at line {}", line)
            }
            Diagnostic::UnterminatedObject { line } => {
                write!(f, "unterminated object at line {}", line)
            }
            Diagnostic::MissingTitle { map } => {
                write!(f, "no message for worldspawn in {}", map)
            }
            Diagnostic::UnknownClass { classname } => {
                write!(f, "unknown class: {}", classname)
            }
        }
    }
}

/// Receiver for diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl DiagnosticSink for Discard {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}
