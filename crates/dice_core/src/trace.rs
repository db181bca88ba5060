//! Ordered, append-only audit log of atomic rolls.
//!
//! A structured record attached to each roll, not a call into an external
//! logging crate. Backed by a plain `Vec` — append-only, ordered, and
//! arena-free — so it survives exactly as long as the `Context` that owns
//! it and is cleared in O(1) by `Vec::clear`.

use std::fmt::Write as _;
use std::io;

/// One atomic `rng.roll(sides)` outcome.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEntry {
    pub sides: i32,
    pub result: i32,
    pub selected: bool,
}

impl TraceEntry {
    pub fn new(sides: i32, result: i32, selected: bool) -> Self {
        TraceEntry { sides, result, selected }
    }
}

/// Ordered log of [`TraceEntry`] values for one `evaluate` call.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self {
        Trace { entries: Vec::new() }
    }

    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Count of entries with `selected == true`.
    pub fn selected_count(&self) -> usize {
        self.entries.iter().filter(|e| e.selected).count()
    }

    /// Render the human-readable format:
    ///
    /// ```text
    /// Individual dice results:
    ///   d6 -> 4
    ///   d6 -> 5*
    /// ```
    ///
    /// An empty trace renders as an empty string.
    pub fn format_string(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut out = String::from("Individual dice results:\n");
        for e in &self.entries {
            let _ = write!(out, "  d{} -> {}", e.sides, e.result);
            if e.selected {
                out.push('*');
            }
            out.push('\n');
        }
        out
    }

    /// Stream variant of [`Trace::format_string`]; writes nothing for an
    /// empty trace.
    pub fn format_stream(&self, w: &mut impl io::Write) -> io::Result<()> {
        w.write_all(self.format_string().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trace_formats_to_nothing() {
        let t = Trace::new();
        assert_eq!(t.format_string(), "");
        let mut buf = Vec::new();
        t.format_stream(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn formats_selected_marker() {
        let mut t = Trace::new();
        t.push(TraceEntry::new(6, 4, true));
        t.push(TraceEntry::new(6, 1, false));
        let s = t.format_string();
        assert!(s.starts_with("Individual dice results:\n"));
        assert!(s.contains("  d6 -> 4*\n"));
        assert!(s.contains("  d6 -> 1\n"));
        assert!(!s.contains("1*"));
    }

    #[test]
    fn selected_count_counts_only_marked() {
        let mut t = Trace::new();
        t.push(TraceEntry::new(6, 4, true));
        t.push(TraceEntry::new(6, 1, false));
        t.push(TraceEntry::new(6, 6, true));
        assert_eq!(t.selected_count(), 2);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut t = Trace::new();
        t.push(TraceEntry::new(6, 4, true));
        t.clear();
        assert!(t.is_empty());
    }
}
