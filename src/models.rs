use crate::constants::*;
use std::collections::HashMap;

/// One element observed at its end tag: the tag name and its attributes.
///
/// Records are handed out by value and dropped by the consumer before the
/// next element is read, so nothing from earlier in the document is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    pub tag: String,
    pub attributes: HashMap<String, String>,
}

impl ElementRecord {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder-style helper, mostly useful in tests.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the attribute value, or the empty string when absent.
    pub fn attr(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or("")
    }

    /// Projects `keys` in order into a full-width row.
    pub fn project(&self, keys: &[&str]) -> Row {
        Row(keys.iter().map(|key| self.attr(key).to_string()).collect())
    }
}

/// Named output dataset with a fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTable {
    Steps,
    Workouts,
}

impl OutputTable {
    pub const ALL: [OutputTable; 2] = [OutputTable::Steps, OutputTable::Workouts];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Workouts => "workouts",
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Self::Steps => STEPS_HEADER,
            Self::Workouts => WORKOUTS_HEADER,
        }
    }
}

/// Ordered text fields, one per header column of the destination table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(pub Vec<String>);

impl Row {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }
}

/// Run-scoped, monotonically increasing counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// `Record` elements observed, regardless of type
    pub records: u64,
    /// Rows projected into the steps table
    pub steps: u64,
    /// Rows projected into the workouts table
    pub workouts: u64,
}

impl Counters {
    /// Counter names and values in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> {
        [
            ("records", self.records),
            ("steps", self.steps),
            ("workouts", self.workouts),
        ]
        .into_iter()
    }

    /// Rows produced for `table` so far.
    pub fn rows(&self, table: OutputTable) -> u64 {
        match table {
            OutputTable::Steps => self.steps,
            OutputTable::Workouts => self.workouts,
        }
    }
}
