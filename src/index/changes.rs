//! Dirty-state tracking and changelog text.

/// Mutation state of one entity since the last write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Change {
    /// Unchanged since load or last write
    #[default]
    Clean,
    /// Created since the last write
    New,
    /// Existing entity whose own attributes changed
    Modified,
}

impl Change {
    /// Record an attribute change. New entities stay new.
    pub fn touch(&mut self) {
        if *self == Self::Clean {
            *self = Self::Modified;
        }
    }

    /// Whether any change is pending.
    #[must_use]
    pub fn is_dirty(self) -> bool {
        self != Self::Clean
    }
}

/// Counts of new, modified and removed entities of one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Entities created
    pub new: usize,
    /// Entities whose attributes changed
    pub modified: usize,
    /// Entities deleted
    pub removed: usize,
}

impl Tally {
    /// Count one entity according to its state.
    pub fn record(&mut self, change: Change) {
        match change {
            Change::Clean => {}
            Change::New => self.new += 1,
            Change::Modified => self.modified += 1,
        }
    }

    /// Whether nothing was counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new == 0 && self.modified == 0 && self.removed == 0
    }
}

/// Builds the comma-joined summary, one kind at a time.
#[derive(Debug, Default)]
pub struct Changelog {
    parts: Vec<String>,
}

impl Changelog {
    /// Append the non-zero counts of one entity kind.
    pub fn add(&mut self, tally: Tally, singular: &str, plural: &str) {
        for (count, label) in [
            (tally.new, "new"),
            (tally.modified, "modified"),
            (tally.removed, "removed"),
        ] {
            if count > 0 {
                let noun = if count == 1 { singular } else { plural };
                self.parts.push(format!("{count} {label} {noun}"));
            }
        }
    }

    /// Append a fixed marker.
    pub fn note(&mut self, text: &str) {
        self.parts.push(text.to_string());
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Final text.
    #[must_use]
    pub fn finish(self) -> String {
        self.parts.join(", ")
    }
}
