/// Outcome of comparing a parcel's selected-developer list before and after
/// an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDiff {
    /// Developers present before but absent after.
    pub unsubscribed: Vec<i64>,
    /// Developers absent before but present after.
    pub subscribed: Vec<i64>,
}

impl SelectionDiff {
    pub fn is_empty(&self) -> bool {
        self.unsubscribed.is_empty() && self.subscribed.is_empty()
    }
}

/// Compare the old and new selected lists wholesale.
///
/// Must be computed against the in-memory "before" list, prior to the stored
/// list being overwritten. Developers present in both lists (or neither) get
/// no notification. Output preserves first-seen input order, deduplicated.
pub fn diff(old_selected: &[i64], new_selected: &[i64]) -> SelectionDiff {
    SelectionDiff {
        unsubscribed: missing_from(old_selected, new_selected),
        subscribed: missing_from(new_selected, old_selected),
    }
}

fn missing_from(from: &[i64], other: &[i64]) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::new();
    for &id in from {
        if !other.contains(&id) && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
