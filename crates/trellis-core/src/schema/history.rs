/// Append-only versioning configuration of a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    /// Column holding the backend-generated revision, the physical key
    pub revision_id: String,

    /// Column chaining a revision to the one it replaced
    pub parent_id: String,

    /// Skip writing a revision when no tracked column changed
    pub change_check: bool,
}

impl History {
    pub fn is_history_column(&self, name: &str) -> bool {
        name == self.revision_id || name == self.parent_id
    }
}
