use serde::{Deserialize, Serialize};

/// An assignment as listed by the grade source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: String,
    pub title: String,
}

impl AssignmentRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        AssignmentRecord {
            id: id.into(),
            title: title.into(),
        }
    }
}
