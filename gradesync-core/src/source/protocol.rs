//! Defines the JSON protocol used for communication between gradesync
//! and grade source binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::assignment::AssignmentRecord;

pub trait SourceCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListAssignments,
    FetchGrades,
}

/// Request sent from gradesync to a source.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a source to gradesync.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

/// List every assignment of a course.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListAssignments {
    pub course_id: String,
}

impl SourceCommand for ListAssignments {
    type Response = Vec<AssignmentRecord>;
    fn command() -> Command {
        Command::ListAssignments
    }
}

/// Download the grade export (CSV text) of one assignment.
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchGrades {
    pub course_id: String,
    pub assignment_id: String,
}

impl SourceCommand for FetchGrades {
    type Response = String;
    fn command() -> Command {
        Command::FetchGrades
    }
}
