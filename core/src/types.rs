//! Domain DTOs for the students API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently;
//! integration tests catch drift between the two crates. Ids are assigned by
//! the server and may arrive as JSON numbers or strings, so `StudentId`
//! accepts both and always carries the textual form.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned identifier of a student.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for StudentId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for StudentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => StudentId(n.to_string()),
            Raw::Text(s) => StudentId(s),
        })
    }
}

/// Student gender. Capitalized spellings are accepted on input since the
/// form's radio values historically used them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "Male")]
    Male,
    #[serde(alias = "Female")]
    Female,
    #[default]
    #[serde(alias = "Other")]
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// A student record as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    #[serde(flatten)]
    pub fields: NewStudent,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.fields.first_name, self.fields.last_name)
            .trim()
            .to_string()
    }
}

/// Request payload for creating a student: every field but `id`.
///
/// Missing fields deserialize to their empty value, matching a freshly
/// initialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub country: String,
    pub avatar: String,
    pub btc_address: String,
}

impl NewStudent {
    pub fn with_id(self, id: StudentId) -> Student {
        Student { id, fields: self }
    }
}

/// One page of the student list plus the server's total record count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentPage {
    pub students: Vec<Student>,
    pub total_count: u64,
}
