//! Client-side routes and the form mode derived from them.

use std::fmt;

use crate::types::StudentId;

/// A screen address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/students` or `/students?page=N`.
    Students { page: u32 },
    /// `/students/add`.
    AddStudent,
    /// `/students/{id}`.
    EditStudent(StudentId),
}

impl Route {
    /// Parse a path with optional query string. An absent, zero or
    /// non-numeric `page` falls back to page 1.
    pub fn parse(location: &str) -> Option<Route> {
        let (path, query) = match location.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (location, None),
        };
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["students"] => Some(Route::Students {
                page: query.and_then(page_param).unwrap_or(1),
            }),
            ["students", "add"] => Some(Route::AddStudent),
            ["students", id] if !id.is_empty() => Some(Route::EditStudent(StudentId::from(*id))),
            _ => None,
        }
    }

    /// Form mode for this route; `None` for the list.
    pub fn form_mode(&self) -> Option<FormMode> {
        match self {
            Route::Students { .. } => None,
            Route::AddStudent => Some(FormMode::Add),
            Route::EditStudent(id) => Some(FormMode::Edit(id.clone())),
        }
    }
}

fn page_param(query: &str) -> Option<u32> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "page")
        .and_then(|(_, v)| v.parse::<u32>().ok())
        .filter(|page| *page > 0)
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Students { page } => write!(f, "/students?page={page}"),
            Route::AddStudent => f.write_str("/students/add"),
            Route::EditStudent(id) => write!(f, "/students/{id}"),
        }
    }
}

/// Whether the form creates a new student or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(StudentId),
}

impl FormMode {
    pub fn is_add(&self) -> bool {
        matches!(self, FormMode::Add)
    }

    pub fn edit_id(&self) -> Option<&StudentId> {
        match self {
            FormMode::Add => None,
            FormMode::Edit(id) => Some(id),
        }
    }
}
