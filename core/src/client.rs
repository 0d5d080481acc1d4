//! Stateless HTTP request builder and response parser for the students API.
//!
//! # Design
//! `StudentClient` holds only a `base_url` and carries no mutable state
//! between calls. Each CRUD operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the round-trip, keeping the core
//! deterministic and free of I/O.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{NewStudent, Student, StudentId, StudentPage};

/// Response header carrying the unpaginated record count.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Synchronous, stateless client for the students API.
#[derive(Debug, Clone)]
pub struct StudentClient {
    base_url: String,
}

impl StudentClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection(&self) -> String {
        format!("{}/students", self.base_url)
    }

    fn member(&self, id: &StudentId) -> String {
        format!("{}/students/{id}", self.base_url)
    }

    pub fn build_list_students(&self, page: u32, limit: u32) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.collection())
            .with_query("_page", page)
            .with_query("_limit", limit)
    }

    pub fn build_get_student(&self, id: &StudentId) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.member(id))
    }

    pub fn build_create_student(&self, input: &NewStudent) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest::new(HttpMethod::Post, self.collection()).with_json_body(body))
    }

    pub fn build_update_student(&self, id: &StudentId, input: &Student) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest::new(HttpMethod::Put, self.member(id)).with_json_body(body))
    }

    pub fn build_delete_student(&self, id: &StudentId) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, self.member(id))
    }

    /// Parse a list response. The total count comes from `x-total-count`;
    /// a missing or malformed header counts as zero.
    pub fn parse_list_students(&self, response: HttpResponse) -> Result<StudentPage, ApiError> {
        check_status(&response, 200)?;
        let total_count = response
            .header(TOTAL_COUNT_HEADER)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let students = decode(&response.body)?;
        Ok(StudentPage { students, total_count })
    }

    pub fn parse_get_student(&self, response: HttpResponse) -> Result<Student, ApiError> {
        check_status(&response, 200)?;
        decode(&response.body)
    }

    pub fn parse_create_student(&self, response: HttpResponse) -> Result<Student, ApiError> {
        check_status(&response, 201)?;
        decode(&response.body)
    }

    pub fn parse_update_student(&self, response: HttpResponse) -> Result<Student, ApiError> {
        check_status(&response, 200)?;
        decode(&response.body)
    }

    pub fn parse_delete_student(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 200)?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
