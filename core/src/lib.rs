//! Sans-IO client core for the students service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and models the two screens
//! that drive those requests: the paginated list and the add/edit form.
//!
//! # Design
//! - `StudentClient` is stateless; it holds only `base_url`.
//! - Each CRUD operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and the host owns cancellation and timeouts.
//! - `QueryCache` is the request-state store both screens read from; it takes
//!   `now` from the caller and never sleeps or spawns.
//! - `ListView` and `StudentForm` are plain state; a host renders their
//!   snapshots and feeds results back in.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod form;
pub mod http;
pub mod list;
pub mod query;
pub mod route;
pub mod types;

pub use client::{StudentClient, TOTAL_COUNT_HEADER};
pub use error::{ApiError, FieldErrors};
pub use form::{Field, FormError, StudentForm, Submission, SubmitOutcome};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use list::{ListPhase, ListSnapshot, ListView, Pagination, LIST_REQUEST_TIMEOUT, PAGE_LIMIT};
pub use query::{BeginFetch, FetchTicket, QueryCache, QueryKey, QueryState, QueryStatus};
pub use route::{FormMode, Route};
pub use types::{Gender, NewStudent, Student, StudentId, StudentPage};
