use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header::HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub const TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Student {
    pub id: u64,
    #[serde(flatten)]
    pub fields: StudentInput,
}

/// Body of POST and PUT. An `id` in the body is ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub country: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub btc_address: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(rename = "_page")]
    pub page: Option<usize>,
    #[serde(rename = "_limit")]
    pub limit: Option<usize>,
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    students: BTreeMap<u64, Student>,
}

impl Store {
    fn insert(&mut self, fields: StudentInput) -> Student {
        self.next_id += 1;
        let student = Student {
            id: self.next_id,
            fields,
        };
        self.students.insert(student.id, student.clone());
        student
    }

    /// Field errors for `input`, or `None` if it may be stored. `own_id`
    /// excludes the record being updated from the uniqueness check.
    fn validate(&self, input: &StudentInput, own_id: Option<u64>) -> Option<HashMap<&'static str, String>> {
        let mut errors = HashMap::new();
        if !EmailAddress::is_valid(&input.email) {
            errors.insert("email", "Invalid email address".to_string());
        } else if self
            .students
            .values()
            .any(|s| Some(s.id) != own_id && s.fields.email.eq_ignore_ascii_case(&input.email))
        {
            errors.insert("email", "Email already exists".to_string());
        }
        (!errors.is_empty()).then_some(errors)
    }
}

pub type Db = Arc<RwLock<Store>>;

pub enum Rejection {
    NotFound,
    Invalid(HashMap<&'static str, String>),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::NotFound => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
            Rejection::Invalid(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": errors }))).into_response()
            }
        }
    }
}

pub fn app() -> Router {
    app_with(Vec::new())
}

/// Router whose store starts with `seed`, ids assigned from 1 in order.
pub fn app_with(seed: Vec<StudentInput>) -> Router {
    let mut store = Store::default();
    for fields in seed {
        store.insert(fields);
    }
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

/// Deterministic sample records for seeding.
pub fn sample_students(count: usize) -> Vec<StudentInput> {
    const GENDERS: [&str; 3] = ["male", "female", "other"];
    const COUNTRIES: [&str; 4] = ["Vietnam", "Japan", "Brazil", "Canada"];
    (1..=count)
        .map(|n| StudentInput {
            first_name: format!("First{n}"),
            last_name: format!("Last{n}"),
            email: format!("student{n}@example.com"),
            gender: GENDERS[n % GENDERS.len()].to_string(),
            country: COUNTRIES[n % COUNTRIES.len()].to_string(),
            avatar: String::new(),
            btc_address: format!("1Student{n:04}"),
        })
        .collect()
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Vec::new()).await
}

pub async fn run_with(listener: TcpListener, seed: Vec<StudentInput>) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, seeded = seed.len(), "mock students API listening");
    }
    axum::serve(listener, app_with(seed)).await
}

async fn list_students(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let store = db.read().await;
    let total = store.students.len();
    let all = store.students.values();
    let page: Vec<Student> = match (params.page, params.limit) {
        (None, None) => all.cloned().collect(),
        (page, limit) => {
            let limit = limit.unwrap_or(DEFAULT_LIMIT);
            let start = page.unwrap_or(1).max(1).saturating_sub(1).saturating_mul(limit);
            all.skip(start).take(limit).cloned().collect()
        }
    };
    debug!(?params, total, returned = page.len(), "list students");
    ([(TOTAL_COUNT, total.to_string())], Json(page))
}

async fn create_student(
    State(db): State<Db>,
    Json(input): Json<StudentInput>,
) -> Result<(StatusCode, Json<Student>), Rejection> {
    let mut store = db.write().await;
    if let Some(errors) = store.validate(&input, None) {
        return Err(Rejection::Invalid(errors));
    }
    let student = store.insert(input);
    Ok((StatusCode::CREATED, Json(student)))
}

/// Ids are numeric; anything else names no record.
fn parse_id(raw: &str) -> Result<u64, Rejection> {
    raw.parse().map_err(|_| Rejection::NotFound)
}

async fn get_student(
    State(db): State<Db>,
    Path(raw): Path<String>,
) -> Result<Json<Student>, Rejection> {
    let id = parse_id(&raw)?;
    let store = db.read().await;
    store.students.get(&id).cloned().map(Json).ok_or(Rejection::NotFound)
}

async fn update_student(
    State(db): State<Db>,
    Path(raw): Path<String>,
    Json(input): Json<StudentInput>,
) -> Result<Json<Student>, Rejection> {
    let id = parse_id(&raw)?;
    let mut store = db.write().await;
    if !store.students.contains_key(&id) {
        return Err(Rejection::NotFound);
    }
    if let Some(errors) = store.validate(&input, Some(id)) {
        return Err(Rejection::Invalid(errors));
    }
    let student = Student { id, fields: input };
    store.students.insert(id, student.clone());
    Ok(Json(student))
}

async fn delete_student(
    State(db): State<Db>,
    Path(raw): Path<String>,
) -> Result<Json<serde_json::Value>, Rejection> {
    let id = parse_id(&raw)?;
    let mut store = db.write().await;
    store
        .students
        .remove(&id)
        .map(|_| Json(json!({})))
        .ok_or(Rejection::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str) -> StudentInput {
        StudentInput {
            first_name: "Test".to_string(),
            last_name: "Student".to_string(),
            email: email.to_string(),
            gender: "other".to_string(),
            country: "VN".to_string(),
            avatar: String::new(),
            btc_address: String::new(),
        }
    }

    #[test]
    fn student_serializes_flat() {
        let student = Student {
            id: 4,
            fields: input("t@example.com"),
        };
        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["email"], "t@example.com");
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn input_ignores_id_and_defaults_optional_fields() {
        let input: StudentInput = serde_json::from_str(
            r#"{"id":"9","first_name":"A","last_name":"B","email":"a@b.co","gender":"male","country":"VN"}"#,
        )
        .unwrap();
        assert_eq!(input.email, "a@b.co");
        assert!(input.avatar.is_empty());
    }

    #[test]
    fn input_rejects_missing_email() {
        let result: Result<StudentInput, _> = serde_json::from_str(r#"{"first_name":"A"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn ids_increase_from_one() {
        let mut store = Store::default();
        assert_eq!(store.insert(input("a@example.com")).id, 1);
        assert_eq!(store.insert(input("b@example.com")).id, 2);
    }

    #[test]
    fn validation_flags_bad_and_duplicate_email() {
        let mut store = Store::default();
        let existing = store.insert(input("taken@example.com"));

        let errors = store.validate(&input("nope"), None).unwrap();
        assert_eq!(errors["email"], "Invalid email address");

        let errors = store.validate(&input("TAKEN@example.com"), None).unwrap();
        assert_eq!(errors["email"], "Email already exists");

        assert!(store.validate(&input("taken@example.com"), Some(existing.id)).is_none());
        assert!(store.validate(&input("fresh@example.com"), None).is_none());
    }

    #[test]
    fn sample_students_have_unique_valid_emails() {
        let samples = sample_students(25);
        assert_eq!(samples.len(), 25);
        let mut store = Store::default();
        for s in samples {
            assert!(store.validate(&s, None).is_none());
            store.insert(s);
        }
    }
}
