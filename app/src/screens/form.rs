//! The add/edit screen: drives `StudentForm` and the single-record cache.

use std::time::{Duration, Instant};

use student_core::{
    ApiError, Field, FormMode, QueryCache, QueryKey, Route, Student, StudentForm, StudentId,
    Submission, SubmitOutcome,
};
use tracing::{debug, info};

use crate::api::StudentsApi;
use crate::config::STUDENT_STALE_TIME;
use crate::error::AppResult;
use crate::render;

pub struct FormScreen {
    api: StudentsApi,
    form: StudentForm,
    records: QueryCache<Student>,
}

/// What a submit did, for the session to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub outcome: SubmitOutcome,
    /// A new record exists, so cached list pages are out of date.
    pub created: bool,
}

impl FormScreen {
    pub fn new(api: StudentsApi, mode: FormMode) -> Self {
        Self {
            api,
            form: StudentForm::new(mode),
            records: QueryCache::new(),
        }
    }

    pub fn form(&self) -> &StudentForm {
        &self.form
    }

    pub fn records(&self) -> &QueryCache<Student> {
        &self.records
    }

    pub fn navigate(&mut self, route: &Route) -> bool {
        self.form.navigate(route)
    }

    /// Fill the form in edit mode. Runs once per visit to an edited id; a
    /// fresh cached record is used without a request. A failed load is
    /// retried on the next call.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let Some(id) = self.form.take_fetch() else {
            return Ok(());
        };
        match self.read(&id, STUDENT_STALE_TIME).await {
            Ok(student) => {
                self.form.load(student);
                Ok(())
            }
            Err(err) => {
                self.form.retry_fetch();
                Err(err)
            }
        }
    }

    /// Warm the record cache for `id` unless it is fresher than `stale_time`.
    pub async fn prefetch(&mut self, id: &StudentId, stale_time: Duration) -> Result<(), ApiError> {
        self.read(id, stale_time).await.map(|_| ())
    }

    async fn read(&mut self, id: &StudentId, stale_time: Duration) -> Result<Student, ApiError> {
        let key = QueryKey::student(id.clone());
        if self.records.is_fresh(&key, stale_time, Instant::now()) {
            if let Some(student) = self.records.data(&key) {
                debug!(%id, "student served from cache");
                return Ok(student.clone());
            }
        }

        let begin = self.records.begin_fetch(key);
        let outcome = self.api.get(id).await;
        self.records.resolve(&begin.ticket, outcome.clone(), Instant::now());
        outcome
    }

    pub fn set_field(&mut self, field: Field, value: &str) -> AppResult<()> {
        self.form.set_field(field, value)?;
        Ok(())
    }

    /// Create or update according to the mode. A successful update is
    /// written through to the record cache.
    pub async fn submit(&mut self) -> Submitted {
        let (result, created) = match self.form.submit() {
            Submission::Create(input) => {
                let result = self.api.create(&input).await;
                let created = result.is_ok();
                (result, created)
            }
            Submission::Update { id, student } => {
                let result = self.api.update(&id, &student).await;
                if let Ok(saved) = &result {
                    self.records
                        .set_data(QueryKey::student(id), saved.clone(), Instant::now());
                }
                (result, false)
            }
        };
        if let Ok(student) = &result {
            info!(id = %student.id, created, "student saved");
        }
        let outcome = self.form.finish_submit(result).clone();
        Submitted { outcome, created }
    }

    pub fn render(&self) -> String {
        render::form(&self.form)
    }
}
