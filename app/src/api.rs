//! Async resource client: one round-trip per call, no retry.

use std::time::Duration;

use student_core::{ApiError, NewStudent, Student, StudentClient, StudentId, StudentPage};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct StudentsApi {
    client: StudentClient,
    transport: Transport,
    list_deadline: Duration,
}

impl StudentsApi {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            client: StudentClient::new(&config.base_url),
            transport: Transport::new()?,
            list_deadline: config.request_timeout,
        })
    }

    /// Aborted with `ApiError::Timeout` once the configured deadline passes.
    pub async fn list(&self, page: u32, limit: u32) -> Result<StudentPage, ApiError> {
        let req = self.client.build_list_students(page, limit);
        let response = self.transport.execute(req, Some(self.list_deadline)).await?;
        self.client.parse_list_students(response)
    }

    pub async fn get(&self, id: &StudentId) -> Result<Student, ApiError> {
        let response = self.transport.execute(self.client.build_get_student(id), None).await?;
        self.client.parse_get_student(response)
    }

    pub async fn create(&self, input: &NewStudent) -> Result<Student, ApiError> {
        let req = self.client.build_create_student(input)?;
        let response = self.transport.execute(req, None).await?;
        self.client.parse_create_student(response)
    }

    pub async fn update(&self, id: &StudentId, student: &Student) -> Result<Student, ApiError> {
        let req = self.client.build_update_student(id, student)?;
        let response = self.transport.execute(req, None).await?;
        self.client.parse_update_student(response)
    }

    pub async fn delete(&self, id: &StudentId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete_student(id), None).await?;
        self.client.parse_delete_student(response)
    }
}
