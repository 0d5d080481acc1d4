//! Runtime configuration: CLI flags, then environment (including `.env`),
//! then defaults.

use std::time::Duration;

use clap::Args;
use student_core::{LIST_REQUEST_TIMEOUT, PAGE_LIMIT};

use crate::error::{AppError, AppResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Freshness window for single-student reads.
pub const STUDENT_STALE_TIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Base URL of the students API.
    #[arg(long, global = true, env = "STUDENTS_API_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Rows per list page.
    #[arg(long, global = true, env = "STUDENTS_PAGE_LIMIT", default_value_t = PAGE_LIMIT)]
    pub page_limit: u32,

    /// Seconds before an in-flight list request is aborted.
    #[arg(long, global = true, env = "STUDENTS_TIMEOUT_SECS", default_value_t = LIST_REQUEST_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    pub page_limit: u32,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: PAGE_LIMIT,
            request_timeout: LIST_REQUEST_TIMEOUT,
        }
    }
}

impl AppConfig {
    pub fn validate(self) -> AppResult<Self> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if self.page_limit == 0 {
            return Err(AppError::Config("page limit must be positive".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(AppError::Config("timeout must be positive".to_string()));
        }
        Ok(self)
    }
}

impl TryFrom<ConfigArgs> for AppConfig {
    type Error = AppError;

    fn try_from(args: ConfigArgs) -> AppResult<Self> {
        AppConfig {
            base_url: args.base_url,
            page_limit: args.page_limit,
            request_timeout: Duration::from_secs(args.timeout_secs),
        }
        .validate()
    }
}
