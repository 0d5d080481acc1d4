//! Executes core `HttpRequest`s with reqwest.
//!
//! # Design
//! Status codes are never errors here: every response that arrives is
//! returned as data for the core to interpret. Only failures to get a
//! response at all become `ApiError::Transport` or `ApiError::Timeout`.

use std::time::Duration;

use reqwest::Method;
use student_core::{ApiError, HttpMethod, HttpRequest, HttpResponse};
use tracing::{debug, warn};

use crate::error::AppResult;

/// Upper bound for requests issued without their own deadline.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
}

impl Transport {
    pub fn new() -> AppResult<Self> {
        let http = reqwest::Client::builder().timeout(CLIENT_TIMEOUT).build()?;
        Ok(Self { http })
    }

    /// Send `req`, giving up after `deadline` if one is set.
    pub async fn execute(&self, req: HttpRequest, deadline: Option<Duration>) -> Result<HttpResponse, ApiError> {
        let method = match req.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };
        let url = req.url();
        debug!(%method, %url, "sending request");

        let mut builder = self.http.request(method.clone(), &url);
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse { status, headers, body })
        };

        let outcome = match deadline {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(%method, %url, ?limit, "request aborted after deadline");
                    return Err(ApiError::Timeout);
                }
            },
            None => exchange.await,
        };

        match outcome {
            Ok(response) => {
                debug!(%method, %url, status = response.status, "response received");
                Ok(response)
            }
            Err(e) if e.is_timeout() => Err(ApiError::Timeout),
            Err(e) => {
                warn!(%method, %url, error = %e, "request failed");
                Err(ApiError::Transport(e.to_string()))
            }
        }
    }
}
