//! HTTP adapters for the backend the intake client talks to.

use std::time::Duration;

use async_trait::async_trait;
use domain::{
    auth::{AuthEndpoint, AuthResponse, Credentials, Registration},
    collaborators::{
        MedicineCatalog, PrescriptionDocument, PrescriptionRequest, PrescriptionWriter,
        SearchOutcome,
    },
    Error,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

const AUTH: &str = "auth endpoint";
const SEARCH: &str = "medicine search";
const PRESCRIPTION: &str = "prescription service";

/// JSON-over-HTTP client for the auth, search and prescription endpoints.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Unreachable {
                service: "http client".to_string(),
                message: e.to_string(),
                detail: None,
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(
        &self,
        service: &str,
        path: &str,
        body: &B,
        rejected: fn(String) -> Error,
    ) -> Result<R, Error>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(service, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(ErrorBody::into_detail);
            tracing::warn!(%status, service, "Backend refused request");

            if status.is_server_error() {
                return Err(Error::Unreachable {
                    service: service.to_string(),
                    message: detail.clone().unwrap_or_else(|| status.to_string()),
                    detail,
                });
            }
            return Err(rejected(detail.unwrap_or_default()));
        }

        response.json::<R>().await.map_err(|e| Error::Unreachable {
            service: service.to_string(),
            message: format!("unexpected response: {}", e),
            detail: None,
        })
    }

    fn transport_error(&self, service: &str, err: reqwest::Error) -> Error {
        let message = if err.is_connect() {
            format!("cannot connect to {}", self.base_url)
        } else if err.is_timeout() {
            format!("request timed out after {}s", self.timeout.as_secs())
        } else {
            err.to_string()
        };
        Error::Unreachable {
            service: service.to_string(),
            message,
            detail: None,
        }
    }
}

/// FastAPI-style error body. `detail` is a string for handled errors and a
/// list for request validation failures.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Value,
}

impl ErrorBody {
    fn into_detail(self) -> Option<String> {
        match self.detail {
            Value::Null => None,
            Value::String(detail) => Some(detail),
            other => Some(other.to_string()),
        }
    }
}

fn auth_rejected(detail: String) -> Error {
    Error::Auth { detail }
}

fn invalid_request(message: String) -> Error {
    Error::Validation { message }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    symptoms: &'a [String],
    health_conditions: &'a [String],
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    diagnosis: Value,
    #[serde(default)]
    medicines: Vec<domain::collaborators::Medicine>,
}

#[async_trait]
impl AuthEndpoint for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, Error> {
        self.post(AUTH, "/api/auth/login", credentials, auth_rejected).await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, Error> {
        self.post(AUTH, "/api/auth/register", registration, auth_rejected)
            .await
    }
}

#[async_trait]
impl MedicineCatalog for HttpBackend {
    async fn search(
        &self,
        symptoms: &[String],
        health_conditions: &[String],
    ) -> Result<SearchOutcome, Error> {
        let body = SearchRequest {
            symptoms,
            health_conditions,
        };
        let response: SearchResponse = self
            .post(SEARCH, "/api/medicines/search", &body, invalid_request)
            .await?;

        Ok(SearchOutcome {
            diagnosis: response.diagnosis,
            medicines: response.medicines,
        })
    }
}

#[async_trait]
impl PrescriptionWriter for HttpBackend {
    async fn generate(&self, request: &PrescriptionRequest) -> Result<PrescriptionDocument, Error> {
        self.post(PRESCRIPTION, "/api/prescription/generate", request, invalid_request)
            .await
    }
}
