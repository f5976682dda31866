use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::credentials::Credentials;
use crate::log::{mask_token, TracingLog, ValidationLog};

pub const DEFAULT_ENDPOINT: &str = "https://api.hk.deliveroo.com/consumer/order-history/v1/orders";

/// Title given to the configuration entry created for a valid token.
pub const ENTRY_TITLE: &str = "Deliveroo HK";

const QUERY: [(&str, &str); 3] = [("limit", "1"), ("offset", "0"), ("include_ugc", "true")];

/// Classified result of a single validation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Success { title: String },
    CannotConnect,
    InvalidAuth,
    Unknown(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("failed to connect to Deliveroo HK API: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("Deliveroo HK API rejected the token with status {0}")]
    InvalidAuth(StatusCode),
    #[error("could not build validation request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("validation response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ValidationError {
    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_builder() {
            ValidationError::Request(error)
        } else {
            ValidationError::Connect(error)
        }
    }
}

#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, credentials: &Credentials) -> ValidationOutcome;
}

/// Checks a token by fetching one order from the order-history endpoint.
#[derive(Clone)]
pub struct DeliverooValidator {
    client: Client,
    endpoint: String,
    log: Arc<dyn ValidationLog>,
}

impl DeliverooValidator {
    /// Use a client owned by the host. Timeouts and pooling come from it.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            log: Arc::new(TracingLog),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_log(mut self, log: Arc<dyn ValidationLog>) -> Self {
        self.log = log;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run the request and surface failures as [`ValidationError`].
    pub async fn try_validate(&self, credentials: &Credentials) -> Result<String, ValidationError> {
        let language = credentials.locale.language_tag();
        self.log.debug(&format!(
            "Validating token - URL: {}, Headers: {{Authorization: Bearer {}, accept-language: {}}}, Params: {:?}",
            self.endpoint,
            mask_token(&credentials.token),
            language,
            QUERY,
        ));

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", credentials.token))
            .header(ACCEPT_LANGUAGE, language)
            .query(&QUERY)
            .send()
            .await
            .map_err(ValidationError::from_transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            self.log.debug(&format!(
                "Validation rejected with status {status}, response: {body}"
            ));
            return Err(ValidationError::InvalidAuth(status));
        }

        let body = response.bytes().await.map_err(ValidationError::Connect)?;
        self.log.debug(&format!(
            "Validation response: {}",
            String::from_utf8_lossy(&body)
        ));
        serde_json::from_slice::<Value>(&body)?;

        Ok(ENTRY_TITLE.to_string())
    }
}

#[async_trait]
impl TokenValidator for DeliverooValidator {
    async fn validate(&self, credentials: &Credentials) -> ValidationOutcome {
        match self.try_validate(credentials).await {
            Ok(title) => ValidationOutcome::Success { title },
            Err(err @ ValidationError::Connect(_)) => {
                self.log.error(&err.to_string());
                ValidationOutcome::CannotConnect
            }
            Err(ValidationError::InvalidAuth(_)) => ValidationOutcome::InvalidAuth,
            Err(err) => ValidationOutcome::Unknown(err.to_string()),
        }
    }
}
