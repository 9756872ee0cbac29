use anyhow::Context;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::Practicum;
use crate::error::PollError;

pub const PRACTICUM_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

#[derive(Clone)]
pub struct PracticumClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Validated API envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiAnswer {
    pub homeworks: Vec<Map<String, Value>>,
    pub current_date: i64,
}

impl PracticumClient {
    /// Build a client from the `practicum` section of the config.
    pub fn from_settings(token: String, settings: &Practicum) -> anyhow::Result<Self> {
        let endpoint = Url::parse(settings.endpoint.trim()).context("invalid Practicum endpoint")?;
        Self::with_endpoint(
            token,
            endpoint,
            Duration::from_secs(settings.request_timeout_secs),
            settings.use_system_proxy,
        )
    }

    pub fn with_endpoint(
        token: String,
        endpoint: Url,
        timeout: Duration,
        use_system_proxy: bool,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .user_agent("homework-watchbot/0.1")
            .timeout(timeout);
        if !use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_request(&self, from_date: i64) -> reqwest::Result<reqwest::Request> {
        self.http
            .get(self.endpoint.clone())
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .build()
    }

    /// Fetch statuses changed since `from_date` and decode the body as JSON.
    pub async fn get_api_answer(&self, from_date: i64) -> Result<Value, PollError> {
        let request = self
            .build_request(from_date)
            .map_err(|source| self.connection_error(source))?;
        debug!(url = %request.url(), "requesting homework statuses");

        let res = self
            .http
            .execute(request)
            .await
            .map_err(|source| self.connection_error(source))?;

        if res.status() != StatusCode::OK {
            return Err(PollError::UnexpectedStatus(res.status().as_u16()));
        }

        let body = res
            .text()
            .await
            .map_err(|source| self.connection_error(source))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn connection_error(&self, source: reqwest::Error) -> PollError {
        PollError::Connection {
            url: self.endpoint.to_string(),
            source,
        }
    }
}

/// Check the envelope and return its homework records.
///
/// `homeworks` must be an array of objects; an empty array is a valid answer.
pub fn check_response(response: Value) -> Result<ApiAnswer, PollError> {
    let Value::Object(mut envelope) = response else {
        return Err(PollError::UnexpectedType("Ответ API не является словарём"));
    };

    let homeworks = envelope
        .remove("homeworks")
        .ok_or(PollError::MissingKey("homeworks"))?;
    let current_date = envelope
        .get("current_date")
        .ok_or(PollError::MissingKey("current_date"))?
        .as_i64()
        .ok_or(PollError::UnexpectedType("Под ключом current_date не число"))?;

    let Value::Array(items) = homeworks else {
        return Err(PollError::UnexpectedType("Под ключом homeworks не список"));
    };
    let homeworks = items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            _ => Err(PollError::UnexpectedType("Элемент homeworks не словарь")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ApiAnswer {
        homeworks,
        current_date,
    })
}
