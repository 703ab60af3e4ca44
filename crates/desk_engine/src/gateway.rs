use std::time::Duration;

use desk_core::{
    AnalysisRequest, ComparisonRequest, ComparisonResult, GatewayError, Job, JobId, JobPage,
};
use desk_logging::{desk_debug, desk_trace};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::wire::{self, CompareBody, SubmitBody, WireJob, WirePage};

const QUERIES_PATH: &str = "api/v1/queries/";
const COMPARE_PATH: &str = "api/v1/ai/compare";

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    /// Sent as a bearer token on every request when present.
    pub token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Remote job service. Every failure is classified into a [`GatewayError`].
#[async_trait::async_trait]
pub trait JobGateway: Send + Sync {
    async fn submit(&self, request: &AnalysisRequest) -> Result<Job, GatewayError>;

    async fn fetch_all(&self, offset: u64, limit: u64) -> Result<JobPage, GatewayError>;

    async fn fetch_one(&self, job_id: JobId) -> Result<Job, GatewayError>;

    async fn remove(&self, job_id: JobId) -> Result<(), GatewayError>;

    async fn compare(&self, request: &ComparisonRequest)
        -> Result<ComparisonResult, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ReqwestGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let mut base = Url::parse(&settings.base_url)
            .map_err(|err| GatewayError::InvalidEndpoint(format!("{}: {err}", settings.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::InvalidEndpoint(settings.base_url));
        }
        // Url::join replaces the last segment unless the path ends with a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base,
            token: settings.token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base
            .join(path)
            .map_err(|err| GatewayError::InvalidEndpoint(err.to_string()))
    }

    fn job_url(&self, job_id: JobId) -> Result<Url, GatewayError> {
        self.endpoint(&format!("{QUERIES_PATH}{job_id}"))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Response, GatewayError> {
        desk_trace!("{method} {url}");
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let error = wire::classify_failure(status.as_u16(), status.canonical_reason(), &bytes);
        desk_debug!("request failed with {status}: {error}");
        Err(error)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes).map_err(|err| wire::malformed(status, err))
    }

    async fn read_job(response: Response) -> Result<Job, GatewayError> {
        let status = response.status().as_u16();
        let wire: WireJob = Self::read_json(response).await?;
        wire.into_job().map_err(|err| wire::malformed(status, err))
    }
}

fn encode<T: Serialize>(body: &T) -> Result<Vec<u8>, GatewayError> {
    serde_json::to_vec(body).map_err(|err| GatewayError::Validation(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        return GatewayError::Transport(format!("timed out: {err}"));
    }
    GatewayError::Transport(err.to_string())
}

#[async_trait::async_trait]
impl JobGateway for ReqwestGateway {
    async fn submit(&self, request: &AnalysisRequest) -> Result<Job, GatewayError> {
        let body = encode(&SubmitBody {
            query_text: request.request_text(),
            query_type: request.kind(),
            ticker: request.ticker(),
        })?;
        let response = self
            .send(Method::POST, self.endpoint(QUERIES_PATH)?, Some(body))
            .await?;
        Self::read_job(response).await
    }

    async fn fetch_all(&self, offset: u64, limit: u64) -> Result<JobPage, GatewayError> {
        let mut url = self.endpoint(QUERIES_PATH)?;
        url.query_pairs_mut()
            .append_pair("skip", &offset.to_string())
            .append_pair("limit", &limit.to_string());

        let response = self.send(Method::GET, url, None).await?;
        let status = response.status().as_u16();
        let page: WirePage = Self::read_json(response).await?;
        page.into_page().map_err(|err| wire::malformed(status, err))
    }

    async fn fetch_one(&self, job_id: JobId) -> Result<Job, GatewayError> {
        let response = self.send(Method::GET, self.job_url(job_id)?, None).await?;
        Self::read_job(response).await
    }

    async fn remove(&self, job_id: JobId) -> Result<(), GatewayError> {
        let response = self
            .send(Method::DELETE, self.job_url(job_id)?, None)
            .await?;
        if response.status() != StatusCode::NO_CONTENT {
            desk_debug!("delete of job {job_id} answered {}", response.status());
        }
        Ok(())
    }

    async fn compare(
        &self,
        request: &ComparisonRequest,
    ) -> Result<ComparisonResult, GatewayError> {
        let body = encode(&CompareBody {
            tickers: request.tickers(),
            period: request.period(),
        })?;
        let response = self
            .send(Method::POST, self.endpoint(COMPARE_PATH)?, Some(body))
            .await?;
        let payload: serde_json::Value = Self::read_json(response).await?;
        let period = payload
            .get("period")
            .and_then(|period| period.as_str())
            .unwrap_or(request.period())
            .to_string();

        Ok(ComparisonResult {
            tickers: request.tickers().to_vec(),
            period,
            payload,
        })
    }
}
