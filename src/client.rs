use reqwest::{header, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{Course, EnrollmentRecord};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("bad upstream path {0}")]
    Path(String),
}

/// Thin client for the MITx Online catalog and enrollment API.
#[derive(Clone, Debug)]
pub struct MitxOnlineClient {
    http: reqwest::Client,
    base: Url,
}

impl MitxOnlineClient {
    pub fn new(cfg: &AppConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .gzip(true)
            .build()?;
        Ok(Self { http, base: cfg.api_base.clone() })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|_| ClientError::Path(path.to_string()))
    }

    fn with_cookie(req: reqwest::RequestBuilder, cookie: Option<&str>) -> reqwest::RequestBuilder {
        match cookie {
            Some(c) => req.header(header::COOKIE, c),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, cookie: Option<&str>) -> Result<T, ClientError> {
        let url = self.url(path)?;
        let res = Self::with_cookie(self.http.get(url.clone()), cookie).send().await?;
        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%status, %url, "upstream request rejected");
            return Err(ClientError::Status { status, url: url.to_string() });
        }
        Ok(res.json::<T>().await?)
    }

    pub async fn course(&self, id: i64, cookie: Option<&str>) -> Result<Course, ClientError> {
        self.get_json(&format!("api/v2/courses/{id}/"), cookie).await
    }

    pub async fn enrollments(&self, cookie: Option<&str>) -> Result<Vec<EnrollmentRecord>, ClientError> {
        self.get_json("api/v1/enrollments/", cookie).await
    }

    pub async fn create_enrollment(&self, run_id: i64, cookie: Option<&str>) -> Result<(), ClientError> {
        let url = self.url("api/v1/enrollments/")?;
        let res = Self::with_cookie(self.http.post(url.clone()), cookie)
            .json(&json!({ "run_id": run_id }))
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%status, %url, run_id, "enrollment not created");
            return Err(ClientError::Status { status, url: url.to_string() });
        }
        tracing::info!(run_id, "enrollment created");
        Ok(())
    }
}
