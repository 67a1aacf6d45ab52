//! Blocking client for the minting platform's REST API.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::metadata::{Nft, NftPage, Project, ProjectPage};

/// Anything that can serve projects and their NFTs page by page.
///
/// Implementations are shared across worker threads, one project per worker.
pub trait NftSource: Sync {
    fn nft_page(&self, project_id: u64, page: u32, limit: u32) -> Result<Vec<Nft>, FetchError>;

    fn project(&self, project_id: u64) -> Result<Project, FetchError>;

    fn project_page(&self, page: u32, limit: u32) -> Result<ProjectPage, FetchError>;
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(cfg: &ApiConfig, token: String) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| FetchError::Other(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, u32)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?query, "GET");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .map_err(|source| FetchError::Transport { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status: status.as_u16() });
        }

        let body = response
            .text()
            .map_err(|source| FetchError::Transport { url: url.clone(), source })?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode { url, source })
    }
}

impl NftSource for ApiClient {
    fn nft_page(&self, project_id: u64, page: u32, limit: u32) -> Result<Vec<Nft>, FetchError> {
        let page: NftPage = self.get_json(
            &format!("/projects/{project_id}/nfts"),
            &[("page", page), ("limit", limit)],
        )?;
        Ok(page.results)
    }

    fn project(&self, project_id: u64) -> Result<Project, FetchError> {
        self.get_json(&format!("/projects/{project_id}"), &[])
    }

    fn project_page(&self, page: u32, limit: u32) -> Result<ProjectPage, FetchError> {
        self.get_json("/projects/", &[("page", page), ("limit", limit)])
    }
}
