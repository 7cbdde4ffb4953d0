use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::GitHubSettings;

const USER_AGENT: &str = "lit-contract-registry";

/// One file entry returned by the GitHub contents API.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoFile {
    pub name: String,
    pub download_url: Option<String>,
}

/// Minimal GitHub API client for registry generation: directory listings,
/// raw JSON downloads, and last-commit dates.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
    owner: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> Self {
        Self {
            client: Client::new(),
            api_base: settings.api_base.clone(),
            owner: settings.owner.clone(),
            token: settings.token.clone(),
        }
    }

    // GitHub rejects requests without a User-Agent.
    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url).header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request
    }

    /// Contents API URL for a directory on a branch.
    pub fn contents_url(&self, repo: &str, path: &str, branch: &str) -> String {
        format!(
            "{}/{}/{}/contents/{}?ref={}",
            self.api_base, self.owner, repo, path, branch
        )
    }

    /// List the files of a repo directory.
    pub async fn list_dir(&self, repo: &str, path: &str, branch: &str) -> Result<Vec<RepoFile>> {
        let url = self.contents_url(repo, path, branch);
        debug!("Listing {}", url);

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach GitHub API: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "GitHub API returned {} for {}",
                response.status(),
                url
            ));
        }

        let files: Vec<RepoFile> = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse directory listing from {}: {}", url, e))?;

        Ok(files)
    }

    /// Download a JSON document from an arbitrary URL (raw file contents).
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        debug!("Fetching {}", url);

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to fetch {}: {}", url, e))?;

        if !response.status().is_success() {
            return Err(anyhow!("{} returned {}", url, response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse JSON from {}: {}", url, e))
    }

    /// Date of the most recent commit touching a path.
    pub async fn last_commit_date(&self, repo: &str, path: &str) -> Result<String> {
        let url = format!(
            "{}/{}/{}/commits?path={}&per_page=1",
            self.api_base, self.owner, repo, path
        );
        let commits = self.fetch_json(&url).await?;

        commits
            .get(0)
            .and_then(|commit| commit["commit"]["committer"]["date"].as_str())
            .map(|date| date.to_string())
            .ok_or_else(|| anyhow!("No commit date found for {}/{}", repo, path))
    }
}
