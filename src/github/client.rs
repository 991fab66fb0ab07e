use crate::cache::{Page, PageFetcher};
use crate::config::Config;
use crate::github::api_types::{ApiResponse, STARS_QUERY};
use crate::github::types::Repo;
use color_eyre::{eyre::eyre, Result};
use serde_json::json;

/// GitHub GraphQL client wrapper
#[derive(Clone)]
pub struct GitHubClient {
  http: reqwest::Client,
  api_url: String,
  token: String,
}

impl GitHubClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("gh-stars/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      api_url: config.api_url.clone(),
      token,
    })
  }

  /// Fetch one page of the viewer's starred repositories, newest first
  pub async fn starred_page(&self, page_size: usize, after: Option<&str>) -> Result<Page<Repo>> {
    if !(1..=100).contains(&page_size) {
      return Err(eyre!("page size must be between 1 and 100, got {}", page_size));
    }

    let body = json!({
      "query": STARS_QUERY,
      "variables": {
        "first": page_size,
        "after": after,
      },
    });

    let response = self
      .http
      .post(&self.api_url)
      .bearer_auth(&self.token)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch starred repositories: {}", e))?;

    let status = response.status();
    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      return Err(eyre!(
        "GitHub API returned {}: {}",
        status,
        text.trim().chars().take(200).collect::<String>()
      ));
    }

    let parsed: ApiResponse = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse starred repositories: {}", e))?;

    if let Some(err) = parsed.errors.first() {
      return Err(eyre!("GitHub API error: {}", err.message));
    }

    let data = parsed
      .data
      .ok_or_else(|| eyre!("GitHub API returned no data"))?;

    Ok(data.viewer.starred_repositories.into())
  }
}

impl PageFetcher for GitHubClient {
  type Item = Repo;

  async fn fetch_page(&self, page_size: usize, after: Option<&str>) -> Result<Page<Repo>> {
    self.starred_page(page_size, after).await
  }
}
