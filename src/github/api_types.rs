//! Serde-deserializable types matching the GitHub GraphQL response for the
//! viewer's starred repositories.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{normalize_topics, Repo};
use crate::cache::Page;

/// Query for one page of starred repositories, newest star first.
pub const STARS_QUERY: &str = r#"
query ViewerStars($first: Int!, $after: String) {
  viewer {
    starredRepositories(first: $first, after: $after, orderBy: {field: STARRED_AT, direction: DESC}) {
      totalCount
      pageInfo {
        hasNextPage
        endCursor
      }
      edges {
        starredAt
        node {
          name
          nameWithOwner
          description
          url
          stargazerCount
          updatedAt
          isFork
          primaryLanguage {
            name
          }
          repositoryTopics(first: 5) {
            nodes {
              topic {
                name
              }
            }
          }
        }
      }
    }
  }
}
"#;

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiResponse {
  pub data: Option<ApiData>,
  #[serde(default)]
  pub errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
  pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiData {
  pub viewer: ApiViewer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiViewer {
  pub starred_repositories: ApiStarredConnection,
}

// ============================================================================
// Starred repositories connection
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStarredConnection {
  #[serde(default)]
  pub total_count: usize,
  pub page_info: ApiPageInfo,
  #[serde(default)]
  pub edges: Vec<ApiStarredEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPageInfo {
  #[serde(default)]
  pub has_next_page: bool,
  pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStarredEdge {
  pub starred_at: Option<DateTime<Utc>>,
  pub node: ApiRepository,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRepository {
  #[serde(default)]
  pub name: String,
  pub name_with_owner: String,
  pub description: Option<String>,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub stargazer_count: u64,
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub is_fork: bool,
  pub primary_language: Option<ApiLanguage>,
  #[serde(default)]
  pub repository_topics: ApiTopicConnection,
}

#[derive(Debug, Deserialize)]
pub struct ApiLanguage {
  pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiTopicConnection {
  #[serde(default)]
  pub nodes: Vec<ApiTopicNode>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTopicNode {
  pub topic: ApiTopic,
}

#[derive(Debug, Deserialize)]
pub struct ApiTopic {
  pub name: String,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiStarredEdge {
  pub fn into_repo(self) -> Repo {
    let node = self.node;
    Repo {
      name_with_owner: node.name_with_owner,
      name: node.name,
      description: node
        .description
        .map(|d| d.trim().to_string())
        .unwrap_or_default(),
      url: node.url,
      stars: node.stargazer_count,
      primary_language: node.primary_language.map(|l| l.name).unwrap_or_default(),
      updated_at: node.updated_at,
      is_fork: node.is_fork,
      topics: normalize_topics(node.repository_topics.nodes.iter().map(|n| &n.topic.name)),
      starred_at: self.starred_at,
    }
  }
}

impl From<ApiStarredConnection> for Page<Repo> {
  fn from(conn: ApiStarredConnection) -> Self {
    Page {
      items: conn.edges.into_iter().map(ApiStarredEdge::into_repo).collect(),
      total_count: conn.total_count,
      end_cursor: conn.page_info.end_cursor,
      has_next: conn.page_info.has_next_page,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const RESPONSE: &str = r#"{
    "data": {
      "viewer": {
        "starredRepositories": {
          "totalCount": 42,
          "pageInfo": { "hasNextPage": true, "endCursor": "Y3Vyc29yOjE=" },
          "edges": [
            {
              "starredAt": "2024-06-01T12:00:00Z",
              "node": {
                "name": "ripgrep",
                "nameWithOwner": "BurntSushi/ripgrep",
                "description": "  fast grep  ",
                "url": "https://github.com/BurntSushi/ripgrep",
                "stargazerCount": 50000,
                "updatedAt": "2024-05-30T08:00:00Z",
                "isFork": false,
                "primaryLanguage": { "name": "Rust" },
                "repositoryTopics": {
                  "nodes": [
                    { "topic": { "name": "cli" } },
                    { "topic": { "name": " search " } },
                    { "topic": { "name": "cli" } }
                  ]
                }
              }
            },
            {
              "starredAt": "2024-05-01T12:00:00Z",
              "node": {
                "name": "dotfiles",
                "nameWithOwner": "someone/dotfiles",
                "description": null,
                "url": "https://github.com/someone/dotfiles",
                "stargazerCount": 3,
                "updatedAt": "2023-01-01T00:00:00Z",
                "isFork": true,
                "primaryLanguage": null,
                "repositoryTopics": { "nodes": [] }
              }
            }
          ]
        }
      }
    }
  }"#;

  #[test]
  fn test_parse_page() {
    let response: ApiResponse = serde_json::from_str(RESPONSE).unwrap();
    assert!(response.errors.is_empty());
    let page: Page<Repo> = response.data.unwrap().viewer.starred_repositories.into();

    assert_eq!(page.total_count, 42);
    assert!(page.has_next);
    assert_eq!(page.end_cursor.as_deref(), Some("Y3Vyc29yOjE="));
    assert_eq!(page.items.len(), 2);

    let rg = &page.items[0];
    assert_eq!(rg.name_with_owner, "BurntSushi/ripgrep");
    assert_eq!(rg.description, "fast grep");
    assert_eq!(rg.primary_language, "Rust");
    assert_eq!(rg.stars, 50000);
    assert_eq!(rg.topics, vec!["cli", "search"]);
    assert!(rg.starred_at.is_some());

    let dotfiles = &page.items[1];
    assert_eq!(dotfiles.description, "");
    assert_eq!(dotfiles.primary_language, "");
    assert!(dotfiles.is_fork);
  }

  #[test]
  fn test_parse_errors() {
    let response: ApiResponse =
      serde_json::from_str(r#"{"data":null,"errors":[{"message":"Bad credentials"}]}"#).unwrap();
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].message, "Bad credentials");
  }
}
