//! Caching implementations for GitHub types.

use crate::cache::Cacheable;

use super::types::Repo;

impl Cacheable for Repo {
  fn cache_key(&self) -> &str {
    &self.name_with_owner
  }
}
