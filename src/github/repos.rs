//! Organization repository listing.

use crate::error::{OrgCloneError, Result};
use crate::github::GitHubClient;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Page size used when listing organization repositories.
pub const PER_PAGE: u32 = 100;

/// Repository information from GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub full_name: String,
    pub clone_url: String,
    /// Canonical API URL of the repository.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default, rename = "private")]
    pub is_private: bool,
}

impl GitHubRepo {
    /// Create a repository record with only the fields needed for cloning.
    pub fn new(
        name: impl Into<String>,
        full_name: impl Into<String>,
        clone_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            clone_url: clone_url.into(),
            url: String::new(),
            html_url: String::new(),
            default_branch: None,
            archived: false,
            fork: false,
            is_private: false,
        }
    }
}

/// One page of an organization listing.
#[derive(Debug, Clone, Default)]
pub struct RepoPage {
    pub repos: Vec<GitHubRepo>,
    /// Next page number, or 0 when this is the last page.
    pub next_page: u32,
}

/// A paginated source of organization repositories.
pub trait OrgRepoSource {
    /// Fetch one page of repositories for `org`.
    fn list_org_page(&self, org: &str, page: u32, per_page: u32) -> Result<RepoPage>;
}

impl OrgRepoSource for GitHubClient {
    fn list_org_page(&self, org: &str, page: u32, per_page: u32) -> Result<RepoPage> {
        let endpoint = format!(
            "/orgs/{}/repos?type=all&per_page={}&page={}",
            urlencoding::encode(org),
            per_page,
            page
        );
        let (repos, next_page) = self.get_page::<Vec<GitHubRepo>>(&endpoint)?;
        Ok(RepoPage { repos, next_page })
    }
}

/// A listing that stopped before the last page.
///
/// Holds whatever was fetched before the failing page.
#[derive(Debug, Error)]
#[error("listing repositories failed on page {page} after {} repositories: {source}", .repos.len())]
pub struct PartialListing {
    pub page: u32,
    pub repos: Vec<GitHubRepo>,
    pub source: Box<OrgCloneError>,
}

/// List all repositories in an organization, following pagination.
///
/// Makes one request per page and stops when a page reports no next page.
/// A request failure, or a next page that does not advance, ends the listing
/// with a [`PartialListing`].
pub fn list_org_repos<S>(
    source: &S,
    org: &str,
) -> std::result::Result<Vec<GitHubRepo>, PartialListing>
where
    S: OrgRepoSource + ?Sized,
{
    let mut all_repos = Vec::new();
    let mut page = 1;

    loop {
        let batch = match source.list_org_page(org, page, PER_PAGE) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(org, page, error = %e, "listing repositories failed");
                return Err(PartialListing {
                    page,
                    repos: all_repos,
                    source: Box::new(e),
                });
            }
        };

        tracing::debug!(org, page, count = batch.repos.len(), "fetched repository page");
        all_repos.extend(batch.repos);

        if batch.next_page == 0 {
            break;
        }
        if batch.next_page <= page {
            tracing::error!(org, page, next = batch.next_page, "next page does not advance");
            return Err(PartialListing {
                page: batch.next_page,
                repos: all_repos,
                source: Box::new(OrgCloneError::GitHub {
                    message: format!(
                        "page {} pointed back to page {}",
                        page, batch.next_page
                    ),
                }),
            });
        }
        page = batch.next_page;
    }

    Ok(all_repos)
}

/// Extract the `rel="next"` page number from a `Link` header.
///
/// Returns 0 when there is no next link.
pub fn parse_next_page(link: &str) -> u32 {
    link.split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let target = parts.next()?.trim();
            let is_next = parts.any(|p| p.trim() == "rel=\"next\"");
            is_next.then_some(target)
        })
        .filter_map(|target| {
            let target = target.strip_prefix('<')?.strip_suffix('>')?;
            let url = Url::parse(target).ok()?;
            url.query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
        .next()
        .unwrap_or(0)
}
