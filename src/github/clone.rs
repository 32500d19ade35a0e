//! Batch cloning of organization repositories.

use crate::config::CloneConfig;
use crate::error::Result;
use crate::git::RepoCloner;
use crate::github::{GitHubRepo, OrgRepoSource, list_org_repos};
use std::path::{Path, PathBuf};

/// Result of cloning a single repository.
#[derive(Debug)]
pub struct CloneOutcome {
    pub repo: String,
    pub result: Result<PathBuf>,
}

impl CloneOutcome {
    /// Whether the clone succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-repository outcomes of a batch clone, in list order.
#[derive(Debug, Default)]
pub struct CloneReport {
    pub outcomes: Vec<CloneOutcome>,
}

impl CloneReport {
    /// Number of repositories attempted.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of successful clones.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed clones.
    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &CloneOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Clone every repository under `target`, one at a time.
///
/// A failed clone is logged and the loop moves on; no clone is retried and
/// partially written directories are left in place.
pub fn clone_all<C>(cloner: &C, repos: &[GitHubRepo], target: &Path) -> CloneReport
where
    C: RepoCloner + ?Sized,
{
    let outcomes = repos
        .iter()
        .map(|repo| {
            tracing::info!(repo = %repo.name, url = %repo.clone_url, "begin clone repo");
            let result = cloner.clone_repo(repo, target);
            if let Err(e) = &result {
                tracing::error!(repo = %repo.name, error = %e, "clone repo failed");
            }
            CloneOutcome {
                repo: repo.full_name.clone(),
                result,
            }
        })
        .collect();

    CloneReport { outcomes }
}

/// List an organization's repositories and clone each of them.
///
/// Fails before any request when the organization is empty, and aborts when
/// the listing fails. Individual clone failures are only reported.
pub fn clone_org<S, C>(config: &CloneConfig, source: &S, cloner: &C) -> Result<CloneReport>
where
    S: OrgRepoSource + ?Sized,
    C: RepoCloner + ?Sized,
{
    config.validate()?;

    tracing::info!(org = %config.org, "listing repositories");
    let repos = list_org_repos(source, &config.org)?;
    tracing::info!(org = %config.org, count = repos.len(), "found repositories");

    let report = clone_all(cloner, &repos, &config.path);

    tracing::info!(
        org = %config.org,
        path = %config.path.display(),
        cloned = report.succeeded(),
        failed = report.failed(),
        "clone finished"
    );

    Ok(report)
}
