//! GitHub API integration for organization-wide cloning.
//!
//! This module provides:
//! - A client for the GitHub REST API
//! - Paginated listing of an organization's repositories
//! - Sequential batch cloning with per-repository outcomes
//!
//! # Example
//!
//! ```rust,no_run
//! use github_org_clone::github::{GitHubClient, list_org_repos};
//! use github_org_clone::transport::HttpTransport;
//!
//! let transport = HttpTransport::from_proxy(Some("socks5://127.0.0.1:1080"))?;
//! let client = GitHubClient::new(&transport, "https://api.github.com", None)?;
//!
//! for repo in list_org_repos(&client, "rust-lang")? {
//!     println!("{}: {}", repo.name, repo.clone_url);
//! }
//! # Ok::<(), github_org_clone::error::OrgCloneError>(())
//! ```

mod client;
mod clone;
mod repos;

pub use client::GitHubClient;
pub use clone::{CloneOutcome, CloneReport, clone_all, clone_org};
pub use repos::{
    GitHubRepo, OrgRepoSource, PER_PAGE, PartialListing, RepoPage, list_org_repos,
    parse_next_page,
};
