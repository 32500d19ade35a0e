//! # GitHub Org Clone
//!
//! Lists every repository of a GitHub organization and clones each one to
//! local disk, optionally routing API and git traffic through a proxy.
//!
//! The work happens in two sequential phases that share one [`CloneConfig`]
//! and one [`HttpTransport`]:
//! - Paginated listing of the organization's repositories
//! - One clone per repository, continuing past individual failures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use github_org_clone::prelude::*;
//!
//! let config = CloneConfig::new("rust-lang")
//!     .path("./mirror")
//!     .proxy("socks5://127.0.0.1:1080");
//!
//! let transport = HttpTransport::from_proxy(config.proxy.as_deref())?;
//! let client = GitHubClient::new(&transport, &config.api_url, config.token.clone())?;
//! let cloner = Git2Cloner::new(transport).with_auth(config.git_auth());
//!
//! let report = clone_org(&config, &client, &cloner)?;
//! println!("cloned {} of {}", report.succeeded(), report.attempted());
//! # Ok::<(), github_org_clone::error::OrgCloneError>(())
//! ```

pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod logging;
pub mod transport;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::CloneConfig;
    pub use crate::error::{OrgCloneError, Result};
    pub use crate::git::{Git2Cloner, GitAuth, RepoCloner};
    pub use crate::github::{
        CloneOutcome, CloneReport, GitHubClient, GitHubRepo, OrgRepoSource, PartialListing,
        RepoPage, clone_all, clone_org, list_org_repos,
    };
    pub use crate::transport::HttpTransport;
}

pub use prelude::*;
