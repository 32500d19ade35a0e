//! Git clone transport.
//!
//! Wraps libgit2 clones with basic-auth credentials, progress reporting, and
//! recursive submodule checkout. http and https remotes go through a reqwest
//! transport so clones share the API client's proxy.
//!
//! # Example
//!
//! ```rust,no_run
//! use github_org_clone::git::{Git2Cloner, GitAuth};
//! use github_org_clone::transport::HttpTransport;
//! use std::path::Path;
//!
//! let transport = HttpTransport::from_proxy(Some("http://proxy.local:3128"))?;
//! let cloner = Git2Cloner::new(transport)
//!     .with_auth(GitAuth::basic("octocat", "ghp_token"))
//!     .submodule_depth(2);
//!
//! cloner.clone_url("https://github.com/octocat/Hello-World.git", Path::new("./Hello-World"))?;
//! # Ok::<(), github_org_clone::error::OrgCloneError>(())
//! ```

mod auth;
mod clone;
mod http;

pub use auth::GitAuth;
pub use clone::{Git2Cloner, RepoCloner};
pub use http::register_http_transport;
