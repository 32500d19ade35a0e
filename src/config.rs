//! Clone command configuration.

use crate::error::{OrgCloneError, Result};
use crate::git::GitAuth;
use crate::transport::redact_proxy;
use std::fmt;
use std::path::PathBuf;

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default depth for recursive submodule clones.
pub const DEFAULT_SUBMODULE_DEPTH: u32 = 10;

/// Configuration shared by the listing and cloning phases.
///
/// Built once by the CLI layer and passed by reference afterwards.
#[derive(Clone)]
pub struct CloneConfig {
    /// Proxy URL for API and git traffic (http, https or socks5).
    pub proxy: Option<String>,
    /// Organization whose repositories are cloned.
    pub org: String,
    /// Directory that receives one subdirectory per repository.
    pub path: PathBuf,
    /// Username for clone authentication.
    pub username: Option<String>,
    /// Password for clone authentication.
    pub password: Option<String>,
    /// Token for API requests.
    pub token: Option<String>,
    /// GitHub API base URL.
    pub api_url: String,
    /// Maximum submodule recursion depth. Zero disables submodules.
    pub submodule_depth: u32,
    /// Whether clone progress is written to stdout.
    pub progress: bool,
}

impl CloneConfig {
    /// Creates a configuration for the given organization with default settings.
    pub fn new(org: impl Into<String>) -> Self {
        Self {
            proxy: None,
            org: org.into(),
            path: PathBuf::from("."),
            username: None,
            password: None,
            token: None,
            api_url: DEFAULT_API_URL.into(),
            submodule_depth: DEFAULT_SUBMODULE_DEPTH,
            progress: true,
        }
    }

    /// Sets the proxy address.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Sets the destination root.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets username and password for cloning.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the API token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the API base URL (for GitHub Enterprise).
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the submodule recursion depth.
    pub fn submodule_depth(mut self, depth: u32) -> Self {
        self.submodule_depth = depth;
        self
    }

    /// Disables clone progress output.
    pub fn quiet(mut self) -> Self {
        self.progress = false;
        self
    }

    /// Checks that the configuration can start a listing.
    pub fn validate(&self) -> Result<()> {
        if self.org.trim().is_empty() {
            return Err(OrgCloneError::MissingOrg);
        }
        Ok(())
    }

    /// Clone credentials derived from username and password.
    pub fn git_auth(&self) -> GitAuth {
        match (&self.username, &self.password) {
            (None, None) => GitAuth::None,
            (username, password) => GitAuth::basic(
                username.clone().unwrap_or_default(),
                password.clone().unwrap_or_default(),
            ),
        }
    }
}

impl fmt::Debug for CloneConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloneConfig")
            .field("proxy", &self.proxy.as_deref().map(redact_proxy))
            .field("org", &self.org)
            .field("path", &self.path)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("submodule_depth", &self.submodule_depth)
            .field("progress", &self.progress)
            .finish()
    }
}
