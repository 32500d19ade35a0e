//! Git authentication configuration.

use git2::{Cred, CredentialType, RemoteCallbacks};

/// Credential attempts before a clone gives up on authentication.
const MAX_AUTH_ATTEMPTS: usize = 3;

/// Authentication method for git clone operations.
#[derive(Clone, Default)]
pub enum GitAuth {
    /// HTTP basic auth (username plus password or personal access token).
    Basic { username: String, password: String },
    /// No authentication (public repos only).
    #[default]
    None,
}

impl GitAuth {
    /// Create basic auth from a username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Install the credentials callback for this auth method.
    pub fn install(&self, callbacks: &mut RemoteCallbacks<'_>) {
        let auth = self.clone();
        let mut attempts = 0;

        callbacks.credentials(move |url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > MAX_AUTH_ATTEMPTS {
                return Err(git2::Error::from_str(&format!(
                    "authentication failed for {}",
                    url
                )));
            }

            match &auth {
                GitAuth::Basic { username, password }
                    if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) =>
                {
                    Cred::userpass_plaintext(username, password)
                }
                _ if allowed_types.contains(CredentialType::SSH_KEY) => {
                    Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                }
                _ => Cred::default(),
            }
        });
    }
}

impl std::fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::None => f.write_str("None"),
        }
    }
}
