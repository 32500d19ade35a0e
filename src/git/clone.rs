//! Repository cloning through libgit2.

use crate::error::{OrgCloneError, Result};
use crate::git::GitAuth;
use crate::git::http::{ActiveTransport, register_http_transport};
use crate::github::GitHubRepo;
use crate::transport::HttpTransport;
use git2::build::RepoBuilder;
use git2::{FetchOptions, Progress, RemoteCallbacks, Repository, SubmoduleUpdateOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Something that can produce a local clone of a repository.
pub trait RepoCloner {
    /// Clone `repo` into `<target_root>/<repo.name>`.
    ///
    /// Returns the path to the cloned repository.
    fn clone_repo(&self, repo: &GitHubRepo, target_root: &Path) -> Result<PathBuf>;
}

/// Clones with libgit2, carrying http/https traffic over the API transport's
/// proxy.
#[derive(Debug, Clone)]
pub struct Git2Cloner {
    auth: GitAuth,
    transport: HttpTransport,
    submodule_depth: u32,
    progress: bool,
}

impl Git2Cloner {
    /// Create a cloner using the given transport.
    pub fn new(transport: HttpTransport) -> Self {
        Self {
            auth: GitAuth::None,
            transport,
            submodule_depth: crate::config::DEFAULT_SUBMODULE_DEPTH,
            progress: true,
        }
    }

    /// Set authentication for clones.
    pub fn with_auth(mut self, auth: GitAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Set the submodule recursion depth. Zero skips submodules.
    pub fn submodule_depth(mut self, depth: u32) -> Self {
        self.submodule_depth = depth;
        self
    }

    /// Enable or disable progress output on stdout.
    pub fn progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Clone `url` into `dest`, recursing into submodules.
    pub fn clone_url(&self, url: &str, dest: &Path) -> Result<Repository> {
        register_http_transport()?;
        let client = self.transport.git_http_client()?;
        let _active = ActiveTransport::enter(client, self.auth.clone());

        let repo = RepoBuilder::new()
            .fetch_options(self.fetch_options())
            .clone(url, dest)?;

        if self.progress {
            println!();
        }

        self.update_submodules(&repo, self.submodule_depth)?;
        Ok(repo)
    }

    fn update_submodules(&self, repo: &Repository, depth: u32) -> Result<()> {
        if depth == 0 {
            return Ok(());
        }

        for mut submodule in repo.submodules()? {
            tracing::debug!(
                submodule = submodule.name().unwrap_or_default(),
                "updating submodule"
            );

            let mut options = SubmoduleUpdateOptions::new();
            options.fetch(self.fetch_options());
            submodule.update(true, Some(&mut options))?;

            let nested = submodule.open()?;
            self.update_submodules(&nested, depth - 1)?;
        }

        Ok(())
    }

    fn fetch_options(&self) -> FetchOptions<'static> {
        let mut callbacks = RemoteCallbacks::new();
        self.auth.install(&mut callbacks);

        if self.progress {
            callbacks.sideband_progress(|data| {
                let mut stdout = std::io::stdout();
                let _ = stdout.write_all(data);
                let _ = stdout.flush();
                true
            });
            callbacks.transfer_progress(|stats| {
                print_transfer(&stats);
                true
            });
        }

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);
        fetch_options
    }
}

impl RepoCloner for Git2Cloner {
    fn clone_repo(&self, repo: &GitHubRepo, target_root: &Path) -> Result<PathBuf> {
        let repo_path = target_root.join(&repo.name);

        if repo_path.exists() {
            return Err(OrgCloneError::CloneError {
                repo: repo.full_name.clone(),
                message: format!("Directory already exists: {}", repo_path.display()),
            });
        }

        self.clone_url(&repo.clone_url, &repo_path)
            .map_err(|e| OrgCloneError::CloneError {
                repo: repo.full_name.clone(),
                message: e.to_string(),
            })?;

        Ok(repo_path)
    }
}

fn print_transfer(stats: &Progress<'_>) {
    let total = stats.total_objects();
    if total == 0 {
        return;
    }

    let mut stdout = std::io::stdout();
    if stats.received_objects() < total {
        let _ = write!(
            stdout,
            "\rReceiving objects: {:3}% ({}/{}), {} KiB",
            stats.received_objects() * 100 / total,
            stats.received_objects(),
            total,
            stats.received_bytes() / 1024
        );
    } else if stats.total_deltas() > 0 {
        let _ = write!(
            stdout,
            "\rResolving deltas: {:3}% ({}/{})",
            stats.indexed_deltas() * 100 / stats.total_deltas(),
            stats.indexed_deltas(),
            stats.total_deltas()
        );
    }
    let _ = stdout.flush();
}
