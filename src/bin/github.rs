//! CLI for cloning every repository of a GitHub organization.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use github_org_clone::config::{DEFAULT_API_URL, DEFAULT_SUBMODULE_DEPTH};
use github_org_clone::logging;
use github_org_clone::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "github")]
#[command(author, version, about = "Clone GitHub repositories by organization", long_about = None)]
struct Cli {
    /// http/https or socks5 proxy
    #[arg(long, global = true, env = "GITHUB_PROXY")]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone github repos by org
    Clone {
        /// Organization name (required)
        #[arg(long, default_value = "")]
        org: String,

        /// Clone path
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// GitHub username for cloning
        #[arg(long)]
        username: Option<String>,

        /// GitHub password or personal access token for cloning
        #[arg(long, env = "GITHUB_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// API token used when listing repositories
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// GitHub API base URL
        #[arg(long, default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Submodule recursion depth (0 disables submodules)
        #[arg(long, default_value_t = DEFAULT_SUBMODULE_DEPTH)]
        submodule_depth: u32,

        /// Do not print clone progress
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = logging::init() {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let transport =
        HttpTransport::from_proxy(cli.proxy.as_deref()).context("Failed to configure proxy")?;
    tracing::info!(proxy = %transport.display_proxy(), "proxy address");

    match cli.command {
        Commands::Clone {
            org,
            path,
            username,
            password,
            token,
            api_url,
            submodule_depth,
            quiet,
        } => {
            let config = CloneConfig {
                proxy: cli.proxy,
                org,
                path,
                username,
                password,
                token,
                api_url,
                submodule_depth,
                progress: !quiet,
            };
            cmd_clone(&config, transport)
        }
    }
}

fn cmd_clone(config: &CloneConfig, transport: HttpTransport) -> Result<()> {
    let client = GitHubClient::new(&transport, &config.api_url, config.token.clone())
        .context("Failed to create GitHub client")?;

    let cloner = Git2Cloner::new(transport)
        .with_auth(config.git_auth())
        .submodule_depth(config.submodule_depth)
        .progress(config.progress);

    let report = clone_org(config, &client, &cloner).context("Clone failed")?;

    println!(
        "Cloned {} of {} repositories into {}",
        report.succeeded(),
        report.attempted(),
        config.path.display()
    );
    for failure in report.failures() {
        if let Err(e) = &failure.result {
            println!("  failed: {} ({})", failure.repo, e);
        }
    }

    Ok(())
}
