//! `wp-reset`: resets fixtures on a WordPress test site.
//!
//! Settings come from `WP_*` environment variables, overridden by flags.
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use clap::{Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use wp_request_utils::config::{apply_env, RequestUtilsConfig};
use wp_request_utils::{RequestUtils, Result};

#[derive(Parser, Debug)]
#[command(name = "wp-reset")]
#[command(about = "Reset fixtures on a WordPress test site")]
#[command(version)]
struct Cli {
    /// Site URL, e.g. http://localhost:8889
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Login name
    #[arg(long, global = true)]
    username: Option<String>,

    /// Login password
    #[arg(long, global = true)]
    password: Option<String>,

    /// Session snapshot to restore from, or to write after logging in
    #[arg(long, global = true, value_name = "FILE")]
    storage_state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete every post
    Posts,
    /// Delete every widget and empty all sidebars
    Widgets,
    /// Delete every reusable block
    Blocks,
    /// Delete posts, blocks, and widgets
    All,
    /// Activate a plugin by slug
    ActivatePlugin { slug: String },
    /// Deactivate a plugin by slug
    DeactivatePlugin { slug: String },
    /// Activate a theme by stylesheet
    ActivateTheme { slug: String },
}

impl Cli {
    fn config(&self) -> Result<RequestUtilsConfig> {
        let mut config = apply_env(RequestUtilsConfig::default())?;
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(username) = &self.username {
            config.user.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.user.password = password.clone();
        }
        if let Some(path) = &self.storage_state {
            config.storage_state_path = Some(path.clone());
        }
        Ok(config)
    }
}

async fn run(cli: Cli) -> Result<()> {
    let utils = RequestUtils::setup(cli.config()?).await?;

    match cli.command {
        Command::Posts => {
            let deleted = utils.delete_all_posts().await?;
            println!("Deleted {} posts", deleted);
        }
        Command::Widgets => {
            let deleted = utils.delete_all_widgets().await?;
            println!("Deleted {} widgets", deleted);
        }
        Command::Blocks => {
            let deleted = utils.delete_all_blocks().await?;
            println!("Deleted {} blocks", deleted);
        }
        Command::All => {
            let posts = utils.delete_all_posts().await?;
            let blocks = utils.delete_all_blocks().await?;
            let widgets = utils.delete_all_widgets().await?;
            println!(
                "Deleted {} posts, {} blocks, {} widgets",
                posts, blocks, widgets
            );
        }
        Command::ActivatePlugin { slug } => {
            let changed = utils.activate_plugin(&slug).await?;
            println!("{}: {}", slug, if changed { "activated" } else { "already active" });
        }
        Command::DeactivatePlugin { slug } => {
            let changed = utils.deactivate_plugin(&slug).await?;
            println!(
                "{}: {}",
                slug,
                if changed { "deactivated" } else { "already inactive" }
            );
        }
        Command::ActivateTheme { slug } => {
            let changed = utils.activate_theme(&slug).await?;
            println!("{}: {}", slug, if changed { "activated" } else { "already active" });
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!("{}", err);
        std::process::exit(1);
    }
}
