use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;

use rumie_reader::{
    Config,
    DeepLink,
    GatewaySource,
    PageOptions,
    TimeFilter,
    ViewState,
    Viewer,
    config::default_page_path,
    render::{conversation_list_text, thread_text},
    render_page,
    share::{self, CopyMethod},
};

mod browse_cmd;

#[derive(Parser)]
#[command(name = "rumie-reader", version, about = "Read chatbot conversation logs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch conversations and write the viewer page
    #[command(name = "render")]
    Render {
        /// Gateway URL (default from ~/.rumie-reader/config.toml or http://localhost:8787)
        #[arg(long)]
        gateway: Option<String>,
        /// Open this conversation
        #[arg(long)]
        chat: Option<String>,
        /// Scroll to and highlight this message (needs --chat)
        #[arg(long, requires = "chat")]
        msg: Option<String>,
        /// Take --chat and --msg from a shared link
        #[arg(long, conflicts_with_all = ["chat", "msg"])]
        link: Option<String>,
        #[arg(long, value_enum)]
        filter: Option<TimeFilter>,
        /// Output file (default ~/.rumie-reader/index.html)
        #[arg(long)]
        out: Option<PathBuf>,
        /// URL the page is served from, used for share links
        #[arg(long)]
        page_url: Option<String>,
    },

    /// Print the conversation list
    #[command(name = "list")]
    List {
        #[arg(long)]
        gateway: Option<String>,
    },

    /// Print one conversation thread
    #[command(name = "show")]
    Show {
        chat_id: String,
        #[arg(long, value_enum)]
        filter: Option<TimeFilter>,
        #[arg(long)]
        gateway: Option<String>,
    },

    /// Print a link to a conversation or message and copy it
    #[command(name = "share")]
    Share {
        chat_id: String,
        #[arg(long)]
        msg: Option<String>,
        #[arg(long)]
        page_url: Option<String>,
        /// Only print the link
        #[arg(long)]
        no_copy: bool,
    },

    /// Pick conversations interactively
    #[command(name = "browse")]
    Browse {
        #[arg(long)]
        gateway: Option<String>,
    },

    /// View or modify config (~/.rumie-reader/config.toml)
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current config
    Show,
    /// Set a config value
    Set {
        /// Key to set (gateway_url, page_url, default_filter)
        key: String,
        /// Value to set
        value: String,
    },
    /// Reset config to defaults
    Reset,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();
    match cli.command {
        Commands::Render {
            gateway,
            chat,
            msg,
            link,
            filter,
            out,
            page_url,
        } => {
            let link = match link {
                Some(raw) => DeepLink::from_url(&raw)?,
                None => DeepLink { chat, msg },
            };
            let state = ViewState::from_link(&link, filter.unwrap_or(config.default_filter));
            let gateway = gateway.unwrap_or_else(|| config.gateway_url.clone());
            let page_url = page_url.unwrap_or_else(|| config.page_url());

            let mut viewer = Viewer::new(GatewaySource::new(&gateway), state);
            if let Err(err) = viewer.load() {
                eprintln!("warning: {err}");
            }

            let markup = render_page(
                viewer.dataset(),
                viewer.state(),
                &PageOptions {
                    page_url: &page_url,
                    status: viewer.status(),
                    notices: viewer.notices(),
                    now: OffsetDateTime::now_utc(),
                },
            )?;

            let path = match out {
                Some(path) => path,
                None => default_page_path()?,
            };
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&path, markup.into_string())
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "page written");
            println!("{}", path.display());
        }
        Commands::List { gateway } => {
            let viewer = load_viewer(&config, gateway, ViewState::default())?;
            print!("{}", conversation_list_text(viewer.dataset(), viewer.status()));
        }
        Commands::Show {
            chat_id,
            filter,
            gateway,
        } => {
            let filter = filter.unwrap_or(config.default_filter);
            let viewer = load_viewer(&config, gateway, ViewState::default())?;
            let Some(conv) = viewer.dataset().conversation(&chat_id) else {
                bail!("conversation not found: {chat_id}");
            };
            print!("{}", thread_text(conv, filter, OffsetDateTime::now_utc()));
        }
        Commands::Share {
            chat_id,
            msg,
            page_url,
            no_copy,
        } => {
            let page_url = page_url.unwrap_or_else(|| config.page_url());
            let url = match &msg {
                Some(msg) => share::message_url(&page_url, &chat_id, msg)?,
                None => share::conversation_url(&page_url, &chat_id)?,
            };
            println!("{url}");
            if !no_copy {
                report_copy(&url)?;
            }
        }
        Commands::Browse { gateway } => {
            let gateway = gateway.unwrap_or_else(|| config.gateway_url.clone());
            browse_cmd::run(&config, &gateway)?;
        }
        Commands::Config { action } => {
            handle_config(action)?;
        }
    }
    Ok(())
}

/// Load once for the read-only commands; a failed fetch ends the command
fn load_viewer(
    config: &Config,
    gateway: Option<String>,
    state: ViewState,
) -> Result<Viewer<GatewaySource>> {
    let gateway = gateway.unwrap_or_else(|| config.gateway_url.clone());
    let mut viewer = Viewer::new(GatewaySource::new(&gateway), state);
    viewer.load()?;
    Ok(viewer)
}

pub(crate) fn report_copy(url: &str) -> Result<()> {
    match share::copy_to_clipboard(url)? {
        CopyMethod::Command(program) => eprintln!("Link copied to clipboard ({program})."),
        CopyMethod::Osc52 => eprintln!("Link sent to the terminal clipboard."),
    }
    Ok(())
}

fn handle_config(action: Option<ConfigAction>) -> Result<()> {
    match action {
        None | Some(ConfigAction::Show) => {
            let config = Config::load().unwrap_or_default();
            println!("gateway_url = \"{}\"", config.gateway_url);
            println!("page_url = \"{}\"", config.page_url());
            println!("default_filter = \"{}\"", config.default_filter);
        }
        Some(ConfigAction::Set { key, value }) => {
            let mut config = Config::load().unwrap_or_default();
            config.set(&key, &value)?;
            let path = config.save()?;
            println!("Saved to {}", path.display());
        }
        Some(ConfigAction::Reset) => {
            let path = Config::default().save()?;
            println!("Reset config at {}", path.display());
        }
    }
    Ok(())
}
