//! # Sponsor Bot
//!
//! Text-command front end for [`sponsor_core`].
//!
//! ## Commands
//!
//! `init`, `<sponsor tag>`, `rename`, `find`, `stales`, `findsponsees`,
//! `bulkapplysponseetag`, `drn` and `help`, each behind the configured prefix. See
//! [`command::CommandAction`].
//!
//! ## Running
//!
//! The `sponsor-bot` binary serves a workspace snapshot through [`console`]: one command
//! per stdin line, the bot's messages on stdout, logs on stderr.

pub mod command;
pub mod config;
pub mod console;
pub mod dice;

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use command::CommandHandler;
use config::{BotConfig, ConfigOverrides};
use sponsor_platform::{MemoryPlatform, Platform, WorkspaceSnapshot};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

#[derive(Parser)]
#[command(name = "sponsor-bot")]
#[command(about = "Private sponsor/sponsee channels under platform capacity limits", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve commands read from stdin against a workspace snapshot
    Serve(ServeArgs),

    /// Write a small demo workspace snapshot
    Demo(DemoArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Workspace snapshot (JSON)
    #[arg(long)]
    workspace: PathBuf,

    /// Write the workspace back once stdin is exhausted
    #[arg(long)]
    save: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args)]
struct DemoArgs {
    /// Where to write the snapshot
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Default)]
struct ConfigArgs {
    /// TOML file with any of the settings below (env: SPONSOR_BOT_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Command prefix (env: COMMAND_PREFIX)
    #[arg(long)]
    prefix: Option<String>,

    /// Sponsor tag name (env: SPONSOR_TAG)
    #[arg(long)]
    sponsor_tag: Option<String>,

    /// Sponsee tag name (env: SPONSEE_TAG)
    #[arg(long)]
    sponsee_tag: Option<String>,

    /// Container tag name (env: CONTAINER_TAG)
    #[arg(long)]
    container_tag: Option<String>,

    /// Spaces a participant may own (env: SPACES_PER_SPONSEE)
    #[arg(long)]
    quota: Option<usize>,

    /// Greeting posted into new spaces (env: GREETING_PATH)
    #[arg(long)]
    greeting: Option<PathBuf>,

    /// JSON file of ignored message prefixes (env: BANNED_PREFIXES_PATH)
    #[arg(long)]
    banned_prefixes: Option<PathBuf>,
}

impl From<ConfigArgs> for ConfigOverrides {
    fn from(args: ConfigArgs) -> Self {
        Self {
            config_path: args.config,
            prefix: args.prefix,
            sponsor_tag: args.sponsor_tag,
            sponsee_tag: args.sponsee_tag,
            container_tag: args.container_tag,
            quota: args.quota,
            greeting_path: args.greeting,
            banned_prefixes_path: args.banned_prefixes,
        }
    }
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Demo(args) => run_demo(args),
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = BotConfig::resolve(args.config.into())?;
    let snapshot = WorkspaceSnapshot::load(&args.workspace)
        .with_context(|| format!("Failed to load {}", args.workspace.display()))?;
    log::info!(
        "Serving {} with prefix {:?}",
        snapshot.workspace.name,
        config.prefix
    );

    let platform = Arc::new(MemoryPlatform::new(snapshot));
    let handler = Arc::new(CommandHandler::new(platform.clone(), config));
    let sent = console::run(
        platform.clone(),
        handler,
        BufReader::new(tokio::io::stdin()),
    )
    .await?;

    for message in sent {
        let channel = match platform.channel(message.channel).await {
            Ok(channel) => channel.name,
            Err(_) => message.channel.to_string(),
        };
        print_stdout(&format!("[#{channel}] {}", message.content))?;
    }

    if args.save {
        platform
            .snapshot()
            .await
            .save(&args.workspace)
            .with_context(|| format!("Failed to save {}", args.workspace.display()))?;
        log::info!("Saved {}", args.workspace.display());
    }
    Ok(())
}

fn run_demo(args: DemoArgs) -> Result<()> {
    let config = BotConfig::resolve(args.config.into())?;
    let snapshot = console::demo_workspace(&config.tags);
    snapshot
        .save(&args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    print_stdout(&format!("Wrote {}", args.out.display()))?;
    for member in snapshot.members.iter().filter(|m| !m.bot) {
        print_stdout(&format!("member {} = {}", member.display_name, member.id))?;
    }
    for channel in snapshot.channels.iter().filter(|c| !c.is_container()) {
        print_stdout(&format!("channel {} = {}", channel.name, channel.id))?;
    }
    Ok(())
}
