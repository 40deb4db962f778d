use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use minify::{
    cli,
    config::{self, Settings},
    warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Show what is playing right now
    Status,

    /// Resume playback
    Play,

    /// Pause playback
    Pause,

    /// Pause when playing, resume otherwise
    Toggle,

    /// Skip to the next track
    Next,

    /// Skip to the previous track
    Previous,

    /// Jump within the current track
    Seek(SeekOptions),

    /// Set the playback volume
    Volume(VolumeOptions),

    /// List available playback devices
    Devices,

    /// Live mini-player with keyboard commands
    Watch,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct SeekOptions {
    /// Position as ratio (0.5), percentage (50%) or timestamp (01:30)
    position: String,
}

#[derive(Parser, Debug, Clone)]
pub struct VolumeOptions {
    /// Volume in percent
    #[clap(value_parser = clap::value_parser!(u8).range(0..=100))]
    percent: u8,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Command::Auth => cli::auth(&settings).await,
        Command::Status => cli::status(&settings).await,
        Command::Play => cli::play(&settings).await,
        Command::Pause => cli::pause(&settings).await,
        Command::Toggle => cli::toggle(&settings).await,
        Command::Next => cli::next(&settings).await,
        Command::Previous => cli::previous(&settings).await,
        Command::Seek(opt) => cli::seek(&settings, opt.position).await,
        Command::Volume(opt) => cli::volume(&settings, opt.percent).await,
        Command::Devices => cli::devices(&settings).await,
        Command::Watch => cli::watch(&settings).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
