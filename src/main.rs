use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::Mutex;
use tracing::{debug, error};

use pifo_launcher_lib::commands::{self, InstallRequest, PlayRequest, SharedState};
use pifo_launcher_lib::core::events::{EventEmitter, LauncherEvent};
use pifo_launcher_lib::core::presence::{
    DiscordPresenceProvider, LogPresenceProvider, PresenceProvider, DISCORD_CLIENT_ID,
};
use pifo_launcher_lib::core::state::{AppState, SettingsPatch};
use pifo_launcher_lib::init_logging;

#[derive(Parser)]
#[command(name = "pifo-launcher", version, about = "Install and play Minecraft versions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed versions, or every version Mojang publishes with --remote
    Versions {
        #[arg(long)]
        remote: bool,
    },
    /// Install a version
    Install {
        version: String,
        /// Download ceiling in KiB/s; 0 means unlimited
        #[arg(long, default_value_t = 0)]
        throttle_kbps: u64,
        /// Display name to store for the version
        #[arg(long)]
        name: Option<String>,
    },
    /// Launch an installed version and wait for it to exit
    Play {
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        memory_mb: Option<u32>,
        /// Where presence updates go
        #[arg(long, value_enum, default_value_t = PresenceSink::Discord)]
        presence: PresenceSink,
        #[arg(long)]
        no_presence: bool,
    },
    /// Show which Java runtime a version would use
    Java { version: String },
    /// Show or change saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PresenceSink {
    Discord,
    Log,
}

impl PresenceSink {
    fn provider(self) -> Box<dyn PresenceProvider> {
        match self {
            PresenceSink::Discord => Box::new(DiscordPresenceProvider::connect(DISCORD_CLIENT_ID)),
            PresenceSink::Log => Box::new(LogPresenceProvider),
        }
    }
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        memory_mb: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let (events, mut event_rx) = EventEmitter::channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            report_event(&event);
        }
    });

    let state: SharedState = match AppState::from_environment(events) {
        Ok(state) => Arc::new(Mutex::new(state)),
        Err(e) => {
            error!("Could not initialise launcher: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, state: &SharedState) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Versions { remote: false } => {
            print_json(&commands::list_versions(state).await)?;
        }
        Commands::Versions { remote: true } => {
            print_json(&commands::remote_versions(state).await)?;
        }
        Commands::Install {
            version,
            throttle_kbps,
            name,
        } => {
            commands::install_version(
                state,
                InstallRequest {
                    version,
                    throttle_kbps,
                    display_name: name,
                },
            )
            .await?;
        }
        Commands::Play {
            version,
            username,
            memory_mb,
            presence,
            no_presence,
        } => {
            let presence = (!no_presence).then(|| presence.provider());
            let code = commands::play(
                state,
                PlayRequest {
                    version,
                    username,
                    memory_mb,
                    presence,
                },
            )
            .await?;
            debug!("Game exited with {:?}", code);
        }
        Commands::Java { version } => {
            print_json(&commands::locate_java(state, &version).await?)?;
        }
        Commands::Settings {
            action: SettingsAction::Show,
        } => {
            print_json(&commands::get_settings(state).await)?;
        }
        Commands::Settings {
            action: SettingsAction::Set {
                username,
                memory_mb,
            },
        } => {
            let updated =
                commands::update_settings(state, SettingsPatch { username, memory_mb }).await?;
            print_json(&updated)?;
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_event(event: &LauncherEvent) {
    match event {
        LauncherEvent::Log { message } => eprintln!("{message}"),
        LauncherEvent::DownloadStatus(_) => {}
        LauncherEvent::Downloaded { name } => debug!("Downloaded {}", name),
        LauncherEvent::Installing { version, step } => eprintln!("[{version}] {step}"),
        LauncherEvent::Installed { version } => eprintln!("Installed {version}"),
        LauncherEvent::GameClosed { code } => eprintln!("Game closed ({code:?})"),
        LauncherEvent::GameError { message } => eprintln!("Game error: {message}"),
    }
}
