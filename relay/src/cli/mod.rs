use clap::Parser;
use std::path::PathBuf;

/// Server CLI for relay-server
#[derive(Parser, Debug, Clone)]
#[command(name = "relay-server", version, about = "Multiplayer lobby relay server")]
pub struct ServerCli {
    /// Path to config file
    #[arg(long, default_value = "relay-server.toml")]
    pub config: PathBuf,

    /// Port to listen on (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory with the static game client (overrides config)
    #[arg(long)]
    pub public_dir: Option<PathBuf>,

    /// Persist CLI overrides back to the config file
    #[arg(long, default_value_t = false)]
    pub persist: bool,

    /// Verbose logging with targets and source locations
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
