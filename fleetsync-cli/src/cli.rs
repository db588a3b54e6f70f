use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fleetsync",
    about = "FleetSync - live positions of every tracker account on one map",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[arg(long, env = "FLEETSYNC_DATA_DIR", global = true, help = "Directory holding fleetsync.json and trackers.json")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Polling interval in milliseconds")]
    pub poll_interval_ms: Option<u64>,

    #[arg(long, global = true, help = "Marker animation duration in milliseconds")]
    pub animation_ms: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Poll continuously and print every merged snapshot (default)")]
    Watch {
        #[arg(short, long, help = "Output as JSON lines")]
        json: bool,
    },

    #[command(about = "Run a single polling cycle and print the result")]
    Once {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Find an entity by label or device id and print where to fly")]
    Focus {
        #[arg(long, help = "Tracker label or entity name")]
        label: Option<String>,

        #[arg(long, help = "Device IMEI or backend car id")]
        imei: Option<String>,

        #[arg(long, default_value = "6", help = "Current map zoom")]
        zoom: u8,
    },

    #[command(about = "Reverse-geocode the current position of an entity")]
    Address {
        #[arg(help = "Entity id, e.g. A::7")]
        entity_id: String,
    },

    #[command(subcommand, about = "Manage user-added tracker accounts")]
    Account(AccountCommands),

    #[command(about = "Show the effective configuration, or save it with --write")]
    Config {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Save the effective configuration (overrides included) to fleetsync.json")]
        write: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    #[command(about = "List static and user-added accounts")]
    List {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Add a tracker account (replaces one with the same label)")]
    Add {
        #[arg(long, help = "Account login / device IMEI")]
        imei: String,

        #[arg(long, env = "FLEETSYNC_TRACKER_PASSWORD", help = "Account password")]
        password: String,

        #[arg(long, help = "Display label, unique across accounts")]
        label: String,

        #[arg(long, help = "Marker color, e.g. #ff8800")]
        color: Option<String>,
    },

    #[command(about = "Remove a tracker account")]
    Remove {
        #[arg(help = "Label of the account to remove")]
        label: String,
    },
}
