//! CLI argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Operator console for a fleet of connected devices
#[derive(Parser, Debug)]
#[command(name = "fleet-console")]
#[command(about = "Live message console and log browser for device fleets")]
#[command(version)]
pub struct Cli {
    /// Backend host, overriding the config file
    #[arg(long, env = "FLEET_HOST")]
    pub host: Option<String>,

    /// Config file path (default: XDG config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Follow the live message stream
    Watch {
        /// Only show messages for these clients (default: all)
        #[arg(short = 'c', long = "client")]
        clients: Vec<String>,
    },

    /// Send a one-shot command to a client
    Send {
        /// Target client id
        #[arg(long = "to")]
        target: String,

        /// Command text
        message: String,
    },

    /// List device serial numbers with logs
    Devices,

    /// List log dates for a device
    Dates {
        /// Device serial number
        sn: String,
    },

    /// Print a device log to stdout, chunk by chunk
    Tail {
        /// Device serial number
        sn: String,

        /// Log date (YYYY-MM-DD)
        date: String,
    },

    /// Print a named log file (small files only)
    View {
        /// Log file name
        name: String,
    },

    /// List available log files
    List,

    /// Download a log file
    Download {
        /// Log file name
        name: String,

        /// Destination path (default: the runtime download directory)
        #[arg(short = 'o', long = "out")]
        dest: Option<PathBuf>,
    },
}
