use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "vetbox")]
#[command(about = "Offline submission outbox for the clinic web app")]
#[command(long_about = "vetbox - offline submission outbox

Sends form submissions to the clinic server, or keeps them in a durable
queue while the server is unreachable and replays them in order once it
comes back.

QUICK START:
  vetbox submit /api/shares --json '{\"tutor_id\": 5}'   Send or queue
  vetbox status                                     Queue and drain state
  vetbox drain                                      Replay queued requests
  vetbox watch                                      Replay on reconnect

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  vetbox <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output (default),
    /// or 'json' for machine-readable output suitable for scripting.
    /// Falls back to `general.default_output` from the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Treat the server as unreachable
    ///
    /// Every submission is queued and drains stop immediately.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Data directory (config file and queue database)
    #[arg(long, env = "VETBOX_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Log filter, e.g. 'info' or 'vetbox=debug'
    ///
    /// Overrides the VETBOX_LOG environment variable.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a request, queueing it if the server is unreachable
    ///
    /// The URL may be relative to `server.base_url`. At most one body
    /// option may be given.
    ///
    /// # Examples
    ///
    ///   vetbox submit /api/shares --json '{"tutor_id": 5}'
    ///   vetbox submit /animals/new -f name=Rex -f species=dog --require name
    ///   vetbox submit /api/sales/3 -X DELETE --confirm "Delete this sale?"
    #[command(alias = "s")]
    Submit(SubmitArgs),

    /// Replay queued requests now
    ///
    /// Sends the queue head first. 2xx and 4xx replies remove the entry;
    /// anything else stops the pass and keeps the rest queued.
    Drain,

    /// Show queue size, connectivity and drain state
    Status,

    /// List queued requests in replay order
    #[command(alias = "ls")]
    List,

    /// Remove one queued request by position
    ///
    /// Positions are zero-based, as shown by 'vetbox list'.
    Discard {
        /// Position in the queue
        position: usize,
    },

    /// Remove every queued request
    Clear {
        /// Skip confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Watch connectivity and replay the queue whenever it returns
    ///
    /// Drains once at start-up, then on every offline to online transition.
    /// A blocked queue is retried with exponential backoff.
    Watch {
        /// Poll interval in seconds (default: `outbox.poll_interval_secs`)
        #[arg(long, short = 'i')]
        interval: Option<u64>,

        /// Poll once and exit
        #[arg(long)]
        once: bool,
    },

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the submit command.
#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Destination URL
    pub url: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "POST")]
    pub method: String,

    /// Header as 'Name: value' (repeatable)
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    /// Form field as key=value (repeatable)
    #[arg(long = "field", short = 'f', conflicts_with_all = ["json", "text"])]
    pub fields: Vec<String>,

    /// JSON body
    #[arg(long, conflicts_with = "text")]
    pub json: Option<String>,

    /// Raw text body
    #[arg(long)]
    pub text: Option<String>,

    /// Timeout override in milliseconds, or 'off'
    #[arg(long)]
    pub timeout: Option<String>,

    /// Ask this question before sending
    #[arg(long)]
    pub confirm: Option<String>,

    /// Answer yes to the confirmation question
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Required field (repeatable)
    #[arg(long)]
    pub require: Vec<String>,

    /// Element replaced by the reply's html
    #[arg(long)]
    pub target: Option<String>,

    /// Do not reload after a successful submission
    #[arg(long)]
    pub no_reload: bool,

    /// Form id for the double-submit guard (default: the URL)
    #[arg(long)]
    pub form_id: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
