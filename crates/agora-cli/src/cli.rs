use clap::{Args, Parser, Subcommand, ValueEnum};

use agora_types::VotingThreshold;

/// agora - collaborative board meetings with encrypted share links
#[derive(Debug, Parser)]
#[command(name = "agora")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a board; the creator becomes its admin
    Create {
        title: String,
        #[arg(long = "as", value_name = "NAME")]
        creator: String,
    },

    /// Join a cached board as a participant
    Join { board_id: String, name: String },

    /// Add an agenda item (admin only)
    AddItem(AddItemArgs),

    /// Vote on an agenda item
    Vote {
        board_id: String,
        item_id: String,
        /// Option key, e.g. approve, reject, abstain
        option: String,
        #[arg(long = "as", value_name = "NAME")]
        name: String,
    },

    /// Mark a non-voting item as done (admin only)
    Complete {
        board_id: String,
        item_id: String,
        #[arg(long = "as", value_name = "NAME")]
        name: String,
    },

    /// Print a cached board
    Show {
        board_id: String,
        /// Print the board as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print an encrypted share link for a board
    Share(ShareArgs),

    /// Open a share link and store the board locally
    Open {
        url: String,
        /// Join the board under this name after opening it
        #[arg(long = "as", value_name = "NAME")]
        name: Option<String>,
    },

    /// Follow a board and print it whenever it changes
    Watch { board_id: String },

    /// List cached boards
    Boards,

    /// List agenda item types and their vote options
    Types,
}

#[derive(Debug, Args)]
pub struct AddItemArgs {
    pub board_id: String,

    /// Item type key, see `agora types`
    #[arg(short = 't', long = "type")]
    pub item_type: String,

    #[arg(long)]
    pub title: String,

    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Estimated minutes; defaults to the type's estimate
    #[arg(short, long)]
    pub minutes: Option<u32>,

    #[arg(short, long)]
    pub presenter: Option<String>,

    #[arg(long, value_enum)]
    pub threshold: Option<ThresholdArg>,

    #[arg(long = "as", value_name = "NAME")]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct ShareArgs {
    pub board_id: String,

    /// Link lifetime in days: 1, 7 or 30
    #[arg(long, value_name = "DAYS")]
    pub ttl_days: Option<u64>,

    /// Clear-text hint shown to whoever opens the link
    #[arg(long)]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThresholdArg {
    SimpleMajority,
    Supermajority,
    ThreeQuarters,
    Unanimous,
}

impl From<ThresholdArg> for VotingThreshold {
    fn from(arg: ThresholdArg) -> Self {
        match arg {
            ThresholdArg::SimpleMajority => Self::SimpleMajority,
            ThresholdArg::Supermajority => Self::Supermajority,
            ThresholdArg::ThreeQuarters => Self::ThreeQuarters,
            ThresholdArg::Unanimous => Self::Unanimous,
        }
    }
}

impl Cli {
    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> String {
        let level = if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };
        format!("agora={0},agora_core={0},agora_store={0}", level)
    }
}
