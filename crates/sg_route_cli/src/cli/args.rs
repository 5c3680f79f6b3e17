use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use sg_route_core::config::WeightProfile;

#[derive(Parser)]
#[command(
    name = "sg_route",
    version,
    about = "Evaluate and rank Singapore travel routes against live traffic and parking snapshots"
)]
pub struct Cli {
    /// Path to the SQLite signal database (overrides SG_ROUTE_DB)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Profile {
    /// time 0.6, incidents 0.3, parking 0.1
    TimeFirst,
    /// time 0.5, incidents 0.2, parking 0.3
    ParkingAware,
}

impl From<Profile> for WeightProfile {
    fn from(p: Profile) -> Self {
        match p {
            Profile::TimeFirst => WeightProfile::TimeFirst,
            Profile::ParkingAware => WeightProfile::ParkingAware,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score route candidates from a JSON file and print the recommendation
    Evaluate {
        /// JSON array of route candidates
        routes: PathBuf,

        /// Traveller does not drive: recommend public transport only
        #[arg(long, default_value_t = false)]
        public_only: bool,

        /// Private-route weighting
        #[arg(long, value_enum, default_value_t = Profile::TimeFirst)]
        profile: Profile,

        /// Evaluation time "YYYY-MM-DD HH:MM" (defaults to now)
        #[arg(long)]
        at: Option<String>,

        /// Public routes listed by the public-only policy
        #[arg(long)]
        top: Option<usize>,

        /// Print the full evaluation report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write the JSON report to a file instead of stdout
        #[arg(long, requires = "json")]
        file: Option<PathBuf>,
    },

    /// Rank precomputed scores (e.g. --route private:90 --route public:60)
    Rank {
        /// MODE:SCORE, where MODE is private or public; order defines route numbers
        #[arg(long = "route", required = true)]
        routes: Vec<String>,

        #[arg(long, default_value_t = false)]
        public_only: bool,

        /// Routes listed with --public-only
        #[arg(long)]
        top: Option<usize>,
    },

    /// Signal database commands
    Db {
        #[command(subcommand)]
        cmd: DbCommands,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Create (or recreate) the local SQLite database with the current schema
    Init {
        /// Overwrite existing database if present
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show local database status (path, schema version, rows per feed)
    Status,

    /// Import Datamall CSV snapshots
    Import {
        /// Traffic incidents CSV
        #[arg(long)]
        incidents: Option<PathBuf>,

        /// Road works CSV
        #[arg(long)]
        roadworks: Option<PathBuf>,

        /// Car park availability CSV
        #[arg(long)]
        carparks: Option<PathBuf>,

        /// Replace existing rows instead of appending
        #[arg(long, default_value_t = false)]
        replace: bool,
    },
}
