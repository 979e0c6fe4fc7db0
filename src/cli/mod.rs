pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Sort;

#[derive(Parser)]
#[command(name = "strand")]
#[command(about = "A reader for federated social timelines", long_about = None)]
pub struct Cli {
    /// Database file (default: <data dir>/strand/strand.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow an actor
    Follow {
        /// Actor URL
        url: String,
    },
    /// Stop following an actor
    Unfollow {
        /// Actor URL
        url: String,
    },
    /// List followed actors
    Following,
    /// Ingest every followed actor
    Ingest,
    /// Show the timeline of followed actors
    Timeline {
        /// latest, oldest or random (default: from config)
        #[arg(short, long)]
        sort: Option<Sort>,

        /// Notes per page (default: from config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },
    /// Show a single post
    Post {
        /// Note URL
        url: String,

        /// Also show replies
        #[arg(long)]
        replies: bool,
    },
}
