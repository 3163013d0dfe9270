//! CLI definitions for MemoCloud.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// MemoCloud CLI.
#[derive(Parser)]
#[command(name = "memocloud")]
#[command(about = "Rich-text memos stored on WebDAV with an offline cache")]
#[command(version)]
pub(crate) struct Cli {
    /// Local cache database path
    #[arg(long, env = "MEMOCLOUD_CACHE_DB", global = true)]
    pub cache_db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MEMOCLOUD_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Directory for rolling log files
    #[arg(long, env = "MEMOCLOUD_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start a session
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// End the session (cached memos are kept)
    Logout,

    /// List memos, newest first
    List,

    /// Print one memo
    Show {
        /// Memo ID
        id: String,
    },

    /// Create a memo
    New {
        #[arg(short, long, default_value = "")]
        title: String,

        /// Body markup
        #[arg(short, long, default_value = "")]
        body: String,
    },

    /// Edit an existing memo
    Edit {
        /// Memo ID
        id: String,

        /// Replace the title
        #[arg(short, long)]
        title: Option<String>,

        /// Replace the body markup
        #[arg(short, long)]
        body: Option<String>,

        /// Append an unchecked todo item
        #[arg(long)]
        todo: Vec<String>,

        /// Append a horizontal rule
        #[arg(long)]
        rule: bool,

        /// Append a link
        #[arg(long)]
        link: Option<String>,

        /// Upload a file and append it as an attachment
        #[arg(long)]
        attach: Option<PathBuf>,
    },

    /// Delete a memo
    Delete {
        /// Memo ID
        id: String,
    },

    /// Upload a file and print its URL
    Upload {
        /// Path to the file
        file: PathBuf,
    },

    /// Push cached memos that are newer than the remote copy
    Sync,
}
