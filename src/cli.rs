//! Command-line interface definition for Peerchat
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};

/// Peerchat - direct messaging client for the peer learning platform
///
/// Chat with other platform users from the terminal: pick a
/// correspondent, read the conversation, send, edit, and delete
/// messages.
#[derive(Parser, Debug, Clone)]
#[command(name = "peerchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the API base URL from config
    #[arg(long, env = "PEERCHAT_API_URL")]
    pub api_url: Option<String>,

    /// Current user's id (normally supplied by the platform session)
    #[arg(long, env = "PEERCHAT_USER_ID")]
    pub user_id: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Peerchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Correspondent to open immediately (skips the picker)
        #[arg(short = 't', long)]
        with: Option<String>,
    },

    /// List candidate correspondents
    Users,

    /// Show messages addressed to you that you have not read yet
    Unread,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
