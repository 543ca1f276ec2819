//! CLI interface for Kayd

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "kayd")]
#[command(version)]
#[command(about = "Browse books, authors and your reading progress", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a kayd.toml configuration file in the current directory
    Init,

    /// Sign in with your phone number
    Login {
        /// Phone number (prompted if omitted)
        #[arg(short, long)]
        phone: Option<String>,

        /// Password (prompted if omitted)
        #[arg(long, env = "KAYD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Username (prompted if omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Phone number (prompted if omitted)
        #[arg(short, long)]
        phone: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show who is signed in
    Whoami {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Recent books and what you're currently reading
    Home,

    /// List books
    Books {
        /// Only show books whose title or publisher contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one book
    Book {
        /// Book id
        id: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List authors
    Authors {
        /// Only show authors whose pen name or biography contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one author and their books
    Author {
        /// Author id
        id: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Manage your reading list and progress
    Reading {
        #[command(subcommand)]
        action: ReadingAction,
    },

    /// View and manage your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
pub enum ReadingAction {
    /// Add a book to your reading list
    Add {
        /// Book id
        book: String,
    },

    /// Record how far you are in a book
    Progress {
        /// Book id
        book: String,

        /// Page you're on
        #[arg(long)]
        page: u32,

        /// Total pages in the book
        #[arg(long)]
        total: u32,
    },

    /// Show the book you're currently reading
    Current,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show your profile
    Show {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Change your username, phone or avatar
    Update {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,

        /// Avatar image URL
        #[arg(short, long)]
        avatar: Option<String>,
    },

    /// Change your password
    Password,

    /// Permanently delete your account
    Delete {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
