//! Command-line and environment configuration.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bank ledger service and teller tools", long_about = None)]
pub struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = "BANK_DB_PATH")]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Register a customer and open their account
    Register(RegisterArgs),
    /// Issue a new card to an existing customer
    IssueCard(IssueCardArgs),
    /// Post a CSV batch of teller transactions and print the touched accounts
    Post(PostArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "BANK_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub tokens: TokenConfig,
}

/// Bearer token settings.
#[derive(Args, Debug, Clone)]
pub struct TokenConfig {
    /// Secret used to sign access and refresh tokens
    #[arg(long, env = "BANK_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Access token lifetime in hours
    #[arg(long, env = "BANK_ACCESS_TTL_HOURS", default_value_t = 24)]
    pub access_ttl_hours: i64,

    /// Refresh token lifetime in hours
    #[arg(long, env = "BANK_REFRESH_TTL_HOURS", default_value_t = 24)]
    pub refresh_ttl_hours: i64,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Phone number, also used as the login username
    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long, env = "BANK_USER_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub address: Option<String>,
}

#[derive(Args, Debug)]
pub struct IssueCardArgs {
    /// Phone number of the card holder
    #[arg(long)]
    pub phone: String,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Input transactions CSV file
    pub input: PathBuf,
}
