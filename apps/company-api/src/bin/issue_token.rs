//! Mint a bearer token for calling the company API locally

use anyhow::{Context, Result};
use clap::Parser;
use company_api::auth::issue_token;

#[derive(Parser, Debug)]
#[command(name = "issue-token", about = "Sign an HS256 bearer token for the company API")]
struct Args {
    /// Shared secret the API verifies tokens with
    #[arg(long, env = "JWT_SECRET", default_value = "your_secret_key")]
    secret: String,

    /// Username claim
    #[arg(long, default_value = "testuser")]
    username: String,

    /// Validity in hours
    #[arg(long, default_value_t = 24)]
    hours: i64,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let token = issue_token(&args.secret, &args.username, chrono::Duration::hours(args.hours))
        .context("Failed to sign token")?;
    println!("{token}");
    Ok(())
}
