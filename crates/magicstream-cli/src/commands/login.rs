//! Login command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use magicstream_core::Credentials;

use crate::output;
use crate::session::CliClient;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email address
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(client: &CliClient, args: LoginArgs) -> Result<()> {
    if let Some(session) = client.http().session() {
        bail!(
            "Already logged in as {}. Run 'magicstream logout' first.",
            session.email
        );
    }

    eprintln!("{}", "Logging in...".dimmed());

    let session = client
        .http()
        .login(Credentials::new(&args.email, &args.password))
        .await
        .context("Failed to login")?;

    output::success(&format!("Welcome back, {}", session.display_name()));
    println!();
    output::session(&session);

    Ok(())
}
