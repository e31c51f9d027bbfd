//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;
use crate::session::CliClient;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(client: &CliClient, _args: LogoutArgs) -> Result<()> {
    if client.http().session().is_none() {
        output::warning("Not logged in");
        return Ok(());
    }

    client.http().logout().await?;
    output::success("Logged out");

    Ok(())
}
