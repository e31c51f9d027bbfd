//! Refresh command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use magicstream_core::Error;

use crate::output;
use crate::session::CliClient;

use super::SESSION_EXPIRED;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(client: &CliClient, _args: RefreshArgs) -> Result<()> {
    let session = client.require_session()?;

    eprintln!("{}", "Refreshing session...".dimmed());

    let request = client.http().config().renew_request();
    match client.http().send(request).await {
        Ok(response) => {
            response
                .error_for_status()
                .context("Failed to refresh session")?;
        }
        Err(Error::SessionExpired) => {
            client.end_session().await;
            bail!(SESSION_EXPIRED);
        }
        Err(e) => return Err(e).context("Failed to refresh session"),
    }

    output::success("Session refreshed successfully");
    output::field("User ID", &session.user_id);

    Ok(())
}
