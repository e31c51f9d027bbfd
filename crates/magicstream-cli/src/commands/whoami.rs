//! Whoami command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;
use crate::session::CliClient;

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

pub async fn run(client: &CliClient, _args: WhoamiArgs) -> Result<()> {
    let session = client.require_session()?;

    output::session(&session);
    output::field("API", client.api_url().as_str());
    if let Some(saved_at) = client.saved_at() {
        output::field("Saved", &saved_at.to_rfc3339());
    }

    Ok(())
}
