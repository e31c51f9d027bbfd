//! Admin review command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Value, json};

use magicstream_core::{RequestDescriptor, path_segment};

use crate::output;
use crate::session::CliClient;

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// IMDb id of the movie to review
    pub imdb_id: String,

    /// Review text
    #[arg(long)]
    pub review: String,
}

pub async fn run(client: &CliClient, args: ReviewArgs) -> Result<()> {
    let session = client.require_session()?;
    if !session.is_admin() {
        bail!("Only administrators can update reviews.");
    }

    let imdb_id = path_segment(&args.imdb_id).context("Invalid IMDb id")?;
    let request = RequestDescriptor::patch(format!("/updatereview/{}", imdb_id))
        .json(&json!({ "admin_review": args.review }))?;

    let updated = super::call(client, request)
        .await
        .context("Failed to update review")?;

    output::success("Review updated");
    output::field("Review", text(&updated, "admin_review"));
    output::field("Ranking", text(&updated, "ranking_name"));

    Ok(())
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("-")
}
