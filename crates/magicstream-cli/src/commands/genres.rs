//! Genre listing command.

use anyhow::{Context, Result};
use clap::Args;

use magicstream_core::{Genre, RequestDescriptor};

use crate::output;
use crate::session::CliClient;

#[derive(Args, Debug)]
pub struct GenresArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn run(client: &CliClient, args: GenresArgs) -> Result<()> {
    let genres = fetch(client).await?;

    if args.json {
        return output::json_pretty(&genres);
    }
    for genre in &genres {
        println!("{:>4}  {}", genre.genre_id, genre.genre_name);
    }

    Ok(())
}

pub(super) async fn fetch(client: &CliClient) -> Result<Vec<Genre>> {
    let body = super::call(client, RequestDescriptor::get("/genres")).await?;
    serde_json::from_value(body).context("Invalid genre list")
}
