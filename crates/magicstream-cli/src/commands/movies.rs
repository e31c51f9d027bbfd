//! Movie listing and lookup commands.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use magicstream_core::{RequestDescriptor, path_segment};

use crate::output;
use crate::session::CliClient;

#[derive(Args, Debug)]
pub struct MoviesArgs {}

#[derive(Args, Debug)]
pub struct RecommendedArgs {}

#[derive(Args, Debug)]
pub struct MovieArgs {
    /// IMDb id of the movie, e.g. tt0111161
    pub imdb_id: String,
}

pub async fn run_list(client: &CliClient, _args: MoviesArgs) -> Result<()> {
    let movies = super::call(client, RequestDescriptor::get("/movies")).await?;
    print_lines(&movies)
}

pub async fn run_recommended(client: &CliClient, _args: RecommendedArgs) -> Result<()> {
    client.require_session()?;
    let movies = super::call(client, RequestDescriptor::get("/recommendedmovies")).await?;
    print_lines(&movies)
}

pub async fn run_get(client: &CliClient, args: MovieArgs) -> Result<()> {
    let imdb_id = path_segment(&args.imdb_id).context("Invalid IMDb id")?;
    let movie = super::call(client, RequestDescriptor::get(format!("/movie/{}", imdb_id))).await?;
    output::json_pretty(&movie)
}

/// One compact JSON document per line for arrays, so the output can be piped.
fn print_lines(value: &Value) -> Result<()> {
    match value {
        Value::Array(items) => items.iter().try_for_each(output::json::<Value>),
        other => output::json(other),
    }
}
