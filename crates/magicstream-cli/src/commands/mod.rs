//! Subcommand implementations.

mod genres;
mod login;
mod logout;
mod movies;
mod refresh;
mod register;
mod review;
mod whoami;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde_json::Value;

use magicstream_core::{Error, RequestDescriptor};

use crate::session::CliClient;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with email and password
    Login(login::LoginArgs),

    /// Create a new account
    Register(register::RegisterArgs),

    /// End the active session
    Logout(logout::LogoutArgs),

    /// Display the active session
    Whoami(whoami::WhoamiArgs),

    /// Renew the session now
    Refresh(refresh::RefreshArgs),

    /// List all movies
    Movies(movies::MoviesArgs),

    /// List movies recommended for the logged-in user
    Recommended(movies::RecommendedArgs),

    /// Show a single movie
    Movie(movies::MovieArgs),

    /// Update the admin review of a movie (admins only)
    Review(review::ReviewArgs),

    /// List the available genres
    Genres(genres::GenresArgs),
}

pub async fn handle(client: &CliClient, command: Commands) -> Result<()> {
    match command {
        Commands::Login(args) => login::run(client, args).await,
        Commands::Register(args) => register::run(client, args).await,
        Commands::Logout(args) => logout::run(client, args).await,
        Commands::Whoami(args) => whoami::run(client, args).await,
        Commands::Refresh(args) => refresh::run(client, args).await,
        Commands::Movies(args) => movies::run_list(client, args).await,
        Commands::Recommended(args) => movies::run_recommended(client, args).await,
        Commands::Movie(args) => movies::run_get(client, args).await,
        Commands::Review(args) => review::run(client, args).await,
        Commands::Genres(args) => genres::run(client, args).await,
    }
}

const SESSION_EXPIRED: &str = "Session expired. Run 'magicstream login' again.";

/// Send `request` through the session coordinator and decode the JSON body.
async fn call(client: &CliClient, request: RequestDescriptor) -> Result<Value> {
    let what = request.to_string();

    let response = match client.http().send(request).await {
        Ok(response) => response,
        Err(Error::SessionExpired) => {
            client.end_session().await;
            bail!(SESSION_EXPIRED);
        }
        Err(e) => return Err(e).with_context(|| format!("{} failed", what)),
    };

    let response = response
        .error_for_status()
        .with_context(|| format!("{} failed", what))?;

    if response.body().is_empty() {
        return Ok(Value::Null);
    }
    response
        .json()
        .with_context(|| format!("Invalid response from {}", what))
}
