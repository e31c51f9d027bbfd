//! Account registration command.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use magicstream_core::{Genre, RequestDescriptor, Role};

use crate::output;
use crate::session::CliClient;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    /// Repeat the password
    #[arg(long)]
    pub confirm_password: String,

    /// Favourite genre by name or id (repeatable)
    #[arg(long = "genre")]
    pub genres: Vec<String>,
}

#[derive(Serialize)]
struct Registration<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    password: &'a str,
    role: Role,
    favourite_genres: Vec<Genre>,
}

pub async fn run(client: &CliClient, args: RegisterArgs) -> Result<()> {
    if args.password != args.confirm_password {
        bail!("Passwords do not match.");
    }

    let favourite_genres = if args.genres.is_empty() {
        Vec::new()
    } else {
        let available = super::genres::fetch(client).await?;
        resolve_genres(&available, &args.genres)?
    };

    let registration = Registration {
        first_name: &args.first_name,
        last_name: &args.last_name,
        email: &args.email,
        password: &args.password,
        role: Role::User,
        favourite_genres,
    };

    eprintln!("{}", "Creating account...".dimmed());

    let request = RequestDescriptor::post("/register").json(&registration)?;
    let created = super::call(client, request)
        .await
        .context("Failed to register")?;

    output::success("Account created");
    if let Some(user_id) = created.get("user_id").and_then(Value::as_str) {
        output::field("User ID", user_id);
    }
    println!("Run 'magicstream login' to sign in.");

    Ok(())
}

/// Match each requested genre against the server's list by id or by
/// case-insensitive name.
fn resolve_genres(available: &[Genre], wanted: &[String]) -> Result<Vec<Genre>> {
    let mut chosen: Vec<Genre> = Vec::with_capacity(wanted.len());

    for name in wanted {
        let genre = available
            .iter()
            .find(|g| g.genre_id.to_string() == *name || g.genre_name.eq_ignore_ascii_case(name))
            .with_context(|| {
                format!(
                    "Unknown genre '{}'. Run 'magicstream genres' to list them.",
                    name
                )
            })?;

        if !chosen.contains(genre) {
            chosen.push(genre.clone());
        }
    }

    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<Genre> {
        vec![
            Genre {
                genre_id: 1,
                genre_name: "Comedy".to_string(),
            },
            Genre {
                genre_id: 2,
                genre_name: "Drama".to_string(),
            },
        ]
    }

    #[test]
    fn resolves_by_name_or_id() {
        let chosen =
            resolve_genres(&catalogue(), &["drama".to_string(), "1".to_string()]).unwrap();
        assert_eq!(chosen[0].genre_name, "Drama");
        assert_eq!(chosen[1].genre_id, 1);
    }

    #[test]
    fn duplicates_are_dropped() {
        let chosen =
            resolve_genres(&catalogue(), &["Comedy".to_string(), "1".to_string()]).unwrap();
        assert_eq!(chosen.len(), 1);
    }

    #[test]
    fn unknown_genre_is_an_error() {
        let err = resolve_genres(&catalogue(), &["Western".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Western"));
    }

    #[test]
    fn registration_payload_shape() {
        let registration = Registration {
            first_name: "Alice",
            last_name: "Liddell",
            email: "alice@example.com",
            password: "secret",
            role: Role::User,
            favourite_genres: catalogue(),
        };
        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(value["role"], "USER");
        assert_eq!(value["favourite_genres"][1]["genre_name"], "Drama");
    }
}
