//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use magicstream_core::{Role, Session};

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print the fields of a session.
pub fn session(session: &Session) {
    let name = format!("{} {}", session.first_name, session.last_name);
    let name = name.trim();

    field("Name", if name.is_empty() { session.display_name() } else { name });
    field("Email", &session.email);
    field("User ID", &session.user_id);
    field("Role", role(session.role));

    if !session.favourite_genres.is_empty() {
        let genres: Vec<&str> = session
            .favourite_genres
            .iter()
            .map(|g| g.genre_name.as_str())
            .collect();
        field("Genres", &genres.join(", "));
    }
}

fn role(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::User => "user",
    }
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
