//! CLI subcommands.

pub mod admin;
pub mod migrate;

use secrecy::SecretString;

const DEFAULT_DATABASE_URL: &str = "sqlite://database/ranking.db";

/// Database URL from the environment, matching the server's lookup order.
pub fn database_url() -> SecretString {
    dotenvy::dotenv().ok();

    let url = std::env::var("RANKING_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());
    SecretString::from(url)
}
