use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub mod categories;
pub mod config;
pub mod picks;
pub mod pools;
pub mod ranking;
pub mod schema;
pub mod state;
pub mod users;
pub mod util_resp;
pub mod validation;

#[cfg(test)]
pub mod test;
