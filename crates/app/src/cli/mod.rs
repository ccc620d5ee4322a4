use std::sync::Arc;

use clap::{Parser, Subcommand};
use platter_app::{
    context::AppContext, domain::users::records::UserUuid, notifications::TracingNotifier,
};

use crate::config::{DatabaseConfig, LoggingConfig};

mod catalog;
mod db;
mod order;
mod user;

#[derive(Debug, Parser)]
#[command(name = "platter", about = "Platter CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    User(user::UserCommand),
    Catalog(catalog::CatalogCommand),
    Order(order::OrderCommand),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::User(command) => user::run(command).await,
            Commands::Catalog(command) => catalog::run(command).await,
            Commands::Order(command) => order::run(command).await,
        }
    }
}

/// Services for a one-shot command. Notifications are written to the log.
async fn connect(database: &DatabaseConfig) -> Result<AppContext, String> {
    AppContext::from_database_url(&database.database_url, Arc::new(TracingNotifier))
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))
}

/// Resolve the acting user from their chat platform id.
async fn actor(ctx: &AppContext, platform_id: i64) -> Result<UserUuid, String> {
    ctx.users
        .get_user_by_platform_id(platform_id)
        .await
        .map(|user| user.uuid)
        .map_err(|error| format!("failed to resolve user {platform_id}: {error}"))
}
