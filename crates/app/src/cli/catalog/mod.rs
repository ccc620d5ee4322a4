use clap::{Args, Subcommand};

mod import_dishes;

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// Create dishes in a category from `name | price` lines
    ImportDishes(import_dishes::ImportDishesArgs),
}

pub(crate) async fn run(command: CatalogCommand) -> Result<(), String> {
    match command.command {
        CatalogSubcommand::ImportDishes(args) => import_dishes::run(args).await,
    }
}
