use std::{fs, path::PathBuf};

use clap::Args;
use platter::{import::parse_import_lines, money::format_amount};
use platter_app::domain::catalog::records::CategoryUuid;
use uuid::Uuid;

use crate::config::DatabaseConfig;

#[derive(Debug, Args)]
pub(crate) struct ImportDishesArgs {
    /// Platform id of the administrator performing the import
    #[arg(long)]
    actor: i64,

    /// Category receiving the dishes
    #[arg(long)]
    category: Uuid,

    /// File with one `name | price` entry per line
    #[arg(long)]
    file: PathBuf,

    #[command(flatten)]
    database: DatabaseConfig,
}

pub(crate) async fn run(args: ImportDishesArgs) -> Result<(), String> {
    let text = fs::read_to_string(&args.file)
        .map_err(|error| format!("failed to read {}: {error}", args.file.display()))?;

    let ctx = crate::cli::connect(&args.database).await?;
    let actor = crate::cli::actor(&ctx, args.actor).await?;

    let report = ctx
        .catalog
        .import_dishes(
            actor,
            CategoryUuid::from_uuid(args.category),
            parse_import_lines(&text),
        )
        .await
        .map_err(|error| format!("failed to import dishes: {error}"))?;

    for dish in &report.created {
        println!("created: {} ({})", dish.name, format_amount(dish.price));
    }

    for failure in &report.failed {
        println!(
            "skipped line {}: {} ({})",
            failure.line, failure.name, failure.reason
        );
    }

    println!(
        "imported {} of {} entries",
        report.created.len(),
        report.total()
    );

    Ok(())
}
