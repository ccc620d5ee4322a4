use std::io;

use clap::{Args, ValueEnum};
use platter::money::format_amount;
use platter_app::domain::orders::records::OrderUuid;
use uuid::Uuid;

use crate::config::DatabaseConfig;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SummaryFormat {
    Table,
    Text,
    Json,
}

#[derive(Debug, Args)]
pub(crate) struct SummaryArgs {
    /// Platform id of the deliverer or administrator asking
    #[arg(long)]
    actor: i64,

    #[arg(long)]
    order: Uuid,

    #[arg(long, value_enum, default_value_t = SummaryFormat::Table)]
    format: SummaryFormat,

    #[command(flatten)]
    database: DatabaseConfig,
}

pub(crate) async fn run(args: SummaryArgs) -> Result<(), String> {
    let ctx = crate::cli::connect(&args.database).await?;
    let actor = crate::cli::actor(&ctx, args.actor).await?;
    let order = OrderUuid::from_uuid(args.order);

    let record = ctx
        .orders
        .get_order(actor, order)
        .await
        .map_err(|error| format!("failed to load order: {error}"))?;

    let summary = ctx
        .orders
        .build_consolidated_summary(actor, order)
        .await
        .map_err(|error| format!("failed to build summary: {error}"))?;

    match args.format {
        SummaryFormat::Table => {
            println!(
                "order {} ({}), total {}",
                record.uuid,
                record.status,
                format_amount(record.total_amount)
            );

            summary
                .write_table(io::stdout().lock())
                .map_err(|error| format!("failed to write summary: {error}"))?;
        }
        SummaryFormat::Text => println!("{summary}"),
        SummaryFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|error| format!("failed to encode summary: {error}"))?;

            println!("{json}");
        }
    }

    Ok(())
}
