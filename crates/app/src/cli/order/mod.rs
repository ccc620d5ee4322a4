use clap::{Args, Subcommand};

mod summary;

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Print the consolidated purchase list of an order
    Summary(summary::SummaryArgs),
}

pub(crate) async fn run(command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Summary(args) => summary::run(args).await,
    }
}
