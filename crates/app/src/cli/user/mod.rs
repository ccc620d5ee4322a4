use clap::{Args, Subcommand};

mod bootstrap_admin;

#[derive(Debug, Args)]
pub(crate) struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Debug, Subcommand)]
enum UserSubcommand {
    /// Create or promote the platform super administrator
    BootstrapAdmin(bootstrap_admin::BootstrapAdminArgs),
}

pub(crate) async fn run(command: UserCommand) -> Result<(), String> {
    match command.command {
        UserSubcommand::BootstrapAdmin(args) => bootstrap_admin::run(args).await,
    }
}
