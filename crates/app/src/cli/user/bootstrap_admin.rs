use clap::Args;
use platter_app::domain::users::data::NewUser;

use crate::config::DatabaseConfig;

#[derive(Debug, Args)]
pub(crate) struct BootstrapAdminArgs {
    /// Chat platform user id
    #[arg(long, env = "SUPER_ADMIN_PLATFORM_ID")]
    platform_id: i64,

    /// Optional platform username
    #[arg(long)]
    username: Option<String>,

    #[command(flatten)]
    database: DatabaseConfig,
}

pub(crate) async fn run(args: BootstrapAdminArgs) -> Result<(), String> {
    let ctx = crate::cli::connect(&args.database).await?;

    let admin = ctx
        .users
        .bootstrap_super_admin(NewUser {
            username: args.username,
            ..NewUser::with_platform_id(args.platform_id)
        })
        .await
        .map_err(|error| format!("failed to bootstrap super admin: {error}"))?;

    println!("user_uuid: {}", admin.uuid);
    println!("platform_id: {}", admin.platform_id);
    println!("role: {}", admin.role);

    Ok(())
}
