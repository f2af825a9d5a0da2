use clap::{Args, Subcommand};
use jiff::{SignedDuration, Timestamp};
use stride_app::domain::carts::{CartsService, PgCartsService};

use super::DatabaseArgs;

#[derive(Debug, Args)]
pub(crate) struct CartsCommand {
    #[command(subcommand)]
    command: CartsSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartsSubcommand {
    /// Delete anonymous carts that have not changed recently
    Purge(PurgeCartsArgs),
}

#[derive(Debug, Args)]
pub(crate) struct PurgeCartsArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Age after which an untouched anonymous cart is removed
    #[arg(
        long,
        env = "CART_TTL_HOURS",
        default_value_t = 720,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    older_than_hours: u32,
}

pub(crate) async fn run(command: CartsCommand) -> Result<(), String> {
    let CartsSubcommand::Purge(args) = command.command;

    let cutoff = Timestamp::now()
        .checked_sub(SignedDuration::from_hours(i64::from(args.older_than_hours)))
        .map_err(|error| format!("invalid cutoff: {error}"))?;

    let db = args.database.connect().await?;

    let purged = PgCartsService::new(db)
        .purge_abandoned(cutoff)
        .await
        .map_err(|error| format!("failed to purge carts: {error}"))?;

    println!("purged {purged} abandoned carts older than {cutoff}");

    Ok(())
}
