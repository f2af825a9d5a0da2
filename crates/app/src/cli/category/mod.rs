use clap::{Args, Subcommand};
use stride_app::domain::categories::{
    CategoriesService, PgCategoriesService,
    data::NewCategory,
    records::CategoryUuid,
};

use super::DatabaseArgs;

#[derive(Debug, Args)]
pub(crate) struct CategoryCommand {
    #[command(subcommand)]
    command: CategorySubcommand,
}

#[derive(Debug, Subcommand)]
enum CategorySubcommand {
    Create(CreateCategoryArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CreateCategoryArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Display name
    #[arg(long)]
    name: String,

    /// URL slug, lowercase words joined by hyphens
    #[arg(long)]
    slug: String,
}

pub(crate) async fn run(command: CategoryCommand) -> Result<(), String> {
    let CategorySubcommand::Create(args) = command.command;

    let db = args.database.connect().await?;

    let category = PgCategoriesService::new(db.pool().clone())
        .create_category(NewCategory {
            uuid: CategoryUuid::new(),
            name: args.name,
            slug: args.slug,
        })
        .await
        .map_err(|error| format!("failed to create category: {error}"))?;

    println!("category_uuid: {}", category.uuid);
    println!("slug: {}", category.slug);

    Ok(())
}
