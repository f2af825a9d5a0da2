use clap::{Args, Subcommand};
use stride_app::domain::{
    categories::records::CategoryUuid,
    products::{PgProductsService, ProductsService, data::NewProduct, records::ProductUuid},
};

use super::DatabaseArgs;

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    Create(CreateProductArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Category the product is listed under
    #[arg(long)]
    category_uuid: CategoryUuid,

    #[arg(long)]
    name: String,

    #[arg(long)]
    brand: String,

    /// Unit price in minor currency units
    #[arg(long)]
    price: u64,

    /// Units on hand
    #[arg(long, default_value_t = 0)]
    stock: u64,

    /// Available size labels, comma separated
    #[arg(long, value_delimiter = ',')]
    sizes: Vec<String>,
}

pub(crate) async fn run(command: ProductCommand) -> Result<(), String> {
    let ProductSubcommand::Create(args) = command.command;

    let db = args.database.connect().await?;

    let product = PgProductsService::new(db)
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            category_uuid: args.category_uuid,
            name: args.name,
            brand: args.brand,
            price: args.price,
            stock: args.stock,
            sizes: args.sizes,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    println!("product_uuid: {}", product.uuid);
    println!("price: {}", product.price);
    println!("stock: {}", product.stock);

    Ok(())
}
