use clap::{Args, Parser, Subcommand};
use stride_app::database::{self, Db};

mod carts;
mod category;
mod db;
mod product;
mod token;
mod user;

#[derive(Debug, Parser)]
#[command(name = "stride-app", about = "Stride storefront administration", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    User(user::UserCommand),
    Token(token::TokenCommand),
    Category(category::CategoryCommand),
    Product(product::ProductCommand),
    Carts(carts::CartsCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::User(command) => user::run(command).await,
            Commands::Token(command) => token::run(command).await,
            Commands::Category(command) => category::run(command).await,
            Commands::Product(command) => product::run(command).await,
            Commands::Carts(command) => carts::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

impl DatabaseArgs {
    pub(crate) async fn connect(&self) -> Result<Db, String> {
        database::connect(&self.database_url)
            .await
            .map(Db::new)
            .map_err(|error| format!("failed to connect to database: {error}"))
    }
}
