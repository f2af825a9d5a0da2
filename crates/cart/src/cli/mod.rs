use clap::{Parser, Subcommand};
use stride_cart::{config::CartClientConfig, ids::ProductId};

mod cart;
mod wishlist;

#[derive(Debug, Parser)]
#[command(name = "stride-cart", about = "Stride storefront cart client", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: CartClientConfig,

    /// Skip the server entirely; changes stay in the local cart
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Show the cart
    Show,

    /// Add units of a product, merging with an existing line
    Add {
        product: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Unit price in minor units; looked up in the catalog when omitted
        #[arg(long)]
        price: Option<u64>,
    },

    /// Set the quantity of a line; 0 removes it
    Set { product: ProductId, quantity: u32 },

    /// Remove a line
    Remove { product: ProductId },

    /// Empty the cart
    Clear,

    /// Replace the local cart with the server's
    Sync,

    /// Manage liked products
    Wishlist {
        #[command(subcommand)]
        command: wishlist::WishlistCommand,
    },
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Command::Wishlist { command } => wishlist::run(&self.config, command),
            command => cart::run(&self.config, self.offline, command).await,
        }
    }
}
