use clap::Subcommand;
use stride_cart::{
    config::CartClientConfig,
    ids::ProductId,
    store::JsonFileStore,
    wishlist::{Wishlist, WishlistToggle},
};

#[derive(Debug, Subcommand)]
pub(crate) enum WishlistCommand {
    /// Like a product, or unlike it if it is already liked
    Toggle { product: ProductId },

    /// List liked products
    Show,
}

pub(crate) fn run(config: &CartClientConfig, command: WishlistCommand) -> Result<(), String> {
    let mut wishlist = Wishlist::load(JsonFileStore::new(config.wishlist_path()));

    if let WishlistCommand::Toggle { product } = command {
        match wishlist.toggle_item(product) {
            WishlistToggle::Added => println!("liked {product}"),
            WishlistToggle::Removed => println!("unliked {product}"),
        }
    }

    if wishlist.is_empty() {
        println!("wishlist is empty");
    }

    for item in wishlist.items() {
        println!("{}  liked {}", item.product_id, item.added_at);
    }

    Ok(())
}
