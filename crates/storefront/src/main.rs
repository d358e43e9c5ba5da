//! `shopcart` command-line client.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use shopcart_cart::Cart;
use shopcart_core::ProductId;
use shopcart_storefront::{CartOutcome, CartStore, RecordingNotifier, StorefrontConfig};

#[derive(Debug, Parser)]
#[command(name = "shopcart", about = "Manage the storefront cart from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the cart.
    List,
    /// Add one unit of a product.
    Add { id: ProductId },
    /// Remove a product from the cart.
    Remove { id: ProductId },
    /// Set the amount of a product already in the cart.
    Update {
        id: ProductId,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Empty the cart.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopcart_observability::init_stderr();

    let cli = Cli::parse();
    let config = StorefrontConfig::from_env();
    tracing::debug!(api_url = %config.api_url, cart_key = %config.cart_key, "starting");

    let notices = RecordingNotifier::new();
    let store = CartStore::open(&config, Arc::new(notices.clone())).await?;

    let outcome = match cli.command {
        Command::List => None,
        Command::Add { id } => Some(store.add_product(id).await),
        Command::Remove { id } => Some(store.remove_product(id).await),
        Command::Update { id, amount } => Some(store.update_product_amount(id, amount).await),
        Command::Clear => {
            store.clear().await?;
            None
        }
    };

    for notice in notices.take() {
        eprintln!("{notice}");
    }

    print_cart(&store.snapshot().await);

    if matches!(outcome, Some(CartOutcome::Rejected(_))) {
        std::process::exit(1);
    }
    Ok(())
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty.");
        return;
    }

    println!("{:>6}  {:<40} {:>6} {:>10} {:>12}", "ID", "TITLE", "AMOUNT", "PRICE", "SUBTOTAL");
    for item in cart.items() {
        println!(
            "{:>6}  {:<40} {:>6} {:>10.2} {:>12.2}",
            item.product_id(),
            item.product.title,
            item.amount,
            item.product.price,
            item.subtotal()
        );
    }
    println!(
        "{} item(s), {} unit(s), total {:.2}",
        cart.len(),
        cart.total_units(),
        cart.total_price()
    );
}
