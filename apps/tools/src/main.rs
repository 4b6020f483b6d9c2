use anyhow::{Context, Result};
use chrono::{Days, Utc};
use clap::{Parser, Subcommand};
use shared::{
    domain::{CustomerId, OrderId, OrderStatus, QuoteId, QuoteStatus},
    protocol::{CreateCustomerRequest, CreateOrderRequest, CreateQuoteRequest},
};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/bakery.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateCustomer {
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    CreateOrder {
        customer_id: CustomerId,
        description: String,
        total_cents: i64,
        #[arg(long)]
        delivery_date: Option<chrono::NaiveDate>,
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    CreateQuote {
        customer_id: CustomerId,
        description: String,
        total_cents: i64,
        #[arg(long)]
        valid_until: Option<chrono::NaiveDate>,
        #[arg(long)]
        status: Option<QuoteStatus>,
    },
    SetOrderStatus {
        order_id: OrderId,
        status: OrderStatus,
    },
    SetQuoteStatus {
        quote_id: QuoteId,
        status: QuoteStatus,
    },
    /// Fills an empty database with a few customers, orders and quotes.
    SeedDemo,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open {}", cli.database_url))?;

    match cli.command {
        Command::CreateCustomer { name, phone, email } => {
            let customer = storage
                .create_customer(&CreateCustomerRequest { name, phone, email })
                .await?;
            println!("created customer_id={}", customer.id);
        }
        Command::CreateOrder {
            customer_id,
            description,
            total_cents,
            delivery_date,
            status,
        } => {
            let order = storage
                .create_order(&CreateOrderRequest {
                    customer_id,
                    description,
                    total_cents,
                    delivery_date,
                    status,
                })
                .await?;
            println!("created order_id={} status={}", order.id, order.status);
        }
        Command::CreateQuote {
            customer_id,
            description,
            total_cents,
            valid_until,
            status,
        } => {
            let quote = storage
                .create_quote(&CreateQuoteRequest {
                    customer_id,
                    description,
                    total_cents,
                    valid_until,
                    status,
                })
                .await?;
            println!("created quote_id={} status={}", quote.id, quote.status);
        }
        Command::SetOrderStatus { order_id, status } => {
            match storage.update_order_status(order_id, status).await? {
                Some((id, status)) => println!("order {id} is now {status}"),
                None => anyhow::bail!("order {order_id} not found"),
            }
        }
        Command::SetQuoteStatus { quote_id, status } => {
            match storage.update_quote_status(quote_id, status).await? {
                Some((id, status)) => println!("quote {id} is now {status}"),
                None => anyhow::bail!("quote {quote_id} not found"),
            }
        }
        Command::SeedDemo => seed_demo(&storage).await?,
    }

    Ok(())
}

async fn seed_demo(storage: &Storage) -> Result<()> {
    if storage.count_customers().await? > 0 {
        println!("database already has customers; nothing seeded");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let customers = [
        ("Padaria Central", Some("+55 11 3333-0000")),
        ("Café Aurora", None),
        ("Dona Célia", Some("+55 11 98888-1111")),
    ];
    let mut ids = Vec::with_capacity(customers.len());
    for (name, phone) in customers {
        let customer = storage
            .create_customer(&CreateCustomerRequest {
                name: name.into(),
                phone: phone.map(str::to_string),
                email: None,
            })
            .await?;
        ids.push(customer.id);
    }

    let orders = [
        (0, "200 pães de queijo", 18_000, OrderStatus::Pending, 2),
        (1, "Bolo de cenoura", 9_500, OrderStatus::InProduction, 1),
        (2, "Torta de limão", 12_000, OrderStatus::Ready, 0),
        (0, "50 croissants", 22_500, OrderStatus::Delivered, 0),
    ];
    for (customer, description, total_cents, status, days_ahead) in orders {
        storage
            .create_order(&CreateOrderRequest {
                customer_id: ids[customer],
                description: description.into(),
                total_cents,
                delivery_date: today.checked_add_days(Days::new(days_ahead)),
                status: Some(status),
            })
            .await?;
    }

    let quotes = [
        (1, "Coffee break para 40 pessoas", 48_000, QuoteStatus::Draft),
        (2, "Bolo de casamento", 150_000, QuoteStatus::Sent),
    ];
    for (customer, description, total_cents, status) in quotes {
        storage
            .create_quote(&CreateQuoteRequest {
                customer_id: ids[customer],
                description: description.into(),
                total_cents,
                valid_until: today.checked_add_days(Days::new(14)),
                status: Some(status),
            })
            .await?;
    }

    info!(
        customers = ids.len(),
        orders = orders.len(),
        quotes = quotes.len(),
        "seeded demo data"
    );
    Ok(())
}
