use std::{fmt::Display, str::FromStr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use board::{BoardController, BoardEvent, DropTarget, MoveOutcome, StatusRemote};
use clap::{Args, Parser, Subcommand};
use client_core::{BakeryClient, OrderRemote, QuoteRemote};
use shared::domain::{Order, Quote};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

use render::{format_cents, render_board, CardLine};

#[derive(Parser, Debug)]
#[command(name = "bakery-board", about = "Order and quote boards for the bakery server")]
struct Cli {
    #[arg(long, env = "BAKERY_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Order board.
    Orders(BoardArgs),
    /// Quote board.
    Quotes(BoardArgs),
    Dashboard,
}

#[derive(Args, Debug)]
struct BoardArgs {
    /// Comma-separated statuses to show as columns, in order.
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,
    #[command(subcommand)]
    action: BoardAction,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum BoardAction {
    Show,
    /// Drag-style move: onto another card, or into a column.
    Move {
        id: String,
        #[arg(long, conflicts_with = "over", required_unless_present = "over")]
        to: Option<String>,
        #[arg(long, requires = "to")]
        index: Option<usize>,
        #[arg(long)]
        over: Option<String>,
    },
    /// Change one status; the card goes to the end of its new column.
    SetStatus { id: String, status: String },
    /// Change the status of several cards at once.
    Bulk {
        status: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = BakeryClient::new(&cli.server_url)
        .with_context(|| format!("cannot use server url '{}'", cli.server_url))?;

    match cli.command {
        Command::Orders(args) => {
            let remote: Arc<dyn StatusRemote<Order>> = Arc::new(OrderRemote::new(client));
            run_board(remote, args).await
        }
        Command::Quotes(args) => {
            let remote: Arc<dyn StatusRemote<Quote>> = Arc::new(QuoteRemote::new(client));
            run_board(remote, args).await
        }
        Command::Dashboard => {
            let summary = client.dashboard().await?;
            println!("customers: {}", summary.customers);
            println!("open order value: {}", format_cents(summary.open_order_value_cents));
            println!("orders:");
            for entry in summary.orders_by_status {
                println!("  {:<14} {}", entry.status, entry.count);
            }
            println!("quotes:");
            for entry in summary.quotes_by_status {
                println!("  {:<14} {}", entry.status, entry.count);
            }
            Ok(())
        }
    }
}

async fn run_board<T>(remote: Arc<dyn StatusRemote<T>>, args: BoardArgs) -> Result<()>
where
    T: CardLine,
    T::Id: FromStr,
    <T::Id as FromStr>::Err: Display,
    T::Status: FromStr,
    <T::Status as FromStr>::Err: Display,
{
    let controller = if args.columns.is_empty() {
        BoardController::<T>::new(remote)
    } else {
        let columns = args
            .columns
            .iter()
            .map(|raw| parse::<T::Status>(raw))
            .collect::<Result<Vec<_>>>()?;
        BoardController::<T>::with_columns(remote, columns)
    };
    let mut events = controller.subscribe();
    controller.load().await?;

    match args.action {
        BoardAction::Show => {}
        BoardAction::Move { id, to, index, over } => {
            let id = parse::<T::Id>(&id)?;
            let outcome = match (to, over) {
                (_, Some(over)) => {
                    let over = parse::<T::Id>(&over)?;
                    controller.drag_end(&id, Some(DropTarget::Item(over))).await?
                }
                (Some(to), None) => {
                    let status = parse::<T::Status>(&to)?;
                    controller.move_item(&id, status, index).await?
                }
                (None, None) => return Err(anyhow!("either --to or --over is required")),
            };
            report(outcome);
        }
        BoardAction::SetStatus { id, status } => {
            let id = parse::<T::Id>(&id)?;
            let status = parse::<T::Status>(&status)?;
            report(controller.set_status(&id, status).await?);
        }
        BoardAction::Bulk { status, ids } => {
            let status = parse::<T::Status>(&status)?;
            let ids = ids
                .iter()
                .map(|raw| parse::<T::Id>(raw))
                .collect::<Result<Vec<_>>>()?;
            let outcome = controller.bulk_set_status(&ids, status).await;
            debug!(updated = outcome.updated, failed = outcome.failed, "bulk change finished");
        }
    }

    print_events(&mut events);
    print!("{}", render_board(&controller.partition().await));
    Ok(())
}

fn parse<V>(raw: &str) -> Result<V>
where
    V: FromStr,
    V::Err: Display,
{
    raw.parse::<V>().map_err(|err| anyhow!("{err}"))
}

fn report(outcome: MoveOutcome) {
    debug!(?outcome, "move finished");
    if outcome == MoveOutcome::Unchanged {
        println!("nothing to move");
    }
}

fn print_events<T: board::BoardItem>(events: &mut broadcast::Receiver<BoardEvent<T>>) {
    loop {
        match events.try_recv() {
            Ok(BoardEvent::Refreshed { .. }) => {}
            Ok(event) => println!("{}", event.message()),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
