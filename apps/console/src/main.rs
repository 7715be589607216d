use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use url::Url;
use uuid::Uuid;

use board_core::{ConfirmForm, DropOutcome, HttpOrdersBackend, OrderBoard};
use shared::domain::{Order, OrderId};

mod config;

#[derive(Parser, Debug)]
#[command(name = "orderboard", about = "Supplier order status board")]
struct Args {
    /// Base URL of the hosted orders backend.
    #[arg(long)]
    server_url: Option<String>,
    /// Sqlite URL or file path for the local archive database.
    #[arg(long)]
    database_url: Option<String>,
    /// Scope identifier for the local archive set.
    #[arg(long)]
    scope: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the four status columns.
    Buckets,
    /// Print one order in full: items, comments, attachments, history.
    Show { order_id: Uuid },
    /// Move an order between columns.
    Move {
        order_id: Uuid,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Confirm a pending order with a delivery date.
    Confirm {
        order_id: Uuid,
        /// Accept the delivery date the customer requested.
        #[arg(long)]
        accept_requested_date: bool,
        /// Propose an alternative delivery date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Toggle the local archive flag for an order.
    Archive { order_id: Uuid },
    /// Add a comment to an order.
    Comment { order_id: Uuid, text: String },
    /// Attach an uploaded document to an order.
    Attach {
        order_id: Uuid,
        file_name: String,
        file_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(database_url) = args.database_url {
        settings.database_url = database_url;
    }
    if let Some(scope) = args.scope {
        settings.archive_scope = scope;
    }

    let server_url = Url::parse(&settings.server_url)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    let database_url = config::normalize_database_url(&settings.database_url);
    let archive = storage::Storage::new(&database_url)
        .await
        .with_context(|| format!("failed to open local database '{database_url}'"))?;

    let board = OrderBoard::new(
        Arc::new(HttpOrdersBackend::new(&server_url)),
        Arc::new(archive),
        settings.archive_scope.clone(),
    );
    board.load().await?;
    tracing::info!(scope = %board.scope(), "board loaded");

    match args.command {
        Command::Buckets => {
            print_buckets(&board).await;
        }
        Command::Show { order_id } => {
            let order = board
                .order(OrderId(order_id))
                .await
                .with_context(|| format!("no order {order_id} on the board"))?;
            print_order_detail(&order, board.is_archived(order.order_id).await);
        }
        Command::Move {
            order_id,
            from,
            to,
        } => {
            let outcome = board.handle_drop(OrderId(order_id), &from, &to).await?;
            match outcome {
                DropOutcome::NoOp => println!("Already in '{to}'; nothing to do."),
                DropOutcome::Ignored => println!("'{to}' is not a board column; ignored."),
                DropOutcome::ConfirmationRequired => {
                    println!("Order is pending: confirm it with a delivery date first (`orderboard confirm`).");
                }
                DropOutcome::Applied(status) => println!("Order moved; status is now '{status}'."),
                DropOutcome::RolledBack(status) => {
                    println!("Backend rejected the move; status restored to '{status}'.");
                }
                DropOutcome::Busy => {
                    println!("A previous move for this order is still in flight; try again.");
                }
            }
            print_buckets(&board).await;
        }
        Command::Confirm {
            order_id,
            accept_requested_date,
            date,
            notes,
        } => {
            let form = ConfirmForm {
                accept_requested_date,
                alternative_date: date,
                notes,
            };
            board.confirm(OrderId(order_id), &form).await?;
            println!("Order confirmed.");
            print_buckets(&board).await;
        }
        Command::Archive { order_id } => {
            let archived = board.toggle_archive(OrderId(order_id)).await?;
            if archived {
                println!("Order archived locally; it will no longer appear on the board.");
            } else {
                println!("Order unarchived; it is visible on the board again.");
            }
        }
        Command::Comment { order_id, text } => {
            let comment = board
                .add_comment(OrderId(order_id), &text, &settings.author_name)
                .await?;
            println!(
                "Comment added by {} at {}.",
                comment.author_name, comment.created_at
            );
        }
        Command::Attach {
            order_id,
            file_name,
            file_url,
        } => {
            let attachment = board
                .add_attachment(OrderId(order_id), &file_name, &file_url)
                .await?;
            println!("Attachment '{}' linked.", attachment.file_name);
        }
    }

    Ok(())
}

async fn print_buckets(board: &OrderBoard) {
    for (key, orders) in board.buckets().await {
        println!("== {key} ({})", orders.len());
        for order in orders {
            println!("  {}", format_order_line(&order));
        }
    }
}

fn print_order_detail(order: &Order, archived: bool) {
    println!("{}", format_order_line(order));
    if archived {
        println!("  locally archived");
    }
    if let Some(date) = order.confirmed_delivery_date {
        println!("  confirmed delivery: {date}");
    }
    if !order.items.is_empty() {
        println!("  items:");
        for item in &order.items {
            let unit = item.unit.as_deref().unwrap_or("pcs");
            println!("    {} x{} {}", item.material_code, item.quantity, unit);
        }
    }
    if !order.comments.is_empty() {
        println!("  comments:");
        for comment in &order.comments {
            println!("    [{}] {}: {}", comment.created_at, comment.author_name, comment.text);
        }
    }
    if !order.attachments.is_empty() {
        println!("  attachments:");
        for attachment in &order.attachments {
            println!("    {} -> {}", attachment.file_name, attachment.file_url);
        }
    }
    if !order.status_updates.is_empty() {
        println!("  history:");
        for update in &order.status_updates {
            let notes = update.notes.as_deref().unwrap_or("");
            println!("    [{}] {} {}", update.created_at, update.status, notes);
        }
    }
}

fn format_order_line(order: &Order) -> String {
    let mut line = format!("{}  [{}]", order.order_number, order.production_status);
    if let Some(priority) = &order.priority {
        line.push_str(&format!("  priority={priority:?}"));
    }
    if let Some(date) = order.expected_delivery_date {
        line.push_str(&format!("  due={date}"));
    }
    line.push_str(&format!("  ({})", order.order_id));
    line
}
