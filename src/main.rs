//! Tombola lottery store inspector
//!
//! Reads the derived lottery state under a node's data directory: chain
//! head, per-block drawings, delegate production history. The store is
//! maintained by a node running `TombolaDb`; this tool only reads it.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tombola::store::StoreError;
use tombola::{Asset, BlockNum, DelegateId, Storage};
use tracing::error;

/// Tombola version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "tombola", version, about = "Tombola: lottery chain inspector")]
struct Args {
    /// Data directory holding the lottery store
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chain head and current jackpot pool
    Status,
    /// Drawing resolved at a block
    Draw {
        /// Block number the drawing resolved at
        block_num: BlockNum,
    },
    /// Production history of a delegate
    Delegate {
        /// Delegate identifier
        delegate_id: DelegateId,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tombola=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), StoreError> {
    let store = Storage::open(&args.data_dir)?;
    match args.command {
        Command::Status => status(&store),
        Command::Draw { block_num } => draw(&store, block_num),
        Command::Delegate { delegate_id } => delegate(&store, delegate_id),
    }
}

fn status(store: &Storage) -> Result<(), StoreError> {
    println!("════════════════════════════════════════════════════════════");
    println!("  Tombola v{} — Lottery Store", VERSION);
    println!("════════════════════════════════════════════════════════════");
    let Some(head) = store.head_block_num()? else {
        println!("Empty store");
        return Ok(());
    };
    println!("Chain head: #{}", head);
    if let Some(summary) = store.block_summary(head)? {
        println!("Winning number: {:#018x}", summary.winning_number);
        println!(
            "Head block: {} ticket sales, {} won",
            Asset::votes(summary.ticket_sales),
            Asset::votes(summary.amount_won)
        );
    }
    if let Some(record) = store.drawing_record(head)? {
        println!("Jackpot pool: {}", Asset::votes(record.jackpot_pool));
        println!(
            "Head draw: {} budget, {} paid",
            Asset::votes(record.total_jackpot),
            Asset::votes(record.total_paid)
        );
    }
    Ok(())
}

fn draw(store: &Storage, block_num: BlockNum) -> Result<(), StoreError> {
    let summary = store
        .block_summary(block_num)?
        .ok_or(StoreError::MissingSummary(block_num))?;
    let record = store
        .drawing_record(block_num)?
        .ok_or(StoreError::MissingDraw(block_num))?;
    println!("Drawing at block #{}", block_num);
    println!("  Winning number: {:#018x}", summary.winning_number);
    println!("  Ticket sales:   {}", Asset::votes(summary.ticket_sales));
    println!("  Total jackpot:  {}", Asset::votes(record.total_jackpot));
    println!("  Total paid:     {}", Asset::votes(record.total_paid));
    println!("  Pool after:     {}", Asset::votes(record.jackpot_pool));
    Ok(())
}

fn delegate(store: &Storage, delegate_id: DelegateId) -> Result<(), StoreError> {
    let blocks = store.delegate_blocks(delegate_id)?;
    if blocks.is_empty() {
        println!("Delegate {} has produced no blocks", delegate_id);
        return Ok(());
    }
    println!("Delegate {} produced {} blocks", delegate_id, blocks.len());
    for num in blocks {
        match store.block_summary(num)? {
            Some(summary) => println!("  #{} winning {:#018x}", num, summary.winning_number),
            None => println!("  #{}", num),
        }
    }
    Ok(())
}
