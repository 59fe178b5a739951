mod commands;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use commands::{Args, Command, Parser};
use customs_ledger::{CustomsLedger, Error, ImportSummary};

type Importer = fn(&mut CustomsLedger, File) -> Result<ImportSummary, Error>;

/// Tables in dependency order: every file only references tables loaded before it.
const TABLES: [(&str, Importer); 8] = [
    ("clients.csv", CustomsLedger::import_clients),
    ("origins.csv", CustomsLedger::import_origins),
    ("suppliers.csv", CustomsLedger::import_suppliers),
    ("banks.csv", CustomsLedger::import_banks),
    ("items.csv", CustomsLedger::import_items),
    ("settlements.csv", CustomsLedger::import_settlements),
    ("line_items.csv", CustomsLedger::import_line_items),
    ("payments.csv", CustomsLedger::import_payments),
];

fn main() -> Result<()> {
    // Parse the CLI arguments
    let args = Args::parse();

    // Initialize logger with default level of info (can be overridden with RUST_LOG)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1. Load every table from the data directory
    let ledger = load(&args.data_dir)?;

    // 2. Run the requested report against stdout
    let stdout = std::io::stdout();
    match args.command {
        Command::Statement {
            client_id,
            totals,
            table,
        } => {
            let result = if totals {
                ledger.export_totals(client_id, stdout.lock())
            } else if table {
                ledger
                    .statement(client_id)
                    .map_err(Error::from)
                    .and_then(|statement| {
                        writeln!(stdout.lock(), "{statement}")?;
                        Ok(statement)
                    })
            } else {
                ledger.export_statement(client_id, stdout.lock())
            };
            let statement = result
                .with_context(|| format!("Failed to build statement for client {client_id}"))?;

            log::info!(
                "Client {client_id}: debit={} credit={} balance={}",
                statement.total_debit(),
                statement.total_credit(),
                statement.net_balance()
            );
        }
        Command::Settlements { search } => {
            let written = ledger
                .export_settlements(&search, stdout.lock())
                .context("Failed to export settlements to stdout")?;
            log::info!("{written} settlements listed");
        }
        Command::Payments { search } => {
            let written = ledger
                .export_payments(&search, stdout.lock())
                .context("Failed to export payments to stdout")?;
            log::info!("{written} payments listed");
        }
        Command::Items { search } => {
            let written = ledger
                .export_items(&search, stdout.lock())
                .context("Failed to export items to stdout")?;
            log::info!("{written} items listed");
        }
        Command::Stats => {
            let mut csv_writer = csv::Writer::from_writer(stdout.lock());
            csv_writer
                .serialize(ledger.stats())
                .context("Failed to write stats")?;
            csv_writer.flush().context("Failed to flush stats")?;
        }
    }

    Ok(())
}

fn load(data_dir: &Path) -> Result<CustomsLedger> {
    log::info!("Loading ledger from {}", data_dir.display());
    let mut ledger = CustomsLedger::new();

    for (name, import) in TABLES {
        let path = data_dir.join(name);
        if !path.exists() {
            log::debug!("{} not found, treating as empty", path.display());
            continue;
        }
        let file = File::open(&path)
            .with_context(|| format!("Failed to open input file: {}", path.display()))?;
        let summary = import(&mut ledger, file)
            .with_context(|| format!("Failed to import {}", path.display()))?;
        if summary.skipped > 0 {
            log::warn!("{}: {} rows skipped", path.display(), summary.skipped);
        }
    }

    log::info!("Loaded {:?}", ledger.stats());
    Ok(ledger)
}
