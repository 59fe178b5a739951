pub(crate) use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "customs-ledger",
    author,
    version,
    about = "Settlements, payments and account statements for a customs brokerage",
    long_about = None,
    after_help = "DATA DIRECTORY:\n    clients.csv, origins.csv, suppliers.csv, banks.csv, items.csv,\n    settlements.csv, line_items.csv, payments.csv (missing files are treated as empty)\n\nOUTPUT:\n    Reports are printed to stdout. Logs go to stderr (set RUST_LOG to adjust).\n\n    customs-ledger data/ statement 1 > statement.csv"
)]
pub struct Args {
    /// Directory holding the CSV tables
    #[arg(index = 1, value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Account statement of one client (CSV lines by default)
    Statement {
        #[arg(value_name = "CLIENT_ID")]
        client_id: u32,

        /// Print only the grand totals
        #[arg(long, conflicts_with = "table")]
        totals: bool,

        /// Print a human-readable table instead of CSV
        #[arg(long)]
        table: bool,
    },
    /// Settlements with their totals, newest first
    Settlements {
        /// Filter by settlement number, client name or declaration number
        #[arg(long, short, default_value = "")]
        search: String,
    },
    /// Payments received, newest first
    Payments {
        /// Filter by declaration number, client name, bank name or reference
        #[arg(long, short, default_value = "")]
        search: String,
    },
    /// Catalog items, sorted by description
    Items {
        /// Filter by description
        #[arg(long, short, default_value = "")]
        search: String,
    },
    /// Record counts per table
    Stats,
}
