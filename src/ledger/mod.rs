//! Customs ledger module.
//!
//! This module contains the bookkeeping core including:
//! - `CustomsLedger` - The in-memory store, CSV import and reports
//! - `Settlement` / `LineItem` - Customs declarations and their charge lines
//! - `Payment` - Payments applied against settlements
//! - `AccountStatement` - Per-client ledger of debits, credits and running balance
//! - `Error` types - Record validation and referential integrity errors

mod customs_ledger;
mod error;
mod money;
mod party;
mod payment;
mod settlement;
mod statement;

pub(crate) use rust_decimal::Decimal;

pub use customs_ledger::{CustomsLedger, ImportSummary, LedgerStats};
pub use error::{Error, IntegrityError, RecordError};
pub use money::{format_currency, format_guaranies, format_integer};
pub use party::{
    Bank, BankId, Client, ClientId, Item, ItemId, Origin, OriginId, Supplier, SupplierId,
};
pub use payment::{Payment, PaymentId};
pub use settlement::{
    Currency, LineItem, LineItemId, Settlement, SettlementClass, SettlementId,
};
pub use statement::{
    build_statement, AccountStatement, EntryKind, EntrySource, LoadedPayment, LoadedSettlement,
    StatementEntry, StatementSource,
};
