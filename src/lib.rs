//! Bookkeeping for a customs brokerage: settlements, payments and client account statements.

mod ledger;

pub use ledger::{
    build_statement, format_currency, format_guaranies, format_integer, AccountStatement, Bank,
    BankId, Client, ClientId, Currency, CustomsLedger, EntryKind, EntrySource, Error,
    ImportSummary, IntegrityError, Item, ItemId, LedgerStats, LineItem, LineItemId,
    LoadedPayment, LoadedSettlement, Origin, OriginId, Payment, PaymentId, RecordError,
    Settlement, SettlementClass, SettlementId, StatementEntry, StatementSource, Supplier,
    SupplierId,
};
