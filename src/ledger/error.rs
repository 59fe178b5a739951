use crate::ledger::Decimal;

/// Top-level error type for the customs ledger.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Record error: {0}")]
    Record(#[from] RecordError),
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Errors while converting a raw CSV record into a validated entity (hard errors).
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid amount for {field}: {value} (at most 2 decimal places and 12 digits)")]
    InvalidAmount { field: &'static str, value: Decimal },

    #[error("Missing required field {field}")]
    MissingField { field: &'static str },

    #[error("Field {field} is too long: {len} characters, limit is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// Referential integrity errors.
/// During a bulk import these don't stop processing, we log and skip the record.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error("Client {client} not found")]
    ClientNotFound { client: u32 },

    #[error("Origin {origin} not found")]
    OriginNotFound { origin: u32 },

    #[error("Supplier {supplier} not found")]
    SupplierNotFound { supplier: u32 },

    #[error("Bank {bank} not found")]
    BankNotFound { bank: u32 },

    #[error("Item {item} not found")]
    ItemNotFound { item: u32 },

    #[error("Settlement {settlement} not found")]
    SettlementNotFound { settlement: u32 },

    #[error("Line item {line_item} not found")]
    LineItemNotFound { line_item: u32 },

    #[error("Payment {payment} not found")]
    PaymentNotFound { payment: u32 },

    #[error("Client mismatch: settlement {settlement} belongs to client {expected}, not {got}")]
    ClientMismatch {
        settlement: u32,
        expected: u32,
        got: u32,
    },

    #[error("Duplicate {entity} id {id}")]
    DuplicateId { entity: &'static str, id: u32 },

    #[error("Origin {origin} is still referenced by {suppliers} supplier(s)")]
    OriginInUse { origin: u32, suppliers: usize },
}
