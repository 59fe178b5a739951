use std::fmt;
use std::io::Write;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::error::{Error, IntegrityError};
use super::money::{format_integer, serialize_decimal_2dp};
use super::party::{Bank, ClientId, Origin};
use super::payment::{Payment, PaymentId};
use super::settlement::{Settlement, SettlementId};
use super::Decimal;

/// A settlement together with the supplier origin shown on its statement line.
#[derive(Debug, Clone, Copy)]
pub struct LoadedSettlement<'a> {
    pub settlement: &'a Settlement,
    pub origin: Option<&'a Origin>,
}

/// A payment together with the settlement it pays and the bank it went through.
#[derive(Debug, Clone, Copy)]
pub struct LoadedPayment<'a> {
    pub payment: &'a Payment,
    pub settlement: &'a Settlement,
    pub bank: &'a Bank,
}

/// Read access the statement builder needs from persistence.
pub trait StatementSource {
    /// All settlements of `client_id`, with line items, in date order.
    fn fetch_settlements_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<LoadedSettlement<'_>>, IntegrityError>;

    /// All payments whose settlement belongs to `client_id`, in date order.
    fn fetch_payments_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<LoadedPayment<'_>>, IntegrityError>;
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Settlement,
    Payment,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Settlement => write!(f, "settlement"),
            EntryKind::Payment => write!(f, "payment"),
        }
    }
}

/// Record a statement line was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    Settlement(SettlementId),
    Payment(PaymentId),
}

impl EntrySource {
    pub fn id(&self) -> u32 {
        match *self {
            EntrySource::Settlement(id) | EntrySource::Payment(id) => id,
        }
    }
}

fn serialize_source_id<S: Serializer>(
    source: &EntrySource,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u32(source.id())
}

/// One line of an account statement.
///
/// Settlements are debits, payments are credits. `balance` is the running
/// `credit - debit` up to and including this line.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatementEntry {
    date: NaiveDate,
    kind: EntryKind,
    invoice: String,
    origin: String,
    declaration: String,
    purchase_order: String,
    bank: String,
    reference: String,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    debit: Decimal,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    credit: Decimal,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    balance: Decimal,
    #[serde(rename = "record", serialize_with = "serialize_source_id")]
    source: EntrySource,
}

impl StatementEntry {
    fn from_settlement(loaded: &LoadedSettlement<'_>) -> Self {
        let settlement = loaded.settlement;
        Self {
            date: settlement.date(),
            kind: EntryKind::Settlement,
            invoice: settlement.invoice_number().to_owned(),
            origin: loaded
                .origin
                .map(|origin| origin.name().to_owned())
                .unwrap_or_default(),
            declaration: settlement.declaration_number().to_owned(),
            purchase_order: settlement.purchase_order().to_owned(),
            bank: String::new(),
            reference: short_date(settlement.date()),
            debit: settlement.computed_total(),
            credit: Decimal::ZERO,
            balance: Decimal::ZERO,
            source: EntrySource::Settlement(settlement.id()),
        }
    }

    fn from_payment(loaded: &LoadedPayment<'_>) -> Self {
        let payment = loaded.payment;
        Self {
            date: payment.date(),
            kind: EntryKind::Payment,
            invoice: String::new(),
            origin: String::new(),
            declaration: loaded.settlement.declaration_number().to_owned(),
            purchase_order: String::new(),
            bank: loaded.bank.code(),
            reference: payment
                .reference()
                .map_or_else(|| short_date(payment.date()), str::to_owned),
            debit: Decimal::ZERO,
            credit: payment.amount(),
            balance: Decimal::ZERO,
            source: EntrySource::Payment(payment.id()),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Commercial invoice number (settlements only)
    pub fn invoice(&self) -> &str {
        &self.invoice
    }

    /// Supplier origin name (settlements only)
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    pub fn purchase_order(&self) -> &str {
        &self.purchase_order
    }

    /// Bank code (payments only)
    pub fn bank(&self) -> &str {
        &self.bank
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn debit(&self) -> Decimal {
        self.debit
    }

    pub fn credit(&self) -> Decimal {
        self.credit
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn source(&self) -> EntrySource {
        self.source
    }
}

/// `YYMMDD`, used as the reference of lines without one of their own.
fn short_date(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// A client's chronological ledger with running balance and grand totals.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountStatement {
    client_id: ClientId,
    entries: Vec<StatementEntry>,
    total_debit: Decimal,
    total_credit: Decimal,
}

impl AccountStatement {
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn entries(&self) -> &[StatementEntry] {
        &self.entries
    }

    /// Sum of all settlement totals
    pub fn total_debit(&self) -> Decimal {
        self.total_debit
    }

    /// Sum of all payment amounts
    pub fn total_credit(&self) -> Decimal {
        self.total_credit
    }

    /// `total_credit - total_debit`. Negative means the client owes money.
    pub fn net_balance(&self) -> Decimal {
        self.total_credit - self.total_debit
    }

    /// Write the statement lines as CSV to any sink.
    /// The CSV writer is buffered automatically, so don't wrap `writer` in an `io::BufWriter`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for entry in &self.entries {
            csv_writer.serialize(entry)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write a single CSV row with the grand totals.
    pub fn write_totals_csv<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.serialize(StatementTotals {
            client: self.client_id,
            total_debit: self.total_debit,
            total_credit: self.total_credit,
            net_balance: self.net_balance(),
        })?;
        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct StatementTotals {
    client: ClientId,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    total_debit: Decimal,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    total_credit: Decimal,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    net_balance: Decimal,
}

/// Build the account statement of `client_id`.
///
/// Settlement lines are emitted first, then payment lines, and the whole list
/// is stable-sorted by date alone, so same-day lines keep that emission order.
pub fn build_statement<S>(
    source: &S,
    client_id: ClientId,
) -> Result<AccountStatement, IntegrityError>
where
    S: StatementSource + ?Sized,
{
    let settlements = source.fetch_settlements_for_client(client_id)?;
    let payments = source.fetch_payments_for_client(client_id)?;

    let mut entries = Vec::with_capacity(settlements.len() + payments.len());
    for loaded in &settlements {
        ensure_owned_by(loaded.settlement, client_id)?;
        entries.push(StatementEntry::from_settlement(loaded));
    }
    for loaded in &payments {
        ensure_owned_by(loaded.settlement, client_id)?;
        entries.push(StatementEntry::from_payment(loaded));
    }

    entries.sort_by_key(StatementEntry::date);

    let mut balance = Decimal::ZERO;
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;
    for entry in &mut entries {
        total_debit += entry.debit;
        total_credit += entry.credit;
        balance += entry.credit - entry.debit;
        entry.balance = balance;
    }

    log::trace!(
        "Statement for client {client_id}: {} entries, debit={total_debit} credit={total_credit}",
        entries.len()
    );

    Ok(AccountStatement {
        client_id,
        entries,
        total_debit,
        total_credit,
    })
}

fn ensure_owned_by(settlement: &Settlement, client_id: ClientId) -> Result<(), IntegrityError> {
    if settlement.client_id() == client_id {
        Ok(())
    } else {
        Err(IntegrityError::ClientMismatch {
            settlement: settlement.id(),
            expected: settlement.client_id(),
            got: client_id,
        })
    }
}

impl fmt::Display for AccountStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10}  {:<10}  {:<12}  {:<12}  {:<16}  {:<10}  {:<4}  {:<12}  {:>14}  {:>14}  {:>14}",
            "date",
            "type",
            "invoice",
            "origin",
            "declaration",
            "po",
            "bank",
            "reference",
            "debit",
            "credit",
            "balance"
        )?;
        for entry in &self.entries {
            writeln!(
                f,
                "{:<10}  {:<10}  {:<12}  {:<12}  {:<16}  {:<10}  {:<4}  {:<12}  {:>14}  {:>14}  {:>14}",
                entry.date.format("%d/%m/%Y").to_string(),
                entry.kind.to_string(),
                entry.invoice,
                entry.origin,
                entry.declaration,
                entry.purchase_order,
                entry.bank,
                entry.reference,
                format_integer(entry.debit),
                format_integer(entry.credit),
                format_integer(entry.balance),
            )?;
        }
        write!(
            f,
            "{:<100}  {:>14}  {:>14}  {:>14}",
            "TOTAL",
            format_integer(self.total_debit),
            format_integer(self.total_credit),
            format_integer(self.net_balance()),
        )
    }
}
