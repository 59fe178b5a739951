use chrono::NaiveDate;
use serde::Deserialize;

use super::error::RecordError;
use super::money::validate_amount;
use super::party::{optional, BankId};
use super::settlement::SettlementId;
use super::Decimal;

pub type PaymentId = u32;

/// A payment applied against a settlement.
///
/// The paying client is the settlement's client.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    id: PaymentId,
    settlement_id: SettlementId,
    bank_id: BankId,
    date: NaiveDate,
    amount: Decimal,
    reference: Option<String>,
    memo: Option<String>,
}

impl Payment {
    pub fn new(
        id: PaymentId,
        settlement_id: SettlementId,
        bank_id: BankId,
        date: NaiveDate,
        amount: Decimal,
    ) -> Self {
        Self {
            id,
            settlement_id,
            bank_id,
            date,
            amount,
            reference: None,
            memo: None,
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn settlement_id(&self) -> SettlementId {
        self.settlement_id
    }

    pub fn bank_id(&self) -> BankId {
        self.bank_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Free-text reference (transfer or cheque number)
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref().filter(|r| !r.is_empty())
    }

    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }
}

/// Raw payment record as parsed from CSV input.
#[derive(Debug, Deserialize, Clone)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub settlement: SettlementId,
    pub bank: BankId,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub memo: Option<String>,
}

impl TryFrom<PaymentRecord> for Payment {
    type Error = RecordError;

    fn try_from(record: PaymentRecord) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: record.id,
            settlement_id: record.settlement,
            bank_id: record.bank,
            date: record.date,
            amount: validate_amount("amount", record.amount)?,
            reference: optional(record.reference),
            memo: optional(record.memo),
        })
    }
}
