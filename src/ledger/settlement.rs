use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::RecordError;
use super::money::validate_amount;
use super::party::{optional, required, ClientId, ItemId, SupplierId};
use super::Decimal;

pub type SettlementId = u32;
pub type LineItemId = u32;

/// Direction of the goods covered by a customs declaration.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementClass {
    #[serde(alias = "importacion")]
    Import,
    #[serde(alias = "exportacion")]
    Export,
}

impl std::fmt::Display for SettlementClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementClass::Import => write!(f, "import"),
            SettlementClass::Export => write!(f, "export"),
        }
    }
}

/// Currency the taxable value is declared in. `Pyg` is the local currency.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    #[serde(alias = "EURO")]
    Eur,
    #[serde(alias = "GUARANIES")]
    Pyg,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Eur => write!(f, "EUR"),
            Currency::Pyg => write!(f, "PYG"),
        }
    }
}

/// One charge line of a settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    id: LineItemId,
    settlement_id: SettlementId,
    item_id: ItemId,
    amount: Decimal,
    tax: Decimal,
    withholding: Decimal,
}

impl LineItem {
    pub fn new(
        id: LineItemId,
        settlement_id: SettlementId,
        item_id: ItemId,
        amount: Decimal,
        tax: Decimal,
        withholding: Decimal,
    ) -> Self {
        Self {
            id,
            settlement_id,
            item_id,
            amount,
            tax,
            withholding,
        }
    }

    pub fn id(&self) -> LineItemId {
        self.id
    }

    pub fn settlement_id(&self) -> SettlementId {
        self.settlement_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn tax(&self) -> Decimal {
        self.tax
    }

    pub fn withholding(&self) -> Decimal {
        self.withholding
    }

    /// `amount + tax + withholding`. Withholding is added, not deducted.
    pub fn subtotal(&self) -> Decimal {
        self.amount + self.tax + self.withholding
    }
}

/// Raw line item record as parsed from CSV input. Missing amounts default to zero.
#[derive(Debug, Deserialize, Clone)]
pub struct LineItemRecord {
    pub id: LineItemId,
    pub settlement: SettlementId,
    pub item: ItemId,
    pub amount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub withholding: Option<Decimal>,
}

impl TryFrom<LineItemRecord> for LineItem {
    type Error = RecordError;

    fn try_from(record: LineItemRecord) -> Result<Self, Self::Error> {
        let amount = validate_amount("amount", record.amount.unwrap_or_default())?;
        let tax = validate_amount("tax", record.tax.unwrap_or_default())?;
        let withholding = validate_amount("withholding", record.withholding.unwrap_or_default())?;
        Ok(LineItem::new(
            record.id,
            record.settlement,
            record.item,
            amount,
            tax,
            withholding,
        ))
    }
}

/// A customs declaration and the charge lines billed for it.
///
/// Totals are always derived from the current line items, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    id: SettlementId,
    date: NaiveDate,
    client_id: ClientId,
    settlement_number: String,
    declaration_number: String,
    class: SettlementClass,
    invoice_number: String,
    tariff_heading: String,
    purchase_order: String,
    taxable_value: Decimal,
    taxable_currency: Currency,
    local_equivalent: Decimal,
    exchange_rate: String,
    supplier_id: SupplierId,
    line_items: Vec<LineItem>,
}

impl Settlement {
    /// Create a settlement with no line items and empty descriptive fields.
    pub fn new(
        id: SettlementId,
        date: NaiveDate,
        client_id: ClientId,
        supplier_id: SupplierId,
        declaration_number: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date,
            client_id,
            settlement_number: String::new(),
            declaration_number: declaration_number.into(),
            class: SettlementClass::Import,
            invoice_number: String::new(),
            tariff_heading: String::new(),
            purchase_order: String::new(),
            taxable_value: Decimal::ZERO,
            taxable_currency: Currency::Usd,
            local_equivalent: Decimal::ZERO,
            exchange_rate: String::new(),
            supplier_id,
            line_items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_invoice_number(mut self, invoice_number: impl Into<String>) -> Self {
        self.invoice_number = invoice_number.into();
        self
    }

    #[must_use]
    pub fn with_settlement_number(mut self, settlement_number: impl Into<String>) -> Self {
        self.settlement_number = settlement_number.into();
        self
    }

    #[must_use]
    pub fn with_purchase_order(mut self, purchase_order: impl Into<String>) -> Self {
        self.purchase_order = purchase_order.into();
        self
    }

    pub fn id(&self) -> SettlementId {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn settlement_number(&self) -> &str {
        &self.settlement_number
    }

    /// Customs declaration ("despacho") number
    pub fn declaration_number(&self) -> &str {
        &self.declaration_number
    }

    pub fn class(&self) -> SettlementClass {
        self.class
    }

    /// Commercial invoice number
    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn tariff_heading(&self) -> &str {
        &self.tariff_heading
    }

    /// Purchase-order reference, stored in the ad valorem column of the declaration.
    pub fn purchase_order(&self) -> &str {
        &self.purchase_order
    }

    pub fn taxable_value(&self) -> Decimal {
        self.taxable_value
    }

    pub fn taxable_currency(&self) -> Currency {
        self.taxable_currency
    }

    /// Taxable value converted to local currency
    pub fn local_equivalent(&self) -> Decimal {
        self.local_equivalent
    }

    pub fn exchange_rate(&self) -> &str {
        &self.exchange_rate
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Sum of line item amounts
    pub fn total_amount(&self) -> Decimal {
        self.line_items.iter().map(LineItem::amount).sum()
    }

    /// Sum of line item taxes
    pub fn total_tax(&self) -> Decimal {
        self.line_items.iter().map(LineItem::tax).sum()
    }

    /// Sum of line item withholdings
    pub fn total_withholding(&self) -> Decimal {
        self.line_items.iter().map(LineItem::withholding).sum()
    }

    /// Sum of line item subtotals. This is the amount debited to the client.
    pub fn computed_total(&self) -> Decimal {
        self.line_items.iter().map(LineItem::subtotal).sum()
    }

    pub(super) fn push_line_item(&mut self, line_item: LineItem) {
        self.line_items.push(line_item);
    }

    pub(super) fn take_line_item(&mut self, id: LineItemId) -> Option<LineItem> {
        let index = self.line_items.iter().position(|li| li.id == id)?;
        Some(self.line_items.remove(index))
    }

    /// Drop every line item referencing `item_id`, returning how many were removed.
    pub(super) fn drop_item_lines(&mut self, item_id: ItemId) -> usize {
        let before = self.line_items.len();
        self.line_items.retain(|li| li.item_id != item_id);
        before - self.line_items.len()
    }
}

/// Raw settlement record as parsed from CSV input.
#[derive(Debug, Deserialize, Clone)]
pub struct SettlementRecord {
    pub id: SettlementId,
    pub date: NaiveDate,
    pub client: ClientId,
    pub settlement_number: String,
    pub declaration_number: String,
    pub class: SettlementClass,
    pub invoice_number: String,
    pub tariff_heading: String,
    pub purchase_order: Option<String>,
    pub taxable_value: Decimal,
    pub currency: Currency,
    pub local_equivalent: Decimal,
    pub exchange_rate: String,
    pub supplier: SupplierId,
}

impl TryFrom<SettlementRecord> for Settlement {
    type Error = RecordError;

    fn try_from(record: SettlementRecord) -> Result<Self, Self::Error> {
        Ok(Settlement {
            id: record.id,
            date: record.date,
            client_id: record.client,
            settlement_number: required("settlement_number", record.settlement_number)?,
            declaration_number: required("declaration_number", record.declaration_number)?,
            class: record.class,
            invoice_number: required("invoice_number", record.invoice_number)?,
            tariff_heading: required("tariff_heading", record.tariff_heading)?,
            purchase_order: optional(record.purchase_order).unwrap_or_default(),
            taxable_value: validate_amount("taxable_value", record.taxable_value)?,
            taxable_currency: record.currency,
            local_equivalent: validate_amount("local_equivalent", record.local_equivalent)?,
            exchange_rate: required("exchange_rate", record.exchange_rate)?,
            supplier_id: record.supplier,
            line_items: Vec::new(),
        })
    }
}
