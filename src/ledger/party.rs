//! Clients and the catalogs settlements and payments refer to.

use super::error::RecordError;
use serde::{Deserialize, Serialize};

pub type ClientId = u32;
pub type OriginId = u32;
pub type SupplierId = u32;
pub type BankId = u32;
pub type ItemId = u32;

const MAX_TAX_ID_LEN: usize = 20;

/// Trim a required text field and reject it when empty.
pub(crate) fn required(field: &'static str, value: String) -> Result<String, RecordError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RecordError::MissingField { field });
    }
    Ok(value.to_owned())
}

/// Empty optional text collapses to `None`.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Raw client record as parsed from CSV input.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientRecord {
    pub id: ClientId,
    pub name: String,
    pub tax_id: String,
    pub email: Option<String>,
    pub settlement_number: Option<String>,
}

/// A brokerage client. Owns settlements and, through them, payments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    id: ClientId,
    name: String,
    tax_id: String,
    email: Option<String>,
    settlement_number: Option<String>,
}

impl Client {
    pub fn new(id: ClientId, name: impl Into<String>, tax_id: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tax_id: tax_id.into(),
            email: None,
            settlement_number: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_settlement_number(mut self, settlement_number: impl Into<String>) -> Self {
        self.settlement_number = Some(settlement_number.into());
        self
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tax identification number (RUC)
    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn settlement_number(&self) -> Option<&str> {
        self.settlement_number.as_deref()
    }
}

impl TryFrom<ClientRecord> for Client {
    type Error = RecordError;

    fn try_from(record: ClientRecord) -> Result<Self, Self::Error> {
        let tax_id = required("tax_id", record.tax_id)?;
        if tax_id.chars().count() > MAX_TAX_ID_LEN {
            return Err(RecordError::FieldTooLong {
                field: "tax_id",
                len: tax_id.chars().count(),
                max: MAX_TAX_ID_LEN,
            });
        }
        Ok(Client {
            id: record.id,
            name: required("name", record.name)?,
            tax_id,
            email: optional(record.email),
            settlement_number: optional(record.settlement_number),
        })
    }
}

/// Country (or region) a supplier ships from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Origin {
    id: OriginId,
    name: String,
}

impl Origin {
    pub fn new(id: OriginId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> OriginId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Raw origin record as parsed from CSV input.
#[derive(Debug, Deserialize, Clone)]
pub struct OriginRecord {
    pub id: OriginId,
    pub name: String,
}

impl TryFrom<OriginRecord> for Origin {
    type Error = RecordError;

    fn try_from(record: OriginRecord) -> Result<Self, Self::Error> {
        Ok(Origin::new(record.id, required("name", record.name)?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Supplier {
    id: SupplierId,
    name: String,
    origin_id: Option<OriginId>,
}

impl Supplier {
    pub fn new(id: SupplierId, name: impl Into<String>, origin_id: Option<OriginId>) -> Self {
        Self {
            id,
            name: name.into(),
            origin_id,
        }
    }

    pub fn id(&self) -> SupplierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin_id(&self) -> Option<OriginId> {
        self.origin_id
    }
}

/// Raw supplier record as parsed from CSV input.
#[derive(Debug, Deserialize, Clone)]
pub struct SupplierRecord {
    pub id: SupplierId,
    pub name: String,
    pub origin: Option<OriginId>,
}

impl TryFrom<SupplierRecord> for Supplier {
    type Error = RecordError;

    fn try_from(record: SupplierRecord) -> Result<Self, Self::Error> {
        Ok(Supplier::new(
            record.id,
            required("name", record.name)?,
            record.origin,
        ))
    }
}

/// A bank account payments are received through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bank {
    id: BankId,
    name: String,
    holder: String,
    account_number: String,
}

impl Bank {
    pub fn new(
        id: BankId,
        name: impl Into<String>,
        holder: impl Into<String>,
        account_number: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            holder: holder.into(),
            account_number: account_number.into(),
        }
    }

    pub fn id(&self) -> BankId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    /// Short code shown in statements: first three characters of the name, upper-cased.
    pub fn code(&self) -> String {
        self.name.chars().take(3).collect::<String>().to_uppercase()
    }
}

/// Raw bank record as parsed from CSV input.
#[derive(Debug, Deserialize, Clone)]
pub struct BankRecord {
    pub id: BankId,
    pub name: String,
    pub holder: String,
    pub account_number: String,
}

impl TryFrom<BankRecord> for Bank {
    type Error = RecordError;

    fn try_from(record: BankRecord) -> Result<Self, Self::Error> {
        Ok(Bank::new(
            record.id,
            required("name", record.name)?,
            required("holder", record.holder)?,
            required("account_number", record.account_number)?,
        ))
    }
}

/// Catalog entry describing a kind of charge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    id: ItemId,
    description: String,
}

impl Item {
    pub fn new(id: ItemId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Raw item record as parsed from CSV input.
#[derive(Debug, Deserialize, Clone)]
pub struct ItemRecord {
    pub id: ItemId,
    pub description: String,
}

impl TryFrom<ItemRecord> for Item {
    type Error = RecordError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        Ok(Item::new(record.id, required("description", record.description)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_record(tax_id: &str) -> ClientRecord {
        ClientRecord {
            id: 1,
            name: "Juan Pérez".to_owned(),
            tax_id: tax_id.to_owned(),
            email: Some(String::new()),
            settlement_number: None,
        }
    }

    #[test]
    fn test_valid_client() {
        let client = Client::try_from(client_record("12345678")).unwrap();
        assert_eq!(client.name(), "Juan Pérez");
        assert_eq!(client.tax_id(), "12345678");
        // empty email is treated as absent
        assert_eq!(client.email(), None);
    }

    #[test]
    fn test_rejects_empty_tax_id() {
        assert!(matches!(
            Client::try_from(client_record("  ")),
            Err(RecordError::MissingField { field: "tax_id" })
        ));
    }

    #[test]
    fn test_rejects_long_tax_id() {
        assert!(matches!(
            Client::try_from(client_record("123456789012345678901")),
            Err(RecordError::FieldTooLong { max: 20, .. })
        ));
    }

    #[test]
    fn test_client_builders() {
        let client = Client::new(3, "Ana Benítez", "4455667")
            .with_email("ana@example.com")
            .with_settlement_number("LIQ-2024-001");
        assert_eq!(client.email(), Some("ana@example.com"));
        assert_eq!(client.settlement_number(), Some("LIQ-2024-001"));

        let bare = Client::new(4, "Pedro Ruiz", "7788990");
        assert_eq!(bare.settlement_number(), None);
    }

    #[test]
    fn test_bank_code_is_first_three_letters_uppercased() {
        assert_eq!(Bank::new(1, "Itaú", "ACME", "001").code(), "ITA");
        assert_eq!(Bank::new(2, "ueno", "ACME", "002").code(), "UEN");
        assert_eq!(Bank::new(3, "BB", "ACME", "003").code(), "BB");
    }

    #[test]
    fn test_supplier_without_origin() {
        let supplier = Supplier::try_from(SupplierRecord {
            id: 7,
            name: "Comercial Paraguay".to_owned(),
            origin: None,
        })
        .unwrap();
        assert_eq!(supplier.origin_id(), None);
    }
}
