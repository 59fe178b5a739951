use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Debug;
use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{Error, IntegrityError, RecordError};
use super::money::serialize_decimal_2dp;
use super::party::{
    Bank, BankId, BankRecord, Client, ClientId, ClientRecord, Item, ItemId, ItemRecord, Origin,
    OriginId, OriginRecord, Supplier, SupplierId, SupplierRecord,
};
use super::payment::{Payment, PaymentId, PaymentRecord};
use super::settlement::{
    Currency, LineItem, LineItemId, LineItemRecord, Settlement, SettlementClass, SettlementId,
    SettlementRecord,
};
use super::statement::{
    build_statement, AccountStatement, LoadedPayment, LoadedSettlement, StatementSource,
};
use super::Decimal;

/// Outcome of one CSV import: rows stored and rows skipped for integrity reasons.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: u64,
    pub skipped: u64,
}

/// Record counts per table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub clients: usize,
    pub items: usize,
    pub settlements: usize,
    pub origins: usize,
    pub suppliers: usize,
    pub banks: usize,
    pub payments: usize,
}

/// The customs brokerage books.
///
/// Holds every client, catalog entry, settlement and payment, enforces
/// referential integrity on insert and applies cascade/protect rules on removal.
#[derive(Debug, Default)]
pub struct CustomsLedger {
    clients: BTreeMap<ClientId, Client>,
    origins: BTreeMap<OriginId, Origin>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    banks: BTreeMap<BankId, Bank>,
    items: BTreeMap<ItemId, Item>,
    settlements: BTreeMap<SettlementId, Settlement>,
    /// Maps line item ID to its owning settlement
    line_items: HashMap<LineItemId, SettlementId>,
    payments: BTreeMap<PaymentId, Payment>,
}

impl CustomsLedger {
    /// Create an empty `CustomsLedger`
    pub fn new() -> Self {
        log::trace!("CustomsLedger initialized");
        Self::default()
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn origin(&self, id: OriginId) -> Option<&Origin> {
        self.origins.get(&id)
    }

    pub fn supplier(&self, id: SupplierId) -> Option<&Supplier> {
        self.suppliers.get(&id)
    }

    pub fn bank(&self, id: BankId) -> Option<&Bank> {
        self.banks.get(&id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn settlement(&self, id: SettlementId) -> Option<&Settlement> {
        self.settlements.get(&id)
    }

    pub fn payment(&self, id: PaymentId) -> Option<&Payment> {
        self.payments.get(&id)
    }

    /// Number of records in each table
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            clients: self.clients.len(),
            items: self.items.len(),
            settlements: self.settlements.len(),
            origins: self.origins.len(),
            suppliers: self.suppliers.len(),
            banks: self.banks.len(),
            payments: self.payments.len(),
        }
    }

    /// Account statement of an existing client.
    pub fn statement(&self, client_id: ClientId) -> Result<AccountStatement, IntegrityError> {
        if !self.clients.contains_key(&client_id) {
            return Err(IntegrityError::ClientNotFound { client: client_id });
        }
        build_statement(self, client_id)
    }

    /// Settlements whose number, client name or declaration number contains
    /// `query` (case-insensitive), newest first. An empty query matches all.
    pub fn search_settlements(&self, query: &str) -> Vec<&Settlement> {
        let needle = query.trim().to_lowercase();
        let mut found: Vec<_> = self
            .settlements
            .values()
            .filter(|s| {
                needle.is_empty()
                    || s.settlement_number().to_lowercase().contains(&needle)
                    || s.declaration_number().to_lowercase().contains(&needle)
                    || self
                        .clients
                        .get(&s.client_id())
                        .is_some_and(|c| c.name().to_lowercase().contains(&needle))
            })
            .collect();
        found.sort_by(|a, b| b.date().cmp(&a.date()));
        found
    }

    /// Payments whose settlement declaration number, client name, bank name or
    /// reference contains `query` (case-insensitive), newest first.
    pub fn search_payments(&self, query: &str) -> Vec<&Payment> {
        let needle = query.trim().to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        let mut found: Vec<_> = self
            .payments
            .values()
            .filter(|p| {
                if needle.is_empty() || p.reference().is_some_and(contains) {
                    return true;
                }
                if self.banks.get(&p.bank_id()).is_some_and(|b| contains(b.name())) {
                    return true;
                }
                self.settlements.get(&p.settlement_id()).is_some_and(|s| {
                    contains(s.declaration_number())
                        || self
                            .clients
                            .get(&s.client_id())
                            .is_some_and(|c| contains(c.name()))
                })
            })
            .collect();
        found.sort_by(|a, b| b.date().cmp(&a.date()));
        found
    }

    /// Catalog items whose description contains `query` (case-insensitive),
    /// sorted by description.
    pub fn search_items(&self, query: &str) -> Vec<&Item> {
        let needle = query.trim().to_lowercase();
        let mut found: Vec<_> = self
            .items
            .values()
            .filter(|i| needle.is_empty() || i.description().to_lowercase().contains(&needle))
            .collect();
        found.sort_by(|a, b| a.description().cmp(b.description()));
        found
    }
}

// =============================================================================
// Inserts
// =============================================================================

impl CustomsLedger {
    pub fn insert_client(&mut self, client: Client) -> Result<(), IntegrityError> {
        let id = client.id();
        if self.clients.contains_key(&id) {
            return Err(IntegrityError::DuplicateId { entity: "client", id });
        }
        self.clients.insert(id, client);
        Ok(())
    }

    pub fn insert_origin(&mut self, origin: Origin) -> Result<(), IntegrityError> {
        let id = origin.id();
        if self.origins.contains_key(&id) {
            return Err(IntegrityError::DuplicateId { entity: "origin", id });
        }
        self.origins.insert(id, origin);
        Ok(())
    }

    pub fn insert_supplier(&mut self, supplier: Supplier) -> Result<(), IntegrityError> {
        let id = supplier.id();
        if self.suppliers.contains_key(&id) {
            return Err(IntegrityError::DuplicateId { entity: "supplier", id });
        }
        if let Some(origin) = supplier.origin_id() {
            if !self.origins.contains_key(&origin) {
                return Err(IntegrityError::OriginNotFound { origin });
            }
        }
        self.suppliers.insert(id, supplier);
        Ok(())
    }

    pub fn insert_bank(&mut self, bank: Bank) -> Result<(), IntegrityError> {
        let id = bank.id();
        if self.banks.contains_key(&id) {
            return Err(IntegrityError::DuplicateId { entity: "bank", id });
        }
        self.banks.insert(id, bank);
        Ok(())
    }

    pub fn insert_item(&mut self, item: Item) -> Result<(), IntegrityError> {
        let id = item.id();
        if self.items.contains_key(&id) {
            return Err(IntegrityError::DuplicateId { entity: "item", id });
        }
        self.items.insert(id, item);
        Ok(())
    }

    /// Store a settlement together with any line items it already carries.
    pub fn insert_settlement(&mut self, settlement: Settlement) -> Result<(), IntegrityError> {
        let id = settlement.id();
        if self.settlements.contains_key(&id) {
            return Err(IntegrityError::DuplicateId {
                entity: "settlement",
                id,
            });
        }
        if !self.clients.contains_key(&settlement.client_id()) {
            return Err(IntegrityError::ClientNotFound {
                client: settlement.client_id(),
            });
        }
        if !self.suppliers.contains_key(&settlement.supplier_id()) {
            return Err(IntegrityError::SupplierNotFound {
                supplier: settlement.supplier_id(),
            });
        }
        let mut carried = HashSet::new();
        for line_item in settlement.line_items() {
            if line_item.settlement_id() != id {
                return Err(IntegrityError::SettlementNotFound {
                    settlement: line_item.settlement_id(),
                });
            }
            if !carried.insert(line_item.id()) {
                return Err(IntegrityError::DuplicateId {
                    entity: "line item",
                    id: line_item.id(),
                });
            }
            self.check_line_item(line_item)?;
        }

        for line_item in settlement.line_items() {
            self.line_items.insert(line_item.id(), id);
        }
        self.settlements.insert(id, settlement);
        Ok(())
    }

    /// Attach a line item to its settlement.
    pub fn add_line_item(&mut self, line_item: LineItem) -> Result<(), IntegrityError> {
        self.check_line_item(&line_item)?;
        let settlement_id = line_item.settlement_id();
        let settlement = self
            .settlements
            .get_mut(&settlement_id)
            .ok_or(IntegrityError::SettlementNotFound {
                settlement: settlement_id,
            })?;

        self.line_items.insert(line_item.id(), settlement_id);
        settlement.push_line_item(line_item);

        log::trace!(
            "[line item] settlement={settlement_id} -> computed_total={}",
            settlement.computed_total()
        );
        Ok(())
    }

    pub fn insert_payment(&mut self, payment: Payment) -> Result<(), IntegrityError> {
        let id = payment.id();
        if self.payments.contains_key(&id) {
            return Err(IntegrityError::DuplicateId {
                entity: "payment",
                id,
            });
        }
        if !self.settlements.contains_key(&payment.settlement_id()) {
            return Err(IntegrityError::SettlementNotFound {
                settlement: payment.settlement_id(),
            });
        }
        if !self.banks.contains_key(&payment.bank_id()) {
            return Err(IntegrityError::BankNotFound {
                bank: payment.bank_id(),
            });
        }
        self.payments.insert(id, payment);
        Ok(())
    }

    fn check_line_item(&self, line_item: &LineItem) -> Result<(), IntegrityError> {
        if self.line_items.contains_key(&line_item.id()) {
            return Err(IntegrityError::DuplicateId {
                entity: "line item",
                id: line_item.id(),
            });
        }
        if !self.items.contains_key(&line_item.item_id()) {
            return Err(IntegrityError::ItemNotFound {
                item: line_item.item_id(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Removals (cascade / protect)
// =============================================================================

impl CustomsLedger {
    pub fn remove_payment(&mut self, id: PaymentId) -> Result<Payment, IntegrityError> {
        self.payments
            .remove(&id)
            .ok_or(IntegrityError::PaymentNotFound { payment: id })
    }

    pub fn remove_line_item(&mut self, id: LineItemId) -> Result<LineItem, IntegrityError> {
        let settlement_id = self
            .line_items
            .get(&id)
            .copied()
            .ok_or(IntegrityError::LineItemNotFound { line_item: id })?;
        let line_item = self
            .settlements
            .get_mut(&settlement_id)
            .and_then(|s| s.take_line_item(id))
            .ok_or(IntegrityError::LineItemNotFound { line_item: id })?;
        self.line_items.remove(&id);
        Ok(line_item)
    }

    /// Remove a settlement, its line items and every payment made against it.
    pub fn remove_settlement(&mut self, id: SettlementId) -> Result<Settlement, IntegrityError> {
        let settlement = self
            .settlements
            .remove(&id)
            .ok_or(IntegrityError::SettlementNotFound { settlement: id })?;

        for line_item in settlement.line_items() {
            self.line_items.remove(&line_item.id());
        }
        let before = self.payments.len();
        self.payments.retain(|_, p| p.settlement_id() != id);

        log::debug!(
            "[remove settlement] settlement={id} line_items={} payments={}",
            settlement.line_items().len(),
            before - self.payments.len()
        );
        Ok(settlement)
    }

    /// Remove a client and, transitively, its settlements and their payments.
    pub fn remove_client(&mut self, id: ClientId) -> Result<Client, IntegrityError> {
        let client = self
            .clients
            .remove(&id)
            .ok_or(IntegrityError::ClientNotFound { client: id })?;
        let owned = self.settlement_ids_where(|s| s.client_id() == id);
        log::debug!("[remove client] client={id} settlements={}", owned.len());
        for settlement_id in owned {
            self.remove_settlement(settlement_id)?;
        }
        Ok(client)
    }

    /// Remove a supplier and the settlements it supplied.
    pub fn remove_supplier(&mut self, id: SupplierId) -> Result<Supplier, IntegrityError> {
        let supplier = self
            .suppliers
            .remove(&id)
            .ok_or(IntegrityError::SupplierNotFound { supplier: id })?;
        let supplied = self.settlement_ids_where(|s| s.supplier_id() == id);
        log::debug!("[remove supplier] supplier={id} settlements={}", supplied.len());
        for settlement_id in supplied {
            self.remove_settlement(settlement_id)?;
        }
        Ok(supplier)
    }

    /// Remove an origin. Fails while any supplier still references it.
    pub fn remove_origin(&mut self, id: OriginId) -> Result<Origin, IntegrityError> {
        let suppliers = self
            .suppliers
            .values()
            .filter(|s| s.origin_id() == Some(id))
            .count();
        if suppliers > 0 {
            return Err(IntegrityError::OriginInUse {
                origin: id,
                suppliers,
            });
        }
        self.origins
            .remove(&id)
            .ok_or(IntegrityError::OriginNotFound { origin: id })
    }

    /// Remove a bank and every payment received through it.
    pub fn remove_bank(&mut self, id: BankId) -> Result<Bank, IntegrityError> {
        let bank = self
            .banks
            .remove(&id)
            .ok_or(IntegrityError::BankNotFound { bank: id })?;
        let before = self.payments.len();
        self.payments.retain(|_, p| p.bank_id() != id);
        log::debug!("[remove bank] bank={id} payments={}", before - self.payments.len());
        Ok(bank)
    }

    /// Remove a catalog item and every line item that uses it.
    pub fn remove_item(&mut self, id: ItemId) -> Result<Item, IntegrityError> {
        let item = self
            .items
            .remove(&id)
            .ok_or(IntegrityError::ItemNotFound { item: id })?;
        let mut dropped = 0;
        for settlement in self.settlements.values_mut() {
            dropped += settlement.drop_item_lines(id);
        }
        let settlements = &self.settlements;
        self.line_items.retain(|line_id, settlement_id| {
            settlements
                .get(settlement_id)
                .is_some_and(|s| s.line_items().iter().any(|li| li.id() == *line_id))
        });
        log::debug!("[remove item] item={id} line_items={dropped}");
        Ok(item)
    }

    fn settlement_ids_where(&self, predicate: impl Fn(&Settlement) -> bool) -> Vec<SettlementId> {
        self.settlements
            .values()
            .filter(|s| predicate(s))
            .map(Settlement::id)
            .collect()
    }
}

// =============================================================================
// Read collaborators for the statement builder
// =============================================================================

impl StatementSource for CustomsLedger {
    fn fetch_settlements_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<LoadedSettlement<'_>>, IntegrityError> {
        let mut loaded = Vec::new();
        for settlement in self.settlements.values().filter(|s| s.client_id() == client_id) {
            let supplier = self.suppliers.get(&settlement.supplier_id()).ok_or(
                IntegrityError::SupplierNotFound {
                    supplier: settlement.supplier_id(),
                },
            )?;
            let origin = supplier
                .origin_id()
                .map(|origin| {
                    self.origins
                        .get(&origin)
                        .ok_or(IntegrityError::OriginNotFound { origin })
                })
                .transpose()?;
            loaded.push(LoadedSettlement { settlement, origin });
        }
        loaded.sort_by_key(|l| l.settlement.date());
        Ok(loaded)
    }

    fn fetch_payments_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<LoadedPayment<'_>>, IntegrityError> {
        let mut loaded = Vec::new();
        for payment in self.payments.values() {
            let settlement = self.settlements.get(&payment.settlement_id()).ok_or(
                IntegrityError::SettlementNotFound {
                    settlement: payment.settlement_id(),
                },
            )?;
            if settlement.client_id() != client_id {
                continue;
            }
            let bank = self
                .banks
                .get(&payment.bank_id())
                .ok_or(IntegrityError::BankNotFound {
                    bank: payment.bank_id(),
                })?;
            loaded.push(LoadedPayment {
                payment,
                settlement,
                bank,
            });
        }
        loaded.sort_by_key(|l| l.payment.date());
        Ok(loaded)
    }
}

// =============================================================================
// CSV import / export
// =============================================================================

/// One row of the settlement listing.
#[derive(Serialize)]
struct SettlementRow<'a> {
    id: SettlementId,
    date: chrono::NaiveDate,
    client: &'a str,
    settlement_number: &'a str,
    declaration_number: &'a str,
    class: SettlementClass,
    supplier: &'a str,
    currency: Currency,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    taxable_value: Decimal,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    total_amount: Decimal,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    total_tax: Decimal,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    total_withholding: Decimal,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    computed_total: Decimal,
}

/// One row of the payment listing.
#[derive(Serialize)]
struct PaymentRow<'a> {
    id: PaymentId,
    date: chrono::NaiveDate,
    client: &'a str,
    declaration_number: &'a str,
    bank: &'a str,
    #[serde(serialize_with = "serialize_decimal_2dp")]
    amount: Decimal,
    reference: &'a str,
    memo: &'a str,
}

impl CustomsLedger {
    /// Import clients from CSV with columns: id, name, `tax_id`, email, `settlement_number`
    pub fn import_clients<R: Read>(&mut self, reader: R) -> Result<ImportSummary, Error> {
        self.import::<_, ClientRecord, Client, _>(reader, "client", Self::insert_client)
    }

    /// Import origins from CSV with columns: id, name
    pub fn import_origins<R: Read>(&mut self, reader: R) -> Result<ImportSummary, Error> {
        self.import::<_, OriginRecord, Origin, _>(reader, "origin", Self::insert_origin)
    }

    /// Import suppliers from CSV with columns: id, name, origin
    pub fn import_suppliers<R: Read>(&mut self, reader: R) -> Result<ImportSummary, Error> {
        self.import::<_, SupplierRecord, Supplier, _>(reader, "supplier", Self::insert_supplier)
    }

    /// Import banks from CSV with columns: id, name, holder, `account_number`
    pub fn import_banks<R: Read>(&mut self, reader: R) -> Result<ImportSummary, Error> {
        self.import::<_, BankRecord, Bank, _>(reader, "bank", Self::insert_bank)
    }

    /// Import catalog items from CSV with columns: id, description
    pub fn import_items<R: Read>(&mut self, reader: R) -> Result<ImportSummary, Error> {
        self.import::<_, ItemRecord, Item, _>(reader, "item", Self::insert_item)
    }

    /// Import settlements (without line items) from CSV.
    pub fn import_settlements<R: Read>(&mut self, reader: R) -> Result<ImportSummary, Error> {
        self.import::<_, SettlementRecord, Settlement, _>(
            reader,
            "settlement",
            Self::insert_settlement,
        )
    }

    /// Import line items from CSV with columns: id, settlement, item, amount, tax, withholding
    pub fn import_line_items<R: Read>(&mut self, reader: R) -> Result<ImportSummary, Error> {
        self.import::<_, LineItemRecord, LineItem, _>(reader, "line item", Self::add_line_item)
    }

    /// Import payments from CSV with columns: id, settlement, bank, date, amount, reference, memo
    pub fn import_payments<R: Read>(&mut self, reader: R) -> Result<ImportSummary, Error> {
        self.import::<_, PaymentRecord, Payment, _>(reader, "payment", Self::insert_payment)
    }

    /// Build the statement of `client_id` and write its lines as CSV.
    pub fn export_statement<W: Write>(
        &self,
        client_id: ClientId,
        writer: W,
    ) -> Result<AccountStatement, Error> {
        let statement = self.statement(client_id)?;
        log::info!(
            "Exporting statement for client {client_id}: {} entries",
            statement.entries().len()
        );
        statement.write_csv(writer)?;
        Ok(statement)
    }

    /// Build the statement of `client_id` and write only its grand totals as CSV.
    pub fn export_totals<W: Write>(
        &self,
        client_id: ClientId,
        writer: W,
    ) -> Result<AccountStatement, Error> {
        let statement = self.statement(client_id)?;
        statement.write_totals_csv(writer)?;
        Ok(statement)
    }

    /// Write the settlements matching `query` with their totals as CSV, newest first.
    pub fn export_settlements<W: Write>(&self, query: &str, writer: W) -> Result<usize, Error> {
        let found = self.search_settlements(query);
        log::info!("Exporting {} settlements (query={query:?})", found.len());

        let mut csv_writer = csv::Writer::from_writer(writer);
        for settlement in &found {
            csv_writer.serialize(SettlementRow {
                id: settlement.id(),
                date: settlement.date(),
                client: self
                    .clients
                    .get(&settlement.client_id())
                    .map_or("", Client::name),
                settlement_number: settlement.settlement_number(),
                declaration_number: settlement.declaration_number(),
                class: settlement.class(),
                supplier: self
                    .suppliers
                    .get(&settlement.supplier_id())
                    .map_or("", Supplier::name),
                currency: settlement.taxable_currency(),
                taxable_value: settlement.taxable_value(),
                total_amount: settlement.total_amount(),
                total_tax: settlement.total_tax(),
                total_withholding: settlement.total_withholding(),
                computed_total: settlement.computed_total(),
            })?;
        }
        csv_writer.flush()?;
        Ok(found.len())
    }

    /// Write the payments matching `query` as CSV, newest first.
    pub fn export_payments<W: Write>(&self, query: &str, writer: W) -> Result<usize, Error> {
        let found = self.search_payments(query);
        log::info!("Exporting {} payments (query={query:?})", found.len());

        let mut csv_writer = csv::Writer::from_writer(writer);
        for payment in &found {
            let settlement = self.settlements.get(&payment.settlement_id());
            csv_writer.serialize(PaymentRow {
                id: payment.id(),
                date: payment.date(),
                client: settlement
                    .and_then(|s| self.clients.get(&s.client_id()))
                    .map_or("", Client::name),
                declaration_number: settlement.map_or("", Settlement::declaration_number),
                bank: self.banks.get(&payment.bank_id()).map_or("", Bank::name),
                amount: payment.amount(),
                reference: payment.reference().unwrap_or_default(),
                memo: payment.memo().unwrap_or_default(),
            })?;
        }
        csv_writer.flush()?;
        Ok(found.len())
    }

    /// Write the catalog items matching `query` as CSV, sorted by description.
    pub fn export_items<W: Write>(&self, query: &str, writer: W) -> Result<usize, Error> {
        let found = self.search_items(query);
        log::info!("Exporting {} items (query={query:?})", found.len());

        let mut csv_writer = csv::Writer::from_writer(writer);
        for item in &found {
            csv_writer.serialize(item)?;
        }
        csv_writer.flush()?;
        Ok(found.len())
    }

    /// Shared CSV import loop.
    ///
    /// Malformed or invalid rows abort the import. Rows that break referential
    /// integrity are logged and skipped.
    /// The CSV reader is buffered automatically, so don't wrap `reader` in an `io::BufReader`.
    fn import<R, Rec, T, F>(
        &mut self,
        reader: R,
        entity: &'static str,
        mut insert: F,
    ) -> Result<ImportSummary, Error>
    where
        R: Read,
        Rec: DeserializeOwned + Debug,
        T: TryFrom<Rec, Error = RecordError>,
        F: FnMut(&mut Self, T) -> Result<(), IntegrityError>,
    {
        log::info!("Starting {entity} import");

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut summary = ImportSummary::default();
        for result in csv_reader.deserialize::<Rec>() {
            let record = result?;
            let row_num = summary.imported + summary.skipped + 1;
            log::trace!("[{entity} row {row_num}] Parsing: {record:?}");

            let value = T::try_from(record)?;

            if let Err(e) = insert(self, value) {
                log::warn!("[{entity} row {row_num}] - Skipped: {e}");
                summary.skipped += 1;
            } else {
                summary.imported += 1;
            }
        }

        log::info!(
            "{entity} import complete: {} imported, {} skipped",
            summary.imported,
            summary.skipped
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two clients, one supplier from Brasil, one bank and one catalog item.
    fn seeded() -> CustomsLedger {
        let mut ledger = CustomsLedger::new();
        ledger.insert_client(Client::new(1, "Juan Pérez", "12345678")).unwrap();
        ledger
            .insert_client(Client::new(2, "María García López", "87654321"))
            .unwrap();
        ledger.insert_origin(Origin::new(1, "Brasil")).unwrap();
        ledger
            .insert_supplier(Supplier::new(1, "Importadora Brasil Ltda", Some(1)))
            .unwrap();
        ledger.insert_bank(Bank::new(1, "Continental", "ACME SA", "000-1")).unwrap();
        ledger.insert_item(Item::new(1, "Honorarios")).unwrap();
        ledger
    }

    fn add_settlement(
        ledger: &mut CustomsLedger,
        id: SettlementId,
        client: ClientId,
        on: NaiveDate,
    ) {
        ledger
            .insert_settlement(
                Settlement::new(id, on, client, 1, format!("DESP-{id}"))
                    .with_settlement_number(format!("LIQ-{id}")),
            )
            .unwrap();
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut ledger = seeded();
        assert!(matches!(
            ledger.insert_client(Client::new(1, "Otro", "1")),
            Err(IntegrityError::DuplicateId { entity: "client", id: 1 })
        ));
    }

    #[test]
    fn test_settlement_requires_known_client_and_supplier() {
        let mut ledger = seeded();
        let orphan = Settlement::new(1, date(2024, 1, 1), 99, 1, "DESP-1");
        assert!(matches!(
            ledger.insert_settlement(orphan),
            Err(IntegrityError::ClientNotFound { client: 99 })
        ));
        let orphan = Settlement::new(1, date(2024, 1, 1), 1, 99, "DESP-1");
        assert!(matches!(
            ledger.insert_settlement(orphan),
            Err(IntegrityError::SupplierNotFound { supplier: 99 })
        ));
    }

    #[test]
    fn test_line_items_drive_settlement_totals() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));
        ledger
            .add_line_item(LineItem::new(1, 1, 1, dec!(100), dec!(10), dec!(5)))
            .unwrap();
        ledger
            .add_line_item(LineItem::new(2, 1, 1, dec!(20), Decimal::ZERO, Decimal::ZERO))
            .unwrap();
        assert_eq!(ledger.settlement(1).unwrap().computed_total(), dec!(135));

        let removed = ledger.remove_line_item(2).unwrap();
        assert_eq!(removed.amount(), dec!(20));
        assert_eq!(ledger.settlement(1).unwrap().computed_total(), dec!(115));
        assert!(matches!(
            ledger.remove_line_item(2),
            Err(IntegrityError::LineItemNotFound { line_item: 2 })
        ));
    }

    #[test]
    fn test_line_item_requires_known_item_and_settlement() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));
        assert!(matches!(
            ledger.add_line_item(LineItem::new(1, 1, 42, dec!(1), dec!(0), dec!(0))),
            Err(IntegrityError::ItemNotFound { item: 42 })
        ));
        assert!(matches!(
            ledger.add_line_item(LineItem::new(1, 9, 1, dec!(1), dec!(0), dec!(0))),
            Err(IntegrityError::SettlementNotFound { settlement: 9 })
        ));
    }

    #[test]
    fn test_remove_client_cascades_to_settlements_and_payments() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));
        add_settlement(&mut ledger, 2, 2, date(2024, 1, 11));
        ledger
            .add_line_item(LineItem::new(1, 1, 1, dec!(100), dec!(0), dec!(0)))
            .unwrap();
        ledger
            .insert_payment(Payment::new(1, 1, 1, date(2024, 1, 15), dec!(50)))
            .unwrap();
        ledger
            .insert_payment(Payment::new(2, 2, 1, date(2024, 1, 16), dec!(10)))
            .unwrap();

        ledger.remove_client(1).unwrap();

        assert!(ledger.settlement(1).is_none());
        assert!(ledger.payment(1).is_none());
        assert!(ledger.settlement(2).is_some());
        assert!(ledger.payment(2).is_some());
        // the line item id is free again
        add_settlement(&mut ledger, 3, 2, date(2024, 2, 1));
        assert!(ledger
            .add_line_item(LineItem::new(1, 3, 1, dec!(1), dec!(0), dec!(0)))
            .is_ok());
    }

    #[test]
    fn test_remove_origin_in_use_is_rejected() {
        let mut ledger = seeded();
        assert!(matches!(
            ledger.remove_origin(1),
            Err(IntegrityError::OriginInUse { origin: 1, suppliers: 1 })
        ));
        assert!(ledger.origin(1).is_some());

        ledger.remove_supplier(1).unwrap();
        assert!(ledger.remove_origin(1).is_ok());
    }

    #[test]
    fn test_remove_bank_cascades_to_payments() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));
        ledger
            .insert_payment(Payment::new(1, 1, 1, date(2024, 1, 15), dec!(50)))
            .unwrap();
        ledger.remove_bank(1).unwrap();
        assert_eq!(ledger.stats().payments, 0);
        assert_eq!(ledger.stats().settlements, 1);
    }

    #[test]
    fn test_remove_item_drops_its_line_items() {
        let mut ledger = seeded();
        ledger.insert_item(Item::new(2, "Despacho")).unwrap();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));
        ledger
            .add_line_item(LineItem::new(1, 1, 1, dec!(100), dec!(0), dec!(0)))
            .unwrap();
        ledger
            .add_line_item(LineItem::new(2, 1, 2, dec!(30), dec!(0), dec!(0)))
            .unwrap();

        ledger.remove_item(1).unwrap();

        let settlement = ledger.settlement(1).unwrap();
        assert_eq!(settlement.line_items().len(), 1);
        assert_eq!(settlement.computed_total(), dec!(30));
        assert!(ledger.remove_line_item(1).is_err());
        assert!(ledger.remove_line_item(2).is_ok());
    }

    #[test]
    fn test_fetch_orders_by_date_and_filters_by_client() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 3, 1));
        add_settlement(&mut ledger, 2, 1, date(2024, 1, 1));
        add_settlement(&mut ledger, 3, 2, date(2024, 2, 1));
        ledger
            .insert_payment(Payment::new(1, 1, 1, date(2024, 3, 5), dec!(1)))
            .unwrap();
        ledger
            .insert_payment(Payment::new(2, 2, 1, date(2024, 1, 5), dec!(1)))
            .unwrap();
        ledger
            .insert_payment(Payment::new(3, 3, 1, date(2024, 2, 5), dec!(1)))
            .unwrap();

        let settlements = ledger.fetch_settlements_for_client(1).unwrap();
        let ids: Vec<_> = settlements.iter().map(|l| l.settlement.id()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(settlements[0].origin.map(Origin::name), Some("Brasil"));

        let payments = ledger.fetch_payments_for_client(1).unwrap();
        let ids: Vec<_> = payments.iter().map(|l| l.payment.id()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_statement_for_unknown_client() {
        let ledger = seeded();
        assert!(matches!(
            ledger.statement(99),
            Err(IntegrityError::ClientNotFound { client: 99 })
        ));
        assert!(ledger.statement(1).unwrap().entries().is_empty());
    }

    #[test]
    fn test_search_settlements() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));
        add_settlement(&mut ledger, 2, 2, date(2024, 2, 10));
        add_settlement(&mut ledger, 3, 2, date(2024, 3, 10));

        let ids = |found: Vec<&Settlement>| found.iter().map(|s| s.id()).collect::<Vec<_>>();
        assert_eq!(ids(ledger.search_settlements("")), vec![3, 2, 1]);
        assert_eq!(ids(ledger.search_settlements("GARCÍA")), vec![3, 2]);
        assert_eq!(ids(ledger.search_settlements("desp-1")), vec![1]);
        assert_eq!(ids(ledger.search_settlements("liq-2")), vec![2]);
        assert!(ledger.search_settlements("nonexistent").is_empty());
    }

    #[test]
    fn test_search_payments() {
        let mut ledger = seeded();
        ledger.insert_bank(Bank::new(2, "Itaú", "ACME SA", "000-2")).unwrap();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));
        add_settlement(&mut ledger, 2, 2, date(2024, 1, 11));
        ledger
            .insert_payment(Payment::new(1, 1, 1, date(2024, 1, 15), dec!(10)))
            .unwrap();
        ledger
            .insert_payment(
                Payment::new(2, 2, 2, date(2024, 3, 1), dec!(20)).with_reference("TRF-0099"),
            )
            .unwrap();
        ledger
            .insert_payment(Payment::new(3, 2, 1, date(2024, 2, 1), dec!(30)))
            .unwrap();

        let ids = |found: Vec<&Payment>| found.iter().map(|p| p.id()).collect::<Vec<_>>();
        assert_eq!(ids(ledger.search_payments("")), vec![2, 3, 1]);
        assert_eq!(ids(ledger.search_payments("GARCÍA")), vec![2, 3]);
        assert_eq!(ids(ledger.search_payments("desp-1")), vec![1]);
        assert_eq!(ids(ledger.search_payments("itaú")), vec![2]);
        assert_eq!(ids(ledger.search_payments("trf-00")), vec![2]);
        assert!(ledger.search_payments("nonexistent").is_empty());
    }

    #[test]
    fn test_search_items() {
        let mut ledger = seeded();
        ledger.insert_item(Item::new(2, "Gastos de despacho")).unwrap();
        ledger.insert_item(Item::new(3, "Almacenaje")).unwrap();

        let ids = |found: Vec<&Item>| found.iter().map(|i| i.id()).collect::<Vec<_>>();
        assert_eq!(ids(ledger.search_items("")), vec![3, 2, 1]);
        assert_eq!(ids(ledger.search_items("DESPACHO")), vec![2]);
        assert_eq!(ids(ledger.search_items("a")), vec![3, 2, 1]);
        assert!(ledger.search_items("flete").is_empty());
    }

    #[test]
    fn test_export_payments_and_items() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));
        ledger
            .insert_payment(
                Payment::new(1, 1, 1, date(2024, 1, 15), dec!(50.5))
                    .with_reference("TRF-1")
                    .with_memo("anticipo"),
            )
            .unwrap();

        let mut output = Vec::new();
        assert_eq!(ledger.export_payments("", &mut output).unwrap(), 1);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,date,client,declaration_number,bank,amount,reference,memo\n\
             1,2024-01-15,Juan Pérez,DESP-1,Continental,50.50,TRF-1,anticipo\n"
        );

        let mut output = Vec::new();
        assert_eq!(ledger.export_items("honor", &mut output).unwrap(), 1);
        assert_eq!(String::from_utf8(output).unwrap(), "id,description\n1,Honorarios\n");
    }

    #[test]
    fn test_insert_settlement_checks_carried_line_items() {
        let mut ledger = seeded();

        let mut twice = Settlement::new(1, date(2024, 1, 10), 1, 1, "DESP-1");
        twice.push_line_item(LineItem::new(5, 1, 1, dec!(10), dec!(0), dec!(0)));
        twice.push_line_item(LineItem::new(5, 1, 1, dec!(20), dec!(0), dec!(0)));
        assert!(matches!(
            ledger.insert_settlement(twice),
            Err(IntegrityError::DuplicateId { entity: "line item", id: 5 })
        ));

        let mut foreign = Settlement::new(1, date(2024, 1, 10), 1, 1, "DESP-1");
        foreign.push_line_item(LineItem::new(6, 2, 1, dec!(10), dec!(0), dec!(0)));
        assert!(matches!(
            ledger.insert_settlement(foreign),
            Err(IntegrityError::SettlementNotFound { settlement: 2 })
        ));
        assert_eq!(ledger.stats().settlements, 0);

        let mut valid = Settlement::new(1, date(2024, 1, 10), 1, 1, "DESP-1");
        valid.push_line_item(LineItem::new(5, 1, 1, dec!(10), dec!(0), dec!(0)));
        valid.push_line_item(LineItem::new(6, 1, 1, dec!(20), dec!(0), dec!(0)));
        ledger.insert_settlement(valid).unwrap();
        assert_eq!(ledger.remove_line_item(6).unwrap().amount(), dec!(20));
        assert_eq!(ledger.settlement(1).unwrap().computed_total(), dec!(10));
    }

    #[test]
    fn test_import_skips_dangling_payments() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));

        let input = "id,settlement,bank,date,amount,reference,memo
1,1,1,2024-01-15,50.00,TRF-1,
2,99,1,2024-01-16,10.00,,
3,1,7,2024-01-17,10.00,,";
        let summary = ledger.import_payments(Cursor::new(input)).unwrap();

        assert_eq!(summary, ImportSummary { imported: 1, skipped: 2 });
        assert_eq!(ledger.payment(1).unwrap().reference(), Some("TRF-1"));
    }

    #[test]
    fn test_import_aborts_on_invalid_amount() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));

        let input = "id,settlement,item,amount,tax,withholding
1,1,1,10.005,,";
        assert!(matches!(
            ledger.import_line_items(Cursor::new(input)),
            Err(Error::Record(RecordError::InvalidAmount { field: "amount", .. }))
        ));
    }

    #[test]
    fn test_export_settlements_writes_totals() {
        let mut ledger = seeded();
        add_settlement(&mut ledger, 1, 1, date(2024, 1, 10));
        ledger
            .add_line_item(LineItem::new(1, 1, 1, dec!(100), dec!(10), dec!(5)))
            .unwrap();

        let mut output = Vec::new();
        let written = ledger.export_settlements("", &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_eq!(written, 1);
        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,date,client,settlement_number,declaration_number,class,supplier,currency,\
             taxable_value,total_amount,total_tax,total_withholding,computed_total"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,2024-01-10,Juan Pérez,LIQ-1,DESP-1,import,Importadora Brasil Ltda,USD,\
             0.00,100.00,10.00,5.00,115.00"
        );
    }
}
