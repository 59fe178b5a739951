//! Basic example of using the `CustomsLedger`.
//!
//! Run with: `cargo run --example basic`

use customs_ledger::{
    Bank, Client, CustomsLedger, Item, LineItem, Origin, Payment, Settlement, Supplier,
};
use rust_decimal::Decimal;
use std::io::Cursor;

fn main() {
    // Initialize logger (optional, but shows what's happening)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut ledger = CustomsLedger::new();

    // Catalogs can be inserted directly...
    ledger
        .insert_client(Client::new(1, "Juan Pérez", "12345678").with_email("juan@example.com"))
        .expect("Failed to insert client");
    ledger
        .insert_origin(Origin::new(1, "Brasil"))
        .expect("Failed to insert origin");
    ledger
        .insert_supplier(Supplier::new(1, "Importadora Brasil Ltda", Some(1)))
        .expect("Failed to insert supplier");
    ledger
        .insert_bank(Bank::new(1, "Continental", "Despachos SA", "001-22"))
        .expect("Failed to insert bank");
    ledger
        .insert_item(Item::new(1, "Honorarios"))
        .expect("Failed to insert item");

    let date = |d| chrono::NaiveDate::from_ymd_opt(2024, 1, d).expect("valid date");
    ledger
        .insert_settlement(
            Settlement::new(1, date(10), 1, 1, "24001IC04000123")
                .with_settlement_number("LIQ-001")
                .with_invoice_number("FC-100")
                .with_purchase_order("OC-77"),
        )
        .expect("Failed to insert settlement");
    ledger
        .add_line_item(LineItem::new(
            1,
            1,
            1,
            Decimal::from(100),
            Decimal::from(10),
            Decimal::from(5),
        ))
        .expect("Failed to add line item");

    // ...or imported from CSV
    let payments = "id,settlement,bank,date,amount,reference,memo
1,1,1,2024-01-15,50.00,,first instalment
";
    ledger
        .import_payments(Cursor::new(payments))
        .expect("Failed to import payments");
    ledger
        .insert_payment(Payment::new(2, 1, 1, date(20), Decimal::from(30)).with_reference("TRF-9"))
        .expect("Failed to insert payment");

    // Print the statement as a table, then as CSV
    let statement = ledger.statement(1).expect("Failed to build statement");
    println!("\n=== Account Statement ===\n{statement}\n");

    ledger
        .export_statement(1, std::io::stdout())
        .expect("Failed to export statement");
}
