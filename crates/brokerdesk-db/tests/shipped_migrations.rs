use std::path::PathBuf;

use brokerdesk_db::{Database, LedgerStore, MigrationRunner, MigrationSource};

fn shipped_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../migrations")
}

#[test]
fn shipped_schema_applies_cleanly_and_is_idempotent() {
    let mut db = Database::in_memory().unwrap();
    let runner = MigrationRunner::new(
        MigrationSource::new(shipped_dir(), "sql"),
        LedgerStore::default(),
    );

    let first = runner.run(db.connection_mut()).unwrap();
    assert!(first.is_success(), "shipped migrations failed: {:?}", first.error());
    assert!(first.succeeded() > 0);
    assert_eq!(first.succeeded(), first.discovered.len());

    let second = runner.run(db.connection_mut()).unwrap();
    assert_eq!(second.succeeded(), 0);
    assert_eq!(second.skipped(), first.discovered.len());
}

#[test]
fn contract_status_is_constrained() {
    let mut db = Database::in_memory().unwrap();
    MigrationRunner::new(
        MigrationSource::new(shipped_dir(), "sql"),
        LedgerStore::default(),
    )
    .run(db.connection_mut())
    .unwrap();

    let conn = db.connection();
    conn.execute_batch(
        "INSERT INTO clients (full_name, phone) VALUES ('Ada Owner', '555-0100');
         INSERT INTO properties (owner_id, address, city, property_type, price)
         VALUES (1, '1 Main St', 'Springfield', 'house', 250000);
         INSERT INTO contracts (property_id, client_id, contract_type, amount)
         VALUES (1, 1, 'sale', 250000);",
    )
    .unwrap();

    let status: String = conn
        .query_row("SELECT status FROM contracts WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(status, "draft");

    let bad = conn.execute("UPDATE contracts SET status = 'archived' WHERE id = 1", []);
    assert!(bad.is_err());
}
