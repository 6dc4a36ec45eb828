//! Datastore checks against a real database.
//!
//! Skipped with a printed reason unless `DB_SERVER`, `DB_NAME`, `DB_USER`
//! and `DB_PASSWORD` point at a reachable database.

use import_harness::storage::SqlValue;
use import_harness::{Harness, RunOutcome, TestDeclaration};

fn harness() -> Harness {
    let _ = dotenvy::dotenv();
    Harness::from_env().expect("harness configuration")
}

fn finish<T>(name: &str, outcome: RunOutcome<T>) {
    match outcome {
        RunOutcome::Skipped(reason) => eprintln!("{}: {}", name, reason),
        RunOutcome::Failed(reason) => panic!("{}: {}", name, reason),
        RunOutcome::Completed(_) => {}
    }
}

#[tokio::test]
async fn real_database_connectivity() {
    let harness = harness();
    let gateway = harness.gateway();
    let declaration = TestDeclaration::real("real_database_connectivity").requires_datastore();

    let outcome = harness
        .run(declaration, move |_| async move {
            let rows = gateway
                .execute_query("SELECT 1 AS test_connection", &[])
                .await
                .expect("connectivity query");
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].get("test_connection").and_then(SqlValue::as_i64), Some(1));
        })
        .await;
    finish("real_database_connectivity", outcome);
}

#[tokio::test]
async fn real_lookup_is_determinate() {
    let harness = harness();
    let validator = harness.validator();
    let declaration = TestDeclaration::real("real_lookup_is_determinate").requires_datastore();

    let outcome = harness
        .run(declaration, move |_| async move {
            for id in [111, 222, 333] {
                let outcome = validator.validate(id).await;
                assert!(
                    outcome.is_present() || outcome.is_absent(),
                    "person {} lookup was {}",
                    id,
                    outcome
                );
                assert_eq!(validator.validate(id).await, outcome);
            }
        })
        .await;
    finish("real_lookup_is_determinate", outcome);
}

#[tokio::test]
async fn real_import_then_validate() {
    let harness = harness();
    let client = harness.client();
    let declaration = TestDeclaration::real("real_import_then_validate")
        .requires_import_api()
        .requires_datastore();

    let outcome = harness
        .run(declaration, move |_| async move {
            let response = client.import_person(111).await;
            assert!(response.is_success(), "import failed: {}", response);

            let record = client.get_person_from_database(111).await.expect("person 111 persisted");
            assert_eq!(record.person_id, 111);
        })
        .await;
    finish("real_import_then_validate", outcome);
}
