//! Import endpoint against the real service.
//!
//! Every test declares its infrastructure and goes through the execution
//! mode selector; with `RUN_REAL_API` unset they print a skip line and pass.

use import_harness::client::ImportRequest;
use import_harness::{Harness, RunOutcome, TestDeclaration};
use serde_json::json;
use std::time::Duration;

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
async fn real_happy_path() {
    let harness = harness();
    let client = harness.client();
    let declaration = TestDeclaration::real("real_happy_path").requires_import_api();

    let outcome = harness
        .run(declaration, move |_| async move {
            let response = client.import_person(111).await;
            assert!(response.is_success(), "expected 200/201/202, got {}", response);
        })
        .await;
    finish("real_happy_path", outcome);
}

#[tokio::test]
async fn real_valid_ids_are_accepted() {
    let harness = harness();
    let client = harness.client();
    let declaration = TestDeclaration::real("real_valid_ids_are_accepted").requires_import_api();

    let outcome = harness
        .run(declaration, move |_| async move {
            for id in [111, 222, 333] {
                let response = client.import_person(id).await;
                assert!(response.is_success(), "id {} got {}", id, response);
            }
        })
        .await;
    finish("real_valid_ids_are_accepted", outcome);
}

#[tokio::test]
async fn real_negative_id_is_rejected() {
    let harness = harness();
    let client = harness.client();
    let declaration = TestDeclaration::real("real_negative_id_is_rejected").requires_import_api();

    let outcome = harness
        .run(declaration, move |_| async move {
            assert_eq!(client.import_person(-1).await.status(), Some(400));
        })
        .await;
    finish("real_negative_id_is_rejected", outcome);
}

#[tokio::test]
async fn real_missing_auth_is_rejected() {
    let harness = harness();
    let client = harness.client().without_auth();
    let declaration = TestDeclaration::real("real_missing_auth_is_rejected").requires_import_api();

    let outcome = harness
        .run(declaration, move |_| async move {
            assert_eq!(client.import_person(111).await.status(), Some(401));
        })
        .await;
    finish("real_missing_auth_is_rejected", outcome);
}

#[tokio::test]
async fn real_malformed_payloads_are_client_errors() {
    let harness = harness();
    let client = harness.client();
    let declaration =
        TestDeclaration::real("real_malformed_payloads_are_client_errors").requires_import_api();

    let outcome = harness
        .run(declaration, move |_| async move {
            let payloads = [
                ImportRequest::empty(),
                ImportRequest::empty().push_missing(),
                ImportRequest::empty().push_malformed("x"),
            ];
            for payload in payloads {
                let response = client.import_entities(&payload).await;
                assert!(response.is_client_error(), "{} got {}", payload.to_json(), response);
            }
            let response = client.import_raw(json!({"personId": 111})).await;
            assert!(response.is_client_error(), "object body got {}", response);
        })
        .await;
    finish("real_malformed_payloads_are_client_errors", outcome);
}

#[tokio::test]
async fn real_unknown_person() {
    let harness = harness();
    let client = harness.client();
    let declaration = TestDeclaration::real("real_unknown_person").requires_import_api();

    let outcome = harness
        .run(declaration, move |_| async move {
            let response = client.import_person(999_999).await;
            assert!(response.status_in(&[400, 404]), "got {}", response);
        })
        .await;
    finish("real_unknown_person", outcome);
}

#[tokio::test]
async fn real_response_time() {
    let harness = harness();
    let client = harness.client();
    let declaration = TestDeclaration::real("real_response_time").requires_import_api();

    let outcome = harness
        .run(declaration, move |_| async move {
            let response = client.import_person(111).await;
            assert!(response.elapsed() < Duration::from_secs(5), "took {:?}", response.elapsed());
        })
        .await;
    finish("real_response_time", outcome);
}

#[tokio::test]
async fn real_multiple_persons_then_validate() {
    let harness = harness();
    let client = harness.client();
    let gateway = harness.gateway();
    let declaration =
        TestDeclaration::real("real_multiple_persons_then_validate").requires_import_api();

    let outcome = harness
        .run(declaration, move |_| async move {
            let response = client.import_entities(&ImportRequest::from_ids([111, 222, 333])).await;
            assert!(response.status_in(&[200, 201, 202, 400]), "got {}", response);

            if response.is_success() && gateway.is_available().await {
                for id in [111, 222, 333] {
                    let outcome = client.validate_person_in_database(id).await;
                    assert!(outcome.is_present(), "person {} not persisted: {}", id, outcome);
                }
            }
        })
        .await;
    finish("real_multiple_persons_then_validate", outcome);
}
