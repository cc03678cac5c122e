//! Firestore REST client against a mocked emulator endpoint.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jobboard_firestore::{DocumentStore, FirestoreClient, FirestoreConfig, Query};

const DOCS: &str = "/v1/projects/test-project/databases/(default)/documents";

async fn client(server: &MockServer) -> FirestoreClient {
    FirestoreClient::new(FirestoreConfig {
        project_id: "test-project".to_string(),
        database_id: "(default)".to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        emulator_host: Some(server.uri()),
    })
    .await
    .unwrap()
}

fn doc_name(collection: &str, id: &str) -> String {
    format!("projects/test-project/databases/(default)/documents/{collection}/{id}")
}

#[tokio::test]
async fn test_get_decodes_fields_and_maps_404_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCS}/jobs/job-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": doc_name("jobs", "job-1"),
            "fields": {
                "title": {"stringValue": "Engineer"},
                "salaryRange": {"mapValue": {"fields": {
                    "min": {"integerValue": "50000"},
                    "max": {"integerValue": "90000"}
                }}}
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCS}/jobs/missing")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let doc = client.get("jobs", "job-1").await.unwrap().unwrap();
    assert_eq!(doc.id, "job-1");
    assert_eq!(doc.fields["title"], json!("Engineer"));
    assert_eq!(doc.fields["salaryRange"]["min"], json!(50000));

    assert!(client.get("jobs", "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_returns_generated_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}/jobs")))
        .and(body_partial_json(json!({
            "fields": {"title": {"stringValue": "Engineer"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": doc_name("jobs", "generated-id"),
            "fields": {"title": {"stringValue": "Engineer"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let fields = serde_json::from_value(json!({"title": "Engineer"})).unwrap();
    let id = client.insert("jobs", fields).await.unwrap();
    assert_eq!(id, "generated-id");
}

#[tokio::test]
async fn test_find_skips_read_time_only_elements() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}:runQuery")))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{"collectionId": "job-applications"}],
                "where": {"fieldFilter": {
                    "field": {"fieldPath": "job_id"},
                    "op": "EQUAL",
                    "value": {"stringValue": "job-1"}
                }}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": {
                "name": doc_name("job-applications", "app-1"),
                "fields": {"job_id": {"stringValue": "job-1"}}
            }, "readTime": "2024-01-01T00:00:00Z"},
            {"readTime": "2024-01-01T00:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let docs = client
        .find("job-applications", &Query::new().eq("job_id", "job-1"))
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "app-1");
}

#[tokio::test]
async fn test_increment_commits_field_transform() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}:commit")))
        .and(body_partial_json(json!({
            "writes": [{
                "transform": {
                    "document": doc_name("jobs", "job-1"),
                    "fieldTransforms": [{
                        "fieldPath": "applicationCount",
                        "increment": {"integerValue": "-1"}
                    }]
                },
                "currentDocument": {"exists": true}
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}],
            "commitTime": "2024-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let result = client
        .increment("jobs", "job-1", "applicationCount", -1)
        .await
        .unwrap();
    assert_eq!(result.matched_count, 1);
}

#[tokio::test]
async fn test_writes_to_missing_documents_match_nothing() {
    let server = MockServer::start().await;
    let not_found = ResponseTemplate::new(404).set_body_json(json!({
        "error": {"code": 404, "status": "NOT_FOUND", "message": "no entity to update"}
    }));
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}:commit")))
        .respond_with(not_found.clone())
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCS}/job-applications/gone")))
        .and(query_param("currentDocument.exists", "true"))
        .and(query_param("updateMask.fieldPaths", "status"))
        .respond_with(not_found.clone())
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DOCS}/job-applications/gone")))
        .respond_with(not_found)
        .mount(&server)
        .await;

    let client = client(&server).await;

    let inc = client.increment("jobs", "gone", "applicationCount", 1).await.unwrap();
    assert_eq!(inc.matched_count, 0);

    let fields = serde_json::from_value(json!({"status": "accepted"})).unwrap();
    let update = client.set_fields("job-applications", "gone", fields).await.unwrap();
    assert_eq!(update.matched_count, 0);

    let delete = client.delete("job-applications", "gone").await.unwrap();
    assert_eq!(delete.deleted_count, 0);
}

#[tokio::test]
async fn test_get_many_uses_batch_get() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}:batchGet")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"found": {
                "name": doc_name("jobs", "job-1"),
                "fields": {"title": {"stringValue": "Engineer"}}
            }},
            {"missing": doc_name("jobs", "job-2")}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let docs = client
        .get_many("jobs", &["job-1".to_string(), "job-2".to_string()])
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "job-1");
}

#[tokio::test]
async fn test_server_errors_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}:runQuery")))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let err = client.find("jobs", &Query::new()).await.unwrap_err();
    assert_eq!(err.http_status(), Some(503));
}

#[tokio::test]
async fn test_document_id_is_sent_as_one_encoded_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCS}/jobs/abc")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": doc_name("jobs", "abc"),
            "fields": {"title": {"stringValue": "Wrong document"}}
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCS}/jobs/abc%3Fx%23y")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "status": "NOT_FOUND"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    assert!(client.get("jobs", "abc?x#y").await.unwrap().is_none());
}
