//! End-to-end operations against a mocked Prism Central.

use prism_core::config::Credentials;
use prism_core::{ClientFactory, ResourceKind, TransportConfig};
use prism_ops::catalog;
use prism_ops::{EntityModule, InfoModule, Params};
use prism_tasks::TaskWaiter;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn factory(server: &MockServer) -> ClientFactory {
    let transport = TransportConfig::new("127.0.0.1", Credentials::basic("admin", "Nutanix/4u"))
        .with_scheme("http")
        .with_port(server.address().port());
    ClientFactory::new(transport).unwrap()
}

fn waiter() -> TaskWaiter {
    TaskWaiter::new()
        .with_poll_interval(Duration::from_millis(5))
        .with_timeout(Duration::from_secs(5))
}

fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap()
}

fn task_reference(id: &str) -> Value {
    json!({"data": {"extId": id, "$objectType": "prism.v4.config.TaskReference"}})
}

#[tokio::test]
async fn authorization_policy_create_is_synchronous() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/iam/v4.0/authz/authorization-policies"))
        .and(body_partial_json(json!({
            "displayName": "acp1",
            "role": "R-1",
            "authorizationPolicyType": "USER_DEFINED",
            "identities": [{"$reserved": {"user": {"uuid": {"anyof": ["U-1"]}}}}],
            "entities": [{"$reserved": {"images": {"*": {"eq": "*"}}}}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "extId": "AP-1",
                "displayName": "acp1",
                "role": "R-1",
                "$objectType": "iam.v4.authz.AuthorizationPolicy",
                "identities": [{"$reserved": {"user": {"uuid": {"anyof": ["U-1"]}}}}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let module = EntityModule::new(factory(&server), catalog::authorization_policy());
    let result = module
        .run(&params(json!({
            "display_name": "acp1",
            "role": "R-1",
            "identities": [{"user": {"uuid": {"anyof": ["U-1"]}}}],
            "entities": [{"images": {"*": {"eq": "*"}}}]
        })))
        .await;

    assert!(!result.failed, "{:?}", result.error);
    assert!(result.changed);
    assert_eq!(result.ext_id.as_deref(), Some("AP-1"));
    let response = result.response.unwrap();
    assert_eq!(response["display_name"], "acp1");
    assert!(response.get("$objectType").is_none());
    assert!(response["identities"][0].get("$reserved").is_some());
}

#[tokio::test]
async fn role_update_without_changes_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/iam/v4.0/authz/roles/R-9"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "E-9")
                .set_body_json(json!({
                    "data": {
                        "extId": "R-9",
                        "displayName": "ops",
                        "operations": ["op-b", "op-a"],
                        "$objectType": "iam.v4.authz.Role"
                    }
                })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let module = EntityModule::new(factory(&server), catalog::role());
    let result = module
        .run(&params(json!({
            "ext_id": "R-9",
            "display_name": "ops",
            "operations": ["op-a", "op-b"]
        })))
        .await;

    assert!(!result.failed, "{:?}", result.error);
    assert!(result.skipped);
    assert!(!result.changed);
    assert_eq!(result.ext_id.as_deref(), Some("R-9"));
}

#[tokio::test]
async fn role_update_sends_read_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/iam/v4.0/authz/roles/R-9"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "E-9")
                .set_body_json(json!({
                    "data": {"extId": "R-9", "displayName": "ops", "operations": ["op-a"]}
                })),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/iam/v4.0/authz/roles/R-9"))
        .and(header("if-match", "E-9"))
        .and(body_partial_json(json!({"displayName": "ops2", "operations": ["op-a"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"extId": "R-9", "displayName": "ops2", "operations": ["op-a"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let module = EntityModule::new(factory(&server), catalog::role());
    let result = module
        .run(&params(json!({"ext_id": "R-9", "display_name": "ops2"})))
        .await;

    assert!(result.changed, "{:?}", result.error);
    assert!(!result.skipped);
    assert_eq!(result.response.unwrap()["display_name"], "ops2");
}

#[tokio::test]
async fn backup_target_create_waits_for_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/api/prism/v4.0/management/domain-managers/PC-1/backup-targets",
        ))
        .and(body_partial_json(json!({
            "location": {
                "$objectType": "prism.v4.management.ClusterLocation",
                "config": {"extId": "C-1"}
            }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(task_reference("T-1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/prism/v4.0/config/tasks/T-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"extId": "T-1", "status": "RUNNING", "progressPercentage": 40}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/prism/v4.0/config/tasks/T-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "extId": "T-1",
                "status": "SUCCEEDED",
                "progressPercentage": 100,
                "entitiesAffected": [
                    {"extId": "PC-1", "rel": "prism:management:domain-manager"},
                    {"extId": "BT-1", "rel": "prism:management:backup-target"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let module =
        EntityModule::new(factory(&server), catalog::backup_target()).with_waiter(waiter());
    let result = module
        .run(&params(json!({
            "domain_manager_ext_id": "PC-1",
            "location": {"cluster_location": {"config": {"ext_id": "C-1"}}}
        })))
        .await;

    assert!(!result.failed, "{:?}", result.error);
    assert!(result.changed);
    assert_eq!(result.task_ext_id.as_deref(), Some("T-1"));
    assert_eq!(result.ext_id.as_deref(), Some("BT-1"));
    assert_eq!(result.response.unwrap()["status"], "SUCCEEDED");
}

#[tokio::test]
async fn backup_target_with_two_locations_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let module = EntityModule::new(factory(&server), catalog::backup_target());
    let result = module
        .run(&params(json!({
            "domain_manager_ext_id": "PC-1",
            "location": {
                "cluster_location": {"config": {"ext_id": "C-1"}},
                "object_store_location": {"provider_config": {"bucket_name": "b"}}
            }
        })))
        .await;

    assert!(result.failed);
    assert!(result.error.unwrap().starts_with("SCHEMA_VIOLATION: "));
}

#[tokio::test]
async fn volume_group_delete_uses_etag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes/v4.0/config/volume-groups/VG-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "E-1")
                .set_body_json(json!({"data": {"extId": "VG-1", "name": "vg1"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/volumes/v4.0/config/volume-groups/VG-1"))
        .and(header("if-match", "E-1"))
        .respond_with(ResponseTemplate::new(202).set_body_json(task_reference("T-2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/prism/v4.0/config/tasks/T-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"extId": "T-2", "status": "SUCCEEDED", "progressPercentage": 100}
        })))
        .mount(&server)
        .await;

    let module =
        EntityModule::new(factory(&server), catalog::volume_group()).with_waiter(waiter());
    let result = module
        .run(&params(json!({"state": "absent", "ext_id": "VG-1"})))
        .await;

    assert!(!result.failed, "{:?}", result.error);
    assert!(result.changed);
    assert_eq!(result.ext_id.as_deref(), Some("VG-1"));
    assert_eq!(result.task_ext_id.as_deref(), Some("T-2"));
}

#[tokio::test]
async fn delete_without_token_never_writes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes/v4.0/config/volume-groups/VG-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"extId": "VG-1"}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let module = EntityModule::new(factory(&server), catalog::volume_group());
    let result = module
        .run(&params(json!({"state": "absent", "ext_id": "VG-1"})))
        .await;

    assert!(result.failed);
    assert!(!result.changed);
    assert!(result
        .error
        .unwrap()
        .starts_with("PRECONDITION_UNAVAILABLE: "));
}

#[tokio::test]
async fn delete_of_missing_entity_is_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes/v4.0/config/volume-groups/VG-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "data": {"error": [{"message": "not found"}]}
        })))
        .mount(&server)
        .await;

    let module = EntityModule::new(factory(&server), catalog::volume_group());
    let result = module
        .run(&params(json!({"state": "absent", "ext_id": "VG-404"})))
        .await;

    assert!(!result.failed, "{:?}", result.error);
    assert!(!result.changed);
}

#[tokio::test]
async fn check_mode_reads_but_never_writes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/iam/v4.0/authz/roles/R-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "E-1")
                .set_body_json(json!({"data": {"extId": "R-1", "displayName": "old"}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let module = EntityModule::new(factory(&server), catalog::role()).with_check_mode(true);
    let result = module
        .run(&params(json!({"ext_id": "R-1", "display_name": "new"})))
        .await;

    assert!(result.changed, "{:?}", result.error);
    assert_eq!(result.response.unwrap()["display_name"], "new");
}

#[tokio::test]
async fn secret_field_forces_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/iam/v4.0/authn/users/U-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "E-1")
                .set_body_json(json!({"data": {"extId": "U-1", "username": "svc"}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/iam/v4.0/authn/users/U-1"))
        .and(header("if-match", "E-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"extId": "U-1", "username": "svc"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let module = EntityModule::new(factory(&server), catalog::user());
    let result = module
        .run(&params(json!({"ext_id": "U-1", "username": "svc", "password": "s3cret"})))
        .await;

    assert!(result.changed, "{:?}", result.error);
    assert!(!result.skipped);
}

#[tokio::test]
async fn info_fetch_all_enumerates_pages() {
    let server = MockServer::start().await;
    let first: Vec<Value> = (0..100).map(|i| json!({"extId": format!("C-{i}")})).collect();
    Mock::given(method("GET"))
        .and(path("/api/prism/v4.0/config/categories"))
        .and(query_param("$page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": first,
            "metadata": {"totalAvailableResults": 101}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/prism/v4.0/config/categories"))
        .and(query_param("$page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"extId": "C-100"}],
            "metadata": {"totalAvailableResults": 101}
        })))
        .mount(&server)
        .await;

    let module = InfoModule::new(factory(&server), ResourceKind::Category);
    let result = module.run(&params(json!({"fetch_all": true}))).await;

    assert!(!result.failed, "{:?}", result.error);
    assert_eq!(result.total_available_results, Some(101));
    assert_eq!(result.response.unwrap().as_array().unwrap().len(), 101);
}

#[tokio::test]
async fn info_single_page_and_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prism/v4.0/config/categories"))
        .and(query_param("$limit", "1"))
        .and(query_param("$filter", "key eq 'env'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"extId": "C-1", "key": "env"}],
            "metadata": {"totalAvailableResults": 4}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/prism/v4.0/config/categories/C-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"extId": "C-1", "key": "env", "$objectType": "prism.v4.config.Category"}
        })))
        .mount(&server)
        .await;

    let module = InfoModule::new(factory(&server), ResourceKind::Category);

    let page = module
        .run(&params(json!({"page": 0, "limit": 1, "filter": "key eq 'env'"})))
        .await;
    assert_eq!(page.total_available_results, Some(4));
    assert_eq!(page.response.unwrap().as_array().unwrap().len(), 1);

    let one = module.run(&params(json!({"ext_id": "C-1"}))).await;
    assert_eq!(one.response.unwrap(), json!({"ext_id": "C-1", "key": "env"}));
}
