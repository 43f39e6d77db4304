//! Route tests against an in-process server.

use std::io::Write;

use axum_test::TestServer;
use serde_json::{json, Value};

use gridwire_gateway::fixtures::{build_registry, load_fixtures, parse_fixtures};
use gridwire_gateway::{create_router, AppState, GatewayConfig};

const FIXTURE: &str = r#"{"resources": {
    "people.person": {
        "fields": ["name", "age"],
        "records": [
            {"id": 1, "name": "Ana", "age": 30},
            {"id": 2, "name": "Bo", "age": 25},
            {"id": 3, "name": "Cy", "age": 40}
        ]
    }
}}"#;

fn server_with(config: GatewayConfig) -> TestServer {
    let registry = build_registry(&parse_fixtures(FIXTURE).unwrap()).unwrap();
    TestServer::new(create_router(AppState::new(registry, config))).unwrap()
}

fn server() -> TestServer {
    server_with(GatewayConfig::default())
}

#[tokio::test]
async fn test_health() {
    let response = server().get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["resources"], json!(["people.person"]));
}

#[tokio::test]
async fn test_datatable_get() {
    let response = server()
        .get("/datatable")
        .add_query_param("sEcho", "4")
        .add_query_param("sColumns", "name,age")
        .add_query_param("sModel", "people.person")
        .add_query_param("iDisplayStart", "0")
        .add_query_param("iDisplayLength", "2")
        .add_query_param("iSortingCols", "1")
        .add_query_param("iSortCol_0", "1")
        .add_query_param("sSortDir_0", "desc")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({
            "sEcho": "4",
            "iTotalRecords": 3,
            "iTotalDisplayRecords": 3,
            "aaData": [
                {"0": "Cy", "1": 40, "DT_RowId": "PK_3"},
                {"0": "Ana", "1": 30, "DT_RowId": "PK_1"}
            ],
            "bSuccess": true,
            "sError": ""
        })
    );
}

#[tokio::test]
async fn test_datatable_post_bound_resource() {
    let form = vec![
        ("sEcho", "1"),
        ("sColumns", "name"),
        ("sSearch_0", "b"),
    ];
    let response = server()
        .post("/datatable/people/person")
        .form(&form)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["bSuccess"], true);
    assert_eq!(body["aaData"], json!([{"0": "Bo", "DT_RowId": "PK_2"}]));
}

#[tokio::test]
async fn test_datatable_unknown_resource() {
    let response = server()
        .get("/datatable/people/robot")
        .add_query_param("sEcho", "9")
        .add_query_param("sColumns", "name")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["bSuccess"], false);
    assert_eq!(body["sEcho"], "9");
    assert_eq!(body["sError"], "people.robot did not match any resource");
    assert!(body.get("aaData").is_none());
}

#[tokio::test]
async fn test_grid_jsonp() {
    let response = server()
        .get("/grid/people/person")
        .add_query_param("start", "1")
        .add_query_param("limit", "1")
        .add_query_param("sort", "age")
        .add_query_param("dir", "ASC")
        .add_query_param("callback", "stcCallback1001")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header("content-type"),
        "application/json; charset=utf-8"
    );
    let text = response.text();
    let json_text = text
        .strip_prefix("stcCallback1001(")
        .and_then(|s| s.strip_suffix(')'))
        .unwrap();
    let body: Value = serde_json::from_str(json_text).unwrap();
    assert_eq!(
        body,
        json!({
            "success": true,
            "data": [{"name": "Ana", "age": 30, "id": 1}],
            "message": "OK",
            "total": 3
        })
    );
}

#[tokio::test]
async fn test_grid_invalid_callback_ignored() {
    let response = server()
        .get("/grid/people/person")
        .add_query_param("callback", "alert(1)")
        .await;

    let body: Value = serde_json::from_str(&response.text()).unwrap();
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_grid_debug_content_type() {
    let mut config = GatewayConfig::default();
    config.grid = config.grid.with_debug(true);
    let response = server_with(config).get("/grid/people/person").await;
    assert_eq!(response.header("content-type"), "text/plain; charset=utf-8");
}

#[tokio::test]
async fn test_grid_unknown_resource() {
    let response = server().get("/grid/people/robot").await;
    response.assert_status_ok();
    let body: Value = serde_json::from_str(&response.text()).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "people.robot did not match any resource");
}

#[tokio::test]
async fn test_fixture_file_roundtrip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FIXTURE.as_bytes()).unwrap();

    let registry = build_registry(&load_fixtures(file.path()).unwrap()).unwrap();
    let server =
        TestServer::new(create_router(AppState::new(registry, GatewayConfig::default()))).unwrap();

    let response = server
        .get("/datatable/people/person")
        .add_query_param("sEcho", "1")
        .add_query_param("sColumns", "name")
        .await;
    let body: Value = response.json();
    assert_eq!(body["iTotalRecords"], 3);
}
