//! Layout service client tests against a mocked server.

use gv_core::{ExportRequest, Header, Layout};
use gv_layout::{LayoutError, LayoutStore, NewLayout, RemoteExporter, RemoteLayoutStore, StoredLayout};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn stored(id: i64, name: &str) -> StoredLayout {
    StoredLayout {
        layout_id: id,
        table_id: "orders".into(),
        layout_name: name.into(),
        grid_layout_json: "{}".into(),
        is_public: false,
    }
}

#[tokio::test]
async fn test_get_layouts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/GridLayout/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"layoutID": 5, "tableID": "orders", "layoutName": "Wide", "gridLayoutJson": "{}", "isPublic": true},
            {"layoutID": 2, "tableID": "orders", "layoutName": "Default", "gridLayoutJson": "{}"}
        ])))
        .mount(&mock_server)
        .await;

    let store = RemoteLayoutStore::new(&mock_server.uri()).expect("Failed to build store");
    let layouts = store.get_layouts("orders").await.expect("Request failed");

    assert_eq!(layouts.len(), 2);
    assert_eq!(layouts[0].layout_name, "Default");
    assert_eq!(layouts[1].layout_id, 5);
    assert!(layouts[1].is_public);
}

#[tokio::test]
async fn test_add_layout() {
    let mock_server = MockServer::start().await;
    let layout = Layout::from_headers(vec![Header::new("id")]);
    let draft = NewLayout::new("orders", "Default", &layout).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/GridLayout"))
        .and(body_json(&draft))
        .respond_with(ResponseTemplate::new(201).set_body_json(draft.clone().into_stored(11)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = RemoteLayoutStore::new(&mock_server.uri()).unwrap();
    let created = store.add_layout(draft).await.expect("Request failed");
    assert_eq!(created.layout_id, 11);
    assert_eq!(created.layout(&[]).unwrap(), layout);
}

#[tokio::test]
async fn test_update_sends_new_body() {
    let mock_server = MockServer::start().await;
    let layout = Layout::from_headers(vec![Header::new("id"), Header::new("total")]);
    let mut expected = stored(3, "Default");
    expected.grid_layout_json = layout.to_json().unwrap();

    Mock::given(method("PUT"))
        .and(path("/api/GridLayout/3"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = RemoteLayoutStore::new(&mock_server.uri()).unwrap();
    let updated = store.update_layout(&stored(3, "Default"), &layout).await.unwrap();
    assert_eq!(updated, expected);
}

#[tokio::test]
async fn test_rename_conflict_maps_to_name_taken() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/GridLayout/3/name"))
        .and(body_json(json!({"layoutName": "Wide"})))
        .respond_with(ResponseTemplate::new(409))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/GridLayout/3/name"))
        .and(body_json(json!({"layoutName": "Narrow"})))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let store = RemoteLayoutStore::new(&mock_server.uri()).unwrap();
    let err = store.rename_layout(&stored(3, "Default"), "Wide").await.unwrap_err();
    assert!(matches!(err, LayoutError::NameTaken(ref name) if name == "Wide"));

    let renamed = store.rename_layout(&stored(3, "Default"), "Narrow").await.unwrap();
    assert_eq!(renamed.layout_name, "Narrow");
}

#[tokio::test]
async fn test_delete_and_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/GridLayout/3"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/GridLayout/4"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let store = RemoteLayoutStore::new(&mock_server.uri()).unwrap();
    store.delete_layout(&stored(3, "Default")).await.expect("Delete failed");

    let err = store.delete_layout(&stored(4, "Other")).await.unwrap_err();
    match err {
        LayoutError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_export_returns_file_bytes() {
    let mock_server = MockServer::start().await;

    let request = ExportRequest {
        name: "orders".into(),
        headers: vec![(&Header::new("id")).into()],
        rows: vec![json!({"id": 1}).as_object().cloned().unwrap()],
    };

    Mock::given(method("POST"))
        .and(path("/api/GridLayout/ExportExcelData"))
        .and(body_json(&request))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x50, 0x4b, 0x03, 0x04]))
        .mount(&mock_server)
        .await;

    let exporter = RemoteExporter::new(&mock_server.uri()).unwrap();
    let bytes = exporter.export(&request).await.expect("Export failed");
    assert_eq!(bytes, vec![0x50, 0x4b, 0x03, 0x04]);
}
