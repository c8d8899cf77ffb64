mod support;

use axum::http::StatusCode;
use medicine_service::MedicineStore;
use serde_json::json;
use support::{bearer, get_request, json_request, medicine_json, TestApp};

#[tokio::test]
async fn list_with_empty_authorization_is_bad_request() {
    let app = TestApp::in_memory();
    let (status, body) = app.send(get_request("/api/medicine/GetAllMedicines", Some("   "))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Authorization header is missing.");
    assert_eq!(body["code"], "missing_authorization");
}

#[tokio::test]
async fn list_only_needs_a_header_and_includes_deleted_rows() {
    let app = TestApp::in_memory();
    let first = app.seed("Aspirin", 10).await;
    let second = app.seed("Paracetamol", 4).await;
    let (status, _) = app
        .send(json_request("PUT", &format!("/api/medicine/DeleteMedicine/{first}"), Some(&bearer("Admin")), json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Token is not decoded for listing.
    let (status, body) = app.send(get_request("/api/medicine/GetAllMedicines", Some("Bearer not-a-jwt"))).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], first);
    assert_eq!(rows[0]["status"], 0);
    assert_eq!(rows[1]["id"], second);
    assert_eq!(rows[1]["unitPrice"], "12.50");
}

#[tokio::test]
async fn missing_authorization_on_mutation_changes_nothing() {
    let app = TestApp::in_memory();
    let id = app.seed("Aspirin", 10).await;

    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CreateNewMedicine", None, medicine_json("Ibuprofen", 3)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Authorization header is missing.");

    let (status, _) = app
        .send(json_request("PUT", &format!("/api/medicine/UpdateMedicine/{id}"), None, medicine_json("Renamed", 1)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(json_request("POST", "/api/medicine/CompleteSale", None, json!({"name": "Aspirin", "quantity": 1})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let rows = app.state.store.list().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Aspirin");
    assert_eq!(rows[0].quantity, 10);
}

#[tokio::test]
async fn non_admin_cannot_write_catalog() {
    let app = TestApp::in_memory();
    let id = app.seed("Aspirin", 10).await;
    let sales = bearer("Sales");

    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CreateNewMedicine", Some(&sales), medicine_json("Ibuprofen", 3)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "You do not have permission to perform this action.");

    let (status, _) = app
        .send(json_request("PUT", &format!("/api/medicine/UpdateMedicine/{id}"), Some(&sales), medicine_json("Renamed", 1)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(json_request("PUT", &format!("/api/medicine/DeleteMedicine/{id}"), Some(&sales), json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let row = app.state.store.get(id).await.unwrap().unwrap();
    assert_eq!(row.name, "Aspirin");
    assert_eq!(row.status, 1);
    assert_eq!(app.state.store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn bad_tokens_are_unauthorized() {
    let app = TestApp::in_memory();
    for header in ["Bearer", "Bearer garbage.token.value", "Token"] {
        let (status, body) = app
            .send(json_request("POST", "/api/medicine/CreateNewMedicine", Some(header), medicine_json("X", 1)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {header:?}");
        assert_eq!(body["code"], "unauthorized");
    }
}

#[tokio::test]
async fn lowercase_role_names_are_accepted() {
    let app = TestApp::in_memory();
    let (status, _) = app
        .send(json_request("POST", "/api/medicine/CreateNewMedicine", Some(&bearer("admin")), medicine_json("Zinc", 2)))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_forces_active_status_and_store_id() {
    let app = TestApp::in_memory();
    let mut payload = medicine_json("Aspirin", 10);
    payload["id"] = json!(500);
    payload["status"] = json!(0);
    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CreateNewMedicine", Some(&bearer("Admin")), payload))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["status"], 1);
    assert_eq!(body["expDate"], "2027-05-31");
    assert_eq!(app.state.store.get(1).await.unwrap().unwrap().status, 1);
}

#[tokio::test]
async fn create_rejects_invalid_bodies() {
    let app = TestApp::in_memory();
    let admin = bearer("Admin");

    let mut blank = medicine_json("  ", 1);
    blank["name"] = json!("  ");
    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CreateNewMedicine", Some(&admin), blank))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_medicine");

    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CreateNewMedicine", Some(&admin), json!({"name": "NoPrice"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_body");

    assert!(app.state.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_overwrites_fields_but_not_status() {
    let app = TestApp::in_memory();
    let id = app.seed("Aspirin", 10).await;
    let mut payload = medicine_json("Aspirin 500mg", 25);
    payload["status"] = json!(0);
    payload["discount"] = json!("1.25");

    let (status, body) = app
        .send(json_request("PUT", &format!("/api/medicine/UpdateMedicine/{id}"), Some(&bearer("Admin")), payload))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Medicine updated successfully.");
    assert_eq!(body["medicine"]["name"], "Aspirin 500mg");
    assert_eq!(body["medicine"]["quantity"], 25);
    assert_eq!(body["medicine"]["discount"], "1.25");
    assert_eq!(body["medicine"]["status"], 1);
}

#[tokio::test]
async fn update_unknown_id_is_not_found_and_changes_nothing() {
    let app = TestApp::in_memory();
    app.seed("Aspirin", 10).await;
    let before = app.state.store.list().await.unwrap();

    let (status, body) = app
        .send(json_request("PUT", "/api/medicine/UpdateMedicine/999", Some(&bearer("Admin")), medicine_json("Ghost", 1)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Medicine not found.");
    assert_eq!(app.state.store.list().await.unwrap(), before);
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
    let app = TestApp::in_memory();
    let (status, body) = app
        .send(json_request("PUT", "/api/medicine/DeleteMedicine/abc", Some(&bearer("Admin")), json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_path");
}

#[tokio::test]
async fn delete_only_flips_status() {
    let app = TestApp::in_memory();
    let id = app.seed("Aspirin", 10).await;
    let before = app.state.store.get(id).await.unwrap().unwrap();

    let (status, body) = app
        .send(json_request("PUT", &format!("/api/medicine/DeleteMedicine/{id}"), Some(&bearer("Admin")), json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Medicine deleted successfully.");
    assert_eq!(body["medicine"]["status"], 0);

    let after = app.state.store.get(id).await.unwrap().expect("row is kept");
    assert_eq!(after.status, 0);
    assert_eq!(after.name, before.name);
    assert_eq!(after.quantity, before.quantity);
    assert_eq!(after.unit_price, before.unit_price);

    let (status, _) = app
        .send(json_request("PUT", "/api/medicine/DeleteMedicine/77", Some(&bearer("Admin")), json!({})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sale_decrements_stock_and_counts_units() {
    let app = TestApp::in_memory();
    let id = app.seed("Aspirin", 10).await;

    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CompleteSale", Some(&bearer("Sales")), json!({"name": "Aspirin", "quantity": 3})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sale completed successfully.");
    assert_eq!(body["medicine"]["quantity"], 7);
    assert_eq!(app.state.store.get(id).await.unwrap().unwrap().quantity, 7);
    assert_eq!(app.state.metrics.medicine_sales_total.value(&["Aspirin"]), 3);
}

#[tokio::test]
async fn sale_beyond_stock_is_rejected_and_stock_kept() {
    let app = TestApp::in_memory();
    let id = app.seed("Aspirin", 10).await;

    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CompleteSale", Some(&bearer("Admin")), json!({"name": "Aspirin", "quantity": 12})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "insufficient_stock");
    assert_eq!(body["message"], "Not enough stock available.");
    assert_eq!(app.state.store.get(id).await.unwrap().unwrap().quantity, 10);
    assert_eq!(app.state.metrics.medicine_sales_total.value(&["Aspirin"]), 0);
}

#[tokio::test]
async fn sale_edge_cases() {
    let app = TestApp::in_memory();
    app.seed("Aspirin", 10).await;
    let sales = bearer("Sales");

    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CompleteSale", Some(&sales), json!({"name": "Aspirin", "quantity": 0})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_quantity");

    let (status, _) = app
        .send(json_request("POST", "/api/medicine/CompleteSale", Some(&sales), json!({"name": "Unknown", "quantity": 1})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(json_request("POST", "/api/medicine/CompleteSale", Some(&bearer("Viewer")), json!({"name": "Aspirin", "quantity": 1})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CompleteSale", Some(&sales), json!({"name": "Aspirin", "quantity": 10})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["medicine"]["quantity"], 0);
}

#[tokio::test]
async fn admin_can_complete_a_sale() {
    let app = TestApp::in_memory();
    let id = app.seed("Paracetamol", 8).await;

    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CompleteSale", Some(&bearer("Admin")), json!({"name": "Paracetamol", "quantity": 8})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sale completed successfully.");
    assert_eq!(body["medicine"]["id"], id);
    assert_eq!(body["medicine"]["quantity"], 0);
    assert_eq!(app.state.store.get(id).await.unwrap().unwrap().quantity, 0);
    assert_eq!(app.state.metrics.medicine_sales_total.value(&["Paracetamol"]), 8);
}

#[tokio::test]
async fn token_repeating_the_role_under_several_keys_is_accepted() {
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    let app = TestApp::in_memory();
    let claims = json!({
        "sub": "tester",
        "role": "Admin",
        "roles": ["Admin"],
        "exp": Utc::now().timestamp() + 600,
    });
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(support::SECRET)).unwrap();
    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CreateNewMedicine", Some(&format!("Bearer {token}")), medicine_json("Zinc", 4)))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Zinc");
}

#[tokio::test]
async fn amounts_beyond_two_decimal_places_are_rejected() {
    let app = TestApp::in_memory();
    let mut payload = medicine_json("Zinc", 4);
    payload["discount"] = json!("0.125");
    let (status, body) = app
        .send(json_request("POST", "/api/medicine/CreateNewMedicine", Some(&bearer("Admin")), payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_medicine");
    assert!(app.state.store.list().await.unwrap().is_empty());
}
