mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{date_from_today, document_form, finance_form, personal_form, security_form, TestServer, BUCKET};

const PERSONAL: &str = "rider_personal_info";
const SECURITY: &str = "rider_security_info";
const DOCUMENTS: &str = "rider_documents";
const FINANCE: &str = "rider_finance";
const USERS: &str = "users";

fn issue_fields(body: &Value) -> Vec<String> {
    body["issues"]
        .as_array()
        .map(|issues| {
            issues
                .iter()
                .filter_map(|issue| issue["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn invalid_personal_form_never_reaches_the_backend() -> Result<()> {
    let server = TestServer::start().await?;
    let users_before = server.memory.user_count().await;

    let mut form = personal_form("not-an-email");
    form["first_name"] = json!("   ");
    form["phone_number"] = json!("12");

    let res = server.post("/api/enrollment/personal").json(&form).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields = issue_fields(&body);
    for field in ["first_name", "email", "phone_number"] {
        assert!(fields.iter().any(|f| f == field), "missing issue for {}", field);
    }

    assert_eq!(server.memory.user_count().await, users_before);
    assert!(server.memory.rows(PERSONAL).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_in_users_is_refused() -> Result<()> {
    let server = TestServer::start().await?;
    server
        .memory
        .seed_row(USERS, json!({ "id": "7b0e1c1e-0000-4000-8000-000000000001", "email": "kofi@example.com" }))
        .await;
    let users_before = server.memory.user_count().await;

    let res = server
        .post("/api/enrollment/personal")
        .json(&personal_form("kofi@example.com"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(server.memory.user_count().await, users_before);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_in_personal_records_is_refused() -> Result<()> {
    let server = TestServer::start().await?;
    server.enroll_personal("ama@example.com").await?;
    let users_before = server.memory.user_count().await;

    let res = server
        .post("/api/enrollment/personal")
        .json(&personal_form("AMA@example.com"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(server.memory.user_count().await, users_before);
    assert_eq!(server.memory.rows(PERSONAL).await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn identity_creation_failure_is_reported_verbatim() -> Result<()> {
    let server = TestServer::start().await?;
    server.memory.fail_user_creation("Password should be at least 6 characters").await;

    let res = server
        .post("/api/enrollment/personal")
        .json(&personal_form("esi@example.com"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let body: Value = res.json().await?;
    assert!(body["error"].as_str().unwrap().contains("Password should be at least 6 characters"));
    assert!(server.memory.rows(PERSONAL).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_personal_insert_removes_the_identity() -> Result<()> {
    let server = TestServer::start().await?;
    let users_before = server.memory.user_count().await;
    server.memory.fail_writes_to(PERSONAL).await;

    let res = server
        .post("/api/enrollment/personal")
        .json(&personal_form("yaw@example.com"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Failed to save rider information");
    assert_eq!(server.memory.user_count().await, users_before);
    assert!(server.memory.rows(USERS).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn identity_cleanup_retries_until_it_succeeds() -> Result<()> {
    let server = TestServer::start().await?;
    let users_before = server.memory.user_count().await;
    server.memory.fail_writes_to(PERSONAL).await;
    server.memory.fail_next_user_deletes(2).await;

    let res = server
        .post("/api/enrollment/personal")
        .json(&personal_form("abena@example.com"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(server.memory.user_count().await, users_before);
    Ok(())
}

#[tokio::test]
async fn insurance_must_expire_after_today() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("kojo@example.com").await?;
    let path = format!("/api/enrollment/{}/security", rider_id);

    for days in [0, -1] {
        let res = server.post(&path).json(&security_form(&date_from_today(days))).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body: Value = res.json().await?;
        assert_eq!(issue_fields(&body), vec!["insurance_expiration_date".to_string()]);
    }
    assert!(server.memory.rows(SECURITY).await.is_empty());

    let res = server.post(&path).json(&security_form(&date_from_today(1))).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn documents_require_authentication() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("akosua@example.com").await?;

    let res = server
        .client
        .post(server.url(&format!("/api/enrollment/{}/documents", rider_id)))
        .multipart(document_form())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(server.memory.object_paths(BUCKET).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn documents_are_stored_under_deterministic_paths() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("efua@example.com").await?;

    let res = server
        .post(&format!("/api/enrollment/{}/documents", rider_id))
        .multipart(document_form())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["identity_card_urls"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["drivers_license_urls"].as_array().unwrap().len(), 1);

    let paths = server.memory.object_paths(BUCKET).await;
    assert_eq!(paths.len(), 4);
    assert!(paths.contains(&format!("identity_card/{0}/identity_card-{0}-1.png", rider_id)));
    assert!(paths.contains(&format!("insurance_proof/{0}/insurance_proof-{0}-0.pdf", rider_id)));
    Ok(())
}

#[tokio::test]
async fn missing_document_group_is_a_validation_error() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("kwesi@example.com").await?;

    let form = reqwest::multipart::Form::new().part(
        "identity_card",
        reqwest::multipart::Part::bytes(b"front".to_vec()).file_name("front.png"),
    );
    let res = server
        .post(&format!("/api/enrollment/{}/documents", rider_id))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(
        issue_fields(&body),
        vec!["drivers_license".to_string(), "insurance_proof".to_string()]
    );
    assert!(server.memory.object_paths(BUCKET).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_document_insert_removes_every_upload() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("adjoa@example.com").await?;
    server.memory.fail_writes_to(DOCUMENTS).await;

    let res = server
        .post(&format!("/api/enrollment/{}/documents", rider_id))
        .multipart(document_form())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Failed to save documents");
    assert!(server.memory.object_paths(BUCKET).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_upload_removes_the_files_that_made_it() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("nana@example.com").await?;
    server.memory.fail_uploads_matching("insurance_proof/").await;

    let res = server
        .post(&format!("/api/enrollment/{}/documents", rider_id))
        .multipart(document_form())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Failed to upload documents");
    assert!(server.memory.object_paths(BUCKET).await.is_empty());
    assert!(server.memory.rows(DOCUMENTS).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn finance_is_upserted_per_rider() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("kwabena@example.com").await?;
    let path = format!("/api/enrollment/{}/finance", rider_id);

    let res = server.post(&path).json(&finance_form("mtn", "0241234567")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.post(&path).json(&finance_form("telecel", "0501234567")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let rows = server.memory.rows(FINANCE).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["service_provider"], "telecel");
    assert_eq!(rows[0]["mobile_money_number"], "0501234567");
    Ok(())
}

#[tokio::test]
async fn unknown_provider_is_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("afia@example.com").await?;

    let res = server
        .post(&format!("/api/enrollment/{}/finance", rider_id))
        .json(&finance_form("vodafone", "0241234567"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(issue_fields(&body), vec!["service_provider".to_string()]);
    assert!(server.memory.rows(FINANCE).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn numeric_mobile_money_number_is_a_field_issue() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("yaw@example.com").await?;

    let res = server
        .post(&format!("/api/enrollment/{}/finance", rider_id))
        .json(&json!({ "service_provider": "mtn", "mobile_money_number": 241234567 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(issue_fields(&body), vec!["mobile_money_number".to_string()]);
    assert!(server.memory.rows(FINANCE).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn full_enrollment_links_every_record_to_one_rider() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .post("/api/enrollment/personal")
        .json(&personal_form("kwame@example.com"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let rider_id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["email"], "kwame@example.com");

    let res = server
        .post(&format!("/api/enrollment/{}/security", rider_id))
        .json(&security_form(&date_from_today(365)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server
        .post(&format!("/api/enrollment/{}/documents", rider_id))
        .multipart(document_form())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server
        .post(&format!("/api/enrollment/{}/finance", rider_id))
        .json(&finance_form("airteltigo", "0271234567"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.get(&format!("/api/riders/{}", rider_id)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let rider: Value = res.json().await?;
    let data = &rider["data"];
    assert_eq!(data["id"], rider_id.as_str());
    for section in ["personal", "security", "documents", "finance"] {
        assert_eq!(data[section]["rider_id"], rider_id.as_str(), "{} is not linked", section);
    }

    for table in [PERSONAL, SECURITY, DOCUMENTS, FINANCE] {
        assert_eq!(server.memory.rows(table).await.len(), 1, "{} should hold one row", table);
    }

    let res = server.get("/api/audit-logs").send().await?;
    let audit: Value = res.json().await?;
    let actions: Vec<&str> = audit["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|entry| entry["action"].as_str())
        .collect();
    for action in ["rider.create", "rider.security.create", "rider.documents.create", "rider.finance.upsert"] {
        assert!(actions.contains(&action), "missing audit entry {}", action);
    }
    Ok(())
}

#[tokio::test]
async fn steps_reject_malformed_rider_ids() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .post("/api/enrollment/not-a-uuid/finance")
        .json(&finance_form("mtn", "0241234567"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_rider_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .get("/api/riders/3f2a1b4c-5d6e-4f70-8a9b-0c1d2e3f4a5b")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn edit_path_updates_in_place_and_keeps_email() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("serwaa@example.com").await?;

    let mut form = personal_form("serwaa@example.com");
    form["city"] = json!("Kumasi");
    let res = server
        .put(&format!("/api/riders/{}/personal", rider_id))
        .json(&form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["city"], "Kumasi");

    form["email"] = json!("someone-else@example.com");
    let res = server
        .put(&format!("/api/riders/{}/personal", rider_id))
        .json(&form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(issue_fields(&body), vec!["email".to_string()]);

    let rows = server.memory.rows(PERSONAL).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["city"], "Kumasi");
    assert_eq!(rows[0]["email"], "serwaa@example.com");
    Ok(())
}

#[tokio::test]
async fn security_edit_requires_an_existing_record() -> Result<()> {
    let server = TestServer::start().await?;
    let rider_id = server.enroll_personal("yaa@example.com").await?;
    let path = format!("/api/riders/{}/security", rider_id);

    let res = server.put(&path).json(&security_form(&date_from_today(30))).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server
        .post(&format!("/api/enrollment/{}/security", rider_id))
        .json(&security_form(&date_from_today(30)))
        .send()
        .await?;

    let mut form = security_form(&date_from_today(60));
    form["vehicle_colour"] = json!("Blue");
    let res = server.put(&path).json(&form).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let rows = server.memory.rows(SECURITY).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["vehicle_colour"], "Blue");
    Ok(())
}

#[tokio::test]
async fn rider_list_shows_personal_records() -> Result<()> {
    let server = TestServer::start().await?;
    server.enroll_personal("first@example.com").await?;
    server.enroll_personal("second@example.com").await?;

    let res = server.get("/api/riders").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    Ok(())
}
