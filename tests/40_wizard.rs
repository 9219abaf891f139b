mod common;

use anyhow::Result;
use bytes::Bytes;

use common::{date_from_today, TestServer, STAFF_EMAIL, STAFF_PASSWORD};
use pragxi_admin_api::models::{
    DocumentBundle, DocumentCategory, FinanceForm, PersonalInfoForm, SecurityInfoForm, UploadFile,
};
use pragxi_admin_api::wizard::{
    EnrollmentClient, FileSessionStore, HttpEnrollmentClient, SessionStore, Step, WizardController, WizardError,
};

fn personal(email: &str) -> Result<PersonalInfoForm> {
    Ok(serde_json::from_value(common::personal_form(email))?)
}

fn security() -> Result<SecurityInfoForm> {
    Ok(serde_json::from_value(common::security_form(&date_from_today(365)))?)
}

fn documents() -> DocumentBundle {
    let mut bundle = DocumentBundle::default();
    for category in DocumentCategory::ALL {
        bundle.push(
            category,
            UploadFile::new(format!("{}.png", category), "image/png", Bytes::from_static(b"scan")),
        );
    }
    bundle
}

fn finance() -> FinanceForm {
    FinanceForm {
        service_provider: "mtn".to_string(),
        mobile_money_number: "0241234567".to_string(),
    }
}

fn client(server: &TestServer) -> HttpEnrollmentClient {
    HttpEnrollmentClient::new(server.base_url.clone(), Some(server.token.clone()))
}

#[tokio::test]
async fn http_client_logs_in_as_staff() -> Result<()> {
    let server = TestServer::start().await?;
    let anonymous = HttpEnrollmentClient::new(server.base_url.clone(), None);

    let session = anonymous.login(STAFF_EMAIL, STAFF_PASSWORD).await?;
    assert_eq!(session.user.email, STAFF_EMAIL);

    let err = anonymous.login(STAFF_EMAIL, "wrong").await.unwrap_err();
    assert!(matches!(err, WizardError::Rejected { .. }));
    Ok(())
}

#[tokio::test]
async fn wizard_enrolls_a_rider_end_to_end() -> Result<()> {
    let server = TestServer::start().await?;
    let dir = tempfile::tempdir()?;
    let mut wizard = WizardController::new(client(&server), FileSessionStore::new(dir.path()), "desk-1");

    let created = wizard.submit_personal(&personal("kwame@example.com")?).await?;
    assert_eq!(wizard.state().current_step(), Step::Security);
    assert_eq!(wizard.rider().map(|r| r.id), Some(created.id));

    wizard.submit_security(&security()?).await?;
    wizard.submit_documents(&documents()).await?;
    wizard.submit_finance(&finance()).await?;
    assert!(wizard.state().is_finished());

    let record = client(&server).fetch_rider(created.id).await?;
    assert!(record.personal.is_some());
    assert!(record.security.is_some());
    assert_eq!(record.documents.map(|d| d.identity_card_urls.len()), Some(1));
    assert!(record.finance.is_some());
    Ok(())
}

#[tokio::test]
async fn rejected_personal_step_keeps_issues() -> Result<()> {
    let server = TestServer::start().await?;
    let mut wizard = WizardController::new(
        client(&server),
        pragxi_admin_api::wizard::MemorySessionStore::new(),
        "desk-1",
    );

    let err = wizard.submit_personal(&personal("not-an-email")?).await.unwrap_err();
    match err {
        WizardError::Rejected { issues, .. } => assert!(issues.iter().any(|i| i.field == "email")),
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(wizard.state().current_step(), Step::Personal);
    assert!(wizard.store().load("desk-1")?.is_none());
    Ok(())
}

#[tokio::test]
async fn new_process_resumes_from_the_session_file() -> Result<()> {
    let server = TestServer::start().await?;
    let dir = tempfile::tempdir()?;

    let created = {
        let mut wizard = WizardController::new(client(&server), FileSessionStore::new(dir.path()), "desk-1");
        let created = wizard.submit_personal(&personal("ama@example.com")?).await?;
        wizard.submit_security(&security()?).await?;
        created
    };

    let mut resumed = WizardController::new(client(&server), FileSessionStore::new(dir.path()), "desk-1");
    let state = resumed.resume().await?;
    assert_eq!(state.current_step(), Step::Documents);
    assert_eq!(state.rider_id(), Some(created.id));

    // Finance stays locked until documents are in
    let err = resumed.submit_finance(&finance()).await.unwrap_err();
    assert!(matches!(err, WizardError::StepLocked(Step::Finance)));

    resumed.submit_documents(&documents()).await?;
    resumed.submit_finance(&finance()).await?;
    assert!(resumed.state().is_finished());

    // Another session key starts from scratch
    let mut other = WizardController::new(client(&server), FileSessionStore::new(dir.path()), "desk-2");
    assert_eq!(other.resume().await?.current_step(), Step::Personal);
    Ok(())
}

#[tokio::test]
async fn fetch_failure_after_create_leaves_wizard_on_personal() -> Result<()> {
    let server = TestServer::start().await?;
    server.memory.fail_reads_from("rider_security_info").await;
    let mut wizard = WizardController::new(
        client(&server),
        pragxi_admin_api::wizard::MemorySessionStore::new(),
        "desk-1",
    );

    let err = wizard.submit_personal(&personal("kofi@example.com")?).await.unwrap_err();
    assert!(matches!(err, WizardError::RiderFetch { .. }));
    assert_eq!(wizard.state().current_step(), Step::Personal);
    assert!(!wizard.state().can_continue(Step::Personal));
    assert!(wizard.rider().is_none());

    // The rider exists on the server; the wizard did not retry on its own
    assert_eq!(server.memory.rows("rider_personal_info").await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn reset_forgets_the_session_rider() -> Result<()> {
    let server = TestServer::start().await?;
    let dir = tempfile::tempdir()?;
    let mut wizard = WizardController::new(client(&server), FileSessionStore::new(dir.path()), "desk-1");
    wizard.submit_personal(&personal("esi@example.com")?).await?;

    wizard.reset()?;
    assert!(wizard.store().load("desk-1")?.is_none());
    assert!(matches!(
        wizard.submit_security(&security()?).await,
        Err(WizardError::StepLocked(Step::Security))
    ));
    Ok(())
}
