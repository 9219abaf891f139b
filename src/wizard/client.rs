// wizard/client.rs - The four enrollment actions as seen from the client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::WizardError;
use crate::baas::Identity;
use crate::models::{
    CreatedRider, DocumentBundle, DocumentCategory, DocumentRecord, FinanceForm, FinanceRecord, PersonalInfoForm,
    PersonalInfoRecord, RiderId, RiderRecord, SecurityInfoForm, SecurityInfoRecord,
};
use crate::validation::Issue;

/// Backend the wizard drives, one call per step plus the read-back
#[async_trait]
pub trait EnrollmentClient: Send + Sync {
    async fn submit_personal(&self, form: &PersonalInfoForm) -> Result<CreatedRider, WizardError>;
    async fn submit_security(&self, rider_id: RiderId, form: &SecurityInfoForm)
        -> Result<SecurityInfoRecord, WizardError>;
    async fn submit_documents(&self, rider_id: RiderId, bundle: &DocumentBundle)
        -> Result<DocumentRecord, WizardError>;
    async fn submit_finance(&self, rider_id: RiderId, form: &FinanceForm) -> Result<FinanceRecord, WizardError>;
    async fn fetch_rider(&self, rider_id: RiderId) -> Result<RiderRecord, WizardError>;
}

/// `{ success, data }` or `{ success, error, code, issues }`
#[derive(Debug, Deserialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub code: Option<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl<T> ActionResponse<T> {
    pub fn into_result(self) -> Result<T, WizardError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(WizardError::Transport("response carried no data".to_string())),
            (false, _) => Err(WizardError::Rejected {
                error: self
                    .error
                    .or(self.code)
                    .unwrap_or_else(|| "Request failed".to_string()),
                issues: self.issues,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSession {
    pub access_token: String,
    pub expires_in: i64,
    pub user: Identity,
}

/// HTTP implementation against the admin API
#[derive(Debug, Clone)]
pub struct HttpEnrollmentClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpEnrollmentClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, WizardError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: ActionResponse<T> = serde_json::from_str(&body).map_err(|e| {
            WizardError::Transport(format!("unexpected response ({}): {}", status, e))
        })?;
        envelope.into_result()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, WizardError> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        self.send(request).await
    }

    pub async fn logout(&self) -> Result<Value, WizardError> {
        self.send(self.client.post(self.url("/api/auth/logout"))).await
    }

    pub async fn whoami(&self) -> Result<Value, WizardError> {
        self.send(self.client.get(self.url("/api/auth/whoami"))).await
    }

    pub async fn list_riders(&self) -> Result<Vec<PersonalInfoRecord>, WizardError> {
        self.send(self.client.get(self.url("/api/riders"))).await
    }
}

fn document_form(bundle: &DocumentBundle) -> Result<Form, WizardError> {
    let mut form = Form::new();
    for category in DocumentCategory::ALL {
        for file in bundle.group(category) {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)?;
            form = form.part(category.as_str(), part);
        }
    }
    Ok(form)
}

#[async_trait]
impl EnrollmentClient for HttpEnrollmentClient {
    async fn submit_personal(&self, form: &PersonalInfoForm) -> Result<CreatedRider, WizardError> {
        let request = self.client.post(self.url("/api/enrollment/personal")).json(form);
        self.send(request).await
    }

    async fn submit_security(
        &self,
        rider_id: RiderId,
        form: &SecurityInfoForm,
    ) -> Result<SecurityInfoRecord, WizardError> {
        let path = format!("/api/enrollment/{}/security", rider_id);
        self.send(self.client.post(self.url(&path)).json(form)).await
    }

    async fn submit_documents(&self, rider_id: RiderId, bundle: &DocumentBundle) -> Result<DocumentRecord, WizardError> {
        let path = format!("/api/enrollment/{}/documents", rider_id);
        let form = document_form(bundle)?;
        self.send(self.client.post(self.url(&path)).multipart(form)).await
    }

    async fn submit_finance(&self, rider_id: RiderId, form: &FinanceForm) -> Result<FinanceRecord, WizardError> {
        let path = format!("/api/enrollment/{}/finance", rider_id);
        self.send(self.client.post(self.url(&path)).json(form)).await
    }

    async fn fetch_rider(&self, rider_id: RiderId) -> Result<RiderRecord, WizardError> {
        let path = format!("/api/riders/{}", rider_id);
        self.send(self.client.get(self.url(&path))).await
    }
}
