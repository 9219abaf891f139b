use futures::future::join_all;
use serde_json::json;
use tracing::{error, info, warn};

use super::EnrollmentService;
use crate::auth::StaffUser;
use crate::baas::decode;
use crate::models::{tables, DocumentBundle, DocumentCategory, DocumentRecord, RiderId};
use crate::services::audit::actions;
use crate::services::ActionError;

const UPLOAD_FAILED: &str = "Failed to upload documents";
const SAVE_FAILED: &str = "Failed to save documents";

struct UploadedFile {
    category: DocumentCategory,
    path: String,
}

impl EnrollmentService {
    /// Step 3: upload every file of the three groups, then write one record
    /// holding their public URLs.
    ///
    /// No partial state survives a failure: if any upload or the insert
    /// fails, every file uploaded in this attempt is removed again.
    pub async fn upload_documents(
        &self,
        actor: &StaffUser,
        rider_id: RiderId,
        bundle: &DocumentBundle,
    ) -> Result<DocumentRecord, ActionError> {
        bundle
            .validate(self.settings.max_file_bytes)
            .map_err(ActionError::Validation)?;

        let bucket = self.settings.bucket.as_str();
        let uploads = DocumentCategory::ALL.iter().flat_map(|category| {
            bundle
                .group(*category)
                .iter()
                .enumerate()
                .map(move |(index, file)| (*category, index, file))
        });
        let results = join_all(uploads.map(|(category, index, file)| async move {
            let path = category.object_path(&rider_id, index, &file.extension());
            self.baas
                .storage
                .upload(bucket, &path, file.bytes.clone(), &file.content_type, true)
                .await
                .map(|_| UploadedFile { category, path: path.clone() })
                .map_err(|e| (path, e))
        }))
        .await;

        let mut uploaded = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(file) => uploaded.push(file),
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            for (path, e) in &failures {
                error!("Upload of {} for rider {} failed: {}", path, rider_id, e);
            }
            self.remove_uploaded(&uploaded).await;
            return Err(ActionError::Upstream(UPLOAD_FAILED.to_string()));
        }

        let urls = |category: DocumentCategory| -> Vec<String> {
            uploaded
                .iter()
                .filter(|file| file.category == category)
                .map(|file| self.baas.storage.public_url(bucket, &file.path))
                .collect()
        };
        let record = DocumentRecord {
            rider_id,
            identity_card_urls: urls(DocumentCategory::IdentityCard),
            drivers_license_urls: urls(DocumentCategory::DriversLicense),
            insurance_proof_urls: urls(DocumentCategory::InsuranceProof),
            created_at: None,
        };

        let inserted = match serde_json::to_value(&record) {
            Ok(row) => self
                .baas
                .tables
                .insert(tables::DOCUMENTS, row)
                .await
                .and_then(decode::<DocumentRecord>)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        let saved = match inserted {
            Ok(saved) => saved,
            Err(e) => {
                error!("Document record insert for rider {} failed: {}", rider_id, e);
                self.remove_uploaded(&uploaded).await;
                return Err(ActionError::Upstream(SAVE_FAILED.to_string()));
            }
        };

        info!("Stored {} documents for rider {}", uploaded.len(), rider_id);
        self.audit
            .record(
                actor,
                actions::RIDER_DOCUMENTS_CREATE,
                &rider_id,
                json!({ "files": uploaded.len() }),
            )
            .await;

        Ok(saved)
    }

    async fn remove_uploaded(&self, uploaded: &[UploadedFile]) {
        if uploaded.is_empty() {
            return;
        }
        let paths: Vec<String> = uploaded.iter().map(|file| file.path.clone()).collect();
        let bucket = self.settings.bucket.as_str();
        let storage = &self.baas.storage;

        let removed = self
            .settings
            .retry
            .retry("remove uploaded documents", || storage.remove(bucket, &paths))
            .await;
        match removed {
            Ok(()) => info!("Removed {} uploaded documents", paths.len()),
            Err(e) => warn!("Orphaned documents left in {}: {:?} ({})", bucket, paths, e),
        }
    }
}
