use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::RiderId;
use crate::validation::Issue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    IdentityCard,
    DriversLicense,
    InsuranceProof,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 3] = [
        DocumentCategory::IdentityCard,
        DocumentCategory::DriversLicense,
        DocumentCategory::InsuranceProof,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::IdentityCard => "identity_card",
            DocumentCategory::DriversLicense => "drivers_license",
            DocumentCategory::InsuranceProof => "insurance_proof",
        }
    }

    /// `{category}/{rider_id}/{category}-{rider_id}-{index}.{ext}`
    ///
    /// Deterministic so a re-submitted document overwrites the previous
    /// attempt in upsert mode.
    pub fn object_path(&self, rider_id: &RiderId, index: usize, extension: &str) -> String {
        format!(
            "{category}/{rider}/{category}-{rider}-{index}.{ext}",
            category = self.as_str(),
            rider = rider_id,
            index = index,
            ext = extension
        )
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity_card" => Ok(DocumentCategory::IdentityCard),
            "drivers_license" => Ok(DocumentCategory::DriversLicense),
            "insurance_proof" => Ok(DocumentCategory::InsuranceProof),
            other => Err(format!("unknown document category '{}'", other)),
        }
    }
}

/// One file received from the client
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Extension taken from the file name, then the content type
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
        if let Some(ext) = from_name {
            return ext;
        }

        match self.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "application/pdf" => "pdf",
            _ => "bin",
        }
        .to_string()
    }
}

/// The three file groups submitted at step 3
#[derive(Debug, Clone, Default)]
pub struct DocumentBundle {
    pub identity_card: Vec<UploadFile>,
    pub drivers_license: Vec<UploadFile>,
    pub insurance_proof: Vec<UploadFile>,
}

impl DocumentBundle {
    pub fn group(&self, category: DocumentCategory) -> &[UploadFile] {
        match category {
            DocumentCategory::IdentityCard => &self.identity_card,
            DocumentCategory::DriversLicense => &self.drivers_license,
            DocumentCategory::InsuranceProof => &self.insurance_proof,
        }
    }

    pub fn push(&mut self, category: DocumentCategory, file: UploadFile) {
        match category {
            DocumentCategory::IdentityCard => self.identity_card.push(file),
            DocumentCategory::DriversLicense => self.drivers_license.push(file),
            DocumentCategory::InsuranceProof => self.insurance_proof.push(file),
        }
    }

    pub fn file_count(&self) -> usize {
        self.identity_card.len() + self.drivers_license.len() + self.insurance_proof.len()
    }

    pub fn validate(&self, max_file_bytes: usize) -> Result<(), Vec<Issue>> {
        let mut issues = Vec::new();
        for category in DocumentCategory::ALL {
            let files = self.group(category);
            if files.is_empty() {
                issues.push(Issue::new(category.as_str(), "At least one file is required"));
                continue;
            }
            for file in files {
                if file.bytes.is_empty() {
                    issues.push(Issue::new(category.as_str(), format!("{} is empty", file.file_name)));
                } else if file.bytes.len() > max_file_bytes {
                    issues.push(Issue::new(
                        category.as_str(),
                        format!("{} exceeds the {} byte limit", file.file_name, max_file_bytes),
                    ));
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Row of `rider_documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub rider_id: RiderId,
    pub identity_card_urls: Vec<String>,
    pub drivers_license_urls: Vec<String>,
    pub insurance_proof_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
