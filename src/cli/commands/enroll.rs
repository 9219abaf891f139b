use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::authenticated_client;
use crate::cli::config::get_sessions_dir;
use crate::cli::utils::{output_record, output_success, output_wizard_error};
use crate::cli::OutputFormat;
use crate::models::{
    DocumentBundle, DocumentCategory, FinanceForm, PersonalInfoForm, SecurityInfoForm, UploadFile,
};
use crate::wizard::{FileSessionStore, HttpEnrollmentClient, SessionStore, WizardController};

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    #[arg(long, default_value = "default", help = "Wizard session key")]
    pub session: String,
}

#[derive(Subcommand)]
pub enum EnrollCommands {
    #[command(about = "Show the wizard position for a session")]
    Status {
        #[command(flatten)]
        session: SessionArgs,
    },

    #[command(about = "Step 1: create the rider from a personal-info JSON file")]
    Personal {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, help = "JSON file with the personal information form")]
        file: PathBuf,
    },

    #[command(about = "Step 2: vehicle, license, insurance and witness details")]
    Security {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, help = "JSON file with the security information form")]
        file: PathBuf,
    },

    #[command(about = "Step 3: upload identity card, driver's license and insurance proof")]
    Documents {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, required = true, help = "Identity card image or PDF (repeatable)")]
        identity_card: Vec<PathBuf>,
        #[arg(long, required = true, help = "Driver's license image or PDF (repeatable)")]
        drivers_license: Vec<PathBuf>,
        #[arg(long, required = true, help = "Insurance proof image or PDF (repeatable)")]
        insurance_proof: Vec<PathBuf>,
    },

    #[command(about = "Step 4: mobile money payout details")]
    Finance {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, help = "Service provider: mtn, telecel or airteltigo")]
        provider: String,
        #[arg(long, help = "Mobile money number")]
        number: String,
    },

    #[command(about = "Forget the rider attached to a session")]
    Reset {
        #[command(flatten)]
        session: SessionArgs,
    },
}

type CliWizard = WizardController<HttpEnrollmentClient, FileSessionStore>;

fn wizard(session: &SessionArgs) -> anyhow::Result<CliWizard> {
    let client = authenticated_client()?;
    let store = FileSessionStore::new(get_sessions_dir()?);
    Ok(WizardController::new(client, store, session.session.clone()))
}

fn read_form<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path.display(), e))
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let bytes = fs::read(path).map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document")
        .to_string();
    Ok(UploadFile::new(file_name, content_type_for(path), bytes))
}

fn read_bundle(groups: [(DocumentCategory, &[PathBuf]); 3]) -> anyhow::Result<DocumentBundle> {
    let mut bundle = DocumentBundle::default();
    for (category, paths) in groups {
        for path in paths {
            bundle.push(category, read_upload(path)?);
        }
    }
    Ok(bundle)
}

/// Rebuild the wizard from the session before a step that needs it
async fn resumed(session: &SessionArgs, output_format: &OutputFormat) -> anyhow::Result<CliWizard> {
    let mut wizard = wizard(session)?;
    if let Err(e) = wizard.resume().await {
        output_wizard_error(output_format, e)?;
    }
    Ok(wizard)
}

fn progress(wizard: &CliWizard) -> serde_json::Value {
    let state = wizard.state();
    json!({
        "session": wizard.session_key(),
        "rider_id": state.rider_id(),
        "current_step": state.current_step(),
        "completed_steps": state.completed_steps(),
        "finished": state.is_finished(),
    })
}

pub async fn handle(cmd: EnrollCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        EnrollCommands::Status { session } => {
            let wizard = resumed(&session, &output_format).await?;
            output_record(&output_format, &format!("Session '{}'", session.session), &progress(&wizard))
        }
        EnrollCommands::Personal { session, file } => {
            let form: PersonalInfoForm = read_form(&file)?;
            let mut wizard = wizard(&session)?;

            match wizard.submit_personal(&form).await {
                Ok(created) => output_success(
                    &output_format,
                    &format!("Rider {} created ({}); next step: security", created.id, created.email),
                    Some(progress(&wizard)),
                ),
                Err(e) => output_wizard_error(&output_format, e),
            }
        }
        EnrollCommands::Security { session, file } => {
            let form: SecurityInfoForm = read_form(&file)?;
            let mut wizard = resumed(&session, &output_format).await?;

            match wizard.submit_security(&form).await {
                Ok(_) => output_success(&output_format, "Security information saved", Some(progress(&wizard))),
                Err(e) => output_wizard_error(&output_format, e),
            }
        }
        EnrollCommands::Documents {
            session,
            identity_card,
            drivers_license,
            insurance_proof,
        } => {
            let bundle = read_bundle([
                (DocumentCategory::IdentityCard, identity_card.as_slice()),
                (DocumentCategory::DriversLicense, drivers_license.as_slice()),
                (DocumentCategory::InsuranceProof, insurance_proof.as_slice()),
            ])?;
            let mut wizard = resumed(&session, &output_format).await?;

            match wizard.submit_documents(&bundle).await {
                Ok(record) => output_success(
                    &output_format,
                    &format!("{} documents uploaded", bundle.file_count()),
                    Some(json!({ "documents": record, "progress": progress(&wizard) })),
                ),
                Err(e) => output_wizard_error(&output_format, e),
            }
        }
        EnrollCommands::Finance {
            session,
            provider,
            number,
        } => {
            let form = FinanceForm {
                service_provider: provider,
                mobile_money_number: number,
            };
            let mut wizard = resumed(&session, &output_format).await?;

            match wizard.submit_finance(&form).await {
                Ok(_) => output_success(&output_format, "Finance information saved", Some(progress(&wizard))),
                Err(e) => output_wizard_error(&output_format, e),
            }
        }
        EnrollCommands::Reset { session } => {
            let store = FileSessionStore::new(get_sessions_dir()?);

            match store.clear(&session.session) {
                Ok(()) => output_success(&output_format, &format!("Session '{}' cleared", session.session), None),
                Err(e) => output_wizard_error(&output_format, e),
            }
        }
    }
}
