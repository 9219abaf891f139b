use axum::{
    extract::{Multipart, Path, State},
    Extension,
};
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::protected::parse_rider_id;
use crate::middleware::{ApiResponse, ApiResult, StaffUser};
use crate::models::{DocumentBundle, DocumentCategory, DocumentRecord, UploadFile};

/// POST /api/enrollment/:rider_id/documents - Step 3: upload the three
/// document groups
///
/// Expected Input: `multipart/form-data` with one or more file parts named
/// `identity_card`, `drivers_license` and `insurance_proof` (each repeatable,
/// each group required).
///
/// Expected Output (201):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "rider_id": "rider_uuid",
///     "identity_card_urls": ["https://.../identity_card-rider_uuid-0.png"],
///     "drivers_license_urls": ["..."],
///     "insurance_proof_urls": ["..."]
///   }
/// }
/// ```
pub async fn documents_post(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffUser>,
    Path(rider_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<DocumentRecord> {
    let rider_id = parse_rider_id(&rider_id)?;
    let bundle = read_bundle(multipart).await?;

    let saved = state.enrollment.upload_documents(&staff, rider_id, &bundle).await?;
    Ok(ApiResponse::created(saved))
}

async fn read_bundle(mut multipart: Multipart) -> Result<DocumentBundle, ApiError> {
    let mut bundle = DocumentBundle::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(category) = field.name().and_then(|name| name.parse::<DocumentCategory>().ok()) else {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        };

        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| category.to_string());
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field.bytes().await?;

        bundle.push(category, UploadFile::new(file_name, content_type, bytes));
    }

    Ok(bundle)
}
