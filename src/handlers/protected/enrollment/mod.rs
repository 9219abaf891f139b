// handlers/protected/enrollment/mod.rs - Rider enrollment wizard step actions
//
// POST /api/enrollment/personal              step 1, creates the rider id
// POST /api/enrollment/:rider_id/security    step 2
// POST /api/enrollment/:rider_id/documents   step 3 (multipart)
// POST /api/enrollment/:rider_id/finance     step 4

pub mod documents;
pub mod finance;
pub mod personal;
pub mod security;

pub use documents::documents_post;
pub use finance::finance_post;
pub use personal::personal_post;
pub use security::security_post;
