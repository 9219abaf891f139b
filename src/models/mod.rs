pub mod audit;
pub mod documents;
pub mod finance;
pub mod personal;
pub mod rider;
pub mod security;

pub use audit::AuditEntry;
pub use documents::{DocumentBundle, DocumentCategory, DocumentRecord, UploadFile};
pub use finance::{FinanceForm, FinanceInfo, FinanceRecord, ServiceProvider};
pub use personal::{PersonalInfo, PersonalInfoForm, PersonalInfoRecord};
pub use rider::{CreatedRider, RiderId, RiderRecord};
pub use security::{SecurityInfo, SecurityInfoForm, SecurityInfoRecord};

/// Table names on the BaaS
pub mod tables {
    pub const USERS: &str = "users";
    pub const PERSONAL_INFO: &str = "rider_personal_info";
    pub const SECURITY_INFO: &str = "rider_security_info";
    pub const DOCUMENTS: &str = "rider_documents";
    pub const FINANCE: &str = "rider_finance";
    pub const AUDIT_LOGS: &str = "audit_logs";
}
