pub mod category;
pub mod contact;
pub mod envelope;
pub mod import;
pub mod whatsapp;

pub use category::{Category, CreateCategoryRequest, EntityType, UpdateCategoryRequest};
pub use contact::{
    BulkAddContactsData, BulkAddContactsRequest, BulkAddSummary, Contact, CreateContactRequest,
    SendStatus, UpdateContactRequest,
};
pub use envelope::{ApiEnvelope, ApiErrorBody};
pub use import::{ImportPayload, ImportPreview, ImportResult, ImportStats, PreviewImportRequest};
pub use whatsapp::{SessionState, WhatsAppStatus};
