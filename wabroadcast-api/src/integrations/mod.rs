pub mod whatsapp;

pub use whatsapp::{BridgeLink, SessionLink, SessionTracker, WhatsAppError};
