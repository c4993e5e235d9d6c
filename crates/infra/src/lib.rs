//! Infrastructure layer: recipient persistence adapters.

pub mod recipient_store;

pub use recipient_store::{
    InMemoryRecipientRepository, RecipientRepository, SqliteRecipientRepository, StoredRecipients,
};
