//! Typed records produced from normalized spreadsheet rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::JoinKey;

/// Column header → trimmed cell value.
pub type FieldMap = BTreeMap<String, String>;

/// A person or company an email is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub key: JoinKey,
    pub display_name: String,
    /// Ordered contact addresses; a single sheet cell may hold several.
    pub contact_emails: Vec<String>,
    /// Every imported column of the recipient row, mapped columns included.
    #[serde(default)]
    pub fields: FieldMap,
}

impl Recipient {
    pub fn new(key: JoinKey, display_name: impl Into<String>, contact_emails: Vec<String>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
            contact_emails,
            fields: FieldMap::new(),
        }
    }

    /// Stand-in recipient for invoice keys with no imported recipient.
    ///
    /// Carries the invoice's denormalized issuer name and no contact address.
    pub fn placeholder(key: JoinKey, display_name: impl Into<String>) -> Self {
        Self::new(key, display_name, Vec::new())
    }

    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = fields;
        self
    }

    pub fn has_email(&self) -> bool {
        !self.contact_emails.is_empty()
    }

    pub fn first_email(&self) -> Option<&str> {
        self.contact_emails.first().map(String::as_str)
    }

    /// Contact addresses joined with a comma (mail clients accept this in `to`).
    pub fn joined_emails(&self) -> String {
        self.contact_emails.join(",")
    }
}

/// One invoice / voucher row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub key: JoinKey,
    /// Denormalized issuer name carried on the row (may be empty).
    #[serde(default)]
    pub name: String,
    pub fields: FieldMap,
}

impl InvoiceRecord {
    pub fn new(key: JoinKey, fields: FieldMap) -> Self {
        Self {
            key,
            name: String::new(),
            fields,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Field value, or `""` when the column is absent.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Split a contact cell holding one or more addresses.
///
/// Addresses may be separated by commas, semicolons or whitespace; empty
/// fragments are dropped and order is preserved.
pub fn split_emails(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
