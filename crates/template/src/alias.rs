//! Named aliases that resolve to recipient attributes.

use std::collections::BTreeMap;

use mailmerge_grouping::Group;
use serde::{Deserialize, Serialize};

/// Which recipient attribute an alias expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientAttribute {
    /// Recipient name, falling back to the first invoice's issuer name and then the key.
    DisplayName,
    Key,
    FirstEmail,
    /// All contact emails, comma-joined.
    AllEmails,
}

impl RecipientAttribute {
    pub fn resolve(&self, group: &Group) -> String {
        match self {
            RecipientAttribute::DisplayName => group.display_name().to_string(),
            RecipientAttribute::Key => group.key.to_string(),
            RecipientAttribute::FirstEmail => group.recipient.first_email().unwrap_or_default().to_string(),
            RecipientAttribute::AllEmails => group.recipient.joined_emails(),
        }
    }
}

/// Alias name → attribute. Aliases take precedence over raw field names, but
/// an alias that resolves to an empty string yields to a field of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable(BTreeMap<String, RecipientAttribute>);

impl AliasTable {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, name: impl Into<String>, attribute: RecipientAttribute) -> Self {
        self.0.insert(name.into(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<RecipientAttribute> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RecipientAttribute)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        use RecipientAttribute::*;
        Self::empty()
            .with("name", DisplayName)
            .with("key", Key)
            .with("email", FirstEmail)
            .with("razon_social_emisor", DisplayName)
            .with("nombre_destinatario", DisplayName)
            .with("ruc_emisor", Key)
            .with("correo_destinatario", AllEmails)
    }
}
