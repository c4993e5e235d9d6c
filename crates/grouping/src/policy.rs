//! Join policies.

use serde::{Deserialize, Serialize};

/// How recipients and invoices are joined into groups.
///
/// | policy            | driving sequence | unmatched invoices | recipients without invoices |
/// |-------------------|------------------|--------------------|-----------------------------|
/// | `InnerOnMatch`    | invoices         | dropped            | dropped                     |
/// | `InvoiceDriven`   | invoices         | stand-in recipient | dropped                     |
/// | `RecipientDriven` | recipients       | dropped            | kept, zero invoices         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    InnerOnMatch,
    /// Default: no invoice row is ever lost.
    #[default]
    InvoiceDriven,
    RecipientDriven,
}

impl JoinPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinPolicy::InnerOnMatch => "inner_on_match",
            JoinPolicy::InvoiceDriven => "invoice_driven",
            JoinPolicy::RecipientDriven => "recipient_driven",
        }
    }
}

impl core::fmt::Display for JoinPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for JoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "inner_on_match" | "inner" => Ok(JoinPolicy::InnerOnMatch),
            "invoice_driven" | "invoice" => Ok(JoinPolicy::InvoiceDriven),
            "recipient_driven" | "recipient" => Ok(JoinPolicy::RecipientDriven),
            other => Err(format!(
                "unknown join policy '{other}' (expected inner_on_match, invoice_driven or recipient_driven)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_short_forms() {
        assert_eq!("inner-on-match".parse::<JoinPolicy>(), Ok(JoinPolicy::InnerOnMatch));
        assert_eq!("Recipient".parse::<JoinPolicy>(), Ok(JoinPolicy::RecipientDriven));
        assert!("outer".parse::<JoinPolicy>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&JoinPolicy::RecipientDriven).unwrap();
        assert_eq!(json, "\"recipient_driven\"");
        assert_eq!(JoinPolicy::default(), JoinPolicy::InvoiceDriven);
    }
}
