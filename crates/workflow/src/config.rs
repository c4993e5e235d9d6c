//! Merge configuration: column mapping, join policy and template defaults.

use std::collections::HashMap;
use std::path::Path;

use mailmerge_core::{MergeError, MergeResult};
use mailmerge_grouping::JoinPolicy;
use mailmerge_tabular::{ColumnMapping, HeaderCase};
use mailmerge_template::{AliasTable, ItemsBlock, PatternItemRenderer, TemplateEngine};
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_VAR: &str = "MAILMERGE_CONFIG";

pub const DEFAULT_SUBJECT: &str = "Anulación de comprobantes";

pub const DEFAULT_BODY: &str = "Estimados señores de {{razon_social_emisor}},

Por medio de la presente, nos dirigimos a ustedes con el fin de solicitar la anulación de los siguientes comprobantes registrados en el SRI.

El motivo de la anulación junto con el detalle de los comprobantes, se encuentra a continuación:

{{razon_social_emisor}} {{ruc_emisor}}

{{invoices_table}}
";

/// Everything a merge run needs besides the uploaded files.
///
/// Missing fields take the defaults below when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub recipient_key_column: String,
    pub recipient_email_column: String,
    pub recipient_name_column: Option<String>,
    pub invoice_key_column: String,
    pub invoice_name_column: Option<String>,
    /// 1-based sheet row of the first data row; the header is the row above.
    pub start_row_recipients: usize,
    pub start_row_invoices: usize,
    pub join_policy: JoinPolicy,
    pub header_case: HeaderCase,
    pub subject_template: String,
    pub body_template: String,
    pub items_placeholder: String,
    /// `{FIELD}` pattern over canonical invoice headers, one line per invoice.
    pub item_pattern: String,
    pub items_header: Option<String>,
    pub items_separator: String,
    pub aliases: AliasTable,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            recipient_key_column: "RUC".to_string(),
            recipient_email_column: "CORREO".to_string(),
            recipient_name_column: Some("NOMBRE".to_string()),
            invoice_key_column: "RUC_EMISOR".to_string(),
            invoice_name_column: Some("RAZON_SOCIAL_EMISOR".to_string()),
            start_row_recipients: 2,
            start_row_invoices: 2,
            join_policy: JoinPolicy::InvoiceDriven,
            header_case: HeaderCase::Upper,
            subject_template: DEFAULT_SUBJECT.to_string(),
            body_template: DEFAULT_BODY.to_string(),
            items_placeholder: "invoices_table".to_string(),
            item_pattern: "{TIPO_COMPROBANTE} - {SERIE_COMPROBANTE} - {OBSERVACIONES}".to_string(),
            items_header: Some("Tipo de Comprobante - Serie - Observaciones".to_string()),
            items_separator: "\n".to_string(),
            aliases: AliasTable::default(),
        }
    }
}

impl MergeConfig {
    pub fn from_json(raw: &str) -> MergeResult<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| MergeError::validation(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> MergeResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MergeError::validation(format!("cannot read config {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Defaults, then the JSON file named by `MAILMERGE_CONFIG`, then
    /// individual `MAILMERGE_*` variables.
    pub fn from_env() -> MergeResult<Self> {
        let vars: HashMap<String, String> = std::env::vars().filter(|(k, _)| k.starts_with("MAILMERGE_")).collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> MergeResult<Self> {
        let mut config = match vars.get(CONFIG_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::from_file(path.trim())?,
            None => Self::default(),
        };

        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(v) = get("MAILMERGE_RECIPIENT_KEY_COLUMN") {
            config.recipient_key_column = v.to_string();
        }
        if let Some(v) = get("MAILMERGE_RECIPIENT_EMAIL_COLUMN") {
            config.recipient_email_column = v.to_string();
        }
        if let Some(v) = get("MAILMERGE_RECIPIENT_NAME_COLUMN") {
            config.recipient_name_column = Some(v.to_string());
        }
        if let Some(v) = get("MAILMERGE_INVOICE_KEY_COLUMN") {
            config.invoice_key_column = v.to_string();
        }
        if let Some(v) = get("MAILMERGE_INVOICE_NAME_COLUMN") {
            config.invoice_name_column = Some(v.to_string());
        }
        if let Some(v) = get("MAILMERGE_START_ROW_RECIPIENTS") {
            config.start_row_recipients = parse_row("MAILMERGE_START_ROW_RECIPIENTS", v)?;
        }
        if let Some(v) = get("MAILMERGE_START_ROW_INVOICES") {
            config.start_row_invoices = parse_row("MAILMERGE_START_ROW_INVOICES", v)?;
        }
        if let Some(v) = get("MAILMERGE_JOIN_POLICY") {
            config.join_policy = v
                .parse()
                .map_err(|e: String| MergeError::validation(format!("MAILMERGE_JOIN_POLICY: {e}")))?;
        }
        if let Some(v) = get("MAILMERGE_HEADER_CASE") {
            config.header_case = serde_json::from_value(serde_json::Value::String(v.to_ascii_lowercase()))
                .map_err(|_| {
                    MergeError::validation(format!("MAILMERGE_HEADER_CASE: expected preserve, upper or lower (got '{v}')"))
                })?;
        }
        if let Some(v) = get("MAILMERGE_SUBJECT") {
            config.subject_template = v.to_string();
        }
        if let Some(v) = get("MAILMERGE_ITEMS_PLACEHOLDER") {
            config.items_placeholder = v.to_string();
        }
        if let Some(v) = get("MAILMERGE_ITEM_PATTERN") {
            config.item_pattern = v.to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MergeResult<()> {
        if self.start_row_recipients == 0 {
            return Err(MergeError::validation("start_row_recipients must be 1 or greater"));
        }
        if self.start_row_invoices == 0 {
            return Err(MergeError::validation("start_row_invoices must be 1 or greater"));
        }
        if self.recipient_key_column.trim().is_empty() {
            return Err(MergeError::validation("recipient_key_column must not be empty"));
        }
        if self.recipient_email_column.trim().is_empty() {
            return Err(MergeError::validation("recipient_email_column must not be empty"));
        }
        if self.invoice_key_column.trim().is_empty() {
            return Err(MergeError::validation("invoice_key_column must not be empty"));
        }
        if self.items_placeholder.trim().is_empty() {
            return Err(MergeError::validation("items_placeholder must not be empty"));
        }
        Ok(())
    }

    pub fn column_mapping(&self) -> ColumnMapping {
        ColumnMapping {
            recipient_key_column: self.recipient_key_column.clone(),
            recipient_email_column: self.recipient_email_column.clone(),
            recipient_name_column: self.recipient_name_column.clone(),
            invoice_key_column: self.invoice_key_column.clone(),
            invoice_name_column: self.invoice_name_column.clone(),
            header_case: self.header_case,
        }
    }

    pub fn template_engine(&self) -> TemplateEngine {
        let mut items = ItemsBlock::new(self.items_placeholder.trim()).with_separator(self.items_separator.clone());
        if let Some(header) = self.items_header.as_ref().filter(|h| !h.is_empty()) {
            items = items.with_header(header.clone());
        }
        TemplateEngine::new(self.aliases.clone(), items)
    }

    pub fn item_renderer(&self) -> PatternItemRenderer {
        PatternItemRenderer::new(self.item_pattern.clone())
    }
}

fn parse_row(var: &str, raw: &str) -> MergeResult<usize> {
    raw.parse::<usize>()
        .map_err(|_| MergeError::validation(format!("{var}: expected a row number (got '{raw}')")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_are_valid_and_invoice_driven() {
        let c = MergeConfig::default();
        c.validate().unwrap();
        assert_eq!(c.join_policy, JoinPolicy::InvoiceDriven);
        assert!(c.body_template.contains("{{invoices_table}}"));
        assert_eq!(c.column_mapping().invoice_key_column, "RUC_EMISOR");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = MergeConfig::from_json(r#"{"join_policy":"recipient_driven","start_row_invoices":4}"#).unwrap();
        assert_eq!(c.join_policy, JoinPolicy::RecipientDriven);
        assert_eq!(c.start_row_invoices, 4);
        assert_eq!(c.recipient_key_column, "RUC");
    }

    #[test]
    fn zero_start_row_is_rejected() {
        let err = MergeConfig::from_json(r#"{"start_row_recipients":0}"#).unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn env_vars_override_defaults() {
        let c = MergeConfig::from_vars(&vars(&[
            ("MAILMERGE_JOIN_POLICY", "inner-on-match"),
            ("MAILMERGE_START_ROW_RECIPIENTS", "3"),
            ("MAILMERGE_HEADER_CASE", "Lower"),
            ("MAILMERGE_RECIPIENT_KEY_COLUMN", "ruc"),
        ]))
        .unwrap();
        assert_eq!(c.join_policy, JoinPolicy::InnerOnMatch);
        assert_eq!(c.start_row_recipients, 3);
        assert_eq!(c.header_case, HeaderCase::Lower);
        assert_eq!(c.recipient_key_column, "ruc");
    }

    #[test]
    fn bad_env_values_name_the_variable() {
        let err = MergeConfig::from_vars(&vars(&[("MAILMERGE_START_ROW_INVOICES", "two")])).unwrap_err();
        assert!(err.to_string().contains("MAILMERGE_START_ROW_INVOICES"));

        let err = MergeConfig::from_vars(&vars(&[("MAILMERGE_JOIN_POLICY", "outer")])).unwrap_err();
        assert!(err.to_string().contains("MAILMERGE_JOIN_POLICY"));
    }

    #[test]
    fn missing_config_file_is_a_validation_error() {
        let err = MergeConfig::from_vars(&vars(&[(CONFIG_PATH_VAR, "/nonexistent/mailmerge.json")])).unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn engine_uses_configured_items_block() {
        let engine = MergeConfig::default().template_engine();
        assert_eq!(engine.items().placeholder, "invoices_table");
        assert_eq!(
            engine.items().header.as_deref(),
            Some("Tipo de Comprobante - Serie - Observaciones")
        );
    }
}
