//! Column mapping: normalized rows → `Recipient` / `InvoiceRecord`.

use mailmerge_core::{split_emails, FieldMap, InvoiceRecord, JoinKey, MergeError, MergeResult, Recipient};
use serde::{Deserialize, Serialize};

use crate::header::HeaderCase;
use crate::normalize::NormalizedSheet;

const RECIPIENTS_SHEET: &str = "recipients";
const INVOICES_SHEET: &str = "invoices";

/// Explicit column choices for both sheets. No auto-detection happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub recipient_key_column: String,
    pub recipient_email_column: String,
    #[serde(default)]
    pub recipient_name_column: Option<String>,
    pub invoice_key_column: String,
    /// Denormalized issuer name on invoice rows, used for stand-in recipients.
    #[serde(default)]
    pub invoice_name_column: Option<String>,
    #[serde(default)]
    pub header_case: HeaderCase,
}

impl ColumnMapping {
    fn resolve(&self, sheet: &NormalizedSheet, sheet_name: &str, column: &str) -> MergeResult<String> {
        let canonical = self.header_case.apply(column);
        if canonical.is_empty() || !sheet.has_column(&canonical) {
            return Err(MergeError::unknown_column(sheet_name, column.trim()));
        }
        Ok(canonical)
    }

    fn resolve_optional(
        &self,
        sheet: &NormalizedSheet,
        sheet_name: &str,
        column: Option<&String>,
    ) -> MergeResult<Option<String>> {
        match column.map(|c| c.trim()).filter(|c| !c.is_empty()) {
            Some(c) => self.resolve(sheet, sheet_name, c).map(Some),
            None => Ok(None),
        }
    }
}

/// Build recipients from a canonicalized sheet.
///
/// Rows with an empty key are skipped. Every column is kept in
/// `Recipient::fields` so any header can be used as a placeholder.
pub fn recipients_from_sheet(sheet: &NormalizedSheet, mapping: &ColumnMapping) -> MergeResult<Vec<Recipient>> {
    let key_col = mapping.resolve(sheet, RECIPIENTS_SHEET, &mapping.recipient_key_column)?;
    let email_col = mapping.resolve(sheet, RECIPIENTS_SHEET, &mapping.recipient_email_column)?;
    let name_col = mapping.resolve_optional(sheet, RECIPIENTS_SHEET, mapping.recipient_name_column.as_ref())?;

    let mut skipped = 0usize;
    let recipients: Vec<Recipient> = sheet
        .rows
        .iter()
        .filter_map(|row| {
            let key = JoinKey::new(cell(row, &key_col));
            if key.is_empty() {
                skipped += 1;
                return None;
            }
            let name = name_col.as_deref().map(|c| cell(row, c)).unwrap_or_default();
            Some(Recipient::new(key, name, split_emails(cell(row, &email_col))).with_fields(row.clone()))
        })
        .collect();

    tracing::debug!(recipients = recipients.len(), skipped, "recipients mapped");
    Ok(recipients)
}

/// Build invoice records from a canonicalized sheet. Rows with an empty key are skipped.
pub fn invoices_from_sheet(sheet: &NormalizedSheet, mapping: &ColumnMapping) -> MergeResult<Vec<InvoiceRecord>> {
    let key_col = mapping.resolve(sheet, INVOICES_SHEET, &mapping.invoice_key_column)?;
    let name_col = mapping.resolve_optional(sheet, INVOICES_SHEET, mapping.invoice_name_column.as_ref())?;

    let mut skipped = 0usize;
    let invoices: Vec<InvoiceRecord> = sheet
        .rows
        .iter()
        .filter_map(|row| {
            let key = JoinKey::new(cell(row, &key_col));
            if key.is_empty() {
                skipped += 1;
                return None;
            }
            let name = name_col.as_deref().map(|c| cell(row, c)).unwrap_or_default();
            Some(InvoiceRecord::new(key, row.clone()).with_name(name))
        })
        .collect();

    tracing::debug!(invoices = invoices.len(), skipped, "invoices mapped");
    Ok(invoices)
}

fn cell<'a>(row: &'a FieldMap, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            recipient_key_column: "ruc".into(),
            recipient_email_column: "correo".into(),
            recipient_name_column: Some("nombre".into()),
            invoice_key_column: "RUC_EMISOR".into(),
            invoice_name_column: Some("RAZON_SOCIAL_EMISOR".into()),
            header_case: HeaderCase::Upper,
        }
    }

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> NormalizedSheet {
        NormalizedSheet {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    headers
                        .iter()
                        .zip(r.iter())
                        .map(|(h, v)| (h.to_string(), v.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    #[test]
    fn recipients_map_key_name_and_split_emails() {
        let s = sheet(
            &["RUC", "CODIGO", "NOMBRE", "CORREO"],
            &[&["001", "P1", "Acme", "a@acme.com; b@acme.com"]],
        );
        let recipients = recipients_from_sheet(&s, &mapping()).unwrap();
        assert_eq!(recipients.len(), 1);
        let r = &recipients[0];
        assert_eq!(r.key.as_str(), "001");
        assert_eq!(r.display_name, "Acme");
        assert_eq!(r.contact_emails, vec!["a@acme.com", "b@acme.com"]);
        assert_eq!(r.fields["CODIGO"], "P1");
    }

    #[test]
    fn rows_with_blank_keys_are_skipped() {
        let s = sheet(
            &["RUC", "NOMBRE", "CORREO"],
            &[&["", "Sin clave", "x@y"], &["  ", "Espacios", "z@y"], &["002", "Beta", ""]],
        );
        let recipients = recipients_from_sheet(&s, &mapping()).unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].key.as_str(), "002");
        assert_eq!(recipients[0].display_name, "Beta");
        assert!(!recipients[0].has_email());
    }

    #[test]
    fn unknown_column_names_the_sheet_and_column() {
        let s = sheet(&["RUC"], &[&["001"]]);
        let err = recipients_from_sheet(&s, &mapping()).unwrap_err();
        assert_eq!(err, MergeError::unknown_column("recipients", "correo"));
    }

    #[test]
    fn name_column_is_optional() {
        let mut m = mapping();
        m.recipient_name_column = None;
        let s = sheet(&["RUC", "CORREO"], &[&["001", "a@x"]]);
        let recipients = recipients_from_sheet(&s, &m).unwrap();
        assert_eq!(recipients[0].display_name, "");
    }

    #[test]
    fn invoices_carry_denormalized_name_and_all_fields() {
        let s = sheet(
            &["TIPO_COMPROBANTE", "SERIE_COMPROBANTE", "RUC_EMISOR", "RAZON_SOCIAL_EMISOR"],
            &[
                &["Factura", "001-1", "001", "ACME S.A."],
                &["Factura", "001-2", " ", "NOBODY"],
            ],
        );
        let invoices = invoices_from_sheet(&s, &mapping()).unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].name, "ACME S.A.");
        assert_eq!(invoices[0].field("SERIE_COMPROBANTE"), "001-1");
    }
}
