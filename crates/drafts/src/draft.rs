//! Draft assembly: one rendered email per group.

use mailmerge_core::JoinKey;
use mailmerge_grouping::{Group, GroupSet};
use mailmerge_template::{ItemRenderer, TemplateEngine, TemplateError};
use serde::{Deserialize, Serialize};

/// A fully rendered email ready for manual or batch dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub group_key: JoinKey,
    pub recipient_name: String,
    /// Contact addresses joined with a comma; empty when the recipient has none.
    pub to: String,
    pub subject: String,
    pub body: String,
    pub has_email: bool,
    /// Placeholders left in the subject or body, body first.
    #[serde(default)]
    pub unresolved: Vec<String>,
}

/// Body and subject templates rendered for every group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftTemplate {
    pub subject: String,
    pub body: String,
}

impl DraftTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Render one group. A recipient without addresses still gets a draft,
/// flagged with `has_email = false`.
pub fn build_draft<R: ItemRenderer + ?Sized>(
    engine: &TemplateEngine,
    group: &Group,
    template: &DraftTemplate,
    renderer: &R,
) -> Result<Draft, TemplateError> {
    let body = engine.render(&template.body, group, renderer)?;
    let subject = engine.render(&template.subject, group, renderer)?;

    let mut unresolved = body.unresolved;
    for name in subject.unresolved {
        if !unresolved.contains(&name) {
            unresolved.push(name);
        }
    }

    Ok(Draft {
        group_key: group.key.clone(),
        recipient_name: group.display_name().to_string(),
        to: group.recipient.joined_emails(),
        subject: subject.text,
        body: body.text,
        has_email: group.recipient.has_email(),
        unresolved,
    })
}

/// Render every group, in group order.
pub fn build_drafts<R: ItemRenderer + ?Sized>(
    engine: &TemplateEngine,
    groups: &GroupSet,
    template: &DraftTemplate,
    renderer: &R,
) -> Result<Vec<Draft>, TemplateError> {
    let drafts = groups
        .iter()
        .map(|g| build_draft(engine, g, template, renderer))
        .collect::<Result<Vec<_>, _>>()?;

    let without_email = drafts.iter().filter(|d| !d.has_email).count();
    let incomplete = drafts.iter().filter(|d| !d.unresolved.is_empty()).count();
    tracing::debug!(drafts = drafts.len(), without_email, incomplete, "drafts built");
    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailmerge_core::{FieldMap, InvoiceRecord, Recipient};
    use mailmerge_grouping::{group, JoinPolicy};
    use mailmerge_template::{AliasTable, ItemsBlock, PatternItemRenderer};

    fn invoice(key: &str, serie: &str) -> InvoiceRecord {
        let mut fields = FieldMap::new();
        fields.insert("SERIE".into(), serie.into());
        InvoiceRecord::new(JoinKey::new(key), fields).with_name(format!("ISSUER {key}"))
    }

    fn engine() -> TemplateEngine {
        TemplateEngine::new(AliasTable::default(), ItemsBlock::new("invoices_table"))
    }

    #[test]
    fn drafts_follow_group_order_and_flag_missing_email() {
        let recipients = vec![
            Recipient::new(JoinKey::new("001"), "Acme", vec!["a@acme.com".into(), "b@acme.com".into()]),
        ];
        let invoices = vec![invoice("002", "F-9"), invoice("001", "F-1"), invoice("001", "F-2")];
        let groups = group(&recipients, &invoices, JoinPolicy::InvoiceDriven);

        let template = DraftTemplate::new("Anulación {{ruc_emisor}}", "Hola {{razon_social_emisor}}\n{{invoices_table}}");
        let drafts = build_drafts(&engine(), &groups, &template, &PatternItemRenderer::new("{SERIE}")).unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].group_key.as_str(), "002");
        assert!(!drafts[0].has_email);
        assert_eq!(drafts[0].to, "");
        assert_eq!(drafts[0].body, "Hola ISSUER 002\nF-9");

        assert_eq!(drafts[1].to, "a@acme.com,b@acme.com");
        assert_eq!(drafts[1].subject, "Anulación 001");
        assert_eq!(drafts[1].body, "Hola Acme\nF-1\nF-2");
    }

    #[test]
    fn unresolved_names_merge_subject_and_body() {
        let recipients = vec![Recipient::new(JoinKey::new("001"), "Acme", vec![])];
        let groups = group(&recipients, &[invoice("001", "F-1")], JoinPolicy::InnerOnMatch);
        let template = DraftTemplate::new("{{x}} {{y}}", "{{y}} {{z}}");
        let drafts = build_drafts(&engine(), &groups, &template, &PatternItemRenderer::new("")).unwrap();
        assert_eq!(drafts[0].unresolved, vec!["y", "z", "x"]);
    }

    #[test]
    fn recipient_without_invoices_still_gets_a_draft() {
        let recipients = vec![Recipient::new(JoinKey::new("009"), "Lonely", vec!["l@x.com".into()])];
        let groups = group(&recipients, &[], JoinPolicy::RecipientDriven);
        let template = DraftTemplate::new("s", "[{{invoices_table}}]");
        let drafts = build_drafts(&engine(), &groups, &template, &PatternItemRenderer::new("{SERIE}")).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].body, "[]");
        assert!(drafts[0].has_email);
    }
}
