//! Join/group engine.

use std::collections::HashMap;

use mailmerge_core::{InvoiceRecord, JoinKey, Recipient};
use serde::Serialize;

use crate::policy::JoinPolicy;

/// Where a group's recipient came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientOrigin {
    /// Found in the imported recipient list.
    Matched,
    /// Stand-in built from the invoice row (`InvoiceDriven` only).
    Synthesized,
}

/// Invoices correlated to one recipient key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub key: JoinKey,
    pub recipient: Recipient,
    pub origin: RecipientOrigin,
    /// Source row order; never reordered or deduplicated.
    pub invoices: Vec<InvoiceRecord>,
}

impl Group {
    fn new(key: JoinKey, recipient: Recipient, origin: RecipientOrigin) -> Self {
        Self {
            key,
            recipient,
            origin,
            invoices: Vec::new(),
        }
    }

    /// Recipient name, falling back to the first invoice's issuer name.
    pub fn display_name(&self) -> &str {
        if !self.recipient.display_name.is_empty() {
            return &self.recipient.display_name;
        }
        self.invoices
            .first()
            .map(|inv| inv.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.key.as_str())
    }

    pub fn first_invoice(&self) -> Option<&InvoiceRecord> {
        self.invoices.first()
    }

    pub fn is_matched(&self) -> bool {
        self.origin == RecipientOrigin::Matched
    }
}

/// Groups keyed by join key, iterated in first-encounter order.
#[derive(Debug, Clone, Default)]
pub struct GroupSet {
    groups: Vec<Group>,
    index: HashMap<JoinKey, usize>,
}

impl GroupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &JoinKey) -> Option<&Group> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn contains_key(&self, key: &JoinKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &JoinKey> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn as_slice(&self) -> &[Group] {
        &self.groups
    }

    /// Total invoice rows across all groups.
    pub fn invoice_count(&self) -> usize {
        self.groups.iter().map(|g| g.invoices.len()).sum()
    }

    fn entry_or_insert_with(&mut self, key: &JoinKey, make: impl FnOnce() -> Group) -> &mut Group {
        let next = self.groups.len();
        let i = *self.index.entry(key.clone()).or_insert(next);
        if i == next {
            self.groups.push(make());
        }
        &mut self.groups[i]
    }

    fn get_mut(&mut self, key: &JoinKey) -> Option<&mut Group> {
        let i = *self.index.get(key)?;
        Some(&mut self.groups[i])
    }
}

impl<'a> IntoIterator for &'a GroupSet {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

impl IntoIterator for GroupSet {
    type Item = Group;
    type IntoIter = std::vec::IntoIter<Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Partition `invoices` into groups keyed by recipient key under `policy`.
///
/// Keys compare by exact (trimmed) string equality. Rows with an empty key
/// never join. When a recipient key repeats, the last occurrence supplies the
/// recipient data while group order follows the first occurrence.
///
/// Returns an empty set rather than an error when nothing joins; the caller
/// decides how to surface "no matches".
pub fn group(recipients: &[Recipient], invoices: &[InvoiceRecord], policy: JoinPolicy) -> GroupSet {
    let mut by_key: HashMap<&JoinKey, &Recipient> = HashMap::with_capacity(recipients.len());
    for r in recipients.iter().filter(|r| !r.key.is_empty()) {
        by_key.insert(&r.key, r);
    }

    let mut set = GroupSet::new();
    let mut dropped = 0usize;

    match policy {
        JoinPolicy::InnerOnMatch => {
            for inv in invoices.iter().filter(|i| !i.key.is_empty()) {
                match by_key.get(&inv.key) {
                    Some(r) => set
                        .entry_or_insert_with(&inv.key, || {
                            Group::new(inv.key.clone(), (*r).clone(), RecipientOrigin::Matched)
                        })
                        .invoices
                        .push(inv.clone()),
                    None => dropped += 1,
                }
            }
        }
        JoinPolicy::InvoiceDriven => {
            for inv in invoices.iter().filter(|i| !i.key.is_empty()) {
                set.entry_or_insert_with(&inv.key, || match by_key.get(&inv.key) {
                    Some(r) => Group::new(inv.key.clone(), (*r).clone(), RecipientOrigin::Matched),
                    None => Group::new(
                        inv.key.clone(),
                        Recipient::placeholder(inv.key.clone(), inv.name.clone()),
                        RecipientOrigin::Synthesized,
                    ),
                })
                .invoices
                .push(inv.clone());
            }
        }
        JoinPolicy::RecipientDriven => {
            for r in recipients.iter().filter(|r| !r.key.is_empty()) {
                let latest = by_key.get(&r.key).copied().unwrap_or(r);
                set.entry_or_insert_with(&r.key, || {
                    Group::new(r.key.clone(), latest.clone(), RecipientOrigin::Matched)
                });
            }
            for inv in invoices.iter().filter(|i| !i.key.is_empty()) {
                match set.get_mut(&inv.key) {
                    Some(g) => g.invoices.push(inv.clone()),
                    None => dropped += 1,
                }
            }
        }
    }

    tracing::debug!(
        %policy,
        groups = set.len(),
        invoices = invoices.len(),
        dropped,
        "invoices grouped"
    );
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailmerge_core::FieldMap;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn recipient(key: &str, name: &str, email: &str) -> Recipient {
        let emails = if email.is_empty() { vec![] } else { vec![email.to_string()] };
        Recipient::new(JoinKey::new(key), name, emails)
    }

    fn invoice(key: &str, series: &str) -> InvoiceRecord {
        let mut fields = FieldMap::new();
        fields.insert("SERIE".to_string(), series.to_string());
        InvoiceRecord::new(JoinKey::new(key), fields).with_name(format!("Issuer {key}"))
    }

    fn series(g: &Group) -> Vec<&str> {
        g.invoices.iter().map(|i| i.field("SERIE")).collect()
    }

    #[test]
    fn inner_on_match_drops_both_sides_of_mismatches() {
        let recipients = vec![recipient("001", "Acme", "a@acme.com"), recipient("002", "Beta", "")];
        let invoices = vec![invoice("001", "X-1"), invoice("999", "Z-1"), invoice("001", "X-2")];

        let set = group(&recipients, &invoices, JoinPolicy::InnerOnMatch);
        assert_eq!(set.len(), 1);
        let g = set.get(&JoinKey::new("001")).unwrap();
        assert_eq!(series(g), vec!["X-1", "X-2"]);
        assert!(g.is_matched());
        assert!(!set.contains_key(&JoinKey::new("002")));
    }

    #[test]
    fn invoice_driven_synthesizes_missing_recipients() {
        let recipients = vec![recipient("001", "Acme", "a@acme.com")];
        let invoices = vec![invoice("999", "Z-1"), invoice("001", "X-1")];

        let set = group(&recipients, &invoices, JoinPolicy::InvoiceDriven);
        let keys: Vec<&str> = set.keys().map(JoinKey::as_str).collect();
        assert_eq!(keys, vec!["999", "001"]);

        let stand_in = set.get(&JoinKey::new("999")).unwrap();
        assert_eq!(stand_in.origin, RecipientOrigin::Synthesized);
        assert_eq!(stand_in.recipient.display_name, "Issuer 999");
        assert!(!stand_in.recipient.has_email());
    }

    #[test]
    fn recipient_driven_keeps_recipients_without_invoices() {
        let recipients = vec![recipient("002", "Beta", ""), recipient("001", "Acme", "a@acme.com")];
        let invoices = vec![invoice("001", "X-1"), invoice("999", "Z-1")];

        let set = group(&recipients, &invoices, JoinPolicy::RecipientDriven);
        let keys: Vec<&str> = set.keys().map(JoinKey::as_str).collect();
        assert_eq!(keys, vec!["002", "001"]);
        assert!(set.get(&JoinKey::new("002")).unwrap().invoices.is_empty());
        assert_eq!(set.invoice_count(), 1);
    }

    #[test]
    fn duplicate_recipient_keys_last_wins_first_orders() {
        let recipients = vec![
            recipient("001", "Old Name", "old@acme.com"),
            recipient("002", "Beta", ""),
            recipient("001", "New Name", "new@acme.com"),
        ];
        let set = group(&recipients, &[], JoinPolicy::RecipientDriven);
        assert_eq!(set.len(), 2);
        let first = &set.as_slice()[0];
        assert_eq!(first.key.as_str(), "001");
        assert_eq!(first.recipient.display_name, "New Name");
    }

    #[test]
    fn keys_are_not_coerced() {
        let recipients = vec![recipient("0190007510001", "Zero", "")];
        let invoices = vec![invoice("190007510001", "A")];
        assert!(group(&recipients, &invoices, JoinPolicy::InnerOnMatch).is_empty());
    }

    #[test]
    fn empty_inputs_yield_empty_set() {
        assert!(group(&[], &[], JoinPolicy::InvoiceDriven).is_empty());
        assert!(group(&[recipient("1", "a", "")], &[], JoinPolicy::InnerOnMatch).is_empty());
        assert!(group(&[], &[invoice("1", "a")], JoinPolicy::RecipientDriven).is_empty());
    }

    #[test]
    fn empty_keys_never_join() {
        let recipients = vec![recipient("", "Nobody", "")];
        let invoices = vec![invoice("", "A")];
        assert!(group(&recipients, &invoices, JoinPolicy::InvoiceDriven).is_empty());
        assert!(group(&recipients, &invoices, JoinPolicy::RecipientDriven).is_empty());
    }

    #[test]
    fn display_name_falls_back_to_invoice_issuer() {
        let recipients = vec![recipient("001", "", "a@acme.com")];
        let invoices = vec![invoice("001", "X-1")];
        let set = group(&recipients, &invoices, JoinPolicy::InnerOnMatch);
        assert_eq!(set.as_slice()[0].display_name(), "Issuer 001");
    }

    fn keys_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[0-4]{1,2}", 0..12)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: group counts match each policy's completeness rule.
        #[test]
        fn join_completeness_per_policy(r_keys in keys_strategy(), i_keys in keys_strategy()) {
            let recipients: Vec<Recipient> = r_keys.iter().map(|k| recipient(k, k, "")).collect();
            let invoices: Vec<InvoiceRecord> =
                i_keys.iter().enumerate().map(|(n, k)| invoice(k, &n.to_string())).collect();

            let distinct_r: HashSet<&String> = r_keys.iter().collect();
            let distinct_i: HashSet<&String> = i_keys.iter().collect();

            let invoice_driven = group(&recipients, &invoices, JoinPolicy::InvoiceDriven);
            prop_assert_eq!(invoice_driven.len(), distinct_i.len());
            prop_assert_eq!(invoice_driven.invoice_count(), invoices.len());

            let recipient_driven = group(&recipients, &invoices, JoinPolicy::RecipientDriven);
            prop_assert!(recipient_driven.len() >= distinct_r.len());

            let inner = group(&recipients, &invoices, JoinPolicy::InnerOnMatch);
            prop_assert_eq!(inner.len(), distinct_r.intersection(&distinct_i).count());
        }

        /// Property: invoices keep their relative source order inside a group.
        #[test]
        fn order_is_preserved_within_groups(i_keys in keys_strategy()) {
            let invoices: Vec<InvoiceRecord> =
                i_keys.iter().enumerate().map(|(n, k)| invoice(k, &n.to_string())).collect();
            let set = group(&[], &invoices, JoinPolicy::InvoiceDriven);

            for g in &set {
                let positions: Vec<usize> =
                    g.invoices.iter().map(|i| i.field("SERIE").parse().unwrap()).collect();
                let mut sorted = positions.clone();
                sorted.sort_unstable();
                prop_assert_eq!(positions, sorted);
            }
        }
    }
}
