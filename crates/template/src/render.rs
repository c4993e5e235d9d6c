//! Template rendering against one group.

use mailmerge_grouping::Group;
use serde::{Deserialize, Serialize};

use crate::alias::AliasTable;
use crate::item::ItemRenderer;
use crate::placeholder::{placeholders, substitute, token, TemplateError};

pub const DEFAULT_ITEMS_PLACEHOLDER: &str = "invoice_details";

/// The reserved itemized placeholder and how its lines are joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsBlock {
    pub placeholder: String,
    pub separator: String,
    /// Optional first line (e.g. column titles), joined with the same separator.
    #[serde(default)]
    pub header: Option<String>,
}

impl ItemsBlock {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            ..Self::default()
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    fn expand<R: ItemRenderer + ?Sized>(&self, group: &Group, renderer: &R) -> String {
        let header = self.header.iter().filter(|h| !h.is_empty()).cloned();
        let lines = group.invoices.iter().map(|inv| renderer.render_item(inv));
        header.chain(lines).collect::<Vec<_>>().join(&self.separator)
    }
}

impl Default for ItemsBlock {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_ITEMS_PLACEHOLDER.to_string(),
            separator: "\n".to_string(),
            header: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub text: String,
    /// Placeholders left verbatim because nothing resolved them.
    pub unresolved: Vec<String>,
}

impl Rendered {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Aliases plus the itemized block: everything needed to render any group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateEngine {
    aliases: AliasTable,
    items: ItemsBlock,
}

impl TemplateEngine {
    pub fn new(aliases: AliasTable, items: ItemsBlock) -> Self {
        Self { aliases, items }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn items(&self) -> &ItemsBlock {
        &self.items
    }

    /// Expand `template` for `group`.
    ///
    /// Lookup order per name: the itemized placeholder, then non-empty aliases,
    /// then the first invoice's fields, then the recipient's fields, then
    /// empty aliases. Anything else stays in the text and is reported in
    /// [`Rendered::unresolved`].
    pub fn render<R: ItemRenderer + ?Sized>(
        &self,
        template: &str,
        group: &Group,
        renderer: &R,
    ) -> Result<Rendered, TemplateError> {
        let present = |name: &str| !name.is_empty() && template.contains(&token(name));
        let mut values: Vec<(String, String)> = Vec::new();

        if present(&self.items.placeholder) {
            values.push((self.items.placeholder.clone(), self.items.expand(group, renderer)));
        }

        let mut empty_aliases = Vec::new();
        for (name, attribute) in self.aliases.iter().filter(|(name, _)| present(name)) {
            let value = attribute.resolve(group);
            if value.is_empty() {
                empty_aliases.push(name.to_string());
            } else {
                values.push((name.to_string(), value));
            }
        }

        if let Some(first) = group.first_invoice() {
            values.extend(
                first
                    .fields
                    .iter()
                    .filter(|(name, _)| present(name))
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        }

        values.extend(
            group
                .recipient
                .fields
                .iter()
                .filter(|(name, _)| present(name))
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        values.extend(empty_aliases.into_iter().map(|name| (name, String::new())));

        let out = substitute(template, &values)?;
        let unresolved = placeholders(template)
            .into_iter()
            .filter(|name| !out.replaced.contains(name))
            .collect();

        Ok(Rendered {
            text: out.text,
            unresolved,
        })
    }
}

/// Render with the default aliases and the `invoice_details` placeholder.
pub fn render<R: ItemRenderer + ?Sized>(
    template: &str,
    group: &Group,
    renderer: &R,
    items_separator: &str,
) -> Result<Rendered, TemplateError> {
    let items = ItemsBlock::default().with_separator(items_separator);
    TemplateEngine::new(AliasTable::default(), items).render(template, group, renderer)
}
