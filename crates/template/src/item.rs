//! Per-invoice line renderers for the itemized placeholder.

use mailmerge_core::InvoiceRecord;

/// Renders one invoice into one line of the itemized block.
pub trait ItemRenderer {
    fn render_item(&self, invoice: &InvoiceRecord) -> String;
}

impl<F> ItemRenderer for F
where
    F: Fn(&InvoiceRecord) -> String,
{
    fn render_item(&self, invoice: &InvoiceRecord) -> String {
        self(invoice)
    }
}

/// `{FIELD}` pattern over invoice fields, e.g.
/// `{TIPO_COMPROBANTE} - {SERIE_COMPROBANTE} - {OBSERVACIONES}`.
///
/// Unknown fields expand to an empty string. A `{` with no closing `}` is kept literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternItemRenderer {
    pattern: String,
}

impl PatternItemRenderer {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into() }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Field names referenced by the pattern, in order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut rest = self.pattern.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if !after[..close].contains('{') => {
                    out.push(&after[..close]);
                    rest = &after[close + 1..];
                }
                _ => rest = after,
            }
        }
        out
    }
}

impl ItemRenderer for PatternItemRenderer {
    fn render_item(&self, invoice: &InvoiceRecord) -> String {
        let mut out = String::with_capacity(self.pattern.len());
        let mut rest = self.pattern.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if !after[..close].contains('{') => {
                    out.push_str(invoice.field(&after[..close]));
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// HTML table row (`<tr><td>…</td></tr>`) over the given columns. Values are escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowRenderer {
    columns: Vec<String>,
}

impl TableRowRenderer {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// `<tr><th>…</th></tr>` using the column names; handy as an [`crate::ItemsBlock`] header.
    pub fn header_row(&self) -> String {
        let cells: String = self.columns.iter().map(|c| format!("<th>{}</th>", escape_html(c))).collect();
        format!("<tr>{cells}</tr>")
    }
}

impl ItemRenderer for TableRowRenderer {
    fn render_item(&self, invoice: &InvoiceRecord) -> String {
        let cells: String = self
            .columns
            .iter()
            .map(|c| format!("<td>{}</td>", escape_html(invoice.field(c))))
            .collect();
        format!("<tr>{cells}</tr>")
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
