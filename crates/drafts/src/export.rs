//! CSV export of drafts for spreadsheet-based batch mailers.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::draft::Draft;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
pub const EXPORT_HEADER: [&str; 4] = ["Recipient", "To", "Subject", "Body"];

/// UTF-8 with BOM, header `Recipient,To,Subject,Body`, every field quoted,
/// embedded quotes doubled, `\n` between records.
pub fn export_csv(drafts: &[Draft]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(EXPORT_HEADER)?;
    for d in drafts {
        writer.write_record([d.recipient_name.as_str(), d.to.as_str(), d.subject.as_str(), d.body.as_str()])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::new(e.error().kind(), e.error().to_string())))
}
