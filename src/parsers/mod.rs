pub mod jacoco;

use std::borrow::Cow;
use std::io::BufRead;

use quick_xml::events::BytesStart;
use quick_xml::reader::Reader;

use crate::error::GateError;

/// Number of leading bytes inspected when sniffing a report.
const SNIFF_LEN: usize = 4096;

/// Build a quick-xml reader with the settings every report parse uses.
pub(crate) fn xml_reader<R: BufRead>(reader: R) -> Reader<R> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);
    xml.check_end_names(true);
    xml
}

/// Read an attribute value by key, unescaped.
pub(crate) fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Wrap a quick-xml error with the reader's current byte position.
pub(crate) fn xml_err<R>(source: quick_xml::Error, xml: &Reader<R>) -> GateError {
    GateError::Xml {
        source,
        position: xml.buffer_position(),
    }
}

pub(crate) fn sniff_head(content: &[u8]) -> Cow<'_, str> {
    let len = content.len().min(SNIFF_LEN);
    String::from_utf8_lossy(&content[..len])
}

/// Cheap check that `content` starts like a JaCoCo XML report: an XML
/// document whose root is `<report>` and that either references the JaCoCo
/// DTD or contains JaCoCo-specific children.
pub fn looks_like_jacoco(content: &[u8]) -> bool {
    let head = sniff_head(content);
    let trimmed = head.trim_start_matches('\u{feff}').trim_start();
    let is_xml = trimmed.starts_with("<?xml") || trimmed.starts_with('<');
    is_xml
        && head.contains("<report")
        && (head.contains("JACOCO")
            || head.contains("jacoco")
            || head.contains("<sessioninfo")
            || head.contains("<package"))
}
