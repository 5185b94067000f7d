/// Streaming extractor for JaCoCo XML coverage reports.
///
/// JaCoCo XML structure:
///   <report name="...">
///     <sessioninfo id="..." start="..." dump="..."/>
///     <package name="com/example">
///       <class name="com/example/Foo" sourcefilename="Foo.java">
///         <method name="doStuff" desc="()V" line="10">
///           <counter type="INSTRUCTION" missed="0" covered="5"/>
///           <counter type="BRANCH" missed="1" covered="3"/>
///         </method>
///         <counter type="INSTRUCTION" missed="2" covered="10"/>
///         <counter type="BRANCH" missed="1" covered="3"/>
///         <counter type="LINE" missed="1" covered="5"/>
///       </class>
///       <sourcefile name="Foo.java">...</sourcefile>
///       <counter type="INSTRUCTION" missed="2" covered="10"/>
///     </package>
///     <counter type="INSTRUCTION" missed="20" covered="100"/>
///   </report>
///
/// Only two things are pulled out in a single pass:
///   - class-level counters (direct children of `<class>`) of the classes
///     named in the target set,
///   - report-scope counters (direct children of the root `<report>`).
///
/// Per-method counters, `<sourcefile>` line data and every class outside
/// the target set are skipped without being buffered, so memory stays
/// proportional to the number of tracked classes rather than report size.
use std::collections::HashSet;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};

use super::get_attr;
use crate::error::{GateError, Result};
use crate::model::{ClassRecord, Counter, CounterKind};

/// Everything the evaluator needs from one report.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Tracked classes in the order their `</class>` was seen.
    pub classes: Vec<ClassRecord>,
    /// Counters directly under the root `<report>` element.
    pub report_counters: Vec<Counter>,
}

/// Event-driven state of one extraction pass.
///
/// Feed it element starts and ends in document order; empty elements are a
/// start immediately followed by an end.
pub struct ClassExtractor<'t> {
    targets: &'t HashSet<String>,
    current: Option<ClassRecord>,
    /// Nesting depth relative to the most recent `<class>` start. Goes
    /// negative once the walk climbs above that class.
    depth: i64,
    /// Number of currently open elements.
    open: usize,
    root_is_report: bool,
    report_counters: Vec<Counter>,
}

impl<'t> ClassExtractor<'t> {
    pub fn new(targets: &'t HashSet<String>) -> Self {
        Self {
            targets,
            current: None,
            depth: 0,
            open: 0,
            root_is_report: false,
            report_counters: Vec::new(),
        }
    }

    /// Handle an element start.
    pub fn start(&mut self, e: &BytesStart, position: usize) -> Result<()> {
        let name = e.name();
        match name.as_ref() {
            b"class" => {
                if let Some(open) = &self.current {
                    return Err(GateError::Malformed {
                        message: format!("<class> nested inside tracked class '{}'", open.name),
                        position,
                    });
                }
                self.depth = 0;
                if let Some(class_name) = get_attr(e, b"name") {
                    if self.targets.contains(class_name.as_str()) {
                        self.current = Some(ClassRecord::new(class_name));
                    }
                }
            }
            b"counter" => {
                if self.depth == 1 {
                    if let Some(record) = self.current.as_mut() {
                        record.counters.push(parse_counter(e));
                    }
                }
                if self.open == 1 && self.root_is_report {
                    self.report_counters.push(parse_counter(e));
                }
            }
            root if self.open == 0 => {
                self.root_is_report = root == b"report";
            }
            _ => {}
        }

        self.depth += 1;
        self.open += 1;
        Ok(())
    }

    /// Handle an element end. Returns the tracked class closed by this
    /// event, if any.
    pub fn end(&mut self, name: &[u8], position: usize) -> Result<Option<ClassRecord>> {
        if self.open == 0 {
            return Err(GateError::Malformed {
                message: format!(
                    "closing </{}> without a matching start",
                    String::from_utf8_lossy(name)
                ),
                position,
            });
        }
        self.open -= 1;
        self.depth -= 1;

        if name == b"class" {
            return Ok(self.current.take());
        }
        Ok(None)
    }

    /// Finish the pass, failing if the stream ended inside an element.
    pub fn finish(self, position: usize) -> Result<Vec<Counter>> {
        if self.open != 0 {
            return Err(GateError::Malformed {
                message: format!("report ended with {} unclosed element(s)", self.open),
                position,
            });
        }
        Ok(self.report_counters)
    }
}

fn parse_counter(e: &BytesStart) -> Counter {
    let mut kind = None;
    let mut missed = 0;
    let mut covered = 0;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"type" => {
                kind = attr
                    .unescape_value()
                    .ok()
                    .map(|v| CounterKind::parse(&v));
            }
            b"missed" => {
                missed = attr
                    .unescape_value()
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
            }
            b"covered" => {
                covered = attr
                    .unescape_value()
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
            }
            _ => {}
        }
    }

    Counter::new(
        kind.unwrap_or_else(|| CounterKind::Other(String::new())),
        missed,
        covered,
    )
}

/// Extract tracked classes and report-scope counters from raw bytes.
pub fn extract(input: &[u8], targets: &HashSet<String>) -> Result<Extraction> {
    extract_from(&mut &*input, targets)
}

/// Extract tracked classes and report-scope counters from a reader.
pub fn extract_from(reader: &mut dyn BufRead, targets: &HashSet<String>) -> Result<Extraction> {
    let mut classes = Vec::new();
    let report_counters = extract_streaming(reader, targets, &mut |record| {
        classes.push(record);
        Ok(())
    })?;
    tracing::debug!(
        tracked = targets.len(),
        found = classes.len(),
        "extracted class counters"
    );
    Ok(Extraction {
        classes,
        report_counters,
    })
}

/// Streaming extractor: calls `emit` once per tracked `</class>` and
/// returns the report-scope counters once the document is exhausted.
pub fn extract_streaming(
    reader: &mut dyn BufRead,
    targets: &HashSet<String>,
    emit: &mut dyn FnMut(ClassRecord) -> Result<()>,
) -> Result<Vec<Counter>> {
    let mut xml = super::xml_reader(reader);
    let mut buf = Vec::new();
    let mut extractor = ClassExtractor::new(targets);

    loop {
        let position = xml.buffer_position();
        match xml.read_event_into(&mut buf) {
            Err(e) => return Err(super::xml_err(e, &xml)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                extractor.start(e, position)?;
            }
            Ok(Event::Empty(ref e)) => {
                extractor.start(e, position)?;
                if let Some(record) = extractor.end(e.name().as_ref(), position)? {
                    emit(record)?;
                }
            }
            Ok(Event::End(ref e)) => {
                if let Some(record) = extractor.end(e.name().as_ref(), position)? {
                    emit(record)?;
                }
            }
            _ => {}
        }
        buf.clear();
    }

    extractor.finish(xml.buffer_position())
}
