use crate::model::CubeRecord;
use crate::parsing::scanner::LayoutCase;
use serde::{Deserialize, Serialize};

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    ReportNumber,
    DateCast,
    PourLocation,
}

impl MetadataField {
    pub fn label(self) -> &'static str {
        match self {
            MetadataField::ReportNumber => "report number",
            MetadataField::DateCast => "date cast",
            MetadataField::PourLocation => "pour location",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
    Warning,
    Info,
    Debug,
}

/// Structured events emitted while extracting cubes from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    FieldFound {
        page_number: usize,
        field: MetadataField,
        value: String,
    },
    FieldMissing {
        page_number: usize,
        field: MetadataField,
    },
    CaseMatched {
        page_number: usize,
        line_index: usize,
        case: LayoutCase,
        lines_consumed: usize,
    },
    RecordEmitted {
        page_number: usize,
        record: CubeRecord,
    },
    MarkUnparsed {
        page_number: usize,
        mark: String,
    },
    PageScanned {
        page_number: usize,
        records: usize,
    },
    PageEmpty {
        page_number: usize,
    },
    PageSkipped {
        page_number: usize,
        reason: String,
    },
}

impl ScanEvent {
    pub fn severity(&self) -> TraceSeverity {
        match self {
            ScanEvent::MarkUnparsed { .. } | ScanEvent::PageSkipped { .. } => {
                TraceSeverity::Warning
            }
            ScanEvent::PageScanned { .. } | ScanEvent::PageEmpty { .. } => TraceSeverity::Info,
            _ => TraceSeverity::Debug,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ScanEvent::FieldFound {
                page_number,
                field,
                value,
            } => format!("Page {page_number}: {} '{value}'", field.label()),
            ScanEvent::FieldMissing { page_number, field } => {
                format!("Page {page_number}: no {} found", field.label())
            }
            ScanEvent::CaseMatched {
                page_number,
                line_index,
                case,
                lines_consumed,
            } => format!(
                "Page {page_number}: line {line_index} matched {} ({lines_consumed} line(s))",
                case.name()
            ),
            ScanEvent::RecordEmitted {
                page_number,
                record,
            } => format!(
                "Page {page_number}: cube {} strength {}",
                record.full_mark(),
                record.compressive_strength
            ),
            ScanEvent::MarkUnparsed { page_number, mark } => {
                format!("Page {page_number}: could not parse cube mark '{mark}'")
            }
            ScanEvent::PageScanned {
                page_number,
                records,
            } => format!("Page {page_number}: {records} cubes extracted"),
            ScanEvent::PageEmpty { page_number } => format!("Page {page_number}: no cubes found"),
            ScanEvent::PageSkipped {
                page_number,
                reason,
            } => format!("Page {page_number}: skipped, {reason}"),
        }
    }
}

/// Receives extraction events. Implementations decide how (or whether) to render them.
pub trait ScanObserver {
    fn on_event(&mut self, event: ScanEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {
    fn on_event(&mut self, _event: ScanEvent) {}
}

/// Renders events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn on_event(&mut self, event: ScanEvent) {
        match event.severity() {
            TraceSeverity::Warning => tracing::warn!("{}", event.message()),
            TraceSeverity::Info => tracing::info!("{}", event.message()),
            TraceSeverity::Debug => tracing::debug!("{}", event.message()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub severity: TraceSeverity,
    pub message: String,
    #[serde(flatten)]
    pub event: ScanEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanTrace {
    pub trace_schema_version: String,
    pub entries: Vec<TraceEntry>,
}

impl Default for ScanTrace {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            entries: Vec::new(),
        }
    }
}

impl ScanTrace {
    pub fn warnings(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries
            .iter()
            .filter(|e| e.severity == TraceSeverity::Warning)
    }
}

/// Collects events into a [`ScanTrace`], optionally forwarding them to another observer.
#[derive(Default)]
pub struct TraceCollector<O: ScanObserver = NoopObserver> {
    trace: ScanTrace,
    inner: O,
}

impl TraceCollector<NoopObserver> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: ScanObserver> TraceCollector<O> {
    pub fn forwarding(inner: O) -> Self {
        Self {
            trace: ScanTrace::default(),
            inner,
        }
    }

    pub fn into_trace(self) -> ScanTrace {
        self.trace
    }

    pub fn trace(&self) -> &ScanTrace {
        &self.trace
    }
}

impl<O: ScanObserver> ScanObserver for TraceCollector<O> {
    fn on_event(&mut self, event: ScanEvent) {
        self.trace.entries.push(TraceEntry {
            severity: event.severity(),
            message: event.message(),
            event: event.clone(),
        });
        self.inner.on_event(event);
    }
}

impl<T: ScanObserver + ?Sized> ScanObserver for &mut T {
    fn on_event(&mut self, event: ScanEvent) {
        (**self).on_event(event);
    }
}
