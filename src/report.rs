use tracing::info;

/// Receives ordered blocks of text lines. Formatting is up to the sink.
pub trait ReportSink {
    fn section(&mut self, title: &str, lines: Vec<String>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub title: String,
    pub lines: Vec<String>,
}

/// Keeps every section in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub sections: Vec<ReportSection>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, title: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.title == title)
    }
}

impl ReportSink for MemorySink {
    fn section(&mut self, title: &str, lines: Vec<String>) {
        self.sections.push(ReportSection {
            title: title.to_string(),
            lines,
        });
    }
}

/// Emits each line through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn section(&mut self, title: &str, lines: Vec<String>) {
        info!("=== {} ===", title);
        for line in lines {
            info!("    {}", line);
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn section(&mut self, _title: &str, _lines: Vec<String>) {}
}
