use std::fmt;

/// Phase of the load that produced an [`ErrorReport`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorKind {
    #[default]
    None,
    Parsing,
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "No",
            Self::Parsing => "Parsing",
            Self::Validation => "Validation",
        })
    }
}

/// Errors attributed to one subject: an algorithm name, `Algorithm #<i>`,
/// or a document-level label such as `Config file error:`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorRecord {
    pub detail: String,
    pub errors: Vec<String>,
}

impl ErrorRecord {
    pub fn new(detail: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            detail: detail.into(),
            errors,
        }
    }

    pub fn single(detail: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(detail, vec![error.into()])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub records: Vec<ErrorRecord>,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, records: Vec<ErrorRecord>) -> Self {
        Self { kind, records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `<Kind> errors occurred (<n>):`
    pub fn title(&self) -> String {
        format!("{} errors occurred ({}):", self.kind, self.records.len())
    }

    pub fn formatted_text(&self) -> String {
        format_errors(&self.title(), &self.records)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted_text())
    }
}

/// Group records under `title` as blank-line separated blocks:
///
/// ```text
/// <title>
///
/// ALGORITHM: <detail>
/// - <error>
/// - <error>
/// ```
pub fn format_errors(title: &str, records: &[ErrorRecord]) -> String {
    let blocks: Vec<String> = records
        .iter()
        .map(|record| {
            let lines: Vec<String> = record.errors.iter().map(|e| format!("- {e}")).collect();
            format!("ALGORITHM: {}\n{}", record.detail, lines.join("\n"))
        })
        .collect();
    format!("{title}\n\n{}", blocks.join("\n\n"))
}
