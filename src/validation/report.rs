//! Findings produced by [`validate_item`](super::validate_item).

use std::fmt;

use serde::Serialize;

/// Everything found wrong with one item, in discovery order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// No errors, and in strict mode no warnings either.
    pub fn passes(&self, strict: bool) -> bool {
        self.error_count() == 0 && (!strict || self.warning_count() == 0)
    }

    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }
        writeln!(
            f,
            "Validation found {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

/// One finding, located by [`IssueContext`].
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message, context)
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warn",
        };
        write!(f, "{tag:<5} {:?} ({}): {}", self.code, self.context, self.message)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Conversion recovers, usually by writing a background frame.
    Warning,
    /// Conversion fails, or drops the data silently.
    Error,
}

/// Stable issue codes; the JSON output uses their snake_case names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// The slot has zero width or height.
    InvalidDimensions,
    /// No frame carries a raster layer.
    NoRasterData,
    DuplicateAnnotationId,
    EmptyAnnotationName,
    /// A frame is listed without a raster layer.
    MissingRasterLayer,
    /// A frame index is at or beyond the frame count.
    FrameOutOfRange,
    /// The flat RLE array has odd length.
    OddRleLength,
    /// The runs do not cover exactly `width * height` pixels.
    RlePixelCountMismatch,
    /// `total_pixels` disagrees with the slot dimensions.
    TotalPixelsMismatch,
    /// A mask value in the RLE has no entry in the frame's mapping.
    UnmappedMaskValue,
    /// The frame's mapping refers to an annotation that does not exist.
    UnknownMappingTarget,
}

/// Where an issue was found.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    Item,
    Frame { index: usize },
    Annotation { id: String },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Item => f.write_str("item"),
            IssueContext::Frame { index } => write!(f, "frame {index}"),
            IssueContext::Annotation { id } => write!(f, "annotation {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_fails_on_warnings_only() {
        let mut report = ValidationReport::default();
        assert!(report.passes(true));

        report.add(ValidationIssue::warning(
            IssueCode::MissingRasterLayer,
            "no raster",
            IssueContext::Frame { index: 2 },
        ));
        assert!(report.passes(false));
        assert!(!report.passes(true));
        assert_eq!(
            report.issues[0].to_string(),
            "warn  MissingRasterLayer (frame 2): no raster"
        );
    }
}
