use crate::error::{AnalysisError, Result};
use structscope_api::{LineIndex, SectionExtract};

/// Cuts lines `start_line..=end_line` (1-based) out of `text`. An end past
/// the last line is clamped.
pub fn extract(path: &str, text: &str, start_line: usize, end_line: usize) -> Result<SectionExtract> {
    if start_line == 0 {
        return Err(AnalysisError::InvalidArgument(
            "start_line is 1-based and must be at least 1".into(),
        ));
    }
    if start_line > end_line {
        return Err(AnalysisError::InvalidArgument(format!(
            "start_line {start_line} is after end_line {end_line}"
        )));
    }

    let lines = LineIndex::new(text);
    let total_lines = lines.line_count();
    let range = lines.lines_range(start_line, end_line).ok_or_else(|| {
        AnalysisError::InvalidArgument(format!(
            "start_line {start_line} is past the end of {path} ({total_lines} lines)"
        ))
    })?;

    Ok(SectionExtract {
        path: path.to_string(),
        requested_start: start_line,
        requested_end: end_line,
        start_line,
        end_line: end_line.min(total_lines),
        total_lines,
        content: text[range].to_string(),
    })
}
