use ariadne::{Color, Label, Report, ReportKind, Source};

use tb_core::TbError;

/// Render a formula error against its source using ariadne.
///
/// Errors without a span (validation failures) underline the whole formula.
pub fn render_error(source: &str, filename: &str, error: &TbError) -> String {
    let span = error.span().unwrap_or(0..source.len());
    let label_text = match error {
        TbError::Validation(_) => "rejected here",
        TbError::Calculation { .. } => "here",
        TbError::ResourceNotFound(_) => "unknown",
    };

    let mut output = Vec::new();
    Report::build(ReportKind::Error, (filename, span.clone()))
        .with_code(error.code().as_str())
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, span))
                .with_message(label_text)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut output)
        .ok();

    String::from_utf8(output).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate;
    use tb_core::StatMap;

    #[test]
    fn render_points_at_failing_token() {
        let source = "{Body} + ) 2";
        let err = evaluate(source, &StatMap::new()).unwrap_err();
        let output = render_error(source, "formula", &err);
        assert!(output.contains("unexpected"));
        assert!(output.contains("CALCULATION_ERROR"));
    }

    #[test]
    fn render_without_span() {
        let err = TbError::Validation("too many dice".into());
        let output = render_error("5000d6", "formula", &err);
        assert!(output.contains("too many dice"));
    }
}
