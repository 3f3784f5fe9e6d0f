use anyhow::Result;
use brief_core::{NewsService, PdfExport, Report};

use crate::ExportFormat;

/// Write `report` in `format` and describe each file written.
pub fn write_report(service: &NewsService, report: &Report, format: ExportFormat) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    if format.includes_markdown() {
        let path = service.export_markdown(report)?;
        lines.push(format!("✓ Markdown saved to: {}", path.display()));
    }

    if format.includes_pdf() {
        match service.export_pdf(report)? {
            PdfExport::Written(path) => {
                lines.push(format!("✓ PDF saved to: {}", path.display()));
            }
            PdfExport::MarkdownFallback { path, reason } => {
                lines.push(format!("⚠ PDF generation failed: {}", reason));
                lines.push(format!("✓ Saved as Markdown instead: {}", path.display()));
            }
        }
    }

    Ok(lines)
}
