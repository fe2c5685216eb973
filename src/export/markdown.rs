use std::fmt::Write;
use std::path::Path;

use crate::models::batch::BatchReport;
use crate::models::scan_result::human_readable_size;

pub fn export_markdown(report: &BatchReport, output_path: &Path) -> anyhow::Result<()> {
    std::fs::write(output_path, render_markdown(report)?)?;
    Ok(())
}

pub fn render_markdown(report: &BatchReport) -> Result<String, std::fmt::Error> {
    let mut md = String::new();

    writeln!(md, "# Upload Scan Report")?;
    writeln!(md)?;
    for root in &report.roots {
        writeln!(md, "- **Path:** {}", root.display())?;
    }
    writeln!(md, "- **Files:** {}", report.total_files)?;
    writeln!(md, "- **Unsafe Files:** {}", report.unsafe_files)?;
    writeln!(md, "- **Threats:** {}", report.total_threats)?;
    writeln!(md, "- **Total Size:** {}", human_readable_size(report.total_bytes))?;
    writeln!(md, "- **Scan Duration:** {:.2}s", report.scan_duration.as_secs_f64())?;
    writeln!(md)?;

    writeln!(md, "## Files")?;
    writeln!(md)?;
    writeln!(md, "| Name | Type | Size | Verdict | Threats |")?;
    writeln!(md, "|------|------|------|---------|---------|")?;
    for file in &report.files {
        let verdict = if file.result.is_safe { "✅ safe" } else { "⛔ unsafe" };
        writeln!(
            md,
            "| {} | {} | {} | {} | {} |",
            escape_cell(&file.declared_name),
            file.result.file_type,
            human_readable_size(file.result.file_size_bytes),
            verdict,
            file.result.threat_count(),
        )?;
    }

    let flagged: Vec<_> = report.files.iter().filter(|f| !f.result.is_safe).collect();
    if !flagged.is_empty() {
        writeln!(md)?;
        writeln!(md, "## Threats")?;
        for file in flagged {
            writeln!(md)?;
            writeln!(md, "### {}", file.path.display())?;
            writeln!(md)?;
            if !file.result.checksum.is_empty() {
                writeln!(md, "SHA-256: `{}`", file.result.checksum)?;
                writeln!(md)?;
            }
            for threat in &file.result.threats {
                writeln!(md, "- {}", threat)?;
            }
        }
    }

    Ok(md)
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}
