use std::fmt::Write;
use std::path::Path;

use crate::models::batch::{BatchReport, FileReport};
use crate::models::scan_result::human_readable_size;

pub fn export_html(report: &BatchReport, output_path: &Path) -> anyhow::Result<()> {
    let mut html = String::new();

    write!(html, r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Upload Scan Report</title>
<style>
    body {{ font-family: -apple-system, system-ui, sans-serif; margin: 20px; background: #1a1a2e; color: #e0e0e0; }}
    h1 {{ color: #00d4ff; }}
    h2 {{ color: #5dade2; margin-top: 30px; }}
    .summary {{ background: #16213e; padding: 15px; border-radius: 8px; margin-bottom: 20px; }}
    .summary p {{ margin: 6px 0; }}
    .summary strong {{ color: #00d4ff; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ text-align: left; padding: 6px 10px; border-bottom: 1px solid #0f3460; }}
    .safe {{ color: #2ecc71; }}
    .unsafe {{ color: #e74c3c; }}
    .threats {{ background: #2c1a1a; padding: 15px; border-radius: 8px; border-left: 3px solid #e74c3c; margin-bottom: 10px; }}
    code {{ color: #aaa; }}
</style>
</head>
<body>
"#)?;

    writeln!(html, "<h1>Upload Scan Report</h1>")?;
    writeln!(html, "<div class=\"summary\">")?;
    for root in &report.roots {
        writeln!(html, "<p><strong>Path:</strong> {}</p>", escape_html(&root.display().to_string()))?;
    }
    writeln!(html, "<p><strong>Files:</strong> {}</p>", report.total_files)?;
    writeln!(html, "<p><strong>Unsafe Files:</strong> {}</p>", report.unsafe_files)?;
    writeln!(html, "<p><strong>Threats:</strong> {}</p>", report.total_threats)?;
    writeln!(html, "<p><strong>Total Size:</strong> {}</p>", human_readable_size(report.total_bytes))?;
    writeln!(html, "<p><strong>Scan Duration:</strong> {:.2}s</p>", report.scan_duration.as_secs_f64())?;
    writeln!(html, "</div>")?;

    writeln!(html, "<h2>Files</h2>")?;
    writeln!(html, "<table>")?;
    writeln!(html, "<tr><th>Name</th><th>Type</th><th>Size</th><th>Verdict</th><th>Threats</th></tr>")?;
    for file in &report.files {
        write_file_row(&mut html, file)?;
    }
    writeln!(html, "</table>")?;

    let flagged: Vec<&FileReport> = report.files.iter().filter(|f| !f.result.is_safe).collect();
    if !flagged.is_empty() {
        writeln!(html, "<h2>Threats</h2>")?;
        for file in flagged {
            writeln!(html, "<div class=\"threats\">")?;
            writeln!(html, "<strong>{}</strong>", escape_html(&file.path.display().to_string()))?;
            if !file.result.checksum.is_empty() {
                writeln!(html, "<p><code>sha256:{}</code></p>", file.result.checksum)?;
            }
            writeln!(html, "<ul>")?;
            for threat in &file.result.threats {
                writeln!(html, "<li>{}</li>", escape_html(threat))?;
            }
            writeln!(html, "</ul>")?;
            writeln!(html, "</div>")?;
        }
    }

    writeln!(html, "</body>\n</html>")?;

    std::fs::write(output_path, html)?;
    Ok(())
}

fn write_file_row(html: &mut String, file: &FileReport) -> std::fmt::Result {
    let (class, verdict) = if file.result.is_safe {
        ("safe", "safe")
    } else {
        ("unsafe", "unsafe")
    };
    writeln!(
        html,
        "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>",
        escape_html(&file.declared_name),
        file.result.file_type,
        human_readable_size(file.result.file_size_bytes),
        class,
        verdict,
        file.result.threat_count(),
    )
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
