use std::path::Path;

use crate::models::batch::BatchReport;

pub fn export_json(report: &BatchReport, output_path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(output_path, json)?;
    Ok(())
}
