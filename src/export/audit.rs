use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::scan_result::AuditRecord;

/// Append records to a JSON Lines audit log, creating it if needed.
pub fn append_audit_log(records: &[AuditRecord], output_path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_path)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
