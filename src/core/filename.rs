use std::path::Path;

const MAX_FILE_NAME_LEN: usize = 255;

/// Make a client-supplied file name safe to store.
///
/// Characters outside `[A-Za-z0-9.-]` become `_`, dot runs collapse to one
/// dot, a single leading dot is dropped and the result is cut to 255 chars.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        };
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.strip_prefix('.').unwrap_or(&out);
    trimmed.chars().take(MAX_FILE_NAME_LEN).collect()
}

/// Lowercased extension with its leading dot, if the name has one.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}
