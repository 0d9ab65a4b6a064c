use unicode_normalization::UnicodeNormalization;

/// Value for a `Content-Disposition: attachment` header. Carries an ASCII
/// fallback name plus the exact UTF-8 name in `filename*`.
pub fn attachment_disposition(file_name: &str) -> String {
    let name: String = file_name.nfc().collect();
    let name = name.trim();
    let name = if name.is_empty() { "download" } else { name };

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback(name),
        urlencoding::encode(name)
    )
}

fn ascii_fallback(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.nfkd() {
        match c {
            '"' | '\\' => out.push('\''),
            c if c.is_ascii_control() => {}
            c if c.is_ascii() => out.push(c),
            // combining marks left over from decomposition
            c if ('\u{0300}'..='\u{036f}').contains(&c) => {}
            _ => out.push('_'),
        }
    }

    let trimmed = out.trim();
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}
