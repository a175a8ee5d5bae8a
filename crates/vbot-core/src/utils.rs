use std::path::Path;

use crate::dialog::FileKind;
use crate::domain::UserId;

pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        "file".to_string()
    } else {
        out
    }
}

/// Build a unique local name for a downloaded upload. Photos come without a
/// file name from the transport.
pub fn upload_file_name(
    prefix: &str,
    user: UserId,
    original: Option<&str>,
    kind: FileKind,
) -> String {
    let ts = chrono::Utc::now().timestamp_millis();
    match original {
        Some(name) => format!("{prefix}_{}_{ts}_{}", user.0, sanitize_filename(name)),
        None => {
            let ext = match kind {
                FileKind::Photo => "jpg",
                FileKind::Document => "bin",
            };
            format!("{prefix}_{}_{ts}.{ext}", user.0)
        }
    }
}

pub fn is_image_path(path: &str) -> bool {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    matches!(
        ext.as_deref(),
        Some("jpg") | Some("jpeg") | Some("png") | Some("gif") | Some("webp")
    )
}
