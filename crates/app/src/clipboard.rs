//! System clipboard access for invite links

use std::io::Write;
use std::process::{Command, Stdio};

/// Put `text` on the clipboard: arboard first, then `wl-copy`.
/// Returns false when neither worked.
pub fn copy_to_clipboard(text: &str) -> bool {
    let copied_by = if with_arboard(text) {
        "arboard"
    } else if with_wl_copy(text) {
        "wl-copy"
    } else {
        tracing::warn!("No clipboard available for invite link");
        return false;
    };
    tracing::debug!(method = copied_by, "Invite link copied");
    true
}

fn with_arboard(text: &str) -> bool {
    arboard::Clipboard::new()
        .and_then(|mut clipboard| clipboard.set_text(text))
        .is_ok()
}

fn with_wl_copy(text: &str) -> bool {
    let spawned = Command::new("wl-copy")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let Ok(mut child) = spawned else {
        return false;
    };

    let written = child
        .stdin
        .take()
        .map_or(true, |mut stdin| stdin.write_all(text.as_bytes()).is_ok());
    // reap the child even when the write failed
    let exited_ok = matches!(child.wait(), Ok(status) if status.success());
    written && exited_ok
}
