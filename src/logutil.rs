//! Helpers for keeping user-supplied text (quest titles, notes, assistant
//! context) on a single, bounded log line.

/// Longest preview written to the log, in characters.
pub const MAX_LOG_PREVIEW: usize = 120;

/// Escape control characters and cap the length so one log record stays one line.
///
/// Newlines, carriage returns and tabs become `\n`, `\r`, `\t`; other control
/// characters become `\u{..}`. Text over [`MAX_LOG_PREVIEW`] characters ends in `…`.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_LOG_PREVIEW) + 4);
    let mut chars = s.chars();
    for ch in chars.by_ref().take(MAX_LOG_PREVIEW) {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.extend(c.escape_unicode()),
            c => out.push(c),
        }
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}
