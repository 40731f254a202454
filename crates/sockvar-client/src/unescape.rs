//! Backslash escape handling for outbound messages.
//!
//! Messages arrive as single-line text, so control characters are written as
//! escapes: `MessageID=1234\r\nPhoneNumber=8051290\r\n`.
//!
//! | escape | byte |
//! |--------|------|
//! | `\n`   | LF   |
//! | `\r`   | CR   |
//! | `\t`   | TAB  |
//! | `\b`   | BS   |
//! | `\f`   | FF   |
//!
//! Any other escaped character stands for itself (`\\` is a backslash,
//! `\,` a comma). A lone trailing backslash is kept.

/// Replaces escape sequences in `message` with the bytes they stand for.
///
/// # Example
///
/// ```rust
/// use sockvar_client::unescape;
///
/// assert_eq!(unescape(r"A=1\r\n"), b"A=1\r\n");
/// ```
pub fn unescape(message: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len());
    let mut bytes = message.bytes();

    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let decoded = match bytes.next() {
            None => b'\\',
            Some(b'n') => b'\n',
            Some(b'r') => b'\r',
            Some(b't') => b'\t',
            Some(b'b') => 0x08,
            Some(b'f') => 0x0c,
            Some(other) => other,
        };
        out.push(decoded);
    }

    out
}
