//! Key/value parsing of decoded response bodies.
//!
//! A body is a run of tokens separated by any single `\r`, `\n` or `=`.
//! Tokens are taken three at a time: key, value, and one separator token that
//! is thrown away. With the usual `KEY=VALUE\r\n` lines the discarded token is
//! the empty string between `\r` and `\n`.
//!
//! Parsing never fails. Blank keys are dropped together with their value, and
//! a trailing key with no value is ignored.

use sockvar_core::VariableEntry;

/// Bytes that end a token.
pub const DELIMITERS: &[u8; 3] = b"\r\n=";

/// Splits a byte slice on [`DELIMITERS`], yielding empty tokens between
/// adjacent delimiters and a final token after the last delimiter.
struct Tokens<'a> {
    rest: Option<&'a [u8]>,
}

impl<'a> Tokens<'a> {
    fn new(body: &'a [u8]) -> Self {
        Self { rest: Some(body) }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let rest = self.rest?;
        match rest.iter().position(|b| DELIMITERS.contains(b)) {
            Some(i) => {
                self.rest = Some(&rest[i + 1..]);
                Some(&rest[..i])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

fn is_blank(key: &[u8]) -> bool {
    key.iter().all(u8::is_ascii_whitespace)
}

fn text(token: &[u8]) -> String {
    String::from_utf8_lossy(token).into_owned()
}

/// Parses a decoded response body into variables, in body order.
///
/// # Example
///
/// ```rust
/// use sockvar_protocol::parse_response;
///
/// let vars = parse_response(b"A=1\r\nB=2\r\n");
/// assert_eq!(vars.len(), 2);
/// assert_eq!(vars[1].key, "B");
/// ```
pub fn parse_response(body: &[u8]) -> Vec<VariableEntry> {
    let mut tokens = Tokens::new(body);
    let mut entries = Vec::new();

    while let Some(key) = tokens.next() {
        let value = tokens.next();
        tokens.next();

        if let Some(value) = value
            && !is_blank(key)
        {
            entries.push(VariableEntry::new(text(key), text(value)));
        }
    }

    entries
}
