//! Wire format for sockvar: a Base64 body terminated by `\r\n\r\n`, and the
//! key/value convention used in response bodies.
//!
//! # Protocol Overview
//!
//! One request, one response, then the connection closes:
//! - the client sends `Base64(payload)` followed by `\r\n\r\n`
//! - the server answers with `Base64(body)`, usually also terminated
//! - the decoded body holds `KEY=VALUE\r\n` lines
//!
//! # Example
//!
//! ```rust
//! use sockvar_protocol::{deframe, frame, parse_response};
//!
//! let wire = frame(b"Result=OK\r\n").unwrap();
//! let vars = parse_response(&deframe(&wire));
//! assert_eq!(vars[0].key, "Result");
//! assert_eq!(vars[0].value, "OK");
//! ```

pub mod base64;
mod error;
mod framing;
mod parser;

pub use error::{ProtocolError, ProtocolResult, is_timeout};
pub use framing::{
    FrameAccumulator, FrameStatus, FrameWriter, TERMINATOR, deframe, find_terminator, frame,
};
pub use parser::{DELIMITERS, parse_response};

/// Maximum encoded frame size, terminator included (1 MB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;
