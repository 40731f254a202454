//! Bounded Base64 codec.
//!
//! Standard alphabet (`A-Z a-z 0-9 + /`) with `=` padding. Both directions
//! write into a caller-supplied slice and never write past its end; the
//! returned [`Written`] says how much was produced and whether output was cut
//! short.
//!
//! The decoder is deliberately lenient, matching line-oriented peers that pad
//! or wrap their output:
//! - bytes outside the alphabet (CR, LF, spaces, NUL) are skipped
//! - the first `=` flushes the partial group collected so far and ends
//!   decoding; anything after it is ignored
//! - a trailing partial group with no padding is discarded

/// The 64-character encoding alphabet.
pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Padding character.
pub const PADDING: u8 = b'=';

const INVALID: u8 = 0xFF;

const DECODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Result of a bounded encode or decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Written {
    /// Number of bytes written to the output slice.
    pub len: usize,
    /// True if the output slice was too small for the full result.
    pub truncated: bool,
}

/// Append-only view over a fixed slice that tracks remaining capacity.
struct BoundedWriter<'a> {
    out: &'a mut [u8],
    len: usize,
    truncated: bool,
}

impl<'a> BoundedWriter<'a> {
    fn new(out: &'a mut [u8]) -> Self {
        Self {
            out,
            len: 0,
            truncated: false,
        }
    }

    /// Appends as much of `bytes` as fits. Returns false once anything had
    /// to be dropped.
    fn extend(&mut self, bytes: &[u8]) -> bool {
        let remaining = self.out.len() - self.len;
        let take = bytes.len().min(remaining);
        self.out[self.len..self.len + take].copy_from_slice(&bytes[..take]);
        self.len += take;
        if take < bytes.len() {
            self.truncated = true;
        }
        !self.truncated
    }

    fn finish(self) -> Written {
        Written {
            len: self.len,
            truncated: self.truncated,
        }
    }
}

/// Length of the padded encoding of `input_len` bytes.
pub const fn encoded_len(input_len: usize) -> usize {
    input_len.div_ceil(3) * 4
}

/// Upper bound on the bytes [`decode_into`] can produce from `input_len`
/// input characters.
pub const fn decoded_len_upper_bound(input_len: usize) -> usize {
    input_len / 4 * 3 + 2
}

/// Encodes `input` into `out`, stopping at `out.len()`.
pub fn encode_into(input: &[u8], out: &mut [u8]) -> Written {
    let mut writer = BoundedWriter::new(out);

    for block in input.chunks(3) {
        let b0 = block[0];
        let b1 = block.get(1).copied().unwrap_or(0);
        let b2 = block.get(2).copied().unwrap_or(0);

        let quad = [
            ALPHABET[(b0 >> 2) as usize],
            ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize],
            if block.len() > 1 {
                ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize]
            } else {
                PADDING
            },
            if block.len() > 2 {
                ALPHABET[(b2 & 0x3f) as usize]
            } else {
                PADDING
            },
        ];

        if !writer.extend(&quad) {
            break;
        }
    }

    writer.finish()
}

/// Decodes `input` into `out`, stopping at `out.len()`.
pub fn decode_into(input: &[u8], out: &mut [u8]) -> Written {
    let mut writer = BoundedWriter::new(out);
    let mut group = [0u8; 4];
    let mut filled: usize = 0;

    for &c in input {
        if c == PADDING {
            // 2 sextets carry one whole byte, 3 carry two.
            let keep = filled.saturating_sub(1);
            writer.extend(&unpack(&group)[..keep]);
            break;
        }

        let sextet = DECODE_TABLE[c as usize];
        if sextet == INVALID {
            continue;
        }

        group[filled] = sextet;
        filled += 1;
        if filled == 4 {
            if !writer.extend(&unpack(&group)) {
                break;
            }
            group = [0; 4];
            filled = 0;
        }
    }

    writer.finish()
}

fn unpack(group: &[u8; 4]) -> [u8; 3] {
    [
        (group[0] << 2) | (group[1] >> 4),
        (group[1] << 4) | (group[2] >> 2),
        (group[2] << 6) | group[3],
    ]
}

/// Encodes `input` into a newly allocated string.
///
/// # Example
///
/// ```rust
/// assert_eq!(sockvar_protocol::base64::encode(b"foo"), "Zm9v");
/// ```
pub fn encode(input: &[u8]) -> String {
    let mut out = vec![0u8; encoded_len(input.len())];
    let written = encode_into(input, &mut out);
    out[..written.len].iter().map(|&b| char::from(b)).collect()
}

/// Decodes `input` into a newly allocated buffer.
///
/// # Example
///
/// ```rust
/// assert_eq!(sockvar_protocol::base64::decode(b"Zm9v\r\n"), b"foo");
/// ```
pub fn decode(input: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; decoded_len_upper_bound(input.len())];
    let written = decode_into(input, &mut out);
    out.truncate(written.len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::base64::Engine;
    use ::base64::engine::general_purpose::STANDARD;

    /// Deterministic byte sequence covering every byte value.
    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 131 + 7) as u8).collect()
    }

    #[test]
    fn standard_vectors() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "Zg==");
        assert_eq!(encode(b"fo"), "Zm8=");
        assert_eq!(encode(b"foo"), "Zm9v");
        assert_eq!(encode(b"foob"), "Zm9vYg==");
        assert_eq!(encode(b"fooba"), "Zm9vYmE=");
        assert_eq!(encode(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn decodes_standard_vectors() {
        assert_eq!(decode(b""), b"");
        assert_eq!(decode(b"Zg=="), b"f");
        assert_eq!(decode(b"Zm8="), b"fo");
        assert_eq!(decode(b"Zm9v"), b"foo");
        assert_eq!(decode(b"Zm9vYmFy"), b"foobar");
    }

    #[test]
    fn roundtrip_across_padding_boundaries() {
        for len in [0, 1, 2, 3, 4, 5, 6, 255, 256, 257, 4096] {
            let data = sample(len);
            assert_eq!(decode(encode(&data).as_bytes()), data, "len {}", len);
        }
    }

    #[test]
    fn matches_reference_encoder() {
        for len in 0..64 {
            let data = sample(len);
            assert_eq!(encode(&data), STANDARD.encode(&data), "len {}", len);
        }
    }

    #[test]
    fn decodes_reference_output() {
        let data = sample(1000);
        assert_eq!(decode(STANDARD.encode(&data).as_bytes()), data);
    }

    #[test]
    fn padding_stops_decoding() {
        assert_eq!(decode(b"Zg==XYZ"), decode(b"Zg=="));
        assert_eq!(decode(b"Zm8=Zm9v"), b"fo");
    }

    #[test]
    fn skips_characters_outside_alphabet() {
        assert_eq!(decode(b"Zm9v\r\nYmFy\r\n\r\n"), b"foobar");
        assert_eq!(decode(b" Z m 9 v "), b"foo");
        assert_eq!(decode(b"\0Zm9v\0"), b"foo");
    }

    #[test]
    fn unpadded_partial_group_is_dropped() {
        assert_eq!(decode(b"Zm9vZg"), b"foo");
        assert_eq!(decode(b"Z"), b"");
    }

    #[test]
    fn padding_flushes_partial_group() {
        assert_eq!(decode(b"Zm9vZg=="), b"foof");
        assert_eq!(decode(b"Zm9vZm8="), b"foofo");
    }

    #[test]
    fn lone_padding_yields_nothing() {
        assert_eq!(decode(b"="), b"");
        assert_eq!(decode(b"Z="), b"");
    }

    #[test]
    fn binary_payload_with_nul_bytes() {
        let data = [0u8, 0, 1, 0, 255, 0];
        assert_eq!(decode(encode(&data).as_bytes()), data);
    }

    #[test]
    fn encode_stops_exactly_at_capacity() {
        let data = sample(300);
        for capacity in [0, 1, 3, 4, 5, 7, 399] {
            let mut out = vec![0xAAu8; capacity + 8];
            let written = encode_into(&data, &mut out[..capacity]);

            assert_eq!(written.len, capacity);
            assert!(written.truncated);
            assert!(out[capacity..].iter().all(|&b| b == 0xAA));
            assert_eq!(&out[..capacity], &encode(&data).as_bytes()[..capacity]);
        }
    }

    #[test]
    fn encode_exact_fit_is_not_truncated() {
        let mut out = [0u8; 4];
        let written = encode_into(b"foo", &mut out);
        assert_eq!(written, Written { len: 4, truncated: false });
        assert_eq!(&out, b"Zm9v");
    }

    #[test]
    fn decode_stops_exactly_at_capacity() {
        let data = sample(300);
        let encoded = encode(&data);
        for capacity in [0, 1, 2, 3, 4, 299] {
            let mut out = vec![0x55u8; capacity + 8];
            let written = decode_into(encoded.as_bytes(), &mut out[..capacity]);

            assert_eq!(written.len, capacity);
            assert!(written.truncated);
            assert!(out[capacity..].iter().all(|&b| b == 0x55));
            assert_eq!(&out[..capacity], &data[..capacity]);
        }
    }

    #[test]
    fn decode_padding_flush_respects_capacity() {
        let mut out = [0u8; 1];
        let written = decode_into(b"Zm8=", &mut out);
        assert_eq!(written, Written { len: 1, truncated: true });
        assert_eq!(&out, b"f");
    }

    #[test]
    fn length_helpers() {
        assert_eq!(encoded_len(0), 0);
        assert_eq!(encoded_len(1), 4);
        assert_eq!(encoded_len(3), 4);
        assert_eq!(encoded_len(4), 8);
        assert!(decoded_len_upper_bound(4) >= 3);
        assert!(decoded_len_upper_bound(3) >= 2);
    }
}
