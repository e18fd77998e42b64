use std::borrow::Cow;
use std::str::Utf8Error;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use thiserror::Error;

/// Why a stored component could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentDecodeError {
    /// A `%` not followed by two hex digits.
    #[error("malformed percent escape at byte {offset}")]
    MalformedEscape { offset: usize },
    #[error("decoded bytes are not UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),
}

/// Characters escaped by `encodeURIComponent`: everything except
/// alphanumerics and `- _ . ! ~ * ' ( )`.
const URI_COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a user-supplied name so it is safe inside a stored record.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT_ENCODE_SET).to_string()
}

/// Reverse of [`encode_component`].
///
/// Unlike `percent_decode_str` alone, a stray `%` is an error, as it is for
/// `decodeURIComponent`.
pub fn decode_component(value: &str) -> Result<String, ComponentDecodeError> {
    let bytes = value.as_bytes();
    for (offset, _) in value.match_indices('%') {
        let escape = bytes.get(offset + 1..offset + 3);
        if !escape.is_some_and(|digits| digits.iter().all(u8::is_ascii_hexdigit)) {
            return Err(ComponentDecodeError::MalformedEscape { offset });
        }
    }
    Ok(percent_decode_str(value).decode_utf8().map(Cow::into_owned)?)
}
