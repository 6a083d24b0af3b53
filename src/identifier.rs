//! Member identifier extraction from scanned codes.
//!
//! Member QR codes carry an address-like token (`0x` followed by 40 hex
//! digits). Depending on the wallet that produced the code, the token may be
//! bare, wrapped in an `ethereum:` payment URI, or embedded in longer text.
//! [`extract_identifier`] normalizes all of these to the bare token.

/// Number of hex digits following the `0x` prefix.
pub const IDENTIFIER_HEX_LEN: usize = 40;

/// Total length of a canonical identifier, prefix included.
pub const IDENTIFIER_LEN: usize = IDENTIFIER_HEX_LEN + 2;

/// URI scheme used by wallet apps when encoding an address as a QR code.
pub const ETHEREUM_URI_SCHEME: &str = "ethereum:";

/// Extracts the canonical member identifier from scanned text.
///
/// The text is trimmed, then matched against the known encodings in
/// priority order:
///
/// 1. the whole text is a canonical identifier;
/// 2. the text is `ethereum:` followed by a canonical identifier;
/// 3. the text contains a canonical identifier anywhere, in which case the
///    leftmost one is returned.
///
/// Returns `None` when no encoding matches. The letter case of the token is
/// preserved.
///
/// # Example
///
/// ```
/// use gym_checkin::identifier::extract_identifier;
///
/// let address = "0x52908400098527886E0F7030069857D2E4169EE7";
/// assert_eq!(extract_identifier(address), Some(address));
/// assert_eq!(
///     extract_identifier(&format!("ethereum:{}", address)),
///     Some(address)
/// );
/// assert_eq!(extract_identifier("hello gym"), None);
/// ```
pub fn extract_identifier(text: &str) -> Option<&str> {
    let text = text.trim();

    if is_canonical_identifier(text) {
        return Some(text);
    }

    if let Some(token) = strip_prefix_ignore_case(text, ETHEREUM_URI_SCHEME) {
        if is_canonical_identifier(token) {
            return Some(token);
        }
    }

    find_embedded_identifier(text)
}

/// Returns true if `text` is exactly `0x` followed by 40 hex digits.
///
/// The prefix and the digits are matched case-insensitively.
pub fn is_canonical_identifier(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == IDENTIFIER_LEN && starts_token_at(bytes, 0)
}

/// Finds the leftmost canonical identifier embedded in `text`.
fn find_embedded_identifier(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.len() < IDENTIFIER_LEN {
        return None;
    }

    // A match is all ASCII, so the slice bounds always fall on char boundaries.
    (0..=bytes.len() - IDENTIFIER_LEN)
        .find(|&start| starts_token_at(bytes, start))
        .map(|start| &text[start..start + IDENTIFIER_LEN])
}

fn starts_token_at(bytes: &[u8], start: usize) -> bool {
    let Some(candidate) = bytes.get(start..start + IDENTIFIER_LEN) else {
        return false;
    };

    candidate[0] == b'0'
        && candidate[1].eq_ignore_ascii_case(&b'x')
        && candidate[2..].iter().all(u8::is_ascii_hexdigit)
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}
