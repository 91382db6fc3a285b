//! `Content-Disposition` filename extraction.

use percent_encoding::percent_decode_str;

/// Extracts the filename from a `Content-Disposition` header value.
///
/// Tried in order: the RFC 5987 `filename*=UTF-8''...` form, a quoted
/// `filename="..."`, then a bare `filename=...`. The result is
/// percent-decoded; a value that does not decode to UTF-8 is returned raw.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let raw = extended(header)
        .or_else(|| quoted(header))
        .or_else(|| bare(header))?;
    Some(decode(raw))
}

fn extended(header: &str) -> Option<&str> {
    header
        .match_indices("filename*=UTF-8''")
        .find_map(|(at, prefix)| until(&header[at + prefix.len()..], ';'))
}

fn quoted(header: &str) -> Option<&str> {
    header
        .match_indices("filename=\"")
        .find_map(|(at, prefix)| {
            let rest = &header[at + prefix.len()..];
            let end = rest.find('"')?;
            Some(&rest[..end]).filter(|v| !v.is_empty())
        })
}

fn bare(header: &str) -> Option<&str> {
    header
        .match_indices("filename=")
        .find_map(|(at, prefix)| until(&header[at + prefix.len()..], ';'))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Non-empty prefix of `s` up to `stop` or the end.
fn until(s: &str, stop: char) -> Option<&str> {
    let value = s.split(stop).next().unwrap_or_default();
    (!value.is_empty()).then_some(value)
}

fn decode(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}
