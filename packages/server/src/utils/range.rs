use common::storage::ByteRange;

/// The `Range` header could not be honoured as a single byte range.
#[derive(Debug, PartialEq, Eq)]
pub struct MalformedRange;

/// Parse a `Range` header value.
///
/// Only a single `bytes=<start>-<end?>` range is supported. Returns
/// `Ok(None)` for units other than `bytes`, which are ignored per RFC 9110.
/// Suffix ranges (`bytes=-500`), multiple ranges, non-numeric bounds and
/// inverted bounds are malformed.
pub fn parse_range_header(value: &str) -> Result<Option<ByteRange>, MalformedRange> {
    let value = value.trim();
    let Some((unit, spec)) = value.split_once('=') else {
        return Err(MalformedRange);
    };
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return Ok(None);
    }

    let spec = spec.trim();
    if spec.contains(',') {
        return Err(MalformedRange);
    }

    let (start, end) = spec.split_once('-').ok_or(MalformedRange)?;
    let start = parse_bound(start)?;
    let end = match end.trim() {
        "" => None,
        end => Some(parse_bound(end)?),
    };

    if let Some(end) = end
        && end < start
    {
        return Err(MalformedRange);
    }

    Ok(Some(ByteRange { start, end }))
}

fn parse_bound(s: &str) -> Result<u64, MalformedRange> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedRange);
    }
    s.parse().map_err(|_| MalformedRange)
}
