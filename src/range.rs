use crate::ByteRange;

const BYTES_UNIT: &str = "bytes";

/// Parses a single `Range` header value against a payload of `size` bytes.
///
/// Accepts `bytes=<start>-<end>`, `bytes=<start>-` and the suffix form
/// `bytes=-<n>`, with a case-insensitive unit. Anything after the first range
/// spec (further ranges, a `/<length>` tail) is ignored. Returns `None` for an
/// absent, malformed or unsatisfiable header, which callers treat the same as
/// no header at all.
pub fn parse_range(header: Option<&str>, size: u64) -> Option<ByteRange> {
    let spec = header?.trim();
    if spec.is_empty() {
        return None;
    }

    let (unit, rest) = spec.split_at_checked(BYTES_UNIT.len())?;
    if !unit.eq_ignore_ascii_case(BYTES_UNIT) {
        return None;
    }
    let rest = rest.strip_prefix('=')?;

    let (first, rest) = take_digits(rest);
    let rest = rest.strip_prefix('-')?;
    let (last, _) = take_digits(rest);

    let first = parse_position(first);
    let last = parse_position(last);

    if size == 0 {
        return None;
    }
    let end_index = size - 1;

    let (start, end) = match (first, last) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, end_index),
        // suffix form, the last `n` bytes
        (None, Some(suffix)) => (size.saturating_sub(suffix), end_index),
        (None, None) => return None,
    };

    let end = end.min(end_index);
    if start > end {
        return None;
    }

    Some(ByteRange::new(start, end))
}

fn take_digits(s: &str) -> (&str, &str) {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    s.split_at(len)
}

/// `None` for an omitted position. Positions past `u64::MAX` saturate, so an
/// oversized end clamps to the last byte and an oversized start is rejected.
fn parse_position(digits: &str) -> Option<u64> {
    if digits.is_empty() {
        return None;
    }
    // only ASCII digits reach here, so overflow is the sole parse failure
    Some(digits.parse::<u64>().unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let tests = [
            (Some("bytes=0-100"), 200, Some(ByteRange::new(0, 100))),
            (Some("bytes=0-0"), 500, Some(ByteRange::new(0, 0))),
            (Some("bytes=0-"), 500, Some(ByteRange::new(0, 499))),
            (Some("bytes=100-"), 500, Some(ByteRange::new(100, 499))),
            (Some("bytes=499-"), 500, Some(ByteRange::new(499, 499))),
            (Some("bytes=100-200"), 500, Some(ByteRange::new(100, 200))),
            (Some("bytes=-100"), 500, Some(ByteRange::new(400, 499))),
            (Some("bytes=-1"), 500, Some(ByteRange::new(499, 499))),
            (Some("bytes=-24646"), 500, Some(ByteRange::new(0, 499))),
            (Some("bytes=0-24646"), 500, Some(ByteRange::new(0, 499))),
            (Some("bytes=0-24646/*"), 500, Some(ByteRange::new(0, 499))),
            (Some("bytes=0-4,-1"), 500, Some(ByteRange::new(0, 4))),
            (Some("BYTES=10-19"), 500, Some(ByteRange::new(10, 19))),
            (Some("  bytes=10-19  "), 500, Some(ByteRange::new(10, 19))),
            (None, 500, None),
            (Some(""), 500, None),
            (Some("none"), 500, None),
            (Some("bleets=100-324"), 500, None),
            (Some("bytes=-"), 500, None),
            (Some("bytes=100"), 500, None),
            (Some("bytes:0-10"), 500, None),
            (Some("bytes=-0"), 500, None),
            (Some("bytes=500-100"), 1000, None),
            (Some("bytes=500-100"), 10, None),
            (Some("bytes=500-"), 500, None),
            (Some("bytes=5000-6000"), 1000, None),
            (Some("bytes=0-0"), 0, None),
            (Some("bytes=-5"), 0, None),
            (Some("bytes=99999999999999999999-"), 500, None),
            (Some("bytes=99999999999999999999-99999999999999999999"), 500, None),
            (Some("bytes=0-99999999999999999999"), 1000, Some(ByteRange::new(0, 999))),
            (Some("bytes=-99999999999999999999"), 1000, Some(ByteRange::new(0, 999))),
        ];

        for (i, (header, size, expected)) in tests.iter().enumerate() {
            let result = parse_range(*header, *size);
            assert_eq!(result, *expected, "Failed to parse range header #{i}: {:?}", tests[i]);
        }
    }

    #[test]
    fn test_first_byte_for_any_size() {
        for size in [1, 2, 54, 1000, u64::MAX] {
            assert_eq!(Some(ByteRange::new(0, 0)), parse_range(Some("bytes=0-0"), size));
        }
    }

    #[test]
    fn test_suffix_takes_last_n_bytes() {
        let size = 1000;
        for n in [1, 2, 500, 999] {
            let header = format!("bytes=-{n}");
            assert_eq!(Some(ByteRange::new(size - n, size - 1)), parse_range(Some(&header), size));
        }
    }

    #[test]
    fn test_open_ended_runs_to_end_of_file() {
        let size = 1000;
        for k in [0, 1, 500, 999] {
            let header = format!("bytes={k}-");
            assert_eq!(Some(ByteRange::new(k, size - 1)), parse_range(Some(&header), size));
        }
    }
}
