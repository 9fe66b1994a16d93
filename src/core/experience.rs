use once_cell::sync::Lazy;
use regex::Regex;

/// One bucket part: `5`, `1-3`, `+10` or `10+`
static RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?\s*(\d+(?:[.,]\d+)?)\s*(?:-\s*(\d+(?:[.,]\d+)?))?\s*\+?$")
        .expect("experience pattern is valid")
});

fn parse_number(s: &str) -> Option<f64> {
    s.replace(',', ".").parse().ok()
}

/// Parse a years-of-experience bucket into a single number
///
/// `[0-1]` is the range midpoint (0.5), `[+10]` and `10+` are 10, plain
/// numbers parse as-is, and `[3-5] | [1-3]` takes the largest part (4).
/// Parts that do not parse are skipped; `None` when nothing parses.
pub fn parse_experience(raw: &str) -> Option<f64> {
    raw.split('|')
        .filter_map(|part| {
            let part = part.trim().trim_start_matches('[').trim_end_matches(']').trim();
            if part.is_empty() {
                return None;
            }
            let caps = RANGE_PATTERN.captures(part)?;
            let low = parse_number(caps.get(1)?.as_str())?;
            match caps.get(2) {
                Some(high) => Some((low + parse_number(high.as_str())?) / 2.0),
                None => Some(low),
            }
        })
        .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_formats() {
        assert_eq!(parse_experience("[0-1]"), Some(0.5));
        assert_eq!(parse_experience("[+10]"), Some(10.0));
        assert_eq!(parse_experience("10+"), Some(10.0));
        assert_eq!(parse_experience("5"), Some(5.0));
        assert_eq!(parse_experience(" [3-5] | [1-3] "), Some(4.0));
        assert_eq!(parse_experience("[1,5-2,5]"), Some(2.0));
    }

    #[test]
    fn test_unparseable_parts_are_skipped() {
        assert_eq!(parse_experience("[junior] | [2-4]"), Some(3.0));
        assert_eq!(parse_experience("unknown"), None);
        assert_eq!(parse_experience(""), None);
        assert_eq!(parse_experience("[] | []"), None);
    }
}
