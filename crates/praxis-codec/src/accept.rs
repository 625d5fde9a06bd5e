//! `Accept` header parsing.

/// One media range from an `Accept` header, reconstructed as a full
/// `type/subtype(+suffix)` string plus its quality weight.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    /// The lowercased `type/subtype(+suffix)` string.
    pub full_type: String,
    /// The `q` parameter, defaulting to 1.0.
    pub quality: f32,
}

impl MediaRange {
    /// Creates a range with quality 1.0.
    #[must_use]
    pub fn new(full_type: impl Into<String>) -> Self {
        Self {
            full_type: full_type.into().to_ascii_lowercase(),
            quality: 1.0,
        }
    }

    /// Returns `true` if this range names the given mime type,
    /// case-insensitively.
    #[must_use]
    pub fn matches(&self, mime_type: &str) -> bool {
        self.full_type.eq_ignore_ascii_case(mime_type)
    }
}

/// Parses an `Accept` header into media ranges ordered by preference.
///
/// Ranges are sorted by quality, descending; ties keep the header order.
/// Malformed entries are skipped rather than failing the whole header.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = Vec::new();
    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let Some(full_type) = parts.next().map(str::trim) else {
            continue;
        };
        if full_type.is_empty() || !full_type.contains('/') {
            continue;
        }
        let mut range = MediaRange::new(full_type);
        for param in parts {
            let mut pair = param.splitn(2, '=');
            let name = pair.next().map(str::trim);
            let value = pair.next().map(str::trim);
            if let (Some("q"), Some(value)) = (name, value) {
                if let Ok(quality) = value.parse::<f32>() {
                    range.quality = quality.clamp(0.0, 1.0);
                }
            }
        }
        ranges.push(range);
    }
    ranges.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orders_by_quality() {
        let ranges = parse_accept("text/csv;q=0.5, application/json");
        assert_eq!(ranges[0].full_type, "application/json");
        assert_eq!(ranges[1].full_type, "text/csv");
    }

    #[test]
    fn test_parse_preserves_suffix() {
        let ranges = parse_accept("Application/HAL+JSON");
        assert_eq!(ranges[0].full_type, "application/hal+json");
        assert!(ranges[0].matches("application/hal+json"));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let ranges = parse_accept("garbage, text/html");
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].full_type, "text/html");
        let ranges = parse_accept("notamime");
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_ties_keep_header_order() {
        let ranges = parse_accept("text/html, application/json");
        assert_eq!(ranges[0].full_type, "text/html");
    }
}
