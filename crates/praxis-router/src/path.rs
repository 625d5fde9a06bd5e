//! The resource path grammar.
//!
//! Paths follow `/{resource}[/{id}][/{relation}[/{relationId}]][/_{action}][.{ext}]`:
//! the first segment names the resource collection in dash-case, an
//! underscore-prefixed final segment overrides the verb-default action,
//! and a file extension on the last segment picks the output format.

/// A path resolved against the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedPath {
    /// The resource type name (camelCase).
    pub resource_type: String,
    /// The primary key segment, if present.
    pub primary_key: Option<String>,
    /// The relation name segment, if present.
    pub relation: Option<String>,
    /// The related primary key segment, if present.
    pub relation_primary_key: Option<String>,
    /// The explicit action override, without the underscore prefix.
    pub action: Option<String>,
    /// The file extension, without the dot.
    pub extension: Option<String>,
}

/// Parses a request path, or returns `None` when it does not match the
/// grammar. No-match is not an error: the caller owns the 404 policy.
#[must_use]
pub fn parse_path(path: &str) -> Option<RoutedPath> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let mut segments: Vec<String> = trimmed.split('/').map(ToString::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }

    let extension = split_extension(segments.last_mut()?);
    if segments.last().is_some_and(String::is_empty) {
        return None;
    }

    let action = match segments.last() {
        Some(last) if last.starts_with('_') => {
            let name = last[1..].to_string();
            if name.is_empty() {
                return None;
            }
            segments.pop();
            Some(name)
        }
        _ => None,
    };

    let mut segments = segments.into_iter();
    let resource = segments.next()?;
    if resource.starts_with('_') {
        return None;
    }
    let primary_key = segments.next();
    let relation = segments.next();
    let relation_primary_key = segments.next();
    if segments.next().is_some() {
        return None;
    }

    Some(RoutedPath {
        resource_type: camel_case(&resource),
        primary_key,
        relation,
        relation_primary_key,
        action,
        extension,
    })
}

/// Splits a trailing format extension off a segment.
///
/// Only short, purely alphabetic suffixes count, so a decimal primary
/// key like `1.5` is never mistaken for a format.
fn split_extension(segment: &mut String) -> Option<String> {
    let dot = segment.rfind('.')?;
    let suffix = &segment[dot + 1..];
    if suffix.is_empty()
        || suffix.len() > 8
        || !suffix.chars().all(|ch| ch.is_ascii_alphabetic())
        || dot == 0
    {
        return None;
    }
    let extension = suffix.to_ascii_lowercase();
    segment.truncate(dot);
    Some(extension)
}

/// Converts a dash-case path segment to a camelCase type name.
#[must_use]
pub fn camel_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut upper_next = false;
    for ch in segment.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_path() {
        let routed = parse_path("/widgets").unwrap();
        assert_eq!(routed.resource_type, "widgets");
        assert!(routed.primary_key.is_none());
        assert!(routed.action.is_none());
        assert!(routed.extension.is_none());
    }

    #[test]
    fn test_item_path_with_extension() {
        let routed = parse_path("/widgets/42.json").unwrap();
        assert_eq!(routed.primary_key.as_deref(), Some("42"));
        assert_eq!(routed.extension.as_deref(), Some("json"));
    }

    #[test]
    fn test_relation_paths() {
        let routed = parse_path("/widgets/42/parts").unwrap();
        assert_eq!(routed.relation.as_deref(), Some("parts"));
        assert!(routed.relation_primary_key.is_none());

        let routed = parse_path("/widgets/42/parts/7").unwrap();
        assert_eq!(routed.relation_primary_key.as_deref(), Some("7"));
    }

    #[test]
    fn test_action_override() {
        let routed = parse_path("/widgets/42/_stats").unwrap();
        assert_eq!(routed.action.as_deref(), Some("stats"));
        assert_eq!(routed.primary_key.as_deref(), Some("42"));

        let routed = parse_path("/widgets/_aggregate.csv").unwrap();
        assert_eq!(routed.action.as_deref(), Some("aggregate"));
        assert_eq!(routed.extension.as_deref(), Some("csv"));
        assert!(routed.primary_key.is_none());
    }

    #[test]
    fn test_dash_case_resource() {
        let routed = parse_path("/purchase-order/9").unwrap();
        assert_eq!(routed.resource_type, "purchaseOrder");
    }

    #[test]
    fn test_decimal_key_is_not_an_extension() {
        let routed = parse_path("/widgets/1.5").unwrap();
        assert_eq!(routed.primary_key.as_deref(), Some("1.5"));
        assert!(routed.extension.is_none());
    }

    #[test]
    fn test_no_match() {
        assert!(parse_path("/").is_none());
        assert!(parse_path("").is_none());
        assert!(parse_path("/widgets//42").is_none());
        assert!(parse_path("/_search").is_none());
        assert!(parse_path("/widgets/1/parts/2/extra").is_none());
        assert!(parse_path("/widgets/_").is_none());
    }
}
