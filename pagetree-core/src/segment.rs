//! Path segments: literal vs `{wildcard}` classification and path splitting.

use crate::CoreError;

const WILDCARD_PREFIX: char = '{';
const WILDCARD_SUFFIX: char = '}';

/// One normalized route segment. For wildcards `name` is the capture name without braces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub wildcard: bool,
}

impl Segment {
    /// Classify a raw segment.
    ///
    /// `"{id}"` is a wildcard named `id`, `"/users/"` is the literal `users`,
    /// and both `""` and `"/"` normalize to the root sentinel (an empty literal).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim_matches('/');
        if is_wildcard(trimmed) {
            let name = &trimmed[1..trimmed.len() - 1];
            if name.is_empty() || name.contains(|c| matches!(c, '/' | '{' | '}')) {
                return Err(CoreError::InvalidSegment(raw.to_string()));
            }
            return Ok(Self {
                name: name.to_string(),
                wildcard: true,
            });
        }
        Ok(Self {
            name: trimmed.to_string(),
            wildcard: false,
        })
    }

    pub fn is_root(&self) -> bool {
        !self.wildcard && self.name.is_empty()
    }

    /// Render as written in a route pattern (`{name}` for wildcards).
    pub fn pattern(&self) -> String {
        if self.wildcard {
            format!("{}{}{}", WILDCARD_PREFIX, self.name, WILDCARD_SUFFIX)
        } else {
            self.name.clone()
        }
    }
}

/// True when the segment is written as `{...}`.
pub fn is_wildcard(segment: &str) -> bool {
    segment.len() >= 2
        && segment.starts_with(WILDCARD_PREFIX)
        && segment.ends_with(WILDCARD_SUFFIX)
}

/// Split a route pattern (`/users/{id}/comments`) into parsed segments.
/// Empty parts are dropped, so `/` yields no segments.
pub fn split_route(path: &str) -> Result<Vec<Segment>, CoreError> {
    path.split('/')
        .filter(|part| !part.is_empty())
        .map(Segment::parse)
        .collect()
}

/// Split a request path into the segments the matcher consumes.
/// Leading and trailing slashes are stripped, so `/a/b` and `/a/b/` are equivalent
/// and `/` yields no segments.
pub fn split_target(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

/// Decode `%XX` escapes in a captured path segment. Invalid escapes are kept as-is.
pub fn percent_decode(segment: &str) -> String {
    if !segment.contains('%') {
        return segment.to_string();
    }
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
