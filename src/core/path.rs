//! Path template matching
//!
//! Templates use `:name` segments as parameter placeholders, e.g. `/users/:id`.
//! Matching is purely positional: both strings are split on `/`, segment counts
//! must agree, parameter segments accept any concrete segment and literal segments
//! must be equal (case-sensitive). There are no wildcards and no optional segments.
//! Whatever a parameter captures is not checked here.
//!
//! Matching runs on the raw, still percent-encoded segments. Captured values are
//! percent-decoded afterwards and must be valid UTF-8.

use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Separator between path segments
pub const SEGMENT_SEPARATOR: char = '/';

/// Leading character of a parameter segment
pub const PARAM_PREFIX: char = ':';

/// Returns true if `path` matches `template`
pub fn matches(path: &str, template: &str) -> bool {
    let mut concrete = path.split(SEGMENT_SEPARATOR);
    let mut pattern = template.split(SEGMENT_SEPARATOR);

    if concrete.clone().count() != pattern.clone().count() {
        return false;
    }

    concrete.all(|segment| match pattern.next() {
        Some(p) if p.starts_with(PARAM_PREFIX) => true,
        Some(p) => p == segment,
        None => false,
    })
}

/// A captured parameter that does not decode to UTF-8
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid path parameter '{name}': not valid UTF-8")]
pub struct InvalidParam {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Self {
        let segments = template
            .split(SEGMENT_SEPARATOR)
            .map(|s| match s.strip_prefix(PARAM_PREFIX) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: template.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the parameter segments, in order
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.raw_captures(path).is_some()
    }

    /// Match `path` and return the decoded parameters
    ///
    /// `None` when the path does not match; `Some(Err(_))` when it matches but a
    /// captured value is not valid UTF-8 once decoded.
    pub fn captures(&self, path: &str) -> Option<Result<PathParams, InvalidParam>> {
        let raw = self.raw_captures(path)?;

        let decoded = raw
            .into_iter()
            .map(|(name, value)| match percent_decode_str(value).decode_utf8() {
                Ok(decoded) => Ok((name.to_string(), decoded.into_owned())),
                Err(_) => Err(InvalidParam {
                    name: name.to_string(),
                }),
            })
            .collect::<Result<HashMap<_, _>, _>>()
            .map(PathParams);
        Some(decoded)
    }

    fn raw_captures<'p>(&'p self, path: &'p str) -> Option<Vec<(&'p str, &'p str)>> {
        let concrete: Vec<&str> = path.split(SEGMENT_SEPARATOR).collect();
        if concrete.len() != self.segments.len() {
            return None;
        }

        let mut raw = Vec::new();
        for (segment, value) in self.segments.iter().zip(concrete) {
            match segment {
                Segment::Param(name) => raw.push((name.as_str(), value)),
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
            }
        }
        Some(raw)
    }

    /// Render the template in the router's `{name}` parameter syntax
    pub fn to_router_path(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(literal) => literal.clone(),
                Segment::Param(name) => format!("{{{}}}", name),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Parameters captured from a concrete path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parse a parameter into any `FromStr` type
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
