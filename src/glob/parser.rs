//! Tokenizes a glob pattern into a root marker and path segments.

use super::GlobError;

/// Where a pattern is anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Root {
    /// No root marker; relative to the working directory
    Relative,
    /// Leading `/`
    Unix,
    /// Drive letter such as `C:`
    Drive(String),
}

/// One piece of a wildcard segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Part {
    Literal(String),
    /// `*`: any run of characters, possibly empty
    AnyChars,
    /// `?`: exactly one character
    AnyChar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Wildcard(Vec<Part>),
    /// `**`
    Recursive,
    /// `.`
    Current,
    /// `..`
    Parent,
}

impl Segment {
    pub(crate) fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard(_) | Segment::Recursive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    pub(crate) root: Root,
    pub(crate) segments: Vec<Segment>,
}

pub(crate) fn parse(pattern: &str) -> Result<Pattern, GlobError> {
    let normalized = pattern.trim().replace('\\', "/");
    if normalized.is_empty() {
        return Err(GlobError::EmptyPattern);
    }

    let (root, rest) = parse_root(&normalized)?;
    let segments = rest.split('/').filter(|s| !s.is_empty()).map(parse_segment).collect();

    Ok(Pattern { root, segments })
}

fn parse_root(pattern: &str) -> Result<(Root, &str), GlobError> {
    if pattern.starts_with("//") {
        return Err(GlobError::UncRootUnsupported(pattern.to_string()));
    }
    if let Some(rest) = pattern.strip_prefix('/') {
        return Ok((Root::Unix, rest));
    }
    let bytes = pattern.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Ok((Root::Drive(pattern[..2].to_uppercase()), &pattern[2..]));
    }
    Ok((Root::Relative, pattern))
}

fn parse_segment(text: &str) -> Segment {
    match text {
        "**" => return Segment::Recursive,
        "." => return Segment::Current,
        ".." => return Segment::Parent,
        _ => {}
    }

    if !text.contains(['*', '?']) {
        return Segment::Literal(text.to_string());
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    for c in text.chars() {
        match c {
            '*' | '?' => {
                if !literal.is_empty() {
                    parts.push(Part::Literal(std::mem::take(&mut literal)));
                }
                if c == '?' {
                    parts.push(Part::AnyChar);
                } else if parts.last() != Some(&Part::AnyChars) {
                    parts.push(Part::AnyChars);
                }
            }
            _ => literal.push(c),
        }
    }
    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    Segment::Wildcard(parts)
}
