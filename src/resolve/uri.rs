// URI parsing - `[scheme://]@channel[#id]/name[#id]`

use std::fmt;
use thiserror::Error;

/// Longest claim id prefix accepted after `#` (a full hex claim id)
const MAX_PREFIX_LEN: usize = 40;

/// Errors from parsing a claim URI
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("URI is empty")]
    Empty,

    #[error("Unsupported scheme {found}, expected {expected}")]
    UnsupportedScheme { expected: String, found: String },

    #[error("Invalid path segment: {0}")]
    InvalidSegment(String),

    #[error("Invalid claim id prefix: {0}")]
    InvalidClaimIdPrefix(String),
}

/// One path segment, optionally pinned to a claim by id prefix
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub claim_id_prefix: Option<String>,
}

impl Segment {
    fn parse(raw: &str) -> Result<Self, UriError> {
        let (name, prefix) = match raw.split_once('#') {
            Some((name, prefix)) => (name, Some(prefix)),
            None => (raw, None),
        };

        if name.is_empty() || name == "@" {
            return Err(UriError::InvalidSegment(raw.to_string()));
        }
        if name.chars().any(|c| c.is_whitespace() || c == ':' || c == '$') {
            return Err(UriError::InvalidSegment(raw.to_string()));
        }

        let claim_id_prefix = match prefix {
            None => None,
            Some(p) if p.is_empty() || p.len() > MAX_PREFIX_LEN || !p.chars().all(|c| c.is_ascii_hexdigit()) => {
                return Err(UriError::InvalidClaimIdPrefix(p.to_string()));
            }
            Some(p) => Some(p.to_ascii_lowercase()),
        };

        Ok(Self {
            name: name.to_string(),
            claim_id_prefix,
        })
    }

    pub fn is_channel(&self) -> bool {
        self.name.starts_with('@')
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(prefix) = &self.claim_id_prefix {
            write!(f, "#{}", prefix)?;
        }
        Ok(())
    }
}

/// A parsed claim URI: a channel, a claim inside a channel, or a bare name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Uri {
    scheme: String,
    channel: Option<Segment>,
    content: Option<Segment>,
}

impl Uri {
    /// Parse `input`, accepting only `scheme` when a scheme is given
    pub fn parse(input: &str, scheme: &str) -> Result<Self, UriError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(UriError::Empty);
        }

        let path = match input.split_once("://") {
            Some((found, rest)) => {
                if !found.eq_ignore_ascii_case(scheme) {
                    return Err(UriError::UnsupportedScheme {
                        expected: scheme.to_string(),
                        found: found.to_string(),
                    });
                }
                rest
            }
            None => input,
        };
        let path = path.strip_suffix('/').unwrap_or(path);
        if path.is_empty() {
            return Err(UriError::Empty);
        }

        let (channel, content) = match path.split_once('/') {
            Some((first, second)) => {
                if second.contains('/') {
                    return Err(UriError::InvalidSegment(path.to_string()));
                }
                let channel = Segment::parse(first)?;
                let content = Segment::parse(second)?;
                if !channel.is_channel() || content.is_channel() {
                    return Err(UriError::InvalidSegment(path.to_string()));
                }
                (Some(channel), Some(content))
            }
            None => {
                let segment = Segment::parse(path)?;
                if segment.is_channel() {
                    (Some(segment), None)
                } else {
                    (None, Some(segment))
                }
            }
        };

        Ok(Self {
            scheme: scheme.to_string(),
            channel,
            content,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn channel(&self) -> Option<&Segment> {
        self.channel.as_ref()
    }

    pub fn content(&self) -> Option<&Segment> {
        self.content.as_ref()
    }

    /// `@channel` with no content part
    pub fn is_channel_only(&self) -> bool {
        self.channel.is_some() && self.content.is_none()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        match (&self.channel, &self.content) {
            (Some(channel), Some(content)) => write!(f, "{}/{}", channel, content),
            (Some(channel), None) => write!(f, "{}", channel),
            (None, Some(content)) => write!(f, "{}", content),
            (None, None) => Ok(()),
        }
    }
}
