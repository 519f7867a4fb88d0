//! Request path decoding, cleaning and re-escaping.
//!
//! Everything here works on bytes. The request path is percent-decoded into
//! raw bytes, split on separators, and only turned into an `OsStr` one
//! segment at a time.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use percent_encoding::{percent_decode, percent_encode, AsciiSet, CONTROLS};

/// Bytes escaped when a resolved path is written back into a URI path.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DecodeError {
    MalformedEscape(usize),
    ControlByte(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DecodeError::MalformedEscape(at) => {
                write!(f, "malformed percent-encoding at byte {}", at)
            }
            DecodeError::ControlByte(b) => write!(f, "control byte 0x{:02x} in path", b),
        }
    }
}

impl StdError for DecodeError {}

/// Percent-decode a raw request path.
///
/// `+` is left alone. A `%` that isn't followed by two hex digits is an
/// error, and so is any decoded ASCII control byte.
pub(crate) fn decode(path: &str) -> Result<Cow<'_, [u8]>, DecodeError> {
    let raw = path.as_bytes();
    for (i, &b) in raw.iter().enumerate() {
        if b != b'%' {
            continue;
        }
        match (raw.get(i + 1), raw.get(i + 2)) {
            (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {}
            _ => return Err(DecodeError::MalformedEscape(i)),
        }
    }

    let decoded: Cow<'_, [u8]> = percent_decode(raw).into();
    if let Some(&b) = decoded.iter().find(|b| b.is_ascii_control()) {
        return Err(DecodeError::ControlByte(b));
    }
    Ok(decoded)
}

fn is_separator(b: u8) -> bool {
    b == b'/' || (cfg!(windows) && b == b'\\')
}

/// A decoded path with every `.`, empty and `..` segment eliminated.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CleanPath<'a> {
    segments: Vec<&'a [u8]>,
    absolute: bool,
}

/// Eliminate traversal segments from a decoded path.
///
/// `..` drops the previous segment and is ignored once nothing is left, so
/// the result can never climb above where it started.
pub(crate) fn clean(decoded: &[u8]) -> CleanPath<'_> {
    let mut parts = decoded.split(|&b| is_separator(b)).peekable();
    let absolute = decoded.is_empty() || parts.peek().map_or(true, |first| first.is_empty());

    let mut segments = Vec::new();
    for part in parts {
        match part {
            b"" | b"." => {}
            b".." => {
                segments.pop();
            }
            _ => segments.push(part),
        }
    }

    CleanPath { segments, absolute }
}

impl CleanPath<'_> {
    pub(crate) fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The cleaned segments as a relative path, ready to be joined to a root.
    ///
    /// `None` when a segment can't be represented on this platform.
    pub(crate) fn to_relative(&self) -> Option<PathBuf> {
        let mut buf = PathBuf::new();
        for seg in &self.segments {
            buf.push(segment_to_os(seg)?);
        }
        Some(buf)
    }
}

impl fmt::Display for CleanPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&String::from_utf8_lossy(seg))?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn segment_to_os(seg: &[u8]) -> Option<&OsStr> {
    use std::os::unix::ffi::OsStrExt;
    Some(OsStr::from_bytes(seg))
}

#[cfg(not(unix))]
fn segment_to_os(seg: &[u8]) -> Option<&OsStr> {
    let seg = std::str::from_utf8(seg).ok()?;
    // a colon can turn a segment into a drive prefix
    if seg.contains(':') {
        tracing::warn!("path: rejecting segment containing colon (:)");
        return None;
    }
    Some(OsStr::new(seg))
}

#[cfg(unix)]
fn os_to_bytes(seg: &OsStr) -> Option<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Some(seg.as_bytes())
}

#[cfg(not(unix))]
fn os_to_bytes(seg: &OsStr) -> Option<&[u8]> {
    seg.to_str().map(str::as_bytes)
}

/// Percent-escape a root-relative path for use as a URI path.
///
/// Segments are escaped individually and joined with `/`. Anything other
/// than plain names (a root, a prefix, `..`) yields `None`.
pub(crate) fn escape(relative: &Path) -> Option<String> {
    let mut out = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(seg) => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.extend(percent_encode(os_to_bytes(seg)?, SEGMENT));
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::{clean, decode, escape, DecodeError};
    use std::path::Path;

    fn cleaned(s: &str) -> String {
        clean(s.as_bytes()).to_string()
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(cleaned("/foo/bar.html"), "/foo/bar.html");
        assert_eq!(cleaned("foo/./bar"), "foo/bar");
        assert_eq!(cleaned("//foo///bar/"), "/foo/bar");
        assert_eq!(cleaned("/foo/../bar"), "/bar");
        assert_eq!(cleaned(""), "/");
        assert_eq!(cleaned("/"), "/");
    }

    #[test]
    fn test_clean_path_clamps_traversal() {
        assert_eq!(cleaned("/../../etc/passwd"), "/etc/passwd");
        assert_eq!(cleaned("../.."), "");
        assert_eq!(cleaned("/a/b/../../../../c"), "/c");
        assert!(clean(b"/..").is_root());
    }

    #[test]
    fn test_clean_path_keeps_odd_names() {
        assert_eq!(cleaned("/..."), "/...");
        assert_eq!(cleaned("/..foo/bar.."), "/..foo/bar..");
        assert_eq!(cleaned("/a*b/{c}"), "/a*b/{c}");
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_is_not_a_separator() {
        assert_eq!(cleaned("/a\\..\\b"), "/a\\..\\b");
        assert_eq!(
            clean(b"/a\\b").to_relative().unwrap(),
            Path::new("a\\b")
        );
    }

    #[test]
    fn test_decode() {
        assert_eq!(&*decode("/todos%2ers").unwrap(), b"/todos.rs");
        assert_eq!(&*decode("/a+b").unwrap(), b"/a+b");
        assert_eq!(&*decode("/%2E%2e/x").unwrap(), b"/../x");
        assert_eq!(&*decode("/100%25").unwrap(), b"/100%");
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode("/100%"), Err(DecodeError::MalformedEscape(4)));
        assert_eq!(decode("/%zz"), Err(DecodeError::MalformedEscape(1)));
        assert_eq!(decode("/%4"), Err(DecodeError::MalformedEscape(1)));
        assert_eq!(decode("/foo%00.html"), Err(DecodeError::ControlByte(0)));
        assert_eq!(decode("/foo%0a"), Err(DecodeError::ControlByte(b'\n')));
    }

    #[test]
    fn test_decode_non_utf8() {
        assert_eq!(&*decode("/caf%E9").unwrap(), b"/caf\xe9");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(Path::new("blog/index.html")).unwrap(), "blog/index.html");
        assert_eq!(escape(Path::new("my file#1.txt")).unwrap(), "my%20file%231.txt");
        assert_eq!(escape(Path::new("100%.txt")).unwrap(), "100%25.txt");
        assert_eq!(escape(Path::new("caf\u{e9}")).unwrap(), "caf%C3%A9");
        assert!(escape(Path::new("../x")).is_none());
        assert!(escape(Path::new("/abs")).is_none());
    }

    #[test]
    fn test_escape_then_decode_is_lossless() {
        let escaped = escape(Path::new("a?b/[x] {y}")).unwrap();
        assert_eq!(escaped, "a%3Fb/%5Bx%5D%20%7By%7D");
        assert_eq!(&*decode(&escaped).unwrap(), b"a?b/[x] {y}");
    }
}
