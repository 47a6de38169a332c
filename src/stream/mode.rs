//! Access-mode strings and the capabilities they grant.
//!
//! The taxonomy follows the classic file-open call: read, write (truncate),
//! append, exclusive-create and create-or-open, each with an optional `+`
//! read/write variant. Anything after the first two characters (`b`, `t`,
//! `e`, ...) is ignored.

use std::fs::OpenOptions;

use super::StreamError;

/// The primary action selected by the first character of a mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenKind {
    /// `r`: open an existing resource for reading.
    Read,
    /// `w`: create or truncate.
    Write,
    /// `a`: create if missing, all writes go to the end.
    Append,
    /// `x`: create, failing if the resource already exists.
    Exclusive,
    /// `c`: create if missing, never truncate.
    Create,
}

/// A parsed access mode.
///
/// # Examples
///
/// ```
/// use snapshot_http::stream::AccessMode;
///
/// let mode = AccessMode::parse("r+").unwrap();
/// assert!(mode.is_readable());
/// assert!(mode.is_writable());
///
/// assert!(AccessMode::parse("q").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessMode {
    kind: OpenKind,
    plus: bool,
}

impl AccessMode {
    /// `r+`
    pub const READ_WRITE: Self = Self {
        kind: OpenKind::Read,
        plus: true,
    };

    /// Classifies a mode string.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidMode`] when the first character is not one
    /// of `r`, `w`, `a`, `x` or `c`.
    pub fn parse(mode: &str) -> Result<Self, StreamError> {
        let mut chars = mode.chars();
        let kind = match chars.next() {
            Some('r') => OpenKind::Read,
            Some('w') => OpenKind::Write,
            Some('a') => OpenKind::Append,
            Some('x') => OpenKind::Exclusive,
            Some('c') => OpenKind::Create,
            _ => return Err(StreamError::InvalidMode(mode.to_owned())),
        };
        let plus = chars.next() == Some('+');

        Ok(Self { kind, plus })
    }

    pub fn kind(self) -> OpenKind {
        self.kind
    }

    /// Returns `true` for `r` and every `+` mode.
    pub fn is_readable(self) -> bool {
        self.plus || self.kind == OpenKind::Read
    }

    /// Returns `true` for every mode except a plain `r`.
    pub fn is_writable(self) -> bool {
        self.plus || self.kind != OpenKind::Read
    }

    /// Options that open a file the way this mode describes.
    pub fn open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.is_readable());
        match self.kind {
            OpenKind::Read => {
                options.write(self.plus);
            }
            OpenKind::Write => {
                options.write(true).create(true).truncate(true);
            }
            OpenKind::Append => {
                options.append(true).create(true);
            }
            OpenKind::Exclusive => {
                options.write(true).create_new(true);
            }
            OpenKind::Create => {
                options.write(true).create(true);
            }
        }
        options
    }

    /// Options used to reopen a file after it has been detached from a stream.
    ///
    /// Truncating and exclusive modes are reopened as create-or-open so the
    /// data written through the stream survives the hand-over.
    pub fn reopen_options(self) -> OpenOptions {
        match self.kind {
            OpenKind::Write | OpenKind::Exclusive => Self {
                kind: OpenKind::Create,
                plus: self.plus,
            }
            .open_options(),
            _ => self.open_options(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(mode: &str) -> (bool, bool) {
        let mode = AccessMode::parse(mode).unwrap();
        (mode.is_readable(), mode.is_writable())
    }

    #[test]
    fn read_only_modes() {
        assert_eq!(flags("r"), (true, false));
        assert_eq!(flags("rb"), (true, false));
        assert_eq!(flags("rw"), (true, false));
    }

    #[test]
    fn plus_modes_are_read_write() {
        for mode in ["r+", "w+", "a+", "x+", "c+", "r+b", "w+b"] {
            assert_eq!(flags(mode), (true, true), "mode {mode}");
        }
    }

    #[test]
    fn write_only_modes() {
        for mode in ["w", "a", "x", "c", "wb", "ab"] {
            assert_eq!(flags(mode), (false, true), "mode {mode}");
        }
    }

    #[test]
    fn unknown_modes_are_rejected() {
        for mode in ["", "q", "+", "R", " r"] {
            assert!(
                matches!(AccessMode::parse(mode), Err(StreamError::InvalidMode(m)) if m == mode),
                "mode {mode:?}"
            );
        }
    }

    #[test]
    fn kind_is_exposed() {
        assert_eq!(AccessMode::parse("c+").unwrap().kind(), OpenKind::Create);
        assert_eq!(AccessMode::parse("x").unwrap().kind(), OpenKind::Exclusive);
    }
}
