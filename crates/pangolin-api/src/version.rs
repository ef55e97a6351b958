// PAN-OS software version numbers.
//
// Parsed once from `show system info` during session initialization and
// immutable afterwards. Schema dispatch compares versions constantly, so
// ordering lives here rather than on the dispatch tables.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A PAN-OS release number: `major.minor.patch` with an optional build
/// suffix (`10.1.3-h2`).
///
/// Ordering and equality consider only the numeric triple; the suffix is
/// carried for display but never compared. Hotfix builds share the schema
/// of their base release.
#[derive(Debug, Clone, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub suffix: Option<String>,
}

impl Version {
    /// A version with no suffix.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            suffix: None,
        }
    }

    /// `true` if `self` is at least `other` (suffix ignored).
    pub fn gte(&self, other: &Version) -> bool {
        self >= other
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        (self.major, self.minor, self.patch) == (other.major, other.minor, other.patch)
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref suffix) = self.suffix {
            write!(f, "-{suffix}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::InvalidVersion {
            version: s.to_owned(),
        };

        let (triple, suffix) = match s.split_once('-') {
            Some((t, sfx)) if !sfx.is_empty() => (t, Some(sfx.to_owned())),
            Some(_) => return Err(malformed()),
            None => (s, None),
        };

        let mut parts = triple.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(malformed)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(malformed)?;
        let patch = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(Self {
            major,
            minor,
            patch,
            suffix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_triple() {
        let v: Version = "10.1.3".parse().unwrap();
        assert_eq!(v, Version::new(10, 1, 3));
        assert!(v.suffix.is_none());
    }

    #[test]
    fn parses_hotfix_suffix() {
        let v: Version = "9.0.5-h1".parse().unwrap();
        assert_eq!(v, Version::new(9, 0, 5));
        assert_eq!(v.suffix.as_deref(), Some("h1"));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "10", "10.1", "10.1.x", "10.1.2.3", "10.1.2-", "a.b.c"] {
            assert!(bad.parse::<Version>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn orders_by_field_precedence() {
        let v = |s: &str| s.parse::<Version>().unwrap();
        assert!(v("10.0.0").gte(&v("9.9.9")));
        assert!(v("9.1.0").gte(&v("9.0.9")));
        assert!(v("9.0.2").gte(&v("9.0.1")));
        assert!(!v("9.0.1").gte(&v("9.0.2")));
        assert!(v("9.0.1").gte(&v("9.0.1")));
    }

    #[test]
    fn suffix_does_not_affect_comparison() {
        let base: Version = "10.1.3".parse().unwrap();
        let hotfix: Version = "10.1.3-h2".parse().unwrap();
        assert_eq!(base, hotfix);
        assert!(base.gte(&hotfix) && hotfix.gte(&base));
    }

    #[test]
    fn display_round_trips() {
        for s in ["10.1.3", "9.0.5-h1"] {
            assert_eq!(s.parse::<Version>().unwrap().to_string(), s);
        }
    }
}
