use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};

/// A reference to a package, optionally pinned to an exact version.
///
/// The textual form is `name` or `name==version`, which is also the form
/// used in recovery hints emitted by the uninstaller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageKey {
    pub name: String,
    pub version: Option<Version>,
}

impl PackageKey {
    pub fn new<S: Into<String>>(name: S, version: Option<Version>) -> PackageKey {
        PackageKey {
            name: name.into(),
            version,
        }
    }

    pub fn unversioned<S: Into<String>>(name: S) -> PackageKey {
        PackageKey {
            name: name.into(),
            version: None,
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}=={}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParsePackageKeyError {
    #[error("Package name must not be empty")]
    EmptyName,

    #[error("Invalid version in package spec: {0}")]
    InvalidVersion(#[source] semver::Error),
}

impl FromStr for PackageKey {
    type Err = ParsePackageKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = match s.find("==") {
            Some(idx) => {
                let version = Version::parse(s[idx + 2..].trim())
                    .map_err(ParsePackageKeyError::InvalidVersion)?;
                (s[..idx].trim(), Some(version))
            }
            None => (s.trim(), None),
        };

        if name.is_empty() {
            return Err(ParsePackageKeyError::EmptyName);
        }

        Ok(PackageKey::new(name, version))
    }
}

/// Splits `<name>-<version>` at the first hyphen that begins a parseable
/// version, so that hyphenated package names survive.
pub(crate) fn split_package_stem(stem: &str) -> Option<(String, Version)> {
    for (idx, _) in stem.match_indices('-') {
        let (name, rest) = (&stem[..idx], &stem[idx + 1..]);
        if name.is_empty() {
            continue;
        }
        if !rest.chars().next().map_or(false, |c| c.is_ascii_digit()) {
            continue;
        }
        if let Ok(version) = Version::parse(rest) {
            return Some((name.to_string(), version));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_versioned_spec() {
        let key: PackageKey = "regex==1.10.2".parse().unwrap();
        assert_eq!(key.name, "regex");
        assert_eq!(key.version, Some(Version::parse("1.10.2").unwrap()));
        assert_eq!(key.to_string(), "regex==1.10.2");
    }

    #[test]
    fn parse_bare_name() {
        let key: PackageKey = "requests".parse().unwrap();
        assert_eq!(key.name, "requests");
        assert_eq!(key.version, None);
    }

    #[test]
    fn parse_rejects_empty_name() {
        assert!(matches!(
            "==1.0.0".parse::<PackageKey>(),
            Err(ParsePackageKeyError::EmptyName)
        ));
    }

    #[test]
    fn parse_rejects_bad_version() {
        assert!(matches!(
            "foo==not.a.version".parse::<PackageKey>(),
            Err(ParsePackageKeyError::InvalidVersion(_))
        ));
    }

    #[test]
    fn stem_split_handles_hyphenated_names() {
        let (name, version) = split_package_stem("typing-extensions-4.9.0").unwrap();
        assert_eq!(name, "typing-extensions");
        assert_eq!(version, Version::parse("4.9.0").unwrap());
    }

    #[test]
    fn stem_split_handles_prerelease() {
        let (name, version) = split_package_stem("foo-1.0.0-alpha.1").unwrap();
        assert_eq!(name, "foo");
        assert_eq!(version, Version::parse("1.0.0-alpha.1").unwrap());
    }

    #[test]
    fn stem_split_rejects_versionless() {
        assert!(split_package_stem("just-a-name").is_none());
    }
}
