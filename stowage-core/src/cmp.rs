use semver::Version;

use crate::transaction::{PackageStatus, PackageStatusError};

pub(crate) fn cmp(
    installed_version: &str,
    candidate_version: &Version,
) -> Result<PackageStatus, PackageStatusError> {
    let installed_version = match Version::parse(installed_version) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("Can't parse version {}, {:?}", installed_version, e);
            return Err(PackageStatusError::ParsingVersion);
        }
    };

    if candidate_version > &installed_version {
        return Ok(PackageStatus::RequiresUpdate);
    }

    Ok(PackageStatus::UpToDate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_versions() {
        assert_eq!(
            cmp("1.0.0", &Version::parse("1.0.1").unwrap()).unwrap(),
            PackageStatus::RequiresUpdate
        );
        assert_eq!(
            cmp("1.0.1", &Version::parse("1.0.1").unwrap()).unwrap(),
            PackageStatus::UpToDate
        );
        assert_eq!(
            cmp("1.0.1", &Version::parse("1.0.0").unwrap()).unwrap(),
            PackageStatus::UpToDate
        );
        assert_eq!(
            cmp("1.0.0-alpha.1", &Version::parse("1.0.0").unwrap()).unwrap(),
            PackageStatus::RequiresUpdate
        );
        assert_eq!(
            cmp("1.0.0", &Version::parse("1.0.1-alpha.1").unwrap()).unwrap(),
            PackageStatus::RequiresUpdate
        );
    }

    #[test]
    fn unparseable_installed_version_is_an_error() {
        assert!(matches!(
            cmp("garbage", &Version::parse("1.0.0").unwrap()),
            Err(PackageStatusError::ParsingVersion)
        ));
    }
}
