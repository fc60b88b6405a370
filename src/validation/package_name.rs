//! npm package name rules
//!
//! Names are joined onto the build directory to locate each package, so they
//! are checked before any path is built.
//! https://docs.npmjs.com/cli/v10/configuring-npm/package-json#name

use crate::core::error::PublishError;
use lazy_static::lazy_static;
use regex::Regex;

const MAX_NAME_LENGTH: usize = 214;

lazy_static! {
    static ref UNSCOPED_NAME: Regex = Regex::new(r"^[a-z0-9][a-z0-9._~-]*$").unwrap();
    static ref SCOPED_NAME: Regex =
        Regex::new(r"^@[a-z0-9][a-z0-9._~-]*/[a-z0-9][a-z0-9._~-]*$").unwrap();
}

/// Validate a package name, returning the first rule it breaks
pub fn validate_package_name(name: &str) -> Result<(), PublishError> {
    let reject = |reason: &str| PublishError::InvalidPackageName {
        package: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(reject("name must not be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(reject("name must be at most 214 characters"));
    }

    if name.chars().any(|c| c.is_uppercase()) {
        return Err(reject("name must not contain uppercase letters"));
    }

    let valid = if name.starts_with('@') {
        SCOPED_NAME.is_match(name)
    } else {
        UNSCOPED_NAME.is_match(name)
    };
    if !valid {
        return Err(reject(
            "name may only contain lowercase letters, digits, '-', '.', '_' and '~', \
             and must not start with '.' or '_'",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["react", "react-dom", "use-sync-external-store", "@scope/pkg", "a.b_c~d"] {
            assert!(validate_package_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_uppercase_rejected() {
        let err = validate_package_name("React").unwrap_err();
        assert_eq!(err.code(), "INVALID_PACKAGE_NAME");
        assert!(err.to_string().contains("uppercase"));
    }

    #[test]
    fn test_leading_dot_or_underscore_rejected() {
        assert!(validate_package_name(".hidden").is_err());
        assert!(validate_package_name("_private").is_err());
    }

    #[test]
    fn test_path_traversal_rejected() {
        assert!(validate_package_name("../etc").is_err());
        assert!(validate_package_name("@scope/../x").is_err());
        assert!(validate_package_name("a/b").is_err());
    }

    #[test]
    fn test_length_limit() {
        assert!(validate_package_name(&"a".repeat(214)).is_ok());
        assert!(validate_package_name(&"a".repeat(215)).is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(validate_package_name("").is_err());
    }
}
