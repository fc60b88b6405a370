//! Distribution tag resolution
//!
//! Runs once per publish, before any package is touched.

use crate::core::error::PublishError;
use crate::validation::VersionValidator;
use serde::Serialize;
use std::fmt;

pub const LATEST_TAG: &str = "latest";
pub const NEXT_TAG: &str = "next";

/// The tag every package of a run is published under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ResolvedTag {
    Latest,
    Next,
    Custom(String),
}

impl ResolvedTag {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Latest => LATEST_TAG,
            Self::Next => NEXT_TAG,
            Self::Custom(tag) => tag,
        }
    }

    fn from_name(tag: &str) -> Self {
        match tag {
            LATEST_TAG => Self::Latest,
            NEXT_TAG => Self::Next,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for ResolvedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ResolvedTag> for String {
    fn from(tag: ResolvedTag) -> Self {
        tag.as_str().to_string()
    }
}

/// Resolved tag plus the facts that decide whether `next` follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPlan {
    pub tag: ResolvedTag,
    /// The caller chose the tag instead of letting it be derived
    pub explicit: bool,
    pub prerelease: bool,
}

impl TagPlan {
    /// Resolve the publish tag for `version`
    ///
    /// Without a tag, stable versions go to `latest` and prereleases to
    /// `next`. Asking for `latest` with a prerelease is rejected.
    ///
    /// ```
    /// use release_publisher::core::{ResolvedTag, TagPlan};
    ///
    /// let plan = TagPlan::resolve("19.0.0-rc.1", None).unwrap();
    /// assert_eq!(plan.tag, ResolvedTag::Next);
    /// assert!(TagPlan::resolve("19.0.0-rc.1", Some("latest")).is_err());
    /// ```
    pub fn resolve(version: &str, tag: Option<&str>) -> Result<Self, PublishError> {
        let validation = VersionValidator::new().validate(version);
        if !validation.is_valid {
            return Err(PublishError::InvalidVersion {
                version: version.to_string(),
                message: validation.error.unwrap_or_default(),
            });
        }
        let prerelease = validation.is_prerelease();

        let tag = match tag {
            None => {
                return Ok(Self {
                    tag: if prerelease {
                        ResolvedTag::Next
                    } else {
                        ResolvedTag::Latest
                    },
                    explicit: false,
                    prerelease,
                });
            }
            Some(tag) => tag.trim(),
        };

        if tag.is_empty() {
            return Err(PublishError::InvalidTag {
                tag: tag.to_string(),
                reason: "tag must not be empty".to_string(),
            });
        }
        if tag == LATEST_TAG && prerelease {
            return Err(PublishError::LatestTagForPrerelease {
                version: version.to_string(),
            });
        }

        Ok(Self {
            tag: ResolvedTag::from_name(tag),
            explicit: true,
            prerelease,
        })
    }

    /// Whether `next` should be moved up to the freshly published version
    ///
    /// Only automatic stable publishes do this; an explicit tag is left alone
    /// so stable and prerelease lines can be interleaved by hand.
    pub fn advances_next(&self) -> bool {
        !self.explicit && !self.prerelease
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_without_tag_resolves_latest() {
        for version in ["0.0.1", "1.2.3", "18.2.0", "2.0.0+build.5"] {
            let plan = TagPlan::resolve(version, None).unwrap();
            assert_eq!(plan.tag, ResolvedTag::Latest, "{version}");
            assert!(!plan.explicit);
            assert!(plan.advances_next());
        }
    }

    #[test]
    fn test_prerelease_without_tag_resolves_next() {
        for version in ["1.0.0-alpha.1", "19.0.0-rc.0", "0.0.0-experimental-abc"] {
            let plan = TagPlan::resolve(version, None).unwrap();
            assert_eq!(plan.tag, ResolvedTag::Next, "{version}");
            assert!(plan.prerelease);
            assert!(!plan.advances_next());
        }
    }

    #[test]
    fn test_latest_with_prerelease_rejected() {
        let err = TagPlan::resolve("1.0.0-beta.2", Some("latest")).unwrap_err();
        assert!(matches!(err, PublishError::LatestTagForPrerelease { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_explicit_latest_for_stable_allowed() {
        let plan = TagPlan::resolve("2.0.0", Some("latest")).unwrap();
        assert_eq!(plan.tag, ResolvedTag::Latest);
        assert!(plan.explicit);
        assert!(!plan.advances_next());
    }

    #[test]
    fn test_explicit_tag_used_as_is() {
        let plan = TagPlan::resolve("2.0.0", Some("beta")).unwrap();
        assert_eq!(plan.tag, ResolvedTag::Custom("beta".to_string()));
        assert_eq!(plan.tag.to_string(), "beta");
        assert!(!plan.advances_next());

        let plan = TagPlan::resolve("2.0.0-rc.1", Some("next")).unwrap();
        assert_eq!(plan.tag, ResolvedTag::Next);
        assert!(plan.explicit);
    }

    #[test]
    fn test_invalid_version_rejected() {
        let err = TagPlan::resolve("2.0", None).unwrap_err();
        assert_eq!(err.code(), "INVALID_VERSION");
    }

    #[test]
    fn test_empty_tag_rejected() {
        let err = TagPlan::resolve("2.0.0", Some("  ")).unwrap_err();
        assert_eq!(err.code(), "INVALID_TAG");
    }

    #[test]
    fn test_resolved_tag_serializes_as_string() {
        let json = serde_json::to_string(&ResolvedTag::Custom("canary".to_string())).unwrap();
        assert_eq!(json, r#""canary""#);
        assert_eq!(serde_json::to_string(&ResolvedTag::Latest).unwrap(), r#""latest""#);
    }
}
