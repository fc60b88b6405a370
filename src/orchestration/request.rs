//! Input of a publish run

use crate::security::Otp;
use std::path::{Path, PathBuf};

/// Everything the release pipeline hands to the publisher for one run
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Repository root; packages are read from `<cwd>/<buildDir>/<package>`
    pub working_directory: PathBuf,
    pub dry_run: bool,
    pub otp: Option<Otp>,
    /// Package names, in the order the pipeline listed them
    pub packages: Vec<String>,
    /// Release version; decides the default tag
    pub version: String,
    /// Explicit distribution tag; derived from `version` when absent
    pub tag: Option<String>,
}

impl PublishRequest {
    pub fn new<P, I, S>(working_directory: P, version: impl Into<String>, packages: I) -> Self
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            working_directory: working_directory.as_ref().to_path_buf(),
            dry_run: false,
            otp: None,
            packages: packages.into_iter().map(Into::into).collect(),
            version: version.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_otp(mut self, otp: Option<Otp>) -> Self {
        self.otp = otp;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
