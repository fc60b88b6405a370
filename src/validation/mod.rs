pub mod package_name;
pub mod version_validator;

pub use package_name::validate_package_name;
pub use version_validator::{VersionValidationResult, VersionValidator};
