pub(crate) const HELP_NAME: &str = "help";
pub(crate) const HELP_SHORT: char = 'h';
pub(crate) const VERSION_NAME: &str = "version";
pub(crate) const VERSION_SHORT: char = 'V';

pub(crate) const REQUIRED_ANNOTATION: &str = "required";
pub(crate) const ENVIRONMENT_ANNOTATION: &str = "environment variable";
pub(crate) const ANNOTATION_SEPARATOR: &str = ", ";

pub(crate) const FLAG_SEPARATOR: &str = "/";
pub(crate) const CONFIG_ERROR_EXIT: i32 = 1;
