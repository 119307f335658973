use regex::Regex;

use crate::{
    config::CustomValidationRegex,
    error::{Error, ErrorType},
};

/// A pattern compiled once and tested against request fields on the hot
/// path.
#[derive(Debug, Clone)]
pub struct RegexChecker {
    pattern: Regex,
}

impl RegexChecker {
    /// Compile the pattern.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` when the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Regex::new(pattern)
            .map(|pattern| Self { pattern })
            .map_err(|err| {
                ErrorType::MalformedInput(format!("`{pattern}` is not a valid pattern: {err}"))
                    .into()
            })
    }

    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

pub const DEFAULT_USER_ID_PATTERN: &str = "^[a-zA-Z0-9@._=-]{1,128}$";
pub const DEFAULT_USERNAME_PATTERN: &str = "^[a-zA-Z0-9@._-]{1,128}$";
pub const DEFAULT_PERSONAL_NAME_PATTERN: &str = "^[a-zA-Z0-9 '._-]{1,128}$";
pub const DEFAULT_ROLE_NAME_PATTERN: &str = "^[a-zA-Z0-9_-]{1,64}$";
pub const DEFAULT_PERMISSION_PATTERN: &str = "^[a-zA-Z0-9:._-]{1,64}$";
pub const DEFAULT_HOSTNAME_PATTERN: &str = "^[a-zA-Z0-9.-]+(:[0-9]+)?$";

/// The compiled field validators used by configuration checks and the
/// side-call handlers.
#[derive(Debug, Clone)]
pub struct Validators {
    pub user_id: RegexChecker,
    pub username: RegexChecker,
    pub personal_name: RegexChecker,
    pub role_name: RegexChecker,
    pub permission: RegexChecker,
    pub hostname: RegexChecker,
}

impl Validators {
    /// Compile the configured patterns, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when any configured pattern does not compile.
    pub fn new(config: &CustomValidationRegex) -> Result<Self, Error> {
        Ok(Self {
            user_id: RegexChecker::new(
                config.user_id.as_deref().unwrap_or(DEFAULT_USER_ID_PATTERN),
            )?,
            username: RegexChecker::new(
                config
                    .username
                    .as_deref()
                    .unwrap_or(DEFAULT_USERNAME_PATTERN),
            )?,
            personal_name: RegexChecker::new(
                config
                    .personal_name
                    .as_deref()
                    .unwrap_or(DEFAULT_PERSONAL_NAME_PATTERN),
            )?,
            role_name: RegexChecker::new(
                config
                    .role_name
                    .as_deref()
                    .unwrap_or(DEFAULT_ROLE_NAME_PATTERN),
            )?,
            permission: RegexChecker::new(
                config
                    .permission
                    .as_deref()
                    .unwrap_or(DEFAULT_PERMISSION_PATTERN),
            )?,
            hostname: RegexChecker::new(
                config
                    .hostname
                    .as_deref()
                    .unwrap_or(DEFAULT_HOSTNAME_PATTERN),
            )?,
        })
    }
}
