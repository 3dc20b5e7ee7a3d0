//! Core domain types shared by the HSU multiprocess test crates.

use std::fmt;

/// Name of a function a child process runs instead of the test suite.
///
/// The name travels on the child's command line as the value of the
/// `--client` switch and is looked up in the child's dispatch table.
///
/// # Example
/// ```
/// use hsu_common::FunctionName;
///
/// let name = FunctionName::from("EchoFunction");
/// assert_eq!(name.as_str(), "EchoFunction");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionName(String);

impl FunctionName {
    /// Creates a new FunctionName from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the function name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for FunctionName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FunctionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&FunctionName> for FunctionName {
    fn from(name: &FunctionName) -> Self {
        name.clone()
    }
}

impl AsRef<str> for FunctionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
