//! Child dispatch table.
//!
//! A [`ChildRegistry`] maps function names to the functions a child process
//! may run. The test binary builds one registry and hands it to
//! [`child_main`](crate::child_main) at the top of `main`; the parent names
//! an entry when it calls
//! [`ChildProcessSpawner::spawn_child`](crate::ChildProcessSpawner::spawn_child).

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use hsu_common::{Error, FunctionName, Result};
use hsu_process::validate_function_name;
use tracing::{debug, error};

/// Entry point of a child process. The return value is the exit code.
pub type ChildFn = fn() -> i32;

/// Exit code of a child whose function panicked.
pub const CHILD_PANIC_EXIT_CODE: i32 = 101;

/// Exit code of a child asked to run a name the registry does not know.
pub const CHILD_UNKNOWN_FUNCTION_EXIT_CODE: i32 = 2;

#[derive(Debug, Clone, Default)]
pub struct ChildRegistry {
    entries: BTreeMap<FunctionName, ChildFn>,
}

impl ChildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. Names follow the same rules the spawner enforces, and
    /// each name may be registered once.
    pub fn register(&mut self, name: impl Into<FunctionName>, function: ChildFn) -> Result<()> {
        let name = name.into();
        validate_function_name(name.as_str())?;

        if self.entries.contains_key(&name) {
            return Err(Error::validation(format!(
                "Child function already registered: {}",
                name
            )));
        }

        debug!(function = %name, "Registered child function");
        self.entries.insert(name, function);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: impl Into<FunctionName>, function: ChildFn) -> Result<Self> {
        self.register(name, function)?;
        Ok(self)
    }

    pub fn lookup(&self, name: &str) -> Option<ChildFn> {
        self.entries.get(&FunctionName::from(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &FunctionName> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the named function and returns its exit code.
    ///
    /// A panic inside the function is caught and reported as
    /// [`CHILD_PANIC_EXIT_CODE`].
    pub fn run(&self, name: &str) -> Result<i32> {
        let function = self
            .lookup(name)
            .ok_or_else(|| Error::function_not_found(name))?;

        match panic::catch_unwind(AssertUnwindSafe(function)) {
            Ok(code) => Ok(code),
            Err(payload) => {
                error!(function = name, "Child function panicked: {}", panic_message(&*payload));
                Ok(CHILD_PANIC_EXIT_CODE)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn returns_zero() -> i32 {
        0
    }

    fn returns_seven() -> i32 {
        7
    }

    fn panics() -> i32 {
        panic!("boom")
    }

    #[test]
    fn test_register_and_run() {
        let registry = ChildRegistry::new()
            .with("Zero", returns_zero)
            .unwrap()
            .with("Seven", returns_seven)
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Seven"));
        assert_eq!(registry.run("Zero").unwrap(), 0);
        assert_eq!(registry.run("Seven").unwrap(), 7);

        let names: Vec<_> = registry.names().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Seven", "Zero"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ChildRegistry::new();
        registry.register("Zero", returns_zero).unwrap();
        let err = registry.register("Zero", returns_seven).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(registry.run("Zero").unwrap(), 0);
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut registry = ChildRegistry::new();
        assert!(registry.register("", returns_zero).is_err());
        assert!(registry.register("two words", returns_zero).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_function() {
        let registry = ChildRegistry::new();
        let err = registry.run("Missing").unwrap_err();
        match err {
            Error::FunctionNotFound { name } => assert_eq!(name.as_str(), "Missing"),
            other => panic!("Wrong error type: {other}"),
        }
    }

    #[test]
    fn test_panic_maps_to_exit_code() {
        let registry = ChildRegistry::new().with("Panics", panics).unwrap();
        assert_eq!(registry.run("Panics").unwrap(), CHILD_PANIC_EXIT_CODE);
    }
}
