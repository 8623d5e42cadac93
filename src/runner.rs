use std::fmt::Display;

use crate::{Resource, ServiceState};

/// Turns the outcome of a check into exactly one [Resource]. Errors are mapped by the
/// `on_error` handler, or reported as [ServiceState::Critical] with the error message if none
/// is set.
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(E) -> Resource>>,
}

impl<E: Display> Runner<E> {
    pub fn new() -> Self {
        Self { on_error: None }
    }

    pub fn on_error(mut self, f: impl FnOnce(E) -> Resource + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Runs the check. The returned resource is the only result the process reports; call
    /// [Resource::print_and_exit] on it.
    pub fn safe_run(self, f: impl FnOnce() -> Result<Resource, E>) -> Resource {
        match f() {
            Ok(resource) => resource,
            Err(err) => match self.on_error {
                Some(on_error) => on_error(err),
                None => Resource::new(ServiceState::Critical).with_description(err.to_string()),
            },
        }
    }
}

impl<E: Display> Default for Runner<E> {
    fn default() -> Self {
        Self::new()
    }
}
