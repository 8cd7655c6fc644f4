//! Passive health checking (failure detection).
//!
//! # Responsibilities
//! - Observe forwarding outcomes
//! - Demote a backend immediately when it refuses connections
//!
//! # Design Decisions
//! - Only connection-refused demotes; other transport errors are left to the
//!   next active pass
//! - The error chain is walked, since the io error sits under the client and
//!   connector errors

use std::error::Error as StdError;
use std::io;

use crate::load_balancer::backend::Backend;

/// True if any error in the `source()` chain is a refused connection.
pub fn is_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// Record a failed forward. Returns true when the backend was demoted.
pub fn observe_failure(backend: &Backend, err: &(dyn StdError + 'static)) -> bool {
    if !is_connection_refused(err) {
        return false;
    }
    let was_alive = backend.set_alive(false);
    if was_alive {
        tracing::warn!(url = %backend.address(), "Backend refused connection, marked down");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use url::Url;

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "client error")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn finds_nested_refusal() {
        let err = Wrapped(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(is_connection_refused(&err));
    }

    #[test]
    fn ignores_other_errors() {
        let err = Wrapped(io::Error::from(io::ErrorKind::TimedOut));
        assert!(!is_connection_refused(&err));
    }

    #[test]
    fn demotes_only_on_refusal() {
        let backend = Backend::new(Url::parse("http://127.0.0.1:9001").unwrap());
        backend.set_alive(true);

        let reset = Wrapped(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(!observe_failure(&backend, &reset));
        assert!(backend.is_alive());

        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(observe_failure(&backend, &refused));
        assert!(!backend.is_alive());
    }
}
