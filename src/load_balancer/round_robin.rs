//! Round-robin load balancing strategy.

use std::sync::Arc;
use crate::load_balancer::{LoadBalancer, backend::Backend};

/// Round-robin selector.
/// The rotation cursor lives in the pool so it survives membership changes.
#[derive(Debug, Default)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, backends: &[Arc<Backend>], cursor: &mut usize) -> Option<Arc<Backend>> {
        let len = backends.len();
        if len == 0 {
            return None;
        }

        let start = *cursor % len;
        for i in 0..len {
            let index = (start + i) % len;
            let backend = &backends[index];
            if backend.is_alive() {
                *cursor = (index + 1) % len;
                return Some(backend.clone());
            }
        }
        // Nothing alive: leave the cursor where it was.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn alive(addr: &str) -> Arc<Backend> {
        let b = Arc::new(Backend::new(Url::parse(addr).unwrap()));
        b.set_alive(true);
        b
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let b1 = alive("http://127.0.0.1:8080");
        let b2 = alive("http://127.0.0.1:8081");
        let backends = vec![b1.clone(), b2.clone()];
        let mut cursor = 0;

        let s1 = lb.next_server(&backends, &mut cursor).unwrap();
        assert_eq!(s1.address(), b1.address());

        let s2 = lb.next_server(&backends, &mut cursor).unwrap();
        assert_eq!(s2.address(), b2.address());

        let s3 = lb.next_server(&backends, &mut cursor).unwrap();
        assert_eq!(s3.address(), b1.address());
    }

    #[test]
    fn cursor_moves_past_selected_member() {
        let lb = RoundRobin::new();
        let b1 = alive("http://127.0.0.1:8080");
        let b2 = alive("http://127.0.0.1:8081");
        let b3 = alive("http://127.0.0.1:8082");
        b2.set_alive(false);
        let backends = vec![b1, b2, b3.clone()];
        let mut cursor = 1;

        let picked = lb.next_server(&backends, &mut cursor).unwrap();
        assert_eq!(picked.address(), b3.address());
        assert_eq!(cursor, 0);
    }

    #[test]
    fn none_alive_keeps_cursor() {
        let lb = RoundRobin::new();
        let b1 = alive("http://127.0.0.1:8080");
        b1.set_alive(false);
        let mut cursor = 0;
        assert!(lb.next_server(&[b1], &mut cursor).is_none());
        assert_eq!(cursor, 0);
        assert!(lb.next_server(&[], &mut cursor).is_none());
    }
}
