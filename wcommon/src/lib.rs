//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use wcommon::{RequestId, SessionId};
//!
//! let first = SessionId::initial();
//! let second = first.next();
//! let request = RequestId::from("req-1");
//!
//! assert!(second > first);
//! assert_eq!(request.as_str(), "req-1");
//! assert_eq!(second.to_string(), "session-2");
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use wcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Session and request identifier newtypes.
    //!
    //! ```rust
    //! use wcommon::{RequestId, SessionId};
    //!
    //! let session = SessionId::new(42);
    //! let request = RequestId::new("4c1f");
    //!
    //! assert_eq!(session.get(), 42);
    //! assert_eq!(request.to_string(), "4c1f");
    //! ```

    use std::fmt::{Display, Formatter};

    /// Identifier of one physical connection lifetime.
    ///
    /// Identifiers are handed out from a monotonic counter, so a later session always
    /// compares greater than an earlier one.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct SessionId(u64);

    impl SessionId {
        pub fn new(value: u64) -> Self {
            Self(value)
        }

        pub fn initial() -> Self {
            Self(1)
        }

        pub fn next(self) -> Self {
            Self(self.0.saturating_add(1))
        }

        pub fn get(self) -> u64 {
            self.0
        }
    }

    impl Display for SessionId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "session-{}", self.0)
        }
    }

    /// Correlation identifier shared with the backend as `request_id`.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct RequestId(String);

    impl RequestId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }

        pub fn into_string(self) -> String {
            self.0
        }
    }

    impl Display for RequestId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for RequestId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for RequestId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    impl std::borrow::Borrow<str> for RequestId {
        fn borrow(&self) -> &str {
            self.0.as_str()
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by lookup tables.
    //!
    //! ```rust
    //! use wcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert!(registry.contains_key("alpha"));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get_mut(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn drain(&mut self) -> impl Iterator<Item = (K, V)> + '_ {
            self.items.drain()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use context::{RequestId, SessionId};
pub use future::BoxFuture;
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use super::{Registry, RequestId, SessionId};

    #[test]
    fn session_ids_are_monotonic() {
        let first = SessionId::initial();
        let second = first.next();
        let third = second.next();

        assert!(first < second && second < third);
        assert_eq!(third.get(), 3);
        assert_eq!(first.to_string(), "session-1");
    }

    #[test]
    fn request_id_wraps_backend_correlation_string() {
        let request = RequestId::from("req-7".to_string());

        assert_eq!(request.as_str(), "req-7");
        assert_eq!(request.to_string(), "req-7");
        assert_eq!(request.into_string(), "req-7");
    }

    #[test]
    fn generic_registry_basic_lifecycle() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.insert(RequestId::from("alpha"), 1_u32);
        assert_eq!(registry.get("alpha"), Some(&1));
        assert!(registry.contains_key("alpha"));
        assert_eq!(registry.len(), 1);

        if let Some(value) = registry.get_mut("alpha") {
            *value += 1;
        }

        let drained = registry.drain().collect::<Vec<_>>();
        assert_eq!(drained, vec![(RequestId::from("alpha"), 2)]);
        assert!(registry.is_empty());
    }
}
