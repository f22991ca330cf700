use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::ByteStr;

/// Server side object name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Id(ByteStr);

impl Id {
    pub(crate) fn next(prefix: &str, atomic: &AtomicU64) -> Self {
        let id = atomic.fetch_add(1, Ordering::Relaxed);
        let mut b = itoa::Buffer::new();
        let id = b.format(id);

        let mut name = String::with_capacity(prefix.len() + id.len());
        name.push_str(prefix);
        name.push_str(id);
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.as_str()).finish()
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

macro_rules! delegate {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name(Id);

        impl $name {
            /// Next name of the sequence owned by `atomic`.
            pub(crate) fn next(atomic: &AtomicU64) -> Self {
                Self(Id::next($prefix, atomic))
            }
        }

        impl std::ops::Deref for $name {
            type Target = Id;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.as_str()).finish()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

delegate!(
    /// Prepared statement name, `S_` followed by a per connection sequence.
    StatementName, "S_"
);
delegate!(
    /// Portal name, `B_` followed by a per connection sequence.
    PortalName, "B_"
);
