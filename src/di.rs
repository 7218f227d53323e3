//! Wiring between the application [`Context`](crate::context::Context) and
//! the services built from it.
//!
//! A service names its dependencies as fields and derives `FromContext`; the
//! context derives `Context` so that each of its fields can be pulled out with
//! [`FromRef`]. Derives live in `backstab-macros`.
//!
//! ```ignore
//! #[derive(Context, Clone)]
//! pub struct Context {
//!     pub config: Arc<Config>,
//!     pub writer: AppWriter,
//! }
//!
//! #[derive(FromContext, Clone)]
//! pub struct Publisher {
//!     writer: AppWriter,
//! }
//!
//! let publisher = Publisher::from_ref(&ctx);
//! ```

/// Builds `Self` out of a borrowed `T`, usually by cloning one of its fields.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

pub use backstab_macros::{Context, FromContext};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Context, Clone)]
    struct TestContext {
        name: Arc<String>,
        limit: usize,
        #[context(skip)]
        #[allow(dead_code)]
        other: usize,
    }

    #[derive(FromContext)]
    #[from_context(context = TestContext)]
    struct Service {
        name: Arc<String>,
        limit: usize,
        #[from_context(default)]
        calls: Vec<u32>,
    }

    #[test]
    fn test_from_context_resolves_fields() {
        let ctx = TestContext {
            name: Arc::new("backstab".to_string()),
            limit: 3,
            other: 9,
        };

        let service = Service::from_ref(&ctx);
        assert_eq!(service.name.as_str(), "backstab");
        assert_eq!(service.limit, 3);
        assert!(service.calls.is_empty());
        assert!(Arc::ptr_eq(&service.name, &ctx.name));
    }
}
