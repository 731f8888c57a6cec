use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Typed key for a value stored in a [`Context`].
///
/// Keys are zero-sized marker types; the associated `Value` is what gets
/// stored and handed back by [`Context::value`].
pub trait Key: 'static {
    type Value: Send + Sync + 'static;

    /// Human readable name used in `Debug` output and lookup failures.
    const NAME: &'static str;
}

/// Immutable, request-scoped bag of typed values.
///
/// Deriving a child with [`Context::with_value`] never touches the receiver:
/// the child points at the receiver's chain and adds one association in
/// front of it. Lookups walk from the newest association outwards, so a
/// value bound in a child shadows one bound further up.
///
/// Cloning is cheap (one `Arc` bump) and contexts are `Send + Sync`, so they
/// can be passed freely into spawned tasks.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Link>>,
}

struct Link {
    key: TypeId,
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Link>>,
}

impl Context {
    /// The empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context in which `K` is bound to `value`.
    pub fn with_value<K: Key>(&self, value: K::Value) -> Context {
        Context {
            head: Some(Arc::new(Link {
                key: TypeId::of::<K>(),
                name: K::NAME,
                value: Arc::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// The innermost value bound to `K`, if any.
    pub fn value<K: Key>(&self) -> Option<&K::Value> {
        let wanted = TypeId::of::<K>();
        let mut link = self.head.as_deref();
        while let Some(current) = link {
            if current.key == wanted {
                return current.value.downcast_ref::<K::Value>();
            }
            link = current.parent.as_deref();
        }
        None
    }

    /// The innermost value bound to `K`.
    ///
    /// # Panics
    ///
    /// Panics with `no <K::NAME> in Context` if nothing was bound. A missing
    /// binding is a wiring bug in the caller, not a recoverable condition.
    #[track_caller]
    pub fn expect_value<K: Key>(&self) -> &K::Value {
        match self.value::<K>() {
            Some(value) => value,
            None => panic!("no {} in Context", K::NAME),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        let mut link = self.head.as_deref();
        while let Some(current) = link {
            list.entry(&format_args!("{}", current.name));
            link = current.parent.as_deref();
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Answer;
    impl Key for Answer {
        type Value = i32;
        const NAME: &'static str = "Answer";
    }

    struct Greeting;
    impl Key for Greeting {
        type Value = String;
        const NAME: &'static str = "Greeting";
    }

    #[test]
    fn background_has_no_values() {
        assert!(Context::background().value::<Answer>().is_none());
    }

    #[test]
    fn child_sees_parent_values_and_parent_is_untouched() {
        let root = Context::background().with_value::<Answer>(42);
        let child = root.with_value::<Greeting>("hi".to_string());

        assert_eq!(child.value::<Answer>(), Some(&42));
        assert_eq!(child.value::<Greeting>().map(String::as_str), Some("hi"));
        assert!(root.value::<Greeting>().is_none());
    }

    #[test]
    fn inner_binding_shadows_outer() {
        let outer = Context::background().with_value::<Answer>(1);
        let inner = outer.with_value::<Answer>(2);
        assert_eq!(inner.value::<Answer>(), Some(&2));
        assert_eq!(outer.value::<Answer>(), Some(&1));
    }

    #[test]
    #[should_panic(expected = "no Answer in Context")]
    fn expect_value_panics_when_missing() {
        Context::background().expect_value::<Answer>();
    }

    #[test]
    fn debug_lists_keys_newest_first() {
        let ctx = Context::background()
            .with_value::<Answer>(1)
            .with_value::<Greeting>(String::new());
        assert_eq!(format!("{ctx:?}"), "[Greeting, Answer]");
    }
}
