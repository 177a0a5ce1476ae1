use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque event argument.
///
/// Cheap to clone (`Arc`-backed); consumers recover the concrete type with
/// [`Arg::downcast_ref`].
#[derive(Clone)]
pub struct Arg(Arc<dyn Any + Send + Sync>);

impl Arg {
    /// Wraps any `Send + Sync` value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the value if it is of type `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns `true` if the value is of type `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Common scalar payloads are rendered; everything else stays opaque.
        if let Some(s) = self.downcast_ref::<&'static str>() {
            write!(f, "{s:?}")
        } else if let Some(s) = self.downcast_ref::<String>() {
            write!(f, "{s:?}")
        } else if let Some(n) = self.downcast_ref::<i64>() {
            write!(f, "{n}")
        } else if let Some(n) = self.downcast_ref::<i32>() {
            write!(f, "{n}")
        } else if let Some(n) = self.downcast_ref::<u64>() {
            write!(f, "{n}")
        } else {
            f.write_str("Arg(..)")
        }
    }
}
