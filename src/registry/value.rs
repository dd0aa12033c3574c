//! Runtime-typed values passed between pipeline stages.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a concrete Rust type flowing through the pipeline.
///
/// Equality is exact: `ValueType::of::<String>()` never equals
/// `ValueType::of::<&str>()`. The name is for messages only.
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    pub fn of<T: Any>() -> Self {
        Self { id: TypeId::of::<T>(), name: std::any::type_name::<T>() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl Hash for ValueType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Values holding resources that must be released once written.
pub trait Disposable {
    fn dispose(&mut self);
}

type DisposeHook = fn(&mut (dyn Any + Send + 'static));

/// A boxed pipeline value tagged with its exact runtime type.
pub struct AssetValue {
    value: Box<dyn Any + Send>,
    value_type: ValueType,
    dispose: Option<DisposeHook>,
}

impl AssetValue {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self { value: Box::new(value), value_type: ValueType::of::<T>(), dispose: None }
    }

    /// Wrap a value whose [`Disposable::dispose`] runs after the writer.
    pub fn disposable<T: Any + Send + Disposable>(value: T) -> Self {
        fn hook<T: Any + Disposable>(value: &mut (dyn Any + Send + 'static)) {
            if let Some(value) = value.downcast_mut::<T>() {
                value.dispose();
            }
        }
        Self { dispose: Some(hook::<T> as DisposeHook), ..Self::new(value) }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value_type == ValueType::of::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }

    /// Take the value out, or hand `self` back if the type does not match.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        let Self { value, value_type, dispose } = self;
        value.downcast::<T>().map(|b| *b).map_err(|value| Self { value, value_type, dispose })
    }

    pub fn is_disposable(&self) -> bool {
        self.dispose.is_some()
    }

    /// Run the dispose hook, if any, and drop the value.
    pub fn dispose(mut self) {
        if let Some(hook) = self.dispose.take() {
            hook(self.value.as_mut());
        }
    }
}

impl fmt::Debug for AssetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetValue")
            .field("value_type", &self.value_type)
            .field("disposable", &self.is_disposable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Handle(Arc<AtomicUsize>);

    impl Disposable for Handle {
        fn dispose(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_value_type_is_exact() {
        assert_eq!(ValueType::of::<String>(), ValueType::of::<String>());
        assert_ne!(ValueType::of::<String>(), ValueType::of::<&'static str>());
        assert_ne!(ValueType::of::<Vec<u8>>(), ValueType::of::<Vec<i8>>());
        assert!(ValueType::of::<String>().name().ends_with("String"));
    }

    #[test]
    fn test_downcast() {
        let value = AssetValue::new("hello".to_string());
        assert!(value.is::<String>());
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("hello"));

        let value = value.downcast::<Vec<u8>>().unwrap_err();
        assert_eq!(value.downcast::<String>().unwrap(), "hello");
    }

    #[test]
    fn test_dispose_runs_hook_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let value = AssetValue::disposable(Handle(count.clone()));
        assert!(value.is_disposable());

        value.dispose();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_plain_values_are_not_disposable() {
        let value = AssetValue::new(42u32);
        assert!(!value.is_disposable());
        value.dispose();
    }
}
