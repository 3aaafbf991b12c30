//! Numeric read-modify-write operations.
//!
//! Every operation runs under the exclusive lock, requires a live entry, and
//! leaves the entry's expiration untouched. Integer arithmetic wraps at the
//! stored width.

use crate::cache::{AsNumber, Number, Store};
use crate::error::{CacheError, Result};

macro_rules! int_increment {
    ($($(#[$meta:meta])* $name:ident => $variant:ident($ty:ty);)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self, key: &str, delta: $ty) -> Result<$ty> {
                self.update_number(key, stringify!($ty), |number| match number {
                    Number::$variant(n) => {
                        *n = n.wrapping_add(delta);
                        Some(*n)
                    }
                    _ => None,
                })
            }
        )*
    };
}

macro_rules! float_increment {
    ($($(#[$meta:meta])* $name:ident => $variant:ident($ty:ty);)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self, key: &str, delta: $ty) -> Result<$ty> {
                self.update_number(key, stringify!($ty), |number| match number {
                    Number::$variant(n) => {
                        *n += delta;
                        Some(*n)
                    }
                    _ => None,
                })
            }
        )*
    };
}

impl<V> Store<V>
where
    V: AsNumber + Clone + Send + Sync + 'static,
{
    /// Adds `delta` to an integer of any width, truncating `delta` to that width.
    ///
    /// # Errors
    /// [`CacheError::NotFound`] if the key is missing or expired,
    /// [`CacheError::TypeMismatch`] if it holds a float or a non-number.
    pub fn increment(&self, key: &str, delta: i64) -> Result<Number> {
        self.update_number(key, "integer", |number| {
            number.wrapping_add_int(delta).then_some(*number)
        })
    }

    /// Subtracts `delta` from an integer of any width. Errors as [`Store::increment`].
    pub fn decrement(&self, key: &str, delta: i64) -> Result<Number> {
        self.update_number(key, "integer", |number| {
            number.wrapping_sub_int(delta).then_some(*number)
        })
    }

    /// Adds `delta` to an `f32` or `f64`.
    ///
    /// # Errors
    /// [`CacheError::NotFound`] if the key is missing or expired,
    /// [`CacheError::TypeMismatch`] if it holds an integer or a non-number.
    pub fn increment_float(&self, key: &str, delta: f64) -> Result<Number> {
        self.update_number(key, "float", |number| number.add_float(delta).then_some(*number))
    }

    /// Subtracts `delta` from an `f32` or `f64`. Errors as [`Store::increment_float`].
    pub fn decrement_float(&self, key: &str, delta: f64) -> Result<Number> {
        self.increment_float(key, -delta)
    }

    int_increment! {
        /// Adds to an `i8`; any other stored type is a [`CacheError::TypeMismatch`].
        increment_i8 => I8(i8);
        increment_i16 => I16(i16);
        increment_i32 => I32(i32);
        increment_i64 => I64(i64);
        /// Adds to a `u8`; any other stored type is a [`CacheError::TypeMismatch`].
        increment_u8 => U8(u8);
        increment_u16 => U16(u16);
        increment_u32 => U32(u32);
        increment_u64 => U64(u64);
    }

    float_increment! {
        increment_f32 => F32(f32);
        increment_f64 => F64(f64);
    }

    /// Runs `apply` on the live entry's number under the write lock.
    ///
    /// `apply` returns None to reject the stored width and must leave the
    /// number untouched when it does.
    fn update_number<T>(
        &self,
        key: &str,
        expected: &'static str,
        apply: impl FnOnce(&mut Number) -> Option<T>,
    ) -> Result<T> {
        let mut state = self.shared.state.write();
        let entry = state
            .entries
            .get_mut(key)
            .filter(|entry| !entry.is_expired())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;

        let Some(number) = entry.value.as_number_mut() else {
            return Err(CacheError::type_mismatch(key, expected, None));
        };

        let found = number.kind();
        apply(number).ok_or_else(|| CacheError::type_mismatch(key, expected, Some(found)))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Duration;

    use super::*;
    use crate::cache::{Ttl, Value};

    fn store() -> Store {
        Store::new(Duration::from_secs(300), Duration::ZERO).unwrap()
    }

    #[test]
    fn test_increment_keeps_width() {
        let store = store();
        store.set("n", 10u16, Ttl::Default);

        assert_eq!(store.increment("n", 5).unwrap(), Number::U16(15));
        assert_eq!(store.get("n"), Some(Value::from(15u16)));
    }

    #[test]
    fn test_decrement() {
        let store = store();
        store.set("n", 10i32, Ttl::Default);

        assert_eq!(store.decrement("n", 15).unwrap(), Number::I32(-5));
    }

    #[test]
    fn test_increment_missing_key() {
        let store = store();
        assert!(matches!(store.increment("n", 1), Err(CacheError::NotFound(_))));
        assert!(matches!(store.increment_float("n", 1.0), Err(CacheError::NotFound(_))));
        assert!(matches!(store.increment_i64("n", 1), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_increment_expired_key() {
        let store = store();
        store.set("n", 1i64, Ttl::After(Duration::from_millis(10)));
        sleep(Duration::from_millis(30));

        assert!(matches!(store.increment("n", 1), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_increment_text_is_type_mismatch() {
        let store = store();
        store.set("n", "text", Ttl::Default);

        let err = store.increment("n", 1).unwrap_err();
        assert!(matches!(
            err,
            CacheError::TypeMismatch { expected: "integer", found: "non-numeric", .. }
        ));
        assert_eq!(store.get("n"), Some(Value::from("text")));
    }

    #[test]
    fn test_family_mismatch() {
        let store = store();
        store.set("int", 1i64, Ttl::Default);
        store.set("float", 1.0f64, Ttl::Default);

        assert!(matches!(
            store.increment_float("int", 1.0),
            Err(CacheError::TypeMismatch { found: "i64", .. })
        ));
        assert!(matches!(
            store.increment("float", 1),
            Err(CacheError::TypeMismatch { found: "f64", .. })
        ));
        assert_eq!(store.get("int"), Some(Value::from(1i64)));
        assert_eq!(store.get("float"), Some(Value::from(1.0f64)));
    }

    #[test]
    fn test_width_specific_requires_exact_width() {
        let store = store();
        store.set("n", 7i32, Ttl::Default);

        assert!(matches!(
            store.increment_i64("n", 1),
            Err(CacheError::TypeMismatch { expected: "i64", found: "i32", .. })
        ));
        assert_eq!(store.increment_i32("n", 1).unwrap(), 8);
    }

    #[test]
    fn test_width_specific_wraps() {
        let store = store();
        store.set("n", u8::MAX, Ttl::Default);

        assert_eq!(store.increment_u8("n", 1).unwrap(), 0);
    }

    #[test]
    fn test_float_increments() {
        let store = store();
        store.set("f32", 1.5f32, Ttl::Default);
        store.set("f64", 1.5f64, Ttl::Default);

        assert_eq!(store.increment_f32("f32", 0.5).unwrap(), 2.0);
        assert_eq!(store.increment_float("f64", 1.0).unwrap(), Number::F64(2.5));
        assert_eq!(store.decrement_float("f64", 0.5).unwrap(), Number::F64(2.0));
        assert!(matches!(
            store.increment_f64("f32", 1.0),
            Err(CacheError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_increment_preserves_expiration() {
        let store = store();
        store.set("n", 1u32, Ttl::After(Duration::from_secs(60)));
        let (_, before) = store.get_with_expiration("n").unwrap();

        sleep(Duration::from_millis(5));
        store.increment("n", 1).unwrap();

        let (_, after) = store.get_with_expiration("n").unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_increment_on_number_store() {
        let store: Store<Number> = Store::new(Duration::ZERO, Duration::ZERO).unwrap();
        store.set("n", Number::I8(1), Ttl::Never);

        assert_eq!(store.increment_i8("n", 2).unwrap(), 3);
    }
}
