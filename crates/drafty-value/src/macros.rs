//! The [`value!`] construction macro.
//!
//! Builds a [`Value`](crate::Value) from a JSON-like literal. Record keys
//! are string literals (or parenthesized expressions evaluating to
//! `String`); any Rust expression convertible into a `Value` can appear in
//! value position. Sets and maps have no literal form; use
//! [`Value::set`](crate::Value::set) and [`Value::map`](crate::Value::map).
//!
//! # Example
//!
//! ```
//! use drafty_value::value;
//!
//! let done = false;
//! let todo = value!({
//!     "title": "learn",
//!     "done": done,
//!     "tags": ["a", "b"],
//!     "parent": null,
//! });
//! assert_eq!(todo.keys().len(), 4);
//! ```

/// Construct a [`Value`](crate::Value) from a literal.
#[macro_export]
macro_rules! value {
    ($($value:tt)+) => {
        $crate::value_internal!($($value)+)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! value_internal {
    // ── Array munching ────────────────────────────────────────────────────

    // Done with trailing comma.
    (@array [$($elems:expr,)*]) => {
        $crate::value_internal_vec![$($elems,)*]
    };

    // Done without trailing comma.
    (@array [$($elems:expr),*]) => {
        $crate::value_internal_vec![$($elems),*]
    };

    // Next element is `null`.
    (@array [$($elems:expr,)*] null $($rest:tt)*) => {
        $crate::value_internal!(@array [$($elems,)* $crate::value_internal!(null)] $($rest)*)
    };

    // Next element is an array.
    (@array [$($elems:expr,)*] [$($array:tt)*] $($rest:tt)*) => {
        $crate::value_internal!(@array [$($elems,)* $crate::value_internal!([$($array)*])] $($rest)*)
    };

    // Next element is a record.
    (@array [$($elems:expr,)*] {$($map:tt)*} $($rest:tt)*) => {
        $crate::value_internal!(@array [$($elems,)* $crate::value_internal!({$($map)*})] $($rest)*)
    };

    // Next element is an expression followed by a comma.
    (@array [$($elems:expr,)*] $next:expr, $($rest:tt)*) => {
        $crate::value_internal!(@array [$($elems,)* $crate::value_internal!($next),] $($rest)*)
    };

    // Last element is an expression with no trailing comma.
    (@array [$($elems:expr,)*] $last:expr) => {
        $crate::value_internal!(@array [$($elems,)* $crate::value_internal!($last)])
    };

    // Comma after the most recent element.
    (@array [$($elems:expr),*] , $($rest:tt)*) => {
        $crate::value_internal!(@array [$($elems,)*] $($rest)*)
    };

    // ── Record munching ───────────────────────────────────────────────────

    // Done.
    (@object $object:ident () () ()) => {};

    // Insert the current entry followed by a trailing comma.
    (@object $object:ident [$($key:tt)+] ($value:expr) , $($rest:tt)*) => {
        let _ = $object.insert(($($key)+).into(), $value);
        $crate::value_internal!(@object $object () ($($rest)*) ($($rest)*));
    };

    // Insert the last entry without a trailing comma.
    (@object $object:ident [$($key:tt)+] ($value:expr)) => {
        let _ = $object.insert(($($key)+).into(), $value);
    };

    // Next value is `null`.
    (@object $object:ident ($($key:tt)+) (: null $($rest:tt)*) $copy:tt) => {
        $crate::value_internal!(@object $object [$($key)+] ($crate::value_internal!(null)) $($rest)*);
    };

    // Next value is an array.
    (@object $object:ident ($($key:tt)+) (: [$($array:tt)*] $($rest:tt)*) $copy:tt) => {
        $crate::value_internal!(@object $object [$($key)+] ($crate::value_internal!([$($array)*])) $($rest)*);
    };

    // Next value is a record.
    (@object $object:ident ($($key:tt)+) (: {$($map:tt)*} $($rest:tt)*) $copy:tt) => {
        $crate::value_internal!(@object $object [$($key)+] ($crate::value_internal!({$($map)*})) $($rest)*);
    };

    // Next value is an expression followed by a comma.
    (@object $object:ident ($($key:tt)+) (: $value:expr , $($rest:tt)*) $copy:tt) => {
        $crate::value_internal!(@object $object [$($key)+] ($crate::value_internal!($value)) , $($rest)*);
    };

    // Last value is an expression with no trailing comma.
    (@object $object:ident ($($key:tt)+) (: $value:expr) $copy:tt) => {
        $crate::value_internal!(@object $object [$($key)+] ($crate::value_internal!($value)));
    };

    // Key is fully parenthesized.
    (@object $object:ident () (($key:expr) : $($rest:tt)*) $copy:tt) => {
        $crate::value_internal!(@object $object ($key) (: $($rest)*) (: $($rest)*));
    };

    // Munch a token into the current key.
    (@object $object:ident ($($key:tt)*) ($tt:tt $($rest:tt)*) $copy:tt) => {
        $crate::value_internal!(@object $object ($($key)* $tt) ($($rest)*) ($($rest)*));
    };

    // ── Primary entry points ──────────────────────────────────────────────

    (null) => {
        $crate::Value::Null
    };

    ([]) => {
        $crate::Value::array(::std::vec::Vec::new())
    };

    ([ $($tt:tt)+ ]) => {
        $crate::Value::array($crate::value_internal!(@array [] $($tt)+))
    };

    ({}) => {
        $crate::Value::object($crate::ValueObject::new())
    };

    ({ $($tt:tt)+ }) => {{
        let mut object = $crate::ValueObject::new();
        $crate::value_internal!(@object object () ($($tt)+) ($($tt)+));
        $crate::Value::object(object)
    }};

    // Any expression convertible into a Value.
    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! value_internal_vec {
    ($($content:tt)*) => {
        ::std::vec![$($content)*]
    };
}

#[cfg(test)]
mod tests {
    use crate::key::Key;
    use crate::value::Value;

    #[test]
    fn scalars() {
        assert_eq!(value!(null), Value::Null);
        assert_eq!(value!(true), Value::Bool(true));
        assert_eq!(value!(7), Value::from(7));
        assert_eq!(value!("s"), Value::from("s"));
    }

    #[test]
    fn nested_literals() {
        let v = value!({"a": [1, {"b": null}], "c": 2.5});
        let a = v.get(&Key::from("a")).cloned().unwrap();
        assert_eq!(a.len(), Some(2));
        let inner = a.get(&Key::from(1)).cloned().unwrap();
        assert_eq!(inner.get(&Key::from("b")), Some(&Value::Null));
    }

    #[test]
    fn interpolation() {
        let n = 5;
        let name = String::from("x");
        let v = value!({(name): [n, n + 1]});
        assert_eq!(v.get(&Key::from("x")).cloned().unwrap(), value!([5, 6]));
    }

    #[test]
    fn trailing_commas() {
        let v = value!({"a": 1,});
        assert_eq!(v.len(), Some(1));
        assert_eq!(value!([1, 2,]), value!([1, 2]));
    }
}
