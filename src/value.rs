use std::collections::BTreeMap;

use uuid::Uuid;

/// A dynamically typed statement parameter.
///
/// Each typed variant carries an `Option` so a NULL keeps its column type;
/// `Value::from(None::<i64>)` binds as a BIGINT NULL. [`Value::Null`] has no
/// type and binds as a text NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Bytes(Option<Vec<u8>>),
    Uuid(Option<Uuid>),
}

impl Value {
    /// Whether this is a NULL, typed or not.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(v) => v.is_none(),
            Value::Int(v) => v.is_none(),
            Value::Float(v) => v.is_none(),
            Value::Text(v) => v.is_none(),
            Value::Bytes(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(Some(value.into()))
                }
            }

            impl From<Option<$ty>> for Value {
                fn from(value: Option<$ty>) -> Self {
                    Value::$variant(value.map(Into::into))
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    f32 => Float,
    f64 => Float,
    &str => Text,
    String => Text,
    &String => Text,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    Uuid => Uuid,
}

/// Parameters bound by name to `:name` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedArgs {
    values: BTreeMap<String, Value>,
}

impl NamedArgs {
    /// Create an empty set of named arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, replacing any previous value bound to the same name.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a value in place. A leading `:` on the name is ignored.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let key = name.strip_prefix(':').map(str::to_owned).unwrap_or(name);
        self.values.insert(key, value.into());
    }

    /// Looks up the value bound to `name`, with or without its leading `:`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name.strip_prefix(':').unwrap_or(name))
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound names and values, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for NamedArgs
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = NamedArgs::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

/// Types that can supply named parameters, typically entities persisted
/// through `execute_named`.
pub trait ToNamedArgs {
    /// Produce the arguments for this value's `:name` placeholders.
    fn to_named_args(&self) -> NamedArgs;
}

impl ToNamedArgs for NamedArgs {
    fn to_named_args(&self) -> NamedArgs {
        self.clone()
    }
}
