//! Reference records fetched from the backend (medicines and stockists).
//!
//! Backend payloads are loosely typed: the same relation can live under
//! several keys, and ids may be strings, numbers or nested objects. Records
//! are therefore kept as raw JSON objects and interpreted through the alias
//! helpers in [`crate::resolver::fields`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A medicine record. Read-only for the duration of a resolution pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Medicine {
    fields: Map<String, Value>,
}

/// A stockist record. Read-only for the duration of a resolution pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Stockist {
    fields: Map<String, Value>,
}

macro_rules! record_impl {
    ($ty:ident) => {
        impl $ty {
            /// Wrap a JSON value. Anything other than an object becomes an empty record.
            pub fn from_value(value: Value) -> Self {
                match value {
                    Value::Object(fields) => Self { fields },
                    _ => Self::default(),
                }
            }

            /// Raw field map.
            pub fn fields(&self) -> &Map<String, Value> {
                &self.fields
            }

            /// Raw field lookup.
            pub fn get(&self, key: &str) -> Option<&Value> {
                self.fields.get(key)
            }
        }

        impl From<Value> for $ty {
            fn from(value: Value) -> Self {
                Self::from_value(value)
            }
        }
    };
}

record_impl!(Medicine);
record_impl!(Stockist);
