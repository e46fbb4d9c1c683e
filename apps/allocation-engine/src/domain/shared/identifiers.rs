//! Strongly-typed identifiers for ERP records.
//!
//! The ERP keys every record with an integer. Wrapping them prevents passing a
//! catalog id where a storage device id is expected.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Wire form accepted for identifiers: the ERP sends numbers, browser
/// clients sometimes send numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(u64),
    Text(String),
}

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create an identifier from its raw value.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Get the raw value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match IdRepr::deserialize(deserializer)? {
                    IdRepr::Number(value) => Ok(Self(value)),
                    IdRepr::Text(text) => text
                        .trim()
                        .parse()
                        .map(Self)
                        .map_err(|_| serde::de::Error::custom(format!(
                            "invalid {}: {text:?}",
                            stringify!($name)
                        ))),
                }
            }
        }
    };
}

define_id!(PoId, "ERP identifier of a purchase (vendor) order.");
define_id!(CatalogId, "ERP identifier of a catalog item (one PO line).");
define_id!(StorageDeviceId, "ERP identifier of a storage device (physical or logical location).");
define_id!(ReceiptId, "ERP identifier of a purchase-order receipt.");
define_id!(StaffId, "Identifier of the staff member performing an allocation.");
