//! Tri-state desired-configuration attributes

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A caller-declared attribute value.
///
/// Desired configuration distinguishes three states: explicitly set,
/// explicitly absent (the caller wants the appliance default), and unknown
/// (not mentioned at all; compute from the remote read-back). In the JSON
/// representation `null` means `Null` and a missing field means `Unknown`,
/// so desired structs mark every `Attr` field `#[serde(default)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attr<T> {
    Set(T),
    Null,
    #[default]
    Unknown,
}

impl<T> Attr<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Attr::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Attr::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Attr::Unknown)
    }
}

impl<T: Clone> Attr<T> {
    /// The set value, cloned, if one was declared
    pub fn cloned(&self) -> Option<T> {
        self.get().cloned()
    }
}

impl<T: Copy> Attr<T> {
    pub fn copied(&self) -> Option<T> {
        self.get().copied()
    }
}

impl<'de, T> Deserialize<'de> for Attr<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Attr::Set(value),
            None => Attr::Null,
        })
    }
}

impl<T> Serialize for Attr<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Attr::Set(value) => value.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}
