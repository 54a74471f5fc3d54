use serde::{Deserialize, Deserializer, Serialize};

/// A single attribute slot inside a partial update.
///
/// `Unset` means the update leaves the attribute untouched. `Set(v)` means
/// the attribute becomes exactly `v`, including empty strings and cleared
/// roles. The two are never conflated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldUpdate<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Unset => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Last-write-wins fold step: overwrite `slot` when this update carries a
    /// value, leave it alone otherwise.
    pub fn apply_to(&self, slot: &mut Option<T>)
    where
        T: Clone,
    {
        if let Self::Set(value) = self {
            *slot = Some(value.clone());
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Unset,
        }
    }
}

/// `deserialize_with` helper for optional keys: a key that is present decodes
/// to `Some`, even when its value is `null`. Pair it with `#[serde(default)]`
/// so a missing key stays `None`.
pub fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
