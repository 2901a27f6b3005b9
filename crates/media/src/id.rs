use std::borrow::Borrow;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Opaque identifier of a media item in the host catalog.
///
/// Ordered lexically so that add/remove batches can be replayed in a stable
/// order between runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.0
    }
}
impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
