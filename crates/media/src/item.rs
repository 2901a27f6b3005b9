use crate::ItemId;
use std::collections::BTreeSet;

/// Read-only metadata snapshot of a single media item.
///
/// Produced by the host catalog once per sync pass and never mutated
/// afterwards. Set-valued attributes are deduplicated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaItem {
    /// Host identifier of the item
    pub id: ItemId,
    /// Display title
    pub title: String,
    /// Production studio, if the host knows one
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub studio: Option<String>,
    /// Genre names
    #[cfg_attr(feature = "serde", serde(default))]
    pub genres: BTreeSet<String>,
    /// Cast member names
    #[cfg_attr(feature = "serde", serde(default))]
    pub actors: BTreeSet<String>,
    /// Director names
    #[cfg_attr(feature = "serde", serde(default))]
    pub directors: BTreeSet<String>,
}

impl MediaItem {
    /// Create an item with only an id and a title; everything else is absent.
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            studio: None,
            genres: BTreeSet::new(),
            actors: BTreeSet::new(),
            directors: BTreeSet::new(),
        }
    }

    pub fn with_studio(mut self, studio: impl Into<String>) -> Self {
        self.studio = Some(studio.into());
        self
    }

    pub fn with_genres<S: Into<String>>(mut self, genres: impl IntoIterator<Item = S>) -> Self {
        self.genres.extend(genres.into_iter().map(Into::into));
        self
    }

    pub fn with_actors<S: Into<String>>(mut self, actors: impl IntoIterator<Item = S>) -> Self {
        self.actors.extend(actors.into_iter().map(Into::into));
        self
    }

    pub fn with_directors<S: Into<String>>(mut self, directors: impl IntoIterator<Item = S>) -> Self {
        self.directors.extend(directors.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_deduplicates_sets() {
        let item = MediaItem::new("1", "Heat").with_actors(["Al Pacino", "Robert De Niro", "Al Pacino"]);
        assert_eq!(item.actors.len(), 2);
        assert!(item.studio.is_none());
        assert!(item.genres.is_empty());
    }

    #[test]
    fn item_ids_order_lexically() {
        let mut ids = vec![ItemId::from("b"), ItemId::from("a"), ItemId::from("c")];
        ids.sort();
        assert_eq!(ids, vec![ItemId::from("a"), ItemId::from("b"), ItemId::from("c")]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_with_missing_optional_fields() {
        let item: MediaItem = serde_json::from_str(r#"{"id": "42", "title": "Alien", "genres": ["Horror"]}"#).unwrap();
        assert_eq!(item.id, ItemId::from("42"));
        assert_eq!(item.studio, None);
        assert!(item.genres.contains("Horror"));
        assert!(item.directors.is_empty());
    }
}
