//! Canonical tag sets.
//!
//! Tags arrive as either a list of strings or one comma-separated string.
//! [`TagSet`] normalizes both into trimmed, lower-cased, de-duplicated
//! tokens so that scoring only ever compares canonical values.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

/// A normalized set of lower-case tags, kept in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

/// Normalize a single tag. Returns `None` for blank input.
#[must_use]
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

impl TagSet {
    /// Build from any list of raw tags.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tags.into_iter()
                .filter_map(|t| normalize_tag(t.as_ref()))
                .collect(),
        )
    }

    /// Build from a comma-separated string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::from_tags(raw.split(','))
    }

    /// Read a stored JSON value.
    ///
    /// Arrays keep their string elements, strings are split on commas and
    /// anything else reads as the empty set.
    #[must_use]
    pub fn from_json(value: &Json) -> Self {
        match value {
            Json::Array(items) => Self::from_tags(items.iter().filter_map(Json::as_str)),
            Json::String(raw) => Self::parse(raw),
            _ => Self::default(),
        }
    }

    /// Persisted form: a sorted JSON array.
    #[must_use]
    pub fn to_json(&self) -> Json {
        Json::Array(self.0.iter().cloned().map(Json::String).collect())
    }

    /// Whether `tag` (normalized first) is in the set.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        normalize_tag(tag).is_some_and(|t| self.0.contains(&t))
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTags {
            List(Vec<String>),
            Joined(String),
        }

        Ok(match RawTags::deserialize(deserializer)? {
            RawTags::List(tags) => Self::from_tags(tags),
            RawTags::Joined(raw) => Self::parse(&raw),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_comma_separated() {
        let tags = TagSet::parse(" Visual, dyslexia ,,VISUAL ");
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["dyslexia", "visual"]);
    }

    #[test]
    fn test_deserialize_list_or_string() {
        let from_list: TagSet = serde_json::from_value(json!(["Auditory", " visual"])).unwrap();
        let from_string: TagSet = serde_json::from_value(json!("visual,AUDITORY")).unwrap();
        assert_eq!(from_list, from_string);
    }

    #[test]
    fn test_from_json_unexpected_shape_is_empty() {
        assert!(TagSet::from_json(&json!(42)).is_empty());
        assert!(TagSet::from_json(&Json::Null).is_empty());
        assert_eq!(TagSet::from_json(&json!(["visual", 3])).len(), 1);
    }

    #[test]
    fn test_contains_normalizes_query() {
        let tags = TagSet::from_tags(["dyslexia"]);
        assert!(tags.contains("  Dyslexia"));
        assert!(!tags.contains(""));
    }

    #[test]
    fn test_to_json_is_sorted() {
        let tags = TagSet::parse("visual,auditory");
        assert_eq!(tags.to_json(), json!(["auditory", "visual"]));
        assert_eq!(tags.to_string(), "auditory,visual");
    }
}
