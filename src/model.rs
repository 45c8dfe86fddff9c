use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::PinError;

/// Identifier of a pinned repository.
///
/// GitHub sends numeric ids, callers may also use composite string ids. The
/// submitted representation is kept for storage; comparisons go through
/// [`RepoId::canonical`].
#[derive(Debug, Clone)]
pub enum RepoId {
    Numeric(i64),
    Text(String),
}

impl RepoId {
    /// Parses an id coming from a query string or the command line.
    pub fn parse(raw: &str) -> Result<Self, PinError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PinError::validation("Missing repo ID"));
        }
        match trimmed.parse::<i64>() {
            Ok(n) => Ok(RepoId::Numeric(n)),
            Err(_) => Ok(RepoId::Text(trimmed.to_string())),
        }
    }

    /// Decimal digits for integer-like ids, the trimmed text otherwise.
    pub fn canonical(&self) -> String {
        match self {
            RepoId::Numeric(n) => n.to_string(),
            RepoId::Text(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<i64>() {
                    Ok(n) => n.to_string(),
                    Err(_) => trimmed.to_string(),
                }
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, RepoId::Text(s) if s.trim().is_empty())
    }

    /// Reads the `repoIds` member of a reorder request.
    pub fn list_from_json(value: Option<Value>) -> Result<Vec<RepoId>, PinError> {
        let Some(Value::Array(items)) = value else {
            return Err(PinError::validation("repoIds must be an array of repository ids"));
        };

        items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<RepoId>(item).map_err(|e| {
                    PinError::validation_with("repoIds must be an array of repository ids", e)
                })
            })
            .collect()
    }
}

impl PartialEq for RepoId {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for RepoId {}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoId::Numeric(n) => write!(f, "{}", n),
            RepoId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for RepoId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RepoId::Numeric(n) => serializer.serialize_i64(*n),
            RepoId::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct RepoIdVisitor;

impl<'de> Visitor<'de> for RepoIdVisitor {
    type Value = RepoId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer or a non-empty string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RepoId, E> {
        Ok(RepoId::Numeric(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RepoId, E> {
        i64::try_from(v)
            .map(RepoId::Numeric)
            .map_err(|_| E::custom(format!("repository id {} is out of range", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RepoId, E> {
        if v.trim().is_empty() {
            return Err(E::custom("repository id must not be empty"));
        }
        Ok(RepoId::Text(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for RepoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RepoIdVisitor)
    }
}

/// A repository as it was when the user pinned it. Attributes are never
/// refreshed by the store.
///
/// Only `id` is typed. Everything else (`name`, `description`, `language`,
/// `stargazers_count`, ...) is kept exactly as submitted, explicit `null`s
/// included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinnedRepository {
    pub id: RepoId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl PinnedRepository {
    pub fn new(id: RepoId) -> Self {
        PinnedRepository {
            id,
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// `None` when the name is absent, null or not a string.
    pub fn name(&self) -> Option<&str> {
        self.attribute("name").and_then(Value::as_str)
    }

    /// Validates the `repo` member of a pin request.
    pub fn from_json(value: Option<Value>) -> Result<Self, PinError> {
        let value = match value {
            Some(v @ Value::Object(_)) => v,
            _ => return Err(PinError::validation("Invalid repository data")),
        };

        match value.get("id") {
            None | Some(Value::Null) => {
                return Err(PinError::validation("Invalid repository data"));
            }
            Some(_) => {}
        }

        serde_json::from_value(value)
            .map_err(|e| PinError::validation_with("Invalid repository data", e))
    }
}

pub type PinList = Vec<PinnedRepository>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_ids_share_a_canonical_form() {
        let numeric: RepoId = serde_json::from_value(json!(7)).unwrap();
        let text: RepoId = serde_json::from_value(json!("007")).unwrap();
        assert_eq!(numeric, text);
        assert_eq!(RepoId::parse(" 7 ").unwrap(), numeric);
        assert_eq!(text.canonical(), "7");
    }

    #[test]
    fn composite_ids_compare_as_text() {
        let a = RepoId::parse("octocat/hello").unwrap();
        assert_eq!(a, RepoId::Text("octocat/hello".into()));
        assert_ne!(a, RepoId::Text("octocat/world".into()));
    }

    #[test]
    fn rejects_ids_that_are_not_integers_or_strings() {
        for bad in [json!(1.5), json!(true), json!(""), json!("   "), json!({}), json!([1])] {
            assert!(serde_json::from_value::<RepoId>(bad.clone()).is_err(), "{bad}");
        }
        assert!(RepoId::parse("").is_err());
    }

    #[test]
    fn id_keeps_its_json_type_on_the_way_out() {
        let repo = PinnedRepository::from_json(Some(json!({"id": 42}))).unwrap();
        assert_eq!(serde_json::to_value(&repo).unwrap(), json!({"id": 42}));

        let repo = PinnedRepository::from_json(Some(json!({"id": "a/b"}))).unwrap();
        assert_eq!(serde_json::to_value(&repo).unwrap(), json!({"id": "a/b"}));
    }

    #[test]
    fn unknown_fields_pass_through() {
        let input = json!({
            "id": 1,
            "name": "x",
            "full_name": "octocat/x",
            "stargazers_count": 3,
            "topics": ["rust"]
        });
        let repo = PinnedRepository::from_json(Some(input.clone())).unwrap();
        assert_eq!(repo.name(), Some("x"));
        assert_eq!(repo.attribute("full_name"), Some(&json!("octocat/x")));
        assert_eq!(serde_json::to_value(&repo).unwrap(), input);
    }

    #[test]
    fn null_attributes_are_kept() {
        let input = json!({
            "id": 1,
            "name": "x",
            "description": null,
            "language": null,
            "license": null
        });
        let repo = PinnedRepository::from_json(Some(input.clone())).unwrap();
        assert_eq!(repo.attribute("description"), Some(&Value::Null));
        assert_eq!(repo.name(), Some("x"));
        assert_eq!(serde_json::to_value(&repo).unwrap(), input);
    }

    #[test]
    fn attribute_types_are_not_checked() {
        let input = json!({"id": 1, "stargazers_count": "12", "topics": "rust", "name": 5});
        let repo = PinnedRepository::from_json(Some(input.clone())).unwrap();
        assert_eq!(repo.name(), None);
        assert_eq!(serde_json::to_value(&repo).unwrap(), input);
    }

    #[test]
    fn repo_without_id_is_a_validation_error() {
        for payload in [None, Some(json!({})), Some(json!({"id": null})), Some(json!([]))] {
            let err = PinnedRepository::from_json(payload).unwrap_err();
            assert!(matches!(err, PinError::Validation { .. }));
        }
    }

    #[test]
    fn repo_ids_must_be_an_array() {
        assert!(RepoId::list_from_json(None).is_err());
        assert!(RepoId::list_from_json(Some(json!("a"))).is_err());
        assert!(RepoId::list_from_json(Some(json!([1, null]))).is_err());

        let ids = RepoId::list_from_json(Some(json!([2, "b"]))).unwrap();
        assert_eq!(ids, vec![RepoId::Numeric(2), RepoId::Text("b".into())]);
    }
}
