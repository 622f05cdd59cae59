//! Domain records shared by the API layer and the caches.
//!
//! Only the fields the client relies on are typed. Recipe summaries keep
//! every other field the server sends so list-cache updates can merge them
//! without knowing the full schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Id the server uses for deleted or hidden users.
pub const DELETED_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Public author info shown next to recipes and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub display_name: String,
    /// Empty when the author has no avatar.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub avatar_url: String,
}

fn null_as_empty<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub nick_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<i32>,
}

/// A recipe as it appears in a list: an id plus whatever else was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RecipeSummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Overwrite the given fields, keeping the rest. An `id` key is ignored.
    pub fn merge(&mut self, updates: &Map<String, Value>) {
        for (key, value) in updates {
            if key != "id" {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Percent-encode `raw` for use as a single URL path segment.
///
/// Everything but ASCII alphanumerics and `*-._` is escaped, so `/`, `?`
/// and `#` cannot change the route.
pub(crate) fn path_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// The three per-user recipe lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Posts,
    Liked,
    Saved,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [ListKind::Posts, ListKind::Liked, ListKind::Saved];

    /// API path listing this kind of recipes for `handle`.
    pub fn endpoint(self, handle: &str) -> String {
        let handle = path_segment(handle);
        match self {
            ListKind::Posts => format!("/recipes/by/{handle}"),
            ListKind::Liked => format!("/recipes/liked/{handle}"),
            ListKind::Saved => format!("/recipes/saved/{handle}"),
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListKind::Posts => "posts",
            ListKind::Liked => "liked",
            ListKind::Saved => "saved",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn author_null_avatar_is_empty() {
        let author: Author =
            serde_json::from_value(json!({ "id": "u1", "display_name": "Ann", "avatar_url": null }))
                .unwrap();
        assert_eq!(author.avatar_url, "");
    }

    #[test]
    fn summary_keeps_unknown_fields() {
        let summary: RecipeSummary =
            serde_json::from_value(json!({ "id": "r1", "title": "Soup", "likes": 3 })).unwrap();
        assert_eq!(summary.id, "r1");
        assert_eq!(summary.fields["title"], json!("Soup"));
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({ "id": "r1", "title": "Soup", "likes": 3 })
        );
    }

    #[test]
    fn path_segment_escapes_route_characters() {
        assert_eq!(path_segment("ann"), "ann");
        assert_eq!(path_segment("a/b?c#d"), "a%2Fb%3Fc%23d");
        assert_eq!(path_segment("mary ann+1"), "mary%20ann%2B1");
    }

    #[test]
    fn list_endpoint_encodes_handle() {
        assert_eq!(ListKind::Saved.endpoint("../me"), "/recipes/saved/..%2Fme");
    }

    #[test]
    fn merge_is_shallow_and_keeps_id() {
        let mut summary = RecipeSummary::new("r1")
            .with_field("title", json!("Soup"))
            .with_field("likes", json!(1));
        let updates = json!({ "likes": 2, "id": "other" });
        summary.merge(updates.as_object().unwrap());
        assert_eq!(summary.id, "r1");
        assert_eq!(summary.fields["title"], json!("Soup"));
        assert_eq!(summary.fields["likes"], json!(2));
    }

    #[test]
    fn list_endpoints() {
        assert_eq!(ListKind::Posts.endpoint("ann"), "/recipes/by/ann");
        assert_eq!(ListKind::Liked.endpoint("ann"), "/recipes/liked/ann");
        assert_eq!(ListKind::Saved.endpoint("ann"), "/recipes/saved/ann");
        assert_eq!(ListKind::Saved.to_string(), "saved");
    }
}
