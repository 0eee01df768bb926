// Serde types for Reddit listing responses.
//
// Every Reddit collection is a `Listing` whose children are "things" tagged
// by kind: `t3` for submissions (links), `t1` for comments, `more` for the
// collapsed "load more comments" stubs. Children are kept as raw JSON and
// decoded by kind so an unexpected kind never fails the whole page.

use serde::Deserialize;

/// A `{"kind": "Listing", "data": {...}}` envelope.
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    /// Fullname of the last item, used as the `after` cursor for the next page.
    pub after: Option<String>,
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// A single child of a listing, not yet decoded.
#[derive(Debug, Deserialize)]
pub struct Thing {
    pub kind: String,
    pub data: serde_json::Value,
}

/// A decoded listing child.
#[derive(Debug)]
pub enum Child {
    Link(LinkData),
    Comment(CommentData),
    /// "Load more comments" placeholder
    More,
    Other(String),
}

impl Thing {
    /// Decode by kind. Malformed data for a known kind is an error; an
    /// unknown kind is returned as `Child::Other`.
    pub fn decode(&self) -> serde_json::Result<Child> {
        Ok(match self.kind.as_str() {
            "t3" => Child::Link(LinkData::deserialize(&self.data)?),
            "t1" => Child::Comment(CommentData::deserialize(&self.data)?),
            "more" => Child::More,
            other => Child::Other(other.to_string()),
        })
    }
}

/// Submission fields (`t3`). Only what a question needs is decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
}

/// Comment fields (`t1`).
#[derive(Debug, Clone, Deserialize)]
pub struct CommentData {
    #[serde(default)]
    pub body: String,
}
