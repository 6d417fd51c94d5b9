//! Catalog response models
//!
//! Only the fields this service reads are typed; everything else the catalog
//! returns is carried through verbatim in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use showfav_common::sanitize::sanitize_opt;

/// Poster image links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub medium: Option<String>,
    pub original: Option<String>,
}

/// Catalog show record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: u64,
    pub name: String,
    /// Summary as delivered by the catalog (may contain markup)
    #[serde(default)]
    pub summary: Option<String>,
    /// Markup-free summary for renderers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitized_summary: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Show {
    /// Fill `sanitized_summary` from `summary`
    pub fn sanitized(mut self) -> Self {
        self.sanitized_summary = Some(sanitize_opt(self.summary.as_deref()));
        self
    }
}

/// Catalog episode record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitized_summary: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Episode {
    pub fn sanitized(mut self) -> Self {
        self.sanitized_summary = Some(sanitize_opt(self.summary.as_deref()));
        self
    }
}

/// One cast credit: a person and the character they play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastCredit {
    pub person: Value,
    pub character: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub score: Option<f64>,
    pub show: Show,
}

impl SearchResult {
    pub fn sanitized(self) -> Self {
        Self {
            score: self.score,
            show: self.show.sanitized(),
        }
    }
}
