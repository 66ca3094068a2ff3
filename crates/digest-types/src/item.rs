//! Item data types.
//!
//! Items arrive from upstream collectors (RSS, podcast, video, web
//! scraping) and leave as enrichment records for the digest renderer.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of the stable item id (hex chars of the SHA-256 digest).
///
/// Persisted index records are keyed by this id; changing the length or
/// the hash input format breaks interop with existing stores.
pub const ITEM_ID_LEN: usize = 24;

/// Generate a stable ID for an item based on its title and link.
pub fn make_item_id(title: &str, link: &str) -> String {
    let raw = format!("{}|{}", title, link);
    let digest = Sha256::digest(raw.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(ITEM_ID_LEN);
    hex
}

/// Content type of an item, mapped to a dedicated index collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// News article from an RSS feed
    News,
    /// Podcast episode (scored on transcript/description)
    Podcast,
    /// Video (scored on title/description/transcript)
    Video,
    /// Article from a scraped web listing
    Web,
}

impl ItemKind {
    /// Name of the index collection holding this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            ItemKind::News => "news_items",
            ItemKind::Podcast => "podcasts",
            ItemKind::Video => "videos",
            ItemKind::Web => "web_pages",
        }
    }

    /// All item kinds (collection fan-out order).
    pub fn all() -> &'static [ItemKind] {
        &[ItemKind::News, ItemKind::Podcast, ItemKind::Video, ItemKind::Web]
    }

    /// Parse from a collection or kind name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "news" | "news_items" => Some(ItemKind::News),
            "podcast" | "podcasts" => Some(ItemKind::Podcast),
            "video" | "videos" => Some(ItemKind::Video),
            "web" | "web_pages" => Some(ItemKind::Web),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::News => write!(f, "news"),
            ItemKind::Podcast => write!(f, "podcast"),
            ItemKind::Video => write!(f, "video"),
            ItemKind::Web => write!(f, "web"),
        }
    }
}

/// A short text item to score, deduplicate, and cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Stable id derived from title + link
    pub id: String,
    /// Headline or episode/video title
    pub title: String,
    /// Body text: summary, description, or transcript excerpt
    pub text: String,
    /// Content type (selects the index collection)
    pub kind: ItemKind,
    /// Canonical link, when known
    #[serde(default)]
    pub link: Option<String>,
    /// Source name (feed, channel, site)
    #[serde(default)]
    pub source: Option<String>,
}

impl Item {
    /// Create an item, deriving the stable id from title and link.
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        kind: ItemKind,
        link: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let link = link.into();
        let id = make_item_id(&title, &link);
        Self {
            id,
            title,
            text: text.into(),
            kind,
            link: Some(link),
            source: None,
        }
    }

    /// Set the source name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Combined title + body text used for embedding.
    pub fn embedding_text(&self) -> String {
        if self.text.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.text)
        }
    }
}

/// Metadata persisted alongside an item's vector in the index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemMetadata {
    /// Item title
    #[serde(default)]
    pub title: String,
    /// Canonical link
    #[serde(default)]
    pub link: Option<String>,
    /// Source name
    #[serde(default)]
    pub source: Option<String>,
    /// Integer ranking score at storage time
    #[serde(default)]
    pub score: i32,
}

impl ItemMetadata {
    /// Build metadata from an item and its integer score.
    pub fn from_item(item: &Item, score: i32) -> Self {
        Self {
            title: item.title.clone(),
            link: item.link.clone(),
            source: item.source.clone(),
            score,
        }
    }
}

/// Per-item output of a digest batch run.
///
/// `score` is always usable (semantic or keyword-derived); the cluster
/// fields are `None` when the batch degraded to a flat view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEnrichment {
    /// Stable item id
    pub item_id: String,
    /// Integer ranking score (legacy-compatible scale)
    pub score: i32,
    /// Raw semantic score in [0, 1], None when keyword fallback was used
    pub semantic_score: Option<f32>,
    /// Id of the stored embedding record, None if embedding failed
    pub embedding_id: Option<String>,
    /// Assigned cluster id for this batch
    pub cluster_id: Option<String>,
    /// Cluster label (filled by an external generator)
    pub cluster_label: Option<String>,
    /// Centroid-similarity confidence in [0, 1]
    pub cluster_confidence: Option<f32>,
}

impl ItemEnrichment {
    /// Create an unclustered enrichment record.
    pub fn new(item_id: impl Into<String>, score: i32, semantic_score: Option<f32>) -> Self {
        Self {
            item_id: item_id.into(),
            score,
            semantic_score,
            embedding_id: None,
            cluster_id: None,
            cluster_label: None,
            cluster_confidence: None,
        }
    }
}
