/// Domain models for the image search API
use crate::utils::{created_format, format_created, page_from_href};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level body of a search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub collection: Collection,
}

/// One page of search results.
///
/// `href` is the canonical request URL and doubles as the page identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub href: String,
    pub items: Vec<Item>,
    #[serde(default)]
    pub links: Vec<CollectionLink>,
    pub metadata: Metadata,
    pub version: String,
    /// Page number of the request that produced this collection, when known
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl Collection {
    /// Empty collection for the given href
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            items: Vec::new(),
            links: Vec::new(),
            metadata: Metadata { total_hits: 0 },
            version: String::new(),
            page: None,
        }
    }

    /// Attach the page number of the issuing request
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Page number from the issuing request, falling back to the `page`
    /// parameter of `href`
    pub fn page_number(&self) -> Option<u32> {
        self.page.or_else(|| page_from_href(&self.href))
    }

    /// Ordering key; unknown page numbers sort first
    pub fn sort_key(&self) -> u32 {
        self.page_number().unwrap_or(0)
    }

    /// Server-supplied link to the following page
    pub fn next_link(&self) -> Option<&CollectionLink> {
        self.links.iter().find(|l| l.rel == "next")
    }

    /// Server-supplied link to the preceding page
    pub fn prev_link(&self) -> Option<&CollectionLink> {
        self.links.iter().find(|l| l.rel == "prev")
    }
}

/// Collection navigation link
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionLink {
    pub href: String,
    pub prompt: String,
    pub rel: String,
}

impl CollectionLink {
    pub fn page_number(&self) -> Option<u32> {
        page_from_href(&self.href)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metadata {
    pub total_hits: u64,
}

/// One media result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub data: Vec<ItemData>,
    /// Asset manifest URL
    pub href: String,
    #[serde(default)]
    pub links: Vec<ItemLink>,
}

impl Item {
    /// Descriptive record; the API returns exactly one per item in practice
    pub fn primary(&self) -> Option<&ItemData> {
        self.data.first()
    }

    pub fn nasa_id(&self) -> Option<&str> {
        self.primary().map(|d| d.nasa_id.as_str())
    }

    /// First link marked as a preview rendition
    pub fn preview_link(&self) -> Option<&ItemLink> {
        self.links.iter().find(|l| l.rel == "preview")
    }
}

/// Descriptive metadata for an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub center: String,
    #[serde(with = "created_format")]
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub media_type: String,
    pub nasa_id: String,
    pub title: String,
}

/// Related resource of an item, such as its preview thumbnail
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemLink {
    pub href: String,
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<String>,
}

/// Flat view of one item for a detail screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDetail {
    pub nasa_id: String,
    pub title: String,
    pub description: String,
    pub center: String,
    pub keywords: Vec<String>,
    pub media_type: String,
    pub created_at: String,
    pub preview: Option<ItemLink>,
}

impl ImageDetail {
    /// Returns `None` for items without a data record
    pub fn from_item(item: &Item) -> Option<Self> {
        let data = item.primary()?;
        Some(Self {
            nasa_id: data.nasa_id.clone(),
            title: data.title.clone(),
            description: data.description.clone(),
            center: data.center.clone(),
            keywords: data.keywords.clone(),
            media_type: data.media_type.clone(),
            created_at: format_created(&data.date_created),
            preview: item.preview_link().cloned(),
        })
    }
}

/// Snapshot of the aggregator read surface
#[derive(Debug, Clone, Serialize)]
pub struct SearchState {
    pub current_query: Option<String>,
    pub last_page: u32,
    pub page_count: usize,
    pub total_hits: Option<u64>,
    pub next_page: Option<u32>,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}
