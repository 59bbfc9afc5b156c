use serde::{Deserialize, Serialize};

/// A single dish on the menu.
///
/// `price` is kept exactly as the remote source sent it; it is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CatalogItem {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: impl Into<String>,
        image: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price: price.into(),
            image,
        }
    }

    /// Image reference, if the dish has one
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Price as shown to users, e.g. "$12.99"
    pub fn display_price(&self) -> String {
        if self.price.is_empty() {
            String::new()
        } else {
            format!("${}", self.price)
        }
    }
}

/// A `CatalogItem` committed to the local store.
///
/// The id is assigned by the store on insert and is not stable across
/// replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: u64,
    #[serde(flatten)]
    pub item: CatalogItem,
}

impl StoredItem {
    pub fn name(&self) -> &str {
        &self.item.name
    }
}

impl std::ops::Deref for StoredItem {
    type Target = CatalogItem;

    fn deref(&self) -> &CatalogItem {
        &self.item
    }
}

// Remote wire format: { "menu": [ { "title", "image", "price", "description" } ] }
#[derive(Debug, Clone, Deserialize)]
pub struct MenuList {
    pub menu: Vec<MenuEntry>,
}

impl MenuList {
    pub fn into_items(self) -> Vec<CatalogItem> {
        self.menu.into_iter().map(CatalogItem::from).collect()
    }
}

/// One validated record of the remote menu.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawMenuEntry")]
pub struct MenuEntry {
    pub title: String,
    pub image: String,
    pub price: String,
    pub description: String,
}

#[derive(Deserialize)]
struct RawMenuEntry {
    title: String,
    image: String,
    price: String,
    description: String,
}

impl TryFrom<RawMenuEntry> for MenuEntry {
    type Error = String;

    fn try_from(raw: RawMenuEntry) -> Result<Self, Self::Error> {
        if raw.title.trim().is_empty() {
            return Err("menu entry has an empty title".to_string());
        }
        Ok(Self {
            title: raw.title,
            image: raw.image,
            price: raw.price,
            description: raw.description,
        })
    }
}

impl From<MenuEntry> for CatalogItem {
    fn from(entry: MenuEntry) -> Self {
        let image = if entry.image.trim().is_empty() {
            None
        } else {
            Some(entry.image)
        };
        CatalogItem {
            name: entry.title,
            description: entry.description,
            price: entry.price,
            image,
        }
    }
}
