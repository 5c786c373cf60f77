use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a PR bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrStatus {
    Draft,
    Active,
    Inactive,
}

impl PrStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PrStatus::Draft => "draft",
            PrStatus::Active => "active",
            PrStatus::Inactive => "inactive",
        }
    }
}

/// Which badge the bubble card shows next to the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Predefined,
    Custom,
}

/// A PR bubble as the upstream API returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrBubble {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub link_url: String,
    pub tag_type: TagType,
    pub tag_text: String,
    pub tag_color: String, // hex string, e.g. "#ff6b00"
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub priority: Option<i32>,
    pub status: PrStatus,
    pub utm_campaign: Option<String>,
    pub view_count: u64,
    pub click_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a bubble. The admin form sends explicit `null`
/// for cleared optional fields, so `None` serializes as `null` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrBubbleCreate {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub link_url: String,
    pub tag_type: TagType,
    pub tag_text: String,
    pub tag_color: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: Option<i32>,
    /// Only `draft` or `active` make sense at creation time; the upstream
    /// rejects attempts to create an already-retired bubble.
    pub status: PrStatus,
    #[serde(default)]
    pub utm_campaign: Option<String>,
}

/// Partial update. Omitted fields keep their stored value.
///
/// For the nullable columns (`priority`, `utm_campaign`) the wire format
/// distinguishes "leave alone" (field absent) from "clear" (field `null`),
/// which maps to the nested `Option<Option<T>>` here: `None` is absent,
/// `Some(None)` is an explicit `null`, `Some(Some(v))` sets a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrBubbleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<TagType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PrStatus>,
    #[serde(
        default,
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub utm_campaign: Option<Option<String>>,
}

/// One page of bubbles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrListResponse {
    pub items: Vec<PrBubble>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Engagement counters for a single bubble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrStats {
    pub id: String,
    pub title: String,
    pub view_count: u64,
    pub click_count: u64,
    pub ctr: f64, // click-through rate in percent
    pub created_at: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PrStatus,
}

/// Response of a successful image upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Serde helper for `Option<Option<T>>` fields.
///
/// Plain serde collapses an explicit `null` into the outer `None`, losing
/// the absent-vs-null distinction. Routing through this module keeps it:
/// the deserializer only runs when the field is present, so its result is
/// always wrapped in `Some`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
