pub mod pr;

pub use pr::{
    PrBubble, PrBubbleCreate, PrBubbleUpdate, PrListResponse, PrStats, PrStatus, TagType,
    UploadResponse,
};
