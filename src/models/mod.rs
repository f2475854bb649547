//! Data models for the campaign tracker

pub mod campaign;
pub mod click;
pub mod conversion;
pub mod report;

// Re-export commonly used types
pub use campaign::{Campaign, ClickCounts, Conversion, UtmSource};
pub use click::{ClickEvent, NewClickEvent};
pub use conversion::{ConversionInsert, NewConversion};
pub use report::{CampaignerReport, ReportRow};
