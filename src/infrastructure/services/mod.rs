//! Infrastructure services - cached access per entity type

mod asset_service;
mod event_service;
mod member_service;
mod training_service;

pub use asset_service::AssetService;
pub use event_service::{ALL_EVENTS, EventService};
pub use member_service::MemberService;
pub use training_service::TrainingService;
