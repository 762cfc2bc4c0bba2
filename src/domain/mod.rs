//! Domain layer - cache semantics, collaborator contracts and entities

pub mod blob;
pub mod cache;
pub mod document;
pub mod error;
pub mod event;
pub mod member;
pub mod training;

pub use blob::{BlobStore, BlobUpload, StoredBlob};
pub use cache::{
    CacheError, CachePolicy, CacheRead, RemoteSource, SortDirection, SortOrder, SortValue,
    Sortable, StaleFallback,
};
pub use document::{Document, DocumentStore, Entity, Query};
pub use error::DomainError;
pub use event::{EventParticipant, ScheduledEvent};
pub use member::{Member, MemberType};
pub use training::{Applicant, ApplicantStatus, Training, TrainingTag};
