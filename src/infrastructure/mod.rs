//! Infrastructure layer - caches, collaborator implementations and services

pub mod blob;
pub mod cache;
pub mod document;
pub mod logging;
pub mod services;
