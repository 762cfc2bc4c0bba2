//! Event domain - scheduled events and their participants

mod entity;
mod participant;

pub use entity::{
    CreateScheduledEvent, EVENTS_COLLECTION, EventField, NewScheduledEvent, ScheduledEvent,
    ScheduledEventPatch,
};
pub use participant::{
    EVENT_MEMBERS_COLLECTION, EventParticipant, EventParticipantPatch, NewEventParticipant,
    ParticipantField,
};
