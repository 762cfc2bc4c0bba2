//! Training domain - trainings, opportunities and their applicants

mod applicant;
mod entity;

pub use applicant::{
    Applicant, ApplicantField, ApplicantPatch, ApplicantStatus, NewApplicant, SubmittedFile,
    TRAINING_MEMBERS_COLLECTION,
};
pub use entity::{
    CreateTraining, FileRequirement, NewTraining, TRAININGS_COLLECTION, Training, TrainingField,
    TrainingPatch, TrainingTag, default_file_requirements,
};
