//! Admission review: accept or reject pending students and enrollments,
//! open, update and close enrollments, and append enrollment notes.
//!
//! Inputs are validated into typed request bodies before anything is sent,
//! and every decision is followed by a refetch of the affected queue.

pub mod controller;
pub mod requests;

#[cfg(test)]
mod tests;

pub use controller::{AdmissionDesk, ConfirmationGate, ReviewOutcome};
pub use requests::{
    CloseEnrollmentRequest, EnrollmentNote, EnrollmentUpdate, NewEnrollment, ProgressStatus,
    ReasonPolicy, RejectionReason, StatusChange,
};
