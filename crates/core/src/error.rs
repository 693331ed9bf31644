use thiserror::Error;

/// Domain construction errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Patient id must not be empty")]
    EmptyPatientId,
}

/// Why a raw model response could not be turned into a decision
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("Model response was empty")]
    Empty,

    #[error("Model response is not valid JSON: {0}")]
    Malformed(String),

    #[error("Model response is not a JSON object")]
    NotAnObject,

    #[error("Model response is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Model response field `{0}` has the wrong type")]
    InvalidField(&'static str),
}

/// Outcome of a tool invocation that did not go through.
///
/// These are expected business results rather than system faults, so the
/// `Display` text is exactly what the patient gets to read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Patient {patient_id} already has an appointment at {time}.")]
    AlreadyBooked { patient_id: String, time: String },

    #[error("No records found for patient {patient_id}.")]
    NoRecord { patient_id: String },

    #[error("Please provide details of the emergency.")]
    MissingDetails,

    #[error("Please provide the time of the appointment.")]
    MissingTime,

    #[error("Invalid time format. Please use 'HH:MM' (24-hour clock).")]
    InvalidTime { value: String },
}
