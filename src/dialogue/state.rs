use std::fmt;

use crate::database::store::MarkEntry;
use crate::utils::validation::{parse_score, validate_student_name, validate_subject, validate_test_type};

/// Where a conversation stands. `Idle` means no session exists; `Done` and
/// `Cancelled` are reported once and then the conversation is idle again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStep {
    Idle,
    AwaitingName,
    AwaitingSubject,
    AwaitingTestType,
    AwaitingPractical,
    AwaitingTheoretical,
    Done,
    Cancelled,
}

impl DialogueStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueStep::Idle => "IDLE",
            DialogueStep::AwaitingName => "AWAITING_NAME",
            DialogueStep::AwaitingSubject => "AWAITING_SUBJECT",
            DialogueStep::AwaitingTestType => "AWAITING_TEST_TYPE",
            DialogueStep::AwaitingPractical => "AWAITING_PRACTICAL",
            DialogueStep::AwaitingTheoretical => "AWAITING_THEORETICAL",
            DialogueStep::Done => "DONE",
            DialogueStep::Cancelled => "CANCELLED",
        }
    }

    /// The question asked while waiting in this step.
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            DialogueStep::AwaitingName => Some("Enter the student's name:"),
            DialogueStep::AwaitingSubject => Some("Enter the subject:"),
            DialogueStep::AwaitingTestType => Some("Enter the test type (e.g. Midterm, Final):"),
            DialogueStep::AwaitingPractical => Some("Enter the practical marks:"),
            DialogueStep::AwaitingTheoretical => Some("Enter the theoretical marks:"),
            DialogueStep::Idle | DialogueStep::Done | DialogueStep::Cancelled => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.prompt().is_some()
    }
}

impl fmt::Display for DialogueStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scratch state of one in-progress data-entry session. Each variant holds
/// exactly the fields collected before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarksState {
    AwaitingName,
    AwaitingSubject {
        student_name: String,
    },
    AwaitingTestType {
        student_name: String,
        subject: String,
    },
    AwaitingPractical {
        student_name: String,
        subject: String,
        test_type: String,
    },
    AwaitingTheoretical {
        student_name: String,
        subject: String,
        test_type: String,
        practical_marks: i64,
    },
}

/// Outcome of feeding one message into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Next(MarksState),
    /// Input was invalid; the session stays where it was.
    Rejected { reason: String },
    Complete(MarkEntry),
}

impl MarksState {
    pub fn step(&self) -> DialogueStep {
        match self {
            MarksState::AwaitingName => DialogueStep::AwaitingName,
            MarksState::AwaitingSubject { .. } => DialogueStep::AwaitingSubject,
            MarksState::AwaitingTestType { .. } => DialogueStep::AwaitingTestType,
            MarksState::AwaitingPractical { .. } => DialogueStep::AwaitingPractical,
            MarksState::AwaitingTheoretical { .. } => DialogueStep::AwaitingTheoretical,
        }
    }

    /// Stores `input` under the current field and moves one step forward.
    /// Text fields are kept verbatim; scores must parse as integers.
    pub fn advance(self, input: &str) -> Transition {
        match self {
            MarksState::AwaitingName => match validate_student_name(input) {
                Ok(()) => Transition::Next(MarksState::AwaitingSubject {
                    student_name: input.to_string(),
                }),
                Err(e) => rejected(e),
            },
            MarksState::AwaitingSubject { student_name } => match validate_subject(input) {
                Ok(()) => Transition::Next(MarksState::AwaitingTestType {
                    student_name,
                    subject: input.to_string(),
                }),
                Err(e) => rejected(e),
            },
            MarksState::AwaitingTestType { student_name, subject } => match validate_test_type(input) {
                Ok(()) => Transition::Next(MarksState::AwaitingPractical {
                    student_name,
                    subject,
                    test_type: input.to_string(),
                }),
                Err(e) => rejected(e),
            },
            MarksState::AwaitingPractical { student_name, subject, test_type } => {
                match parse_score("Practical marks", input) {
                    Ok(practical_marks) => Transition::Next(MarksState::AwaitingTheoretical {
                        student_name,
                        subject,
                        test_type,
                        practical_marks,
                    }),
                    Err(e) => rejected(e),
                }
            }
            MarksState::AwaitingTheoretical { student_name, subject, test_type, practical_marks } => {
                match parse_score("Theoretical marks", input) {
                    Ok(theoretical_marks) => Transition::Complete(MarkEntry {
                        student_name,
                        subject,
                        test_type,
                        practical_marks,
                        theoretical_marks,
                    }),
                    Err(e) => rejected(e),
                }
            }
        }
    }
}

fn rejected(error: anyhow::Error) -> Transition {
    Transition::Rejected { reason: error.to_string() }
}
