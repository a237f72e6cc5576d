use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
}

/// How the client should collect an answer for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum InputKind {
    Choice,
    FreeText,
}

impl QuestionType {
    /// Only choice-style questions carry an answer key and are graded automatically.
    pub(crate) fn is_auto_scored(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::TrueFalse)
    }

    pub(crate) fn input_kind(self) -> InputKind {
        if self.is_auto_scored() {
            InputKind::Choice
        } else {
            InputKind::FreeText
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "completionmode", rename_all = "snake_case")]
pub(crate) enum CompletionMode {
    Manual,
    AutoDeadline,
}

impl CompletionMode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AutoDeadline => "auto_deadline",
        }
    }
}
