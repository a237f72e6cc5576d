use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{ExamResult, ExamSession, GradedAnswerRow, Question, SessionHistoryRow};
use crate::db::types::{CompletionMode, InputKind, QuestionType};
use crate::services::exam_sessions::{ResultView, SessionView, SubmissionOutcome};

#[derive(Debug, Deserialize)]
pub(crate) struct AnswersRequest {
    #[serde(default)]
    pub(crate) answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) started_at: Option<String>,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<String>,
    pub(crate) completion_mode: Option<CompletionMode>,
    pub(crate) score: i32,
    pub(crate) created_at: String,
}

impl SessionResponse {
    pub(crate) fn from_db(session: ExamSession) -> Self {
        Self {
            id: session.id,
            student_id: session.student_id,
            course_id: session.course_id,
            started_at: session.started_at.map(format_primitive),
            is_completed: session.is_completed,
            completed_at: session.completed_at.map(format_primitive),
            completion_mode: session.completion_mode,
            score: session.score,
            created_at: format_primitive(session.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartSessionResponse {
    pub(crate) session: SessionResponse,
    pub(crate) resumed: bool,
}

/// Student-facing question: no answer key.
#[derive(Debug, Serialize)]
pub(crate) struct ExamQuestion {
    pub(crate) id: String,
    pub(crate) order_index: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) input_kind: InputKind,
    pub(crate) prompt: String,
    pub(crate) choices: Vec<String>,
    pub(crate) marks: i32,
}

impl ExamQuestion {
    fn from_db(question: Question) -> Self {
        Self {
            input_kind: question.question_type.input_kind(),
            id: question.id,
            order_index: question.order_index,
            question_type: question.question_type,
            prompt: question.prompt,
            choices: question.choices.0,
            marks: question.marks,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionDetailResponse {
    pub(crate) session: SessionResponse,
    pub(crate) course_title: String,
    pub(crate) time_limit_minutes: i32,
    pub(crate) deadline: String,
    pub(crate) remaining_seconds: i64,
    pub(crate) questions: Vec<ExamQuestion>,
    pub(crate) answers: HashMap<String, String>,
}

impl SessionDetailResponse {
    pub(crate) fn from_view(view: SessionView) -> Self {
        Self {
            session: SessionResponse::from_db(view.session),
            course_title: view.course.title,
            time_limit_minutes: view.course.time_limit_minutes,
            deadline: format_primitive(view.deadline),
            remaining_seconds: view.remaining_seconds,
            questions: view.questions.into_iter().map(ExamQuestion::from_db).collect(),
            answers: view.answers,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DraftSaveResponse {
    pub(crate) saved: usize,
    pub(crate) remaining_seconds: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultSummary {
    pub(crate) session_id: String,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) percentage: f64,
    pub(crate) achieved_at: String,
}

impl ResultSummary {
    pub(crate) fn from_db(result: ExamResult) -> Self {
        Self {
            session_id: result.session_id,
            score: result.score,
            total_marks: result.total_marks,
            percentage: result.percentage,
            achieved_at: format_primitive(result.achieved_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) session: SessionResponse,
    pub(crate) result: ResultSummary,
    pub(crate) completion_mode: CompletionMode,
    /// Entries of the request that were not stored; earlier drafts for them still count.
    pub(crate) dropped_question_ids: Vec<String>,
}

impl SubmitResponse {
    pub(crate) fn from_outcome(outcome: SubmissionOutcome) -> Self {
        Self {
            session: SessionResponse::from_db(outcome.session),
            result: ResultSummary::from_db(outcome.result),
            completion_mode: outcome.mode,
            dropped_question_ids: outcome.dropped,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerReview {
    pub(crate) question_id: String,
    pub(crate) order_index: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) prompt: String,
    pub(crate) chosen_answer: String,
    pub(crate) correct_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) marks: i32,
}

impl AnswerReview {
    fn from_db(row: GradedAnswerRow) -> Self {
        Self {
            question_id: row.question_id,
            order_index: row.order_index,
            question_type: row.question_type,
            prompt: row.prompt,
            chosen_answer: row.chosen_answer,
            correct_answer: row.correct_answer,
            is_correct: row.is_correct,
            marks: row.marks,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultDetailResponse {
    pub(crate) session: SessionResponse,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) result: ResultSummary,
    pub(crate) answers: Vec<AnswerReview>,
}

impl ResultDetailResponse {
    pub(crate) fn from_view(view: ResultView) -> Self {
        Self {
            session: SessionResponse::from_db(view.session),
            course_id: view.course.id,
            course_title: view.course.title,
            result: ResultSummary::from_db(view.result),
            answers: view.answers.into_iter().map(AnswerReview::from_db).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryItem {
    pub(crate) session_id: String,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) started_at: Option<String>,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<String>,
    pub(crate) completion_mode: Option<CompletionMode>,
    pub(crate) score: i32,
    pub(crate) total_marks: Option<i32>,
    pub(crate) percentage: Option<f64>,
    pub(crate) created_at: String,
}

impl HistoryItem {
    pub(crate) fn from_db(row: SessionHistoryRow) -> Self {
        Self {
            session_id: row.session_id,
            course_id: row.course_id,
            course_title: row.course_title,
            started_at: row.started_at.map(format_primitive),
            is_completed: row.is_completed,
            completed_at: row.completed_at.map(format_primitive),
            completion_mode: row.completion_mode,
            score: row.score,
            total_marks: row.total_marks,
            percentage: row.percentage,
            created_at: format_primitive(row.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}
