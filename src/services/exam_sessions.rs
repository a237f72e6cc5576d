use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::metrics as exam_metrics;
use crate::core::time::primitive_now_utc;
use crate::db::models::{
    Course, CourseResultRow, ExamResult, ExamSession, GradedAnswerRow, Question,
    SessionHistoryRow,
};
use crate::db::types::CompletionMode;
use crate::repositories;
use crate::services::access::{self, Principal};
use crate::services::exam_timing;
use crate::services::scoring;
use crate::services::ExamError;

#[derive(Debug)]
pub(crate) struct StartOutcome {
    pub(crate) session: ExamSession,
    pub(crate) resumed: bool,
}

/// Everything a client needs to render an open attempt.
#[derive(Debug)]
pub(crate) struct SessionView {
    pub(crate) session: ExamSession,
    pub(crate) course: Course,
    pub(crate) questions: Vec<Question>,
    pub(crate) answers: HashMap<String, String>,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) remaining_seconds: i64,
}

#[derive(Debug)]
pub(crate) struct SubmissionOutcome {
    pub(crate) session: ExamSession,
    pub(crate) result: ExamResult,
    pub(crate) mode: CompletionMode,
    pub(crate) dropped: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct DraftOutcome {
    pub(crate) saved: usize,
    pub(crate) remaining_seconds: i64,
}

#[derive(Debug)]
pub(crate) struct ResultView {
    pub(crate) session: ExamSession,
    pub(crate) course: Course,
    pub(crate) result: ExamResult,
    pub(crate) answers: Vec<GradedAnswerRow>,
}

/// Answers that will be written for a submission, in question order.
#[derive(Debug, PartialEq)]
pub(crate) struct SubmissionPlan {
    pub(crate) mode: CompletionMode,
    pub(crate) answers: Vec<(String, String)>,
    pub(crate) dropped: Vec<String>,
}

pub(crate) async fn start_session(
    pool: &PgPool,
    principal: &Principal,
    course_id: &str,
) -> Result<StartOutcome, ExamError> {
    access::require_student(principal)?;

    let mut tx = pool.begin().await?;

    let course = repositories::courses::find_by_id(&mut *tx, course_id)
        .await?
        .ok_or(ExamError::CourseNotFound)?;

    if repositories::questions::count_by_course(&mut *tx, &course.id).await? == 0 {
        return Err(ExamError::NoQuestions);
    }

    repositories::sessions::acquire_student_course_lock(&mut *tx, &principal.id, &course.id)
        .await?;

    if let Some(existing) =
        repositories::sessions::find_open(&mut *tx, &principal.id, &course.id).await?
    {
        tx.commit().await?;
        metrics::counter!(exam_metrics::SESSIONS_RESUMED).increment(1);
        tracing::info!(
            session_id = %existing.id,
            course_id = %course.id,
            student_id = %principal.id,
            "Resuming open exam session"
        );
        return Ok(StartOutcome { session: existing, resumed: true });
    }

    let now = primitive_now_utc();
    let session_id = Uuid::new_v4().to_string();
    let inserted = repositories::sessions::create(
        &mut *tx,
        repositories::sessions::CreateSession {
            id: &session_id,
            student_id: &principal.id,
            course_id: &course.id,
            started_at: now,
            created_at: now,
        },
    )
    .await?;

    let session = if inserted {
        repositories::sessions::find_by_id(&mut *tx, &session_id)
            .await?
            .ok_or(ExamError::SessionNotFound)?
    } else {
        repositories::sessions::find_open(&mut *tx, &principal.id, &course.id)
            .await?
            .ok_or(ExamError::SessionConflict)?
    };

    tx.commit().await?;

    if inserted {
        metrics::counter!(exam_metrics::SESSIONS_STARTED).increment(1);
        tracing::info!(
            session_id = %session.id,
            course_id = %course.id,
            student_id = %principal.id,
            time_limit_minutes = course.time_limit_minutes,
            "Exam session started"
        );
    }

    Ok(StartOutcome { session, resumed: !inserted })
}

pub(crate) async fn resume_session(
    pool: &PgPool,
    principal: &Principal,
    session_id: &str,
) -> Result<SessionView, ExamError> {
    let mut session = repositories::sessions::find_by_id(pool, session_id)
        .await?
        .ok_or(ExamError::SessionNotFound)?;
    ensure_open_for(principal, &session)?;

    let course = repositories::courses::find_by_id(pool, &session.course_id)
        .await?
        .ok_or(ExamError::CourseNotFound)?;

    let now = primitive_now_utc();
    let started_at = match session.started_at {
        Some(started_at) => started_at,
        None => {
            let started_at = repositories::sessions::mark_started(pool, &session.id, now).await?;
            tracing::info!(session_id = %session.id, "Exam session start time recorded");
            started_at
        }
    };
    session.started_at = Some(started_at);

    let questions = repositories::questions::list_by_course(pool, &course.id).await?;
    let answers = repositories::answers::list_by_session(pool, &session.id)
        .await?
        .into_iter()
        .map(|answer| (answer.question_id, answer.chosen_answer))
        .collect();

    Ok(SessionView {
        deadline: exam_timing::deadline(started_at, course.time_limit_minutes),
        remaining_seconds: exam_timing::remaining_seconds(
            started_at,
            course.time_limit_minutes,
            now,
        ),
        session,
        course,
        questions,
        answers,
    })
}

/// Completes the session. Past the deadline the submission is accepted with whatever
/// was sent; before it, every question needs a non-blank answer.
pub(crate) async fn submit_answers(
    pool: &PgPool,
    principal: &Principal,
    session_id: &str,
    submitted: HashMap<String, String>,
    max_answer_chars: usize,
) -> Result<SubmissionOutcome, ExamError> {
    let mut tx = pool.begin().await?;

    let session = repositories::sessions::find_by_id_for_update(&mut *tx, session_id)
        .await?
        .ok_or(ExamError::SessionNotFound)?;
    ensure_open_for(principal, &session)?;

    let course = repositories::courses::find_by_id(&mut *tx, &session.course_id)
        .await?
        .ok_or(ExamError::CourseNotFound)?;

    let now = primitive_now_utc();
    let started_at = match session.started_at {
        Some(started_at) => started_at,
        None => repositories::sessions::mark_started(&mut *tx, &session.id, now).await?,
    };
    let past_deadline =
        exam_timing::is_past_deadline(started_at, course.time_limit_minutes, now);

    let question_ids: Vec<String> =
        repositories::questions::list_by_course(&mut *tx, &course.id)
            .await?
            .into_iter()
            .map(|question| question.id)
            .collect();

    let plan = plan_submission(&question_ids, submitted, past_deadline, max_answer_chars)?;

    for (question_id, text) in &plan.answers {
        repositories::answers::upsert(&mut *tx, &session.id, question_id, text, now).await?;
    }

    let result = scoring::compute_score(&mut *tx, &session, now).await?;
    let session =
        repositories::sessions::complete(&mut *tx, &session.id, plan.mode, result.score, now)
            .await?;

    tx.commit().await?;

    metrics::counter!(exam_metrics::SUBMISSIONS, "mode" => plan.mode.as_str()).increment(1);
    tracing::info!(
        session_id = %session.id,
        course_id = %session.course_id,
        student_id = %session.student_id,
        mode = plan.mode.as_str(),
        answers = plan.answers.len(),
        dropped = plan.dropped.len(),
        score = result.score,
        total_marks = result.total_marks,
        "Exam session completed"
    );

    Ok(SubmissionOutcome { session, result, mode: plan.mode, dropped: plan.dropped })
}

/// Stores work in progress without completing the session.
pub(crate) async fn save_answers(
    pool: &PgPool,
    principal: &Principal,
    session_id: &str,
    submitted: HashMap<String, String>,
    max_answer_chars: usize,
) -> Result<DraftOutcome, ExamError> {
    let mut tx = pool.begin().await?;

    let session = repositories::sessions::find_by_id_for_update(&mut *tx, session_id)
        .await?
        .ok_or(ExamError::SessionNotFound)?;
    ensure_open_for(principal, &session)?;

    let course = repositories::courses::find_by_id(&mut *tx, &session.course_id)
        .await?
        .ok_or(ExamError::CourseNotFound)?;

    let now = primitive_now_utc();
    let started_at = match session.started_at {
        Some(started_at) => started_at,
        None => repositories::sessions::mark_started(&mut *tx, &session.id, now).await?,
    };
    if exam_timing::is_past_deadline(started_at, course.time_limit_minutes, now) {
        return Err(ExamError::DeadlinePassed);
    }

    let question_ids: Vec<String> =
        repositories::questions::list_by_course(&mut *tx, &course.id)
            .await?
            .into_iter()
            .map(|question| question.id)
            .collect();

    let answers = plan_draft(&question_ids, submitted, max_answer_chars)?;
    for (question_id, text) in &answers {
        repositories::answers::upsert(&mut *tx, &session.id, question_id, text, now).await?;
    }

    tx.commit().await?;

    tracing::debug!(session_id = %session.id, saved = answers.len(), "Draft answers saved");

    Ok(DraftOutcome {
        saved: answers.len(),
        remaining_seconds: exam_timing::remaining_seconds(
            started_at,
            course.time_limit_minutes,
            now,
        ),
    })
}

pub(crate) async fn session_result(
    pool: &PgPool,
    principal: &Principal,
    session_id: &str,
) -> Result<ResultView, ExamError> {
    let session = repositories::sessions::find_by_id(pool, session_id)
        .await?
        .ok_or(ExamError::SessionNotFound)?;
    let course = repositories::courses::find_by_id(pool, &session.course_id)
        .await?
        .ok_or(ExamError::CourseNotFound)?;

    if !access::can_view_session(principal, &session, &course) {
        return Err(ExamError::NotOwner);
    }
    if !session.is_completed {
        return Err(ExamError::NotCompleted);
    }

    let result = repositories::results::find_by_session(pool, &session.id)
        .await?
        .ok_or(ExamError::NotCompleted)?;
    let answers = repositories::answers::list_with_questions(pool, &session.id).await?;

    Ok(ResultView { session, course, result, answers })
}

pub(crate) async fn history(
    pool: &PgPool,
    principal: &Principal,
    skip: i64,
    limit: i64,
) -> Result<(Vec<SessionHistoryRow>, i64), ExamError> {
    let items = repositories::sessions::list_history(pool, &principal.id, skip, limit).await?;
    let total = repositories::sessions::count_by_student(pool, &principal.id).await?;
    Ok((items, total))
}

pub(crate) async fn course_results(
    pool: &PgPool,
    principal: &Principal,
    course_id: &str,
) -> Result<(Course, Vec<CourseResultRow>), ExamError> {
    let course = repositories::courses::find_by_id(pool, course_id)
        .await?
        .ok_or(ExamError::CourseNotFound)?;
    access::require_course_owner(principal, &course)?;

    let rows = repositories::results::list_by_course(pool, &course.id).await?;
    Ok((course, rows))
}

fn ensure_open_for(principal: &Principal, session: &ExamSession) -> Result<(), ExamError> {
    if session.student_id != principal.id {
        return Err(ExamError::NotOwner);
    }
    if session.is_completed {
        return Err(ExamError::AlreadyCompleted);
    }
    Ok(())
}

/// Decides which answers a submit persists. `question_ids` is the course's question
/// set in presentation order.
///
/// On auto-submit `dropped` lists the entries of this request that were not written
/// (blank text or unknown ids). A draft already stored for a dropped question is
/// left untouched and is still scored.
pub(crate) fn plan_submission(
    question_ids: &[String],
    mut submitted: HashMap<String, String>,
    past_deadline: bool,
    max_answer_chars: usize,
) -> Result<SubmissionPlan, ExamError> {
    if past_deadline {
        let mut answers = Vec::new();
        let mut dropped = Vec::new();

        for question_id in question_ids {
            match submitted.remove(question_id) {
                Some(text) if !text.trim().is_empty() => {
                    answers.push((question_id.clone(), truncate_chars(text, max_answer_chars)));
                }
                Some(_) => dropped.push(question_id.clone()),
                None => {}
            }
        }

        let mut unknown: Vec<String> = submitted.into_keys().collect();
        unknown.sort();
        dropped.extend(unknown);

        return Ok(SubmissionPlan { mode: CompletionMode::AutoDeadline, answers, dropped });
    }

    reject_unknown(question_ids, &submitted)?;

    let missing: Vec<String> = question_ids
        .iter()
        .filter(|id| submitted.get(*id).map_or(true, |text| text.trim().is_empty()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ExamError::IncompleteSubmission { missing });
    }

    let mut answers = Vec::with_capacity(question_ids.len());
    for question_id in question_ids {
        if let Some(text) = submitted.remove(question_id) {
            ensure_length(question_id, &text, max_answer_chars)?;
            answers.push((question_id.clone(), text));
        }
    }

    Ok(SubmissionPlan { mode: CompletionMode::Manual, answers, dropped: Vec::new() })
}

/// Draft saves accept any subset; blank entries are skipped.
pub(crate) fn plan_draft(
    question_ids: &[String],
    mut submitted: HashMap<String, String>,
    max_answer_chars: usize,
) -> Result<Vec<(String, String)>, ExamError> {
    reject_unknown(question_ids, &submitted)?;

    let mut answers = Vec::new();
    for question_id in question_ids {
        let Some(text) = submitted.remove(question_id) else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        ensure_length(question_id, &text, max_answer_chars)?;
        answers.push((question_id.clone(), text));
    }

    Ok(answers)
}

fn reject_unknown(
    question_ids: &[String],
    submitted: &HashMap<String, String>,
) -> Result<(), ExamError> {
    let known: HashSet<&str> = question_ids.iter().map(String::as_str).collect();
    let mut unknown: Vec<&String> =
        submitted.keys().filter(|id| !known.contains(id.as_str())).collect();
    unknown.sort();

    match unknown.first() {
        Some(id) => Err(ExamError::UnknownQuestion((*id).clone())),
        None => Ok(()),
    }
}

fn ensure_length(question_id: &str, text: &str, limit: usize) -> Result<(), ExamError> {
    if text.chars().count() > limit {
        return Err(ExamError::AnswerTooLong { question_id: question_id.to_string(), limit });
    }
    Ok(())
}

fn truncate_chars(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    text.chars().take(limit).collect()
}
