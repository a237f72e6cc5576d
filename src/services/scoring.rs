use sqlx::PgConnection;

use crate::db::models::{ExamResult, ExamSession};
use crate::db::types::QuestionType;
use crate::repositories;
use crate::services::ExamError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct GradedAnswer {
    pub(crate) marks: i32,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoreSummary {
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) percentage: f64,
}

/// Short-answer and essay responses are left for manual grading and never match.
pub(crate) fn grade_answer(question_type: QuestionType, correct_answer: &str, chosen: &str) -> bool {
    if !question_type.is_auto_scored() {
        return false;
    }

    let expected = correct_answer.trim();
    !expected.is_empty() && expected.to_lowercase() == chosen.trim().to_lowercase()
}

/// Only recorded answers contribute to `total_marks`; skipped questions are not counted.
/// Sums are taken in i64 and must fit back into the i32 result columns.
pub(crate) fn summarize<I>(graded: I) -> Result<ScoreSummary, ExamError>
where
    I: IntoIterator<Item = GradedAnswer>,
{
    let (score, total) = graded.into_iter().fold((0i64, 0i64), |(score, total), answer| {
        let marks = i64::from(answer.marks);
        let credited = if answer.is_correct { marks } else { 0 };
        (score + credited, total + marks)
    });

    let score = i32::try_from(score).map_err(|_| ExamError::ScoreOverflow)?;
    let total_marks = i32::try_from(total).map_err(|_| ExamError::ScoreOverflow)?;

    Ok(ScoreSummary { score, total_marks, percentage: percentage(score, total_marks) })
}

pub(crate) fn percentage(score: i32, total_marks: i32) -> f64 {
    if total_marks <= 0 {
        return 0.0;
    }

    let raw = f64::from(score) / f64::from(total_marks) * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Grades every recorded answer of `session`, writes correctness back and upserts
/// the session's result. Runs on the caller's connection so a submit can keep the
/// whole completion inside one transaction.
pub(crate) async fn compute_score(
    conn: &mut PgConnection,
    session: &ExamSession,
    now: time::PrimitiveDateTime,
) -> Result<ExamResult, ExamError> {
    let answers = repositories::answers::list_with_questions(&mut *conn, &session.id).await?;

    let mut graded = Vec::with_capacity(answers.len());
    for answer in &answers {
        let is_correct =
            grade_answer(answer.question_type, &answer.correct_answer, &answer.chosen_answer);
        if is_correct != answer.is_correct {
            repositories::answers::set_is_correct(&mut *conn, &answer.answer_id, is_correct)
                .await?;
        }
        graded.push(GradedAnswer { marks: answer.marks, is_correct });
    }

    let summary = summarize(graded)?;

    let result = repositories::results::upsert(
        &mut *conn,
        repositories::results::UpsertResult {
            session_id: &session.id,
            student_id: &session.student_id,
            course_id: &session.course_id,
            score: summary.score,
            total_marks: summary.total_marks,
            percentage: summary.percentage,
            now,
        },
    )
    .await?;

    tracing::debug!(
        session_id = %session.id,
        score = summary.score,
        total_marks = summary.total_marks,
        answers = answers.len(),
        "Session scored"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graded(marks: i32, is_correct: bool) -> GradedAnswer {
        GradedAnswer { marks, is_correct }
    }

    #[test]
    fn choice_answers_match_ignoring_case_and_whitespace() {
        assert!(grade_answer(QuestionType::MultipleChoice, "Paris", "  paris "));
        assert!(grade_answer(QuestionType::TrueFalse, "True", "TRUE"));
        assert!(!grade_answer(QuestionType::MultipleChoice, "Paris", "Lyon"));
    }

    #[test]
    fn free_text_answers_are_never_auto_scored() {
        assert!(!grade_answer(QuestionType::ShortAnswer, "", ""));
        assert!(!grade_answer(QuestionType::Essay, "anything", "anything"));
    }

    #[test]
    fn empty_key_never_matches() {
        assert!(!grade_answer(QuestionType::MultipleChoice, "  ", ""));
    }

    #[test]
    fn one_of_three_rounds_to_two_decimals() {
        let summary = summarize([graded(1, true), graded(1, false), graded(1, false)]).expect("summary");
        assert_eq!(summary, ScoreSummary { score: 1, total_marks: 3, percentage: 33.33 });
    }

    #[test]
    fn essay_marks_count_toward_total() {
        // mc worth 2 answered correctly, essay worth 3 never credited
        let summary = summarize([graded(2, true), graded(3, false)]).expect("summary");
        assert_eq!(summary.score, 2);
        assert_eq!(summary.total_marks, 5);
        assert_eq!(summary.percentage, 40.0);
    }

    #[test]
    fn no_answers_is_zero_not_an_error() {
        let summary = summarize(Vec::new()).expect("summary");
        assert_eq!(summary, ScoreSummary { score: 0, total_marks: 0, percentage: 0.0 });
    }

    #[test]
    fn unanswered_questions_do_not_grow_denominator() {
        // a course of four single-mark questions where only two answers were recorded
        let summary = summarize([graded(1, true), graded(1, true)]).expect("summary");
        assert_eq!(summary.total_marks, 2);
        assert_eq!(summary.percentage, 100.0);
    }

    #[test]
    fn summarize_is_deterministic() {
        let answers = [graded(2, true), graded(1, false), graded(4, true)];
        let first = summarize(answers).expect("summary");
        assert_eq!(first, summarize(answers).expect("summary"));
        assert_eq!(first.percentage, 85.71);
    }

    #[test]
    fn large_marks_do_not_wrap() {
        let summary = summarize([graded(i32::MAX / 2, true), graded(i32::MAX / 2, false)])
            .expect("fits in i32");
        assert_eq!(summary.total_marks, i32::MAX - 1);
        assert_eq!(summary.percentage, 50.0);

        let err = summarize([graded(i32::MAX, true), graded(i32::MAX, true)])
            .expect_err("overflowing total");
        assert!(matches!(err, ExamError::ScoreOverflow));
    }
}
