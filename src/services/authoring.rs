use sqlx::PgPool;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Course, CourseWithCount, Question};
use crate::db::types::QuestionType;
use crate::repositories;
use crate::services::access::{self, Principal};
use crate::services::ExamError;

pub(crate) const MIN_TIME_LIMIT_MINUTES: i32 = 5;
pub(crate) const MAX_TIME_LIMIT_MINUTES: i32 = 240;
pub(crate) const MAX_QUESTION_MARKS: i32 = 1000;
const MAX_CHOICES: usize = 4;
const MIN_CHOICES: usize = 2;

#[derive(Debug, Clone)]
pub(crate) struct NewQuestion {
    pub(crate) question_type: QuestionType,
    pub(crate) prompt: String,
    pub(crate) choices: Vec<String>,
    pub(crate) correct_answer: String,
    pub(crate) marks: i32,
}

pub(crate) fn validate_time_limit(minutes: i32) -> Result<(), ExamError> {
    if (MIN_TIME_LIMIT_MINUTES..=MAX_TIME_LIMIT_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(ExamError::InvalidCourse(format!(
            "time limit must be between {MIN_TIME_LIMIT_MINUTES} and {MAX_TIME_LIMIT_MINUTES} minutes"
        )))
    }
}

/// Checks the per-type rules and returns the question in its stored form.
pub(crate) fn normalize_question(input: NewQuestion) -> Result<NewQuestion, ExamError> {
    let prompt = input.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(invalid("prompt must not be empty"));
    }
    if !(1..=MAX_QUESTION_MARKS).contains(&input.marks) {
        return Err(invalid("marks must be between 1 and 1000"));
    }

    let choices: Vec<String> = input
        .choices
        .iter()
        .map(|choice| choice.trim().to_string())
        .filter(|choice| !choice.is_empty())
        .collect();
    let correct = input.correct_answer.trim();

    let (choices, correct_answer) = match input.question_type {
        QuestionType::MultipleChoice => {
            if !(MIN_CHOICES..=MAX_CHOICES).contains(&choices.len()) {
                return Err(invalid("multiple choice questions need between 2 and 4 choices"));
            }
            let Some(matched) =
                choices.iter().find(|choice| choice.to_lowercase() == correct.to_lowercase())
            else {
                return Err(invalid("correct answer must be one of the choices"));
            };
            let matched = matched.clone();
            (choices, matched)
        }
        QuestionType::TrueFalse => {
            let correct_answer = match correct.to_lowercase().as_str() {
                "true" => "True",
                "false" => "False",
                _ => return Err(invalid("true/false questions need True or False as the answer")),
            };
            (vec!["True".to_string(), "False".to_string()], correct_answer.to_string())
        }
        QuestionType::ShortAnswer | QuestionType::Essay => {
            if !correct.is_empty() {
                return Err(invalid("short answer and essay questions cannot have a correct answer"));
            }
            if !choices.is_empty() {
                return Err(invalid("short answer and essay questions cannot have choices"));
            }
            (Vec::new(), String::new())
        }
    };

    Ok(NewQuestion {
        question_type: input.question_type,
        prompt,
        choices,
        correct_answer,
        marks: input.marks,
    })
}

fn invalid(message: &str) -> ExamError {
    ExamError::InvalidQuestion(message.to_string())
}

pub(crate) async fn create_course(
    pool: &PgPool,
    principal: &Principal,
    title: &str,
    time_limit_minutes: i32,
) -> Result<Course, ExamError> {
    access::require_author(principal)?;
    validate_time_limit(time_limit_minutes)?;

    let title = title.trim();
    if title.is_empty() {
        return Err(ExamError::InvalidCourse("title must not be empty".to_string()));
    }

    let now = primitive_now_utc();
    let course = repositories::courses::create(
        pool,
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            title,
            teacher_id: Some(&principal.id),
            time_limit_minutes,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(course_id = %course.id, teacher_id = %principal.id, "Course created");
    Ok(course)
}

/// Authors see the courses they own; everyone else sees the full catalogue.
pub(crate) async fn list_courses(
    pool: &PgPool,
    principal: &Principal,
) -> Result<Vec<CourseWithCount>, ExamError> {
    let teacher_filter =
        (principal.can_author() && !principal.is_admin()).then_some(principal.id.as_str());
    Ok(repositories::courses::list_with_counts(pool, teacher_filter).await?)
}

pub(crate) async fn add_question(
    pool: &PgPool,
    principal: &Principal,
    course_id: &str,
    input: NewQuestion,
) -> Result<Question, ExamError> {
    let mut tx = pool.begin().await?;

    let course = repositories::courses::find_by_id(&mut *tx, course_id)
        .await?
        .ok_or(ExamError::CourseNotFound)?;
    access::require_course_owner(principal, &course)?;

    let question = normalize_question(input)?;
    let order_index = repositories::questions::next_order_index(&mut *tx, &course.id).await?;

    let created = repositories::questions::create(
        &mut *tx,
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            order_index,
            question_type: question.question_type,
            prompt: &question.prompt,
            choices: question.choices,
            correct_answer: &question.correct_answer,
            marks: question.marks,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        course_id = %course.id,
        question_id = %created.id,
        question_type = ?created.question_type,
        "Question added"
    );
    Ok(created)
}

pub(crate) async fn list_questions(
    pool: &PgPool,
    principal: &Principal,
    course_id: &str,
) -> Result<(Course, Vec<Question>), ExamError> {
    let course = repositories::courses::find_by_id(pool, course_id)
        .await?
        .ok_or(ExamError::CourseNotFound)?;
    access::require_course_owner(principal, &course)?;

    let questions = repositories::questions::list_by_course(pool, &course.id).await?;
    Ok((course, questions))
}
