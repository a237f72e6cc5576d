use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::db::models::{Course, Question, User};
use crate::db::types::QuestionType;
use crate::repositories;
use crate::test_support::{self, TestContext};

struct ExamFixture {
    teacher: User,
    student: User,
    course: Course,
    mc: Question,
    tf: Question,
    essay: Question,
}

async fn exam_fixture(ctx: &TestContext, time_limit_minutes: i32) -> ExamFixture {
    let db = ctx.state.db();
    let teacher = test_support::insert_teacher(db, "teacher").await;
    let student = test_support::insert_student(db, "student").await;
    let course = test_support::insert_course(db, "History", &teacher.id, time_limit_minutes).await;

    let mc = test_support::insert_question(
        db,
        &course.id,
        QuestionType::MultipleChoice,
        &["1066", "1215", "1492"],
        "1066",
        1,
    )
    .await;
    let tf =
        test_support::insert_question(db, &course.id, QuestionType::TrueFalse, &[], "True", 1)
            .await;
    let essay =
        test_support::insert_question(db, &course.id, QuestionType::Essay, &[], "", 1).await;

    ExamFixture { teacher, student, course, mc, tf, essay }
}

async fn send(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(token), body))
        .await
        .expect("response");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

async fn start(ctx: &TestContext, course_id: &str, token: &str) -> (StatusCode, Value) {
    send(ctx, Method::POST, &format!("/api/v1/courses/{course_id}/sessions"), token, None).await
}

#[tokio::test]
async fn full_exam_flow_scores_answered_questions() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (status, started) = start(&ctx, &fx.course.id, &token).await;
    assert_eq!(status, StatusCode::CREATED, "response: {started}");
    assert_eq!(started["resumed"], false);
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();

    let (status, detail) =
        send(&ctx, Method::GET, &format!("/api/v1/sessions/{session_id}"), &token, None).await;
    assert_eq!(status, StatusCode::OK, "response: {detail}");
    let questions = detail["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["id"], fx.mc.id.as_str());
    assert_eq!(questions[2]["input_kind"], "free_text");
    assert!(questions[0].get("correct_answer").is_none());
    assert!(detail["remaining_seconds"].as_i64().expect("remaining") > 0);

    let (status, submitted) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/submit"),
        &token,
        Some(json!({ "answers": {
            fx.mc.id.clone(): " 1066 ",
            fx.tf.id.clone(): "false",
            fx.essay.id.clone(): "Because of the Normans."
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {submitted}");
    assert_eq!(submitted["completion_mode"], "manual");
    assert_eq!(submitted["session"]["is_completed"], true);
    assert_eq!(submitted["session"]["score"], 1);
    assert_eq!(submitted["result"]["score"], 1);
    assert_eq!(submitted["result"]["total_marks"], 3);
    assert_eq!(submitted["result"]["percentage"], 33.33);

    let (status, result) =
        send(&ctx, Method::GET, &format!("/api/v1/sessions/{session_id}/result"), &token, None)
            .await;
    assert_eq!(status, StatusCode::OK, "response: {result}");
    let answers = result["answers"].as_array().expect("answers");
    assert_eq!(answers.len(), 3);
    assert_eq!(answers[0]["is_correct"], true);
    assert_eq!(answers[1]["is_correct"], false);
    assert_eq!(answers[2]["is_correct"], false);

    let teacher_token = test_support::bearer_token(&fx.teacher.id, ctx.state.settings());
    let (status, dashboard) = send(
        &ctx,
        Method::GET,
        &format!("/api/v1/courses/{}/results", fx.course.id),
        &teacher_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {dashboard}");
    assert_eq!(dashboard["results"][0]["session_id"], session_id.as_str());
    assert_eq!(dashboard["results"][0]["student_username"], "student");

    let (status, history) = send(&ctx, Method::GET, "/api/v1/sessions", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["total_count"], 1);
    assert_eq!(history["items"][0]["percentage"], 33.33);
}

#[tokio::test]
async fn starting_twice_resumes_the_open_session() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (_, first) = start(&ctx, &fx.course.id, &token).await;
    let (status, second) = start(&ctx, &fx.course.id, &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["resumed"], true);
    assert_eq!(first["session"]["id"], second["session"]["id"]);

    let (status, health) = send(&ctx, Method::GET, "/healthz", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["components"]["open_sessions"], "1");
}

#[tokio::test]
async fn concurrent_starts_converge_on_one_session() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (first, second) =
        tokio::join!(start(&ctx, &fx.course.id, &token), start(&ctx, &fx.course.id, &token));

    assert_eq!(first.1["session"]["id"], second.1["session"]["id"]);
    let resumed = [first.1["resumed"].as_bool(), second.1["resumed"].as_bool()];
    assert!(resumed.contains(&Some(true)) && resumed.contains(&Some(false)));
}

#[tokio::test]
async fn course_without_questions_cannot_be_started() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher").await;
    let student = test_support::insert_student(ctx.state.db(), "student").await;
    let course = test_support::insert_course(ctx.state.db(), "Empty", &teacher.id, 30).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let (status, body) = start(&ctx, &course.id, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (_, history) = send(&ctx, Method::GET, "/api/v1/sessions", &token, None).await;
    assert_eq!(history["total_count"], 0);
}

#[tokio::test]
async fn teacher_cannot_start_session() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.teacher.id, ctx.state.settings());

    let (status, _) = start(&ctx, &fx.course.id, &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn incomplete_submission_lists_missing_and_keeps_session_open() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (_, started) = start(&ctx, &fx.course.id, &token).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();

    let (status, body) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/submit"),
        &token,
        Some(json!({ "answers": { fx.mc.id.clone(): "1066", fx.tf.id.clone(): "  " } })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "response: {body}");
    assert_eq!(body["missing_question_ids"], json!([fx.tf.id, fx.essay.id]));

    let session = repositories::sessions::find_by_id(ctx.state.db(), &session_id)
        .await
        .expect("session")
        .expect("exists");
    assert!(!session.is_completed);
    let answers = repositories::answers::list_by_session(ctx.state.db(), &session_id)
        .await
        .expect("answers");
    assert!(answers.is_empty());
}

#[tokio::test]
async fn unknown_question_is_rejected_before_deadline() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (_, started) = start(&ctx, &fx.course.id, &token).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();

    let (status, _) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/submit"),
        &token,
        Some(json!({ "answers": {
            fx.mc.id.clone(): "1066",
            fx.tf.id.clone(): "True",
            fx.essay.id.clone(): "text",
            "not-a-question": "x"
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn second_submit_is_rejected() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (_, started) = start(&ctx, &fx.course.id, &token).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();
    let uri = format!("/api/v1/sessions/{session_id}/submit");
    let answers = json!({ "answers": {
        fx.mc.id.clone(): "1066",
        fx.tf.id.clone(): "True",
        fx.essay.id.clone(): "text"
    }});

    let (first, second) = tokio::join!(
        send(&ctx, Method::POST, &uri, &token, Some(answers.clone())),
        send(&ctx, Method::POST, &uri, &token, Some(answers.clone())),
    );
    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let result = repositories::results::find_by_session(ctx.state.db(), &session_id)
        .await
        .expect("result")
        .expect("exists");
    assert_eq!(result.score, 2);
    assert_eq!(result.total_marks, 3);

    let (status, _) =
        send(&ctx, Method::GET, &format!("/api/v1/sessions/{session_id}"), &token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn late_submission_is_auto_completed_with_partial_answers() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 5).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (_, started) = start(&ctx, &fx.course.id, &token).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();
    test_support::backdate_session(ctx.state.db(), &session_id, 6).await;

    let (status, body) = send(
        &ctx,
        Method::PUT,
        &format!("/api/v1/sessions/{session_id}/answers"),
        &token,
        Some(json!({ "answers": { fx.mc.id.clone(): "1066" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, submitted) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/submit"),
        &token,
        Some(json!({ "answers": { fx.mc.id.clone(): "1066", "stray": "x" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {submitted}");
    assert_eq!(submitted["completion_mode"], "auto_deadline");
    assert_eq!(submitted["dropped_question_ids"], json!(["stray"]));
    assert_eq!(submitted["result"]["score"], 1);
    assert_eq!(submitted["result"]["total_marks"], 1);
    assert_eq!(submitted["result"]["percentage"], 100.0);
}

#[tokio::test]
async fn blank_late_entry_keeps_earlier_draft() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 5).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (_, started) = start(&ctx, &fx.course.id, &token).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();

    let (status, _) = send(
        &ctx,
        Method::PUT,
        &format!("/api/v1/sessions/{session_id}/answers"),
        &token,
        Some(json!({ "answers": { fx.mc.id.clone(): "1066" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    test_support::backdate_session(ctx.state.db(), &session_id, 6).await;

    let (status, submitted) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/submit"),
        &token,
        Some(json!({ "answers": { fx.mc.id.clone(): "   " } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {submitted}");
    assert_eq!(submitted["completion_mode"], "auto_deadline");
    assert_eq!(submitted["dropped_question_ids"], json!([fx.mc.id]));
    assert_eq!(submitted["result"]["score"], 1);
    assert_eq!(submitted["result"]["total_marks"], 1);

    let answers = repositories::answers::list_by_session(ctx.state.db(), &session_id)
        .await
        .expect("answers");
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].chosen_answer, "1066");
}

#[tokio::test]
async fn draft_answers_survive_resume_and_can_be_overwritten() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (_, started) = start(&ctx, &fx.course.id, &token).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();
    let answers_uri = format!("/api/v1/sessions/{session_id}/answers");

    let (status, saved) = send(
        &ctx,
        Method::PUT,
        &answers_uri,
        &token,
        Some(json!({ "answers": { fx.mc.id.clone(): "1215", fx.tf.id.clone(): "" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {saved}");
    assert_eq!(saved["saved"], 1);

    send(
        &ctx,
        Method::PUT,
        &answers_uri,
        &token,
        Some(json!({ "answers": { fx.mc.id.clone(): "1066" } })),
    )
    .await;

    let (_, detail) =
        send(&ctx, Method::GET, &format!("/api/v1/sessions/{session_id}"), &token, None).await;
    assert_eq!(detail["answers"][fx.mc.id.as_str()], "1066");
    assert!(detail["answers"].get(fx.tf.id.as_str()).is_none());

    let answers = repositories::answers::list_by_session(ctx.state.db(), &session_id)
        .await
        .expect("answers");
    assert_eq!(answers.len(), 1);
}

#[tokio::test]
async fn another_student_cannot_touch_session() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let intruder = test_support::insert_student(ctx.state.db(), "intruder").await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());
    let intruder_token = test_support::bearer_token(&intruder.id, ctx.state.settings());

    let (_, started) = start(&ctx, &fx.course.id, &token).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();

    let (status, _) =
        send(&ctx, Method::GET, &format!("/api/v1/sessions/{session_id}"), &intruder_token, None)
            .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/submit"),
        &intruder_token,
        Some(json!({ "answers": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn result_is_unavailable_until_completion() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (_, started) = start(&ctx, &fx.course.id, &token).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();

    let (status, _) =
        send(&ctx, Method::GET, &format!("/api/v1/sessions/{session_id}/result"), &token, None)
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rescoring_keeps_achieved_at_and_values() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let fx = exam_fixture(&ctx, 30).await;
    let token = test_support::bearer_token(&fx.student.id, ctx.state.settings());

    let (_, started) = start(&ctx, &fx.course.id, &token).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();
    send(
        &ctx,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/submit"),
        &token,
        Some(json!({ "answers": {
            fx.mc.id.clone(): "1066",
            fx.tf.id.clone(): "True",
            fx.essay.id.clone(): "text"
        }})),
    )
    .await;

    let session = repositories::sessions::find_by_id(ctx.state.db(), &session_id)
        .await
        .expect("session")
        .expect("exists");
    let first = repositories::results::find_by_session(ctx.state.db(), &session_id)
        .await
        .expect("result")
        .expect("exists");

    let mut conn = ctx.state.db().acquire().await.expect("connection");
    let rescored = crate::services::scoring::compute_score(
        &mut conn,
        &session,
        crate::core::time::primitive_now_utc(),
    )
    .await
    .expect("rescore");

    assert_eq!(rescored.score, first.score);
    assert_eq!(rescored.total_marks, first.total_marks);
    assert_eq!(rescored.percentage, first.percentage);
    assert_eq!(rescored.achieved_at, first.achieved_at);
}
