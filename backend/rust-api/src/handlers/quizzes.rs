use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    middlewares::auth::JwtClaims,
    models::quiz::{
        LessonQuizResponse, OptionView, QuestionView, QuizSummary, SubmitQuizRequest,
    },
    services::{
        quiz_service::{QuizService, SubmitQuizError},
        AppState,
    },
};

/// Quiz content for one lesson, with correctness flags stripped.
pub async fn get_lesson_quiz(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = QuizService::new(state.mongo.clone());

    let content = service.load_lesson_quiz(&lesson_id).await.map_err(|e| {
        tracing::error!("Failed to load quiz for lesson {}: {}", lesson_id, e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let Some(content) = content else {
        return Err((
            StatusCode::NOT_FOUND,
            "No quiz has been configured for this lesson yet.".to_string(),
        ));
    };

    let questions: Vec<QuestionView> = content
        .questions
        .iter()
        .map(|question| QuestionView {
            id: question.id.clone(),
            question_text: question.question_text.clone(),
            options: content
                .options
                .iter()
                .filter(|option| option.question_id == question.id)
                .map(|option| OptionView {
                    id: option.id.clone(),
                    option_text: option.option_text.clone(),
                })
                .collect(),
        })
        .collect();

    let response = LessonQuizResponse {
        quiz: QuizSummary {
            id: content.quiz.id.clone(),
            title: content.quiz.title.clone(),
            pass_score: content.quiz.pass_score,
            max_attempts: content.quiz.max_attempts,
            total_questions: questions.len(),
        },
        questions,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Grades a submission for the lesson's quiz and records the attempt.
pub async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
    Extension(claims): Extension<JwtClaims>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!("Quiz submission for lesson {} by {}", lesson_id, claims.sub);

    let service = QuizService::new(state.mongo.clone());

    match service
        .submit_attempt(&claims.sub, &lesson_id, &req.answers)
        .await
    {
        Ok(response) => Ok((StatusCode::OK, Json(response))),
        Err(SubmitQuizError::QuizNotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            "No quiz has been configured for this lesson yet.".to_string(),
        )),
        Err(SubmitQuizError::NoQuestions(_)) => Err((
            StatusCode::CONFLICT,
            "This quiz exists but doesn't have any questions yet.".to_string(),
        )),
        Err(SubmitQuizError::Incomplete(_)) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Please answer all questions before submitting.".to_string(),
        )),
        Err(SubmitQuizError::Internal(e)) => {
            tracing::error!("Failed to grade quiz submission: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
