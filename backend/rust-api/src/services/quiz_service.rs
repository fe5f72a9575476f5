use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::QUIZ_ATTEMPTS_TOTAL;
use crate::models::quiz::{
    QuizAttempt, QuizDefinition, QuizOption, QuizQuestion, ScoreResult, SubmitQuizResponse,
};
use crate::models::LessonProgress;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    /// One or more questions have no selected option. Nothing is scored.
    #[error("submission is missing answers for {} question(s)", missing.len())]
    IncompleteSubmission { missing: Vec<String> },
}

/// Grades one submission.
///
/// A question counts as correct iff the chosen option id belongs to that
/// question and carries the correctness flag. Option ids that don't belong
/// to the question (or don't exist at all) grade as incorrect rather than
/// erroring, so a tampered payload can't crash scoring or earn credit.
/// With `pass_score` unset, a perfect score is required.
///
/// Pure and deterministic: no I/O, no clock, no randomness.
pub fn evaluate(
    questions: &[QuizQuestion],
    options: &[QuizOption],
    answers: &HashMap<String, String>,
    pass_score: Option<u32>,
) -> Result<ScoreResult, ScoreError> {
    let missing: Vec<String> = questions
        .iter()
        .filter(|question| !answers.contains_key(&question.id))
        .map(|question| question.id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(ScoreError::IncompleteSubmission { missing });
    }

    let correct_pairs: HashSet<(&str, &str)> = options
        .iter()
        .filter(|option| option.is_correct)
        .map(|option| (option.question_id.as_str(), option.id.as_str()))
        .collect();

    let correct = questions
        .iter()
        .filter(|question| {
            answers
                .get(&question.id)
                .is_some_and(|chosen| correct_pairs.contains(&(question.id.as_str(), chosen.as_str())))
        })
        .count() as u32;

    let total = questions.len() as u32;
    let pass_score = pass_score.unwrap_or(total);

    Ok(ScoreResult {
        correct,
        total,
        pass_score,
        passed: correct >= pass_score,
    })
}

/// Everything needed to display or grade one lesson's quiz.
#[derive(Debug)]
pub struct LessonQuizContent {
    pub quiz: QuizDefinition,
    pub questions: Vec<QuizQuestion>,
    pub options: Vec<QuizOption>,
}

#[derive(Debug, Error)]
pub enum SubmitQuizError {
    #[error("no quiz is configured for lesson {0}")]
    QuizNotFound(String),
    #[error("quiz {0} has no questions yet")]
    NoQuestions(String),
    #[error(transparent)]
    Incomplete(#[from] ScoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct QuizService {
    mongo: Database,
}

impl QuizService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Loads the quiz for a lesson with its questions and options in display
    /// order. Returns `None` when the lesson has no quiz configured.
    pub async fn load_lesson_quiz(&self, lesson_id: &str) -> Result<Option<LessonQuizContent>> {
        let quizzes = self.mongo.collection::<QuizDefinition>("quizzes");
        let Some(quiz) = quizzes
            .find_one(doc! { "lesson_id": lesson_id })
            .await
            .context("failed to look up quiz for lesson")?
        else {
            return Ok(None);
        };

        let questions: Vec<QuizQuestion> = self
            .mongo
            .collection::<QuizQuestion>("quiz_questions")
            .find(doc! { "quiz_id": &quiz.id })
            .sort(doc! { "sort_order": 1 })
            .await
            .context("failed to load quiz questions")?
            .try_collect()
            .await
            .context("failed to read quiz questions")?;

        let question_ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        let options: Vec<QuizOption> = if question_ids.is_empty() {
            Vec::new()
        } else {
            self.mongo
                .collection::<QuizOption>("quiz_options")
                .find(doc! { "question_id": { "$in": question_ids } })
                .sort(doc! { "sort_order": 1 })
                .await
                .context("failed to load quiz options")?
                .try_collect()
                .await
                .context("failed to read quiz options")?
        };

        Ok(Some(LessonQuizContent {
            quiz,
            questions,
            options,
        }))
    }

    /// Grades a submission, records the attempt and, on a pass, marks the
    /// lesson complete for the learner.
    pub async fn submit_attempt(
        &self,
        user_id: &str,
        lesson_id: &str,
        answers: &HashMap<String, String>,
    ) -> Result<SubmitQuizResponse, SubmitQuizError> {
        let content = self
            .load_lesson_quiz(lesson_id)
            .await?
            .ok_or_else(|| SubmitQuizError::QuizNotFound(lesson_id.to_string()))?;
        if content.questions.is_empty() {
            return Err(SubmitQuizError::NoQuestions(content.quiz.id));
        }

        let result = evaluate(
            &content.questions,
            &content.options,
            answers,
            content.quiz.pass_score,
        )?;

        let now = Utc::now();
        let attempt = QuizAttempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: content.quiz.id.clone(),
            score: result.correct,
            passed: result.passed,
            started_at: now,
            submitted_at: now,
            raw_answers: answers.clone(),
        };
        self.mongo
            .collection::<QuizAttempt>("quiz_attempts")
            .insert_one(&attempt)
            .await
            .context("failed to record quiz attempt")?;

        if result.passed {
            // The attempt is already recorded and the pass stands; a progress
            // write failure is logged, not surfaced to the learner.
            if let Err(err) = self.mark_lesson_complete(user_id, lesson_id).await {
                tracing::error!(user = user_id, lesson = lesson_id, error = %err, "failed to mark lesson complete");
            }
        }

        QUIZ_ATTEMPTS_TOTAL
            .with_label_values(&[if result.passed { "passed" } else { "failed" }])
            .inc();
        tracing::info!(
            user = user_id,
            lesson = lesson_id,
            quiz = %content.quiz.id,
            score = result.correct,
            passed = result.passed,
            "quiz attempt graded"
        );

        let message = if result.passed {
            format!(
                "You passed! You answered {} of {} correctly.",
                result.correct, result.total
            )
        } else {
            format!(
                "You scored {} of {}. You need at least {} correct to pass.",
                result.correct, result.total, result.pass_score
            )
        };

        Ok(SubmitQuizResponse {
            correct: result.correct,
            total: result.total,
            pass_score: result.pass_score,
            passed: result.passed,
            message,
        })
    }

    async fn mark_lesson_complete(&self, user_id: &str, lesson_id: &str) -> Result<()> {
        let progress = LessonProgress {
            id: LessonProgress::document_id(user_id, lesson_id),
            user_id: user_id.to_string(),
            lesson_id: lesson_id.to_string(),
            completed_at: Utc::now(),
        };

        self.mongo
            .collection::<LessonProgress>("lesson_progress")
            .replace_one(doc! { "_id": &progress.id }, &progress)
            .with_options(
                mongodb::options::ReplaceOptions::builder()
                    .upsert(true)
                    .build(),
            )
            .await
            .context("failed to upsert lesson progress")?;

        Ok(())
    }
}
