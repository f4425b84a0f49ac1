// src/store/mod.rs

//! Storage collaborator.
//!
//! Handlers and services only see the [`Store`] trait; the application state
//! carries an `Arc<dyn Store>`. [`postgres::PgStore`] is the production
//! implementation, [`memory::MemoryStore`] keeps everything in process.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        assessment::{Assessment, NewAssessment},
        attempt::{AttemptDetail, AttemptSummary, NewAttempt, Submission},
        question::{NewQuestion, Question},
        report::{NewReport, Report},
        skill::{CreateSkillRequest, Skill, SkillAttempt, SkillFilter, SkillStats},
        user::{NewUser, Profile, ProfilePatch, User},
    },
};

/// Builds the report for an attempt inside [`Store::submit_attempt`].
pub type ReportBuilder = fn(&AttemptDetail) -> NewReport;

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_profile(&self, user_id: i64) -> Result<Option<Profile>, AppError>;

    /// Applies the present fields of `patch` and returns the updated profile,
    /// or `None` if the user does not exist.
    async fn update_profile(
        &self,
        user_id: i64,
        patch: ProfilePatch,
    ) -> Result<Option<Profile>, AppError>;

    async fn create_skill(&self, skill: CreateSkillRequest) -> Result<Skill, AppError>;

    /// One page of the catalog ordered by name, plus the total match count.
    async fn list_skills(&self, filter: &SkillFilter) -> Result<(Vec<Skill>, i64), AppError>;

    /// A user's attempts on skill-backed assessments, most recent first.
    async fn skill_attempt_history(&self, user_id: i64) -> Result<Vec<SkillAttempt>, AppError>;

    /// Skills in `categories` with popularity and average score across all users.
    async fn candidate_skills(&self, categories: &[String]) -> Result<Vec<SkillStats>, AppError>;

    async fn create_assessment(&self, assessment: NewAssessment) -> Result<Assessment, AppError>;

    async fn list_assessments(&self) -> Result<Vec<Assessment>, AppError>;

    async fn find_assessment(&self, id: i64) -> Result<Option<Assessment>, AppError>;

    async fn add_question(&self, question: NewQuestion) -> Result<Question, AppError>;

    async fn list_questions(&self, assessment_id: i64) -> Result<Vec<Question>, AppError>;

    /// Records an attempt together with its report, atomically.
    /// `build` turns the freshly stored attempt into the report row.
    /// Also refreshes the aggregate stats of the assessment's skill.
    async fn submit_attempt(
        &self,
        attempt: NewAttempt,
        build: ReportBuilder,
    ) -> Result<Submission, AppError>;

    /// A user's attempts with their latest report id, most recent first.
    async fn attempt_history(&self, user_id: i64) -> Result<Vec<AttemptSummary>, AppError>;

    async fn find_attempt_detail(&self, attempt_id: i64) -> Result<Option<AttemptDetail>, AppError>;

    /// Inserts a report and returns its id. Never deduplicates.
    async fn insert_report(&self, report: NewReport) -> Result<i64, AppError>;

    async fn find_report(&self, report_id: i64) -> Result<Option<Report>, AppError>;
}
