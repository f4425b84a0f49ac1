// src/store/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        assessment::{Assessment, NewAssessment},
        attempt::{Attempt, AttemptDetail, AttemptSummary, NewAttempt, Submission},
        question::{NewQuestion, Question},
        report::{NewReport, Report},
        skill::{CreateSkillRequest, Skill, SkillAttempt, SkillFilter, SkillStats},
        user::{NewUser, Profile, ProfilePatch, User},
    },
    store::{ReportBuilder, Store},
};

/// In-process tables. Rows are never deleted, so ids are `len + 1`.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    user_skills: Vec<(i64, i64)>,
    skills: Vec<Skill>,
    assessments: Vec<Assessment>,
    questions: Vec<Question>,
    attempts: Vec<Attempt>,
    reports: Vec<Report>,
}

impl Tables {
    fn next_id<T>(rows: &[T]) -> i64 {
        rows.len() as i64 + 1
    }

    fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn skill(&self, id: i64) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == id)
    }

    fn assessment(&self, id: i64) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.id == id)
    }

    fn profile(&self, user_id: i64) -> Option<Profile> {
        let user = self.user(user_id)?;
        let mut skills: Vec<String> = self
            .user_skills
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .filter_map(|(_, sid)| self.skill(*sid).map(|s| s.name.clone()))
            .collect();
        skills.sort();

        Some(Profile {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            bio: user.bio.clone(),
            profile_picture: user.profile_picture.clone(),
            created_at: user.created_at,
            skills,
        })
    }

    /// Attempts on assessments that measure `skill_id`.
    fn skill_scores(&self, skill_id: i64) -> Vec<f64> {
        self.attempts
            .iter()
            .filter(|at| {
                self.assessment(at.assessment_id)
                    .is_some_and(|a| a.skill_id == Some(skill_id))
            })
            .map(|at| at.score)
            .collect()
    }

    fn attempt_detail(&self, attempt_id: i64) -> Option<AttemptDetail> {
        let attempt = self.attempts.iter().find(|a| a.id == attempt_id)?;
        let assessment = self.assessment(attempt.assessment_id)?;
        Some(AttemptDetail {
            user_assessment_id: attempt.id,
            user_id: attempt.user_id,
            assessment_id: attempt.assessment_id,
            score: attempt.score,
            completed_at: attempt.completed_at,
            title: assessment.title.clone(),
            description: assessment.description.clone(),
        })
    }

    fn push_report(&mut self, report: NewReport) -> i64 {
        let id = Self::next_id(&self.reports);
        self.reports.push(Report {
            id,
            user_assessment_id: report.user_assessment_id,
            user_id: report.user_id,
            assessment_id: report.assessment_id,
            score: report.score,
            completed_at: report.completed_at,
            title: report.title,
            description: report.description,
            feedback: report.feedback,
            created_at: Utc::now(),
        });
        id
    }

    fn refresh_skill_stats(&mut self, skill_id: i64) {
        let scores = self.skill_scores(skill_id);
        if let Some(skill) = self.skills.iter_mut().find(|s| s.id == skill_id) {
            skill.assessment_count = scores.len() as i64;
            skill.average_score = mean(&scores);
        }
    }
}

fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// [`Store`] backed by in-memory tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reports.
    pub async fn report_count(&self) -> usize {
        self.tables.read().await.reports.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        let created = User {
            id: Tables::next_id(&t.users),
            name: user.name,
            email: user.email,
            password: user.password,
            role: user.role,
            bio: None,
            profile_picture: None,
            created_at: Utc::now(),
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_profile(&self, user_id: i64) -> Result<Option<Profile>, AppError> {
        Ok(self.tables.read().await.profile(user_id))
    }

    async fn update_profile(
        &self,
        user_id: i64,
        patch: ProfilePatch,
    ) -> Result<Option<Profile>, AppError> {
        let mut t = self.tables.write().await;
        if t.user(user_id).is_none() {
            return Ok(None);
        }

        // Check everything before touching any row.
        if let Some(email) = &patch.email {
            if t.users.iter().any(|u| u.id != user_id && &u.email == email) {
                return Err(AppError::Conflict(format!(
                    "Email '{}' is already registered",
                    email
                )));
            }
        }
        if let Some(skill_ids) = &patch.skill_ids {
            if let Some(missing) = skill_ids.iter().find(|id| t.skill(**id).is_none()) {
                return Err(AppError::NotFound(format!("Skill {} not found", missing)));
            }
        }

        if let Some(user) = t.users.iter_mut().find(|u| u.id == user_id) {
            if let Some(name) = patch.name {
                user.name = name;
            }
            if let Some(email) = patch.email {
                user.email = email;
            }
            if let Some(bio) = patch.bio {
                user.bio = Some(bio);
            }
            if let Some(picture) = patch.profile_picture {
                user.profile_picture = Some(picture);
            }
        }

        if let Some(mut skill_ids) = patch.skill_ids {
            skill_ids.sort_unstable();
            skill_ids.dedup();
            t.user_skills.retain(|(uid, _)| *uid != user_id);
            t.user_skills
                .extend(skill_ids.into_iter().map(|sid| (user_id, sid)));
        }

        Ok(t.profile(user_id))
    }

    async fn create_skill(&self, skill: CreateSkillRequest) -> Result<Skill, AppError> {
        let mut t = self.tables.write().await;
        if t.skills.iter().any(|s| s.name == skill.name) {
            return Err(AppError::Conflict(format!(
                "Skill '{}' already exists",
                skill.name
            )));
        }

        let created = Skill {
            id: Tables::next_id(&t.skills),
            name: skill.name,
            category: skill.category,
            description: skill.description,
            difficulty: skill.difficulty.to_string(),
            assessment_count: 0,
            average_score: 0.0,
            created_at: Utc::now(),
        };
        t.skills.push(created.clone());
        Ok(created)
    }

    async fn list_skills(&self, filter: &SkillFilter) -> Result<(Vec<Skill>, i64), AppError> {
        let t = self.tables.read().await;
        let search = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut matching: Vec<&Skill> = t
            .skills
            .iter()
            .filter(|s| filter.category.as_ref().is_none_or(|c| &s.category == c))
            .filter(|s| {
                search.as_ref().is_none_or(|q| {
                    s.name.to_lowercase().contains(q) || s.description.to_lowercase().contains(q)
                })
            })
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn skill_attempt_history(&self, user_id: i64) -> Result<Vec<SkillAttempt>, AppError> {
        let t = self.tables.read().await;
        let mut history: Vec<SkillAttempt> = t
            .attempts
            .iter()
            .filter(|at| at.user_id == user_id)
            .filter_map(|at| {
                let skill_id = t.assessment(at.assessment_id)?.skill_id?;
                let skill = t.skill(skill_id)?;
                Some(SkillAttempt {
                    attempt_id: at.id,
                    skill_id: skill.id,
                    name: skill.name.clone(),
                    category: skill.category.clone(),
                    description: skill.description.clone(),
                    difficulty: skill.difficulty.clone(),
                    score: at.score,
                    completed_at: at.completed_at,
                })
            })
            .collect();
        history.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then_with(|| b.attempt_id.cmp(&a.attempt_id))
        });

        Ok(history)
    }

    async fn candidate_skills(&self, categories: &[String]) -> Result<Vec<SkillStats>, AppError> {
        let t = self.tables.read().await;
        let candidates = t
            .skills
            .iter()
            .filter(|s| categories.contains(&s.category))
            .map(|s| {
                let scores = t.skill_scores(s.id);
                SkillStats {
                    id: s.id,
                    name: s.name.clone(),
                    category: s.category.clone(),
                    description: s.description.clone(),
                    difficulty: s.difficulty.clone(),
                    popularity: scores.len() as i64,
                    avg_score: mean(&scores),
                }
            })
            .collect();

        Ok(candidates)
    }

    async fn create_assessment(&self, assessment: NewAssessment) -> Result<Assessment, AppError> {
        let mut t = self.tables.write().await;
        if let Some(skill_id) = assessment.skill_id {
            if t.skill(skill_id).is_none() {
                return Err(AppError::NotFound("Skill not found".to_string()));
            }
        }

        let created = Assessment {
            id: Tables::next_id(&t.assessments),
            title: assessment.title,
            description: assessment.description,
            skill_id: assessment.skill_id,
            created_at: Utc::now(),
        };
        t.assessments.push(created.clone());
        Ok(created)
    }

    async fn list_assessments(&self) -> Result<Vec<Assessment>, AppError> {
        Ok(self.tables.read().await.assessments.clone())
    }

    async fn find_assessment(&self, id: i64) -> Result<Option<Assessment>, AppError> {
        Ok(self.tables.read().await.assessment(id).cloned())
    }

    async fn add_question(&self, question: NewQuestion) -> Result<Question, AppError> {
        let mut t = self.tables.write().await;
        if t.assessment(question.assessment_id).is_none() {
            return Err(AppError::NotFound("Assessment not found".to_string()));
        }

        let created = Question {
            id: Tables::next_id(&t.questions),
            assessment_id: question.assessment_id,
            question_text: question.question_text,
            correct_answer: question.correct_answer,
            options: Json(question.options),
            created_at: Utc::now(),
        };
        t.questions.push(created.clone());
        Ok(created)
    }

    async fn list_questions(&self, assessment_id: i64) -> Result<Vec<Question>, AppError> {
        let t = self.tables.read().await;
        Ok(t.questions
            .iter()
            .filter(|q| q.assessment_id == assessment_id)
            .cloned()
            .collect())
    }

    async fn submit_attempt(
        &self,
        attempt: NewAttempt,
        build: ReportBuilder,
    ) -> Result<Submission, AppError> {
        let mut t = self.tables.write().await;
        let skill_id = t
            .assessment(attempt.assessment_id)
            .ok_or(AppError::NotFound("Assessment not found".to_string()))?
            .skill_id;
        if t.user(attempt.user_id).is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let attempt_id = Tables::next_id(&t.attempts);
        t.attempts.push(Attempt {
            id: attempt_id,
            user_id: attempt.user_id,
            assessment_id: attempt.assessment_id,
            score: attempt.score,
            completed_at: attempt.completed_at,
        });

        let detail = t
            .attempt_detail(attempt_id)
            .ok_or(AppError::InternalServerError("Attempt vanished after insert".to_string()))?;
        let report_id = t.push_report(build(&detail));

        if let Some(skill_id) = skill_id {
            t.refresh_skill_stats(skill_id);
        }

        Ok(Submission {
            user_assessment_id: attempt_id,
            report_id,
        })
    }

    async fn attempt_history(&self, user_id: i64) -> Result<Vec<AttemptSummary>, AppError> {
        let t = self.tables.read().await;
        let mut history: Vec<AttemptSummary> = t
            .attempts
            .iter()
            .filter(|at| at.user_id == user_id)
            .map(|at| AttemptSummary {
                id: at.id,
                report_id: t
                    .reports
                    .iter()
                    .filter(|r| r.user_assessment_id == at.id)
                    .map(|r| r.id)
                    .max(),
                title: t
                    .assessment(at.assessment_id)
                    .map(|a| a.title.clone())
                    .unwrap_or_default(),
                completed_at: at.completed_at,
                score: at.score,
            })
            .collect();
        history.sort_by(|a, b| b.completed_at.cmp(&a.completed_at).then_with(|| b.id.cmp(&a.id)));

        Ok(history)
    }

    async fn find_attempt_detail(&self, attempt_id: i64) -> Result<Option<AttemptDetail>, AppError> {
        Ok(self.tables.read().await.attempt_detail(attempt_id))
    }

    async fn insert_report(&self, report: NewReport) -> Result<i64, AppError> {
        let mut t = self.tables.write().await;
        if !t.attempts.iter().any(|a| a.id == report.user_assessment_id) {
            return Err(AppError::NotFound("Assessment attempt not found".to_string()));
        }
        Ok(t.push_report(report))
    }

    async fn find_report(&self, report_id: i64) -> Result<Option<Report>, AppError> {
        let t = self.tables.read().await;
        Ok(t.reports.iter().find(|r| r.id == report_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use std::sync::Arc;

    use super::*;
    use crate::{models::skill::Difficulty, services::report::build_report};

    fn skill_req(name: &str, category: &str) -> CreateSkillRequest {
        CreateSkillRequest {
            name: name.to_string(),
            category: category.to_string(),
            description: format!("About {}", name),
            difficulty: Difficulty::Beginner,
        }
    }

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(NewUser {
                name: "Tester".to_string(),
                email: email.to_string(),
                password: "hash".to_string(),
                role: "user".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "a@b.io").await;
        let err = store
            .create_user(NewUser {
                name: "Other".to_string(),
                email: "a@b.io".to_string(),
                password: "hash".to_string(),
                role: "user".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_submit_refreshes_skill_stats() {
        let store = MemoryStore::new();
        let u = user(&store, "s@b.io").await;
        let skill = store.create_skill(skill_req("Memory", "Cognitive Skills")).await.unwrap();
        let assessment = store
            .create_assessment(NewAssessment {
                title: "Memory test".to_string(),
                description: String::new(),
                skill_id: Some(skill.id),
            })
            .await
            .unwrap();

        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        for (i, score) in [40.0, 80.0].into_iter().enumerate() {
            store
                .submit_attempt(
                    NewAttempt {
                        user_id: u.id,
                        assessment_id: assessment.id,
                        score,
                        completed_at: base + Duration::minutes(i as i64),
                    },
                    build_report,
                )
                .await
                .unwrap();
        }

        let (skills, total) = store
            .list_skills(&SkillFilter { limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(skills[0].assessment_count, 2);
        assert_eq!(skills[0].average_score, 60.0);

        let history = store.skill_attempt_history(u.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].score, 80.0);

        let stats = store
            .candidate_skills(&["Cognitive Skills".to_string()])
            .await
            .unwrap();
        assert_eq!(stats[0].popularity, 2);
        assert_eq!(stats[0].avg_score, 60.0);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_keep_skill_stats_exact() {
        let store = Arc::new(MemoryStore::new());
        let u = user(&store, "c@b.io").await;
        let skill = store.create_skill(skill_req("Focus", "Cognitive Skills")).await.unwrap();
        let assessment = store
            .create_assessment(NewAssessment {
                title: "Focus test".to_string(),
                description: String::new(),
                skill_id: Some(skill.id),
            })
            .await
            .unwrap();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                let attempt = NewAttempt {
                    user_id: u.id,
                    assessment_id: assessment.id,
                    score: if i % 2 == 0 { 40.0 } else { 80.0 },
                    completed_at: Utc::now(),
                };
                tokio::spawn(async move { store.submit_attempt(attempt, build_report).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let (skills, _) = store
            .list_skills(&SkillFilter { limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(skills[0].assessment_count, 20);
        assert_eq!(skills[0].average_score, 60.0);
        assert_eq!(store.report_count().await, 20);
    }

    #[tokio::test]
    async fn test_submit_unknown_assessment_records_nothing() {
        let store = MemoryStore::new();
        let u = user(&store, "n@b.io").await;
        let err = store
            .submit_attempt(
                NewAttempt {
                    user_id: u.id,
                    assessment_id: 77,
                    score: 50.0,
                    completed_at: Utc::now(),
                },
                build_report,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.attempt_history(u.id).await.unwrap().is_empty());
        assert_eq!(store.report_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_unknown_skill_without_changes() {
        let store = MemoryStore::new();
        let u = user(&store, "p@b.io").await;
        let err = store
            .update_profile(
                u.id,
                ProfilePatch {
                    name: Some("Renamed".to_string()),
                    skill_ids: Some(vec![404]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let profile = store.find_profile(u.id).await.unwrap().unwrap();
        assert_eq!(profile.name, "Tester");
    }

    #[tokio::test]
    async fn test_list_skills_filters() {
        let store = MemoryStore::new();
        store.create_skill(skill_req("Public Speaking", "Communication Skills")).await.unwrap();
        store.create_skill(skill_req("Rust", "Technical Skills")).await.unwrap();
        store.create_skill(skill_req("SQL", "Technical Skills")).await.unwrap();

        let (page, total) = store
            .list_skills(&SkillFilter {
                category: Some("Technical Skills".to_string()),
                limit: 1,
                offset: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(page[0].name, "SQL");

        let (page, total) = store
            .list_skills(&SkillFilter {
                search: Some("speak".to_string()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].name, "Public Speaking");
    }
}
