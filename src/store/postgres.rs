// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

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
    store::{ReportBuilder, Store},
};

const USER_COLUMNS: &str = "id, name, email, password, role, bio, profile_picture, created_at";

const SKILL_COLUMNS: &str =
    "id, name, category, description, difficulty, assessment_count, average_score, created_at";

const ATTEMPT_DETAIL_QUERY: &str = r#"
    SELECT
        ua.id AS user_assessment_id,
        ua.user_id,
        ua.assessment_id,
        ua.score,
        ua.completed_at,
        a.title,
        a.description
    FROM user_assessments ua
    JOIN assessments a ON ua.assessment_id = a.id
    WHERE ua.id = $1
"#;

const INSERT_REPORT_QUERY: &str = r#"
    INSERT INTO assessment_reports (
        user_assessment_id, user_id, assessment_id, score,
        completed_at, title, description, feedback
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id
"#;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

/// [`Store`] backed by PostgreSQL. Schema: `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_profile(pool: &PgPool, user_id: i64) -> Result<Option<Profile>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        let skills: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT s.name
            FROM skills s
            JOIN user_skills us ON s.id = us.skill_id
            WHERE us.user_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(Some(Profile {
            id: user.id,
            name: user.name,
            email: user.email,
            bio: user.bio,
            profile_picture: user.profile_picture,
            created_at: user.created_at,
            skills,
        }))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Email '{}' is already registered", user.email))
            } else {
                tracing::debug!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_profile(&self, user_id: i64) -> Result<Option<Profile>, AppError> {
        Self::fetch_profile(&self.pool, user_id).await
    }

    async fn update_profile(
        &self,
        user_id: i64,
        patch: ProfilePatch,
    ) -> Result<Option<Profile>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let email = patch.email.clone();
        if patch.name.is_some()
            || patch.email.is_some()
            || patch.bio.is_some()
            || patch.profile_picture.is_some()
        {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
            let mut separated = builder.separated(", ");

            if let Some(name) = patch.name {
                separated.push("name = ");
                separated.push_bind_unseparated(name);
            }

            if let Some(email) = patch.email {
                separated.push("email = ");
                separated.push_bind_unseparated(email);
            }

            if let Some(bio) = patch.bio {
                separated.push("bio = ");
                separated.push_bind_unseparated(bio);
            }

            if let Some(picture) = patch.profile_picture {
                separated.push("profile_picture = ");
                separated.push_bind_unseparated(picture);
            }

            builder.push(" WHERE id = ");
            builder.push_bind(user_id);

            builder.build().execute(&mut *tx).await.map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!(
                        "Email '{}' is already registered",
                        email.unwrap_or_default()
                    ))
                } else {
                    tracing::debug!("Failed to update profile: {:?}", e);
                    AppError::from(e)
                }
            })?;
        }

        if let Some(mut skill_ids) = patch.skill_ids {
            skill_ids.sort_unstable();
            skill_ids.dedup();

            let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM skills WHERE id = ANY($1)")
                .bind(&skill_ids)
                .fetch_all(&mut *tx)
                .await?;
            if let Some(missing) = skill_ids.iter().find(|id| !found.contains(id)) {
                return Err(AppError::NotFound(format!("Skill {} not found", missing)));
            }

            sqlx::query("DELETE FROM user_skills WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO user_skills (user_id, skill_id) SELECT $1, UNNEST($2::BIGINT[])",
            )
            .bind(user_id)
            .bind(&skill_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Self::fetch_profile(&self.pool, user_id).await
    }

    async fn create_skill(&self, skill: CreateSkillRequest) -> Result<Skill, AppError> {
        sqlx::query_as::<_, Skill>(&format!(
            r#"
            INSERT INTO skills (name, category, description, difficulty)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            SKILL_COLUMNS
        ))
        .bind(&skill.name)
        .bind(&skill.category)
        .bind(&skill.description)
        .bind(skill.difficulty.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Skill '{}' already exists", skill.name))
            } else {
                tracing::debug!("Failed to create skill: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn list_skills(&self, filter: &SkillFilter) -> Result<(Vec<Skill>, i64), AppError> {
        let search_pattern = filter.search.as_deref().map(like_pattern);

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM skills WHERE TRUE", SKILL_COLUMNS));
        push_skill_filter(&mut builder, filter.category.as_deref(), search_pattern.as_deref());
        builder.push(" ORDER BY name, id LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let skills: Vec<Skill> = builder.build_query_as().fetch_all(&self.pool).await?;

        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM skills WHERE TRUE");
        push_skill_filter(&mut count, filter.category.as_deref(), search_pattern.as_deref());
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((skills, total))
    }

    async fn skill_attempt_history(&self, user_id: i64) -> Result<Vec<SkillAttempt>, AppError> {
        let rows = sqlx::query_as::<_, SkillAttempt>(
            r#"
            SELECT
                ua.id AS attempt_id,
                s.id AS skill_id,
                s.name,
                s.category,
                s.description,
                s.difficulty,
                ua.score,
                ua.completed_at
            FROM user_assessments ua
            JOIN assessments a ON ua.assessment_id = a.id
            JOIN skills s ON a.skill_id = s.id
            WHERE ua.user_id = $1
            ORDER BY ua.completed_at DESC, ua.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn candidate_skills(&self, categories: &[String]) -> Result<Vec<SkillStats>, AppError> {
        let rows = sqlx::query_as::<_, SkillStats>(
            r#"
            SELECT
                s.id,
                s.name,
                s.category,
                s.description,
                s.difficulty,
                COUNT(DISTINCT ua.id) AS popularity,
                COALESCE(AVG(ua.score), 0)::DOUBLE PRECISION AS avg_score
            FROM skills s
            LEFT JOIN assessments a ON a.skill_id = s.id
            LEFT JOIN user_assessments ua ON ua.assessment_id = a.id
            WHERE s.category = ANY($1)
            GROUP BY s.id
            "#,
        )
        .bind(categories)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create_assessment(&self, assessment: NewAssessment) -> Result<Assessment, AppError> {
        sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO assessments (title, description, skill_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, skill_id, created_at
            "#,
        )
        .bind(&assessment.title)
        .bind(&assessment.description)
        .bind(assessment.skill_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound("Skill not found".to_string())
            } else {
                tracing::debug!("Failed to create assessment: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn list_assessments(&self) -> Result<Vec<Assessment>, AppError> {
        let rows = sqlx::query_as::<_, Assessment>(
            "SELECT id, title, description, skill_id, created_at FROM assessments ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_assessment(&self, id: i64) -> Result<Option<Assessment>, AppError> {
        let row = sqlx::query_as::<_, Assessment>(
            "SELECT id, title, description, skill_id, created_at FROM assessments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn add_question(&self, question: NewQuestion) -> Result<Question, AppError> {
        sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (assessment_id, question_text, correct_answer, options)
            VALUES ($1, $2, $3, $4)
            RETURNING id, assessment_id, question_text, correct_answer, options, created_at
            "#,
        )
        .bind(question.assessment_id)
        .bind(&question.question_text)
        .bind(&question.correct_answer)
        .bind(Json(&question.options))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound("Assessment not found".to_string())
            } else {
                tracing::debug!("Failed to add question: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn list_questions(&self, assessment_id: i64) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, assessment_id, question_text, correct_answer, options, created_at
            FROM questions
            WHERE assessment_id = $1
            ORDER BY id
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn submit_attempt(
        &self,
        attempt: NewAttempt,
        build: ReportBuilder,
    ) -> Result<Submission, AppError> {
        let mut tx = self.pool.begin().await?;

        let skill_id: Option<Option<i64>> =
            sqlx::query_scalar("SELECT skill_id FROM assessments WHERE id = $1")
                .bind(attempt.assessment_id)
                .fetch_optional(&mut *tx)
                .await?;
        let skill_id = skill_id.ok_or(AppError::NotFound("Assessment not found".to_string()))?;

        // Serializes submissions per skill until commit, so the stats
        // recomputed below always see every committed attempt.
        if let Some(skill_id) = skill_id {
            sqlx::query("SELECT id FROM skills WHERE id = $1 FOR UPDATE")
                .bind(skill_id)
                .execute(&mut *tx)
                .await?;
        }

        let attempt_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO user_assessments (user_id, assessment_id, score, completed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(attempt.user_id)
        .bind(attempt.assessment_id)
        .bind(attempt.score)
        .bind(attempt.completed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound("User not found".to_string())
            } else {
                tracing::debug!("Failed to insert attempt: {:?}", e);
                AppError::from(e)
            }
        })?;

        let detail = sqlx::query_as::<_, AttemptDetail>(ATTEMPT_DETAIL_QUERY)
            .bind(attempt_id)
            .fetch_one(&mut *tx)
            .await?;
        let report = build(&detail);

        let report_id: i64 = sqlx::query_scalar(INSERT_REPORT_QUERY)
            .bind(report.user_assessment_id)
            .bind(report.user_id)
            .bind(report.assessment_id)
            .bind(report.score)
            .bind(report.completed_at)
            .bind(&report.title)
            .bind(&report.description)
            .bind(&report.feedback)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(skill_id) = skill_id {
            sqlx::query(
                r#"
                UPDATE skills SET
                    assessment_count = stats.cnt,
                    average_score = stats.avg
                FROM (
                    SELECT COUNT(ua.id) AS cnt, COALESCE(AVG(ua.score), 0)::DOUBLE PRECISION AS avg
                    FROM user_assessments ua
                    JOIN assessments a ON ua.assessment_id = a.id
                    WHERE a.skill_id = $1
                ) AS stats
                WHERE skills.id = $1
                "#,
            )
            .bind(skill_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Submission {
            user_assessment_id: attempt_id,
            report_id,
        })
    }

    async fn attempt_history(&self, user_id: i64) -> Result<Vec<AttemptSummary>, AppError> {
        let rows = sqlx::query_as::<_, AttemptSummary>(
            r#"
            SELECT
                ua.id,
                (SELECT MAX(ar.id) FROM assessment_reports ar WHERE ar.user_assessment_id = ua.id) AS report_id,
                a.title,
                ua.completed_at,
                ua.score
            FROM user_assessments ua
            JOIN assessments a ON ua.assessment_id = a.id
            WHERE ua.user_id = $1
            ORDER BY ua.completed_at DESC, ua.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_attempt_detail(&self, attempt_id: i64) -> Result<Option<AttemptDetail>, AppError> {
        let row = sqlx::query_as::<_, AttemptDetail>(ATTEMPT_DETAIL_QUERY)
            .bind(attempt_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn insert_report(&self, report: NewReport) -> Result<i64, AppError> {
        sqlx::query_scalar(INSERT_REPORT_QUERY)
            .bind(report.user_assessment_id)
            .bind(report.user_id)
            .bind(report.assessment_id)
            .bind(report.score)
            .bind(report.completed_at)
            .bind(&report.title)
            .bind(&report.description)
            .bind(&report.feedback)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::NotFound("Assessment attempt not found".to_string())
                } else {
                    tracing::debug!("Failed to insert report: {:?}", e);
                    AppError::from(e)
                }
            })
    }

    async fn find_report(&self, report_id: i64) -> Result<Option<Report>, AppError> {
        let row = sqlx::query_as::<_, Report>(
            r#"
            SELECT
                id, user_assessment_id, user_id, assessment_id, score,
                completed_at, title, description, feedback, created_at
            FROM assessment_reports
            WHERE id = $1
            "#,
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

fn push_skill_filter(
    builder: &mut QueryBuilder<'_, Postgres>,
    category: Option<&str>,
    search_pattern: Option<&str>,
) {
    if let Some(category) = category {
        builder.push(" AND category = ");
        builder.push_bind(category.to_string());
    }
    if let Some(pattern) = search_pattern {
        builder.push(" AND (name ILIKE ");
        builder.push_bind(pattern.to_string());
        builder.push(r" ESCAPE '\' OR description ILIKE ");
        builder.push_bind(pattern.to_string());
        builder.push(r" ESCAPE '\')");
    }
}

/// `%term%` with the LIKE metacharacters of `term` escaped, so the search
/// is a plain substring match.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
