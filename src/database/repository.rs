use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Attendance, Employee, NewAttendance, NewUser, User};

/// Rows returned by history reads when the caller gives no usable limit.
pub const DEFAULT_HISTORY_LIMIT: i64 = 30;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let message = match db_err.constraint() {
                    Some(c) if c.contains("email") => "email already registered",
                    Some(c) if c.contains("username") => "username already taken",
                    _ => "record already exists",
                };
                return RepositoryError::Conflict(message.to_string());
            }
        }
        RepositoryError::Sqlx(err)
    }
}

/// Filters for a caller's attendance history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub date: Option<NaiveDate>,
    pub limit: i64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            date: None,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user and its employee record in one transaction.
    async fn create_with_employee(&self, user: NewUser) -> Result<(User, Employee), RepositoryError>;

    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_id(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<User>, RepositoryError>;

    /// Translate a token-carried user id into the tenant's active employee record.
    async fn find_employee(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<Employee>, RepositoryError>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn insert(&self, record: NewAttendance) -> Result<Attendance, RepositoryError>;

    /// Newest first, bounded by `query.limit`.
    async fn list_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        query: HistoryQuery,
    ) -> Result<Vec<Attendance>, RepositoryError>;
}

const USER_COLUMNS: &str = r#"
    id, tenant_id, username, email, password_hash, role, full_name,
    phone, avatar_url, is_active, created_at, updated_at
"#;

const EMPLOYEE_COLUMNS: &str = r#"
    id, tenant_id, user_id, employee_code, position, department,
    is_active, created_at, updated_at
"#;

const ATTENDANCE_COLUMNS: &str = r#"
    id, tenant_id, user_id, type, status, latitude, longitude,
    photo_selfie, in_range, force_attendance, created_at
"#;

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_with_employee(&self, user: NewUser) -> Result<(User, Employee), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let insert_user = format!(
            r#"
            INSERT INTO users (tenant_id, username, email, password_hash, role, full_name, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let created: User = sqlx::query_as(&insert_user)
            .bind(user.tenant_id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.role)
            .bind(&user.full_name)
            .bind(&user.phone)
            .fetch_one(&mut *tx)
            .await?;

        let insert_employee = format!(
            r#"
            INSERT INTO employees (tenant_id, user_id, employee_code)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        );
        let employee: Employee = sqlx::query_as(&insert_employee)
            .bind(created.tenant_id)
            .bind(created.id)
            .bind(Employee::code_for(created.id))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((created, employee))
    }

    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> Result<Option<User>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM users WHERE tenant_id = $1 AND LOWER(email) = LOWER($2)",
            USER_COLUMNS
        );
        let user = sqlx::query_as(&query)
            .bind(tenant_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {} FROM users WHERE tenant_id = $1 AND id = $2", USER_COLUMNS);
        let user = sqlx::query_as(&query)
            .bind(tenant_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_employee(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<Employee>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM employees WHERE tenant_id = $1 AND user_id = $2 AND is_active = TRUE",
            EMPLOYEE_COLUMNS
        );
        let employee = sqlx::query_as(&query)
            .bind(tenant_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }
}

#[derive(Clone, Debug)]
pub struct PgAttendanceRepository {
    pool: PgPool,
}

impl PgAttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    async fn insert(&self, record: NewAttendance) -> Result<Attendance, RepositoryError> {
        let query = format!(
            r#"
            INSERT INTO attendances
                (tenant_id, user_id, type, status, latitude, longitude,
                 photo_selfie, in_range, force_attendance, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            RETURNING {}
            "#,
            ATTENDANCE_COLUMNS
        );
        let attendance = sqlx::query_as(&query)
            .bind(record.tenant_id)
            .bind(record.user_id)
            .bind(record.kind.as_str())
            .bind(record.status.as_str())
            .bind(record.latitude)
            .bind(record.longitude)
            .bind(&record.photo_selfie)
            .bind(record.in_range)
            .bind(record.force_attendance)
            .fetch_one(&self.pool)
            .await?;
        Ok(attendance)
    }

    async fn list_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        query: HistoryQuery,
    ) -> Result<Vec<Attendance>, RepositoryError> {
        let rows = match query.date {
            // Calendar date in the session `TimeZone` (DB_TIMEZONE)
            Some(date) => {
                let sql = format!(
                    r#"
                    SELECT {} FROM attendances
                    WHERE tenant_id = $1 AND user_id = $2 AND created_at::date = $3
                    ORDER BY created_at DESC
                    LIMIT $4
                    "#,
                    ATTENDANCE_COLUMNS
                );
                sqlx::query_as(&sql)
                    .bind(tenant_id)
                    .bind(user_id)
                    .bind(date)
                    .bind(query.limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    r#"
                    SELECT {} FROM attendances
                    WHERE tenant_id = $1 AND user_id = $2
                    ORDER BY created_at DESC
                    LIMIT $3
                    "#,
                    ATTENDANCE_COLUMNS
                );
                sqlx::query_as(&sql)
                    .bind(tenant_id)
                    .bind(user_id)
                    .bind(query.limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }
}
