use std::{future::Future, str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{FromRow, MySqlPool};

use crate::{
    error::StoreError,
    model::{
        attendance::{
            Approval, AttendanceEntry, AttendanceRecord, AttendanceStatus, NewRecord, ReadMarker,
        },
        role::{AdminAccount, Identity, IdentityKind, Role},
        student::{NewStudent, Student, StudentUpdate},
    },
    store::{RecordStore, StoreResult},
    utils::db_utils::{SqlValue, build_update_sql, execute_update},
};

const STUDENT_COLUMNS: &str = "id, rfid_uid, nis, name, student_class, password, role";
const RECORD_COLUMNS: &str = "id, student_id, timestamp, status, approved, is_read";
const ENTRY_SELECT: &str = r#"
    SELECT a.id, a.student_id, s.name, s.nis, s.student_class,
           a.status, a.timestamp, a.approved, a.is_read
    FROM attendance a
    JOIN students s ON a.student_id = s.id
"#;

#[derive(FromRow)]
struct StudentRow {
    id: u64,
    rfid_uid: String,
    nis: String,
    name: String,
    student_class: String,
    password: String,
    role: String,
}

impl TryFrom<StudentRow> for Student {
    type Error = StoreError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| StoreError::Corrupt(format!("student {} has role {:?}", row.id, row.role)))?;
        Ok(Student {
            id: row.id,
            rfid_uid: row.rfid_uid,
            nis: row.nis,
            name: row.name,
            student_class: row.student_class,
            password: row.password,
            role,
        })
    }
}

#[derive(FromRow)]
struct AdminRow {
    id: u64,
    username: String,
    password: String,
}

impl From<AdminRow> for AdminAccount {
    fn from(row: AdminRow) -> Self {
        AdminAccount {
            id: row.id,
            username: row.username,
            password: row.password,
        }
    }
}

#[derive(FromRow)]
struct RecordRow {
    id: u64,
    student_id: u64,
    timestamp: NaiveDateTime,
    status: String,
    approved: Option<i8>,
    is_read: i8,
}

fn parse_status(id: u64, status: &str) -> Result<AttendanceStatus, StoreError> {
    AttendanceStatus::from_str(status)
        .map_err(|_| StoreError::Corrupt(format!("attendance {} has status {:?}", id, status)))
}

impl TryFrom<RecordRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let read_marker = ReadMarker::from_column(row.is_read).ok_or_else(|| {
            StoreError::Corrupt(format!("attendance {} has is_read {}", row.id, row.is_read))
        })?;
        let approval = Approval::from_column(row.approved).ok_or_else(|| {
            StoreError::Corrupt(format!("attendance {} has approved {:?}", row.id, row.approved))
        })?;
        Ok(AttendanceRecord {
            id: row.id,
            student_id: row.student_id,
            timestamp: row.timestamp,
            status: parse_status(row.id, &row.status)?,
            approval,
            read_marker,
        })
    }
}

#[derive(FromRow)]
struct EntryRow {
    id: u64,
    student_id: u64,
    name: String,
    nis: String,
    student_class: String,
    status: String,
    timestamp: NaiveDateTime,
    approved: Option<i8>,
    is_read: i8,
}

impl TryFrom<EntryRow> for AttendanceEntry {
    type Error = StoreError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(AttendanceEntry {
            status: parse_status(row.id, &row.status)?,
            id: row.id,
            student_id: row.student_id,
            name: row.name,
            nis: row.nis,
            student_class: row.student_class,
            timestamp: row.timestamp,
            approved: row.approved,
            is_read: row.is_read,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = day.and_time(NaiveTime::MIN);
    let end = day
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MAX);
    (start, end)
}

fn map_duplicate(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") {
            return StoreError::Duplicate(what.to_string());
        }
    }
    e.into()
}

/// [`RecordStore`] backed by MySQL. Every call is bounded by `timeout`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    timeout: Duration,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Err(StoreError::Query(sqlx::Error::PoolTimedOut))) => Err(StoreError::Timeout),
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }

    async fn record_exists(&self, id: u64) -> StoreResult<bool> {
        self.bounded(async {
            let found = sqlx::query_scalar::<_, i64>(
                "SELECT EXISTS(SELECT 1 FROM attendance WHERE id = ?)",
            )
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            Ok::<_, StoreError>(found != 0)
        })
        .await
    }

    async fn fetch_student(&self, column: &str, value: StudentKey<'_>) -> StoreResult<Option<Student>> {
        let sql = format!("SELECT {} FROM students WHERE {} = ?", STUDENT_COLUMNS, column);
        self.bounded(async {
            let query = sqlx::query_as::<_, StudentRow>(&sql);
            let query = match value {
                StudentKey::Id(id) => query.bind(id),
                StudentKey::Text(text) => query.bind(text),
            };
            query.fetch_optional(&self.pool).await?.map(Student::try_from).transpose()
        })
        .await
    }

    async fn fetch_entries(&self, sql: String, day: Option<NaiveDate>) -> StoreResult<Vec<AttendanceEntry>> {
        self.bounded(async {
            let mut query = sqlx::query_as::<_, EntryRow>(&sql);
            if let Some(day) = day {
                let (start, end) = day_bounds(day);
                query = query.bind(start).bind(end);
            }
            collect(query.fetch_all(&self.pool).await?)
        })
        .await
    }
}

enum StudentKey<'a> {
    Id(u64),
    Text(&'a str),
}

#[async_trait]
impl RecordStore for MySqlStore {
    async fn find_student(&self, id: u64) -> StoreResult<Option<Student>> {
        self.fetch_student("id", StudentKey::Id(id)).await
    }

    async fn find_student_by_badge(&self, rfid_uid: &str) -> StoreResult<Option<Student>> {
        self.fetch_student("rfid_uid", StudentKey::Text(rfid_uid)).await
    }

    async fn find_student_by_nis(&self, nis: &str) -> StoreResult<Option<Student>> {
        self.fetch_student("nis", StudentKey::Text(nis)).await
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<AdminAccount>> {
        self.bounded(async {
            let row = sqlx::query_as::<_, AdminRow>(
                "SELECT id, username, password FROM admin WHERE username = ?",
            )
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, StoreError>(row.map(AdminAccount::from))
        })
        .await
    }

    async fn find_identity(&self, kind: IdentityKind, id: u64) -> StoreResult<Option<Identity>> {
        match kind {
            IdentityKind::Student => Ok(self.find_student(id).await?.map(Identity::Student)),
            IdentityKind::Admin => {
                self.bounded(async {
                    let row = sqlx::query_as::<_, AdminRow>(
                        "SELECT id, username, password FROM admin WHERE id = ?",
                    )
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
                    Ok::<_, StoreError>(row.map(|r| Identity::Admin(r.into())))
                })
                .await
            }
        }
    }

    async fn list_students(&self) -> StoreResult<Vec<Student>> {
        let sql = format!("SELECT {} FROM students ORDER BY name ASC", STUDENT_COLUMNS);
        self.bounded(async {
            collect(sqlx::query_as::<_, StudentRow>(&sql).fetch_all(&self.pool).await?)
        })
        .await
    }

    async fn create_student(&self, student: NewStudent) -> StoreResult<u64> {
        self.bounded(async {
            let result = sqlx::query(
                r#"
                INSERT INTO students (rfid_uid, nis, name, student_class, password, role)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&student.rfid_uid)
            .bind(&student.nis)
            .bind(&student.name)
            .bind(&student.student_class)
            .bind(&student.password)
            .bind(student.role.as_ref())
            .execute(&self.pool)
            .await
            .map_err(|e| map_duplicate(e, "RFID UID or NIS"))?;
            Ok::<_, StoreError>(result.last_insert_id())
        })
        .await
    }

    async fn update_student(&self, id: u64, update: StudentUpdate) -> StoreResult<bool> {
        let mut fields = vec![
            ("nis", SqlValue::String(update.nis)),
            ("name", SqlValue::String(update.name)),
            ("student_class", SqlValue::String(update.student_class)),
            ("role", SqlValue::String(update.role.to_string())),
        ];
        if let Some(password) = update.password {
            fields.push(("password", SqlValue::String(password)));
        }
        let Some(sql_update) = build_update_sql("students", fields, "id", id) else {
            return Ok(false);
        };

        let affected = self
            .bounded(async {
                execute_update(&self.pool, sql_update)
                    .await
                    .map_err(|e| map_duplicate(e, "NIS"))
            })
            .await?;
        if affected > 0 {
            return Ok(true);
        }
        // MySQL reports 0 rows when the values did not change.
        Ok(self.find_student(id).await?.is_some())
    }

    async fn delete_student(&self, id: u64) -> StoreResult<bool> {
        self.bounded(async {
            let result = sqlx::query("DELETE FROM students WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(result.rows_affected() > 0)
        })
        .await
    }

    async fn last_scan_on(
        &self,
        student_id: u64,
        day: NaiveDate,
    ) -> StoreResult<Option<AttendanceStatus>> {
        let (start, end) = day_bounds(day);
        self.bounded(async {
            let status = sqlx::query_scalar::<_, String>(
                r#"
                SELECT status FROM attendance
                WHERE student_id = ?
                  AND timestamp >= ? AND timestamp < ?
                  AND status IN ('masuk', 'keluar')
                ORDER BY timestamp DESC, id DESC
                LIMIT 1
                "#,
            )
            .bind(student_id)
            .bind(start)
            .bind(end)
            .fetch_optional(&self.pool)
            .await?;
            status.map(|s| parse_status(student_id, &s)).transpose()
        })
        .await
    }

    async fn insert_record(&self, record: NewRecord) -> StoreResult<u64> {
        self.bounded(async {
            let result = sqlx::query(
                r#"
                INSERT INTO attendance (student_id, timestamp, status, approved, is_read)
                VALUES (?, ?, ?, ?, 0)
                "#,
            )
            .bind(record.student_id)
            .bind(record.timestamp)
            .bind(record.status.as_ref())
            .bind(record.approval.to_column())
            .execute(&self.pool)
            .await?;
            Ok::<_, StoreError>(result.last_insert_id())
        })
        .await
    }

    async fn find_record(&self, id: u64) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!("SELECT {} FROM attendance WHERE id = ?", RECORD_COLUMNS);
        self.bounded(async {
            sqlx::query_as::<_, RecordRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .map(AttendanceRecord::try_from)
                .transpose()
        })
        .await
    }

    async fn apply_decision(
        &self,
        id: u64,
        approval: Approval,
        status: AttendanceStatus,
    ) -> StoreResult<bool> {
        self.bounded(async {
            let result = sqlx::query(
                r#"
                UPDATE attendance
                SET approved = ?, status = ?
                WHERE id = ?
                  AND approved IS NULL
                  AND status IN ('izin', 'sakit')
                "#,
            )
            .bind(approval.to_column())
            .bind(status.as_ref())
            .bind(id)
            .execute(&self.pool)
            .await?;
            Ok::<_, StoreError>(result.rows_affected() > 0)
        })
        .await
    }

    async fn mark_read(&self, id: u64) -> StoreResult<bool> {
        let affected = self
            .bounded(async {
                let result = sqlx::query("UPDATE attendance SET is_read = 1 WHERE id = ?")
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
                Ok::<_, StoreError>(result.rows_affected())
            })
            .await?;
        if affected > 0 {
            return Ok(true);
        }
        self.record_exists(id).await
    }

    async fn mark_all_read(&self) -> StoreResult<u64> {
        self.bounded(async {
            let result = sqlx::query(
                "UPDATE attendance SET is_read = 1 WHERE is_read = 0 AND status IN ('izin', 'sakit')",
            )
            .execute(&self.pool)
            .await?;
            Ok::<_, StoreError>(result.rows_affected())
        })
        .await
    }

    async fn clear_read(&self) -> StoreResult<u64> {
        self.bounded(async {
            let result =
                sqlx::query("UPDATE attendance SET is_read = 2 WHERE is_read = 1 AND approved = 1")
                    .execute(&self.pool)
                    .await?;
            Ok::<_, StoreError>(result.rows_affected())
        })
        .await
    }

    async fn records_for_student(&self, student_id: u64) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE student_id = ? ORDER BY timestamp DESC, id DESC",
            RECORD_COLUMNS
        );
        self.bounded(async {
            collect(
                sqlx::query_as::<_, RecordRow>(&sql)
                    .bind(student_id)
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    async fn records_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        student_id: Option<u64>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let mut sql = format!(
            "SELECT {} FROM attendance WHERE timestamp >= ? AND timestamp < ?",
            RECORD_COLUMNS
        );
        if student_id.is_some() {
            sql.push_str(" AND student_id = ?");
        }
        sql.push_str(" ORDER BY timestamp ASC, id ASC");

        self.bounded(async {
            let mut query = sqlx::query_as::<_, RecordRow>(&sql).bind(from).bind(to);
            if let Some(student_id) = student_id {
                query = query.bind(student_id);
            }
            collect(query.fetch_all(&self.pool).await?)
        })
        .await
    }

    async fn entries_on(&self, day: NaiveDate) -> StoreResult<Vec<AttendanceEntry>> {
        let sql = format!(
            "{} WHERE a.timestamp >= ? AND a.timestamp < ? ORDER BY a.timestamp DESC, a.id DESC",
            ENTRY_SELECT
        );
        self.fetch_entries(sql, Some(day)).await
    }

    async fn unread_notifications(&self) -> StoreResult<Vec<AttendanceEntry>> {
        let sql = format!(
            "{} WHERE a.status IN ('izin', 'sakit') AND a.is_read = 0 ORDER BY a.timestamp DESC, a.id DESC",
            ENTRY_SELECT
        );
        self.fetch_entries(sql, None).await
    }

    async fn pending_requests(&self) -> StoreResult<Vec<AttendanceEntry>> {
        let sql = format!(
            "{} WHERE a.status IN ('izin', 'sakit') AND a.approved IS NULL ORDER BY a.timestamp DESC, a.id DESC",
            ENTRY_SELECT
        );
        self.fetch_entries(sql, None).await
    }
}
