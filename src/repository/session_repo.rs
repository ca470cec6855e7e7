// ==========================================
// 课程排课系统 - 课次数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: `*_tx` 关联函数接收调用方持有的连接/事务，
//       使一次排程修复内的所有读写落在同一事务中
// ==========================================

use crate::domain::session::Session;
use crate::domain::types::SessionStatus;
use crate::repository::error::{
    format_date, format_time, parse_date_column, parse_time_column, RepositoryError,
    RepositoryResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SESSION_COLUMNS: &str = r#"
    session_id, class_id, sequence_number, status,
    scheduled_date, start_time, end_time,
    slot_id, teacher_id, room_id,
    curriculum_unit_id, title, objectives, body, resources_json,
    cancellation_reason, calendar_event_id
"#;

/// 原始行（文本列尚未解析）
struct SessionRow {
    session_id: String,
    class_id: String,
    sequence_number: i32,
    status: String,
    scheduled_date: String,
    start_time: String,
    end_time: String,
    slot_id: Option<String>,
    teacher_id: Option<String>,
    room_id: Option<String>,
    curriculum_unit_id: Option<String>,
    title: String,
    objectives: Option<String>,
    body: Option<String>,
    resources_json: String,
    cancellation_reason: Option<String>,
    calendar_event_id: Option<String>,
}

impl SessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            session_id: row.get(0)?,
            class_id: row.get(1)?,
            sequence_number: row.get(2)?,
            status: row.get(3)?,
            scheduled_date: row.get(4)?,
            start_time: row.get(5)?,
            end_time: row.get(6)?,
            slot_id: row.get(7)?,
            teacher_id: row.get(8)?,
            room_id: row.get(9)?,
            curriculum_unit_id: row.get(10)?,
            title: row.get(11)?,
            objectives: row.get(12)?,
            body: row.get(13)?,
            resources_json: row.get(14)?,
            cancellation_reason: row.get(15)?,
            calendar_event_id: row.get(16)?,
        })
    }

    fn into_session(self) -> RepositoryResult<Session> {
        Ok(Session {
            scheduled_date: parse_date_column(&self.scheduled_date, "scheduled_date")?,
            start_time: parse_time_column(&self.start_time, "start_time")?,
            end_time: parse_time_column(&self.end_time, "end_time")?,
            status: SessionStatus::from_db_str(&self.status),
            resources: serde_json::from_str(&self.resources_json).unwrap_or_default(),
            session_id: self.session_id,
            class_id: self.class_id,
            sequence_number: self.sequence_number,
            slot_id: self.slot_id,
            teacher_id: self.teacher_id,
            room_id: self.room_id,
            curriculum_unit_id: self.curriculum_unit_id,
            title: self.title,
            objectives: self.objectives,
            body: self.body,
            cancellation_reason: self.cancellation_reason,
            calendar_event_id: self.calendar_event_id,
        })
    }
}

// ==========================================
// SessionRepository - 课次仓储
// ==========================================
pub struct SessionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SessionRepository {
    /// 创建新的SessionRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询班级的全部课次（含已取消）
    pub fn find_by_class(&self, class_id: &str) -> RepositoryResult<Vec<Session>> {
        let conn = self.get_conn()?;
        Self::find_by_class_tx(&conn, class_id)
    }

    /// 按ID查询课次
    pub fn find_by_id(&self, session_id: &str) -> RepositoryResult<Option<Session>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, session_id)
    }

    /// 写回外部日历条目ID（提交后由日历同步回调）
    pub fn set_calendar_event_id(
        &self,
        session_id: &str,
        calendar_event_id: Option<&str>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE lesson_session SET calendar_event_id = ?1 WHERE session_id = ?2",
            params![calendar_event_id, session_id],
        )?;
        Ok(rows)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    /// 查询班级的全部课次
    ///
    /// 排序: 有效序号在前（按序号、日期），序号为 0 的课次在后
    pub fn find_by_class_tx(conn: &Connection, class_id: &str) -> RepositoryResult<Vec<Session>> {
        let sql = format!(
            r#"SELECT {}
               FROM lesson_session
               WHERE class_id = ?1
               ORDER BY (sequence_number = 0), sequence_number, scheduled_date, start_time"#,
            SESSION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![class_id], SessionRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(SessionRow::into_session).collect()
    }

    /// 按ID查询课次
    pub fn find_by_id_tx(conn: &Connection, session_id: &str) -> RepositoryResult<Option<Session>> {
        let sql = format!(
            "SELECT {} FROM lesson_session WHERE session_id = ?1",
            SESSION_COLUMNS
        );
        let row = conn
            .query_row(&sql, params![session_id], SessionRow::from_row)
            .optional()?;

        row.map(SessionRow::into_session).transpose()
    }

    /// 插入课次
    pub fn insert_tx(conn: &Connection, session: &Session) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO lesson_session (
                    session_id, class_id, sequence_number, status,
                    scheduled_date, start_time, end_time,
                    slot_id, teacher_id, room_id,
                    curriculum_unit_id, title, objectives, body, resources_json,
                    cancellation_reason, calendar_event_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"#,
            params![
                session.session_id,
                session.class_id,
                session.sequence_number,
                session.status.to_db_str(),
                format_date(session.scheduled_date),
                format_time(session.start_time),
                format_time(session.end_time),
                session.slot_id,
                session.teacher_id,
                session.room_id,
                session.curriculum_unit_id,
                session.title,
                session.objectives,
                session.body,
                serde_json::to_string(&session.resources)?,
                session.cancellation_reason,
                session.calendar_event_id,
            ],
        )?;
        Ok(())
    }

    /// 全字段更新课次（calendar_event_id 除外）
    ///
    /// # 返回
    /// - Ok(rows): 受影响行数
    pub fn update_tx(conn: &Connection, session: &Session) -> RepositoryResult<usize> {
        let rows = conn.execute(
            r#"UPDATE lesson_session SET
                    sequence_number = ?2,
                    status = ?3,
                    scheduled_date = ?4,
                    start_time = ?5,
                    end_time = ?6,
                    slot_id = ?7,
                    teacher_id = ?8,
                    room_id = ?9,
                    curriculum_unit_id = ?10,
                    title = ?11,
                    objectives = ?12,
                    body = ?13,
                    resources_json = ?14,
                    cancellation_reason = ?15,
                    updated_at = datetime('now')
               WHERE session_id = ?1"#,
            params![
                session.session_id,
                session.sequence_number,
                session.status.to_db_str(),
                format_date(session.scheduled_date),
                format_time(session.start_time),
                format_time(session.end_time),
                session.slot_id,
                session.teacher_id,
                session.room_id,
                session.curriculum_unit_id,
                session.title,
                session.objectives,
                session.body,
                serde_json::to_string(&session.resources)?,
                session.cancellation_reason,
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "lesson_session".to_string(),
                id: session.session_id.clone(),
            });
        }
        Ok(rows)
    }

    /// 删除课次
    pub fn delete_tx(conn: &Connection, session_id: &str) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "DELETE FROM lesson_session WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(rows)
    }

    /// 班级是否已有课次
    pub fn exists_for_class_tx(conn: &Connection, class_id: &str) -> RepositoryResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM lesson_session WHERE class_id = ?1",
            params![class_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn make_session(id: &str, seq: i32, day: u32) -> Session {
        Session {
            session_id: id.to_string(),
            class_id: "C1".to_string(),
            sequence_number: seq,
            status: SessionStatus::Scheduled,
            scheduled_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            slot_id: Some("S1".to_string()),
            teacher_id: Some("T1".to_string()),
            room_id: None,
            curriculum_unit_id: None,
            title: format!("Lesson {}", seq),
            objectives: None,
            body: None,
            resources: vec!["slides.pdf".to_string()],
            cancellation_reason: None,
            calendar_event_id: None,
        }
    }

    #[test]
    fn test_insert_and_find_by_class_orders_cancelled_last() {
        let conn = setup_test_db();
        let repo = SessionRepository::new(conn.clone());
        {
            let guard = conn.lock().unwrap();
            let mut cancelled = make_session("s0", 0, 1);
            cancelled.status = SessionStatus::Cancelled;
            SessionRepository::insert_tx(&guard, &cancelled).unwrap();
            SessionRepository::insert_tx(&guard, &make_session("s2", 2, 15)).unwrap();
            SessionRepository::insert_tx(&guard, &make_session("s1", 1, 8)).unwrap();
        }

        let sessions = repo.find_by_class("C1").unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s0"]);
        assert_eq!(sessions[0].resources, vec!["slides.pdf".to_string()]);
        assert_eq!(sessions[0].start_time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    }

    #[test]
    fn test_update_missing_row_is_not_found() {
        let conn = setup_test_db();
        let guard = conn.lock().unwrap();
        let result = SessionRepository::update_tx(&guard, &make_session("missing", 1, 1));
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[test]
    fn test_set_calendar_event_id() {
        let conn = setup_test_db();
        let repo = SessionRepository::new(conn.clone());
        {
            let guard = conn.lock().unwrap();
            SessionRepository::insert_tx(&guard, &make_session("s1", 1, 1)).unwrap();
        }
        repo.set_calendar_event_id("s1", Some("evt-1")).unwrap();
        let found = repo.find_by_id("s1").unwrap().unwrap();
        assert_eq!(found.calendar_event_id.as_deref(), Some("evt-1"));
    }
}
