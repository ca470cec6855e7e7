// ==========================================
// 课程排课系统 - 班级排课目标数据仓储
// ==========================================

use crate::domain::timetable::ClassTarget;
use crate::repository::error::{format_date, parse_date_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ClassTargetRepository - 班级目标仓储
// ==========================================
pub struct ClassTargetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClassTargetRepository {
    /// 创建新的ClassTargetRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find(&self, class_id: &str) -> RepositoryResult<Option<ClassTarget>> {
        let conn = self.get_conn()?;
        Self::find_tx(&conn, class_id)
    }

    pub fn find_tx(conn: &Connection, class_id: &str) -> RepositoryResult<Option<ClassTarget>> {
        let row = conn
            .query_row(
                r#"SELECT class_id, total_sessions, start_date, curriculum_id
                   FROM class_schedule WHERE class_id = ?1"#,
                params![class_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i32>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((class_id, total_sessions, start_date, curriculum_id)) => Ok(Some(ClassTarget {
                class_id,
                total_sessions,
                start_date: parse_date_column(&start_date, "start_date")?,
                curriculum_id,
            })),
            None => Ok(None),
        }
    }

    /// 查询班级目标，不存在时返回 NotFound
    pub fn get_tx(conn: &Connection, class_id: &str) -> RepositoryResult<ClassTarget> {
        Self::find_tx(conn, class_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "class_schedule".to_string(),
            id: class_id.to_string(),
        })
    }

    pub fn upsert_tx(conn: &Connection, target: &ClassTarget) -> RepositoryResult<()> {
        if target.total_sessions < 0 {
            return Err(RepositoryError::FieldValueError {
                field: "total_sessions".to_string(),
                message: format!("目标课次数不能为负: {}", target.total_sessions),
            });
        }
        conn.execute(
            r#"INSERT INTO class_schedule (class_id, total_sessions, start_date, curriculum_id)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(class_id) DO UPDATE SET
                   total_sessions = excluded.total_sessions,
                   start_date = excluded.start_date,
                   curriculum_id = excluded.curriculum_id,
                   updated_at = datetime('now')"#,
            params![
                target.class_id,
                target.total_sessions,
                format_date(target.start_date),
                target.curriculum_id,
            ],
        )?;
        Ok(())
    }
}
