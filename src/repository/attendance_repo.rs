// ==========================================
// 课程排课系统 - 考勤只读仓储
// ==========================================
// 说明: session_attendance 由外部考勤模块维护，本仓储只读
// 注意: 排程 API 在持有主连接事务期间查询考勤，
//       因此本仓储应使用独立连接（`new(db_path)`），不要与主连接共用同一把锁
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 单条 IN 查询的参数上限（SQLite 默认变量上限 999）
const IN_CLAUSE_CHUNK: usize = 500;

// ==========================================
// AttendanceRepository - 考勤仓储（只读）
// ==========================================
pub struct AttendanceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AttendanceRepository {
    /// 使用独立连接打开考勤仓储
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 课次是否已有考勤
    pub fn has_attendance(&self, session_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM session_attendance WHERE session_id = ?1",
            [session_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 在给定课次中筛选出已有考勤的课次ID
    pub fn find_attended(&self, session_ids: &[String]) -> RepositoryResult<HashSet<String>> {
        let mut attended = HashSet::new();
        if session_ids.is_empty() {
            return Ok(attended);
        }

        let conn = self.get_conn()?;
        for chunk in session_ids.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT DISTINCT session_id FROM session_attendance WHERE session_id IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params_from_iter(chunk.iter()), |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            attended.extend(ids);
        }

        Ok(attended)
    }
}
