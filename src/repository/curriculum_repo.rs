// ==========================================
// 课程排课系统 - 课纲数据仓储
// ==========================================

use crate::domain::curriculum::{Curriculum, CurriculumUnit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// CurriculumRepository - 课纲仓储
// ==========================================
pub struct CurriculumRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CurriculumRepository {
    /// 创建新的CurriculumRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存课纲（单元整体替换，单事务）
    pub fn save(&self, curriculum: &Curriculum) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        Self::save_tx(&tx, curriculum)?;
        tx.commit()?;
        Ok(())
    }

    /// 在调用方事务中保存课纲
    pub fn save_tx(conn: &Connection, curriculum: &Curriculum) -> RepositoryResult<()> {
        curriculum.validate().map_err(RepositoryError::ValidationError)?;

        conn.execute(
            r#"INSERT INTO curriculum (curriculum_id, name) VALUES (?1, ?2)
               ON CONFLICT(curriculum_id) DO UPDATE SET
                   name = excluded.name,
                   updated_at = datetime('now')"#,
            params![curriculum.curriculum_id, curriculum.name],
        )?;
        conn.execute(
            "DELETE FROM curriculum_unit WHERE curriculum_id = ?1",
            params![curriculum.curriculum_id],
        )?;
        let mut stmt = conn.prepare(
            r#"INSERT INTO curriculum_unit (
                    unit_id, curriculum_id, sequence_number, title, objectives, body, resources_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )?;
        for unit in &curriculum.units {
            stmt.execute(params![
                unit.unit_id,
                curriculum.curriculum_id,
                unit.sequence_number,
                unit.title,
                unit.objectives,
                unit.body,
                serde_json::to_string(&unit.resources)?,
            ])?;
        }
        Ok(())
    }

    /// 更新单个课纲单元内容（序号不变）
    pub fn update_unit(&self, unit: &CurriculumUnit) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"UPDATE curriculum_unit SET
                   title = ?2, objectives = ?3, body = ?4, resources_json = ?5
               WHERE unit_id = ?1"#,
            params![
                unit.unit_id,
                unit.title,
                unit.objectives,
                unit.body,
                serde_json::to_string(&unit.resources)?,
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "curriculum_unit".to_string(),
                id: unit.unit_id.clone(),
            });
        }
        Ok(())
    }

    /// 按ID查询课纲（含单元）
    pub fn find_by_id(&self, curriculum_id: &str) -> RepositoryResult<Option<Curriculum>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, curriculum_id)
    }

    pub fn find_by_id_tx(
        conn: &Connection,
        curriculum_id: &str,
    ) -> RepositoryResult<Option<Curriculum>> {
        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM curriculum WHERE curriculum_id = ?1",
                params![curriculum_id],
                |row| row.get(0),
            )
            .optional()?;

        let name = match name {
            Some(n) => n,
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(
            r#"SELECT unit_id, curriculum_id, sequence_number, title, objectives, body, resources_json
               FROM curriculum_unit
               WHERE curriculum_id = ?1
               ORDER BY sequence_number"#,
        )?;
        let units = stmt
            .query_map(params![curriculum_id], |row| {
                let resources_json: String = row.get(6)?;
                Ok(CurriculumUnit {
                    unit_id: row.get(0)?,
                    curriculum_id: row.get(1)?,
                    sequence_number: row.get(2)?,
                    title: row.get(3)?,
                    objectives: row.get(4)?,
                    body: row.get(5)?,
                    resources: serde_json::from_str(&resources_json).unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(Curriculum {
            curriculum_id: curriculum_id.to_string(),
            name,
            units,
        }))
    }
}
