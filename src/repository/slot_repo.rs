// ==========================================
// 课程排课系统 - 周循环时段数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（冲突检查在引擎层）
// ==========================================

use crate::domain::timetable::RecurringSlot;
use crate::domain::types::DayOfWeek;
use crate::repository::error::{
    format_time, parse_time_column, RepositoryError, RepositoryResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SLOT_COLUMNS: &str =
    "slot_id, class_id, day_of_week, start_time, end_time, teacher_id, room_id";

type SlotRow = (String, String, String, String, String, String, Option<String>);

fn read_slot_row(row: &Row<'_>) -> rusqlite::Result<SlotRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn slot_from_row(raw: SlotRow) -> RepositoryResult<RecurringSlot> {
    let (slot_id, class_id, day, start, end, teacher_id, room_id) = raw;
    let day_of_week = DayOfWeek::parse(&day).ok_or_else(|| RepositoryError::FieldValueError {
        field: "day_of_week".to_string(),
        message: format!("无效星期 '{}' (slot_id={})", day, slot_id),
    })?;
    Ok(RecurringSlot {
        start_time: parse_time_column(&start, "start_time")?,
        end_time: parse_time_column(&end, "end_time")?,
        slot_id,
        class_id,
        day_of_week,
        teacher_id,
        room_id,
    })
}

// ==========================================
// SlotRepository - 时段仓储
// ==========================================
pub struct SlotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SlotRepository {
    /// 创建新的SlotRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询班级的全部时段（按星期排序）
    pub fn find_by_class(&self, class_id: &str) -> RepositoryResult<Vec<RecurringSlot>> {
        let conn = self.get_conn()?;
        Self::find_by_class_tx(&conn, class_id)
    }

    /// 按ID查询时段
    pub fn find_by_id(&self, slot_id: &str) -> RepositoryResult<Option<RecurringSlot>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, slot_id)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    pub fn find_by_class_tx(
        conn: &Connection,
        class_id: &str,
    ) -> RepositoryResult<Vec<RecurringSlot>> {
        let sql = format!(
            "SELECT {} FROM recurring_slot WHERE class_id = ?1",
            SLOT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![class_id], read_slot_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut slots = rows
            .into_iter()
            .map(slot_from_row)
            .collect::<RepositoryResult<Vec<_>>>()?;
        slots.sort_by_key(|s| (s.day_of_week, s.start_time));
        Ok(slots)
    }

    pub fn find_by_id_tx(conn: &Connection, slot_id: &str) -> RepositoryResult<Option<RecurringSlot>> {
        let sql = format!("SELECT {} FROM recurring_slot WHERE slot_id = ?1", SLOT_COLUMNS);
        let row = conn
            .query_row(&sql, params![slot_id], read_slot_row)
            .optional()?;
        row.map(slot_from_row).transpose()
    }

    /// 查询某星期的全部时段（跨班级，用于教师/教室冲突检查）
    pub fn find_by_day_tx(
        conn: &Connection,
        day: DayOfWeek,
    ) -> RepositoryResult<Vec<RecurringSlot>> {
        let sql = format!(
            "SELECT {} FROM recurring_slot WHERE day_of_week = ?1 ORDER BY start_time",
            SLOT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![day.to_db_str()], read_slot_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(slot_from_row).collect()
    }

    /// 插入或更新时段
    pub fn upsert_tx(conn: &Connection, slot: &RecurringSlot) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO recurring_slot (
                    slot_id, class_id, day_of_week, start_time, end_time, teacher_id, room_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(slot_id) DO UPDATE SET
                    class_id = excluded.class_id,
                    day_of_week = excluded.day_of_week,
                    start_time = excluded.start_time,
                    end_time = excluded.end_time,
                    teacher_id = excluded.teacher_id,
                    room_id = excluded.room_id,
                    updated_at = datetime('now')"#,
            params![
                slot.slot_id,
                slot.class_id,
                slot.day_of_week.to_db_str(),
                format_time(slot.start_time),
                format_time(slot.end_time),
                slot.teacher_id,
                slot.room_id,
            ],
        )?;
        Ok(())
    }

    /// 删除时段
    pub fn delete_tx(conn: &Connection, slot_id: &str) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "DELETE FROM recurring_slot WHERE slot_id = ?1",
            params![slot_id],
        )?;
        Ok(rows)
    }

    /// 用给定时段集合替换班级课表
    pub fn replace_for_class_tx(
        conn: &Connection,
        class_id: &str,
        slots: &[RecurringSlot],
    ) -> RepositoryResult<usize> {
        conn.execute(
            "DELETE FROM recurring_slot WHERE class_id = ?1",
            params![class_id],
        )?;
        for slot in slots {
            Self::upsert_tx(conn, slot)?;
        }
        Ok(slots.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn make_slot(id: &str, class_id: &str, day: DayOfWeek) -> RecurringSlot {
        RecurringSlot {
            slot_id: id.to_string(),
            class_id: class_id.to_string(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            teacher_id: "T1".to_string(),
            room_id: Some("R1".to_string()),
        }
    }

    #[test]
    fn test_upsert_and_find_sorted_by_day() {
        let conn = setup_test_db();
        let repo = SlotRepository::new(conn.clone());
        {
            let guard = conn.lock().unwrap();
            SlotRepository::upsert_tx(&guard, &make_slot("S2", "C1", DayOfWeek::Wednesday)).unwrap();
            SlotRepository::upsert_tx(&guard, &make_slot("S1", "C1", DayOfWeek::Monday)).unwrap();
        }
        let slots = repo.find_by_class("C1").unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].day_of_week, DayOfWeek::Monday);
        assert_eq!(slots[1].slot_id, "S2");
    }

    #[test]
    fn test_one_slot_per_day_per_class() {
        let conn = setup_test_db();
        let guard = conn.lock().unwrap();
        SlotRepository::upsert_tx(&guard, &make_slot("S1", "C1", DayOfWeek::Monday)).unwrap();
        let result = SlotRepository::upsert_tx(&guard, &make_slot("S2", "C1", DayOfWeek::Monday));
        assert!(matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))));
    }

    #[test]
    fn test_find_by_day_spans_classes() {
        let conn = setup_test_db();
        let guard = conn.lock().unwrap();
        SlotRepository::upsert_tx(&guard, &make_slot("S1", "C1", DayOfWeek::Monday)).unwrap();
        SlotRepository::upsert_tx(&guard, &make_slot("S2", "C2", DayOfWeek::Monday)).unwrap();
        SlotRepository::upsert_tx(&guard, &make_slot("S3", "C2", DayOfWeek::Friday)).unwrap();
        let monday = SlotRepository::find_by_day_tx(&guard, DayOfWeek::Monday).unwrap();
        assert_eq!(monday.len(), 2);
    }
}
