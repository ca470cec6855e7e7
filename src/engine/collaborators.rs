// ==========================================
// 课程排课系统 - 只读外部协作方
// ==========================================
// 职责: 考勤存储、教师/教室目录的 trait 定义与默认实现
// 红线: 引擎从不写考勤
// ==========================================

use crate::repository::AttendanceRepository;
use std::collections::HashSet;
use std::error::Error;
use std::sync::Mutex;

// ==========================================
// 考勤存储
// ==========================================

/// 考勤存储（只读）
///
/// 排程 API 在事务内查询，实现方不得与主连接共用同一把锁
pub trait AttendanceStore: Send + Sync {
    fn has_attendance(&self, session_id: &str) -> Result<bool, Box<dyn Error + Send + Sync>>;

    /// 批量筛选已考勤课次
    fn attended_among(
        &self,
        session_ids: &[String],
    ) -> Result<HashSet<String>, Box<dyn Error + Send + Sync>> {
        let mut attended = HashSet::new();
        for id in session_ids {
            if self.has_attendance(id)? {
                attended.insert(id.clone());
            }
        }
        Ok(attended)
    }
}

impl AttendanceStore for AttendanceRepository {
    fn has_attendance(&self, session_id: &str) -> Result<bool, Box<dyn Error + Send + Sync>> {
        Ok(AttendanceRepository::has_attendance(self, session_id)?)
    }

    fn attended_among(
        &self,
        session_ids: &[String],
    ) -> Result<HashSet<String>, Box<dyn Error + Send + Sync>> {
        Ok(self.find_attended(session_ids)?)
    }
}

/// 内存考勤存储（测试与无考勤模块部署）
#[derive(Debug, Default)]
pub struct InMemoryAttendanceStore {
    attended: Mutex<HashSet<String>>,
}

impl InMemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_attended(&self, session_id: &str) {
        if let Ok(mut set) = self.attended.lock() {
            set.insert(session_id.to_string());
        }
    }

    pub fn clear(&self, session_id: &str) {
        if let Ok(mut set) = self.attended.lock() {
            set.remove(session_id);
        }
    }
}

impl AttendanceStore for InMemoryAttendanceStore {
    fn has_attendance(&self, session_id: &str) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let set = self
            .attended
            .lock()
            .map_err(|e| format!("考勤存储锁获取失败: {}", e))?;
        Ok(set.contains(session_id))
    }
}

// ==========================================
// 教师/教室目录
// ==========================================

/// 教师/教室目录（只读，供时段冲突检查）
pub trait TeacherRoomDirectory: Send + Sync {
    fn teacher_exists(&self, teacher_id: &str) -> bool;

    fn room_exists(&self, room_id: &str) -> bool;
}

/// 未接入目录时的默认实现：全部视为存在
#[derive(Debug, Clone, Default)]
pub struct AcceptAllDirectory;

impl TeacherRoomDirectory for AcceptAllDirectory {
    fn teacher_exists(&self, _teacher_id: &str) -> bool {
        true
    }

    fn room_exists(&self, _room_id: &str) -> bool {
        true
    }
}

/// 固定名单目录
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    pub teachers: HashSet<String>,
    pub rooms: HashSet<String>,
}

impl StaticDirectory {
    pub fn new<T, R>(teachers: T, rooms: R) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            teachers: teachers.into_iter().map(Into::into).collect(),
            rooms: rooms.into_iter().map(Into::into).collect(),
        }
    }
}

impl TeacherRoomDirectory for StaticDirectory {
    fn teacher_exists(&self, teacher_id: &str) -> bool {
        self.teachers.contains(teacher_id)
    }

    fn room_exists(&self, room_id: &str) -> bool {
        self.rooms.contains(room_id)
    }
}
