// ==========================================
// 课程排课系统 - 课次领域模型
// ==========================================
// 红线: sequence_number = 0 表示已取消/脱离序列，不计入目标课次
// 红线: 已取消课次不得关联课纲单元
// ==========================================

use crate::domain::curriculum::CurriculumUnit;
use crate::domain::timetable::RecurringSlot;
use crate::domain::types::SessionStatus;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Session - 课次
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    // ===== 主键 / 归属 =====
    pub session_id: String,                  // 课次ID
    pub class_id: String,                    // 所属班级

    // ===== 排序与状态 =====
    pub sequence_number: i32,                // 序号 (0 = 不计入目标)
    pub status: SessionStatus,               // 状态

    // ===== 时间 (创建时从时段复制，之后可独立修改) =====
    pub scheduled_date: NaiveDate,           // 上课日期
    pub start_time: NaiveTime,               // 开始时间
    pub end_time: NaiveTime,                 // 结束时间
    pub slot_id: Option<String>,             // 关联时段
    pub teacher_id: Option<String>,          // 授课教师 (随时段复制)
    pub room_id: Option<String>,             // 教室 (随时段复制)

    // ===== 课纲内容 (创建/同步时从单元镜像) =====
    pub curriculum_unit_id: Option<String>,  // 关联课纲单元
    pub title: String,                       // 标题
    pub objectives: Option<String>,          // 教学目标
    pub body: Option<String>,                // 正文
    pub resources: Vec<String>,              // 资源引用

    // ===== 其他 =====
    pub cancellation_reason: Option<String>, // 取消原因
    pub calendar_event_id: Option<String>,   // 外部日历条目ID
}

impl Session {
    /// 是否为有效课次（未取消且计入目标）
    pub fn is_valid(&self) -> bool {
        self.status != SessionStatus::Cancelled && self.sequence_number > 0
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == SessionStatus::Cancelled
    }

    /// 排序键: (日期, 开始时间)
    pub fn schedule_key(&self) -> (NaiveDate, NaiveTime) {
        (self.scheduled_date, self.start_time)
    }

    /// 将时段信息写入课次（时间、教师、教室、时段关联）
    pub fn attach_slot(&mut self, slot: &RecurringSlot) {
        self.slot_id = Some(slot.slot_id.clone());
        self.start_time = slot.start_time;
        self.end_time = slot.end_time;
        self.teacher_id = Some(slot.teacher_id.clone());
        self.room_id = slot.room_id.clone();
    }

    /// 镜像课纲单元内容
    pub fn apply_unit(&mut self, unit: &CurriculumUnit) {
        self.curriculum_unit_id = Some(unit.unit_id.clone());
        self.title = unit.title.clone();
        self.objectives = unit.objectives.clone();
        self.body = unit.body.clone();
        self.resources = unit.resources.clone();
    }

    /// 无课纲单元时的默认内容（"{前缀} {序号}"）
    pub fn apply_default_content(&mut self, title_prefix: &str) {
        self.curriculum_unit_id = None;
        self.title = default_title(title_prefix, self.sequence_number);
        self.objectives = None;
        self.body = None;
        self.resources = Vec::new();
    }

    /// 清空课纲关联与内容字段
    pub fn clear_content(&mut self) {
        self.curriculum_unit_id = None;
        self.title = String::new();
        self.objectives = None;
        self.body = None;
        self.resources = Vec::new();
    }

    /// 与另一版本相比，外部日历可见字段是否发生变化
    pub fn calendar_fields_differ(&self, other: &Session) -> bool {
        self.scheduled_date != other.scheduled_date
            || self.start_time != other.start_time
            || self.end_time != other.end_time
            || self.teacher_id != other.teacher_id
            || self.room_id != other.room_id
            || self.title != other.title
            || self.status != other.status
    }
}

/// 默认标题
pub fn default_title(prefix: &str, sequence_number: i32) -> String {
    format!("{} {}", prefix, sequence_number)
}
