// ==========================================
// 课程排课系统 - 时段冲突检查
// ==========================================
// 职责: 新建/修改周循环时段前检查教师、教室、同班同日冲突
// 规则: 教师与本班自己的时段不算冲突；教室冲突同理只比较其他班级
// 输出: 结构化冲突报告，不做任何覆盖
// ==========================================

use crate::domain::timetable::RecurringSlot;
use crate::engine::collaborators::TeacherRoomDirectory;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// 教师在同一时间已有其他班级的时段
    TeacherOverlap,
    /// 教室在同一时间已被其他班级占用
    RoomOverlap,
    /// 本班同一星期已有其他时段
    DayTaken,
    UnknownTeacher,
    UnknownRoom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConflict {
    pub kind: ConflictKind,
    pub conflicting_slot_id: Option<String>,
    pub conflicting_class_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConflictReport {
    pub slot_id: String,
    pub class_id: String,
    pub conflicts: Vec<SlotConflict>,
}

impl ScheduleConflictReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// 冲突摘要（用于错误信息）
    pub fn summary(&self) -> String {
        self.conflicts
            .iter()
            .map(|c| c.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub struct ScheduleConflictChecker;

impl ScheduleConflictChecker {
    /// 时间窗口合法性（结束必须晚于开始）
    pub fn validate_window(slot: &RecurringSlot) -> Result<(), String> {
        if slot.end_time <= slot.start_time {
            return Err(format!(
                "时段结束时间必须晚于开始时间: slot_id={}, {}-{}",
                slot.slot_id,
                slot.start_time.format("%H:%M"),
                slot.end_time.format("%H:%M")
            ));
        }
        Ok(())
    }

    /// 检查候选时段
    ///
    /// # 参数
    /// - `same_day_slots`: 同一星期的全部已有时段（跨班级）；与候选同ID的视为其旧版本并忽略
    pub fn check(
        proposed: &RecurringSlot,
        same_day_slots: &[RecurringSlot],
        directory: &dyn TeacherRoomDirectory,
    ) -> ScheduleConflictReport {
        let mut conflicts = Vec::new();

        if !directory.teacher_exists(&proposed.teacher_id) {
            conflicts.push(SlotConflict {
                kind: ConflictKind::UnknownTeacher,
                conflicting_slot_id: None,
                conflicting_class_id: None,
                message: format!("教师不存在: {}", proposed.teacher_id),
            });
        }
        if let Some(room_id) = &proposed.room_id {
            if !directory.room_exists(room_id) {
                conflicts.push(SlotConflict {
                    kind: ConflictKind::UnknownRoom,
                    conflicting_slot_id: None,
                    conflicting_class_id: None,
                    message: format!("教室不存在: {}", room_id),
                });
            }
        }

        for existing in same_day_slots {
            if existing.slot_id == proposed.slot_id
                || existing.day_of_week != proposed.day_of_week
            {
                continue;
            }

            if existing.class_id == proposed.class_id {
                conflicts.push(SlotConflict {
                    kind: ConflictKind::DayTaken,
                    conflicting_slot_id: Some(existing.slot_id.clone()),
                    conflicting_class_id: Some(existing.class_id.clone()),
                    message: format!(
                        "班级 {} 在 {} 已有时段 {}",
                        existing.class_id, existing.day_of_week, existing.slot_id
                    ),
                });
                continue;
            }

            if !proposed.overlaps(existing) {
                continue;
            }
            if existing.teacher_id == proposed.teacher_id {
                conflicts.push(SlotConflict {
                    kind: ConflictKind::TeacherOverlap,
                    conflicting_slot_id: Some(existing.slot_id.clone()),
                    conflicting_class_id: Some(existing.class_id.clone()),
                    message: format!(
                        "教师 {} 在 {} {}-{} 已有班级 {} 的课",
                        proposed.teacher_id,
                        existing.day_of_week,
                        existing.start_time.format("%H:%M"),
                        existing.end_time.format("%H:%M"),
                        existing.class_id
                    ),
                });
            }
            if proposed.room_id.is_some() && existing.room_id == proposed.room_id {
                conflicts.push(SlotConflict {
                    kind: ConflictKind::RoomOverlap,
                    conflicting_slot_id: Some(existing.slot_id.clone()),
                    conflicting_class_id: Some(existing.class_id.clone()),
                    message: format!(
                        "教室 {} 在 {} {}-{} 已被班级 {} 占用",
                        existing.room_id.as_deref().unwrap_or_default(),
                        existing.day_of_week,
                        existing.start_time.format("%H:%M"),
                        existing.end_time.format("%H:%M"),
                        existing.class_id
                    ),
                });
            }
        }

        debug!(
            slot_id = %proposed.slot_id,
            conflicts = conflicts.len(),
            "时段冲突检查完成"
        );
        ScheduleConflictReport {
            slot_id: proposed.slot_id.clone(),
            class_id: proposed.class_id.clone(),
            conflicts,
        }
    }
}
