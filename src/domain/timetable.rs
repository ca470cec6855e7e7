// ==========================================
// 课程排课系统 - 课表领域模型
// ==========================================
// 职责: 周循环时段 (RecurringSlot)、班级课表、班级目标
// 红线: 同一班级每个星期至多一个时段
// ==========================================

use crate::domain::types::DayOfWeek;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// RecurringSlot - 周循环时段
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSlot {
    pub slot_id: String,            // 时段ID
    pub class_id: String,           // 所属班级
    pub day_of_week: DayOfWeek,     // 星期
    pub start_time: NaiveTime,      // 开始时间
    pub end_time: NaiveTime,        // 结束时间
    pub teacher_id: String,         // 授课教师
    pub room_id: Option<String>,    // 教室 (可选)
}

impl RecurringSlot {
    /// 时间窗口是否与另一时段重叠（同一星期才可能重叠）
    pub fn overlaps(&self, other: &RecurringSlot) -> bool {
        self.day_of_week == other.day_of_week
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }

    /// 时段是否匹配给定日期
    pub fn matches(&self, date: NaiveDate) -> bool {
        DayOfWeek::from_date(date) == self.day_of_week
    }
}

// ==========================================
// Timetable - 班级当前课表
// ==========================================
/// 班级当前的时段集合，按星期索引
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    slots: BTreeMap<DayOfWeek, RecurringSlot>,
}

impl Timetable {
    /// 从时段列表构建课表
    ///
    /// 同一星期出现多个时段时保留最后一个（上游已通过冲突检查保证唯一）
    pub fn new(slots: Vec<RecurringSlot>) -> Self {
        let mut map = BTreeMap::new();
        for slot in slots {
            if let Some(prev) = map.insert(slot.day_of_week, slot) {
                tracing::warn!(
                    "课表中同一星期存在多个时段, 保留最新: day={}, dropped_slot={}",
                    prev.day_of_week,
                    prev.slot_id
                );
            }
        }
        Self { slots: map }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// 查找某一星期的时段
    pub fn slot_for_day(&self, day: DayOfWeek) -> Option<&RecurringSlot> {
        self.slots.get(&day)
    }

    /// 查找某一日期匹配的时段
    pub fn slot_for_date(&self, date: NaiveDate) -> Option<&RecurringSlot> {
        self.slot_for_day(DayOfWeek::from_date(date))
    }

    /// 按星期顺序遍历时段
    pub fn slots(&self) -> impl Iterator<Item = &RecurringSlot> {
        self.slots.values()
    }

    /// 从 `from`（含）开始逐日查找第一个匹配时段的日期，最多查找 `window_days` 天
    pub fn next_matching_date(
        &self,
        from: NaiveDate,
        window_days: u32,
    ) -> Option<(NaiveDate, &RecurringSlot)> {
        let mut date = from;
        for _ in 0..window_days {
            if let Some(slot) = self.slot_for_date(date) {
                return Some((date, slot));
            }
            date = date.succ_opt()?;
        }
        None
    }
}

// ==========================================
// ClassTarget - 班级排课目标
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTarget {
    pub class_id: String,                 // 班级ID
    pub total_sessions: i32,              // 目标课次数 (固定)
    pub start_date: NaiveDate,            // 开课日期
    pub curriculum_id: Option<String>,    // 关联课纲 (可选)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(day: DayOfWeek, start: (u32, u32), end: (u32, u32)) -> RecurringSlot {
        RecurringSlot {
            slot_id: format!("S-{}", day),
            class_id: "C1".to_string(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            teacher_id: "T1".to_string(),
            room_id: None,
        }
    }

    #[test]
    fn test_overlaps_requires_same_day() {
        let a = slot(DayOfWeek::Monday, (18, 0), (20, 0));
        let b = slot(DayOfWeek::Monday, (19, 0), (21, 0));
        let c = slot(DayOfWeek::Tuesday, (19, 0), (21, 0));
        let d = slot(DayOfWeek::Monday, (20, 0), (21, 0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        // 首尾相接不算重叠
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn test_next_matching_date_inclusive_and_bounded() {
        let timetable = Timetable::new(vec![slot(DayOfWeek::Monday, (18, 0), (20, 0))]);
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let (date, _) = timetable.next_matching_date(monday, 14).unwrap();
        assert_eq!(date, monday);

        let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let (date, _) = timetable.next_matching_date(tuesday, 14).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());

        // 窗口不足一周时找不到
        assert!(timetable.next_matching_date(tuesday, 3).is_none());
        assert!(Timetable::default().next_matching_date(monday, 14).is_none());
    }
}
