// ==========================================
// 课程排课系统 - 领域类型定义
// ==========================================
// 职责: 星期枚举、课次状态枚举
// 红线: 星期使用全序枚举,禁止字符串查表
// ==========================================

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 星期 (Day Of Week)
// ==========================================
// 顺序: Sunday < Monday < ... < Saturday
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    /// 全部星期（按全序排列）
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    /// 日期对应的星期
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }

    /// 序号: Sunday=0 .. Saturday=6
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "SUNDAY",
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
        }
    }

    /// 从数据库字符串解析（大小写不敏感，兼容三字母缩写）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUNDAY" | "SUN" => Some(DayOfWeek::Sunday),
            "MONDAY" | "MON" => Some(DayOfWeek::Monday),
            "TUESDAY" | "TUE" => Some(DayOfWeek::Tuesday),
            "WEDNESDAY" | "WED" => Some(DayOfWeek::Wednesday),
            "THURSDAY" | "THU" => Some(DayOfWeek::Thursday),
            "FRIDAY" | "FRI" => Some(DayOfWeek::Friday),
            "SATURDAY" | "SAT" => Some(DayOfWeek::Saturday),
            _ => None,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => DayOfWeek::Sunday,
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 课次状态 (Session Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Scheduled,   // 已排课
    Completed,   // 已上课（考勤锁定）
    Cancelled,   // 已取消
    Rescheduled, // 已调课
    Holiday,     // 节假日
}

impl SessionStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "SCHEDULED",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Cancelled => "CANCELLED",
            SessionStatus::Rescheduled => "RESCHEDULED",
            SessionStatus::Holiday => "HOLIDAY",
        }
    }

    /// 从数据库字符串解析，未知值按 SCHEDULED 处理
    pub fn from_db_str(raw: &str) -> Self {
        match raw.trim().trim_matches('"').to_ascii_uppercase().as_str() {
            "COMPLETED" => SessionStatus::Completed,
            "CANCELLED" => SessionStatus::Cancelled,
            "RESCHEDULED" => SessionStatus::Rescheduled,
            "HOLIDAY" => SessionStatus::Holiday,
            _ => SessionStatus::Scheduled,
        }
    }

    /// 是否允许自动调整日期/时间
    pub fn is_movable(&self) -> bool {
        matches!(self, SessionStatus::Scheduled | SessionStatus::Rescheduled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_week_total_order() {
        assert!(DayOfWeek::Sunday < DayOfWeek::Monday);
        assert!(DayOfWeek::Friday < DayOfWeek::Saturday);
        let mut days = vec![DayOfWeek::Saturday, DayOfWeek::Sunday, DayOfWeek::Wednesday];
        days.sort();
        assert_eq!(days, vec![DayOfWeek::Sunday, DayOfWeek::Wednesday, DayOfWeek::Saturday]);
    }

    #[test]
    fn test_day_of_week_from_date() {
        // 2024-01-01 是周一
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(DayOfWeek::from_date(date), DayOfWeek::Monday);
        let date = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(DayOfWeek::from_date(date), DayOfWeek::Sunday);
    }

    #[test]
    fn test_day_of_week_parse() {
        assert_eq!(DayOfWeek::parse("monday"), Some(DayOfWeek::Monday));
        assert_eq!(DayOfWeek::parse("SAT"), Some(DayOfWeek::Saturday));
        assert_eq!(DayOfWeek::parse("funday"), None);
        for day in DayOfWeek::ALL {
            assert_eq!(DayOfWeek::parse(day.to_db_str()), Some(day));
        }
    }

    #[test]
    fn test_session_status_roundtrip_and_movable() {
        assert_eq!(SessionStatus::from_db_str("CANCELLED"), SessionStatus::Cancelled);
        assert_eq!(SessionStatus::from_db_str("garbage"), SessionStatus::Scheduled);
        assert!(SessionStatus::Rescheduled.is_movable());
        assert!(!SessionStatus::Completed.is_movable());
        assert!(!SessionStatus::Holiday.is_movable());
    }
}
