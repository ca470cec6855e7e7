// ==========================================
// 课程排课系统 - 操作日志领域模型
// ==========================================
// 红线: 所有排程修复写入必须记录
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,                  // 日志ID
    pub class_id: String,                   // 关联班级
    pub action_type: String,                // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,           // 操作时间戳
    pub actor: String,                      // 操作人
    pub payload_json: Option<JsonValue>,    // 操作结果摘要 (JSON)
    pub detail: Option<String>,             // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Generate,          // 初次生成
    Resync,            // 课纲内容同步
    Regenerate,        // 开课日期变更后全量重建
    AdjustSchedule,    // 课表变更后时间调整
    MapOrphans,        // 孤立课次挂接时段
    Cancel,            // 取消并顺延
    Renumber,          // 重新编号
    Reschedule,        // 单课次手工调课
    SaveSlot,          // 保存时段
    DeleteSlot,        // 删除时段
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Generate => "Generate",
            ActionType::Resync => "Resync",
            ActionType::Regenerate => "Regenerate",
            ActionType::AdjustSchedule => "AdjustSchedule",
            ActionType::MapOrphans => "MapOrphans",
            ActionType::Cancel => "Cancel",
            ActionType::Renumber => "Renumber",
            ActionType::Reschedule => "Reschedule",
            ActionType::SaveSlot => "SaveSlot",
            ActionType::DeleteSlot => "DeleteSlot",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
