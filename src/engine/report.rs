use serde::{Deserialize, Serialize};

// ==========================================
// 修复操作报告
// ==========================================
// 说明: 各报告序列化后写入 action_log.payload_json

/// 重新编号报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenumberReport {
    /// 序号发生变化的课次数
    pub renumbered: usize,
    /// 因考勤锁定而未改号的课次数
    pub skipped_locked: usize,
}

/// 课次生成报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateReport {
    pub generated: usize,
    pub session_ids: Vec<String>,
}

/// 课纲内容同步报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncReport {
    pub updated: usize,
    /// 已考勤而跳过的课次数
    pub skipped_attended: usize,
    pub skipped_session_ids: Vec<String>,
    /// 补齐尾部新生成的课次数
    pub generated: usize,
    pub renumber: RenumberReport,
}

/// 整体重建报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenerateReport {
    pub deleted: usize,
    pub generated: usize,
    pub renumber: RenumberReport,
}

/// 上课时间调整报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustReport {
    /// 日期/时间/时段发生变化的课次数
    pub moved: usize,
    pub unchanged: usize,
    /// 已考勤/已完成/节假日等固定课次
    pub fixed: usize,
    pub moved_session_ids: Vec<String>,
    pub renumber: RenumberReport,
}

/// 孤儿课次映射报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReport {
    pub mapped: usize,
    pub unmatched_session_ids: Vec<String>,
    pub renumber: RenumberReport,
}

/// 取消（平移+补课）报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReport {
    pub cancelled_session_id: String,
    /// 序号前移的课次数
    pub shifted: usize,
    /// 补在末尾的新课次
    pub appended_session_id: Option<String>,
    pub renumber: RenumberReport,
}

/// 单课次改期报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleReport {
    pub session_id: String,
    pub slot_id: Option<String>,
    pub renumber: RenumberReport,
}

/// 开课日期变更走了哪条路径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartDateChangePath {
    /// 整体重建
    Regenerated,
    /// 存在考勤，降级为时间调整
    AdjustedInPlace,
}

/// 开课日期变更报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartDateChangeReport {
    pub path: StartDateChangePath,
    pub regenerate: Option<RegenerateReport>,
    pub adjust: Option<AdjustReport>,
}
