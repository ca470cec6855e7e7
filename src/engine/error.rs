// ==========================================
// 课程排课系统 - 引擎层错误类型
// ==========================================
// 职责: 排程修复算法的可解释失败原因
// 约束: 任一错误都意味着本次调用整体回滚
// ==========================================

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleEngineError {
    /// 课表/课纲配置不足以完成生成
    #[error("排程配置错误: {0}")]
    Configuration(String),

    /// 破坏性操作会触及已考勤课次
    #[error("历史冲突: class_id={class_id}, operation={operation}, 已考勤课次={attended_session_ids:?}")]
    HistoryConflict {
        class_id: String,
        operation: String,
        attended_session_ids: Vec<String>,
    },

    /// 有限窗口内找不到匹配时段的日期
    #[error("时段搜索耗尽: session_id={session_id}, from={from}, window_days={window_days}")]
    SearchExhausted {
        session_id: String,
        from: NaiveDate,
        window_days: u32,
    },

    #[error("课次不存在: {0}")]
    SessionNotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, ScheduleEngineError>;

impl ScheduleEngineError {
    pub fn history_conflict(class_id: &str, operation: &str, attended: Vec<String>) -> Self {
        ScheduleEngineError::HistoryConflict {
            class_id: class_id.to_string(),
            operation: operation.to_string(),
            attended_session_ids: attended,
        }
    }

    /// 是否为历史冲突（调用方据此决定是否降级为时间调整）
    pub fn is_history_conflict(&self) -> bool {
        matches!(self, ScheduleEngineError::HistoryConflict { .. })
    }
}
