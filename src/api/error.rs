// ==========================================
// 课程排课系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/Engine错误为用户友好的错误消息
// ==========================================

use crate::engine::conflict::ScheduleConflictReport;
use crate::engine::error::ScheduleEngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 排程错误
    // ==========================================
    /// 课表/课纲不足以生成课次
    #[error("排程配置错误: {0}")]
    ConfigurationError(String),

    /// 操作会触及已考勤课次
    #[error("历史冲突: class_id={class_id}, operation={operation}, 已考勤课次数={}", attended_session_ids.len())]
    HistoryConflict {
        class_id: String,
        operation: String,
        attended_session_ids: Vec<String>,
    },

    #[error("时段搜索耗尽: {0}")]
    SearchExhausted(String),

    /// 时段冲突（结构化报告）
    #[error("时段冲突: {}", .0.summary())]
    ScheduleConflict(ScheduleConflictReport),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 外部协作方（考勤存储等）读取失败
    #[error("外部服务错误: {0}")]
    CollaboratorError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn is_history_conflict(&self) -> bool {
        matches!(self, ApiError::HistoryConflict { .. })
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ScheduleEngineError 转换
// ==========================================
impl From<ScheduleEngineError> for ApiError {
    fn from(err: ScheduleEngineError) -> Self {
        match err {
            ScheduleEngineError::Configuration(msg) => ApiError::ConfigurationError(msg),
            ScheduleEngineError::HistoryConflict {
                class_id,
                operation,
                attended_session_ids,
            } => ApiError::HistoryConflict {
                class_id,
                operation,
                attended_session_ids,
            },
            e @ ScheduleEngineError::SearchExhausted { .. } => {
                ApiError::SearchExhausted(e.to_string())
            }
            ScheduleEngineError::SessionNotFound(id) => {
                ApiError::NotFound(format!("lesson_session(id={})不存在", id))
            }
            ScheduleEngineError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::from(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
