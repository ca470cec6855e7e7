// ==========================================
// 课程排课系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 课次排程引擎（生成、修复、取消顺延）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排程算法
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DayOfWeek, SessionStatus};

// 领域实体
pub use domain::{
    ActionLog, ActionType, ClassTarget, Curriculum, CurriculumUnit, RecurringSlot, Session,
    Timetable,
};

// 引擎
pub use engine::{
    CancellationHandler, ContentResynchronizer, FullRegenerator, OrphanMapper, Renumberer,
    ScheduleConflictChecker, ScheduleEngineError, ScheduleTimeAdjuster, SessionGenerator,
    SessionSequence,
};

// API
pub use api::{ApiError, ApiResult, OperationOutcome, ScheduleApi, TimetableApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "课程排课系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
