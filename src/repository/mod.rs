// ==========================================
// 课程排课系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod attendance_repo;
pub mod class_target_repo;
pub mod curriculum_repo;
pub mod error;
pub mod session_repo;
pub mod slot_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use attendance_repo::AttendanceRepository;
pub use class_target_repo::ClassTargetRepository;
pub use curriculum_repo::CurriculumRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use session_repo::SessionRepository;
pub use slot_repo::SlotRepository;
