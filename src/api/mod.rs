// ==========================================
// 课程排课系统 - API 层
// ==========================================
// 职责: 进程内业务接口（无自有网络协议）
// ==========================================

pub mod error;
pub mod executor;
pub mod schedule_api;
pub mod timetable_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use executor::{OperationOutcome, RepairExecutor};
pub use schedule_api::{ProgressSummary, ScheduleApi};
pub use timetable_api::{DeleteSlotReport, SaveSlotReport, TimetableApi};
