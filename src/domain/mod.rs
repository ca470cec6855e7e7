// ==========================================
// 课程排课系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod curriculum;
pub mod session;
pub mod timetable;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use curriculum::{Curriculum, CurriculumUnit};
pub use session::{default_title, Session};
pub use timetable::{ClassTarget, RecurringSlot, Timetable};
pub use types::{DayOfWeek, SessionStatus};
