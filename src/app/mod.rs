// ==========================================
// 课程排课系统 - 应用层
// ==========================================
// 职责: 装配共享状态，供宿主程序调用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppCollaborators, AppState};
