// ==========================================
// 课程排课系统 - 操作日志数据仓储
// ==========================================
// 红线: 所有排程修复写入必须记录
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
