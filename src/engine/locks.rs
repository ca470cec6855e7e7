// ==========================================
// 课程排课系统 - 班级级互斥锁
// ==========================================
// 职责: 同一班级的修复操作串行执行（并发请求排队，不拒绝）
// 说明: 与 SQLite IMMEDIATE 事务配合；锁只在进程内有效
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct ClassLockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ClassLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取班级对应的锁（不存在则创建）
    pub fn lock_for(&self, class_id: &str) -> Result<Arc<Mutex<()>>, String> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| format!("班级锁表获取失败: {}", e))?;
        Ok(locks
            .entry(class_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
