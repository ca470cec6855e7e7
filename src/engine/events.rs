// ==========================================
// 课程排课系统 - 外部日历同步
// ==========================================
// 职责: 定义日历同步 trait，实现依赖倒置
// 说明: Engine 层定义 trait，外部日历适配器实现
// 红线: 日历推送只在事务提交后执行，失败只记日志与计数，不回滚课次变更
// ==========================================

use crate::domain::session::Session;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 日历操作
// ==========================================

/// 提交后需要推送到外部日历的操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarOp {
    /// 新建或更新课次对应的日历条目
    Upsert(Session),
    /// 删除课次对应的日历条目
    Delete {
        session_id: String,
        calendar_event_id: Option<String>,
    },
}

impl CalendarOp {
    pub fn session_id(&self) -> &str {
        match self {
            CalendarOp::Upsert(session) => &session.session_id,
            CalendarOp::Delete { session_id, .. } => session_id,
        }
    }
}

/// 日历同步结果计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSyncSummary {
    pub upserted: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// 一批日历操作的执行结果
#[derive(Debug, Clone, Default)]
pub struct CalendarDispatch {
    pub summary: CalendarSyncSummary,
    /// 需要回写的日历条目ID (session_id, calendar_event_id)
    pub artifact_updates: Vec<(String, Option<String>)>,
}

// ==========================================
// 日历同步 Trait
// ==========================================

/// 外部日历同步 Trait
///
/// # 实现说明
/// - `upsert_for_session` 返回外部日历条目ID，写回 `lesson_session.calendar_event_id`
/// - 实现方不得假设调用发生在事务内
pub trait CalendarSync: Send + Sync {
    fn upsert_for_session(&self, session: &Session) -> Result<String, Box<dyn Error + Send + Sync>>;

    fn delete_for_session(&self, session_id: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作日历同步
///
/// 用于不需要日历集成的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpCalendarSync;

impl CalendarSync for NoOpCalendarSync {
    fn upsert_for_session(&self, session: &Session) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpCalendarSync: 跳过日历推送 - session_id={}, date={}",
            session.session_id,
            session.scheduled_date
        );
        Ok(String::new())
    }

    fn delete_for_session(&self, session_id: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!("NoOpCalendarSync: 跳过日历删除 - session_id={}", session_id);
        Ok(())
    }
}

/// 可选的日历同步包装
///
/// 简化 Option<Arc<dyn CalendarSync>> 的使用
#[derive(Clone)]
pub struct OptionalCalendarSync {
    inner: Option<Arc<dyn CalendarSync>>,
}

impl OptionalCalendarSync {
    /// 创建带同步器的实例
    pub fn with_sync(sync: Arc<dyn CalendarSync>) -> Self {
        Self { inner: Some(sync) }
    }

    /// 创建空实例（不推送）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 检查是否配置了同步器
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    /// 依次执行日历操作
    ///
    /// 单条失败记 warn 并计入 `failed`，不中断后续操作
    pub fn dispatch(&self, ops: &[CalendarOp]) -> CalendarDispatch {
        let mut result = CalendarDispatch::default();
        let sync = match &self.inner {
            Some(sync) => sync,
            None => {
                if !ops.is_empty() {
                    tracing::debug!(
                        "OptionalCalendarSync: 未配置同步器，跳过 {} 条日历操作",
                        ops.len()
                    );
                }
                return result;
            }
        };

        for op in ops {
            match op {
                CalendarOp::Upsert(session) => match sync.upsert_for_session(session) {
                    Ok(artifact_id) => {
                        result.summary.upserted += 1;
                        if !artifact_id.is_empty()
                            && session.calendar_event_id.as_deref() != Some(artifact_id.as_str())
                        {
                            result
                                .artifact_updates
                                .push((session.session_id.clone(), Some(artifact_id)));
                        }
                    }
                    Err(e) => {
                        result.summary.failed += 1;
                        tracing::warn!(
                            session_id = %session.session_id,
                            error = %e,
                            "日历条目推送失败"
                        );
                    }
                },
                CalendarOp::Delete {
                    session_id,
                    calendar_event_id,
                } => match sync.delete_for_session(session_id) {
                    Ok(()) => {
                        result.summary.deleted += 1;
                        if calendar_event_id.is_some() {
                            result.artifact_updates.push((session_id.clone(), None));
                        }
                    }
                    Err(e) => {
                        result.summary.failed += 1;
                        tracing::warn!(
                            session_id = %session_id,
                            error = %e,
                            "日历条目删除失败"
                        );
                    }
                },
            }
        }

        result
    }
}

impl Default for OptionalCalendarSync {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SessionStatus;
    use chrono::{NaiveDate, NaiveTime};

    struct FailingUpsert;

    impl CalendarSync for FailingUpsert {
        fn upsert_for_session(&self, _session: &Session) -> Result<String, Box<dyn Error + Send + Sync>> {
            Err("calendar offline".into())
        }

        fn delete_for_session(&self, _session_id: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
            Ok(())
        }
    }

    struct FixedId;

    impl CalendarSync for FixedId {
        fn upsert_for_session(&self, session: &Session) -> Result<String, Box<dyn Error + Send + Sync>> {
            Ok(format!("evt-{}", session.session_id))
        }

        fn delete_for_session(&self, _session_id: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
            Ok(())
        }
    }

    fn session(id: &str) -> Session {
        Session {
            session_id: id.to_string(),
            class_id: "C1".to_string(),
            sequence_number: 1,
            status: SessionStatus::Scheduled,
            scheduled_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            slot_id: None,
            teacher_id: None,
            room_id: None,
            curriculum_unit_id: None,
            title: "Lesson 1".to_string(),
            objectives: None,
            body: None,
            resources: Vec::new(),
            cancellation_reason: None,
            calendar_event_id: None,
        }
    }

    #[test]
    fn test_optional_sync_none_skips() {
        let sync = OptionalCalendarSync::none();
        assert!(!sync.is_configured());
        let result = sync.dispatch(&[CalendarOp::Upsert(session("s1"))]);
        assert_eq!(result.summary, CalendarSyncSummary::default());
    }

    #[test]
    fn test_failures_are_counted_not_fatal() {
        let sync = OptionalCalendarSync::with_sync(Arc::new(FailingUpsert));
        let ops = vec![
            CalendarOp::Upsert(session("s1")),
            CalendarOp::Delete {
                session_id: "s2".to_string(),
                calendar_event_id: Some("evt-s2".to_string()),
            },
        ];
        let result = sync.dispatch(&ops);
        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.summary.deleted, 1);
        assert_eq!(result.artifact_updates, vec![("s2".to_string(), None)]);
    }

    #[test]
    fn test_upsert_collects_artifact_ids() {
        let sync = OptionalCalendarSync::with_sync(Arc::new(FixedId));
        let result = sync.dispatch(&[CalendarOp::Upsert(session("s1"))]);
        assert_eq!(result.summary.upserted, 1);
        assert_eq!(
            result.artifact_updates,
            vec![("s1".to_string(), Some("evt-s1".to_string()))]
        );
    }

    #[test]
    fn test_noop_sync() {
        let sync = OptionalCalendarSync::with_sync(Arc::new(NoOpCalendarSync));
        let result = sync.dispatch(&[CalendarOp::Upsert(session("s1"))]);
        assert_eq!(result.summary.upserted, 1);
        assert!(result.artifact_updates.is_empty());
    }
}
