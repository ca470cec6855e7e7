use super::*;

use serde::{Deserialize, Serialize};

use crate::domain::action_log::ActionLog;
use crate::domain::session::Session;
use crate::domain::types::SessionStatus;

/// 班级进度摘要（序号为 0 的课次不计入有效/已上/剩余）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub class_id: String,
    /// 目标课次数
    pub total_sessions: i32,
    pub valid: usize,
    /// 已考勤或状态为 COMPLETED
    pub completed: usize,
    pub cancelled: usize,
    pub remaining: usize,
    /// 下一节未上的有效课次
    pub next_session: Option<Session>,
}

impl ScheduleApi {
    // ==========================================
    // 查询接口（不取班级锁）
    // ==========================================

    /// 班级进度
    pub fn progress(&self, class_id: &str) -> ApiResult<ProgressSummary> {
        let target = self
            .class_target_repo
            .find(class_id)?
            .ok_or_else(|| ApiError::NotFound(format!("class_schedule(id={})不存在", class_id)))?;
        let sessions = self.session_repo.find_by_class(class_id)?;
        let ids: Vec<String> = sessions.iter().map(|s| s.session_id.clone()).collect();
        let attended = self.executor.attended_among(&ids)?;

        let is_done = |s: &Session| {
            s.status == SessionStatus::Completed || attended.contains(&s.session_id)
        };

        let valid: Vec<&Session> = sessions.iter().filter(|s| s.is_valid()).collect();
        let completed = valid.iter().filter(|s| is_done(s)).count();
        let cancelled = sessions.iter().filter(|s| s.is_cancelled()).count();
        let next_session = valid
            .iter()
            .filter(|s| !is_done(s) && s.status != SessionStatus::Holiday)
            .min_by_key(|s| (s.schedule_key(), s.sequence_number))
            .map(|s| (*s).clone());

        Ok(ProgressSummary {
            class_id: class_id.to_string(),
            total_sessions: target.total_sessions,
            valid: valid.len(),
            completed,
            cancelled,
            remaining: valid.len() - completed,
            next_session,
        })
    }

    /// 班级课次列表
    ///
    /// 排序: 有效课次按序号在前，序号为 0 的课次在后
    pub fn list_sessions(&self, class_id: &str, include_cancelled: bool) -> ApiResult<Vec<Session>> {
        let sessions = self.session_repo.find_by_class(class_id)?;
        Ok(sessions
            .into_iter()
            .filter(|s| include_cancelled || !s.is_cancelled())
            .collect())
    }

    /// 班级操作日志（按时间倒序）
    pub fn list_action_logs(&self, class_id: &str, limit: usize) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_class(class_id, limit)?)
    }
}
