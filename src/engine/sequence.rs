// ==========================================
// 课程排课系统 - 课次序列（内存工作集）
// ==========================================
// 职责: 承载一个班级的全部课次 + 考勤锁定集合，记录增/改/删
// 说明: 引擎算法只改内存序列；API 层按 `into_changes` 的结果落库并在提交后推送日历
// 红线: 已考勤课次不得出现在变更集中
// ==========================================

use crate::domain::session::Session;
use crate::domain::types::SessionStatus;
use crate::engine::error::{EngineResult, ScheduleEngineError};
use crate::engine::events::CalendarOp;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

// ==========================================
// SequenceChanges - 待落库变更
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SequenceChanges {
    pub inserted: Vec<Session>,
    pub updated: Vec<Session>,
    pub deleted: Vec<Session>,
    /// 提交后推送的日历操作
    pub calendar_ops: Vec<CalendarOp>,
}

impl SequenceChanges {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

// ==========================================
// SessionSequence - 班级课次序列
// ==========================================
#[derive(Debug, Clone)]
pub struct SessionSequence {
    class_id: String,
    sessions: Vec<Session>,
    attended: HashSet<String>,
    originals: HashMap<String, Session>,
    inserted: Vec<String>,
    deleted: Vec<Session>,
}

impl SessionSequence {
    /// 从已持久化课次构建序列
    ///
    /// # 参数
    /// - `attended`: 考勤存储中已有考勤的课次ID
    pub fn new(class_id: &str, sessions: Vec<Session>, attended: HashSet<String>) -> Self {
        let originals = sessions
            .iter()
            .map(|s| (s.session_id.clone(), s.clone()))
            .collect();
        Self {
            class_id: class_id.to_string(),
            sessions,
            attended,
            originals,
            inserted: Vec::new(),
            deleted: Vec::new(),
        }
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }

    pub(crate) fn get_mut(&mut self, session_id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.session_id == session_id)
    }

    pub(crate) fn sessions_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.iter_mut()
    }

    // ==========================================
    // 考勤锁定
    // ==========================================

    /// 课次是否锁定（有考勤记录或已完成）
    pub fn is_attended(&self, session: &Session) -> bool {
        session.status == SessionStatus::Completed || self.attended.contains(&session.session_id)
    }

    pub fn is_attended_id(&self, session_id: &str) -> bool {
        self.get(session_id).is_some_and(|s| self.is_attended(s))
    }

    /// 全部锁定课次ID（按序号排序）
    pub fn attended_ids(&self) -> Vec<String> {
        let mut locked: Vec<&Session> = self
            .sessions
            .iter()
            .filter(|s| self.is_attended(s))
            .collect();
        locked.sort_by_key(|s| (s.sequence_number, s.scheduled_date));
        locked.into_iter().map(|s| s.session_id.clone()).collect()
    }

    // ==========================================
    // 统计
    // ==========================================

    /// 有效课次数（未取消且序号 > 0）
    pub fn valid_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_valid()).count()
    }

    /// 有效课次按序号排序后的ID列表
    pub fn valid_ids_by_sequence(&self) -> Vec<String> {
        let mut valid: Vec<&Session> = self.sessions.iter().filter(|s| s.is_valid()).collect();
        valid.sort_by(|a, b| {
            a.sequence_number
                .cmp(&b.sequence_number)
                .then(a.schedule_key().cmp(&b.schedule_key()))
                .then(a.session_id.cmp(&b.session_id))
        });
        valid.into_iter().map(|s| s.session_id.clone()).collect()
    }

    pub fn max_valid_sequence(&self) -> i32 {
        self.sessions
            .iter()
            .filter(|s| s.is_valid())
            .map(|s| s.sequence_number)
            .max()
            .unwrap_or(0)
    }

    /// 全部课次（含已取消）的最晚日期
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.sessions.iter().map(|s| s.scheduled_date).max()
    }

    /// 有效课次的最晚日期
    pub fn last_valid_date(&self) -> Option<NaiveDate> {
        self.sessions
            .iter()
            .filter(|s| s.is_valid())
            .map(|s| s.scheduled_date)
            .max()
    }

    // ==========================================
    // 增删
    // ==========================================

    /// 追加新建课次
    pub fn insert(&mut self, session: Session) {
        self.inserted.push(session.session_id.clone());
        self.sessions.push(session);
    }

    /// 移除课次（已考勤课次拒绝移除）
    pub fn remove(&mut self, session_id: &str) -> EngineResult<Option<Session>> {
        if self.is_attended_id(session_id) {
            return Err(ScheduleEngineError::history_conflict(
                &self.class_id,
                "remove",
                vec![session_id.to_string()],
            ));
        }
        let pos = match self.sessions.iter().position(|s| s.session_id == session_id) {
            Some(pos) => pos,
            None => return Ok(None),
        };
        let removed = self.sessions.remove(pos);
        if let Some(idx) = self.inserted.iter().position(|id| id == session_id) {
            self.inserted.remove(idx);
        } else {
            self.deleted.push(removed.clone());
        }
        Ok(Some(removed))
    }

    // ==========================================
    // 变更集
    // ==========================================

    /// 计算待落库变更与日历操作
    ///
    /// 已考勤课次若被修改或删除，返回 HistoryConflict，整次操作回滚
    pub fn into_changes(self) -> EngineResult<SequenceChanges> {
        let mut changes = SequenceChanges::default();
        let inserted: HashSet<&String> = self.inserted.iter().collect();
        let mut touched_locked = Vec::new();

        for session in &self.sessions {
            if inserted.contains(&session.session_id) {
                changes.calendar_ops.push(CalendarOp::Upsert(session.clone()));
                changes.inserted.push(session.clone());
                continue;
            }
            let original = match self.originals.get(&session.session_id) {
                Some(original) => original,
                None => continue,
            };
            if original == session {
                continue;
            }
            if self.attended.contains(&session.session_id)
                || original.status == SessionStatus::Completed
            {
                touched_locked.push(session.session_id.clone());
                continue;
            }
            if session.calendar_fields_differ(original) {
                if session.is_cancelled() {
                    changes.calendar_ops.push(CalendarOp::Delete {
                        session_id: session.session_id.clone(),
                        calendar_event_id: original.calendar_event_id.clone(),
                    });
                } else {
                    changes.calendar_ops.push(CalendarOp::Upsert(session.clone()));
                }
            }
            changes.updated.push(session.clone());
        }

        for session in &self.deleted {
            changes.calendar_ops.push(CalendarOp::Delete {
                session_id: session.session_id.clone(),
                calendar_event_id: session.calendar_event_id.clone(),
            });
            changes.deleted.push(session.clone());
        }

        if !touched_locked.is_empty() {
            return Err(ScheduleEngineError::history_conflict(
                &self.class_id,
                "persist",
                touched_locked,
            ));
        }

        Ok(changes)
    }
}
