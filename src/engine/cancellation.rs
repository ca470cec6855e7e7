// ==========================================
// 课程排课系统 - 取消课次（平移 + 补课）
// ==========================================
// 步骤:
//   1. 取消: 目标课次 status=CANCELLED, 序号置 0, 清空课纲关联与内容
//   2. 平移: 其后未考勤的有效课次序号减一，内容改为新序号对应的单元；日期不动
//   3. 补课: 有效课次不足目标数时，在最晚课次日期之后找第一个匹配日期补一节
// 红线: 目标课次或其后任一有效课次已考勤时拒绝，不做部分修改
// ==========================================

use crate::domain::curriculum::Curriculum;
use crate::domain::session::Session;
use crate::domain::timetable::{ClassTarget, Timetable};
use crate::domain::types::SessionStatus;
use crate::engine::error::{EngineResult, ScheduleEngineError};
use crate::engine::generator::SessionGenerator;
use crate::engine::renumber::Renumberer;
use crate::engine::report::CancellationReport;
use crate::engine::sequence::SessionSequence;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct CancellationHandler {
    generator: SessionGenerator,
    window_days: u32,
}

impl CancellationHandler {
    pub fn new(generator: SessionGenerator, window_days: u32) -> Self {
        Self {
            generator,
            window_days,
        }
    }

    pub fn cancel(
        &self,
        seq: &mut SessionSequence,
        target: &ClassTarget,
        timetable: &Timetable,
        curriculum: Option<&Curriculum>,
        session_id: &str,
        reason: Option<String>,
    ) -> EngineResult<CancellationReport> {
        // ===== 前置检查 =====
        let victim = seq
            .get(session_id)
            .cloned()
            .ok_or_else(|| ScheduleEngineError::SessionNotFound(session_id.to_string()))?;

        if victim.is_cancelled() {
            return Err(ScheduleEngineError::InvalidStateTransition {
                from: victim.status.to_string(),
                to: SessionStatus::Cancelled.to_string(),
            });
        }
        if seq.is_attended(&victim) {
            return Err(ScheduleEngineError::history_conflict(
                seq.class_id(),
                "cancel",
                vec![session_id.to_string()],
            ));
        }

        let later_ids: Vec<String> = seq
            .valid_ids_by_sequence()
            .into_iter()
            .filter(|id| id != session_id)
            .filter(|id| {
                seq.get(id)
                    .is_some_and(|s| s.sequence_number > victim.sequence_number)
            })
            .collect();
        let later_locked: Vec<String> = later_ids
            .iter()
            .filter(|id| seq.is_attended_id(id))
            .cloned()
            .collect();
        if !later_locked.is_empty() {
            warn!(
                session_id = %session_id,
                locked = later_locked.len(),
                "取消目标之后存在已考勤课次，无法平移"
            );
            return Err(ScheduleEngineError::history_conflict(
                seq.class_id(),
                "cancel",
                later_locked,
            ));
        }

        // ===== 补课日期（先确定，失败时不做任何修改） =====
        let target_count = target.total_sessions.max(0) as usize;
        let valid_after_cancel = seq.valid_count() - usize::from(victim.is_valid());
        let append_slot = if valid_after_cancel < target_count {
            let from = match seq.max_date().and_then(|d| d.succ_opt()) {
                Some(d) => d,
                None => victim.scheduled_date,
            };
            match timetable.next_matching_date(from, self.window_days) {
                Some((date, slot)) => Some((date, slot.clone())),
                None => {
                    return Err(ScheduleEngineError::SearchExhausted {
                        session_id: session_id.to_string(),
                        from,
                        window_days: self.window_days,
                    })
                }
            }
        } else {
            None
        };

        let mut report = CancellationReport {
            cancelled_session_id: session_id.to_string(),
            ..CancellationReport::default()
        };

        // ===== 1. 取消 =====
        if let Some(session) = seq.get_mut(session_id) {
            session.status = SessionStatus::Cancelled;
            session.sequence_number = 0;
            session.cancellation_reason = reason;
            session.clear_content();
        }

        // ===== 2. 平移 =====
        for id in &later_ids {
            if let Some(session) = seq.get_mut(id) {
                session.sequence_number -= 1;
                self.generator.apply_content(session, curriculum);
                debug!(session_id = %id, sequence_number = session.sequence_number, "课次前移");
                report.shifted += 1;
            }
        }

        // ===== 3. 补课 =====
        if let Some((date, slot)) = append_slot {
            let mut session = Session {
                session_id: Uuid::new_v4().to_string(),
                class_id: seq.class_id().to_string(),
                sequence_number: seq.max_valid_sequence() + 1,
                status: SessionStatus::Scheduled,
                scheduled_date: date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                slot_id: None,
                teacher_id: None,
                room_id: None,
                curriculum_unit_id: None,
                title: String::new(),
                objectives: None,
                body: None,
                resources: Vec::new(),
                cancellation_reason: None,
                calendar_event_id: None,
            };
            session.attach_slot(&slot);
            self.generator.apply_content(&mut session, curriculum);
            report.appended_session_id = Some(session.session_id.clone());
            seq.insert(session);
        }

        report.renumber = Renumberer::renumber(seq);

        info!(
            class_id = %seq.class_id(),
            session_id = %session_id,
            shifted = report.shifted,
            appended = report.appended_session_id.is_some(),
            "课次取消完成"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::curriculum::CurriculumUnit;
    use crate::engine::sequence::test_support::*;
    use crate::engine::settings::EngineSettings;
    use std::collections::HashSet;

    fn handler() -> CancellationHandler {
        CancellationHandler::new(SessionGenerator::new(&EngineSettings::default()), 14)
    }

    fn target(total: i32) -> ClassTarget {
        ClassTarget {
            class_id: "C1".to_string(),
            total_sessions: total,
            start_date: date(1, 1),
            curriculum_id: None,
        }
    }

    fn curriculum() -> Curriculum {
        Curriculum {
            curriculum_id: "CUR1".to_string(),
            name: "Algebra".to_string(),
            units: (1..=4)
                .map(|i| CurriculumUnit {
                    unit_id: format!("U{}", i),
                    curriculum_id: "CUR1".to_string(),
                    sequence_number: i,
                    title: format!("Unit {}", i),
                    objectives: None,
                    body: None,
                    resources: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_scenario_b_shift_and_append() {
        let mut seq = SessionSequence::new("C1", scenario_a_sessions(), HashSet::new());
        let cur = curriculum();
        let report = handler()
            .cancel(
                &mut seq,
                &target(4),
                &monday_timetable(),
                Some(&cur),
                "s2",
                Some("teacher sick".to_string()),
            )
            .unwrap();

        assert_eq!(report.shifted, 2);
        let s2 = seq.get("s2").unwrap();
        assert_eq!(s2.status, SessionStatus::Cancelled);
        assert_eq!(s2.sequence_number, 0);
        assert_eq!(s2.curriculum_unit_id, None);
        assert_eq!(s2.cancellation_reason.as_deref(), Some("teacher sick"));

        let s3 = seq.get("s3").unwrap();
        assert_eq!((s3.sequence_number, s3.scheduled_date), (2, date(1, 15)));
        assert_eq!(s3.title, "Unit 2");
        assert_eq!(seq.get("s4").unwrap().sequence_number, 3);

        let appended_id = report.appended_session_id.unwrap();
        let appended = seq.get(&appended_id).unwrap();
        assert_eq!(appended.scheduled_date, date(1, 29));
        assert_eq!(appended.sequence_number, 4);
        assert_eq!(appended.title, "Unit 4");
        assert_eq!(seq.valid_count(), 4);
        assert_eq!(report.renumber.renumbered, 0);
    }

    #[test]
    fn test_no_append_when_target_already_met() {
        let mut sessions = scenario_a_sessions();
        sessions.push(session("s5", 5, date(1, 29)));
        let mut seq = SessionSequence::new("C1", sessions, HashSet::new());
        let report = handler()
            .cancel(&mut seq, &target(4), &monday_timetable(), None, "s1", None)
            .unwrap();
        assert!(report.appended_session_id.is_none());
        assert_eq!(seq.valid_count(), 4);
        assert_eq!(seq.get("s5").unwrap().title, "Lesson 4");
    }

    #[test]
    fn test_cancel_twice_is_invalid_transition() {
        let mut seq = SessionSequence::new("C1", scenario_a_sessions(), HashSet::new());
        let h = handler();
        h.cancel(&mut seq, &target(4), &monday_timetable(), None, "s4", None)
            .unwrap();
        let err = h
            .cancel(&mut seq, &target(4), &monday_timetable(), None, "s4", None)
            .unwrap_err();
        assert!(matches!(err, ScheduleEngineError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_attended_target_or_later_session_refuses() {
        let attended: HashSet<String> = ["s3".to_string()].into_iter().collect();
        let mut seq = SessionSequence::new("C1", scenario_a_sessions(), attended);
        let h = handler();

        let err = h
            .cancel(&mut seq, &target(4), &monday_timetable(), None, "s3", None)
            .unwrap_err();
        assert!(err.is_history_conflict());

        let err = h
            .cancel(&mut seq, &target(4), &monday_timetable(), None, "s2", None)
            .unwrap_err();
        assert!(err.is_history_conflict());
        assert!(seq.into_changes().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_after_attended_session_is_allowed() {
        let attended: HashSet<String> = ["s1".to_string()].into_iter().collect();
        let mut seq = SessionSequence::new("C1", scenario_a_sessions(), attended);
        handler()
            .cancel(&mut seq, &target(4), &monday_timetable(), None, "s2", None)
            .unwrap();
        assert_eq!(seq.get("s1").unwrap().sequence_number, 1);
        assert!(seq.into_changes().is_ok());
    }

    #[test]
    fn test_unknown_session_and_exhausted_search() {
        let mut seq = SessionSequence::new("C1", scenario_a_sessions(), HashSet::new());
        let h = handler();
        let err = h
            .cancel(&mut seq, &target(4), &monday_timetable(), None, "nope", None)
            .unwrap_err();
        assert_eq!(err, ScheduleEngineError::SessionNotFound("nope".to_string()));

        let err = h
            .cancel(&mut seq, &target(4), &Timetable::default(), None, "s2", None)
            .unwrap_err();
        assert!(matches!(err, ScheduleEngineError::SearchExhausted { .. }));
        assert!(seq.into_changes().unwrap().is_empty());
    }
}
