// ==========================================
// 课程排课系统 - 单课次手工改期
// ==========================================
// 规则: 只允许改期未考勤、未取消的课次；状态置为 RESCHEDULED
// 规则: 新日期的星期有时段则重新关联（教师/教室随时段），否则解除关联
// 规则: 内容不换，位置变化由重新编号处理；不得越过已考勤课次
// ==========================================

use crate::domain::timetable::Timetable;
use crate::domain::types::SessionStatus;
use crate::engine::error::{EngineResult, ScheduleEngineError};
use crate::engine::renumber::Renumberer;
use crate::engine::report::RescheduleReport;
use crate::engine::sequence::SessionSequence;
use chrono::{NaiveDate, NaiveTime};
use tracing::info;

pub struct SessionRescheduler;

impl SessionRescheduler {
    pub fn reschedule(
        seq: &mut SessionSequence,
        timetable: &Timetable,
        session_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> EngineResult<RescheduleReport> {
        let locked = seq.is_attended_id(session_id);
        let class_id = seq.class_id().to_string();
        let session = seq
            .get_mut(session_id)
            .ok_or_else(|| ScheduleEngineError::SessionNotFound(session_id.to_string()))?;

        if session.is_cancelled() || session.status == SessionStatus::Holiday {
            return Err(ScheduleEngineError::InvalidStateTransition {
                from: session.status.to_string(),
                to: SessionStatus::Rescheduled.to_string(),
            });
        }
        if locked {
            return Err(ScheduleEngineError::history_conflict(
                &class_id,
                "reschedule",
                vec![session_id.to_string()],
            ));
        }

        match timetable.slot_for_date(date) {
            Some(slot) => session.attach_slot(slot),
            None => session.slot_id = None,
        }
        session.scheduled_date = date;
        session.start_time = start_time;
        session.end_time = end_time;
        session.status = SessionStatus::Rescheduled;

        let slot_id = session.slot_id.clone();
        let crossed = Renumberer::locked_mismatches(seq);
        if !crossed.is_empty() {
            return Err(ScheduleEngineError::history_conflict(&class_id, "reschedule", crossed));
        }
        let renumber = Renumberer::renumber(seq);

        info!(
            class_id = %class_id,
            session_id = %session_id,
            date = %date,
            "课次手工改期完成"
        );
        Ok(RescheduleReport {
            session_id: session_id.to_string(),
            slot_id,
            renumber,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sequence::test_support::*;
    use std::collections::HashSet;

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_move_past_next_session_renumbers() {
        let mut seq = SessionSequence::new("C1", scenario_a_sessions(), HashSet::new());
        // 周二无时段
        let report = SessionRescheduler::reschedule(
            &mut seq,
            &monday_timetable(),
            "s2",
            date(1, 16),
            time(9),
            time(11),
        )
        .unwrap();

        assert_eq!(report.slot_id, None);
        assert_eq!(report.renumber.renumbered, 2);
        let s2 = seq.get("s2").unwrap();
        assert_eq!(s2.status, SessionStatus::Rescheduled);
        assert_eq!(s2.sequence_number, 3);
        assert_eq!(s2.start_time, time(9));
        assert_eq!(seq.get("s3").unwrap().sequence_number, 2);
    }

    #[test]
    fn test_relinks_slot_on_matching_weekday() {
        let mut seq = SessionSequence::new("C1", scenario_a_sessions(), HashSet::new());
        let report = SessionRescheduler::reschedule(
            &mut seq,
            &monday_timetable(),
            "s4",
            date(1, 29),
            time(19),
            time(21),
        )
        .unwrap();
        assert_eq!(report.slot_id.as_deref(), Some("S-MON"));
        // 手工给定的时间优先于时段时间
        assert_eq!(seq.get("s4").unwrap().start_time, time(19));
    }

    #[test]
    fn test_attended_or_cancelled_refused() {
        let attended: HashSet<String> = ["s1".to_string()].into_iter().collect();
        let mut sessions = scenario_a_sessions();
        sessions[1].status = SessionStatus::Cancelled;
        sessions[1].sequence_number = 0;
        let mut seq = SessionSequence::new("C1", sessions, attended);

        let err = SessionRescheduler::reschedule(&mut seq, &monday_timetable(), "s1", date(1, 2), time(9), time(10))
            .unwrap_err();
        assert!(err.is_history_conflict());

        let err = SessionRescheduler::reschedule(&mut seq, &monday_timetable(), "s2", date(1, 2), time(9), time(10))
            .unwrap_err();
        assert!(matches!(err, ScheduleEngineError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_moving_past_attended_session_refused() {
        let attended: HashSet<String> = ["s2".to_string()].into_iter().collect();
        let mut seq = SessionSequence::new("C1", scenario_a_sessions(), attended);
        let err = SessionRescheduler::reschedule(&mut seq, &monday_timetable(), "s1", date(1, 10), time(18), time(20))
            .unwrap_err();
        assert!(err.is_history_conflict());
    }
}
