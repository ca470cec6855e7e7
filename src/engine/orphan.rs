// ==========================================
// 课程排课系统 - 孤儿课次映射
// ==========================================
// 职责: 未关联时段的未考勤课次，按自身日期的星期挂到当前课表
// 规则: 匹配不到的课次保持原样并报告
// ==========================================

use crate::domain::timetable::Timetable;
use crate::engine::renumber::Renumberer;
use crate::engine::report::OrphanReport;
use crate::engine::sequence::SessionSequence;
use tracing::info;

pub struct OrphanMapper;

impl OrphanMapper {
    pub fn map(seq: &mut SessionSequence, timetable: &Timetable) -> OrphanReport {
        let mut report = OrphanReport::default();

        let orphan_ids: Vec<String> = seq
            .sessions()
            .iter()
            .filter(|s| !s.is_cancelled() && s.slot_id.is_none() && !seq.is_attended(s))
            .map(|s| s.session_id.clone())
            .collect();

        for session_id in orphan_ids {
            let session = match seq.get_mut(&session_id) {
                Some(s) => s,
                None => continue,
            };
            match timetable.slot_for_date(session.scheduled_date) {
                Some(slot) => {
                    session.attach_slot(slot);
                    report.mapped += 1;
                }
                None => report.unmatched_session_ids.push(session_id),
            }
        }
        report.unmatched_session_ids.sort();

        report.renumber = Renumberer::renumber(seq);

        info!(
            class_id = %seq.class_id(),
            mapped = report.mapped,
            unmatched = report.unmatched_session_ids.len(),
            "孤儿课次映射完成"
        );
        report
    }

    /// 解除未考勤课次与某时段的关联（时段删除时调用），返回解除数量
    pub fn detach_slot(seq: &mut SessionSequence, slot_id: &str) -> usize {
        let targets: Vec<String> = seq
            .sessions()
            .iter()
            .filter(|s| s.slot_id.as_deref() == Some(slot_id) && !seq.is_attended(s))
            .map(|s| s.session_id.clone())
            .collect();
        for session_id in &targets {
            if let Some(session) = seq.get_mut(session_id) {
                session.slot_id = None;
            }
        }
        targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::DayOfWeek;
    use crate::engine::sequence::test_support::*;
    use chrono::NaiveTime;
    use std::collections::HashSet;

    #[test]
    fn test_orphans_mapped_by_weekday() {
        let mut sessions = scenario_a_sessions();
        for s in sessions.iter_mut() {
            s.slot_id = None;
            s.teacher_id = None;
        }
        // 周三的孤儿课次无匹配时段
        sessions[3].scheduled_date = date(1, 24);
        let attended: HashSet<String> = ["s1".to_string()].into_iter().collect();
        let mut seq = SessionSequence::new("C1", sessions, attended);

        let mut mon = slot("S-MON", DayOfWeek::Monday);
        mon.start_time = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let report = OrphanMapper::map(&mut seq, &Timetable::new(vec![mon]));

        assert_eq!(report.mapped, 2);
        assert_eq!(report.unmatched_session_ids, vec!["s4".to_string()]);
        assert_eq!(seq.get("s1").unwrap().slot_id, None);
        let s2 = seq.get("s2").unwrap();
        assert_eq!(s2.slot_id.as_deref(), Some("S-MON"));
        assert_eq!(s2.start_time, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(s2.teacher_id.as_deref(), Some("T1"));
        assert!(seq.get("s4").unwrap().slot_id.is_none());
    }

    #[test]
    fn test_detach_slot_spares_attended() {
        let attended: HashSet<String> = ["s1".to_string()].into_iter().collect();
        let mut seq = SessionSequence::new("C1", scenario_a_sessions(), attended);
        assert_eq!(OrphanMapper::detach_slot(&mut seq, "S-MON"), 3);
        assert_eq!(seq.get("s1").unwrap().slot_id.as_deref(), Some("S-MON"));
        assert!(seq.get("s2").unwrap().slot_id.is_none());
        assert_eq!(OrphanMapper::detach_slot(&mut seq, "S-MON"), 0);
    }
}
