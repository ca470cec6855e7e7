// ==========================================
// 课程排课系统 - 重新编号
// ==========================================
// 职责: 非取消课次按 (日期, 开始时间) 排序后重排序号 1..K
// 红线: 只改序号真正变化的课次（幂等）
// 红线: 已考勤课次不改号，不一致时记录并计数
// ==========================================

use crate::engine::report::RenumberReport;
use crate::engine::sequence::SessionSequence;
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

pub struct Renumberer;

impl Renumberer {
    pub fn renumber(seq: &mut SessionSequence) -> RenumberReport {
        let mut report = RenumberReport::default();
        for (idx, (current, session_id)) in Self::ordered(seq).into_iter().enumerate() {
            let expected = idx as i32 + 1;
            if current == expected {
                continue;
            }
            if seq.is_attended_id(&session_id) {
                warn!(
                    class_id = %seq.class_id(),
                    session_id = %session_id,
                    current,
                    expected,
                    "已考勤课次序号与排序位置不一致，保持不变"
                );
                report.skipped_locked += 1;
                continue;
            }
            if let Some(session) = seq.get_mut(&session_id) {
                debug!(session_id = %session_id, from = current, to = expected, "课次改号");
                session.sequence_number = expected;
                report.renumbered += 1;
            }
        }

        report
    }

    /// 排序后位置与现有序号不一致的已考勤课次
    ///
    /// 非空说明某次移动越过了已考勤课次，重新编号会产生重复序号
    pub fn locked_mismatches(seq: &SessionSequence) -> Vec<String> {
        Self::ordered(seq)
            .into_iter()
            .enumerate()
            .filter(|(idx, (current, session_id))| {
                *current != *idx as i32 + 1 && seq.is_attended_id(session_id)
            })
            .map(|(_, (_, session_id))| session_id)
            .collect()
    }

    /// 非取消课次按 (日期, 开始时间, 现序号, ID) 排序
    fn ordered(seq: &SessionSequence) -> Vec<(i32, String)> {
        let mut order: Vec<(NaiveDate, NaiveTime, i32, String)> = seq
            .sessions()
            .iter()
            .filter(|s| !s.is_cancelled())
            .map(|s| {
                (
                    s.scheduled_date,
                    s.start_time,
                    s.sequence_number,
                    s.session_id.clone(),
                )
            })
            .collect();
        order.sort();
        order
            .into_iter()
            .map(|(_, _, current, session_id)| (current, session_id))
            .collect()
    }
}
