// ==========================================
// 课程排课系统 - 上课时间调整
// ==========================================
// 职责: 课表变更后，把未考勤课次原地挪到当前课表的匹配日期
// 规则: 按序号依次处理；每个课次从 max(自身日期, 下限, 游标) 起逐日搜索（有界）
// 规则: 已考勤/已完成/节假日课次视为固定点，只推进游标
// 红线: 序号与内容不动；搜索耗尽或越过已考勤课次即整体失败
// ==========================================

use crate::domain::timetable::Timetable;
use crate::engine::error::{EngineResult, ScheduleEngineError};
use crate::engine::renumber::Renumberer;
use crate::engine::report::AdjustReport;
use crate::engine::sequence::SessionSequence;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

pub struct ScheduleTimeAdjuster {
    window_days: u32,
}

impl ScheduleTimeAdjuster {
    pub fn new(window_days: u32) -> Self {
        Self { window_days }
    }

    /// 调整课次时间
    ///
    /// # 参数
    /// - `not_before`: 日期下限（开课日期变更降级时为新开课日期）
    pub fn adjust(
        &self,
        seq: &mut SessionSequence,
        timetable: &Timetable,
        not_before: Option<NaiveDate>,
    ) -> EngineResult<AdjustReport> {
        let mut report = AdjustReport::default();
        let mut cursor: Option<NaiveDate> = None;

        for session_id in seq.valid_ids_by_sequence() {
            let locked = seq.is_attended_id(&session_id);
            let session = match seq.get_mut(&session_id) {
                Some(s) => s,
                None => continue,
            };

            if locked || !session.status.is_movable() {
                let next = session.scheduled_date.succ_opt();
                cursor = cursor.max(next);
                report.fixed += 1;
                continue;
            }

            let floor = [Some(session.scheduled_date), not_before, cursor]
                .into_iter()
                .flatten()
                .max()
                .unwrap_or(session.scheduled_date);

            let (date, slot) = match timetable.next_matching_date(floor, self.window_days) {
                Some(found) => found,
                None => {
                    warn!(
                        session_id = %session_id,
                        from = %floor,
                        window_days = self.window_days,
                        "时段搜索耗尽"
                    );
                    return Err(ScheduleEngineError::SearchExhausted {
                        session_id,
                        from: floor,
                        window_days: self.window_days,
                    });
                }
            };

            let mut moved = session.clone();
            moved.scheduled_date = date;
            moved.attach_slot(slot);
            if moved != *session {
                debug!(
                    session_id = %session_id,
                    from = %session.scheduled_date,
                    to = %date,
                    slot_id = %slot.slot_id,
                    "课次改期"
                );
                *session = moved;
                report.moved += 1;
                report.moved_session_ids.push(session_id);
            } else {
                report.unchanged += 1;
            }
            cursor = date.succ_opt();
        }

        // 越过已考勤课次的移动会破坏序号，整体拒绝
        let crossed = Renumberer::locked_mismatches(seq);
        if !crossed.is_empty() {
            warn!(
                class_id = %seq.class_id(),
                crossed = crossed.len(),
                "调整后课次越过已考勤课次"
            );
            return Err(ScheduleEngineError::history_conflict(
                seq.class_id(),
                "adjust",
                crossed,
            ));
        }
        report.renumber = Renumberer::renumber(seq);

        info!(
            class_id = %seq.class_id(),
            moved = report.moved,
            unchanged = report.unchanged,
            fixed = report.fixed,
            "上课时间调整完成"
        );
        Ok(report)
    }
}
