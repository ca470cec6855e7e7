// ==========================================
// 课程排课系统 - 课纲内容同步
// ==========================================
// 职责: 课纲（重新）指派后，按序号把单元内容写入未考勤的有效课次
// 职责: 有效课次不足目标数时补齐尾部，最后重新编号
// 红线: 已考勤课次跳过并计数
// ==========================================

use crate::domain::curriculum::Curriculum;
use crate::domain::timetable::{ClassTarget, Timetable};
use crate::engine::error::EngineResult;
use crate::engine::generator::{GenerationRequest, SessionGenerator};
use crate::engine::renumber::Renumberer;
use crate::engine::report::ResyncReport;
use crate::engine::sequence::SessionSequence;
use tracing::info;

pub struct ContentResynchronizer {
    generator: SessionGenerator,
}

impl ContentResynchronizer {
    pub fn new(generator: SessionGenerator) -> Self {
        Self { generator }
    }

    pub fn resync(
        &self,
        seq: &mut SessionSequence,
        target: &ClassTarget,
        timetable: &Timetable,
        curriculum: &Curriculum,
    ) -> EngineResult<ResyncReport> {
        let mut report = ResyncReport::default();

        for session_id in seq.valid_ids_by_sequence() {
            let locked = seq.is_attended_id(&session_id);
            let session = match seq.get_mut(&session_id) {
                Some(s) => s,
                None => continue,
            };
            let unit = match curriculum.unit_for(session.sequence_number) {
                Some(unit) => unit,
                None => continue,
            };
            if locked {
                report.skipped_attended += 1;
                report.skipped_session_ids.push(session_id);
                continue;
            }
            let mut updated = session.clone();
            updated.apply_unit(unit);
            if updated != *session {
                *session = updated;
                report.updated += 1;
            }
        }

        let target_count = target.total_sessions.max(0) as usize;
        let missing = target_count.saturating_sub(seq.valid_count());
        if missing > 0 {
            let start_date = match seq.max_date().and_then(|d| d.succ_opt()) {
                Some(next) => next.max(target.start_date),
                None => target.start_date,
            };
            let generated = self.generator.generate(&GenerationRequest {
                class_id: seq.class_id(),
                timetable,
                curriculum: Some(curriculum),
                start_date,
                first_sequence: seq.max_valid_sequence() + 1,
                count: missing,
            })?;
            report.generated = generated.len();
            for session in generated {
                seq.insert(session);
            }
        }

        report.renumber = Renumberer::renumber(seq);

        info!(
            class_id = %seq.class_id(),
            curriculum_id = %curriculum.curriculum_id,
            updated = report.updated,
            skipped_attended = report.skipped_attended,
            generated = report.generated,
            "课纲内容同步完成"
        );
        Ok(report)
    }
}
