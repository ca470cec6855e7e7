// ==========================================
// 课程排课系统 - 整体重建（开课日期变更）
// ==========================================
// 前置: 没有任何课次带考勤；否则拒绝（HistoryConflict），由调用方降级为时间调整
// 步骤: 删除全部课次 -> 从新开课日期生成 N 个课次 -> 重新编号
// ==========================================

use crate::domain::curriculum::Curriculum;
use crate::domain::timetable::{ClassTarget, Timetable};
use crate::engine::error::{EngineResult, ScheduleEngineError};
use crate::engine::generator::{GenerationRequest, SessionGenerator};
use crate::engine::renumber::Renumberer;
use crate::engine::report::RegenerateReport;
use crate::engine::sequence::SessionSequence;
use tracing::{info, warn};

pub struct FullRegenerator {
    generator: SessionGenerator,
}

impl FullRegenerator {
    pub fn new(generator: SessionGenerator) -> Self {
        Self { generator }
    }

    /// 从 `target.start_date` 整体重建
    pub fn regenerate(
        &self,
        seq: &mut SessionSequence,
        target: &ClassTarget,
        timetable: &Timetable,
        curriculum: Option<&Curriculum>,
    ) -> EngineResult<RegenerateReport> {
        let attended = seq.attended_ids();
        if !attended.is_empty() {
            warn!(
                class_id = %seq.class_id(),
                attended = attended.len(),
                "存在已考勤课次，拒绝整体重建"
            );
            return Err(ScheduleEngineError::history_conflict(
                seq.class_id(),
                "regenerate",
                attended,
            ));
        }

        // 先生成，失败时序列保持原样
        let target_count = target.total_sessions.max(0) as usize;
        let generated = self.generator.generate(&GenerationRequest {
            class_id: seq.class_id(),
            timetable,
            curriculum,
            start_date: target.start_date,
            first_sequence: 1,
            count: target_count.saturating_sub(attended.len()),
        })?;

        let mut report = RegenerateReport::default();
        let existing: Vec<String> = seq.sessions().iter().map(|s| s.session_id.clone()).collect();
        for session_id in existing {
            if seq.remove(&session_id)?.is_some() {
                report.deleted += 1;
            }
        }

        report.generated = generated.len();
        for session in generated {
            seq.insert(session);
        }
        report.renumber = Renumberer::renumber(seq);

        info!(
            class_id = %seq.class_id(),
            start_date = %target.start_date,
            deleted = report.deleted,
            generated = report.generated,
            "整体重建完成"
        );
        Ok(report)
    }
}
