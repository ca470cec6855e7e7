// ==========================================
// 课程排课系统 - 排课 API
// ==========================================
// 职责: 课次生成、修复操作、进度与日志查询
// 红线: 写操作全部经 RepairExecutor（班级锁 + 单事务 + 操作日志）
// 红线: 已考勤课次不被移动、改号、改内容或删除
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::executor::{OperationOutcome, RepairExecutor, RepairOutput};
use crate::domain::action_log::ActionType;
use crate::domain::curriculum::Curriculum;
use crate::domain::timetable::{ClassTarget, RecurringSlot, Timetable};
use crate::engine::conflict::ScheduleConflictChecker;
use crate::engine::generator::{GenerationRequest, SessionGenerator};
use crate::engine::report::GenerateReport;
use crate::engine::sequence::SessionSequence;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::class_target_repo::ClassTargetRepository;
use crate::repository::curriculum_repo::CurriculumRepository;
use crate::repository::session_repo::SessionRepository;
use crate::repository::slot_repo::SlotRepository;

mod queries;
mod repair;

pub use queries::ProgressSummary;

// ==========================================
// ScheduleApi - 排课 API
// ==========================================

/// 排课API
///
/// 职责：
/// 1. 初次生成（课表 + 课纲 + 目标课次数 + 开课日期）
/// 2. 修复操作（内容同步、整体重建、时间调整、孤儿映射、取消顺延、重新编号、手工改期）
/// 3. 查询（进度、课次列表、操作日志）
pub struct ScheduleApi {
    executor: Arc<RepairExecutor>,
    session_repo: Arc<SessionRepository>,
    class_target_repo: Arc<ClassTargetRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl ScheduleApi {
    pub fn new(
        executor: Arc<RepairExecutor>,
        session_repo: Arc<SessionRepository>,
        class_target_repo: Arc<ClassTargetRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            executor,
            session_repo,
            class_target_repo,
            action_log_repo,
        }
    }

    // ==========================================
    // 初次生成
    // ==========================================

    /// 为班级生成课次
    ///
    /// # 参数
    /// - slots: 班级课表（同一星期至多一个时段）
    /// - curriculum: 课纲（可选，提供时一并保存并关联）
    /// - target_count: 目标课次数
    /// - start_date: 开课日期（含当天）
    ///
    /// # 错误
    /// - InvalidInput: 参数非法
    /// - BusinessRuleViolation: 班级已有课次
    /// - ScheduleConflict: 时段与其他班级冲突
    /// - ConfigurationError: 课表在搜索窗口内无匹配日期
    #[instrument(skip(self, slots, curriculum), fields(class_id = %class_id, target_count = %target_count))]
    pub fn generate(
        &self,
        class_id: &str,
        slots: Vec<RecurringSlot>,
        curriculum: Option<Curriculum>,
        target_count: i32,
        start_date: NaiveDate,
    ) -> ApiResult<OperationOutcome<GenerateReport>> {
        // 参数验证
        if class_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("班级ID不能为空".to_string()));
        }
        if target_count <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "目标课次数必须为正数: {}",
                target_count
            )));
        }
        let slots = normalize_slots(class_id, slots)?;
        if let Some(curriculum) = &curriculum {
            curriculum.validate().map_err(ApiError::InvalidInput)?;
        }
        let timetable = Timetable::new(slots.clone());

        self.executor.execute(class_id, |conn, settings| {
            if SessionRepository::exists_for_class_tx(conn, class_id)? {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "班级已有课次，请使用内容同步或整体重建: class_id={}",
                    class_id
                )));
            }

            // 课表整体替换，逐个时段做冲突检查
            SlotRepository::replace_for_class_tx(conn, class_id, &[])?;
            for slot in &slots {
                if let Some(existing) = SlotRepository::find_by_id_tx(conn, &slot.slot_id)? {
                    if existing.class_id != class_id {
                        return Err(ApiError::InvalidInput(format!(
                            "时段ID已属于其他班级: slot_id={}, class_id={}",
                            slot.slot_id, existing.class_id
                        )));
                    }
                }
                let same_day = SlotRepository::find_by_day_tx(conn, slot.day_of_week)?;
                let report =
                    ScheduleConflictChecker::check(slot, &same_day, self.executor.directory());
                if report.has_conflicts() {
                    return Err(ApiError::ScheduleConflict(report));
                }
                SlotRepository::upsert_tx(conn, slot)?;
            }

            if let Some(curriculum) = &curriculum {
                CurriculumRepository::save_tx(conn, curriculum)?;
            }
            let target = ClassTarget {
                class_id: class_id.to_string(),
                total_sessions: target_count,
                start_date,
                curriculum_id: curriculum.as_ref().map(|c| c.curriculum_id.clone()),
            };
            ClassTargetRepository::upsert_tx(conn, &target)?;

            let generator = SessionGenerator::new(settings);
            let sessions = generator.generate(&GenerationRequest {
                class_id,
                timetable: &timetable,
                curriculum: curriculum.as_ref(),
                start_date,
                first_sequence: 1,
                count: target_count as usize,
            })?;

            let mut seq = SessionSequence::new(class_id, Vec::new(), HashSet::new());
            let session_ids: Vec<String> = sessions.iter().map(|s| s.session_id.clone()).collect();
            for session in sessions {
                seq.insert(session);
            }

            Ok(RepairOutput {
                action: ActionType::Generate,
                sequence: Some(seq),
                detail: format!(
                    "生成课次{}个, 开课日期={}, 时段数={}",
                    session_ids.len(),
                    start_date,
                    slots.len()
                ),
                report: GenerateReport {
                    generated: session_ids.len(),
                    session_ids,
                },
            })
        })
    }
}

/// 校验并补全时段（缺省ID生成 UUID）
fn normalize_slots(class_id: &str, slots: Vec<RecurringSlot>) -> ApiResult<Vec<RecurringSlot>> {
    let mut seen_days = HashSet::new();
    let mut normalized = Vec::with_capacity(slots.len());
    for mut slot in slots {
        if slot.class_id != class_id {
            return Err(ApiError::InvalidInput(format!(
                "时段所属班级不一致: slot_class_id={}, class_id={}",
                slot.class_id, class_id
            )));
        }
        if slot.slot_id.trim().is_empty() {
            slot.slot_id = uuid::Uuid::new_v4().to_string();
        }
        ScheduleConflictChecker::validate_window(&slot).map_err(ApiError::InvalidInput)?;
        if !seen_days.insert(slot.day_of_week) {
            return Err(ApiError::InvalidInput(format!(
                "同一星期只能有一个时段: day={}",
                slot.day_of_week
            )));
        }
        normalized.push(slot);
    }
    Ok(normalized)
}
