// ==========================================
// 课程排课系统 - 课表维护 API
// ==========================================
// 职责: 时段保存/删除/冲突检查，课表变化后在同一事务内调整课次时间
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::executor::{OperationOutcome, RepairExecutor, RepairOutput};
use crate::domain::action_log::ActionType;
use crate::domain::timetable::{RecurringSlot, Timetable};
use crate::engine::adjust::ScheduleTimeAdjuster;
use crate::engine::conflict::{ScheduleConflictChecker, ScheduleConflictReport};
use crate::engine::orphan::OrphanMapper;
use crate::engine::report::AdjustReport;
use crate::engine::sequence::SessionSequence;
use crate::repository::class_target_repo::ClassTargetRepository;
use crate::repository::slot_repo::SlotRepository;
use rusqlite::Connection;

/// 保存时段报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSlotReport {
    pub slot_id: String,
    /// 班级已有课次时的时间调整结果
    pub adjust: Option<AdjustReport>,
}

/// 删除时段报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSlotReport {
    pub slot_id: String,
    /// 解除关联的未考勤课次数
    pub detached: usize,
    pub adjust: Option<AdjustReport>,
}

// ==========================================
// TimetableApi - 课表维护 API
// ==========================================
pub struct TimetableApi {
    executor: Arc<RepairExecutor>,
    slot_repo: Arc<SlotRepository>,
}

impl TimetableApi {
    pub fn new(executor: Arc<RepairExecutor>, slot_repo: Arc<SlotRepository>) -> Self {
        Self {
            executor,
            slot_repo,
        }
    }

    /// 保存时段（新增或修改）
    ///
    /// 冲突检查通过后写入，班级已有课次时按新课表调整未考勤课次
    #[instrument(skip(self, slot), fields(class_id = %slot.class_id, slot_id = %slot.slot_id))]
    pub fn save_slot(&self, mut slot: RecurringSlot) -> ApiResult<OperationOutcome<SaveSlotReport>> {
        if slot.class_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("班级ID不能为空".to_string()));
        }
        if slot.slot_id.trim().is_empty() {
            slot.slot_id = uuid::Uuid::new_v4().to_string();
        }
        ScheduleConflictChecker::validate_window(&slot).map_err(ApiError::InvalidInput)?;

        let class_id = slot.class_id.clone();
        self.executor.execute(&class_id, |conn, settings| {
            if let Some(existing) = SlotRepository::find_by_id_tx(conn, &slot.slot_id)? {
                if existing.class_id != slot.class_id {
                    return Err(ApiError::InvalidInput(format!(
                        "不允许修改时段所属班级: slot_id={}, {} -> {}",
                        slot.slot_id, existing.class_id, slot.class_id
                    )));
                }
            }
            let report = Self::conflicts_tx(conn, &slot, self.executor.as_ref())?;
            if report.has_conflicts() {
                return Err(ApiError::ScheduleConflict(report));
            }

            let mut seq = self.sequence_if_scheduled(conn, &class_id)?;
            SlotRepository::upsert_tx(conn, &slot)?;

            let adjust = match seq.as_mut() {
                Some(seq) => {
                    let timetable = Timetable::new(SlotRepository::find_by_class_tx(conn, &class_id)?);
                    let adjuster = ScheduleTimeAdjuster::new(settings.slot_search_days);
                    Some(adjuster.adjust(seq, &timetable, None)?)
                }
                None => None,
            };

            Ok(RepairOutput {
                action: ActionType::SaveSlot,
                sequence: seq,
                detail: format!(
                    "保存时段: slot_id={}, day={}, {}-{}, teacher={}",
                    slot.slot_id,
                    slot.day_of_week,
                    slot.start_time.format("%H:%M"),
                    slot.end_time.format("%H:%M"),
                    slot.teacher_id
                ),
                report: SaveSlotReport {
                    slot_id: slot.slot_id.clone(),
                    adjust,
                },
            })
        })
    }

    /// 删除时段
    ///
    /// 关联的未考勤课次成为孤儿；课表仍有时段时按剩余时段调整
    #[instrument(skip(self), fields(slot_id = %slot_id))]
    pub fn delete_slot(&self, slot_id: &str) -> ApiResult<OperationOutcome<DeleteSlotReport>> {
        let class_id = self
            .slot_repo
            .find_by_id(slot_id)?
            .map(|s| s.class_id)
            .ok_or_else(|| ApiError::NotFound(format!("recurring_slot(id={})不存在", slot_id)))?;

        self.executor.execute(&class_id, |conn, settings| {
            if SlotRepository::find_by_id_tx(conn, slot_id)?.is_none() {
                return Err(ApiError::NotFound(format!("recurring_slot(id={})不存在", slot_id)));
            }
            let mut seq = self.sequence_if_scheduled(conn, &class_id)?;
            SlotRepository::delete_tx(conn, slot_id)?;

            let timetable = Timetable::new(SlotRepository::find_by_class_tx(conn, &class_id)?);
            let mut detached = 0;
            let mut adjust = None;
            if let Some(seq) = seq.as_mut() {
                detached = OrphanMapper::detach_slot(seq, slot_id);
                if timetable.is_empty() {
                    warn!(
                        class_id = %class_id,
                        detached = detached,
                        "班级课表已清空，课次保留为孤儿"
                    );
                } else {
                    let adjuster = ScheduleTimeAdjuster::new(settings.slot_search_days);
                    adjust = Some(adjuster.adjust(seq, &timetable, None)?);
                }
            }

            Ok(RepairOutput {
                action: ActionType::DeleteSlot,
                sequence: seq,
                detail: format!("删除时段: slot_id={}, 解除关联{}个", slot_id, detached),
                report: DeleteSlotReport {
                    slot_id: slot_id.to_string(),
                    detached,
                    adjust,
                },
            })
        })
    }

    /// 冲突检查（只读）
    pub fn check_slot_conflicts(&self, slot: &RecurringSlot) -> ApiResult<ScheduleConflictReport> {
        ScheduleConflictChecker::validate_window(slot).map_err(ApiError::InvalidInput)?;
        self.executor
            .read(|conn| Self::conflicts_tx(conn, slot, self.executor.as_ref()))
    }

    /// 班级课表
    pub fn list_slots(&self, class_id: &str) -> ApiResult<Vec<RecurringSlot>> {
        Ok(self.slot_repo.find_by_class(class_id)?)
    }

    fn conflicts_tx(
        conn: &Connection,
        slot: &RecurringSlot,
        executor: &RepairExecutor,
    ) -> ApiResult<ScheduleConflictReport> {
        let same_day = SlotRepository::find_by_day_tx(conn, slot.day_of_week)?;
        Ok(ScheduleConflictChecker::check(slot, &same_day, executor.directory()))
    }

    /// 班级已设排课目标且有课次时加载序列
    fn sequence_if_scheduled(
        &self,
        conn: &Connection,
        class_id: &str,
    ) -> ApiResult<Option<SessionSequence>> {
        if ClassTargetRepository::find_tx(conn, class_id)?.is_none() {
            return Ok(None);
        }
        let seq = self.executor.load_sequence(conn, class_id)?;
        Ok(if seq.is_empty() { None } else { Some(seq) })
    }
}
