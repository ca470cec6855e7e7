use super::*;

use chrono::NaiveTime;

use crate::engine::adjust::ScheduleTimeAdjuster;
use crate::engine::cancellation::CancellationHandler;
use crate::engine::orphan::OrphanMapper;
use crate::engine::regenerate::FullRegenerator;
use crate::engine::renumber::Renumberer;
use crate::engine::report::{
    AdjustReport, CancellationReport, OrphanReport, RegenerateReport, RenumberReport,
    RescheduleReport, ResyncReport, StartDateChangePath, StartDateChangeReport,
};
use crate::engine::reschedule::SessionRescheduler;
use crate::engine::resync::ContentResynchronizer;
use tracing::{info, warn};

impl ScheduleApi {
    // ==========================================
    // 修复操作
    // ==========================================

    /// 课纲内容同步
    ///
    /// 保存课纲并关联到班级，未考勤课次按序号镜像单元内容；有效课次不足目标时补齐尾部
    #[instrument(skip(self, curriculum), fields(class_id = %class_id, curriculum_id = %curriculum.curriculum_id))]
    pub fn resync(
        &self,
        class_id: &str,
        curriculum: &Curriculum,
    ) -> ApiResult<OperationOutcome<ResyncReport>> {
        if curriculum.is_empty() {
            return Err(ApiError::ConfigurationError(format!(
                "课纲没有任何单元: curriculum_id={}",
                curriculum.curriculum_id
            )));
        }
        curriculum.validate().map_err(ApiError::InvalidInput)?;

        self.executor.execute(class_id, |conn, settings| {
            let mut scope = RepairExecutor::load_scope(conn, class_id)?;
            let mut seq = self.executor.load_sequence(conn, class_id)?;

            CurriculumRepository::save_tx(conn, curriculum)?;
            scope.target.curriculum_id = Some(curriculum.curriculum_id.clone());
            ClassTargetRepository::upsert_tx(conn, &scope.target)?;

            let resynchronizer = ContentResynchronizer::new(SessionGenerator::new(settings));
            let report = resynchronizer.resync(&mut seq, &scope.target, &scope.timetable, curriculum)?;

            Ok(RepairOutput {
                action: ActionType::Resync,
                sequence: Some(seq),
                detail: format!(
                    "课纲同步: curriculum_id={}, 更新{}个, 跳过已考勤{}个, 补齐{}个",
                    curriculum.curriculum_id, report.updated, report.skipped_attended, report.generated
                ),
                report,
            })
        })
    }

    /// 从新开课日期整体重建（严格模式）
    ///
    /// 存在已考勤课次时返回 HistoryConflict，不做任何修改
    #[instrument(skip(self), fields(class_id = %class_id, new_start_date = %new_start_date))]
    pub fn regenerate_from_start_date(
        &self,
        class_id: &str,
        new_start_date: NaiveDate,
    ) -> ApiResult<OperationOutcome<RegenerateReport>> {
        self.executor.execute(class_id, |conn, settings| {
            let mut scope = RepairExecutor::load_scope(conn, class_id)?;
            let mut seq = self.executor.load_sequence(conn, class_id)?;

            scope.target.start_date = new_start_date;
            let regenerator = FullRegenerator::new(SessionGenerator::new(settings));
            let report = regenerator.regenerate(
                &mut seq,
                &scope.target,
                &scope.timetable,
                scope.curriculum.as_ref(),
            )?;
            ClassTargetRepository::upsert_tx(conn, &scope.target)?;

            Ok(RepairOutput {
                action: ActionType::Regenerate,
                sequence: Some(seq),
                detail: format!(
                    "整体重建: 开课日期={}, 删除{}个, 生成{}个",
                    new_start_date, report.deleted, report.generated
                ),
                report,
            })
        })
    }

    /// 变更开课日期
    ///
    /// 先尝试整体重建；存在已考勤课次时在同一事务内降级为时间调整（日期下限为新开课日期）
    #[instrument(skip(self), fields(class_id = %class_id, new_start_date = %new_start_date))]
    pub fn change_start_date(
        &self,
        class_id: &str,
        new_start_date: NaiveDate,
    ) -> ApiResult<OperationOutcome<StartDateChangeReport>> {
        self.executor.execute(class_id, |conn, settings| {
            let mut scope = RepairExecutor::load_scope(conn, class_id)?;
            let mut seq = self.executor.load_sequence(conn, class_id)?;

            scope.target.start_date = new_start_date;
            let regenerator = FullRegenerator::new(SessionGenerator::new(settings));
            let report = match regenerator.regenerate(
                &mut seq,
                &scope.target,
                &scope.timetable,
                scope.curriculum.as_ref(),
            ) {
                Ok(regenerate) => StartDateChangeReport {
                    path: StartDateChangePath::Regenerated,
                    regenerate: Some(regenerate),
                    adjust: None,
                },
                Err(e) if e.is_history_conflict() => {
                    warn!(
                        class_id = %class_id,
                        error = %e,
                        "整体重建被拒绝，降级为时间调整"
                    );
                    let adjuster = ScheduleTimeAdjuster::new(settings.slot_search_days);
                    let adjust = adjuster.adjust(&mut seq, &scope.timetable, Some(new_start_date))?;
                    StartDateChangeReport {
                        path: StartDateChangePath::AdjustedInPlace,
                        regenerate: None,
                        adjust: Some(adjust),
                    }
                }
                Err(e) => return Err(e.into()),
            };
            ClassTargetRepository::upsert_tx(conn, &scope.target)?;

            Ok(RepairOutput {
                action: ActionType::Regenerate,
                sequence: Some(seq),
                detail: format!("开课日期变更: {}, 路径={:?}", new_start_date, report.path),
                report,
            })
        })
    }

    /// 课表变更后的时间调整
    ///
    /// `changed_slot_id` 已不存在时视为被删除：先解除关联再调整
    #[instrument(skip(self), fields(class_id = %class_id, changed_slot_id = %changed_slot_id))]
    pub fn adjust_for_schedule_change(
        &self,
        class_id: &str,
        changed_slot_id: &str,
    ) -> ApiResult<OperationOutcome<AdjustReport>> {
        self.executor.execute(class_id, |conn, settings| {
            let scope = RepairExecutor::load_scope(conn, class_id)?;
            let mut seq = self.executor.load_sequence(conn, class_id)?;

            match SlotRepository::find_by_id_tx(conn, changed_slot_id)? {
                Some(slot) if slot.class_id != class_id => {
                    return Err(ApiError::InvalidInput(format!(
                        "时段不属于该班级: slot_id={}, slot_class_id={}",
                        changed_slot_id, slot.class_id
                    )));
                }
                Some(_) => {}
                None => {
                    let detached = OrphanMapper::detach_slot(&mut seq, changed_slot_id);
                    info!(slot_id = %changed_slot_id, detached = detached, "时段已删除，解除课次关联");
                }
            }

            let adjuster = ScheduleTimeAdjuster::new(settings.slot_search_days);
            let report = adjuster.adjust(&mut seq, &scope.timetable, None)?;

            Ok(RepairOutput {
                action: ActionType::AdjustSchedule,
                sequence: Some(seq),
                detail: format!(
                    "课表变更调整: slot_id={}, 移动{}个, 固定{}个",
                    changed_slot_id, report.moved, report.fixed
                ),
                report,
            })
        })
    }

    /// 孤儿课次映射
    #[instrument(skip(self), fields(class_id = %class_id))]
    pub fn map_orphans(&self, class_id: &str) -> ApiResult<OperationOutcome<OrphanReport>> {
        self.executor.execute(class_id, |conn, _settings| {
            let scope = RepairExecutor::load_scope(conn, class_id)?;
            let mut seq = self.executor.load_sequence(conn, class_id)?;
            let report = OrphanMapper::map(&mut seq, &scope.timetable);

            Ok(RepairOutput {
                action: ActionType::MapOrphans,
                sequence: Some(seq),
                detail: format!(
                    "孤儿课次映射: 挂接{}个, 未匹配{}个",
                    report.mapped,
                    report.unmatched_session_ids.len()
                ),
                report,
            })
        })
    }

    /// 取消课次（平移 + 补课）
    ///
    /// # 错误
    /// - NotFound: 课次不存在
    /// - InvalidStateTransition: 课次已取消
    /// - HistoryConflict: 课次本身或其后的有效课次已考勤
    /// - SearchExhausted: 找不到补课日期（整体回滚）
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub fn cancel(
        &self,
        session_id: &str,
        reason: Option<String>,
    ) -> ApiResult<OperationOutcome<CancellationReport>> {
        let class_id = self.class_of_session(session_id)?;

        self.executor.execute(&class_id, |conn, settings| {
            let scope = RepairExecutor::load_scope(conn, &class_id)?;
            let mut seq = self.executor.load_sequence(conn, &class_id)?;

            let handler = CancellationHandler::new(
                SessionGenerator::new(settings),
                settings.slot_search_days,
            );
            let report = handler.cancel(
                &mut seq,
                &scope.target,
                &scope.timetable,
                scope.curriculum.as_ref(),
                session_id,
                reason,
            )?;

            Ok(RepairOutput {
                action: ActionType::Cancel,
                sequence: Some(seq),
                detail: format!(
                    "取消课次: session_id={}, 前移{}个, 补课={}",
                    session_id,
                    report.shifted,
                    report.appended_session_id.as_deref().unwrap_or("无")
                ),
                report,
            })
        })
    }

    /// 重新编号
    #[instrument(skip(self), fields(class_id = %class_id))]
    pub fn renumber(&self, class_id: &str) -> ApiResult<OperationOutcome<RenumberReport>> {
        self.executor.execute(class_id, |conn, _settings| {
            // 班级必须存在
            ClassTargetRepository::get_tx(conn, class_id)?;
            let mut seq = self.executor.load_sequence(conn, class_id)?;
            let report = Renumberer::renumber(&mut seq);

            Ok(RepairOutput {
                action: ActionType::Renumber,
                sequence: Some(seq),
                detail: format!(
                    "重新编号: 改号{}个, 锁定跳过{}个",
                    report.renumbered, report.skipped_locked
                ),
                report,
            })
        })
    }

    /// 单课次手工改期
    #[instrument(skip(self), fields(session_id = %session_id, date = %date))]
    pub fn reschedule_session(
        &self,
        session_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> ApiResult<OperationOutcome<RescheduleReport>> {
        if end_time <= start_time {
            return Err(ApiError::InvalidInput(format!(
                "结束时间必须晚于开始时间: {}-{}",
                start_time.format("%H:%M"),
                end_time.format("%H:%M")
            )));
        }
        let class_id = self.class_of_session(session_id)?;

        self.executor.execute(&class_id, |conn, _settings| {
            let scope = RepairExecutor::load_scope(conn, &class_id)?;
            let mut seq = self.executor.load_sequence(conn, &class_id)?;
            let report = SessionRescheduler::reschedule(
                &mut seq,
                &scope.timetable,
                session_id,
                date,
                start_time,
                end_time,
            )?;

            Ok(RepairOutput {
                action: ActionType::Reschedule,
                sequence: Some(seq),
                detail: format!(
                    "手工改期: session_id={}, date={}, {}-{}",
                    session_id,
                    date,
                    start_time.format("%H:%M"),
                    end_time.format("%H:%M")
                ),
                report,
            })
        })
    }

    fn class_of_session(&self, session_id: &str) -> ApiResult<String> {
        self.session_repo
            .find_by_id(session_id)?
            .map(|s| s.class_id)
            .ok_or_else(|| ApiError::NotFound(format!("lesson_session(id={})不存在", session_id)))
    }
}
