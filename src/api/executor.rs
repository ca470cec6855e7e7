// ==========================================
// 课程排课系统 - 修复操作执行器
// ==========================================
// 职责: 所有写操作共用的执行骨架
// 流程: 班级锁 → IMMEDIATE 事务 → 加载 → 引擎 → 落库 → 操作日志 → 提交 → 日历推送
// 红线: 日历推送必须在事务提交、连接释放之后
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::curriculum::Curriculum;
use crate::domain::timetable::{ClassTarget, Timetable};
use crate::engine::collaborators::{AttendanceStore, TeacherRoomDirectory};
use crate::engine::events::{CalendarOp, CalendarSyncSummary, OptionalCalendarSync};
use crate::engine::locks::ClassLockRegistry;
use crate::engine::sequence::{SequenceChanges, SessionSequence};
use crate::engine::settings::EngineSettings;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::class_target_repo::ClassTargetRepository;
use crate::repository::curriculum_repo::CurriculumRepository;
use crate::repository::session_repo::SessionRepository;
use crate::repository::slot_repo::SlotRepository;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

// ==========================================
// 执行结果
// ==========================================

/// 一次写操作的返回值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome<T> {
    pub class_id: String,
    pub report: T,
    /// 提交后日历推送结果
    pub calendar: CalendarSyncSummary,
}

/// 事务内操作的产出
pub(crate) struct RepairOutput<T> {
    pub action: ActionType,
    /// 需要落库的课次序列（纯时段/目标类写操作为 None）
    pub sequence: Option<SessionSequence>,
    pub report: T,
    pub detail: String,
}

/// 班级排课上下文
pub(crate) struct ClassScope {
    pub target: ClassTarget,
    pub timetable: Timetable,
    pub curriculum: Option<Curriculum>,
}

// ==========================================
// RepairExecutor
// ==========================================
pub struct RepairExecutor {
    conn: Arc<Mutex<Connection>>,
    session_repo: Arc<SessionRepository>,
    config_manager: Arc<ConfigManager>,
    attendance: Arc<dyn AttendanceStore>,
    directory: Arc<dyn TeacherRoomDirectory>,
    calendar: OptionalCalendarSync,
    locks: Arc<ClassLockRegistry>,
}

impl RepairExecutor {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        session_repo: Arc<SessionRepository>,
        config_manager: Arc<ConfigManager>,
        attendance: Arc<dyn AttendanceStore>,
        directory: Arc<dyn TeacherRoomDirectory>,
        calendar: OptionalCalendarSync,
        locks: Arc<ClassLockRegistry>,
    ) -> Self {
        Self {
            conn,
            session_repo,
            config_manager,
            attendance,
            directory,
            calendar,
            locks,
        }
    }

    pub fn directory(&self) -> &dyn TeacherRoomDirectory {
        self.directory.as_ref()
    }

    pub fn session_repo(&self) -> &SessionRepository {
        &self.session_repo
    }

    /// 读取引擎配置
    pub fn settings(&self) -> ApiResult<EngineSettings> {
        self.config_manager
            .get_engine_settings()
            .map_err(|e| ApiError::InternalError(format!("读取引擎配置失败: {}", e)))
    }

    /// 只读访问（不取班级锁）
    pub(crate) fn read<R, F>(&self, f: F) -> ApiResult<R>
    where
        F: FnOnce(&Connection) -> ApiResult<R>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", e)))?;
        f(&conn)
    }

    /// 查询考勤（外部存储）
    pub(crate) fn attended_among(&self, session_ids: &[String]) -> ApiResult<HashSet<String>> {
        if session_ids.is_empty() {
            return Ok(HashSet::new());
        }
        self.attendance
            .attended_among(session_ids)
            .map_err(|e| ApiError::CollaboratorError(format!("考勤查询失败: {}", e)))
    }

    // ==========================================
    // 事务内加载
    // ==========================================

    /// 加载班级目标、课表与已分配课纲
    pub(crate) fn load_scope(conn: &Connection, class_id: &str) -> ApiResult<ClassScope> {
        let target = ClassTargetRepository::get_tx(conn, class_id)?;
        let timetable = Timetable::new(SlotRepository::find_by_class_tx(conn, class_id)?);
        let curriculum = match &target.curriculum_id {
            Some(curriculum_id) => {
                let found = CurriculumRepository::find_by_id_tx(conn, curriculum_id)?;
                if found.is_none() {
                    warn!(
                        class_id = %class_id,
                        curriculum_id = %curriculum_id,
                        "班级关联的课纲不存在，按无课纲处理"
                    );
                }
                found
            }
            None => None,
        };
        Ok(ClassScope {
            target,
            timetable,
            curriculum,
        })
    }

    /// 加载班级课次序列（含考勤信息）
    pub(crate) fn load_sequence(&self, conn: &Connection, class_id: &str) -> ApiResult<SessionSequence> {
        let sessions = SessionRepository::find_by_class_tx(conn, class_id)?;
        let ids: Vec<String> = sessions.iter().map(|s| s.session_id.clone()).collect();
        let attended = self.attended_among(&ids)?;
        Ok(SessionSequence::new(class_id, sessions, attended))
    }

    // ==========================================
    // 执行
    // ==========================================

    /// 在班级锁与单个 IMMEDIATE 事务内执行写操作
    ///
    /// 任一步骤失败整体回滚，不推送日历
    pub(crate) fn execute<T, F>(&self, class_id: &str, op: F) -> ApiResult<OperationOutcome<T>>
    where
        T: Serialize,
        F: FnOnce(&Connection, &EngineSettings) -> ApiResult<RepairOutput<T>>,
    {
        let settings = self.settings()?;

        let class_lock = self.locks.lock_for(class_id).map_err(ApiError::InternalError)?;
        let _class_guard = class_lock
            .lock()
            .map_err(|e| ApiError::InternalError(format!("班级锁获取失败: {}", e)))?;

        let (report, calendar_ops) = {
            let mut conn = self.conn.lock().map_err(|e| {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", e))
            })?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;

            let output = op(&*tx, &settings)?;

            let changes = match output.sequence {
                Some(seq) => seq.into_changes()?,
                None => SequenceChanges::default(),
            };
            Self::persist_changes_tx(&tx, &changes)?;

            let report_json = serde_json::to_value(&output.report)
                .map_err(|e| ApiError::InternalError(format!("报告序列化失败: {}", e)))?;
            let log = ActionLog {
                action_id: uuid::Uuid::new_v4().to_string(),
                class_id: class_id.to_string(),
                action_type: output.action.as_str().to_string(),
                action_ts: chrono::Local::now().naive_local(),
                actor: settings.default_actor.clone(),
                payload_json: Some(json!({
                    "report": report_json,
                    "inserted": changes.inserted.len(),
                    "updated": changes.updated.len(),
                    "deleted": changes.deleted.len(),
                })),
                detail: Some(output.detail),
            };
            ActionLogRepository::insert_tx(&tx, &log)?;

            tx.commit()
                .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;

            info!(
                class_id = %class_id,
                action = %output.action,
                inserted = changes.inserted.len(),
                updated = changes.updated.len(),
                deleted = changes.deleted.len(),
                "修复操作已提交"
            );
            (output.report, changes.calendar_ops)
        };

        let calendar = self.sync_calendar(&settings, &calendar_ops);

        Ok(OperationOutcome {
            class_id: class_id.to_string(),
            report,
            calendar,
        })
    }

    /// 按 删除 → 更新 → 插入 顺序落库
    fn persist_changes_tx(conn: &Connection, changes: &SequenceChanges) -> ApiResult<()> {
        for session in &changes.deleted {
            SessionRepository::delete_tx(conn, &session.session_id)?;
        }
        for session in &changes.updated {
            SessionRepository::update_tx(conn, session)?;
        }
        for session in &changes.inserted {
            SessionRepository::insert_tx(conn, session)?;
        }
        Ok(())
    }

    /// 提交后推送日历；失败只记日志
    fn sync_calendar(&self, settings: &EngineSettings, ops: &[CalendarOp]) -> CalendarSyncSummary {
        if ops.is_empty() {
            return CalendarSyncSummary::default();
        }
        if !settings.calendar_sync_enabled {
            debug!(ops = ops.len(), "日历同步已关闭，跳过推送");
            return CalendarSyncSummary::default();
        }

        let dispatch = self.calendar.dispatch(ops);
        for (session_id, calendar_event_id) in &dispatch.artifact_updates {
            if let Err(e) = self
                .session_repo
                .set_calendar_event_id(session_id, calendar_event_id.as_deref())
            {
                warn!(session_id = %session_id, error = %e, "日历条目ID回写失败");
            }
        }
        dispatch.summary
    }
}
