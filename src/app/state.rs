// ==========================================
// 课程排课系统 - 应用状态
// ==========================================
// 职责: 从一个数据库路径装配仓储、协作方与 API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{RepairExecutor, ScheduleApi, TimetableApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version};
use crate::engine::collaborators::{AcceptAllDirectory, AttendanceStore, TeacherRoomDirectory};
use crate::engine::events::{CalendarSync, OptionalCalendarSync};
use crate::engine::locks::ClassLockRegistry;
use crate::repository::{
    ActionLogRepository, AttendanceRepository, ClassTargetRepository, CurriculumRepository,
    SessionRepository, SlotRepository,
};

/// 外部协作方
///
/// 未提供时：考勤读本库 session_attendance 表，目录全部放行，不推送日历
#[derive(Default, Clone)]
pub struct AppCollaborators {
    pub attendance: Option<Arc<dyn AttendanceStore>>,
    pub directory: Option<Arc<dyn TeacherRoomDirectory>>,
    pub calendar: Option<Arc<dyn CalendarSync>>,
}

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 排课API
    pub schedule_api: Arc<ScheduleApi>,

    /// 课表维护API
    pub timetable_api: Arc<TimetableApi>,

    /// 课纲仓储（resync 前维护课纲）
    pub curriculum_repo: Arc<CurriculumRepository>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例（默认协作方）
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_collaborators(db_path, AppCollaborators::default())
    }

    /// 创建AppState并注入外部协作方
    ///
    /// # 说明
    /// 1. 打开共享连接并初始化 schema
    /// 2. 初始化所有Repository
    /// 3. 创建执行器与API实例
    pub fn with_collaborators(
        db_path: String,
        collaborators: AppCollaborators,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(version) => tracing::info!("schema_version: {:?}", version),
            Err(e) => tracing::warn!("读取 schema_version 失败(将继续启动): {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let session_repo = Arc::new(SessionRepository::new(conn.clone()));
        let slot_repo = Arc::new(SlotRepository::new(conn.clone()));
        let class_target_repo = Arc::new(ClassTargetRepository::new(conn.clone()));
        let curriculum_repo = Arc::new(CurriculumRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 外部协作方
        // ==========================================

        // 考勤查询发生在事务内，默认实现使用独立连接
        let attendance: Arc<dyn AttendanceStore> = match collaborators.attendance {
            Some(store) => store,
            None => Arc::new(
                AttendanceRepository::new(&db_path)
                    .map_err(|e| format!("无法创建AttendanceRepository: {}", e))?,
            ),
        };
        let directory: Arc<dyn TeacherRoomDirectory> = collaborators
            .directory
            .unwrap_or_else(|| Arc::new(AcceptAllDirectory));
        let calendar = match collaborators.calendar {
            Some(sync) => OptionalCalendarSync::with_sync(sync),
            None => OptionalCalendarSync::none(),
        };

        // ==========================================
        // 初始化API层
        // ==========================================
        let executor = Arc::new(RepairExecutor::new(
            conn,
            session_repo.clone(),
            config_manager.clone(),
            attendance,
            directory,
            calendar,
            Arc::new(ClassLockRegistry::new()),
        ));

        let schedule_api = Arc::new(ScheduleApi::new(
            executor.clone(),
            session_repo,
            class_target_repo,
            action_log_repo,
        ));
        let timetable_api = Arc::new(TimetableApi::new(executor, slot_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            schedule_api,
            timetable_api,
            curriculum_repo,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先读取环境变量 LESSON_SCHEDULER_DB_PATH，否则使用用户数据目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("LESSON_SCHEDULER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./lesson_scheduler.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("lesson-scheduler-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("lesson-scheduler");
        }

        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&path).is_ok() {
            path = path.join("lesson_scheduler.db");
        } else {
            path = PathBuf::from("./lesson_scheduler.db");
        }
    }

    path.to_string_lossy().to_string()
}
