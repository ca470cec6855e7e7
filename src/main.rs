// ==========================================
// 课程排课系统 - 主入口
// ==========================================
// 职责: 初始化日志与数据库，输出当前配置与班级概况
// 用法: lesson-scheduler [db_path] [class_id]
// ==========================================

use lesson_scheduler::app::{get_default_db_path, AppState};
use lesson_scheduler::logging;

fn main() {
    // 初始化日志系统
    if std::env::var("LESSON_SCHEDULER_LOG_JSON").is_ok() {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{}", lesson_scheduler::APP_NAME);
    tracing::info!("系统版本: {}", lesson_scheduler::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            std::process::exit(1);
        }
    };

    match state.config_manager.get_config_snapshot() {
        Ok(snapshot) => tracing::info!("当前配置: {}", snapshot),
        Err(e) => tracing::warn!("读取配置快照失败: {}", e),
    }

    if let Some(class_id) = args.next() {
        match state.schedule_api.progress(&class_id) {
            Ok(progress) => match serde_json::to_string_pretty(&progress) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::error!("进度序列化失败: {}", e),
            },
            Err(e) => {
                tracing::error!("查询班级进度失败: {}", e);
                std::process::exit(1);
            }
        }
    }
}
