// ==========================================
// 课程排课系统 - 引擎参数
// ==========================================
// 来源: config_kv (scope=global)，由 ConfigManager::get_engine_settings 装配
// ==========================================

use serde::{Deserialize, Serialize};

pub const DEFAULT_SLOT_SEARCH_DAYS: u32 = 14;
pub const DEFAULT_GENERATION_SEARCH_DAYS: u32 = 365;
pub const DEFAULT_TITLE_PREFIX: &str = "Lesson";
pub const DEFAULT_ACTOR: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// 时间调整/取消补课的逐日搜索上限（天）
    pub slot_search_days: u32,
    /// 生成器连续无匹配日期的上限（天）
    pub generation_search_days: u32,
    /// 无课纲单元时的标题前缀
    pub default_title_prefix: String,
    /// 提交后是否推送外部日历
    pub calendar_sync_enabled: bool,
    /// 操作日志默认操作人
    pub default_actor: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            slot_search_days: DEFAULT_SLOT_SEARCH_DAYS,
            generation_search_days: DEFAULT_GENERATION_SEARCH_DAYS,
            default_title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            calendar_sync_enabled: true,
            default_actor: DEFAULT_ACTOR.to_string(),
        }
    }
}
