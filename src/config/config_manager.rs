// ==========================================
// 课程排课系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 规则: 缺失或非法的配置值回落到默认值
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::settings::{
    EngineSettings, DEFAULT_ACTOR, DEFAULT_GENERATION_SEARCH_DAYS, DEFAULT_SLOT_SEARCH_DAYS,
    DEFAULT_TITLE_PREFIX,
};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取正整数配置，非法值回落默认
    fn get_positive_u32(&self, key: &str, default: u32) -> Result<u32, Box<dyn Error>> {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match raw.trim().parse::<u32>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = default,
                    "配置值非法，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 写入操作日志，便于追溯某次修复时的参数
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 排程引擎配置 =====

    /// 装配引擎参数
    pub fn get_engine_settings(&self) -> Result<EngineSettings, Box<dyn Error>> {
        let slot_search_days =
            self.get_positive_u32(config_keys::SLOT_SEARCH_DAYS, DEFAULT_SLOT_SEARCH_DAYS)?;
        let generation_search_days = self.get_positive_u32(
            config_keys::GENERATION_SEARCH_DAYS,
            DEFAULT_GENERATION_SEARCH_DAYS,
        )?;

        let prefix = self.get_config_or_default(config_keys::DEFAULT_TITLE_PREFIX, DEFAULT_TITLE_PREFIX)?;
        let default_title_prefix = if prefix.trim().is_empty() {
            DEFAULT_TITLE_PREFIX.to_string()
        } else {
            prefix.trim().to_string()
        };

        let sync_raw = self.get_config_or_default(config_keys::CALENDAR_SYNC_ENABLED, "true")?;
        let calendar_sync_enabled = match sync_raw.trim().to_lowercase().as_str() {
            "false" | "0" | "no" | "off" => false,
            _ => true,
        };

        let actor = self.get_config_or_default(config_keys::DEFAULT_ACTOR, DEFAULT_ACTOR)?;
        let default_actor = if actor.trim().is_empty() {
            DEFAULT_ACTOR.to_string()
        } else {
            actor.trim().to_string()
        };

        Ok(EngineSettings {
            slot_search_days,
            generation_search_days,
            default_title_prefix,
            calendar_sync_enabled,
            default_actor,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 时段搜索窗口（时间调整 / 取消补课）
    pub const SLOT_SEARCH_DAYS: &str = "schedule.slot_search_days";
    // 生成器连续无匹配日期上限
    pub const GENERATION_SEARCH_DAYS: &str = "schedule.generation_search_days";

    // 无课纲单元时的标题前缀
    pub const DEFAULT_TITLE_PREFIX: &str = "schedule.default_title_prefix";

    // 外部日历
    pub const CALENDAR_SYNC_ENABLED: &str = "schedule.calendar_sync_enabled";

    // 操作日志
    pub const DEFAULT_ACTOR: &str = "schedule.default_actor";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = manager().get_engine_settings().unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let cm = manager();
        cm.set_global_config_value(config_keys::SLOT_SEARCH_DAYS, "21").unwrap();
        cm.set_global_config_value(config_keys::GENERATION_SEARCH_DAYS, "-5").unwrap();
        cm.set_global_config_value(config_keys::DEFAULT_TITLE_PREFIX, "第").unwrap();
        cm.set_global_config_value(config_keys::CALENDAR_SYNC_ENABLED, "off").unwrap();

        let settings = cm.get_engine_settings().unwrap();
        assert_eq!(settings.slot_search_days, 21);
        assert_eq!(settings.generation_search_days, DEFAULT_GENERATION_SEARCH_DAYS);
        assert_eq!(settings.default_title_prefix, "第");
        assert!(!settings.calendar_sync_enabled);

        let snapshot: HashMap<String, String> =
            serde_json::from_str(&cm.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(
            cm.get_global_config_value(config_keys::SLOT_SEARCH_DAYS).unwrap().as_deref(),
            Some("21")
        );
    }
}
