// ==========================================
// 课程排课系统 - 课次生成器
// ==========================================
// 职责: 从起始日期逐日前进，按周课表生成课次并镜像课纲单元
// 红线: 搜索有界（连续无匹配日期超过上限即报配置错误），保证终止
// 红线: 失败时不产生任何课次
// ==========================================

use crate::domain::curriculum::Curriculum;
use crate::domain::session::Session;
use crate::domain::timetable::Timetable;
use crate::domain::types::SessionStatus;
use crate::engine::error::{EngineResult, ScheduleEngineError};
use crate::engine::settings::EngineSettings;
use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

/// 一次生成请求
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub class_id: &'a str,
    pub timetable: &'a Timetable,
    pub curriculum: Option<&'a Curriculum>,
    /// 起始日期（含）
    pub start_date: NaiveDate,
    /// 第一个新课次的序号
    pub first_sequence: i32,
    /// 生成数量
    pub count: usize,
}

// ==========================================
// SessionGenerator - 课次生成器
// ==========================================
#[derive(Debug, Clone)]
pub struct SessionGenerator {
    search_days: u32,
    title_prefix: String,
}

impl SessionGenerator {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            search_days: settings.generation_search_days,
            title_prefix: settings.default_title_prefix.clone(),
        }
    }

    pub fn title_prefix(&self) -> &str {
        &self.title_prefix
    }

    /// 生成课次
    ///
    /// # 返回
    /// - Ok(sessions): 按日期升序、序号从 `first_sequence` 连续递增
    /// - Err(Configuration): 课表为空，或连续 `search_days` 天无匹配时段
    pub fn generate(&self, req: &GenerationRequest<'_>) -> EngineResult<Vec<Session>> {
        if req.count == 0 {
            return Ok(Vec::new());
        }
        if req.timetable.is_empty() {
            return Err(ScheduleEngineError::Configuration(format!(
                "班级 {} 没有任何周循环时段，无法生成课次",
                req.class_id
            )));
        }

        let mut sessions = Vec::with_capacity(req.count);
        let mut date = req.start_date;
        let mut idle_days: u32 = 0;
        let mut sequence = req.first_sequence;

        while sessions.len() < req.count {
            match req.timetable.slot_for_date(date) {
                Some(slot) => {
                    idle_days = 0;
                    let mut session = Session {
                        session_id: Uuid::new_v4().to_string(),
                        class_id: req.class_id.to_string(),
                        sequence_number: sequence,
                        status: SessionStatus::Scheduled,
                        scheduled_date: date,
                        start_time: slot.start_time,
                        end_time: slot.end_time,
                        slot_id: None,
                        teacher_id: None,
                        room_id: None,
                        curriculum_unit_id: None,
                        title: String::new(),
                        objectives: None,
                        body: None,
                        resources: Vec::new(),
                        cancellation_reason: None,
                        calendar_event_id: None,
                    };
                    session.attach_slot(slot);
                    self.apply_content(&mut session, req.curriculum);
                    debug!(
                        class_id = %req.class_id,
                        sequence_number = sequence,
                        date = %date,
                        "生成课次"
                    );
                    sessions.push(session);
                    sequence += 1;
                }
                None => {
                    idle_days += 1;
                    if idle_days > self.search_days {
                        return Err(ScheduleEngineError::Configuration(format!(
                            "班级 {} 自 {} 起连续 {} 天无匹配时段",
                            req.class_id, date, self.search_days
                        )));
                    }
                }
            }
            date = date.succ_opt().ok_or_else(|| {
                ScheduleEngineError::Configuration(format!("日期超出范围: {}", date))
            })?;
        }

        Ok(sessions)
    }

    /// 按当前序号镜像课纲单元，无对应单元时写默认标题
    pub fn apply_content(&self, session: &mut Session, curriculum: Option<&Curriculum>) {
        match curriculum.and_then(|c| c.unit_for(session.sequence_number)) {
            Some(unit) => session.apply_unit(unit),
            None => session.apply_default_content(&self.title_prefix),
        }
    }
}
