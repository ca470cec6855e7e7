// ==========================================
// 课程排课系统 - 课纲领域模型
// ==========================================
// 职责: 有序课纲单元，按序号与课次对齐
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CurriculumUnit - 课纲单元
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumUnit {
    pub unit_id: String,              // 单元ID
    pub curriculum_id: String,        // 所属课纲
    pub sequence_number: i32,         // 序号 (课纲内唯一, 从1开始)
    pub title: String,                // 标题
    pub objectives: Option<String>,   // 教学目标
    pub body: Option<String>,         // 正文/教案
    pub resources: Vec<String>,       // 资源引用
}

// ==========================================
// Curriculum - 课纲
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curriculum {
    pub curriculum_id: String,
    pub name: String,
    pub units: Vec<CurriculumUnit>,
}

impl Curriculum {
    /// 查找与课次序号对应的单元
    pub fn unit_for(&self, sequence_number: i32) -> Option<&CurriculumUnit> {
        if sequence_number <= 0 {
            return None;
        }
        self.units
            .iter()
            .find(|u| u.sequence_number == sequence_number)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 校验单元序号: 必须为正且唯一
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for unit in &self.units {
            if unit.sequence_number <= 0 {
                return Err(format!(
                    "课纲单元序号必须为正整数: unit_id={}, sequence_number={}",
                    unit.unit_id, unit.sequence_number
                ));
            }
            if !seen.insert(unit.sequence_number) {
                return Err(format!(
                    "课纲单元序号重复: curriculum_id={}, sequence_number={}",
                    self.curriculum_id, unit.sequence_number
                ));
            }
        }
        Ok(())
    }
}
