// ==========================================
// 课程排课系统 - 引擎层
// ==========================================
// 职责: 课次生成与修复算法，全部作用于内存中的 SessionSequence
// 红线: Engine 不拼 SQL，不做网络 I/O
// 红线: 已考勤课次不被任何自动修复操作移动、改号、改内容或删除
// ==========================================

pub mod adjust;
pub mod cancellation;
pub mod collaborators;
pub mod conflict;
pub mod error;
pub mod events;
pub mod generator;
pub mod locks;
pub mod orphan;
pub mod regenerate;
pub mod renumber;
pub mod report;
pub mod reschedule;
pub mod resync;
pub mod sequence;
pub mod settings;

// 重导出核心引擎
pub use adjust::ScheduleTimeAdjuster;
pub use cancellation::CancellationHandler;
pub use collaborators::{
    AcceptAllDirectory, AttendanceStore, InMemoryAttendanceStore, StaticDirectory,
    TeacherRoomDirectory,
};
pub use conflict::{ConflictKind, ScheduleConflictChecker, ScheduleConflictReport, SlotConflict};
pub use error::{EngineResult, ScheduleEngineError};
pub use events::{
    CalendarDispatch, CalendarOp, CalendarSync, CalendarSyncSummary, NoOpCalendarSync,
    OptionalCalendarSync,
};
pub use generator::{GenerationRequest, SessionGenerator};
pub use locks::ClassLockRegistry;
pub use orphan::OrphanMapper;
pub use regenerate::FullRegenerator;
pub use renumber::Renumberer;
pub use report::{
    AdjustReport, CancellationReport, GenerateReport, OrphanReport, RegenerateReport,
    RenumberReport, RescheduleReport, ResyncReport, StartDateChangePath, StartDateChangeReport,
};
pub use reschedule::SessionRescheduler;
pub use resync::ContentResynchronizer;
pub use sequence::{SequenceChanges, SessionSequence};
pub use settings::EngineSettings;
