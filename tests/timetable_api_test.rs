// ==========================================
// 课表维护 API 集成测试
// ==========================================
// 职责: 时段冲突检查、时段变更后的时间调整、删除时段与孤儿映射
// ==========================================


#[cfg(test)]
mod timetable_api_test {
    use std::sync::Arc;

    use lesson_scheduler::api::ApiError;
    use lesson_scheduler::domain::DayOfWeek;
    use lesson_scheduler::engine::{ConflictKind, StaticDirectory, TeacherRoomDirectory};

    use crate::test_helpers::*;

    fn conflict_kinds(err: ApiError) -> Vec<ConflictKind> {
        match err {
            ApiError::ScheduleConflict(report) => report.conflicts.iter().map(|c| c.kind).collect(),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    // ==========================================
    // 冲突检查
    // ==========================================

    #[test]
    fn test_save_slot_rejects_teacher_and_room_overlap() {
        let env = setup_env();
        generate_scenario_a(&env, "C1", None);

        let teacher_clash = make_slot("C2-MON", "C2", DayOfWeek::Monday, (19, 0), (21, 0), "T1", Some("R2"));
        let err = env.state.timetable_api.save_slot(teacher_clash).unwrap_err();
        assert_eq!(conflict_kinds(err), vec![ConflictKind::TeacherOverlap]);

        let room_clash = make_slot("C2-MON", "C2", DayOfWeek::Monday, (19, 0), (21, 0), "T2", Some("R1"));
        let err = env.state.timetable_api.save_slot(room_clash).unwrap_err();
        assert_eq!(conflict_kinds(err), vec![ConflictKind::RoomOverlap]);

        // 相邻不重叠
        let adjacent = make_slot("C2-MON", "C2", DayOfWeek::Monday, (20, 0), (22, 0), "T1", Some("R1"));
        env.state.timetable_api.save_slot(adjacent).unwrap();
        assert_eq!(env.state.timetable_api.list_slots("C2").unwrap().len(), 1);
    }

    #[test]
    fn test_save_slot_rejects_second_slot_on_same_day() {
        let env = setup_env();
        generate_scenario_a(&env, "C1", None);

        let morning = make_slot("C1-MON-AM", "C1", DayOfWeek::Monday, (9, 0), (11, 0), "T1", Some("R1"));
        let err = env.state.timetable_api.save_slot(morning).unwrap_err();
        assert_eq!(conflict_kinds(err), vec![ConflictKind::DayTaken]);
        assert_eq!(env.state.timetable_api.list_slots("C1").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_teacher_and_room_rejected_by_directory() {
        let directory: Arc<dyn TeacherRoomDirectory> = Arc::new(StaticDirectory::new(["T1"], ["R1"]));
        let env = setup_env_with_directory(Some(directory));

        let slot = make_slot("C1-MON", "C1", DayOfWeek::Monday, (18, 0), (20, 0), "T9", Some("R9"));
        let err = env
            .state
            .schedule_api
            .generate("C1", vec![slot], None, 4, date(2024, 1, 1))
            .unwrap_err();
        assert_eq!(
            conflict_kinds(err),
            vec![ConflictKind::UnknownTeacher, ConflictKind::UnknownRoom]
        );
        assert!(all_sessions(&env, "C1").is_empty());

        generate_scenario_a(&env, "C1", None);
        assert_eq!(valid_sessions(&env, "C1").len(), 4);
    }

    #[test]
    fn test_check_slot_conflicts_is_read_only() {
        let env = setup_env();
        generate_scenario_a(&env, "C1", None);

        let candidate = make_slot("C2-MON", "C2", DayOfWeek::Monday, (18, 30), (19, 30), "T1", None);
        let report = env.state.timetable_api.check_slot_conflicts(&candidate).unwrap();
        assert!(report.has_conflicts());
        assert_eq!(report.conflicts[0].conflicting_class_id.as_deref(), Some("C1"));
        assert!(env.state.timetable_api.list_slots("C2").unwrap().is_empty());
        assert!(env.state.schedule_api.list_action_logs("C2", 10).unwrap().is_empty());

        let free = make_slot("C2-TUE", "C2", DayOfWeek::Tuesday, (18, 0), (20, 0), "T1", None);
        assert!(!env.state.timetable_api.check_slot_conflicts(&free).unwrap().has_conflicts());
    }

    #[test]
    fn test_invalid_window_rejected() {
        let env = setup_env();
        let backwards = make_slot("C1-MON", "C1", DayOfWeek::Monday, (20, 0), (18, 0), "T1", None);
        assert!(matches!(
            env.state.timetable_api.check_slot_conflicts(&backwards),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            env.state.timetable_api.save_slot(backwards),
            Err(ApiError::InvalidInput(_))
        ));
    }

    // ==========================================
    // 时段变更后的时间调整
    // ==========================================

    #[test]
    fn test_moving_slot_to_wednesday_adjusts_sessions() {
        let env = setup_env();
        let before = generate_scenario_a(&env, "C1", None);

        let wednesday = make_slot("C1-MON", "C1", DayOfWeek::Wednesday, (18, 0), (20, 0), "T1", Some("R1"));
        let outcome = env.state.timetable_api.save_slot(wednesday).unwrap();
        let adjust = outcome.report.adjust.unwrap();
        assert_eq!(adjust.moved, 4);
        assert_eq!(adjust.fixed, 0);

        let after = valid_sessions(&env, "C1");
        let dates: Vec<_> = after.iter().map(|s| s.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 3), date(2024, 1, 10), date(2024, 1, 17), date(2024, 1, 24)]
        );
        // 身份与内容不变
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.session_id, a.session_id);
            assert_eq!(b.title, a.title);
            assert_eq!(b.sequence_number, a.sequence_number);
        }

        let logs = env.state.schedule_api.list_action_logs("C1", 10).unwrap();
        assert_eq!(logs[0].action_type, "SaveSlot");
    }

    #[test]
    fn test_time_change_keeps_dates_and_updates_times() {
        let env = setup_env();
        generate_scenario_a(&env, "C1", None);

        let later = make_slot("C1-MON", "C1", DayOfWeek::Monday, (19, 0), (21, 0), "T1", Some("R1"));
        env.state.timetable_api.save_slot(later).unwrap();

        for s in valid_sessions(&env, "C1") {
            assert_eq!(s.start_time, time(19, 0));
            assert_eq!(s.end_time, time(21, 0));
        }
        assert_eq!(valid_sessions(&env, "C1")[0].scheduled_date, date(2024, 1, 1));
    }

    #[test]
    fn test_save_slot_cannot_change_owner_class() {
        let env = setup_env();
        generate_scenario_a(&env, "C1", None);

        let stolen = make_slot("C1-MON", "C2", DayOfWeek::Friday, (18, 0), (20, 0), "T2", None);
        assert!(matches!(
            env.state.timetable_api.save_slot(stolen),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_adjust_with_other_class_slot_is_invalid() {
        let env = setup_env();
        generate_scenario_a(&env, "C1", None);
        env.state
            .timetable_api
            .save_slot(make_slot("C2-TUE", "C2", DayOfWeek::Tuesday, (18, 0), (20, 0), "T2", None))
            .unwrap();

        let err = env
            .state
            .schedule_api
            .adjust_for_schedule_change("C1", "C2-TUE")
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    // ==========================================
    // 删除时段 / 孤儿映射
    // ==========================================

    #[test]
    fn test_delete_last_slot_leaves_orphans() {
        let env = setup_env();
        generate_scenario_a(&env, "C1", None);

        let outcome = env.state.timetable_api.delete_slot("C1-MON").unwrap();
        assert_eq!(outcome.report.detached, 4);
        assert_eq!(outcome.report.adjust, None);
        assert!(env.state.timetable_api.list_slots("C1").unwrap().is_empty());
        assert!(valid_sessions(&env, "C1").iter().all(|s| s.slot_id.is_none()));

        // 课表为空时全部无法映射
        let orphans = env.state.schedule_api.map_orphans("C1").unwrap();
        assert_eq!(orphans.report.mapped, 0);
        assert_eq!(orphans.report.unmatched_session_ids.len(), 4);

        // 重新加回周一时段，调整时重新关联
        let outcome = env.state.timetable_api.save_slot(monday_slot("C1")).unwrap();
        assert!(outcome.report.adjust.is_some());
        assert!(valid_sessions(&env, "C1")
            .iter()
            .all(|s| s.slot_id.as_deref() == Some("C1-MON")));
        assert_ordering_invariant(&env, "C1");
    }

    #[test]
    fn test_delete_one_of_two_slots_moves_sessions_to_remaining_day() {
        let env = setup_env();
        let slots = vec![
            monday_slot("C1"),
            make_slot("C1-THU", "C1", DayOfWeek::Thursday, (18, 0), (20, 0), "T1", Some("R1")),
        ];
        env.state
            .schedule_api
            .generate("C1", slots, None, 4, date(2024, 1, 1))
            .unwrap();

        let outcome = env.state.timetable_api.delete_slot("C1-THU").unwrap();
        assert_eq!(outcome.report.detached, 2);
        assert!(outcome.report.adjust.is_some());

        let after = valid_sessions(&env, "C1");
        assert_eq!(after.len(), 4);
        assert!(after.iter().all(|s| s.slot_id.as_deref() == Some("C1-MON")));
        let dates: Vec<_> = after.iter().map(|s| s.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15), date(2024, 1, 22)]
        );
        assert_ordering_invariant(&env, "C1");
    }

    #[test]
    fn test_map_orphans_attaches_by_weekday() {
        let env = setup_env();
        generate_scenario_a(&env, "C1", None);

        // 外部导入的课次没有时段关联
        let conn = lesson_scheduler::db::open_sqlite_connection(&env.db_path).unwrap();
        conn.execute("UPDATE lesson_session SET slot_id = NULL WHERE class_id = 'C1'", [])
            .unwrap();

        let outcome = env.state.schedule_api.map_orphans("C1").unwrap();
        assert_eq!(outcome.report.mapped, 4);
        assert!(outcome.report.unmatched_session_ids.is_empty());
        assert!(valid_sessions(&env, "C1")
            .iter()
            .all(|s| s.slot_id.as_deref() == Some("C1-MON")));
    }

    #[test]
    fn test_delete_unknown_slot_is_not_found() {
        let env = setup_env();
        assert!(matches!(
            env.state.timetable_api.delete_slot("missing"),
            Err(ApiError::NotFound(_))
        ));
    }
}
