// ==========================================
// 排课场景测试
// ==========================================
// 职责: 生成 / 取消顺延 / 开课日期变更降级 / 课纲同步 的端到端行为
// ==========================================


#[cfg(test)]
mod scenario_test {
    use lesson_scheduler::api::ApiError;
    use lesson_scheduler::domain::SessionStatus;
    use lesson_scheduler::engine::StartDateChangePath;

    use crate::test_helpers::*;

    // ==========================================
    // 场景 A: 初次生成
    // ==========================================

    #[test]
    fn test_scenario_a_generate_weekly() {
        let env = setup_env();
        let sessions = generate_scenario_a(&env, "C1", None);

        let dates: Vec<_> = sessions.iter().map(|s| s.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15), date(2024, 1, 22)]
        );
        let numbers: Vec<i32> = sessions.iter().map(|s| s.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        for s in &sessions {
            assert_eq!(s.start_time, time(18, 0));
            assert_eq!(s.end_time, time(20, 0));
            assert_eq!(s.slot_id.as_deref(), Some("C1-MON"));
            assert_eq!(s.teacher_id.as_deref(), Some("T1"));
            assert_eq!(s.status, SessionStatus::Scheduled);
        }
    }

    #[test]
    fn test_scenario_a_with_curriculum_mirrors_units() {
        let env = setup_env();
        let sessions = generate_scenario_a(&env, "C1", Some(make_curriculum("CUR", 4)));
        for (k, s) in sessions.iter().enumerate() {
            assert_eq!(s.title, format!("Unit {}", k + 1));
            assert_eq!(s.curriculum_unit_id.as_deref(), Some(format!("CUR-U{}", k + 1).as_str()));
            assert_eq!(s.resources, vec![format!("res-{}", k + 1)]);
        }
    }

    // ==========================================
    // 场景 B: 取消 + 平移 + 补课
    // ==========================================

    #[test]
    fn test_scenario_b_cancel_shift_and_append() {
        let env = setup_env();
        let before = generate_scenario_a(&env, "C1", Some(make_curriculum("CUR", 4)));
        let victim = before[1].session_id.clone();

        let outcome = env
            .state
            .schedule_api
            .cancel(&victim, Some("teacher sick".to_string()))
            .unwrap();
        assert_eq!(outcome.report.cancelled_session_id, victim);
        assert_eq!(outcome.report.shifted, 2);
        let appended = outcome.report.appended_session_id.clone().unwrap();

        let cancelled = find_session(&env, "C1", &victim);
        assert_eq!(cancelled.status, SessionStatus::Cancelled);
        assert_eq!(cancelled.sequence_number, 0);
        assert_eq!(cancelled.curriculum_unit_id, None);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("teacher sick"));
        assert_eq!(cancelled.scheduled_date, date(2024, 1, 8));

        let after = valid_sessions(&env, "C1");
        assert_eq!(after.len(), 4);
        // 原第 3、4 节前移为 2、3，日期不变，内容随新序号
        assert_eq!(after[1].session_id, before[2].session_id);
        assert_eq!(after[1].scheduled_date, date(2024, 1, 15));
        assert_eq!(after[1].title, "Unit 2");
        assert_eq!(after[2].session_id, before[3].session_id);
        assert_eq!(after[2].scheduled_date, date(2024, 1, 22));
        assert_eq!(after[2].title, "Unit 3");
        // 新课次补在 01-29，序号 4
        assert_eq!(after[3].session_id, appended);
        assert_eq!(after[3].scheduled_date, date(2024, 1, 29));
        assert_eq!(after[3].sequence_number, 4);
        assert_eq!(after[3].title, "Unit 4");

        assert_ordering_invariant(&env, "C1");
    }

    #[test]
    fn test_cancel_twice_is_invalid_transition() {
        let env = setup_env();
        let sessions = generate_scenario_a(&env, "C1", None);
        let victim = sessions[1].session_id.clone();
        env.state.schedule_api.cancel(&victim, None).unwrap();

        let err = env.state.schedule_api.cancel(&victim, None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
        assert_eq!(valid_sessions(&env, "C1").len(), 4);
    }

    #[test]
    fn test_cancel_attended_session_is_history_conflict() {
        let env = setup_env();
        let sessions = generate_scenario_a(&env, "C1", None);
        env.attendance.mark_attended(&sessions[0].session_id);

        let err = env.state.schedule_api.cancel(&sessions[0].session_id, None).unwrap_err();
        assert!(err.is_history_conflict());
        assert_eq!(all_sessions(&env, "C1"), sessions);
    }

    // ==========================================
    // 场景 C: 开课日期变更，存在考勤时降级
    // ==========================================

    #[test]
    fn test_scenario_c_regenerate_refused_then_adjusted_in_place() {
        let env = setup_env();
        let before = generate_scenario_a(&env, "C1", None);
        env.attendance.mark_attended(&before[0].session_id);

        let err = env
            .state
            .schedule_api
            .regenerate_from_start_date("C1", date(2024, 2, 1))
            .unwrap_err();
        match err {
            ApiError::HistoryConflict {
                attended_session_ids,
                ..
            } => assert_eq!(attended_session_ids, vec![before[0].session_id.clone()]),
            other => panic!("unexpected error: {:?}", other),
        }
        // 严格模式失败不留痕迹
        assert_eq!(all_sessions(&env, "C1"), before);

        let outcome = env
            .state
            .schedule_api
            .change_start_date("C1", date(2024, 2, 1))
            .unwrap();
        assert_eq!(outcome.report.path, StartDateChangePath::AdjustedInPlace);
        let adjust = outcome.report.adjust.unwrap();
        assert_eq!(adjust.moved, 3);
        assert_eq!(adjust.fixed, 1);

        let after = valid_sessions(&env, "C1");
        let ids_before: Vec<_> = before.iter().map(|s| s.session_id.clone()).collect();
        let ids_after: Vec<_> = after.iter().map(|s| s.session_id.clone()).collect();
        assert_eq!(ids_before, ids_after, "不得删除或重建课次");
        assert_eq!(after[0], before[0]);
        let dates: Vec<_> = after[1..].iter().map(|s| s.scheduled_date).collect();
        assert_eq!(dates, vec![date(2024, 2, 5), date(2024, 2, 12), date(2024, 2, 19)]);
        assert_ordering_invariant(&env, "C1");
    }

    #[test]
    fn test_change_start_date_without_attendance_regenerates() {
        let env = setup_env();
        let before = generate_scenario_a(&env, "C1", None);

        let outcome = env
            .state
            .schedule_api
            .change_start_date("C1", date(2024, 2, 1))
            .unwrap();
        assert_eq!(outcome.report.path, StartDateChangePath::Regenerated);
        let regenerate = outcome.report.regenerate.unwrap();
        assert_eq!(regenerate.deleted, 4);
        assert_eq!(regenerate.generated, 4);

        let after = valid_sessions(&env, "C1");
        assert_eq!(after.len(), 4);
        assert_eq!(after[0].scheduled_date, date(2024, 2, 5));
        assert!(after.iter().all(|s| before.iter().all(|b| b.session_id != s.session_id)));
        assert!(all_sessions(&env, "C1").iter().all(|s| s.is_valid()));
    }

    // ==========================================
    // 场景 D: 课纲内容同步
    // ==========================================

    #[test]
    fn test_scenario_d_resync_updates_unattended() {
        let env = setup_env();
        let mut curriculum = make_curriculum("CUR", 4);
        generate_scenario_a(&env, "C1", Some(curriculum.clone()));

        curriculum.units[1].title = "Unit 2 (revised)".to_string();
        let outcome = env.state.schedule_api.resync("C1", &curriculum).unwrap();
        assert_eq!(outcome.report.skipped_attended, 0);
        assert_eq!(outcome.report.generated, 0);

        let sessions = valid_sessions(&env, "C1");
        assert_eq!(sessions[1].title, "Unit 2 (revised)");
        assert_eq!(sessions[0].title, "Unit 1");
    }

    #[test]
    fn test_scenario_d_resync_skips_attended() {
        let env = setup_env();
        let mut curriculum = make_curriculum("CUR", 4);
        let before = generate_scenario_a(&env, "C1", Some(curriculum.clone()));
        env.attendance.mark_attended(&before[1].session_id);

        curriculum.units[1].title = "Unit 2 (revised)".to_string();
        let outcome = env.state.schedule_api.resync("C1", &curriculum).unwrap();
        assert_eq!(outcome.report.skipped_attended, 1);
        assert_eq!(outcome.report.skipped_session_ids, vec![before[1].session_id.clone()]);

        let sessions = valid_sessions(&env, "C1");
        assert_eq!(sessions[1].title, "Unit 2");
    }

    #[test]
    fn test_resync_assigns_curriculum_to_generated_class() {
        let env = setup_env();
        let before = generate_scenario_a(&env, "C1", None);
        assert_eq!(before[3].title, "Lesson 4");

        let outcome = env
            .state
            .schedule_api
            .resync("C1", &make_curriculum("CUR", 4))
            .unwrap();
        assert_eq!(outcome.report.updated, 4);
        assert_eq!(outcome.report.generated, 0);

        let sessions = valid_sessions(&env, "C1");
        assert_eq!(sessions[3].session_id, before[3].session_id);
        assert_eq!(sessions[3].title, "Unit 4");
        assert_eq!(sessions[3].scheduled_date, before[3].scheduled_date);
    }

    #[test]
    fn test_resync_with_empty_curriculum_is_configuration_error() {
        let env = setup_env();
        generate_scenario_a(&env, "C1", None);
        let err = env
            .state
            .schedule_api
            .resync("C1", &make_curriculum("EMPTY", 0))
            .unwrap_err();
        assert!(matches!(err, ApiError::ConfigurationError(_)));
    }
}
