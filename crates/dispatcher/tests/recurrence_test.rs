#[cfg(test)]
mod recurrence_tests {
    use campaign_dispatcher::RecurrenceCalculator;

    use campaign_domain::ScheduleType;
    use campaign_testing_utils::ScheduleBuilder;
    use chrono::{DateTime, TimeZone, Utc};

    fn calc_next(
        schedule_type: ScheduleType,
        pattern: Option<&str>,
        scheduled_at: Option<DateTime<Utc>>,
        reference: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let mut builder = ScheduleBuilder::new().with_type(schedule_type);
        if let Some(pattern) = pattern {
            builder = builder.with_recurring_pattern(pattern);
        }
        if let Some(at) = scheduled_at {
            builder = builder.with_scheduled_at(at);
        }
        let calculator = RecurrenceCalculator::for_schedule(&builder.build()).unwrap();
        calculator.next_execution_time(reference)
    }

    #[test]
    fn test_one_time_is_pure_passthrough() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 15, 30, 0).unwrap();
        // 参考时刻无论在scheduled_at之前还是之后，都原样返回
        for reference in [
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        ] {
            assert_eq!(
                calc_next(ScheduleType::OneTime, None, Some(at), reference),
                Some(at)
            );
        }
        // scheduled_at缺失返回None，由创建时校验负责报错
        let reference = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(calc_next(ScheduleType::OneTime, None, None, reference), None);
    }

    #[test]
    fn test_weekly_friday_scenario() {
        // 2025-01-01是周三，FR 14:15 -> 当周周五
        let reference = Utc.with_ymd_and_hms(2025, 1, 1, 10, 30, 0).unwrap();
        let next = calc_next(
            ScheduleType::Weekly,
            Some(r#"{"day":"FR","time":"14:15"}"#),
            None,
            reference,
        )
        .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 3, 14, 15, 0).unwrap());
    }

    #[test]
    fn test_weekly_same_day_advances_full_week_after_time() {
        // 参考时刻已是目标周几且发送时刻已过 -> 整整推后7天
        let friday_afternoon = Utc.with_ymd_and_hms(2025, 1, 3, 15, 0, 0).unwrap();
        let next = calc_next(
            ScheduleType::Weekly,
            Some(r#"{"day":"FR","time":"14:15"}"#),
            None,
            friday_afternoon,
        )
        .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 10, 14, 15, 0).unwrap());

        // 发送时刻未到 -> 仍是今天
        let friday_morning = Utc.with_ymd_and_hms(2025, 1, 3, 10, 0, 0).unwrap();
        let next = calc_next(
            ScheduleType::Weekly,
            Some(r#"{"day":"FR","time":"14:15"}"#),
            None,
            friday_morning,
        )
        .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 3, 14, 15, 0).unwrap());
    }

    #[test]
    fn test_weekly_never_at_or_before_reference() {
        let pattern = r#"{"day":"MO","time":"00:00"}"#;
        let mut reference = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        for _ in 0..30 {
            let next =
                calc_next(ScheduleType::Weekly, Some(pattern), None, reference).unwrap();
            assert!(next > reference, "next={next} reference={reference}");
            reference = next;
        }
    }

    #[test]
    fn test_monthly_day_passed_scenario() {
        // 1月5日已过 -> 2月5日
        let reference = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let next = calc_next(
            ScheduleType::Monthly,
            Some(r#"{"day":5,"time":"08:00"}"#),
            None,
            reference,
        )
        .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 2, 5, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_monthly_day_31_clamps_to_target_month_length() {
        // 1月31日09:00已过 -> 收缩到2月28日，而不是沿用1月的月长
        let reference = Utc.with_ymd_and_hms(2025, 1, 31, 23, 0, 0).unwrap();
        let next = calc_next(
            ScheduleType::Monthly,
            Some(r#"{"day":31,"time":"09:00"}"#),
            None,
            reference,
        )
        .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 2, 28, 9, 0, 0).unwrap());

        // 闰年2月收缩到29日
        let reference = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let next = calc_next(
            ScheduleType::Monthly,
            Some(r#"{"day":31,"time":"09:00"}"#),
            None,
            reference,
        )
        .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_yearly_leap_day_scenario() {
        // 2025年2月已过 -> 2026年，平年2月30日收缩到28日
        let reference = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let next = calc_next(
            ScheduleType::Yearly,
            Some(r#"{"month":2,"day":30,"time":"10:00"}"#),
            None,
            reference,
        )
        .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 28, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_yearly_current_year_still_ahead() {
        let reference = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let next = calc_next(
            ScheduleType::Yearly,
            Some(r#"{"month":6,"day":15,"time":"12:00"}"#),
            None,
            reference,
        )
        .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_birthday_daily_recheck() {
        let pattern = r#"{"time":"09:00"}"#;
        // 时刻未到 -> 今天
        let reference = Utc.with_ymd_and_hms(2025, 4, 10, 8, 0, 0).unwrap();
        let next = calc_next(ScheduleType::Birthday, Some(pattern), None, reference).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap());

        // 时刻正好等于参考 -> 明天（严格未来）
        let reference = Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap();
        let next = calc_next(ScheduleType::Birthday, Some(pattern), None, reference).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 4, 11, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_time_fallback_chain() {
        // 规则未指定time -> 取scheduled_at的时分
        let scheduled_at = Utc.with_ymd_and_hms(2025, 1, 1, 16, 45, 0).unwrap();
        let reference = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
        let next = calc_next(
            ScheduleType::Monthly,
            Some(r#"{"day":10}"#),
            Some(scheduled_at),
            reference,
        )
        .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 10, 16, 45, 0).unwrap());

        // 都没有 -> 固定回退09:00
        let next = calc_next(ScheduleType::Monthly, Some(r#"{"day":10}"#), None, reference)
            .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_deterministic_for_same_inputs() {
        let reference = Utc.with_ymd_and_hms(2025, 5, 20, 11, 30, 0).unwrap();
        let schedule = ScheduleBuilder::new()
            .with_type(ScheduleType::Weekly)
            .with_recurring_pattern(r#"{"day":"TH","time":"08:30"}"#)
            .build();
        let calculator = RecurrenceCalculator::for_schedule(&schedule).unwrap();
        let first = calculator.next_execution_time(reference);
        let second = calculator.next_execution_time(reference);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn test_invalid_pattern_rejected_at_construction() {
        let schedule = ScheduleBuilder::new()
            .with_type(ScheduleType::Weekly)
            .with_recurring_pattern(r#"{"day":"FUNDAY"}"#)
            .build();
        assert!(RecurrenceCalculator::for_schedule(&schedule).is_err());

        let schedule = ScheduleBuilder::new()
            .with_type(ScheduleType::Monthly)
            .build();
        assert!(
            RecurrenceCalculator::for_schedule(&schedule).is_err(),
            "循环类型缺少recurring_pattern应当报错"
        );
    }
}
