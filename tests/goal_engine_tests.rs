mod common;

use common::{add_income, clock_at, date, noon, shared_book, RecordingSink};
use finance_core::core::GoalEngine;
use finance_core::domain::goal::{ContributionOrigin, GoalDraft, GoalPatch, GoalStatus};
use finance_core::errors::FinanceError;
use finance_core::ledger::LedgerProvider;
use finance_core::notify::NotificationKind;

fn draft(title: &str, target: f64, deadline: chrono::NaiveDate) -> GoalDraft {
    GoalDraft {
        title: title.into(),
        target_amount: target,
        initial_amount: None,
        category: Some("savings".into()),
        start_date: Some(date(2025, 1, 1)),
        deadline,
        description: None,
    }
}

#[test]
fn quarter_progress_at_quarter_time_reads_as_started() {
    let clock = clock_at(2025, 1, 1);
    let mut engine = GoalEngine::new(clock.clone());
    // 100 days of runway from the start date.
    let id = engine
        .create(draft("Emergency fund", 10_000.0, date(2025, 4, 11)))
        .expect("create")
        .id;

    clock.set(noon(2025, 1, 26));
    engine.add_contribution(id, 2_500.0, "Transfer").expect("contribute");

    let goal = engine.get(id).unwrap();
    assert!((goal.progress - 25.0).abs() < 1e-9);
    // Roughly a quarter of the schedule is gone: inside the +/-20pt band.
    assert_eq!(goal.status, GoalStatus::Started);
}

#[test]
fn milestones_achieve_once_and_stay_achieved() {
    let clock = clock_at(2025, 1, 10);
    let sink = RecordingSink::new();
    let mut engine = GoalEngine::new(clock).with_sink(sink.clone());
    let id = engine
        .create(draft("House", 10_000.0, date(2025, 12, 31)))
        .expect("create")
        .id;

    engine.add_contribution(id, 2_500.0, "Bonus").expect("contribute");
    assert_eq!(sink.count_of(NotificationKind::MilestoneAchieved), 1);
    engine.add_contribution(id, 2_500.0, "Bonus").expect("contribute");
    assert_eq!(sink.count_of(NotificationKind::MilestoneAchieved), 2);

    // Recomputing in place does not re-announce old milestones.
    engine.recompute_all();
    engine.recompute_all();
    assert_eq!(sink.count_of(NotificationKind::MilestoneAchieved), 2);

    // A corrective edit below the checkpoints must not un-achieve them.
    let before: Vec<_> = engine
        .get(id)
        .unwrap()
        .milestones
        .iter()
        .map(|m| m.achieved_at)
        .collect();
    let goal = engine
        .update(
            id,
            GoalPatch {
                current_amount: Some(1_000.0),
                ..GoalPatch::default()
            },
        )
        .expect("corrective edit");
    assert!((goal.progress - 10.0).abs() < 1e-9);
    assert!(goal.milestones[0].achieved);
    assert!(goal.milestones[1].achieved);
    let after: Vec<_> = goal.milestones.iter().map(|m| m.achieved_at).collect();
    assert_eq!(before, after, "achieved_at must be written exactly once");
}

#[test]
fn streak_counts_consecutive_days() {
    let clock = clock_at(2025, 2, 1);
    let mut engine = GoalEngine::new(clock.clone());
    let id = engine
        .create(draft("Trip", 5_000.0, date(2025, 12, 31)))
        .expect("create")
        .id;

    engine.add_contribution(id, 50.0, "Day one").expect("contribute");
    assert_eq!(engine.get(id).unwrap().streak, 1);

    // A second contribution the same day leaves the streak alone.
    engine.add_contribution(id, 25.0, "Same day").expect("contribute");
    assert_eq!(engine.get(id).unwrap().streak, 1);

    clock.advance_days(1);
    engine.add_contribution(id, 50.0, "Day two").expect("contribute");
    assert_eq!(engine.get(id).unwrap().streak, 2);

    clock.advance_days(1);
    engine.add_contribution(id, 50.0, "Day three").expect("contribute");
    assert_eq!(engine.get(id).unwrap().streak, 3);

    // Skipping a day restarts the count.
    clock.advance_days(2);
    engine.add_contribution(id, 50.0, "After a gap").expect("contribute");
    assert_eq!(engine.get(id).unwrap().streak, 1);
}

#[test]
fn achieved_notification_fires_once_per_transition() {
    let clock = clock_at(2025, 3, 1);
    let sink = RecordingSink::new();
    let mut engine = GoalEngine::new(clock).with_sink(sink.clone());
    let id = engine
        .create(draft("Laptop", 1_000.0, date(2025, 12, 31)))
        .expect("create")
        .id;

    engine.add_contribution(id, 1_000.0, "All at once").expect("contribute");
    assert_eq!(engine.get(id).unwrap().status, GoalStatus::Achieved);
    assert_eq!(sink.count_of(NotificationKind::GoalAchieved), 1);

    engine.recompute_all();
    engine.recompute_all();
    assert_eq!(sink.count_of(NotificationKind::GoalAchieved), 1);
}

#[test]
fn urgent_notification_is_one_shot_while_status_is_stable() {
    let clock = clock_at(2025, 1, 5);
    let sink = RecordingSink::new();
    let mut engine = GoalEngine::new(clock).with_sink(sink.clone());
    // Five days left, progress inside the schedule band.
    let goal = engine
        .create(GoalDraft {
            title: "Short sprint".into(),
            target_amount: 1_000.0,
            initial_amount: Some(400.0),
            category: None,
            start_date: Some(date(2025, 1, 1)),
            deadline: date(2025, 1, 10),
            description: None,
        })
        .expect("create");
    assert_eq!(goal.status, GoalStatus::Urgent);
    assert_eq!(sink.count_of(NotificationKind::GoalUrgent), 1);

    engine.recompute_all();
    engine.recompute_all();
    assert_eq!(sink.count_of(NotificationKind::GoalUrgent), 1);
}

#[test]
fn expired_loses_to_achieved_only_at_full_progress() {
    let clock = clock_at(2025, 1, 1);
    let mut engine = GoalEngine::new(clock.clone());
    let id = engine
        .create(draft("Deadline test", 1_000.0, date(2025, 2, 1)))
        .expect("create")
        .id;

    clock.set(noon(2025, 3, 1));
    let goal = engine.recompute(id).expect("recompute");
    assert_eq!(goal.status, GoalStatus::Expired);
    // Past the deadline there is no runway: the raw remainder is due daily.
    assert_eq!(goal.days_remaining, 0);
    assert_eq!(goal.daily_required, 1_000.0);

    let goal = engine
        .update(
            id,
            GoalPatch {
                current_amount: Some(1_000.0),
                ..GoalPatch::default()
            },
        )
        .expect("fund fully");
    assert_eq!(goal.status, GoalStatus::Achieved);
}

#[test]
fn link_transaction_counts_without_touching_the_ledger_or_streak() {
    let clock = clock_at(2025, 2, 1);
    let book = shared_book();
    add_income(&book, "Bonus", 500.0, date(2025, 1, 28), "salary");
    let txn_id = book.lock().unwrap().transactions()[0].id;

    let mut engine = GoalEngine::new(clock).with_ledger(book.clone());
    let id = engine
        .create(draft("Car", 5_000.0, date(2025, 12, 31)))
        .expect("create")
        .id;

    let contribution = engine.link_transaction(id, txn_id).expect("link");
    assert_eq!(contribution.origin, ContributionOrigin::LinkedTransaction);
    assert_eq!(contribution.transaction_id, Some(txn_id));

    let goal = engine.get(id).unwrap();
    assert_eq!(goal.current_amount, 500.0);
    assert_eq!(goal.streak, 0);
    assert!(goal.last_contribution.is_none());
    // The ledger entry is neither removed nor marked.
    assert!(book.lock().unwrap().get(txn_id).is_some());

    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        engine.link_transaction(id, missing),
        Err(FinanceError::TransactionNotFound(_))
    ));
}

#[test]
fn create_validates_input() {
    let clock = clock_at(2025, 6, 1);
    let mut engine = GoalEngine::new(clock);

    assert!(matches!(
        engine.create(draft("X", 1_000.0, date(2025, 12, 31))),
        Err(FinanceError::Validation(_))
    ));
    assert!(matches!(
        engine.create(draft("No target", 0.0, date(2025, 12, 31))),
        Err(FinanceError::Validation(_))
    ));
    // Deadline must be strictly in the future.
    assert!(matches!(
        engine.create(draft("Past", 1_000.0, date(2025, 6, 1))),
        Err(FinanceError::Validation(_))
    ));
    let mut overfunded = draft("Overfunded", 1_000.0, date(2025, 12, 31));
    overfunded.initial_amount = Some(1_500.0);
    assert!(matches!(
        engine.create(overfunded),
        Err(FinanceError::Validation(_))
    ));
    assert!(engine.is_empty());
}

#[test]
fn contribution_amount_must_be_positive() {
    let clock = clock_at(2025, 6, 1);
    let mut engine = GoalEngine::new(clock);
    let id = engine
        .create(draft("Fund", 1_000.0, date(2025, 12, 31)))
        .expect("create")
        .id;
    assert!(matches!(
        engine.add_contribution(id, 0.0, "Nothing"),
        Err(FinanceError::Validation(_))
    ));
    assert!(matches!(
        engine.add_contribution(id, -5.0, "Negative"),
        Err(FinanceError::Validation(_))
    ));
    assert_eq!(engine.get(id).unwrap().current_amount, 0.0);
}

#[test]
fn daily_reminders_nudge_slow_goals_only() {
    let clock = clock_at(2025, 1, 10);
    let sink = RecordingSink::new();
    let mut engine = GoalEngine::new(clock).with_sink(sink.clone());
    let slow = engine
        .create(draft("Slow", 10_000.0, date(2025, 12, 31)))
        .expect("create slow")
        .id;
    let done = engine
        .create(draft("Done", 1_000.0, date(2025, 12, 31)))
        .expect("create done")
        .id;
    engine.add_contribution(done, 1_000.0, "Funded").expect("fund");

    sink.clear();
    engine.check_daily_reminders();
    assert_eq!(sink.count_of(NotificationKind::GoalReminder), 1);
    assert!(engine.get(slow).unwrap().daily_required > 0.0);
    assert_eq!(engine.get(done).unwrap().status, GoalStatus::Achieved);
}

#[test]
fn recompute_is_idempotent_without_changes() {
    let clock = clock_at(2025, 1, 10);
    let mut engine = GoalEngine::new(clock);
    let id = engine
        .create(draft("Stable", 4_000.0, date(2025, 12, 31)))
        .expect("create")
        .id;
    engine.add_contribution(id, 1_200.0, "Seed").expect("contribute");

    let first = engine.recompute(id).expect("first");
    let second = engine.recompute(id).expect("second");
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}
