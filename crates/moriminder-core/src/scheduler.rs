//! Reminder planning.
//!
//! Turns a task's interval list and a number of granted budget slots into
//! concrete fire times. Everything here is pure; `now` is always passed in.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::interval::IntervalPolicy;
use crate::models::{AnchorMode, ReminderWindow, Task, TaskPriority};

/// Per-task notification caps, applied before budget clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CapRow {
    high: usize,
    medium: usize,
    low: usize,
    unknown: usize,
}

impl CapRow {
    fn for_priority(&self, priority: Option<TaskPriority>) -> usize {
        match priority {
            Some(TaskPriority::High) => self.high,
            Some(TaskPriority::Medium) => self.medium,
            Some(TaskPriority::Low) => self.low,
            None => self.unknown,
        }
    }
}

const INSTANCE_CAPS: CapRow = CapRow {
    high: 5,
    medium: 3,
    low: 2,
    unknown: 2,
};

const OPEN_ENDED_CAPS: CapRow = CapRow {
    high: 30,
    medium: 20,
    low: 10,
    unknown: 10,
};

const BOUNDED_CAPS: CapRow = CapRow {
    high: 15,
    medium: 10,
    low: 5,
    unknown: 5,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReminderScheduler {
    policy: IntervalPolicy,
}

impl ReminderScheduler {
    pub fn new(policy: IntervalPolicy) -> Self {
        Self { policy }
    }

    pub fn intervals(&self, task: &Task, now: DateTime<Utc>) -> Vec<u32> {
        self.policy.intervals(task, now)
    }

    /// Most reminders ever attempted for `task`, before budget clipping.
    pub fn max_notifications(task: &Task) -> usize {
        let row = if task.is_instance() {
            &INSTANCE_CAPS
        } else if task.reminder_bound().is_some() {
            &BOUNDED_CAPS
        } else {
            &OPEN_ENDED_CAPS
        };
        row.for_priority(task.priority)
    }

    /// Derives the window reminders are placed in.
    pub fn window(task: &Task, now: DateTime<Utc>) -> ReminderWindow {
        let end_bound = task.reminder_bound();
        let target = task.target_time();

        match (task.reminder_start_time, target) {
            (Some(start), _) => ReminderWindow {
                anchor_mode: AnchorMode::Forward,
                start_bound: start.max(now),
                end_bound,
                target,
            },
            (None, Some(_)) => ReminderWindow {
                anchor_mode: AnchorMode::Backward,
                start_bound: now,
                end_bound,
                target,
            },
            (None, None) => ReminderWindow {
                anchor_mode: AnchorMode::Forward,
                start_bound: now,
                end_bound,
                target,
            },
        }
    }

    /// Plans at most `min(cap, granted)` fire times, ascending, all after `now`.
    ///
    /// Completed tasks and tasks with reminders off plan nothing.
    pub fn plan(
        &self,
        task: &Task,
        intervals: &[u32],
        granted: usize,
        now: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        if task.is_completed || !task.reminder_enabled || intervals.is_empty() {
            return Vec::new();
        }

        let count = Self::max_notifications(task).min(granted);
        if count == 0 {
            return Vec::new();
        }

        let window = Self::window(task, now);
        let fire_times = match (window.anchor_mode, window.target) {
            (AnchorMode::Backward, Some(target)) => {
                plan_backward(target, window.end_bound, intervals, count, now)
            }
            _ => plan_forward(window.start_bound, window.end_bound, intervals, count, now),
        };

        debug!(
            task_id = %task.id,
            mode = ?window.anchor_mode,
            count,
            planned = fire_times.len(),
            "planned reminders"
        );
        fire_times
    }

    /// One fire time for open-ended reminders, re-planned after each delivery.
    ///
    /// Returns `None` for tasks that have an end time (those are planned in
    /// full by [`plan`](Self::plan)), and when the result would not be after `now`.
    pub fn next_fire_time(
        task: &Task,
        intervals: &[u32],
        from: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if task.is_completed || !task.reminder_enabled || task.reminder_bound().is_some() {
            return None;
        }

        let first = *intervals.first()?;
        from.checked_add_signed(Duration::minutes(i64::from(first)))
            .filter(|fire_time| *fire_time > now)
    }
}

/// Running totals of the intervals taken cyclically: `i1, i1+i2, ...`.
fn cumulative_offsets(intervals: &[u32]) -> impl Iterator<Item = Duration> + '_ {
    intervals
        .iter()
        .cycle()
        .scan(Duration::zero(), |total, &minutes| {
            *total += Duration::minutes(i64::from(minutes));
            Some(*total)
        })
}

fn plan_forward(
    anchor: DateTime<Utc>,
    end_bound: Option<DateTime<Utc>>,
    intervals: &[u32],
    count: usize,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut fire_times = Vec::with_capacity(count);

    for offset in cumulative_offsets(intervals).take(count) {
        let Some(fire_time) = anchor.checked_add_signed(offset) else {
            break;
        };
        if end_bound.is_some_and(|end| fire_time > end) {
            break;
        }
        if fire_time <= now {
            debug!(%fire_time, "skipping reminder in the past");
            continue;
        }
        fire_times.push(fire_time);
    }

    fire_times
}

fn plan_backward(
    target: DateTime<Utc>,
    end_bound: Option<DateTime<Utc>>,
    intervals: &[u32],
    count: usize,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut fire_times = Vec::with_capacity(count);

    for offset in cumulative_offsets(intervals).take(count) {
        let Some(candidate) = target.checked_sub_signed(offset) else {
            break;
        };
        if candidate > target || end_bound.is_some_and(|end| candidate > end) {
            break;
        }
        // candidates only move earlier from here on
        if candidate <= now {
            break;
        }
        fire_times.push(candidate);
    }

    fire_times.reverse();
    fire_times
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskKind;
    use chrono::TimeZone;
    use rstest::rstest;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 9, 12, 0, 0).unwrap()
    }

    fn hours(h: i64) -> DateTime<Utc> {
        now() + Duration::hours(h)
    }

    fn reminder_task(priority: TaskPriority) -> Task {
        Task {
            title: "Report".to_string(),
            priority: Some(priority),
            kind: Some(TaskKind::DeadlineTask),
            reminder_enabled: true,
            ..Default::default()
        }
    }

    fn scheduler() -> ReminderScheduler {
        ReminderScheduler::default()
    }

    mod cap_tests {
        use super::*;

        #[rstest]
        #[case(Some(TaskPriority::High), true, false, 5)]
        #[case(Some(TaskPriority::Medium), true, true, 3)]
        #[case(Some(TaskPriority::Low), true, false, 2)]
        #[case(None, true, true, 2)]
        #[case(Some(TaskPriority::High), false, false, 30)]
        #[case(Some(TaskPriority::Medium), false, false, 20)]
        #[case(Some(TaskPriority::Low), false, false, 10)]
        #[case(None, false, false, 10)]
        #[case(Some(TaskPriority::High), false, true, 15)]
        #[case(Some(TaskPriority::Medium), false, true, 10)]
        #[case(Some(TaskPriority::Low), false, true, 5)]
        #[case(None, false, true, 5)]
        fn test_max_notifications(
            #[case] priority: Option<TaskPriority>,
            #[case] instance: bool,
            #[case] has_end: bool,
            #[case] expected: usize,
        ) {
            let task = Task {
                priority,
                parent_task_id: instance.then(Uuid::now_v7),
                deadline: has_end.then(|| hours(5)),
                ..Default::default()
            };
            assert_eq!(ReminderScheduler::max_notifications(&task), expected);
        }

        #[test]
        fn test_end_time_falls_back_to_start_time() {
            let task = Task {
                priority: Some(TaskPriority::High),
                start_time: Some(hours(2)),
                ..Default::default()
            };
            assert_eq!(ReminderScheduler::max_notifications(&task), 15);
        }
    }

    mod window_tests {
        use super::*;

        #[test]
        fn test_explicit_start_is_forward_and_clamped_to_now() {
            let mut task = reminder_task(TaskPriority::Medium);
            task.reminder_start_time = Some(hours(-3));
            task.deadline = Some(hours(4));

            let window = ReminderScheduler::window(&task, now());
            assert_eq!(window.anchor_mode, AnchorMode::Forward);
            assert_eq!(window.start_bound, now());
            assert_eq!(window.end_bound, Some(hours(4)));
        }

        #[test]
        fn test_target_without_start_is_backward() {
            let mut task = reminder_task(TaskPriority::Medium);
            task.start_time = Some(hours(4));

            let window = ReminderScheduler::window(&task, now());
            assert_eq!(window.anchor_mode, AnchorMode::Backward);
            assert_eq!(window.target, Some(hours(4)));
        }

        #[test]
        fn test_no_dates_is_forward_from_now() {
            let task = reminder_task(TaskPriority::Medium);
            let window = ReminderScheduler::window(&task, now());
            assert_eq!(window.anchor_mode, AnchorMode::Forward);
            assert_eq!(window.start_bound, now());
            assert_eq!(window.end_bound, None);
        }
    }

    mod forward_tests {
        use super::*;

        #[test]
        fn test_forward_stops_past_end_bound() {
            let mut task = reminder_task(TaskPriority::Medium);
            task.reminder_start_time = Some(hours(1));
            task.deadline = Some(hours(5));

            let planned = scheduler().plan(&task, &[60], 64, now());
            assert_eq!(planned, vec![hours(2), hours(3), hours(4), hours(5)]);
        }

        #[test]
        fn test_forward_from_past_start_uses_now() {
            let mut task = reminder_task(TaskPriority::Medium);
            task.reminder_start_time = Some(hours(-3));

            let planned = scheduler().plan(&task, &[60], 3, now());
            assert_eq!(planned, vec![hours(1), hours(2), hours(3)]);
        }

        #[test]
        fn test_forward_cycles_intervals() {
            let mut task = reminder_task(TaskPriority::High);
            task.reminder_start_time = Some(now());

            let planned = scheduler().plan(&task, &[30, 90], 4, now());
            assert_eq!(
                planned,
                vec![
                    now() + Duration::minutes(30),
                    now() + Duration::minutes(120),
                    now() + Duration::minutes(150),
                    now() + Duration::minutes(240),
                ]
            );
        }

        #[test]
        fn test_forward_respects_cap() {
            let mut task = reminder_task(TaskPriority::Low);
            task.reminder_start_time = Some(now());
            // open-ended low priority caps at 10
            assert_eq!(scheduler().plan(&task, &[5], 64, now()).len(), 10);
        }
    }

    mod backward_tests {
        use super::*;

        #[test]
        fn test_backward_stops_at_now() {
            let mut task = reminder_task(TaskPriority::Medium);
            task.deadline = Some(hours(5));

            let planned = scheduler().plan(&task, &[60], 64, now());
            assert_eq!(planned, vec![hours(1), hours(2), hours(3), hours(4)]);
        }

        #[test]
        fn test_backward_cyclic_ascending() {
            let mut task = reminder_task(TaskPriority::High);
            task.deadline = Some(hours(6));

            let planned = scheduler().plan(&task, &[120, 30], 64, now());
            assert_eq!(
                planned,
                vec![
                    now() + Duration::minutes(60),
                    now() + Duration::minutes(90),
                    now() + Duration::minutes(210),
                    now() + Duration::minutes(240),
                ]
            );
        }

        #[test]
        fn test_backward_keeps_slots_closest_to_target() {
            let mut task = reminder_task(TaskPriority::High);
            task.deadline = Some(hours(6));

            let planned = scheduler().plan(&task, &[120, 30], 2, now());
            assert_eq!(
                planned,
                vec![now() + Duration::minutes(210), now() + Duration::minutes(240)]
            );
        }

        #[test]
        fn test_backward_end_before_target_stops_immediately() {
            let mut task = reminder_task(TaskPriority::Medium);
            task.deadline = Some(hours(6));
            task.reminder_end_time = Some(hours(4));

            assert!(scheduler().plan(&task, &[60], 64, now()).is_empty());
        }

        #[test]
        fn test_backward_target_in_past_plans_nothing() {
            let mut task = reminder_task(TaskPriority::High);
            task.deadline = Some(hours(-1));
            assert!(scheduler().plan(&task, &[1], 64, now()).is_empty());
        }
    }

    #[rstest]
    #[case::completed(true, true, 64)]
    #[case::disabled(false, false, 64)]
    #[case::no_budget(false, true, 0)]
    fn test_plans_nothing(#[case] completed: bool, #[case] enabled: bool, #[case] granted: usize) {
        let mut task = reminder_task(TaskPriority::High);
        task.deadline = Some(hours(10));
        task.is_completed = completed;
        task.reminder_enabled = enabled;
        assert!(scheduler().plan(&task, &[60], granted, now()).is_empty());
    }

    mod next_fire_time_tests {
        use super::*;

        #[test]
        fn test_next_fire_time_uses_first_interval() {
            let task = reminder_task(TaskPriority::Medium);
            assert_eq!(
                ReminderScheduler::next_fire_time(&task, &[45, 10], now(), now()),
                Some(now() + Duration::minutes(45))
            );
        }

        #[test]
        fn test_next_fire_time_in_past_is_none() {
            let task = reminder_task(TaskPriority::Medium);
            assert_eq!(
                ReminderScheduler::next_fire_time(&task, &[45], hours(-1), now()),
                None
            );
        }

        #[test]
        fn test_next_fire_time_requires_open_end() {
            let mut task = reminder_task(TaskPriority::Medium);
            task.deadline = Some(hours(10));
            assert_eq!(ReminderScheduler::next_fire_time(&task, &[45], now(), now()), None);

            let mut done = reminder_task(TaskPriority::Medium);
            done.is_completed = true;
            assert_eq!(ReminderScheduler::next_fire_time(&done, &[45], now(), now()), None);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn priority() -> impl Strategy<Value = Option<TaskPriority>> {
            prop_oneof![
                Just(None),
                Just(Some(TaskPriority::Low)),
                Just(Some(TaskPriority::Medium)),
                Just(Some(TaskPriority::High)),
            ]
        }

        fn offset() -> impl Strategy<Value = Option<i64>> {
            proptest::option::of(-3_000i64..20_000)
        }

        prop_compose! {
            fn arbitrary_task()(
                priority in priority(),
                instance in any::<bool>(),
                start in offset(),
                deadline in offset(),
                reminder_start in offset(),
                reminder_end in offset(),
            ) -> Task {
                let at = |m: Option<i64>| m.map(|m| now() + Duration::minutes(m));
                Task {
                    title: "Prop".to_string(),
                    priority,
                    reminder_enabled: true,
                    parent_task_id: instance.then(Uuid::now_v7),
                    start_time: at(start),
                    deadline: at(deadline),
                    reminder_start_time: at(reminder_start),
                    reminder_end_time: at(reminder_end),
                    ..Default::default()
                }
            }
        }

        proptest! {
            #[test]
            fn planned_fire_times_hold_invariants(
                task in arbitrary_task(),
                intervals in proptest::collection::vec(1u32..600, 1..6),
                granted in 0usize..70,
            ) {
                let planned = scheduler().plan(&task, &intervals, granted, now());
                let cap = ReminderScheduler::max_notifications(&task);

                prop_assert!(planned.len() <= cap.min(granted));
                prop_assert!(planned.iter().all(|t| *t > now()));
                prop_assert!(planned.windows(2).all(|w| w[0] < w[1]));
                if let Some(end) = task.reminder_end_time {
                    prop_assert!(planned.iter().all(|t| *t <= end));
                }

                let window = ReminderScheduler::window(&task, now());
                if let (AnchorMode::Backward, Some(target), Some(last)) =
                    (window.anchor_mode, window.target, planned.last())
                {
                    prop_assert!(*last <= target);
                }
            }
        }
    }
}
