//! Integration tests for the scheduler with tweens, timelines and pooling
//!
//! These tests verify that:
//! - Finished units are pruned once and released once
//! - Timelines count as one top-level unit but expose nested counts
//! - Killing a target only touches units that animate it
//! - Callbacks observe and extend the deferred-op queue in pass order
//! - Pausing freezes every observable piece of state

use proptest::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;
use tumble_animation::{
    AnimationScheduler, AnimationUnit, RunningCounts, SchedulerConfig, TargetRef, Timeline, Tween,
    TweenEvent, TweenPool,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn timer(duration: f32) -> Tween {
    Tween::builder(duration).build().unwrap()
}

/// A tween and a one-child timeline finishing at different times
#[test]
fn test_tween_and_timeline_scenario() {
    init_tracing();
    let mut scheduler = AnimationScheduler::new();
    scheduler
        .add(timer(2.0))
        .add(Timeline::sequence().push(timer(1.0)));

    assert_eq!(scheduler.size(), 2);
    assert_eq!(scheduler.running_tweens_count(), 2);
    assert_eq!(scheduler.running_timelines_count(), 1);

    // The child finishes and so does its timeline, which only lasts 1.0.
    scheduler.update(1.0);
    assert_eq!(scheduler.size(), 1);
    assert_eq!(scheduler.running_tweens_count(), 1);
    assert_eq!(scheduler.running_timelines_count(), 0);

    scheduler.update(1.0);
    assert_eq!(scheduler.size(), 0);
    assert_eq!(scheduler.running_tweens_count(), 0);
}

/// A timeline outliving its finished child stays registered
#[test]
fn test_timeline_outlives_finished_child() {
    let mut scheduler = AnimationScheduler::new();
    let timeline = scheduler.insert(Timeline::sequence().push(timer(1.0)).push_pause(2.0));
    scheduler.add(timer(2.0));

    scheduler.update(1.0);
    assert_eq!(scheduler.size(), 2);
    assert_eq!(
        scheduler.running_counts(),
        RunningCounts {
            tweens: 1,
            timelines: 1
        }
    );

    scheduler.update(1.0);
    assert_eq!(scheduler.size(), 1);
    assert!(scheduler.contains(timeline));
    assert_eq!(scheduler.running_tweens_count(), 0);

    scheduler.update(1.0);
    assert!(scheduler.is_empty());
}

#[test]
fn test_timeline_counts_once() {
    let mut timeline = Timeline::parallel();
    for _ in 0..5 {
        timeline = timeline.push(timer(1.0));
    }
    let mut scheduler = AnimationScheduler::new();
    scheduler.add(timeline);

    assert_eq!(scheduler.size(), 1);
    assert_eq!(scheduler.running_tweens_count(), 5);
    assert_eq!(scheduler.running_timelines_count(), 1);
    assert!(scheduler.objects()[0].is_timeline());
}

#[test]
fn test_kill_target_isolation() {
    let x = Rc::new(Cell::new(0.0f32));
    let y = Rc::new(Cell::new(0.0f32));
    let (tx, ty) = (TargetRef::of(&x), TargetRef::of(&y));

    let mut scheduler = AnimationScheduler::new();
    let direct = scheduler.insert(Tween::to(tx.clone(), 5.0).build().unwrap());
    let nested = scheduler.insert(
        Timeline::sequence().push(timer(1.0)).push(
            Timeline::parallel()
                .push(timer(1.0))
                .push(Tween::to(tx.clone(), 1.0).build().unwrap()),
        ),
    );
    let other = scheduler.insert(Tween::to(ty.clone(), 5.0).build().unwrap());

    assert_eq!(scheduler.kill_target(&tx), 2);
    scheduler.update(1.0);

    assert!(!scheduler.contains(direct));
    assert!(!scheduler.contains(nested));
    assert!(scheduler.contains(other));
    assert!(!scheduler.contains_target(&tx));
    assert!(scheduler.contains_target(&ty));

    scheduler.update(1.0);
    assert_eq!(scheduler.get(other).map(|u| u.elapsed()), Some(2.0));
}

#[test]
fn test_contains_target_unknown_object() {
    let scheduler = AnimationScheduler::new();
    let stranger = Rc::new(String::from("never registered"));
    assert!(!scheduler.contains_target(&TargetRef::of(&stranger)));
}

#[test]
fn test_target_is_not_owned() {
    let sprite = Rc::new(Cell::new(0.0f32));
    let mut scheduler = AnimationScheduler::new();
    scheduler.add(Tween::to(TargetRef::of(&sprite), 1.0).build().unwrap());
    assert_eq!(Rc::strong_count(&sprite), 1);
    assert_eq!(Rc::weak_count(&sprite), 1);
}

/// B runs after A in the same pass and sees what A queued
#[test]
fn test_later_unit_observes_earlier_queue() {
    let sprite = Rc::new(Cell::new(0.0f32));
    let target = TargetRef::of(&sprite);
    let mut scheduler = AnimationScheduler::new();
    let handle = scheduler.handle();
    let observed = Rc::new(Cell::new(usize::MAX));

    let a_handle = handle.clone();
    let a_target = target.clone();
    scheduler.add(
        Tween::builder(0.5)
            .on_event(move |event| {
                if event == TweenEvent::Complete {
                    a_handle.kill_target(&a_target);
                }
            })
            .build()
            .unwrap(),
    );

    let b_handle = handle.clone();
    let b_observed = Rc::clone(&observed);
    scheduler.add(
        Tween::builder(0.5)
            .on_event(move |event| {
                if event == TweenEvent::Complete {
                    b_observed.set(b_handle.pending_len());
                }
            })
            .build()
            .unwrap(),
    );
    let victim = scheduler.insert(Tween::to(target, 10.0).build().unwrap());

    scheduler.update(0.5);
    assert_eq!(observed.get(), 1);
    assert_eq!(handle.pending_len(), 0);

    // The queued kill ran after the pass, so the victim was advanced once
    // and is only pruned by the next pass.
    assert_eq!(scheduler.get(victim).map(|u| u.elapsed()), Some(0.5));
    assert!(scheduler.get(victim).is_some_and(|u| u.is_finished()));
    scheduler.update(0.5);
    assert!(!scheduler.contains(victim));
}

/// A unit finished by a pass stays registered until that pass prunes
#[test]
fn test_finished_unit_held_until_prune() {
    let pool = TweenPool::default();
    let mut scheduler = AnimationScheduler::new();
    let completed = Rc::new(Cell::new(false));
    let seen_by_later_unit = Rc::new(RefCell::new(None));

    let flag = Rc::clone(&completed);
    let early = scheduler.insert(
        pool.builder(0.5)
            .on_event(move |event| {
                if event == TweenEvent::Complete {
                    flag.set(true);
                }
            })
            .build()
            .unwrap(),
    );

    let flag = Rc::clone(&completed);
    let observer_pool = pool.clone();
    let seen = Rc::clone(&seen_by_later_unit);
    scheduler.add(
        Tween::builder(2.0)
            .to_values([1.0])
            .on_update(move |_| {
                if flag.get() && seen.borrow().is_none() {
                    let stats = (observer_pool.recycled(), observer_pool.free_count());
                    *seen.borrow_mut() = Some(stats);
                }
            })
            .build()
            .unwrap(),
    );

    scheduler.update(0.5);
    assert_eq!(*seen_by_later_unit.borrow(), Some((0, 0)));
    assert!(!scheduler.contains(early));
    assert_eq!(scheduler.size(), 1);
    assert_eq!(pool.recycled(), 1);
}

#[test]
fn test_kill_all_from_callback_is_deferred() {
    let mut scheduler = AnimationScheduler::new();
    let handle = scheduler.handle();
    let visited = Rc::new(Cell::new(0));

    let killer = handle.clone();
    scheduler.add(
        Tween::builder(1.0)
            .to_values([1.0])
            .on_update(move |_| killer.kill_all())
            .build()
            .unwrap(),
    );
    for _ in 0..3 {
        let visited = Rc::clone(&visited);
        scheduler.add(
            Tween::builder(1.0)
                .to_values([1.0])
                .on_update(move |_| visited.set(visited.get() + 1))
                .build()
                .unwrap(),
        );
    }

    scheduler.update(0.1);
    assert_eq!(visited.get(), 3);
    assert!(scheduler.is_empty());
}

/// A natural finish overlapping with queued and direct kills still releases once
#[test]
fn test_overlapping_finish_and_kills_release_once() {
    let sprite = Rc::new(Cell::new(0.0f32));
    let target = TargetRef::of(&sprite);
    let pool = TweenPool::default();
    let mut scheduler = AnimationScheduler::new();
    let handle = scheduler.handle();

    let queued_kill = handle.clone();
    let kill_target = target.clone();
    scheduler.add(
        pool.tween(target.clone(), 1.0)
            .on_event(move |event| {
                if event == TweenEvent::Complete {
                    queued_kill.kill_target(&kill_target);
                }
            })
            .build()
            .unwrap(),
    );
    handle.kill_target(&target);

    scheduler.update(1.0);
    assert!(scheduler.is_empty());
    assert_eq!(scheduler.kill_target(&target), 0);
    scheduler.update(1.0);

    assert_eq!(pool.recycled(), 1);
    assert_eq!(pool.free_count(), 1);
}

#[test]
fn test_pooled_tweens_are_reused() {
    let pool = TweenPool::default();
    let mut scheduler = AnimationScheduler::new();

    for _ in 0..4 {
        scheduler.add(pool.builder(0.5).build().unwrap());
    }
    scheduler.update(0.5);
    assert_eq!(pool.recycled(), 4);

    for _ in 0..4 {
        scheduler.add(pool.builder(0.5).build().unwrap());
    }
    assert_eq!(pool.created(), 4);
    assert_eq!(pool.free_count(), 0);
}

#[test]
fn test_config_from_toml_drives_scheduler() {
    let config = SchedulerConfig::from_toml_str(
        r#"
        time_scale = 2.0

        [pool]
        capacity = 2
        "#,
    )
    .unwrap();
    let pool = TweenPool::new(&config.pool);
    let mut scheduler = AnimationScheduler::with_config(config).unwrap();
    for _ in 0..3 {
        scheduler.add(pool.builder(1.0).build().unwrap());
    }

    scheduler.update(0.5);
    assert!(scheduler.is_empty());
    assert_eq!(pool.recycled(), 3);
    assert_eq!(pool.free_count(), 2);
}

#[test]
fn test_rewind_with_negative_delta() {
    let values = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&values);
    let mut scheduler = AnimationScheduler::new();
    scheduler.add(
        Tween::builder(2.0)
            .to_values([10.0])
            .on_update(move |v| sink.borrow_mut().push(v[0]))
            .build()
            .unwrap(),
    );

    scheduler.update(1.5);
    scheduler.update(-1.0);
    assert_eq!(&*values.borrow(), &[7.5, 2.5]);
    assert_eq!(scheduler.size(), 1);
}

proptest! {
    #[test]
    fn prop_paused_updates_change_nothing(
        durations in prop::collection::vec(0.1f32..5.0, 1..8),
        warmup in 0.0f32..1.0,
        deltas in prop::collection::vec(-10.0f32..10.0, 1..20),
    ) {
        let mut scheduler = AnimationScheduler::new();
        for (i, duration) in durations.iter().enumerate() {
            if i % 2 == 0 {
                scheduler.add(timer(*duration));
            } else {
                scheduler.add(Timeline::sequence().push(timer(*duration)).push(timer(*duration)));
            }
        }
        scheduler.update(warmup);

        let size = scheduler.size();
        let counts = scheduler.running_counts();
        let elapsed: Vec<f32> = scheduler.objects().iter().map(|u| u.elapsed()).collect();

        scheduler.pause();
        for delta in deltas {
            scheduler.update(delta);
        }

        prop_assert_eq!(scheduler.size(), size);
        prop_assert_eq!(scheduler.running_counts(), counts);
        let after: Vec<f32> = scheduler.objects().iter().map(|u| u.elapsed()).collect();
        prop_assert_eq!(after, elapsed);
    }

    #[test]
    fn prop_finished_units_pruned_and_released_once(
        durations in prop::collection::vec(0.0f32..3.0, 1..10),
        deltas in prop::collection::vec(0.0f32..0.5, 1..40),
    ) {
        let pool = TweenPool::default();
        let completions = Rc::new(Cell::new(0usize));
        let mut scheduler = AnimationScheduler::new();
        for duration in &durations {
            let completions = Rc::clone(&completions);
            scheduler.add(
                pool.builder(*duration)
                    .on_event(move |event| {
                        if event == TweenEvent::Complete {
                            completions.set(completions.get() + 1);
                        }
                    })
                    .build()
                    .unwrap(),
            );
        }

        for delta in deltas {
            scheduler.update(delta);
            prop_assert!(scheduler.objects().iter().all(|u| !u.is_finished()));
            prop_assert_eq!(scheduler.size() + pool.recycled(), durations.len());
            prop_assert_eq!(pool.recycled(), completions.get());
        }

        scheduler.update(3.0);
        prop_assert!(scheduler.is_empty());
        prop_assert_eq!(pool.recycled(), durations.len());
        prop_assert_eq!(completions.get(), durations.len());
    }
}
