use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration;

use weft::{chan, dcase, go, init, rcase, scase, select, select_ok, WaitGroup, WeftError};

static INIT: Once = Once::new();

fn ensure_scheduler() {
    INIT.call_once(|| {
        init().expect("scheduler should install exactly once per process");
    });
}

#[test]
fn s1_unbounded_fifo() {
    ensure_scheduler();
    let ch = chan::<i32>(-1);
    let sender = ch.clone();
    go(move || {
        for v in 1..=5 {
            sender.send(v).unwrap();
        }
    });
    let collected: Vec<_> = (0..5).map(|_| ch.recv().unwrap()).collect();
    assert_eq!(collected, vec![1, 2, 3, 4, 5]);
}

#[test]
fn s2_bounded_fill_and_drain() {
    ensure_scheduler();
    let ch = chan::<i32>(2);
    let sender = ch.clone();
    go(move || {
        for v in [4, 3, 2, 1] {
            sender.send(v).unwrap();
        }
    });
    let first_two = vec![ch.recv().unwrap(), ch.recv().unwrap()];
    assert_eq!(first_two, vec![4, 3]);
    let last_two = vec![ch.recv().unwrap(), ch.recv().unwrap()];
    assert_eq!(last_two, vec![2, 1]);
}

#[test]
fn s3_close_terminates_iteration() {
    ensure_scheduler();
    let ch: weft::Channel<&'static str> = chan(2);
    ch.send("one").unwrap();
    ch.send("two").unwrap();
    ch.close();
    let collected: Vec<_> = ch.into_iter().collect();
    assert_eq!(collected, vec!["one", "two"]);
}

#[test]
fn s4_select_picks_first_ready_case() {
    ensure_scheduler();
    let a = chan::<i32>(1);
    let b = chan::<i32>(1);
    b.send(3).unwrap();

    let outcome = select_ok(vec![rcase(&a), rcase(&b), dcase()]).unwrap().unwrap();
    assert_eq!(outcome.0, 1);
    let value = *outcome.1.unwrap().downcast::<i32>().unwrap();
    assert_eq!(value, 3);
}

#[test]
fn s5_select_default_fallback() {
    ensure_scheduler();
    let a = chan::<i32>(0);
    let outcome = select_ok(vec![rcase(&a), dcase()]).unwrap().unwrap();
    assert_eq!(outcome.0, 1);
    assert!(outcome.1.is_none());
}

#[test]
fn s6_waitgroup_fan_in() {
    ensure_scheduler();
    let wg = Arc::new(WaitGroup::with_delta(10).unwrap());
    wg.add(5).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..15 {
        let wg = Arc::clone(&wg);
        let counter = Arc::clone(&counter);
        go(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            wg.done().unwrap();
        });
    }
    wg.wait().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 15);
}

#[test]
fn select_raises_on_closed_channel() {
    ensure_scheduler();
    let ch = chan::<i32>(0);
    ch.close();
    let err = select(vec![rcase(&ch)]).unwrap_err();
    assert_eq!(err, WeftError::ChannelClosed);
}

#[test]
fn select_send_case_round_trips_through_spawned_receiver() {
    ensure_scheduler();
    let ch = chan::<i32>(0);
    let receiver = ch.clone();
    let handle = thread::spawn(move || receiver.recv().unwrap());
    thread::sleep(Duration::from_millis(5));

    let outcome = select_ok(vec![scase(&ch, 99)]).unwrap().unwrap();
    assert_eq!(outcome.0, 0);
    assert_eq!(handle.join().unwrap(), 99);
}

