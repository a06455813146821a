//! Integration tests for sharing types and instances across threads
//!
//! A type is immutable and may be constructed from many threads at once;
//! an instance handle may be sent to and used from other threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use lattice_core::{Function, Object, Public, Type, TypeBuilder, Value};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_handles_are_send_and_sync() {
    assert_send_sync::<Type>();
    assert_send_sync::<Object>();
    assert_send_sync::<Value>();
}

fn tally() -> Type {
    let base = TypeBuilder::new("Base")
        .member("Total", Public::member(0))
        .constructor(Function::new(|this, args| {
            this.set("Total", args.first().cloned().unwrap_or_default())?;
            Ok(Value::Undefined)
        }))
        .build()
        .unwrap();
    let parent = base.clone();
    TypeBuilder::new("Tally")
        .base(&base)
        .constructor(Function::new(move |this, args| {
            this.init_base(&parent, args)?;
            Ok(Value::Undefined)
        }))
        .build()
        .unwrap()
}

#[test]
fn test_parallel_construction() {
    let ty = tally();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ty = ty.clone();
            thread::spawn(move || {
                let obj = ty.construct(&[Value::from(i)]).unwrap();
                obj.get("Total").unwrap()
            })
        })
        .collect();

    let mut totals: Vec<f64> = handles
        .into_iter()
        .map(|h| h.join().unwrap().as_number().unwrap())
        .collect();
    totals.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(totals, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
}

#[test]
fn test_events_fired_from_other_threads() {
    let ty = TypeBuilder::new("Ticker")
        .member("Tick", Public::event())
        .build()
        .unwrap();
    let ticker = ty.construct(&[]).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = hits.clone();
        ticker.event("Tick").unwrap().attach(Function::free(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Undefined)
        }));
    }

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let ticker = ticker.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    ticker.event("Tick").unwrap().execute(&[]).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), 40);
}
