//--------------------------------------------------------------------------------------------------
// TEST MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Integration tests for the dispatcher through the public crate API, using a typed domain payload.
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use parking_lot::Mutex;
use proptest::prelude::*;
use tokio_test::{assert_err, assert_ok};

use event_dispatch::{DispatchError, Dispatcher, DispatcherConfig, Handler, Pattern};

#[derive(Debug, Clone, PartialEq)]
enum UserEvent {
    Created { id: u64 },
    Updated { id: u64, name: String },
}

/// Sets up a dispatcher with one recorder per subscription key.
fn setup_recorders(keys: &[&str]) -> (Dispatcher<UserEvent>, Arc<Mutex<Vec<(String, String)>>>) {
    let dispatcher = Dispatcher::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for key in keys {
        let seen = Arc::clone(&seen);
        let key_owned = key.to_string();
        let handler = Handler::wildcard(move |name: &str, _: &UserEvent| {
            seen.lock().push((key_owned.clone(), name.to_string()));
            Ok(())
        });
        dispatcher.subscribe(key, &handler).unwrap();
    }

    (dispatcher, seen)
}

#[test]
fn test_prefix_pattern_routing() {
    let (dispatcher, seen) = setup_recorders(&["user.*"]);

    assert_ok!(dispatcher.emit("user.created", UserEvent::Created { id: 1 }));
    assert_ok!(dispatcher.emit("user.updated", UserEvent::Created { id: 1 }));
    assert_ok!(dispatcher.emit("post.created", UserEvent::Created { id: 1 }));

    let names: Vec<String> = seen.lock().iter().map(|(_, name)| name.clone()).collect();
    assert_eq!(names, vec!["user.created", "user.updated"]);
}

#[test]
fn test_suffix_pattern_routing() {
    let (dispatcher, seen) = setup_recorders(&["*.created"]);

    assert_ok!(dispatcher.emit("user.created", UserEvent::Created { id: 1 }));
    assert_ok!(dispatcher.emit("post.created", UserEvent::Created { id: 2 }));
    assert_ok!(dispatcher.emit("user.updated", UserEvent::Created { id: 3 }));

    let names: Vec<String> = seen.lock().iter().map(|(_, name)| name.clone()).collect();
    assert_eq!(names, vec!["user.created", "post.created"]);
}

#[test]
fn test_universal_sees_every_event() {
    let (dispatcher, seen) = setup_recorders(&["*", "user.created"]);

    assert_ok!(dispatcher.emit("user.created", UserEvent::Created { id: 1 }));
    assert_ok!(dispatcher.emit("anything.else", UserEvent::Created { id: 2 }));

    assert_eq!(
        *seen.lock(),
        vec![
            ("user.created".to_string(), "user.created".to_string()),
            ("*".to_string(), "user.created".to_string()),
            ("*".to_string(), "anything.else".to_string()),
        ]
    );
}

#[test]
fn test_once_receives_first_payload_only() {
    let dispatcher = Dispatcher::new();
    let payloads = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&payloads);
    let handler = Handler::new(move |event: &UserEvent| {
        sink.lock().push(event.clone());
        Ok(())
    });
    dispatcher.subscribe_once("user.updated", &handler).unwrap();

    let first = UserEvent::Updated { id: 1, name: "ada".into() };
    let second = UserEvent::Updated { id: 1, name: "grace".into() };
    assert_ok!(dispatcher.emit("user.updated", first.clone()));
    assert_ok!(dispatcher.emit("user.updated", second));

    assert_eq!(*payloads.lock(), vec![first]);
}

#[test]
fn test_emit_name_validation() {
    let dispatcher = Dispatcher::<UserEvent>::new();
    let handler = Handler::new(|_| Ok(()));

    for name in ["", "*", "a.*"] {
        let err = assert_err!(dispatcher.emit(name, UserEvent::Created { id: 0 }));
        assert!(matches!(err, DispatchError::InvalidName { .. }), "{}", name);
    }
    assert_err!(dispatcher.subscribe("", &handler));
    assert_ok!(dispatcher.subscribe("*", &handler));
}

#[test]
fn test_no_listeners_error_names_event() {
    let dispatcher =
        Dispatcher::<UserEvent>::with_config(DispatcherConfig::new().with_throw_on_no_listeners(true));

    let err = assert_err!(dispatcher.emit("user.deleted", UserEvent::Created { id: 0 }));
    assert_eq!(err.event_name(), Some("user.deleted"));
    assert_eq!(err.to_string(), "No listeners registered for event: user.deleted");
}

#[tokio::test]
async fn test_emit_async_waits_for_all_handlers() {
    let dispatcher = Dispatcher::<UserEvent>::new();
    let finished = Arc::new(AtomicUsize::new(0));

    for delay in [30u64, 10, 0] {
        let finished = Arc::clone(&finished);
        let handler = Handler::new_async(move |_event: UserEvent| {
            let finished = Arc::clone(&finished);
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        dispatcher.subscribe("user.created", &handler).unwrap();
    }
    dispatcher
        .subscribe("*", &Handler::wildcard(|_, _| Ok(())))
        .unwrap();

    let completion = dispatcher
        .emit_async("user.created", UserEvent::Created { id: 9 })
        .unwrap();
    assert_ok!(completion.await);
    assert_eq!(finished.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_emit_async_failure_with_siblings() {
    let dispatcher = Dispatcher::<UserEvent>::new();
    let ran = Arc::new(AtomicUsize::new(0));

    let count = Arc::clone(&ran);
    dispatcher
        .subscribe(
            "user.*",
            &Handler::wildcard(move |_, _| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();
    dispatcher
        .subscribe(
            "user.created",
            &Handler::new(|event: &UserEvent| match event {
                UserEvent::Created { id: 0 } => Err(anyhow!("id must not be zero")),
                _ => Ok(()),
            }),
        )
        .unwrap();

    let err = assert_err!(
        dispatcher
            .emit_async("user.created", UserEvent::Created { id: 0 })
            .unwrap()
            .await
    );
    assert_eq!(err.to_string(), "Handler failed: id must not be zero");
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn test_clear_silences_all_registries() {
    let (dispatcher, seen) = setup_recorders(&["user.created", "*", "user.*", "*.created"]);

    assert_ok!(dispatcher.clear(None));
    assert_ok!(dispatcher.emit("user.created", UserEvent::Created { id: 1 }));

    assert!(seen.lock().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every matching handler runs exactly once per emission, whichever of
    /// them fail, and emit reports the first failure in dispatch order.
    #[test]
    fn prop_emit_isolates_handler_failures(failures in proptest::collection::vec(any::<bool>(), 1..8)) {
        let dispatcher = Dispatcher::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for (index, fails) in failures.iter().copied().enumerate() {
            let calls = Arc::clone(&calls);
            let handler = Handler::new(move |_: &u32| {
                calls.fetch_add(1, Ordering::SeqCst);
                if fails { Err(anyhow!("handler {}", index)) } else { Ok(()) }
            });
            dispatcher.subscribe("evt", &handler).unwrap();
        }

        let result = dispatcher.emit("evt", 0);
        prop_assert_eq!(calls.load(Ordering::SeqCst), failures.len());

        match failures.iter().position(|fails| *fails) {
            Some(first) => match result {
                Err(DispatchError::Handler(err)) => prop_assert_eq!(err.to_string(), format!("handler {}", first)),
                other => prop_assert!(false, "expected handler failure, got {:?}", other),
            },
            None => prop_assert!(result.is_ok()),
        }
    }

    /// Pattern routing through the dispatcher agrees with the matcher.
    #[test]
    fn prop_dispatch_agrees_with_pattern(pattern in "[ab]{0,2}\\*[ab]{0,2}", name in "[ab]{0,5}") {
        let dispatcher = Dispatcher::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&calls);
        dispatcher.subscribe(&pattern, &Handler::wildcard(move |_, _| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })).unwrap();

        if name.is_empty() {
            prop_assert!(dispatcher.emit(&name, 0).is_err());
        } else {
            dispatcher.emit(&name, 0).unwrap();
            let expected = usize::from(Pattern::parse(&pattern).matches(&name));
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
        }
    }
}
