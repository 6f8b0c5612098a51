use std::sync::{Arc, Mutex};

use canteen::{
    error::BusError,
    runtime::{
        bus::EventBus,
        events::{Event, EventName, Payload, PayloadKind},
    },
};

fn recorder(bus: &EventBus, name: EventName, tag: &'static str, log: &Arc<Mutex<Vec<String>>>) {
    let log = Arc::clone(log);
    bus.subscribe(name, move |_, payload| {
        log.lock().expect("lock").push(format!("{tag}:{:?}", payload.kind()));
        Ok(())
    });
}

#[test]
fn handlers_run_in_registration_order() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    recorder(&bus, EventName::ShowMeals, "a", &log);
    recorder(&bus, EventName::ShowMeals, "b", &log);
    recorder(&bus, EventName::ShowUsers, "other", &log);

    bus.publish(EventName::ShowMeals, Payload::None).expect("publish");
    assert_eq!(*log.lock().expect("lock"), vec!["a:None", "b:None"]);
    assert_eq!(bus.subscriber_count(EventName::ShowMeals), 2);
    assert_eq!(bus.subscriber_count(EventName::Login), 0);
}

#[test]
fn mismatched_payload_reaches_no_handler() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    recorder(&bus, EventName::DeleteMeal, "h", &log);

    let err = bus
        .publish(EventName::DeleteMeal, Payload::strings(["1"]))
        .expect_err("contract");
    assert_eq!(
        err,
        BusError::PayloadContractViolation {
            event: EventName::DeleteMeal,
            expected: PayloadKind::Int,
            actual: PayloadKind::StringList,
        }
    );
    assert!(log.lock().expect("lock").is_empty());
    assert!(Event::new(EventName::Logout, Payload::Int(1)).is_err());
}

#[test]
fn publishing_without_subscribers_is_a_no_op() {
    let bus = EventBus::new();
    bus.publish(EventName::Exit, Payload::None).expect("publish");
}

#[test]
fn failing_handler_does_not_stop_siblings() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.subscribe(EventName::ShowErrorScreen, |_, _| {
        Err(BusError::PayloadContractViolation {
            event: EventName::ShowErrorScreen,
            expected: PayloadKind::StringList,
            actual: PayloadKind::None,
        })
    });
    recorder(&bus, EventName::ShowErrorScreen, "after", &log);

    let err = bus
        .publish(EventName::ShowErrorScreen, Payload::strings(["boom"]))
        .expect_err("first handler fails");
    assert!(matches!(err, BusError::PayloadContractViolation { .. }));
    assert_eq!(*log.lock().expect("lock"), vec!["after:StringList"]);
}

#[test]
fn nested_publish_completes_before_outer_returns() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    {
        let log = Arc::clone(&log);
        bus.subscribe(EventName::Login, move |bus, _| {
            log.lock().expect("lock").push("login".to_string());
            bus.publish(EventName::SwitchMenu, Payload::Int(1))?;
            log.lock().expect("lock").push("login done".to_string());
            Ok(())
        });
    }
    recorder(&bus, EventName::SwitchMenu, "switch", &log);

    bus.publish(EventName::Login, Payload::strings(["a", "b"]))
        .expect("publish");
    assert_eq!(
        *log.lock().expect("lock"),
        vec!["login", "switch:Int", "login done"]
    );
}

#[test]
fn event_json_uses_wire_names() {
    let event = Event::new(EventName::SwitchMenu, Payload::Int(2)).expect("event");
    let json = serde_json::to_string(&event).expect("json");
    assert_eq!(json, r#"{"eventName":"SWITCH_MENU","payload":2}"#);
    let back: Event = serde_json::from_str(&json).expect("parse");
    assert_eq!(back, event);
}
