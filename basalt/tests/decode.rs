use std::cell::Cell;
use std::sync::Arc;

use serde_json::{json, Value};
use twilight_model::id::Id;

use basalt::models::{EndReason, EventType, ExceptionSeverity};
use basalt::{decode, BasaltCache, DecodeError, Event};

#[derive(Debug, PartialEq)]
struct Player {
    guild_id: u64,
}

fn known(guild_id: u64) -> Option<Player> {
    Some(Player { guild_id })
}

fn valid_payloads() -> Vec<Value> {
    vec![
        json!({"type": "TRACK_START", "guild_id": "42", "track": "QAAAjQIAJVJpY2sgQXN0bGV5"}),
        json!({"type": "TRACK_END", "guild_id": "42", "track": "abc", "reason": "LOAD_FAILED"}),
        json!({"type": "TRACK_STUCK", "guild_id": "42", "track": "abc", "threshold_ms": 10000}),
        json!({
            "type": "TRACK_EXCEPTION",
            "guild_id": "42",
            "track": "abc",
            "exception": {
                "message": "This video is unavailable",
                "cause": "com.sedmelluq.discord.lavaplayer.tools.FriendlyException",
            },
            "severity": "COMMON",
        }),
        json!({"type": "WEBSOCKET_OPEN", "guild_id": "42", "target": "eu-west123.discord.media", "ssrc": 4012}),
        json!({"type": "WEBSOCKET_CLOSED", "guild_id": "42", "code": 4014, "reason": "Disconnected.", "by_remote": true}),
    ]
}

#[test]
fn every_variant_preserves_its_fields() {
    let events: Vec<Event<Player>> = valid_payloads()
        .iter()
        .map(|payload| decode(payload, known).unwrap())
        .collect();

    let types: Vec<EventType> = events.iter().map(Event::event_type).collect();
    assert_eq!(types, EventType::ALL);

    for event in &events {
        assert_eq!(event.guild_id(), 42);
    }

    match &events[0] {
        Event::TrackStart(e) => {
            assert_eq!(e.track_id(), "QAAAjQIAJVJpY2sgQXN0bGV5");
            assert_eq!(e.player(), &Player { guild_id: 42 });
        }
        other => panic!("unexpected event {other}"),
    }

    match &events[1] {
        Event::TrackEnd(e) => {
            assert_eq!(e.track_id(), "abc");
            assert_eq!(e.reason(), EndReason::LoadFailed);
            assert!(e.reason().may_start_next());
        }
        other => panic!("unexpected event {other}"),
    }

    match &events[2] {
        Event::TrackStuck(e) => {
            assert_eq!(e.track_id(), "abc");
            assert_eq!(e.threshold_ms(), 10000);
        }
        other => panic!("unexpected event {other}"),
    }

    match &events[3] {
        Event::TrackException(e) => {
            assert_eq!(e.track_id(), "abc");
            assert_eq!(e.message(), "This video is unavailable");
            assert_eq!(
                e.cause(),
                "com.sedmelluq.discord.lavaplayer.tools.FriendlyException"
            );
            assert_eq!(e.severity(), ExceptionSeverity::Common);
        }
        other => panic!("unexpected event {other}"),
    }

    match &events[4] {
        Event::WebsocketOpen(e) => {
            assert_eq!(e.target(), "eu-west123.discord.media");
            assert_eq!(e.ssrc(), 4012);
        }
        other => panic!("unexpected event {other}"),
    }

    match &events[5] {
        Event::WebsocketClosed(e) => {
            assert_eq!(e.code(), 4014);
            assert_eq!(e.reason(), "Disconnected.");
            assert!(e.by_remote());
        }
        other => panic!("unexpected event {other}"),
    }
}

#[test]
fn only_playback_events_carry_a_player() {
    for payload in valid_payloads() {
        let event = decode(&payload, known).unwrap();
        assert_eq!(event.player().is_some(), event.is_playback(), "{event}");
        assert_eq!(event.track_id().is_some(), event.is_playback(), "{event}");
    }
}

#[test]
fn unknown_event_type_is_rejected() {
    let payload = json!({"type": "PLAYER_UPDATE", "guild_id": "42"});
    assert_eq!(
        decode(&payload, known).unwrap_err(),
        DecodeError::UnknownEventType(json!("PLAYER_UPDATE"))
    );

    let payload = json!({"guild_id": "42", "track": "abc"});
    assert_eq!(
        decode(&payload, known).unwrap_err(),
        DecodeError::UnknownEventType(Value::Null)
    );
}

#[test]
fn missing_guild_id_is_reported_for_every_variant() {
    for mut payload in valid_payloads() {
        let event_type = EventType::from_code(payload["type"].as_str().unwrap()).unwrap();
        payload.as_object_mut().unwrap().remove("guild_id");

        assert_eq!(
            decode(&payload, known).unwrap_err(),
            DecodeError::MissingField {
                field: "guild_id",
                variant: event_type,
            }
        );
    }
}

#[test]
fn track_exception_requires_nested_exception() {
    let mut payload = valid_payloads().remove(3);
    payload["exception"].as_object_mut().unwrap().remove("cause");
    assert_eq!(
        decode(&payload, known).unwrap_err(),
        DecodeError::MissingField {
            field: "cause",
            variant: EventType::TrackException,
        }
    );

    payload.as_object_mut().unwrap().remove("exception");
    assert_eq!(
        decode(&payload, known).unwrap_err(),
        DecodeError::MissingField {
            field: "exception",
            variant: EventType::TrackException,
        }
    );
}

#[test]
fn track_exception_rejects_unknown_severity() {
    let mut payload = valid_payloads().remove(3);
    payload["severity"] = json!("CATASTROPHIC");
    assert_eq!(
        decode(&payload, known).unwrap_err(),
        DecodeError::UnknownEnumCode {
            enumeration: "ExceptionSeverity",
            code: "CATASTROPHIC".to_string(),
        }
    );
}

#[test]
fn unknown_player_prevents_construction() {
    let payload = json!({"type": "TRACK_START", "guild_id": "42", "track": "abc"});
    let err = decode(&payload, |_| None::<Player>).unwrap_err();
    assert_eq!(err, DecodeError::UnknownPlayer(42));
}

#[test]
fn websocket_events_never_resolve_a_player() {
    let calls = Cell::new(0);
    let resolver = |guild_id| {
        calls.set(calls.get() + 1);
        known(guild_id)
    };

    for payload in &valid_payloads()[4..] {
        let event = decode(payload, resolver).unwrap();
        assert!(!event.is_playback());
    }
    assert_eq!(calls.get(), 0);

    let event = decode(&valid_payloads()[0], resolver).unwrap();
    assert!(event.is_playback());
    assert_eq!(calls.get(), 1);
}

#[test]
fn track_end_example() {
    let payload = json!({"type": "TRACK_END", "guild_id": 42, "track": "abc", "reason": "FINISHED"});
    let Event::TrackEnd(event) = decode(&payload, known).unwrap() else {
        panic!("expected a TrackEnd event");
    };

    assert_eq!(event.guild_id(), 42);
    assert_eq!(event.track_id(), "abc");
    assert_eq!(event.reason(), EndReason::Finished);
    assert!(event.reason().may_start_next());
}

#[test]
fn track_end_with_bogus_reason() {
    let payload = json!({"type": "TRACK_END", "guild_id": 42, "track": "abc", "reason": "BOGUS"});
    assert_eq!(
        decode(&payload, known).unwrap_err(),
        DecodeError::UnknownEnumCode {
            enumeration: "EndReason",
            code: "BOGUS".to_string(),
        }
    );
}

#[test]
fn wrong_field_types_name_field_and_variant() {
    let payload = json!({"type": "TRACK_STUCK", "guild_id": 1, "track": "abc", "threshold_ms": "10s"});
    assert_eq!(
        decode(&payload, known).unwrap_err(),
        DecodeError::TypeMismatch {
            field: "threshold_ms",
            expected: "unsigned integer",
            variant: EventType::TrackStuck,
        }
    );

    let payload = json!({"type": "WEBSOCKET_CLOSED", "guild_id": 1, "code": 1000, "reason": "", "by_remote": "yes"});
    assert_eq!(
        decode(&payload, known).unwrap_err(),
        DecodeError::TypeMismatch {
            field: "by_remote",
            expected: "boolean",
            variant: EventType::WebsocketClosed,
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_decodes_share_the_cache() {
    let cache = Arc::new(BasaltCache::default());
    for guild_id in 1..=8u64 {
        cache.insert(Id::new(guild_id), Player { guild_id });
    }

    let tasks: Vec<_> = (1..=64u64)
        .map(|n| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let guild_id = n % 8 + 1;
                let payload = json!({
                    "type": "TRACK_END",
                    "guild_id": guild_id.to_string(),
                    "track": format!("track-{n}"),
                    "reason": "STOPPED",
                });
                let event = decode(&payload, |id| cache.player(id)).unwrap();
                (guild_id, event.player().map(|p| p.guild_id))
            })
        })
        .collect();

    for task in tasks {
        let (guild_id, resolved) = task.await.unwrap();
        assert_eq!(resolved, Some(guild_id));
    }
    assert_eq!(cache.len(), 8);
}
