//! Sessions and gameplay events produced by a full engine run.

use std::collections::{HashMap, HashSet};
use telemetry_core::{engine::SimEngine, event::EventType};

#[test]
fn dau_from_sessions_matches_schedule() {
    let engine = SimEngine::build_test(42).unwrap();
    let data = engine.generate().unwrap();
    assert_eq!(data.dau_from_sessions(), data.report.achieved());
}

#[test]
fn every_active_day_has_a_session_and_no_other_day_does() {
    let engine = SimEngine::build_test(8).unwrap();
    let data = engine.generate().unwrap();

    let mut seen: HashMap<u32, HashSet<u32>> = HashMap::new();
    for s in &data.sessions {
        seen.entry(s.player_id).or_default().insert(s.day);
    }
    for (idx, p) in data.players.iter().enumerate() {
        let expected: HashSet<u32> = data.activity.active_days(idx).iter().copied().collect();
        let got = seen.remove(&p.player_id).unwrap_or_default();
        assert_eq!(got, expected, "player {}", p.player_id);
    }
}

#[test]
fn sessions_stay_inside_their_utc_day_and_never_overlap() {
    let engine = SimEngine::build_test(17).unwrap();
    let data = engine.generate().unwrap();

    let mut last_end = HashMap::new();
    for s in &data.sessions {
        assert!(s.end >= s.start);
        assert_eq!(s.start.date_naive(), s.end.date_naive(), "session {} crosses midnight", s.session_id);
        assert_eq!((s.end - s.start).num_seconds(), s.duration_sec);
        assert!(s.duration_sec <= engine.config.sessions.max_duration_sec);
        if let Some(prev) = last_end.insert(s.player_id, s.end) {
            assert!(s.start >= prev, "session {} overlaps", s.session_id);
        }
    }
    let ids: Vec<u64> = data.sessions.iter().map(|s| s.session_id).collect();
    assert_eq!(ids, (1..=data.sessions.len() as u64).collect::<Vec<_>>());
}

#[test]
fn sessions_never_start_before_player_creation() {
    let engine = SimEngine::build_test(23).unwrap();
    let data = engine.generate().unwrap();
    for s in &data.sessions {
        let player = &data.players[s.player_id as usize - 1];
        assert!(s.start >= player.created_at, "session {} before creation", s.session_id);
    }
}

#[test]
fn each_session_opens_with_session_start_and_events_are_ordered() {
    let engine = SimEngine::build_test(5).unwrap();
    let data = engine.generate().unwrap();

    let bounds: HashMap<u64, (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> =
        data.sessions.iter().map(|s| (s.session_id, (s.start, s.end))).collect();
    let mut first_seen = HashSet::new();
    let mut last_time = HashMap::new();

    for e in &data.events {
        let sid = e.session_id.expect("every event belongs to a session");
        let (start, end) = bounds[&sid];
        assert!(e.event_time >= start && e.event_time <= end, "event {} outside session", e.event_id);
        if first_seen.insert(sid) {
            assert_eq!(e.event_type, EventType::SessionStart);
            assert_eq!(e.event_time, start);
        }
        if let Some(prev) = last_time.insert(sid, e.event_time) {
            assert!(e.event_time >= prev, "event {} out of order", e.event_id);
        }
    }
    assert_eq!(first_seen.len(), data.sessions.len());
}

#[test]
fn match_end_always_follows_its_match_start() {
    let engine = SimEngine::build_test(99).unwrap();
    let data = engine.generate().unwrap();

    let mut open = HashSet::new();
    let mut ended = 0;
    for e in &data.events {
        match e.event_type {
            EventType::MatchStart => {
                assert!(e.game_mode.is_some());
                assert!(open.insert(e.match_id.expect("match id")));
            }
            EventType::MatchEnd => {
                let id = e.match_id.expect("match id");
                assert!(open.remove(&id), "match {id} ended without starting");
                assert!(e.match_outcome.is_some());
                assert!(e.soft_delta > 0);
                ended += 1;
            }
            _ => {}
        }
    }
    assert!(open.is_empty(), "every started match ends within its session");
    assert!(ended > 0);
}

#[test]
fn level_never_decreases() {
    let engine = SimEngine::build_test(31).unwrap();
    let data = engine.generate().unwrap();

    let mut level = HashMap::new();
    let mut level_ups = 0;
    for e in &data.events {
        let prev = level.insert(e.player_id, e.level).unwrap_or(1);
        assert!(e.level >= prev, "player {} level {prev} -> {}", e.player_id, e.level);
        if e.event_type == EventType::LevelUp {
            assert_eq!(e.level, prev + 1);
            level_ups += 1;
        }
    }
    assert!(level_ups > 0);
}

#[test]
fn versions_and_seasons_advance_with_time() {
    let engine = SimEngine::build_test(4).unwrap();
    let data = engine.generate().unwrap();

    for s in &data.sessions {
        let patch: u32 = if s.day >= 20 { 2 } else if s.day >= 10 { 1 } else { 0 };
        assert!(s.client_version.starts_with(&format!("1.{patch}.")), "{} on day {}", s.client_version, s.day);
        let first = 1_000 + patch * 100;
        assert!((first..first + 100).contains(&s.build_number));
        assert_eq!(s.season_id, 1);
    }
}

#[test]
fn session_start_metadata_is_json() {
    let engine = SimEngine::build_test(2).unwrap();
    let data = engine.generate().unwrap();
    let e = data
        .events
        .iter()
        .find(|e| e.event_type == EventType::SessionStart)
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&e.metadata_json().unwrap()).unwrap();
    assert!(parsed.get("entry_point").is_some());
}
