//! Cover motion tracking and watchdog tests

mod common;

use common::{
    cover_device, is_query, is_set_position, is_stop, position_report, recording_context,
    COVER_ID, SENDER_ID,
};
use enocean_components::{Cover, CoverError, EntityContext, SharedStateStore, StateStore};
use enocean_config_entries::WatchdogConfig;
use enocean_core::{Rorg, Telegram};
use enocean_dispatcher::{Dispatcher, TelegramSender};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

/// Records each telegram with the cover state published at the moment it was sent
struct StateAtSendSender {
    states: SharedStateStore,
    sent: Mutex<Vec<(Telegram, Option<String>)>>,
}

impl TelegramSender for StateAtSendSender {
    fn send_telegram(&self, telegram: Telegram) {
        let unique_id = telegram.destination.to_string();
        let state = self.states.get_state(&unique_id);
        self.sent.lock().unwrap().push((telegram, state));
    }
}

fn cover() -> (Cover, Arc<common::RecordingSender>) {
    let (ctx, sender, _dispatcher) = recording_context();
    (Cover::new(&cover_device(), ctx, WatchdogConfig::default()), sender)
}

fn report(cover: &Cover, position: u8) {
    cover.handle_telegram(&position_report(COVER_ID, position));
}

#[tokio::test(start_paused = true)]
async fn test_first_report_adopts_position() {
    let (cover, sender) = cover();
    assert_eq!(cover.state().position, None);
    assert_eq!(cover.state().state(), "unknown");

    report(&cover, 40);

    let state = cover.state();
    assert_eq!(state.position, Some(40));
    assert_eq!(state.is_closed, Some(false));
    assert!(!state.is_opening);
    assert!(!state.is_closing);
    assert!(!cover.watchdog_enabled());
    assert!(sender.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_direction_inferred_from_reports() {
    let (cover, _sender) = cover();

    report(&cover, 40);
    report(&cover, 55);
    assert!(cover.state().is_opening);
    assert!(!cover.state().is_closing);
    assert!(cover.watchdog_enabled());

    report(&cover, 50);
    assert!(!cover.state().is_opening);
    assert!(cover.state().is_closing);
    assert_eq!(cover.state().position, Some(50));
}

#[tokio::test(start_paused = true)]
async fn test_stop_needs_two_identical_reports() {
    let (cover, _sender) = cover();

    report(&cover, 40);
    report(&cover, 55);

    report(&cover, 55);
    assert!(cover.stop_suspected());
    assert!(cover.state().is_opening);
    assert!(cover.watchdog_enabled());

    report(&cover, 55);
    assert!(!cover.stop_suspected());
    assert!(!cover.state().is_opening);
    assert!(!cover.state().is_closing);
    assert!(!cover.watchdog_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_movement_resets_stop_suspicion() {
    let (cover, _sender) = cover();

    report(&cover, 40);
    report(&cover, 55);
    report(&cover, 55);
    assert!(cover.stop_suspected());

    report(&cover, 60);
    assert!(cover.state().is_opening);
    assert!(!cover.stop_suspected());

    // One duplicate is not enough after movement resumed
    report(&cover, 60);
    assert!(cover.state().is_opening);
    assert!(cover.stop_suspected());
    assert!(cover.watchdog_enabled());

    report(&cover, 60);
    assert!(!cover.stop_suspected());
    assert!(!cover.state().is_opening);
    assert!(!cover.watchdog_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_terminal_positions_stop_immediately() {
    let (cover, _sender) = cover();

    report(&cover, 40);
    report(&cover, 55);
    report(&cover, 100);
    let state = cover.state();
    assert_eq!(state.position, Some(100));
    assert!(!state.is_opening);
    assert_eq!(state.state(), "open");
    assert!(!cover.watchdog_enabled());

    report(&cover, 50);
    report(&cover, 0);
    let state = cover.state();
    assert_eq!(state.is_closed, Some(true));
    assert!(!state.is_closing);
    assert_eq!(state.state(), "closed");
    assert!(!cover.watchdog_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_command_echo_is_not_interpreted() {
    let (cover, sender) = cover();
    report(&cover, 40);

    cover.set_position(30).unwrap();
    assert!(cover.command_in_flight());
    assert!(cover.state().is_closing);
    assert_eq!(sender.count(is_set_position), 1);

    // Echo: position adopted, direction untouched
    report(&cover, 35);
    assert!(!cover.command_in_flight());
    assert_eq!(cover.state().position, Some(35));
    assert!(cover.state().is_closing);

    report(&cover, 32);
    assert!(cover.state().is_closing);
    assert_eq!(cover.state().position, Some(32));
}

#[tokio::test(start_paused = true)]
async fn test_echo_of_previous_position_keeps_intent() {
    let (cover, _sender) = cover();
    report(&cover, 40);

    cover.set_position(30).unwrap();
    report(&cover, 40);

    assert!(cover.state().is_closing);
    assert!(!cover.state().is_opening);
    assert!(!cover.stop_suspected());
}

#[tokio::test(start_paused = true)]
async fn test_position_encoding_over_full_range() {
    let (cover, sender) = cover();

    for target in 0..=100u8 {
        cover.set_position(target).unwrap();
        let sent = sender.sent();
        let byte = sent.last().unwrap().payload[0];
        assert_eq!(byte, 100 - target);

        // Decoding the same byte as a report recovers the target
        cover.handle_telegram(&Telegram::new(Rorg::Vld, vec![byte, 0x7F, 0x00, 0x04], COVER_ID));
        assert_eq!(cover.state().position, Some(target));
    }
}

#[tokio::test(start_paused = true)]
async fn test_set_position_encodes_device_polarity() {
    let (cover, sender) = cover();
    report(&cover, 40);

    cover.set_position(30).unwrap();

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    let telegram = &sent[0];
    assert_eq!(telegram.rorg, Rorg::Vld);
    assert_eq!(telegram.sender, SENDER_ID);
    assert_eq!(telegram.destination, COVER_ID);
    assert_eq!(telegram.payload, vec![70, 127, 0, 1]);

    // The device reports in the same polarity
    assert_eq!(position_report(COVER_ID, 30).payload[0], 70);
    report(&cover, 30);
    assert_eq!(cover.state().position, Some(30));
}

#[tokio::test(start_paused = true)]
async fn test_open_and_close_commands() {
    let (cover, sender) = cover();
    report(&cover, 40);

    cover.open();
    assert!(cover.state().is_opening);
    cover.close();
    assert!(cover.state().is_closing);
    assert!(!cover.state().is_opening);

    let payloads: Vec<u8> = sender.sent().iter().map(|t| t.payload[0]).collect();
    assert_eq!(payloads, vec![0, 100]);
}

#[tokio::test(start_paused = true)]
async fn test_set_position_with_unknown_position() {
    let (cover, sender) = cover();

    cover.set_position(60).unwrap();

    assert!(cover.command_in_flight());
    assert!(!cover.state().is_opening);
    assert!(!cover.state().is_closing);
    assert!(cover.watchdog_enabled());
    assert_eq!(sender.count(is_set_position), 1);

    // The first report only establishes the position
    report(&cover, 45);
    assert!(!cover.command_in_flight());
    assert_eq!(cover.state().position, Some(45));
    assert!(!cover.state().is_opening);
}

#[tokio::test(start_paused = true)]
async fn test_set_position_out_of_range_sends_nothing() {
    let (cover, sender) = cover();
    report(&cover, 40);

    assert_eq!(
        cover.set_position(101),
        Err(CoverError::PositionOutOfRange(101))
    );
    assert!(sender.sent().is_empty());
    assert!(!cover.command_in_flight());
    assert_eq!(cover.state().position, Some(40));
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_sent_every_time() {
    let (cover, sender) = cover();
    report(&cover, 40);
    cover.open();
    assert!(cover.watchdog_enabled());

    cover.stop();
    cover.stop();

    assert_eq!(sender.count(is_stop), 2);
    assert!(!cover.state().is_opening);
    assert!(!cover.state().is_closing);
    assert!(cover.command_in_flight());
    assert!(!cover.watchdog_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_reports_are_ignored() {
    let (cover, _sender) = cover();
    report(&cover, 40);

    cover.handle_telegram(&Telegram::new(Rorg::Vld, vec![0x7F, 0x7F, 0x00, 0x04], COVER_ID));
    assert_eq!(cover.state().position, Some(40));

    // Non-VLD and empty telegrams as well
    cover.handle_telegram(&Telegram::new(Rorg::Bs4, vec![0x10, 0, 0, 0x08], COVER_ID));
    cover.handle_telegram(&Telegram::new(Rorg::Vld, Vec::new(), COVER_ID));
    assert_eq!(cover.state().position, Some(40));
}

#[tokio::test(start_paused = true)]
async fn test_published_state() {
    let (ctx, _sender, _dispatcher) = recording_context();
    let states = ctx.states().clone();
    let cover = Cover::new(&cover_device(), ctx, WatchdogConfig::default());
    let unique_id = cover.info().unique_id.clone();
    assert_eq!(unique_id, COVER_ID.to_string());

    report(&cover, 40);
    let state = states.get(&unique_id).unwrap();
    assert_eq!(state.state, "open");
    assert_eq!(state.attributes["current_position"], 40);

    report(&cover, 20);
    assert_eq!(states.get_state(&unique_id).as_deref(), Some("closing"));

    report(&cover, 0);
    assert_eq!(states.get_state(&unique_id).as_deref(), Some("closed"));
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_queries_until_exhausted() {
    let (ctx, sender, _dispatcher) = recording_context();
    let states = ctx.states().clone();
    let cover = Cover::new(&cover_device(), ctx, WatchdogConfig::default());

    report(&cover, 40);
    cover.open();
    assert!(cover.watchdog_enabled());

    // First query after timeout plus one interval
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(sender.count(is_query), 0);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(sender.count(is_query), 1);

    // Silence: every query goes unanswered
    sleep(Duration::from_secs(12)).await;
    assert_eq!(sender.count(is_query), 10);
    assert!(!cover.watchdog_enabled());
    assert_eq!(cover.queries_remaining(), 0);

    let state = cover.state();
    assert_eq!(state.position, None);
    assert_eq!(state.is_closed, None);
    assert!(!state.is_opening);
    assert!(!state.is_closing);
    assert_eq!(
        states.get_state(&cover.info().unique_id).as_deref(),
        Some("unknown")
    );

    sleep(Duration::from_secs(30)).await;
    assert_eq!(sender.count(is_query), 10);
}

#[tokio::test(start_paused = true)]
async fn test_last_query_precedes_unknown_state() {
    let dispatcher = Arc::new(Dispatcher::new());
    let states = Arc::new(StateStore::new(dispatcher));
    let sender = Arc::new(StateAtSendSender {
        states: states.clone(),
        sent: Mutex::new(Vec::new()),
    });
    let ctx = EntityContext::new(sender.clone(), states.clone());
    let cover = Cover::new(&cover_device(), ctx, WatchdogConfig::default());
    assert_eq!(cover.info().unique_id, COVER_ID.to_string());

    report(&cover, 40);
    cover.open();
    sleep(Duration::from_secs(13)).await;

    let sent = sender.sent.lock().unwrap().clone();
    let queries: Vec<_> = sent.iter().filter(|(t, _)| is_query(t)).collect();
    assert_eq!(queries.len(), 10);
    let (_, state_at_last_query) = queries[9];
    assert_eq!(state_at_last_query.as_deref(), Some("opening"));
    assert_eq!(states.get_state(&cover.info().unique_id).as_deref(), Some("unknown"));
    assert!(!cover.stop_suspected());
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_honours_configured_limits() {
    let (ctx, sender, _dispatcher) = recording_context();
    let config = WatchdogConfig {
        timeout_ms: 500,
        interval_ms: 100,
        max_queries: 3,
    };
    let cover = Cover::new(&cover_device(), ctx, config);

    cover.set_position(50).unwrap();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(sender.count(is_query), 3);
    assert!(!cover.watchdog_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_reports_keep_watchdog_fed() {
    let (cover, sender) = cover();
    report(&cover, 40);
    cover.open();

    for position in [45, 50, 55, 60, 65, 70] {
        sleep(Duration::from_millis(500)).await;
        report(&cover, position);
        assert!(cover.watchdog_enabled());
    }
    assert_eq!(sender.count(is_query), 0);
    assert_eq!(cover.queries_remaining(), 10);

    report(&cover, 100);
    assert!(!cover.watchdog_enabled());

    sleep(Duration::from_secs(20)).await;
    assert_eq!(sender.count(is_query), 0);
}

#[tokio::test(start_paused = true)]
async fn test_query_answer_restarts_countdown() {
    let (cover, sender) = cover();
    report(&cover, 40);
    cover.open();

    // First query at 1.2 s
    sleep(Duration::from_millis(1300)).await;
    assert_eq!(sender.count(is_query), 1);
    assert_eq!(cover.queries_remaining(), 9);

    // Echo clears the in-flight flag, then a real movement report
    report(&cover, 50);
    report(&cover, 60);
    assert_eq!(cover.queries_remaining(), 10);
    assert!(cover.state().is_opening);

    // Countdown restarted at the report: no query before 1.2 s later
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(sender.count(is_query), 1);
}

#[tokio::test(start_paused = true)]
async fn test_added_cover_queries_its_position() {
    let (cover, sender) = cover();

    cover.on_added();
    assert!(cover.watchdog_enabled());

    sleep(Duration::from_millis(1300)).await;
    assert_eq!(sender.count(is_query), 1);

    report(&cover, 25);
    assert_eq!(cover.state().position, Some(25));
}

#[tokio::test(start_paused = true)]
async fn test_removed_cover_stops_querying() {
    let (cover, sender) = cover();
    cover.on_added();

    cover.on_removed();
    assert!(!cover.watchdog_enabled());

    sleep(Duration::from_secs(5)).await;
    assert_eq!(sender.count(is_query), 0);
}

#[test]
fn test_watchdog_without_runtime() {
    let (cover, sender) = cover();

    cover.set_position(50).unwrap();

    assert!(!cover.watchdog_enabled());
    assert_eq!(sender.count(is_set_position), 1);
}
