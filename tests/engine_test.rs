///! Integration test for the order lifecycle guards, the SLA warning
///! policy and the contractor fan-out policy.
///!
///! Everything here drives the engine's decision layer directly with
///! hand-built records. No running server or database is needed.
///!
///! Run with: `cargo test --test engine_test`
use chrono::{Duration, Utc};
use uuid::Uuid;

use helpdesk_backend::engine::EngineError;
use helpdesk_backend::engine::fanout::{Audience, fanout_audience};
use helpdesk_backend::engine::lifecycle::{check_create_guards, validate_transition};
use helpdesk_backend::engine::sweep::is_warning;
use helpdesk_backend::models::orders::{Model as Order, Status};

/// Helper: a freshly created order with all latches down.
fn new_order(task: &str, client_id: Uuid) -> Order {
    Order {
        id: Uuid::new_v4(),
        task: task.to_string(),
        client_id,
        contractor_id: None,
        status: Status::Created,
        created_at: Utc::now(),
        assigned_at: None,
        closed_at: None,
        not_taken_manager_informed: false,
        late_work_manager_informed: false,
        in_work_client_informed: false,
        closed_client_informed: false,
        reserved_contractors_informed: false,
        all_contractors_informed: false,
        creds: Some("Login: admin\nPassword: qwerty".to_string()),
        estimated_hours: None,
    }
}

#[test]
fn test_end_to_end_lifecycle_walk() {
    // A paid client on a quota of 2 files their first order of the cycle.
    assert!(check_create_guards(true, false, 0, 2).is_ok());
    let mut order = new_order("restore the mail server", Uuid::new_v4());

    // A second create attempt while the first is still open is rejected with
    // the active-order message, not the quota one.
    assert!(matches!(
        check_create_guards(true, true, 1, 2),
        Err(EngineError::ActiveOrderExists)
    ));

    // A contractor takes it: created -> in_work.
    let contractor_id = Uuid::new_v4();
    validate_transition(order.status, Status::InWork).expect("pickup must be legal");
    order.status = Status::InWork;
    order.contractor_id = Some(contractor_id);
    order.assigned_at = Some(Utc::now());

    // A second pickup attempt sees in_work and loses.
    assert!(matches!(
        validate_transition(order.status, Status::InWork),
        Err(EngineError::InvalidTransition { .. })
    ));
    assert_eq!(order.contractor_id, Some(contractor_id), "single winner");

    // The contractor closes it: credentials are gone, closed_at is set.
    validate_transition(order.status, Status::Closed).expect("close must be legal");
    order.status = Status::Closed;
    order.closed_at = Some(Utc::now());
    order.creds = None;

    // Terminal means terminal.
    for target in [Status::Created, Status::InWork, Status::Closed, Status::Cancelled] {
        assert!(validate_transition(order.status, target).is_err());
    }

    // With the active order gone the client can file again: one billable
    // order used out of two.
    assert!(check_create_guards(true, false, 1, 2).is_ok());
}

#[test]
fn test_cancelled_orders_do_not_consume_quota() {
    // Three non-cancelled orders since the cycle start exhaust a quota of 3.
    assert!(matches!(
        check_create_guards(true, false, 3, 3),
        Err(EngineError::QuotaExceeded)
    ));
    // If one of them had been cancelled it would not count.
    assert!(check_create_guards(true, false, 2, 3).is_ok());
}

#[test]
fn test_not_taken_sweep_notifies_once_per_order() {
    let reaction_seconds = 30 * 60; // 30-minute SLA
    let threshold = 0.95;
    let mut order = new_order("renew the tls certificates", Uuid::new_v4());
    order.created_at = Utc::now() - Duration::minutes(29);

    // One sweep tick over a single-order table.
    fn tick(order: &mut Order, reaction_seconds: i64, threshold: f64, notifications: &mut u32) {
        let is_candidate = order.status == Status::Created && !order.not_taken_manager_informed;
        if !is_candidate {
            return;
        }
        let elapsed = (Utc::now() - order.created_at).num_seconds();
        if is_warning(elapsed, reaction_seconds, threshold) {
            *notifications += 1;
            order.not_taken_manager_informed = true;
        }
    }

    let mut notifications = 0;
    tick(&mut order, reaction_seconds, threshold, &mut notifications);
    tick(&mut order, reaction_seconds, threshold, &mut notifications);
    assert_eq!(notifications, 1, "the latch keeps the second tick quiet");
}

#[test]
fn test_fanout_progresses_from_reserved_to_everyone() {
    let reaction_seconds = 60 * 60;
    let window = 0.20;
    let mut reserved_informed = false;
    let mut all_informed = false;

    // First pass, two minutes in: only the reserved contractors hear.
    let audience = fanout_audience(true, reserved_informed, 120, reaction_seconds, window);
    assert_eq!(audience, Audience::ReservedOnly);
    reserved_informed = true;
    assert!(!all_informed, "the broadcast latch stays down inside the window");

    // Second pass, still inside the window: silence.
    let audience = fanout_audience(true, reserved_informed, 300, reaction_seconds, window);
    assert_eq!(audience, Audience::Nobody);

    // Third pass, window elapsed: everyone else hears and both latches rise.
    let audience = fanout_audience(true, reserved_informed, 13 * 60, reaction_seconds, window);
    assert_eq!(audience, Audience::AvailableExceptReserved);
    all_informed = true;
    assert!(reserved_informed && all_informed);
}

#[test]
fn test_fanout_without_reservations_broadcasts_on_first_pass() {
    let audience = fanout_audience(false, false, 0, 60 * 60, 0.20);
    assert_eq!(audience, Audience::AllAvailable);
}

#[test]
fn test_warning_threshold_is_strict() {
    let limit = 100 * 60;
    // 95% exactly is still inside the SLA.
    assert!(!is_warning(95 * 60, limit, 0.95));
    assert!(is_warning(96 * 60, limit, 0.95));
}
