// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn throttle_logs_first_of_every_five() {
    let mut throttle = ErrorThrottle::new();
    let logged: Vec<bool> = (0..11).map(|_| throttle.should_log()).collect();
    assert_eq!(
        logged,
        vec![true, false, false, false, false, true, false, false, false, false, true]
    );
}

#[test]
fn throttle_resets_after_quiet_window() {
    let mut throttle = ErrorThrottle::new();
    assert!(throttle.should_log());
    assert!(!throttle.should_log());
    throttle.last -= ERROR_WINDOW * 2;
    assert!(throttle.should_log());
}

#[test]
fn throttle_restarts_burst_after_successful_read() {
    let mut throttle = ErrorThrottle::new();
    assert!(throttle.should_log());
    assert!(!throttle.should_log());
    assert!(!throttle.should_log());
    throttle.reset();
    assert!(throttle.should_log());
    assert!(!throttle.should_log());
}
