// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

use crate::types::*;

#[test]
fn null() {
    assert_eq!(DateTime::null().checked_ticks(), 0i64);
}

#[test]
fn epoch() {
    let epoch = DateTime::ymd_hms_nano(1601, 1, 1, 0, 0, 0, 0);
    assert_eq!(epoch.ticks(), 0);
    assert_eq!(epoch.checked_ticks(), 0);

    let epoch = DateTime::epoch();
    assert_eq!(epoch.ticks(), 0);
    assert_eq!(epoch.checked_ticks(), 0);
}

#[test]
fn before_epoch() {
    let before = DateTime::ymd_hms_nano(1600, 12, 31, 23, 59, 59, 999_999);
    assert_eq!(before.checked_ticks(), 0);
    assert_eq!(before, DateTime::null());
}

#[test]
fn epoch_plus_1tick() {
    let epoch = DateTime::ymd_hms_nano(1601, 1, 1, 0, 0, 0, 100);
    assert_eq!(epoch.ticks(), 1);
}

#[test]
fn sub_tick_precision_is_truncated() {
    let dt = DateTime::ymd_hms_nano(2020, 2, 3, 4, 5, 6, 123_456_789);
    assert_eq!(dt, DateTime::ymd_hms_nano(2020, 2, 3, 4, 5, 6, 123_456_700));
}

#[test]
fn endtimes() {
    let endtimes = DateTime::ymd_hms_nano(9999, 12, 31, 23, 59, 59, 999_999);
    assert_eq!(endtimes.checked_ticks(), i64::MAX);
    assert_eq!(endtimes, DateTime::endtimes());

    let endtimes = DateTime::ymd_hms_nano(10000, 1, 1, 0, 0, 0, 0);
    assert_eq!(endtimes.checked_ticks(), i64::MAX);
    assert!(endtimes.is_endtimes());
}

#[test]
fn ticks_round_trip() {
    let dt = DateTime::ymd_hms_nano(2021, 7, 14, 8, 30, 1, 500_000_000);
    assert_eq!(DateTime::from(dt.checked_ticks()), dt);
    assert_eq!(DateTime::from(i64::MAX), DateTime::endtimes());
    assert_eq!(DateTime::from(-5i64), DateTime::null());
}

#[test]
fn zoned_times_become_utc() {
    let offset = FixedOffset::east_opt(5 * 3600).unwrap();
    let local = offset.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap();
    let dt = DateTime::from(local);
    assert_eq!(dt, DateTime::ymd_hms(2022, 3, 1, 7, 0, 0));

    let naive = NaiveDate::from_ymd_opt(2022, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    assert_eq!(DateTime::from(naive), DateTime::ymd_hms(2022, 3, 1, 12, 0, 0));

    let utc = Utc.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap();
    assert_eq!(DateTime::from(utc), DateTime::from(naive));
}

#[test]
fn iso8601_text() {
    assert_eq!(
        DateTime::ymd_hms(2019, 10, 1, 1, 2, 3).to_iso8601(),
        "2019-10-01T01:02:03Z"
    );
    assert_eq!(
        DateTime::ymd_hms_nano(2019, 10, 1, 1, 2, 3, 120_000_000).to_iso8601(),
        "2019-10-01T01:02:03.12Z"
    );
    assert_eq!(
        DateTime::ymd_hms_nano(2019, 10, 1, 1, 2, 3, 100).to_iso8601(),
        "2019-10-01T01:02:03.0000001Z"
    );
    assert_eq!(DateTime::null().to_iso8601(), MIN_DATE_TIME_TEXT);
    assert_eq!(DateTime::endtimes().to_iso8601(), MAX_DATE_TIME_TEXT);
}

#[test]
fn iso8601_parse() {
    assert_eq!(
        DateTime::from_str("2019-10-01T03:02:03+02:00").unwrap(),
        DateTime::ymd_hms(2019, 10, 1, 1, 2, 3)
    );
    assert_eq!(
        DateTime::from_str("2019-10-01T01:02:03").unwrap(),
        DateTime::ymd_hms(2019, 10, 1, 1, 2, 3)
    );
    assert_eq!(DateTime::from_str(MIN_DATE_TIME_TEXT).unwrap(), DateTime::null());
    assert_eq!(DateTime::from_str(MAX_DATE_TIME_TEXT).unwrap(), DateTime::endtimes());
    assert!(matches!(
        DateTime::from_str("yesterday"),
        Err(EncodingError::TypeMismatch { .. })
    ));
}

#[test]
fn time() {
    use chrono::Datelike;
    let now = DateTime::now();
    let now = now.as_chrono();
    assert!(now.year() > 2000 && now.year() < 2100);
    assert!(now.month() >= 1 && now.month() <= 12);
}

#[test]
fn string() {
    let now = DateTime::now();
    let now_s = format!("{}", now);
    let now2 = DateTime::from_str(&now_s).unwrap();
    assert_eq!(now, now2);
}
