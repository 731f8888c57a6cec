//! Clocks bound to a [`Context`], plus zone helpers for tests.
//!
//! Code that needs the current time asks [`now`] instead of the system, so a
//! test can pin it with [`stopped`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::context::{Context, Key};
use crate::testing::T;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Tz> + Send + Sync,
{
    fn now(&self) -> DateTime<Tz> {
        self()
    }
}

/// The system clock, reporting in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&Tz::UTC)
    }
}

/// [`Context`] key of the active [`Clock`].
pub struct ClockKey;

impl Key for ClockKey {
    type Value = Arc<dyn Clock>;
    const NAME: &'static str = "Clock";
}

/// `ctx` with the system clock.
pub fn default(ctx: &Context) -> Context {
    using(ctx, Arc::new(SystemClock))
}

/// `ctx` with a clock that always reports `t`.
pub fn stopped(ctx: &Context, t: DateTime<Tz>) -> Context {
    using(ctx, Arc::new(move || t))
}

pub fn using(ctx: &Context, clock: Arc<dyn Clock>) -> Context {
    ctx.with_value::<ClockKey>(clock)
}

/// The current instant according to the clock in `ctx`.
///
/// # Panics
///
/// If no clock was installed with [`default`], [`stopped`] or [`using`].
#[track_caller]
pub fn now(ctx: &Context) -> DateTime<Tz> {
    ctx.expect_value::<ClockKey>().now()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("unknown time zone {code}")]
    Unknown { code: String },
}

fn locations() -> &'static RwLock<HashMap<String, Tz>> {
    static LOCATIONS: OnceLock<RwLock<HashMap<String, Tz>>> = OnceLock::new();
    LOCATIONS.get_or_init(Default::default)
}

/// The IANA zone named `code`, cached for the life of the process.
///
/// An empty code is UTC.
pub fn load_location(code: &str) -> Result<Tz, LocationError> {
    if let Some(tz) = locations().read().ok().and_then(|l| l.get(code).copied()) {
        return Ok(tz);
    }
    let tz = if code.is_empty() {
        Tz::UTC
    } else {
        code.parse::<Tz>().map_err(|_| LocationError::Unknown { code: code.to_string() })?
    };
    if let Ok(mut l) = locations().write() {
        l.entry(code.to_string()).or_insert(tz);
    }
    Ok(tz)
}

/// [`load_location`], failing `t` fatally on error.
pub fn must_load_location(t: &dyn T, code: &str) -> Tz {
    match load_location(code) {
        Ok(tz) => tz,
        Err(err) => {
            t.helper();
            t.fatal(&err.to_string())
        }
    }
}

/// The instant with the given wall clock reading in zone `code`.
///
/// Out-of-range values are normalized: February 30 is March 2 (or 1 in a
/// leap year), hour 24 is midnight the next day, month 13 is January of the
/// next year. Fails `t` fatally if the zone is unknown or the result lies
/// outside the representable range.
#[allow(clippy::too_many_arguments)]
pub fn must_date(
    t: &dyn T,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
    nsec: u32,
    code: &str,
) -> DateTime<Tz> {
    t.helper();
    let tz = must_load_location(t, code);
    let Some(naive) = normalize(year, month, day, hour, min, sec, nsec) else {
        t.fatal(&format!(
            "date out of range {year:04}-{month:02}-{day:02} {hour:02}:{min:02}:{sec:02}.{nsec:09}"
        ))
    };
    localize(&naive, tz)
}

#[allow(clippy::too_many_arguments)]
fn normalize(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32, nsec: u32) -> Option<NaiveDateTime> {
    let months = i64::from(year) * 12 + i64::from(month) - 1;
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = u32::try_from(months.rem_euclid(12)).ok()? + 1;
    let offset = Duration::days(i64::from(day) - 1)
        + Duration::hours(i64::from(hour))
        + Duration::minutes(i64::from(min))
        + Duration::seconds(i64::from(sec))
        + Duration::nanoseconds(i64::from(nsec));
    NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(offset)
}

/// `t` with the same wall clock reading in `tz`.
///
/// Readings that fall in a gap of `tz` move forward by an hour.
pub fn wall_in(t: &DateTime<Tz>, tz: Tz) -> DateTime<Tz> {
    localize(&t.naive_local(), tz)
}

fn localize(naive: &NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let shifted = *naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(naive))
        }
    }
}

/// Whether `a` and `b` agree on date, clock, nanosecond and zone name.
///
/// Unlike `==`, which compares instants, the same instant seen from two
/// zones is unequal here.
pub fn wall_eq(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    (a.year(), a.month(), a.day()) == (b.year(), b.month(), b.day())
        && (a.hour(), a.minute(), a.second()) == (b.hour(), b.minute(), b.second())
        && a.nanosecond() == b.nanosecond()
        && a.timezone().name() == b.timezone().name()
}
