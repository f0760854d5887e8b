use chrono::{DateTime, Duration, Utc};

/// Environment variable holding a signed number of seconds to shift the clock by.
pub const FAKETIME_OFFSET_ENV_VAR: &str = "FAKETIME_OFFSET_SECONDS";

#[cfg_attr(not(debug_assertions), allow(dead_code))]
fn shifted(now: DateTime<Utc>, offset: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    let Some(offset) = offset else {
        return Ok(now);
    };

    let seconds = offset.trim().parse::<i64>()?;
    let offset = Duration::try_seconds(seconds)
        .ok_or_else(|| anyhow::anyhow!("Fake time offset {seconds}s is out of range"))?;

    now.checked_add_signed(offset)
        .ok_or_else(|| anyhow::anyhow!("Fake time offset {seconds}s is out of range"))
}

/// Idle decay and drop detection both depend on wall clock time, which makes them slow to
/// exercise against a real queue. In unit tests the controller takes `now` as a parameter, but
/// when running the poller against LocalStack it is handy to jump the clock forward instead.
///
/// Debug builds read `FAKETIME_OFFSET_SECONDS` on every call and shift the system time by that
/// many seconds, so changing the variable between runs time travels the poller.
#[cfg(debug_assertions)]
pub fn now() -> DateTime<Utc> {
    let offset = std::env::var(FAKETIME_OFFSET_ENV_VAR).ok();

    match shifted(Utc::now(), offset.as_deref()) {
        Ok(time) => time,
        Err(err) => panic!("Failed to read fake time offset: {err}"),
    }
}

#[cfg(not(debug_assertions))]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_offset_is_system_time() {
        let now = Utc::now();
        assert_eq!(shifted(now, None).unwrap(), now);
    }

    #[test]
    fn offsets_shift_both_ways() {
        let now = Utc::now();
        assert_eq!(shifted(now, Some("90")).unwrap(), now + Duration::seconds(90));
        assert_eq!(
            shifted(now, Some(" -30\n")).unwrap(),
            now - Duration::seconds(30)
        );
    }

    #[test]
    fn offset_past_the_end_of_time_is_an_error() {
        // Representable as a duration but not as a date
        assert!(shifted(Utc::now(), Some("1000000000000000")).is_err());
        assert!(shifted(Utc::now(), Some("-1000000000000000")).is_err());
    }

    #[test]
    fn garbage_offset_is_an_error() {
        assert!(shifted(Utc::now(), Some("soon")).is_err());
    }
}
