const SECONDS_IN_DAY: f64 = 86_400.;
const SECONDS_IN_HOUR: f64 = 3_600.;
const SECONDS_IN_MINUTE: f64 = 60.;

const MS_IN_SECOND: f64 = 1_000.;

pub fn ms_to_seconds(ms: i64) -> f64 {
    ms as f64 / MS_IN_SECOND
}

/// This is the standard way of presenting a duration in the tools, for example
/// `1 day 2 hours 3.500 seconds`. Components that are zero are left out, except seconds when
/// nothing else is shown.
pub fn format_pretty_time(seconds: f64) -> String {
    let seconds = seconds.max(0.);
    let (days, seconds) = div_rem(seconds, SECONDS_IN_DAY);
    let (hours, seconds) = div_rem(seconds, SECONDS_IN_HOUR);
    let (minutes, seconds) = div_rem(seconds, SECONDS_IN_MINUTE);

    let mut parts = Vec::new();
    for (value, unit) in [(days, "day"), (hours, "hour"), (minutes, "minute")] {
        if value > 0. {
            parts.push(format!("{} {unit}{}", value as u64, plural(value > 1.)));
        }
    }
    if seconds > 0. || parts.is_empty() {
        parts.push(format!("{seconds:.3} second{}", plural(seconds != 1.)));
    }
    parts.join(" ")
}

fn div_rem(value: f64, divisor: f64) -> (f64, f64) {
    let quotient = (value / divisor).floor();
    (quotient, value - quotient * divisor)
}

fn plural(is_plural: bool) -> &'static str {
    if is_plural {
        "s"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::format_pretty_time;

    #[test]
    fn zero_is_shown_as_seconds() {
        assert_eq!(format_pretty_time(0.), "0.000 seconds");
    }

    #[test]
    fn singular_units() {
        assert_eq!(
            format_pretty_time(86_400. + 3_600. + 60. + 1.),
            "1 day 1 hour 1 minute 1.000 second"
        );
    }

    #[test]
    fn zero_components_are_skipped() {
        assert_eq!(format_pretty_time(7_200.), "2 hours");
        assert_eq!(format_pretty_time(2. * 86_400. + 0.25), "2 days 0.250 seconds");
    }

    #[test]
    fn fractional_seconds() {
        assert_eq!(format_pretty_time(61.5), "1 minute 1.500 seconds");
        assert_eq!(format_pretty_time(0.3), "0.300 seconds");
    }
}
