//! Formatting utilities for record display.

/// Format a duration in seconds as `MM:SS.mmm` or `HH:MM:SS.mmm`.
///
/// The hours component is only emitted when the duration is at least one hour.
pub fn format_time(seconds: f64) -> String {
    debug_assert!(
        seconds.is_finite() && seconds >= 0.0,
        "format_time expects a finite, non-negative duration"
    );

    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = (seconds / 60.0).floor() as u64 % 60;
    let secs = seconds % 60.0;

    if hours > 0 {
        format!("{:02}:{:02}:{:06.3}", hours, minutes, secs)
    } else {
        format!("{:02}:{:06.3}", minutes, secs)
    }
}

/// Format the gap between a personal best and a world record as `(+MM:SS.mmm)`.
///
/// Returns an empty string when both times are equal (the player holds the record).
pub fn format_delta(pb_time: f64, wr_time: f64) -> String {
    let diff = pb_time - wr_time;
    if diff == 0.0 {
        return String::new();
    }
    format!("(+{})", format_time(diff.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_zero() {
        assert_eq!(format_time(0.0), "00:00.000");
    }

    #[test]
    fn test_format_time_minutes() {
        assert_eq!(format_time(100.53), "01:40.530");
    }

    #[test]
    fn test_format_time_hours() {
        assert_eq!(format_time(3661.2), "01:01:01.200");
    }

    #[test]
    fn test_format_time_sub_second() {
        assert_eq!(format_time(1.5), "00:01.500");
    }

    #[test]
    fn test_format_time_just_under_an_hour() {
        assert_eq!(format_time(3599.0), "59:59.000");
    }

    #[test]
    fn test_format_time_many_hours() {
        assert_eq!(format_time(36_000.0), "10:00:00.000");
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(110.0, 100.0), "(+00:10.000)");
    }

    #[test]
    fn test_format_delta_equal_times() {
        assert_eq!(format_delta(100.0, 100.0), "");
    }
}
