use chrono::{DateTime, Duration, Utc};

/// 过期时间解析
pub struct TimeParser;

impl TimeParser {
    /// 以 `now` 为基准解析时间字符串，支持：
    /// - RFC3339 格式：2023-10-01T12:00:00Z
    /// - 相对时间：30s, 10m, 2h, 1d, 2w, 1mo, 1y
    /// - 组合格式：1d2h30m
    pub fn parse_expire_time_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        let input = input.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.with_timezone(&Utc));
        }

        let duration = Self::parse_relative(input)?;
        now.checked_add_signed(duration)
            .ok_or_else(|| format!("Expiration time out of range: '{}'", input))
    }

    fn parse_relative(input: &str) -> Result<Duration, String> {
        if input.is_empty() {
            return Err("Empty time expression".to_string());
        }

        let mut total = Duration::zero();
        let mut rest = input;

        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits_end == 0 {
                return Err(format!("Invalid time format: '{}'", input));
            }
            let num: i64 = rest[..digits_end]
                .parse()
                .map_err(|_| format!("Invalid number in '{}'", input))?;
            rest = &rest[digits_end..];

            let unit_end = rest
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            if unit_end == 0 {
                return Err(format!("Missing time unit after '{}'", num));
            }
            let unit = &rest[..unit_end];
            rest = &rest[unit_end..];

            let part = match unit.to_lowercase().as_str() {
                "s" | "sec" | "second" | "seconds" => Duration::try_seconds(num),
                "m" | "min" | "minute" | "minutes" => Duration::try_minutes(num),
                "h" | "hour" | "hours" => Duration::try_hours(num),
                "d" | "day" | "days" => Duration::try_days(num),
                "w" | "week" | "weeks" => Duration::try_weeks(num),
                // 按 30 天近似
                "mo" | "month" | "months" => num.checked_mul(30).and_then(Duration::try_days),
                "y" | "year" | "years" => num.checked_mul(365).and_then(Duration::try_days),
                _ => return Err(format!("Unsupported time unit: '{}'", unit)),
            }
            .ok_or_else(|| format!("Time value out of range: '{}'", input))?;

            total = total
                .checked_add(&part)
                .ok_or_else(|| format!("Time value out of range: '{}'", input))?;
        }

        if total.is_zero() {
            return Err("Time interval cannot be zero".to_string());
        }
        Ok(total)
    }

    /// 格式化持续时间为人类可读的字符串（如 "2d 3h"）
    pub fn format_duration_human(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
        let secs = to.signed_duration_since(from).num_seconds();
        if secs < 0 {
            return "expired".to_string();
        }

        let days = secs / 86400;
        let hours = (secs % 86400) / 3600;
        let minutes = (secs % 3600) / 60;

        match (days, hours, minutes) {
            (d, 0, _) if d > 0 => format!("{}d", d),
            (d, h, _) if d > 0 => format!("{}d {}h", d, h),
            (_, h, 0) if h > 0 => format!("{}h", h),
            (_, h, m) if h > 0 => format!("{}h {}m", h, m),
            (_, _, m) if m > 0 => format!("{}m", m),
            _ => format!("{}s", secs),
        }
    }
}
