//! 业务时区时间工具
//!
//! 门店统一使用固定 UTC-3 偏移（无夏令时），与服务器本地时区无关。
//! 所有函数都接收显式的 `now`，调用方在边界处传入 `Utc::now()`。

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::error::{AppError, AppResult};

/// UTC-3, in seconds east of UTC.
pub const BUSINESS_UTC_OFFSET_SECS: i32 = -3 * 3600;

pub fn business_offset() -> FixedOffset {
    FixedOffset::east_opt(BUSINESS_UTC_OFFSET_SECS).expect("UTC-3 is a valid offset")
}

/// 将 UTC 时间转换为业务时区时间，时/分/日字段按 UTC-3 解读
pub fn now_fixed_offset(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    now.with_timezone(&business_offset())
}

/// 业务时区下的“今天”
pub fn business_today(now: DateTime<Utc>) -> NaiveDate {
    now_fixed_offset(now).date_naive()
}

/// 解析日期字符串 (YYYY-MM-DD)，拒绝 2024-13-45 这类非法日期
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError(format!("Invalid date format: {date}")))
}

/// 日期 + 时分 → 业务时区时间点；时分越界时返回 None
pub fn date_hm_in_business_tz(
    date: NaiveDate,
    hour: u32,
    minute: u32,
) -> Option<DateTime<FixedOffset>> {
    date.and_hms_opt(hour, minute, 0)?
        .and_local_timezone(business_offset())
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_now_fixed_offset_shifts_wall_clock() {
        let now = Utc.with_ymd_and_hms(2024, 3, 11, 1, 15, 0).unwrap();
        let local = now_fixed_offset(now);
        assert_eq!(local.hour(), 22);
        assert_eq!(local.minute(), 15);
        assert_eq!(business_today(now), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        assert!(parse_date("2024-13-45").is_err());
        assert!(parse_date("10/03/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_date_hm_in_business_tz() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let dt = date_hm_in_business_tz(date, 19, 30).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-10T19:30:00-03:00");
        assert_eq!(
            dt.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 3, 10, 22, 30, 0).unwrap()
        );
        assert!(date_hm_in_business_tz(date, 24, 0).is_none());
        assert!(date_hm_in_business_tz(date, 12, 60).is_none());
    }
}
