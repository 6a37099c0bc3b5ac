//! 客户 RFM 评分
//!
//! 三个分量各自截断后相加：最近消费 [0,30]、消费频次 [0,30]、消费金额 [0,40]，
//! 因此总分恒在 [0,100]。数据库侧触发器使用同一公式，两边数值必须保持一致。

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::entities::CustomerSegment;
use crate::error::{AppError, AppResult};
use crate::models::ScoreResult;

/// 从未消费时“距上次消费天数”的占位值
pub const NO_PURCHASE_SENTINEL_DAYS: f64 = 999.0;

const MS_PER_DAY: f64 = 86_400_000.0;
const RECENCY_MAX: f64 = 30.0;
const FREQUENCY_MAX: f64 = 30.0;
const MONETARY_MAX: f64 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreInput {
    pub total_orders: u32,
    /// 累计消费（货币单位）
    pub total_spent: f64,
    pub last_purchase_at: Option<DateTime<Utc>>,
}

impl ScoreInput {
    /// Strict constructor: spend must be finite and non-negative.
    pub fn new(
        total_orders: u32,
        total_spent: f64,
        last_purchase_at: Option<DateTime<Utc>>,
    ) -> AppResult<Self> {
        if !total_spent.is_finite() || total_spent < 0.0 {
            return Err(AppError::ValidationError(format!(
                "total_spent must be a non-negative number, got {total_spent}"
            )));
        }
        Ok(Self {
            total_orders,
            total_spent,
            last_purchase_at,
        })
    }

    /// Lenient mode for loosely typed client input.
    ///
    /// Numbers and numeric strings are accepted; null, garbage, NaN and negative
    /// values become 0. Fractional order counts are truncated. A timestamp that is
    /// neither RFC 3339 nor `YYYY-MM-DD` (read as UTC midnight) counts as "never purchased".
    pub fn lenient(total_orders: &Value, total_spent: &Value, last_purchase_at: Option<&str>) -> Self {
        Self {
            total_orders: lenient_number(total_orders).min(u32::MAX as f64) as u32,
            total_spent: lenient_number(total_spent),
            last_purchase_at: last_purchase_at.and_then(parse_timestamp_lenient),
        }
    }

    /// 由数据库行构造；金额以分存储
    pub fn from_stored(
        total_orders: i32,
        total_spent_cents: i64,
        last_purchase_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            total_orders: u32::try_from(total_orders).unwrap_or(0),
            total_spent: total_spent_cents.max(0) as f64 / 100.0,
            last_purchase_at,
        }
    }
}

fn lenient_number(v: &Value) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite() && *x >= 0.0).unwrap_or(0.0)
}

fn parse_timestamp_lenient(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 按分数与订单数划分客户分层。判断顺序不可调整。
pub fn segment_for(score: i32, total_orders: u32) -> CustomerSegment {
    if score >= 70 {
        CustomerSegment::Vip
    } else if score >= 45 {
        CustomerSegment::Frequent
    } else if score >= 20 {
        CustomerSegment::Occasional
    } else if total_orders == 0 {
        CustomerSegment::New
    } else {
        CustomerSegment::Inactive
    }
}

pub fn compute_score(input: &ScoreInput, now: DateTime<Utc>) -> ScoreResult {
    // 未来时间的购买记录按“今天”处理
    let days_since_last = match input.last_purchase_at {
        Some(at) => ((now - at).num_milliseconds() as f64 / MS_PER_DAY).max(0.0),
        None => NO_PURCHASE_SENTINEL_DAYS,
    };

    let recency = if input.last_purchase_at.is_some() {
        (RECENCY_MAX - days_since_last / 2.0).clamp(0.0, RECENCY_MAX)
    } else {
        0.0
    };
    let frequency = (input.total_orders as f64 * 3.0).min(FREQUENCY_MAX);
    let monetary = (input.total_spent / 100.0 * 4.0).clamp(0.0, MONETARY_MAX);

    let score = (recency + frequency + monetary).round().clamp(0.0, 100.0) as i32;
    let segment = segment_for(score, input.total_orders);

    let visit_frequency_days = if input.total_orders <= 1 || input.last_purchase_at.is_none() {
        None
    } else {
        Some(days_since_last / (input.total_orders - 1).max(1) as f64)
    };

    ScoreResult {
        score,
        segment,
        visit_frequency_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap()
    }

    fn input(orders: u32, spent: f64, last: Option<DateTime<Utc>>) -> ScoreInput {
        ScoreInput::new(orders, spent, last).unwrap()
    }

    #[test]
    fn test_new_customer_scores_zero() {
        let r = compute_score(&input(0, 0.0, None), now());
        assert_eq!(r.score, 0);
        assert_eq!(r.segment, CustomerSegment::New);
        assert_eq!(r.visit_frequency_days, None);
    }

    #[test]
    fn test_top_customer_scores_hundred() {
        let r = compute_score(&input(12, 1500.0, Some(now())), now());
        assert_eq!(r.score, 100);
        assert_eq!(r.segment, CustomerSegment::Vip);
        assert_eq!(r.visit_frequency_days, Some(0.0));
    }

    #[test]
    fn test_lapsed_customer_is_inactive() {
        let last = now() - Duration::days(61);
        let r = compute_score(&input(2, 50.0, Some(last)), now());
        // recency 0 + frequency 6 + monetary 2
        assert_eq!(r.score, 8);
        assert_eq!(r.segment, CustomerSegment::Inactive);
        assert_eq!(r.visit_frequency_days, Some(61.0));
    }

    #[test]
    fn test_recency_decays_linearly() {
        let last = now() - Duration::days(20);
        let r = compute_score(&input(0, 0.0, Some(last)), now());
        assert_eq!(r.score, 20);
        // 订单为 0 但有消费时间：分数已够 occasional
        assert_eq!(r.segment, CustomerSegment::Occasional);

        let last = now() - Duration::hours(36);
        let r = compute_score(&input(1, 0.0, Some(last)), now());
        // 30 - 0.75 + 3 = 32.25
        assert_eq!(r.score, 32);
    }

    #[test]
    fn test_future_purchase_does_not_exceed_cap() {
        let last = now() + Duration::days(10);
        let r = compute_score(&input(10, 1000.0, Some(last)), now());
        assert_eq!(r.score, 100);
    }

    #[test]
    fn test_score_always_within_bounds() {
        let lasts = [
            None,
            Some(now()),
            Some(now() - Duration::days(3)),
            Some(now() - Duration::days(400)),
            Some(now() + Duration::days(3)),
        ];
        for orders in [0u32, 1, 5, 10, 1000, u32::MAX] {
            for spent in [0.0, 0.5, 99.9, 1000.0, 1e12] {
                for last in lasts {
                    let r = compute_score(&input(orders, spent, last), now());
                    assert!((0..=100).contains(&r.score), "score {} out of range", r.score);
                }
            }
        }
    }

    #[test]
    fn test_segment_boundaries() {
        assert_eq!(segment_for(70, 5), CustomerSegment::Vip);
        assert_eq!(segment_for(69, 5), CustomerSegment::Frequent);
        assert_eq!(segment_for(45, 5), CustomerSegment::Frequent);
        assert_eq!(segment_for(44, 5), CustomerSegment::Occasional);
        assert_eq!(segment_for(20, 0), CustomerSegment::Occasional);
        assert_eq!(segment_for(19, 0), CustomerSegment::New);
        assert_eq!(segment_for(19, 3), CustomerSegment::Inactive);
        assert_eq!(segment_for(0, 0), CustomerSegment::New);
    }

    #[test]
    fn test_visit_frequency() {
        let last = now() - Duration::days(12);
        let r = compute_score(&input(4, 10.0, Some(last)), now());
        assert_eq!(r.visit_frequency_days, Some(4.0));

        let r = compute_score(&input(1, 10.0, Some(last)), now());
        assert_eq!(r.visit_frequency_days, None);

        let r = compute_score(&input(4, 10.0, None), now());
        assert_eq!(r.visit_frequency_days, None);
    }

    #[test]
    fn test_compute_score_is_deterministic() {
        let i = input(3, 250.0, Some(now() - Duration::days(5)));
        assert_eq!(compute_score(&i, now()), compute_score(&i, now()));
    }

    #[test]
    fn test_strict_constructor_rejects_bad_spend() {
        assert!(ScoreInput::new(1, -1.0, None).is_err());
        assert!(ScoreInput::new(1, f64::NAN, None).is_err());
        assert!(ScoreInput::new(1, f64::INFINITY, None).is_err());
        assert!(ScoreInput::new(1, 0.0, None).is_ok());
    }

    #[test]
    fn test_lenient_coercion() {
        let i = ScoreInput::lenient(&json!("12"), &json!("1500.50"), Some("2024-03-10T15:00:00Z"));
        assert_eq!(i.total_orders, 12);
        assert_eq!(i.total_spent, 1500.5);
        assert_eq!(i.last_purchase_at, Some(now()));

        let i = ScoreInput::lenient(&Value::Null, &json!("abc"), Some("not a date"));
        assert_eq!(i.total_orders, 0);
        assert_eq!(i.total_spent, 0.0);
        assert_eq!(i.last_purchase_at, None);

        let i = ScoreInput::lenient(&json!(-4), &json!(2.7), Some("2024-03-10"));
        assert_eq!(i.total_orders, 0);
        assert_eq!(i.total_spent, 2.7);
        assert_eq!(
            i.last_purchase_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap())
        );

        let i = ScoreInput::lenient(&json!(3.9), &json!(""), None);
        assert_eq!(i.total_orders, 3);
        assert_eq!(i.total_spent, 0.0);
    }

    #[test]
    fn test_from_stored_converts_cents() {
        let i = ScoreInput::from_stored(-2, 12_345, None);
        assert_eq!(i.total_orders, 0);
        assert_eq!(i.total_spent, 123.45);
    }
}
