//! 清单截止时间计算
//!
//! 截止时间 = 参考日期 + 配置的时分（可能顺延一天），按业务时区 (UTC-3) 解读。
//! 解析顺序：启用中的门店配置 → 内置默认值 → 无截止时间。

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::models::{ChecklistType, DeadlineInfo, DeadlineSetting};
use crate::utils::time::{business_today, date_hm_in_business_tz, now_fixed_offset};

pub const CLOSED_LABEL: &str = "Encerrado";

/// 内置默认值：开店清单当天 19:30，闭店清单次日 02:00；其余类型无默认
pub fn default_setting(checklist_type: &ChecklistType) -> Option<DeadlineSetting> {
    let (hour, minute, is_next_day) = match checklist_type {
        ChecklistType::Abertura => (19, 30, false),
        ChecklistType::Fechamento => (2, 0, true),
        _ => return None,
    };
    Some(DeadlineSetting {
        checklist_type: checklist_type.clone(),
        deadline_hour: hour,
        deadline_minute: minute,
        is_next_day,
        is_active: None,
    })
}

fn explicit_setting<'a>(
    checklist_type: &ChecklistType,
    settings: &'a [DeadlineSetting],
) -> Option<&'a DeadlineSetting> {
    settings
        .iter()
        .find(|s| &s.checklist_type == checklist_type && s.is_enabled())
}

pub fn resolve_setting(
    checklist_type: &ChecklistType,
    settings: &[DeadlineSetting],
) -> Option<DeadlineSetting> {
    explicit_setting(checklist_type, settings)
        .cloned()
        .or_else(|| default_setting(checklist_type))
}

pub fn get_deadline(
    date: NaiveDate,
    checklist_type: &ChecklistType,
    settings: &[DeadlineSetting],
) -> Option<DateTime<FixedOffset>> {
    let setting = resolve_setting(checklist_type, settings)?;
    let day = if setting.is_next_day {
        date.succ_opt()?
    } else {
        date
    };
    date_hm_in_business_tz(day, setting.deadline_hour, setting.deadline_minute)
}

/// 剩余时间文案：≥1 小时为 "{h}h {m}min"，否则 "{m}min"
pub fn format_remaining(remaining_ms: i64) -> String {
    if remaining_ms <= 0 {
        return CLOSED_LABEL.to_string();
    }
    let total_minutes = remaining_ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours >= 1 {
        format!("{hours}h {minutes}min")
    } else {
        format!("{minutes}min")
    }
}

pub fn get_deadline_info(
    date: NaiveDate,
    checklist_type: &ChecklistType,
    settings: &[DeadlineSetting],
    now: DateTime<Utc>,
) -> Option<DeadlineInfo> {
    let deadline = get_deadline(date, checklist_type, settings)?;
    let remaining_ms = (deadline - now_fixed_offset(now)).num_milliseconds();
    Some(DeadlineInfo {
        deadline,
        passed: remaining_ms <= 0,
        remaining_ms,
        label: format_remaining(remaining_ms),
    })
}

/// 今天的开店清单未过截止时间时为开店清单，否则为闭店清单
pub fn get_current_checklist_type(settings: &[DeadlineSetting], now: DateTime<Utc>) -> ChecklistType {
    let today = business_today(now);
    match get_deadline_info(today, &ChecklistType::Abertura, settings, now) {
        Some(info) if !info.passed => ChecklistType::Abertura,
        _ => ChecklistType::Fechamento,
    }
}

/// 该日期的清单是否仍在自动关闭扫描的窗口内
pub fn should_auto_close(
    date: NaiveDate,
    checklist_type: &ChecklistType,
    settings: &[DeadlineSetting],
    now: DateTime<Utc>,
) -> bool {
    let today = business_today(now);
    let today_or_yesterday = date == today || Some(date) == today.pred_opt();
    match checklist_type {
        ChecklistType::Abertura => date == today,
        ChecklistType::Fechamento => today_or_yesterday,
        ChecklistType::Bonus => {
            explicit_setting(checklist_type, settings).is_some() && today_or_yesterday
        }
        ChecklistType::Custom(_) => false,
    }
}
