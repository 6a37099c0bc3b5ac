//! Background scheduled tasks.
//!
//! Checklist auto-close sweeps and customer score refreshes both run on their own
//! interval. Call `spawn_all` once during startup to launch them.

use crate::config::TasksConfig;
use crate::services::{ChecklistService, CustomerService};
use chrono::Utc;
use std::time::Duration;

/// Spawn all background tasks.
///
/// Each job is idempotent; a failed run is logged and retried on the next tick.
pub fn spawn_all(
    config: &TasksConfig,
    checklist_service: ChecklistService,
    customer_service: CustomerService,
) {
    // 清单自动关闭
    {
        let svc = checklist_service.clone();
        let interval = Duration::from_secs(config.auto_close_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                match svc.auto_close_expired(Utc::now()).await {
                    Ok(n) if n > 0 => log::info!("Checklists auto-closed: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to auto-close checklists: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    // 客户评分刷新
    {
        let svc = customer_service.clone();
        let interval = Duration::from_secs(config.score_refresh_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                match svc.refresh_all_scores(Utc::now()).await {
                    Ok(n) if n > 0 => log::info!("Customer scores refreshed: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to refresh customer scores: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }
}
