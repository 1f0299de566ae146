//! Refill guarantee checks.
//!
//! A completed order is only refillable while its service's guarantee
//! window is open. The window is inferred from the service name ("30 days
//! refill", "no refill", lifetime markers) measured from `completed_at`.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use panelbot_types::Order;

/// Days assumed when a service advertises refill without a number.
const DEFAULT_GUARANTEE_DAYS: i64 = 30;

static DAYS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*d(?:ays?)?\b").expect("days regex compiles"));

/// Whether a refill may be submitted for this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuaranteeVerdict {
    Eligible,
    /// The service carries no refill guarantee at all.
    NoGuarantee,
    /// The guarantee window has closed.
    Expired { window_days: i64 },
    /// Service-specific refusal text configured upstream.
    Custom(String),
}

/// Collaborator answering "is this service still within its refill window".
pub trait GuaranteeCheck: Send + Sync {
    fn check(&self, order: &Order) -> GuaranteeVerdict;
}

/// Default implementation keyed off service-name keywords.
pub struct KeywordGuarantee;

impl GuaranteeCheck for KeywordGuarantee {
    fn check(&self, order: &Order) -> GuaranteeVerdict {
        let service = match order.service_name.as_deref() {
            Some(s) => s.to_lowercase(),
            // Without a service name there is nothing to deny on.
            None => return GuaranteeVerdict::Eligible,
        };

        if service.contains("no refill") || service.contains("norefill") || service.contains("no-refill") {
            return GuaranteeVerdict::NoGuarantee;
        }

        if service.contains("lifetime") || service.contains('∞') {
            return GuaranteeVerdict::Eligible;
        }

        let window_days = DAYS_PATTERN
            .captures(&service)
            .and_then(|c| c[1].parse::<i64>().ok());

        let window_days = match window_days {
            Some(d) => d,
            None if service.contains("refill") || service.contains("garansi") => {
                DEFAULT_GUARANTEE_DAYS
            }
            None => return GuaranteeVerdict::NoGuarantee,
        };

        let completed_at = match order.completed_at {
            Some(t) => t,
            // Completed status without a local timestamp: the window
            // cannot be measured, so don't deny.
            None => return GuaranteeVerdict::Eligible,
        };

        let age_days = (Utc::now() - completed_at).num_days();
        if age_days <= window_days {
            GuaranteeVerdict::Eligible
        } else {
            GuaranteeVerdict::Expired { window_days }
        }
    }
}
