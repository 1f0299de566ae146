//! Upstream status vocabulary normalization.

use panelbot_types::OrderStatus;

/// Map an upstream status string onto the canonical [`OrderStatus`].
///
/// Panels disagree on case and spelling ("canceled"/"cancelled"/"fail").
/// Unrecognized values pass through upper-cased as `Other` so downstream
/// logic degrades gracefully instead of failing on new vocabulary.
pub fn normalize_status(raw: &str) -> OrderStatus {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect();

    match folded.as_str() {
        "pending" | "queued" | "awaiting" => OrderStatus::Pending,
        "processing" => OrderStatus::Processing,
        "inprogress" | "active" | "running" => OrderStatus::InProgress,
        "partial" | "partiallycompleted" => OrderStatus::Partial,
        "completed" | "complete" | "done" | "success" => OrderStatus::Completed,
        "cancelled" | "canceled" | "cancel" | "fail" | "failed" | "error" => OrderStatus::Cancelled,
        "refunded" | "refund" => OrderStatus::Refunded,
        _ => OrderStatus::Other(raw.trim().to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_synonyms_collapse() {
        assert_eq!(normalize_status("Cancelled"), OrderStatus::Cancelled);
        assert_eq!(normalize_status("canceled"), OrderStatus::Cancelled);
        assert_eq!(normalize_status("CANCEL"), OrderStatus::Cancelled);
        assert_eq!(normalize_status("fail"), OrderStatus::Cancelled);
        assert_eq!(normalize_status("Cancelled"), normalize_status("canceled"));
    }

    #[test]
    fn spacing_and_case_variants() {
        assert_eq!(normalize_status("In progress"), OrderStatus::InProgress);
        assert_eq!(normalize_status("in_progress"), OrderStatus::InProgress);
        assert_eq!(normalize_status("IN-PROGRESS"), OrderStatus::InProgress);
        assert_eq!(normalize_status("  Completed "), OrderStatus::Completed);
        assert_eq!(normalize_status("Partial"), OrderStatus::Partial);
        assert_eq!(normalize_status("REFUND"), OrderStatus::Refunded);
    }

    #[test]
    fn unknown_passes_through_uppercased() {
        assert_eq!(
            normalize_status("awaiting moderation"),
            OrderStatus::Other("AWAITING MODERATION".into())
        );
    }
}
