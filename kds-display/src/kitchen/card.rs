//! Card display values

use shared::{KitchenOrder, KitchenStage};

use super::StageAction;

/// Whole minutes since creation, never negative
///
/// `None` until the record has a usable creation time.
pub fn elapsed_minutes(created_at: Option<i64>, now_ms: i64) -> Option<u64> {
    created_at.map(|created_at| (now_ms.saturating_sub(created_at).max(0) / 60_000) as u64)
}

/// One item row plus its extras
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLine {
    /// `1 Crepe Nutella (Large)`
    pub title: String,
    /// `+ Extra cheese`
    pub extras: Vec<String>,
}

/// Everything one card shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub order_id: String,
    pub number: String,
    pub customer_name: Option<String>,
    pub order_mode: String,
    pub stage: KitchenStage,
    pub elapsed_minutes: Option<u64>,
    /// Past the late threshold and not ready yet
    pub is_late: bool,
    pub items: Vec<ItemLine>,
    pub action: Option<StageAction>,
}

impl CardView {
    pub fn build(order: &KitchenOrder, now_ms: i64, late_after_minutes: u64) -> Self {
        let elapsed = elapsed_minutes(order.created_at, now_ms);
        let is_late = elapsed.is_some_and(|m| m > late_after_minutes)
            && order.stage != KitchenStage::Ready;

        let items = order
            .items
            .iter()
            .map(|item| ItemLine {
                title: match &item.variant_name {
                    Some(variant) => format!("1 {} ({})", item.base_name, variant),
                    None => format!("1 {}", item.base_name),
                },
                extras: item.extras.iter().map(|e| format!("+ {}", e)).collect(),
            })
            .collect();

        Self {
            order_id: order.order_id.clone(),
            number: order.number_label(),
            customer_name: order.customer_name.clone(),
            order_mode: order.order_mode.clone(),
            stage: order.stage,
            elapsed_minutes: elapsed,
            is_late,
            items,
            action: StageAction::for_stage(order.stage),
        }
    }

    /// `12m`, empty until the creation time is known
    pub fn elapsed_label(&self) -> String {
        self.elapsed_minutes
            .map(|m| format!("{}m", m))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{ItemDetailsRecord, Modifier, OrderItemRecord, OrderRecord, RawTimestamp};

    const NOW: i64 = 1_705_912_335_000;
    const MINUTE: i64 = 60_000;

    fn order(created_at: Option<i64>, kitchen: Option<&str>) -> KitchenOrder {
        KitchenOrder::from(OrderRecord {
            order_id: "o1".into(),
            order_number: 7,
            customer_name: Some("Ana".into()),
            order_mode: "takeout".into(),
            created_at: created_at.map(RawTimestamp::Millis),
            legacy_status: Some("paid".into()),
            kitchen_status: kitchen.map(str::to_string),
            items: vec![
                OrderItemRecord {
                    ticket_item_id: "t1".into(),
                    base_name: "Crepe Nutella".into(),
                    details: ItemDetailsRecord {
                        variant_name: Some("Large".into()),
                        selected_modifiers: None,
                        modifiers: Some(vec![Modifier {
                            name: "Extra cheese".into(),
                            price: 10.0,
                            group: "extras".into(),
                        }]),
                    },
                },
                OrderItemRecord {
                    ticket_item_id: "t2".into(),
                    base_name: "Coffee".into(),
                    details: ItemDetailsRecord::default(),
                },
            ],
        })
    }

    #[test]
    fn test_elapsed_minutes() {
        assert_eq!(elapsed_minutes(Some(NOW), NOW), Some(0));
        assert_eq!(elapsed_minutes(Some(NOW - 59_999), NOW), Some(0));
        assert_eq!(elapsed_minutes(Some(NOW - 12 * MINUTE), NOW), Some(12));
        assert_eq!(elapsed_minutes(Some(NOW + 5 * MINUTE), NOW), Some(0));
        assert_eq!(elapsed_minutes(None, NOW), None);
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let created = NOW - 3 * MINUTE;
        let mut last = 0;
        for tick in 0..10 {
            let m = elapsed_minutes(Some(created), NOW + tick * 30_000).unwrap();
            assert!(m >= last);
            last = m;
        }
    }

    #[test]
    fn test_card_lines() {
        let card = CardView::build(&order(Some(NOW - 2 * MINUTE), None), NOW, 10);
        assert_eq!(card.number, "#007");
        assert_eq!(card.customer_name.as_deref(), Some("Ana"));
        assert_eq!(card.elapsed_label(), "2m");
        assert_eq!(card.items[0].title, "1 Crepe Nutella (Large)");
        assert_eq!(card.items[0].extras, vec!["+ Extra cheese".to_string()]);
        assert_eq!(card.items[1].title, "1 Coffee");
        assert!(card.items[1].extras.is_empty());
        assert_eq!(card.action.map(|a| a.target), Some(KitchenStage::Preparing));
    }

    #[test]
    fn test_late_flag() {
        let card = CardView::build(&order(Some(NOW - 11 * MINUTE), None), NOW, 10);
        assert!(card.is_late);

        let card = CardView::build(&order(Some(NOW - 10 * MINUTE), None), NOW, 10);
        assert!(!card.is_late);

        // Ready orders are waiting on pickup, not on the kitchen
        let card = CardView::build(&order(Some(NOW - 30 * MINUTE), Some("ready")), NOW, 10);
        assert!(!card.is_late);
    }

    #[test]
    fn test_unknown_creation_time() {
        let card = CardView::build(&order(None, None), NOW, 10);
        assert_eq!(card.elapsed_label(), "");
        assert!(!card.is_late);
    }
}
