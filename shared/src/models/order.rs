//! Order Model

use serde::{Deserialize, Deserializer, Serialize};

use super::RawTimestamp;
use crate::order::KitchenStage;

/// Explicit `null` reads like a missing field
///
/// Partial documents written by older tooling carry `null` where newer ones
/// omit the key; neither may cost the whole record.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Modifier (add-on) selected for an item
///
/// `price` and `group` are carried through but only `name` is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group: String,
}

/// Item details as stored
///
/// Exactly one of `selected_modifiers` / `modifiers` is populated, depending
/// on which schema revision wrote the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetailsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_modifiers: Option<Vec<Modifier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<Vec<Modifier>>,
}

/// Order item as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ticket_item_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub base_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: ItemDetailsRecord,
}

/// Order document as stored upstream
///
/// Every field except `orderId` may be missing on old or partial records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Document key
    #[serde(alias = "id")]
    pub order_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<RawTimestamp>,
    /// Legacy order-level status (`pending`, `paid`, `PREPARING`, ...)
    #[serde(default, rename = "status", skip_serializing_if = "Option::is_none")]
    pub legacy_status: Option<String>,
    /// Dedicated kitchen field (`queued`, `preparing`, `ready`, `delivered`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kitchen_status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderItemRecord>,
}

impl OrderRecord {
    /// Canonical stage of this record
    pub fn stage(&self) -> KitchenStage {
        KitchenStage::resolve(self.kitchen_status.as_deref(), self.legacy_status.as_deref())
    }

    /// Creation time in unix millis
    pub fn created_at_millis(&self) -> Option<i64> {
        self.created_at.as_ref().and_then(RawTimestamp::to_millis)
    }
}

/// Ingested item: one canonical extras list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenItem {
    pub ticket_item_id: String,
    pub base_name: String,
    pub variant_name: Option<String>,
    /// Modifier names, in stored order
    pub extras: Vec<String>,
}

impl From<OrderItemRecord> for KitchenItem {
    fn from(record: OrderItemRecord) -> Self {
        let ItemDetailsRecord {
            variant_name,
            selected_modifiers,
            modifiers,
        } = record.details;

        // Newer field wins whenever it is present, even if empty
        let extras = selected_modifiers
            .or(modifiers)
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.name)
            .collect();

        Self {
            ticket_item_id: record.ticket_item_id,
            base_name: record.base_name,
            variant_name: variant_name.filter(|v| !v.trim().is_empty()),
            extras,
        }
    }
}

/// Order as the kitchen sees it
///
/// Built once per snapshot from an [`OrderRecord`]: stage resolved, timestamp
/// reduced to millis, modifier fields collapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenOrder {
    pub order_id: String,
    pub order_number: u32,
    pub customer_name: Option<String>,
    pub order_mode: String,
    /// Unix millis, `None` until the upstream timestamp is available
    pub created_at: Option<i64>,
    pub stage: KitchenStage,
    pub items: Vec<KitchenItem>,
}

impl KitchenOrder {
    /// `#007` style label
    pub fn number_label(&self) -> String {
        format!("#{:03}", self.order_number)
    }
}

impl From<OrderRecord> for KitchenOrder {
    fn from(record: OrderRecord) -> Self {
        let stage = record.stage();
        let created_at = record.created_at_millis();
        Self {
            order_id: record.order_id,
            order_number: record.order_number,
            customer_name: record.customer_name.filter(|n| !n.trim().is_empty()),
            order_mode: record.order_mode,
            created_at,
            stage,
            items: record.items.into_iter().map(KitchenItem::from).collect(),
        }
    }
}

impl From<&OrderRecord> for KitchenOrder {
    fn from(record: &OrderRecord) -> Self {
        Self::from(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(name: &str) -> Modifier {
        Modifier {
            name: name.to_string(),
            price: 0.0,
            group: String::new(),
        }
    }

    #[test]
    fn test_deserialize_legacy_record() {
        let json = r#"{
            "orderId": "abc123",
            "orderNumber": 7,
            "status": "paid",
            "orderMode": "takeout",
            "createdAt": {"seconds": 1705912335, "nanoseconds": 0},
            "items": [{
                "ticketItemId": "t1",
                "baseName": "Crepe Nutella",
                "details": {"variantName": "Large", "modifiers": [{"name": "Extra cheese", "price": 10, "group": "extras"}]}
            }]
        }"#;

        let record: OrderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.legacy_status.as_deref(), Some("paid"));
        assert!(record.kitchen_status.is_none());

        let order = KitchenOrder::from(record);
        assert_eq!(order.stage, KitchenStage::Queued);
        assert_eq!(order.created_at, Some(1705912335000));
        assert_eq!(order.number_label(), "#007");
        assert_eq!(order.items[0].variant_name.as_deref(), Some("Large"));
        assert_eq!(order.items[0].extras, vec!["Extra cheese".to_string()]);
    }

    #[test]
    fn test_id_alias_and_missing_fields() {
        let record: OrderRecord = serde_json::from_str(r#"{"id": "doc-1"}"#).unwrap();
        assert_eq!(record.order_id, "doc-1");

        let order = KitchenOrder::from(record);
        assert_eq!(order.stage, KitchenStage::Queued);
        assert!(order.created_at.is_none());
        assert!(order.items.is_empty());
        assert!(order.customer_name.is_none());
    }

    #[test]
    fn test_explicit_nulls_read_as_missing() {
        let json = r#"{
            "orderId": "o-null",
            "orderNumber": null,
            "customerName": null,
            "orderMode": null,
            "createdAt": null,
            "kitchenStatus": null,
            "status": "PREPARING",
            "items": null
        }"#;
        let record: OrderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.order_number, 0);
        assert_eq!(record.order_mode, "");
        assert!(record.items.is_empty());
        assert_eq!(record.stage(), KitchenStage::Preparing);

        let json = r#"{
            "orderId": "o-item",
            "items": [{
                "ticketItemId": null,
                "baseName": "Waffle",
                "details": null
            }, {
                "baseName": null,
                "details": {"selectedModifiers": [{"name": "Banana", "price": null, "group": null}]}
            }]
        }"#;
        let order = KitchenOrder::from(serde_json::from_str::<OrderRecord>(json).unwrap());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].base_name, "Waffle");
        assert!(order.items[0].extras.is_empty());
        assert_eq!(order.items[1].extras, vec!["Banana".to_string()]);
    }

    #[test]
    fn test_modifiers_fallback_field() {
        let item = OrderItemRecord {
            ticket_item_id: "t1".into(),
            base_name: "Crepe".into(),
            details: ItemDetailsRecord {
                variant_name: None,
                selected_modifiers: None,
                modifiers: Some(vec![modifier("Extra cheese")]),
            },
        };
        assert_eq!(KitchenItem::from(item).extras, vec!["Extra cheese".to_string()]);
    }

    #[test]
    fn test_selected_modifiers_take_precedence() {
        let item = OrderItemRecord {
            ticket_item_id: "t1".into(),
            base_name: "Crepe".into(),
            details: ItemDetailsRecord {
                variant_name: None,
                selected_modifiers: Some(vec![modifier("Strawberries"), modifier("Cream")]),
                modifiers: Some(vec![modifier("Extra cheese")]),
            },
        };
        assert_eq!(
            KitchenItem::from(item).extras,
            vec!["Strawberries".to_string(), "Cream".to_string()]
        );
    }

    #[test]
    fn test_no_modifiers() {
        let item = OrderItemRecord {
            base_name: "Coffee".into(),
            ..Default::default()
        };
        let item = KitchenItem::from(item);
        assert!(item.extras.is_empty());
        assert!(item.variant_name.is_none());
    }

    #[test]
    fn test_number_label_wider_than_padding() {
        let order = KitchenOrder::from(OrderRecord {
            order_id: "x".into(),
            order_number: 1234,
            ..Default::default()
        });
        assert_eq!(order.number_label(), "#1234");
    }
}
