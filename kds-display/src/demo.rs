//! Demo mode
//!
//! In-memory feed seeded with a few orders, plus a generator that drops a new
//! order in every so often. Records deliberately mix both status
//! vocabularies and both modifier fields.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use kds_client::MemoryFeed;
use rand::Rng;
use rand::seq::SliceRandom;
use shared::OrderRecord;
use shared::models::{ItemDetailsRecord, Modifier, OrderItemRecord, RawTimestamp};
use tokio_util::sync::CancellationToken;

const CUSTOMERS: &[&str] = &["Ana", "Ben", "Chloé", "Dmitri", "Eve", "Farid", "Grace"];
const MODES: &[&str] = &["dine-in", "takeout", "delivery"];
const MENU: &[(&str, &[&str])] = &[
    ("Crepe", &["Small", "Large"]),
    ("Galette", &["Classic", "Complète"]),
    ("Waffle", &[]),
    ("Hot Chocolate", &["Regular", "Grande"]),
];
const EXTRAS: &[&str] = &["Nutella", "Banana", "Strawberries", "Extra cheese", "Ham", "Whipped cream"];

/// Build a random order document
///
/// Even numbers use the current schema (`kitchenStatus`, `selectedModifiers`),
/// odd numbers the legacy one (`status`, `modifiers`).
pub fn sample_order(rng: &mut impl Rng, number: u32, created_at_ms: i64) -> OrderRecord {
    let legacy = number % 2 == 1;
    let item_count = rng.gen_range(1..=3);

    let items = (0..item_count)
        .map(|i| {
            let (base, variants) = MENU[rng.gen_range(0..MENU.len())];
            let extra_count = rng.gen_range(0..=2);
            let extras: Vec<Modifier> = EXTRAS
                .choose_multiple(rng, extra_count)
                .map(|name| Modifier {
                    name: name.to_string(),
                    price: 0.5,
                    group: "Toppings".to_string(),
                })
                .collect();
            let (selected_modifiers, modifiers) = if legacy {
                (None, Some(extras))
            } else {
                (Some(extras), None)
            };
            OrderItemRecord {
                ticket_item_id: format!("{}-{}", number, i),
                base_name: base.to_string(),
                details: ItemDetailsRecord {
                    variant_name: variants.choose(rng).map(|v| v.to_string()),
                    selected_modifiers,
                    modifiers,
                },
            }
        })
        .collect();

    let (legacy_status, kitchen_status) = if legacy {
        (Some("PAID".to_string()), None)
    } else {
        (None, Some("queued".to_string()))
    };

    OrderRecord {
        order_id: format!("demo-{:04}", number),
        order_number: number,
        customer_name: CUSTOMERS.choose(rng).map(|c| c.to_string()),
        order_mode: MODES.choose(rng).copied().unwrap_or("takeout").to_string(),
        created_at: Some(RawTimestamp::from_millis(created_at_ms)),
        legacy_status,
        kitchen_status,
        items,
    }
}

/// Feed seeded with a handful of orders at different stages and ages
pub fn seeded_feed() -> Arc<MemoryFeed> {
    let mut rng = rand::thread_rng();
    let now = Local::now().timestamp_millis();
    let feed = MemoryFeed::new();

    let seeds: &[(u32, i64, Option<&str>)] = &[
        (101, 14, Some("preparing")),
        (102, 9, None),
        (103, 6, Some("ready")),
        (104, 3, None),
        (105, 1, None),
    ];
    for &(number, minutes_ago, kitchen) in seeds {
        let mut record = sample_order(&mut rng, number, now - minutes_ago * 60_000);
        if let Some(kitchen) = kitchen {
            record.kitchen_status = Some(kitchen.to_string());
        }
        feed.insert(record);
    }

    tracing::info!(orders = seeds.len(), "Demo feed seeded");
    Arc::new(feed)
}

/// Insert a fresh order on every tick until cancelled
pub async fn generate_orders(feed: Arc<MemoryFeed>, every: Duration, shutdown: CancellationToken) {
    let mut number = 200;
    let mut interval = tokio::time::interval(every);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                number += 1;
                let record = {
                    let mut rng = rand::thread_rng();
                    sample_order(&mut rng, number, Local::now().timestamp_millis())
                };
                tracing::info!(order_id = %record.order_id, "Demo order placed");
                feed.insert(record);
            }
        }
    }
}
