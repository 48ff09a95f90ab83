use std::collections::BTreeSet;
use std::error::Error;

use click_store::error::InventoryError;
use click_store::prelude::*;
use rust_decimal::Decimal;

type TestResult = Result<(), Box<dyn Error>>;

struct Shop {
    inventory: Inventory<MemoryStore>,
    p1:        String,
    c1:        String,
    company_x: String,
}

impl Shop {
    async fn new(config: InventoryConfig) -> Result<Self, InventoryError> {
        let inventory = Inventory::with_config(MemoryStore::new(), config);
        let p1 = inventory
            .create_item(
                StockKind::Product,
                NewStockItem::new("P1")
                    .with_price(Decimal::new(49990, 2))
                    .with_serials(["A", "B", "C"]),
            )
            .await?
            .id;
        let c1 = inventory.create_customer(Contact::new("C1")).await?.id;
        let company_x = inventory.create_company(Contact::new("companyX")).await?.id;
        Ok(Self {
            inventory,
            p1,
            c1,
            company_x,
        })
    }

    async fn item(&self) -> Result<StockItem, InventoryError> {
        self.inventory.item(&self.p1).await
    }

    async fn held(&self) -> Result<Option<Assignment>, InventoryError> {
        Ok(self
            .inventory
            .assignments_for_customer(&self.c1)
            .await?
            .into_iter()
            .find(|a| a.item_id == self.p1))
    }

    /// Stock, assignment and maintenance pools of P1 as unit counts.
    async fn pools(&self) -> Result<(u32, u32, u32), InventoryError> {
        let shelf = self.item().await.map(|i| i.stock).unwrap_or(0);
        let assigned = self
            .inventory
            .assignments()
            .await?
            .iter()
            .filter(|a| a.item_id == self.p1)
            .map(|a| a.quantity)
            .sum();
        let maintenance = self
            .inventory
            .maintenance_items()
            .await?
            .iter()
            .filter(|m| m.original_product_id.as_deref() == Some(self.p1.as_str()))
            .map(|m| m.stock)
            .sum();
        Ok((shelf, assigned, maintenance))
    }
}

fn set(serials: &[String]) -> BTreeSet<&str> {
    serials.iter().map(String::as_str).collect()
}

#[tokio::test]
async fn serialized_unit_walks_through_every_state() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;

    // 1
    let held = inv.assign_by_quantity(&shop.c1, &shop.p1, 2).await?;
    let item = shop.item().await?;
    assert_eq!(item.stock, 1);
    assert_eq!(item.serial_numbers, ["C"]);
    assert_eq!(held.quantity, 2);
    assert_eq!(held.serial_numbers, ["A", "B"]);

    // 2
    let merged = inv.assign_by_quantity(&shop.c1, &shop.p1, 1).await?;
    assert_eq!(merged.id, held.id, "reassignment must merge into the existing record");
    assert_eq!(merged.quantity, 3);
    assert_eq!(merged.serial_numbers, ["A", "B", "C"]);
    let item = shop.item().await?;
    assert_eq!(item.stock, 0);
    assert!(item.serial_numbers.is_empty());
    assert_eq!(inv.assignments().await?.len(), 1);

    // 3
    let remaining = inv
        .return_to_stock(&shop.c1, &shop.p1, vec!["B".into()])
        .await?
        .ok_or("assignment should remain")?;
    assert_eq!(remaining.quantity, 2);
    assert_eq!(remaining.serial_numbers, ["A", "C"]);
    let item = shop.item().await?;
    assert_eq!(item.stock, 1);
    assert_eq!(item.serial_numbers, ["B"]);

    // 4
    let batch = inv
        .send_to_maintenance(&shop.p1, Some(vec!["B".into()]), Some(&shop.company_x))
        .await?;
    let item = shop.item().await?;
    assert_eq!(item.stock, 0);
    assert!(item.serial_numbers.is_empty());
    assert_eq!(batch.stock, 1);
    assert_eq!(batch.serial_numbers, ["B"]);
    assert_eq!(batch.company_id.as_deref(), Some(shop.company_x.as_str()));
    assert_eq!(batch.original_product_id.as_deref(), Some(shop.p1.as_str()));

    // 5
    let item = inv.restore_from_maintenance(&batch.id).await?;
    assert_eq!(item.id, shop.p1);
    assert_eq!(item.stock, 1);
    assert_eq!(item.serial_numbers, ["B"]);
    assert!(inv.maintenance_items().await?.is_empty());

    // 6
    inv.delete_customer(&shop.c1).await?;
    assert!(inv.assignments().await?.is_empty());
    let item = shop.item().await?;
    assert_eq!(item.stock, 3);
    assert_eq!(set(&item.serial_numbers), BTreeSet::from(["A", "B", "C"]));

    assert!(inv.verify().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn two_assignments_equal_one_with_summed_quantity() -> TestResult {
    let twice = Shop::new(InventoryConfig::default()).await?;
    twice.inventory.assign_by_quantity(&twice.c1, &twice.p1, 1).await?;
    twice.inventory.assign_by_quantity(&twice.c1, &twice.p1, 2).await?;

    let once = Shop::new(InventoryConfig::default()).await?;
    once.inventory.assign_by_quantity(&once.c1, &once.p1, 3).await?;

    let a = twice.held().await?.ok_or("missing assignment")?;
    let b = once.held().await?.ok_or("missing assignment")?;
    assert_eq!(a.quantity, b.quantity);
    assert_eq!(set(&a.serial_numbers), set(&b.serial_numbers));
    assert_eq!(twice.item().await?.stock, once.item().await?.stock);
    Ok(())
}

#[tokio::test]
async fn maintenance_round_trip_restores_the_shelf() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let before = shop.item().await?;

    let batch = shop
        .inventory
        .send_to_maintenance(&shop.p1, Some(vec!["C".into(), "A".into()]), None)
        .await?;
    assert_eq!(shop.pools().await?, (1, 0, 2));

    let after = shop.inventory.restore_from_maintenance(&batch.id).await?;
    assert_eq!(after.stock, before.stock);
    assert_eq!(set(&after.serial_numbers), set(&before.serial_numbers));
    Ok(())
}

#[tokio::test]
async fn units_are_conserved_across_pools() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;

    inv.assign_by_serials(&shop.c1, &shop.p1, vec!["C".into()]).await?;
    assert_eq!(shop.pools().await?, (2, 1, 0));

    // An assigned serial is pulled out of the assignment.
    let batch = inv
        .send_to_maintenance(&shop.p1, Some(vec!["C".into(), "A".into()]), Some(&shop.company_x))
        .await?;
    assert_eq!(shop.pools().await?, (1, 0, 2));
    assert!(shop.held().await?.is_none(), "emptied assignment must be deleted");

    for serial in ["A", "B", "C"] {
        assert_eq!(inv.locate_serial(serial).await?.len(), 1, "serial {serial} must be in one pool");
    }
    let located = inv.locate_serial("C").await?;
    assert_eq!(located[0].pool, Pool::InMaintenance);
    assert_eq!(located[0].holder_id, batch.id);

    inv.restore_from_maintenance(&batch.id).await?;
    assert_eq!(shop.pools().await?, (3, 0, 0));
    Ok(())
}

#[tokio::test]
async fn whole_item_transfer_and_recreation() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;
    inv.assign_by_quantity(&shop.c1, &shop.p1, 1).await?;

    let batch = inv.send_to_maintenance(&shop.p1, None, None).await?;
    assert_eq!(batch.stock, 2);
    assert_eq!(batch.serial_numbers, ["B", "C"]);
    assert!(inv.item(&shop.p1).await.is_err_and(|e| e.is_not_found()));
    assert!(inv.assignments().await?.is_empty(), "whole transfer cascades to assignments");

    let item = inv.restore_from_maintenance(&batch.id).await?;
    assert_eq!(item.id, shop.p1);
    assert_eq!(item.name, "P1");
    assert_eq!(item.stock, 2);
    assert_eq!(item.serial_numbers, ["B", "C"]);
    Ok(())
}

#[tokio::test]
async fn whole_item_transfer_can_be_refused() -> TestResult {
    let shop = Shop::new(InventoryConfig::default().with_whole_transfer(WholeTransferPolicy::RejectAssigned)).await?;
    let inv = &shop.inventory;
    inv.assign_by_quantity(&shop.c1, &shop.p1, 1).await?;

    let err = inv.send_to_maintenance(&shop.p1, None, None).await.unwrap_err();
    assert!(matches!(
        err.invariant(),
        Some(InvariantViolation::OutstandingAssignments { count: 1, .. })
    ));
    assert_eq!(shop.pools().await?, (2, 1, 0));
    Ok(())
}

#[tokio::test]
async fn overdraw_is_rejected_without_side_effects() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;

    let err = inv.assign_by_quantity(&shop.c1, &shop.p1, 4).await.unwrap_err();
    assert!(matches!(
        err.invariant(),
        Some(InvariantViolation::Overdraw {
            requested: 4,
            available: 3,
            ..
        })
    ));

    let err = inv
        .assign_by_serials(&shop.c1, &shop.p1, vec!["A".into(), "Z".into()])
        .await
        .unwrap_err();
    assert!(matches!(err.invariant(), Some(InvariantViolation::MissingSerials { serials, .. }) if serials == &["Z"]));

    let item = shop.item().await?;
    assert_eq!(item.stock, 3);
    assert_eq!(item.serial_numbers, ["A", "B", "C"]);
    assert!(inv.assignments().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn clamping_moves_what_is_there() -> TestResult {
    let shop = Shop::new(InventoryConfig::default().with_overdraw(OverdrawPolicy::Clamp)).await?;
    let inv = &shop.inventory;

    let held = inv.assign_by_quantity(&shop.c1, &shop.p1, 5).await?;
    assert_eq!(held.quantity, 3);
    assert_eq!(shop.item().await?.stock, 0);

    // Nothing left to move is still an error.
    assert!(inv.assign_by_quantity(&shop.c1, &shop.p1, 1).await.is_err());

    let remaining = inv
        .return_to_stock(&shop.c1, &shop.p1, vec!["B".into(), "Q".into()])
        .await?
        .ok_or("assignment should remain")?;
    assert_eq!(remaining.serial_numbers, ["A", "C"]);
    assert_eq!(shop.item().await?.serial_numbers, ["B"]);
    Ok(())
}

#[tokio::test]
async fn anonymous_stock_moves_by_quantity() -> TestResult {
    let inv = Inventory::new(MemoryStore::new());
    let cable = inv
        .create_item(StockKind::Accessory, NewStockItem::new("Cable").with_stock(10))
        .await?;
    let ann = inv.create_customer(Contact::new("Ann")).await?;

    let held = inv.assign_by_quantity(&ann.id, &cable.id, 4).await?;
    assert_eq!(held.quantity, 4);
    assert!(held.serial_numbers.is_empty());

    let held = inv
        .return_quantity(&ann.id, &cable.id, 1)
        .await?
        .ok_or("assignment should remain")?;
    assert_eq!(held.quantity, 3);
    assert_eq!(inv.item(&cable.id).await?.stock, 7);

    let batch = inv.send_quantity_to_maintenance(&cable.id, 2, None).await?;
    assert_eq!(batch.stock, 2);
    assert_eq!(inv.item(&cable.id).await?.stock, 5);

    let written_off = inv.discard_maintenance(&batch.id).await?;
    assert_eq!(written_off.id, batch.id);
    assert!(inv.maintenance_items().await?.is_empty());
    assert_eq!(inv.item(&cable.id).await?.stock, 5);

    let item = inv.remove_assignment(&held.id).await?.ok_or("item should exist")?;
    assert_eq!(item.stock, 8);
    assert!(inv.assignments().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_records_are_reported() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;

    let err = inv.assign_by_quantity("nobody", &shop.p1, 1).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { kind: EntityKind::Customer, .. }));
    let err = inv.assign_by_quantity(&shop.c1, "nothing", 1).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { kind: EntityKind::Item, .. }));
    let err = inv.restore_from_maintenance("gone").await.unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { kind: EntityKind::Maintenance, .. }));
    let err = inv.remove_assignment("gone").await.unwrap_err();
    assert!(err.is_not_found());
    let err = inv
        .send_to_maintenance(&shop.p1, Some(vec!["A".into()]), Some("no-such-company"))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { kind: EntityKind::Company, .. }));
    let err = inv.return_to_stock(&shop.c1, &shop.p1, vec!["A".into()]).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { kind: EntityKind::Assignment, .. }));

    assert_eq!(shop.pools().await?, (3, 0, 0));
    Ok(())
}

#[tokio::test]
async fn malformed_requests_are_refused() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;

    assert!(matches!(
        inv.assign_by_quantity(&shop.c1, &shop.p1, 0).await,
        Err(InventoryError::InvalidRequest(_))
    ));
    assert!(matches!(
        inv.assign_by_serials(&shop.c1, &shop.p1, vec![]).await,
        Err(InventoryError::InvalidRequest(_))
    ));
    assert!(matches!(
        inv.create_item(
            StockKind::Product,
            NewStockItem::new("Broken").with_price(Decimal::from(-1))
        )
        .await,
        Err(InventoryError::InvalidRequest(_))
    ));
    assert!(matches!(
        inv.create_customer(Contact::new("  ")).await,
        Err(InventoryError::InvalidRequest(_))
    ));
    Ok(())
}

#[tokio::test]
async fn serials_are_unique_across_the_inventory() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;
    inv.assign_by_serials(&shop.c1, &shop.p1, vec!["A".into()]).await?;

    let err = inv
        .create_item(StockKind::Product, NewStockItem::new("Other").with_serials(["A", "Q"]))
        .await
        .unwrap_err();
    assert!(matches!(err.invariant(), Some(InvariantViolation::SerialsInUse { serials }) if serials == &["A"]));

    let err = inv
        .create_item(StockKind::Product, NewStockItem::new("Twins").with_serials(["Q", "Q"]))
        .await
        .unwrap_err();
    assert!(matches!(err.invariant(), Some(InvariantViolation::DuplicateSerials { .. })));

    let err = inv
        .create_item(
            StockKind::Product,
            NewStockItem::new("Short").with_serials(["X", "Y"]).with_stock(3),
        )
        .await
        .unwrap_err();
    assert!(matches!(err.invariant(), Some(InvariantViolation::StockMismatch { .. })));

    // Re-listing the item's own shelf serials is fine; taking the assigned one is not.
    let patch = StockItemPatch {
        serial_numbers: Some(vec!["C".into(), "B".into(), "D".into()]),
        ..Default::default()
    };
    let item = inv.update_item(&shop.p1, patch).await?;
    assert_eq!(item.stock, 3);
    assert_eq!(item.serial_numbers, ["C", "B", "D"]);

    let patch = StockItemPatch {
        serial_numbers: Some(vec!["A".into()]),
        ..Default::default()
    };
    assert!(inv.update_item(&shop.p1, patch).await.is_err());
    Ok(())
}

#[tokio::test]
async fn deletes_cascade() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;
    let bob = inv.create_customer(Contact::new("Bob")).await?;
    inv.assign_by_quantity(&shop.c1, &shop.p1, 1).await?;
    inv.assign_by_quantity(&bob.id, &shop.p1, 1).await?;
    let batch = inv
        .send_to_maintenance(&shop.p1, Some(vec!["C".into()]), Some(&shop.company_x))
        .await?;

    inv.delete_company(&shop.company_x).await?;
    assert_eq!(inv.maintenance_item(&batch.id).await?.company_id, None);
    assert!(inv.companies().await?.is_empty());

    let deleted = inv.delete_item(&shop.p1).await?;
    assert_eq!(deleted.id, shop.p1);
    assert!(inv.assignments().await?.is_empty());
    assert_eq!(inv.customers().await?.len(), 2);

    // The batch still knows the item and brings it back.
    let item = inv.restore_from_maintenance(&batch.id).await?;
    assert_eq!(item.id, shop.p1);
    assert_eq!(item.serial_numbers, ["C"]);
    Ok(())
}

#[tokio::test]
async fn updates_keep_untouched_fields() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;

    let customer = inv
        .update_customer(
            &shop.c1,
            ContactPatch {
                email: Some("c1@example.com".into()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(customer.name, "C1");
    assert_eq!(customer.email, "c1@example.com");

    let item = inv
        .update_item(
            &shop.p1,
            StockItemPatch {
                brand: Some("Acme".into()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(item.brand.as_deref(), Some("Acme"));
    assert_eq!(item.serial_numbers, ["A", "B", "C"]);
    Ok(())
}

#[tokio::test]
async fn stats_summarize_the_shop() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;
    inv.create_item(
        StockKind::Accessory,
        NewStockItem::new("Charger")
            .with_stock(20)
            .with_price(Decimal::from(10)),
    )
    .await?;
    inv.assign_by_quantity(&shop.c1, &shop.p1, 2).await?;
    inv.send_to_maintenance(&shop.p1, Some(vec!["C".into()]), None).await?;

    let stats = inv.stats().await?;
    assert_eq!(stats.products, 1);
    assert_eq!(stats.accessories, 1);
    assert_eq!(stats.customers, 1);
    assert_eq!(stats.companies, 1);
    assert_eq!(stats.available_units, 20);
    assert_eq!(stats.low_stock.len(), 1);
    assert_eq!(stats.low_stock[0].id, shop.p1);
    assert_eq!(stats.inventory_value, Decimal::from(200));
    assert_eq!(stats.average_product_price, "499.90".parse::<Decimal>()?);
    assert_eq!(stats.assignments, 1);
    assert_eq!(stats.assigned_units, 2);
    assert_eq!(stats.recent_assignments, 1);
    assert_eq!(stats.maintenance_batches, 1);
    assert_eq!(stats.maintenance_units, 1);
    Ok(())
}

#[tokio::test]
async fn verify_finds_broken_data() -> TestResult {
    let now = chrono::Utc::now();
    let item = StockItem {
        id:             "P1".into(),
        kind:           StockKind::Product,
        name:           "Phone".into(),
        description:    String::new(),
        price:          Default::default(),
        stock:          2,
        category:       String::new(),
        brand:          None,
        serial_numbers: vec!["A".into()],
        created_at:     now,
    };
    let held = Assignment {
        id:             "AS1".into(),
        customer_id:    "ghost".into(),
        item_id:        "P1".into(),
        quantity:       1,
        serial_numbers: vec!["A".into(), "B".into()],
        assigned_at:    now,
    };
    let snapshot = click_store::store::Snapshot {
        items: vec![item],
        assignments: vec![held],
        ..Default::default()
    };
    let inv = Inventory::new(MemoryStore::with_snapshot(snapshot));

    let found = inv.verify().await?;
    assert!(found
        .iter()
        .any(|i| matches!(i, click_store::inventory::Inconsistency::StockMismatch { .. })));
    assert!(found.iter().any(
        |i| matches!(i, click_store::inventory::Inconsistency::SerialInManyPools { serial, .. } if serial == "A")
    ));
    assert!(found
        .iter()
        .any(|i| matches!(i, click_store::inventory::Inconsistency::DanglingAssignment { id, .. } if id == "ghost")));
    assert!(found
        .iter()
        .any(|i| matches!(i, click_store::inventory::Inconsistency::SerialsExceedQuantity { .. })));
    Ok(())
}

#[tokio::test]
async fn serials_cannot_be_added_under_anonymous_holders() -> TestResult {
    let shop = Shop::new(InventoryConfig::default()).await?;
    let inv = &shop.inventory;
    let cable = inv
        .create_item(StockKind::Accessory, NewStockItem::new("Cable").with_stock(2))
        .await?
        .id;
    inv.assign_by_quantity(&shop.c1, &cable, 1).await?;

    let patch = StockItemPatch {
        serial_numbers: Some(vec!["X".into()]),
        ..Default::default()
    };
    let err = inv.update_item(&cable, patch.clone()).await.unwrap_err();
    assert!(matches!(
        err.invariant(),
        Some(InvariantViolation::OutstandingAssignments { id, count: 1, .. }) if id == &cable
    ));
    let item = inv.item(&cable).await?;
    assert_eq!(item.stock, 1);
    assert!(item.serial_numbers.is_empty());

    // The customer can still go, and the unit comes back.
    inv.delete_customer(&shop.c1).await?;
    assert_eq!(inv.item(&cable).await?.stock, 2);

    let item = inv.update_item(&cable, patch).await?;
    assert_eq!(item.stock, 1);
    assert_eq!(item.serial_numbers, ["X"]);
    assert!(inv.verify().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn stats_survive_huge_values() -> TestResult {
    let inv = Inventory::new(MemoryStore::new());
    inv.create_item(
        StockKind::Product,
        NewStockItem::new("Vault")
            .with_price(Decimal::MAX)
            .with_stock(10),
    )
    .await?;
    inv.create_item(
        StockKind::Product,
        NewStockItem::new("Safe")
            .with_price(Decimal::MAX)
            .with_stock(1),
    )
    .await?;

    let stats = inv.stats().await?;
    assert_eq!(stats.inventory_value, Decimal::MAX);
    assert!(stats.average_product_price > Decimal::ZERO);
    assert_eq!(stats.available_units, 11);
    Ok(())
}

#[tokio::test]
async fn clamped_restore_skips_serials_already_shelved() -> TestResult {
    let item = NewStockItem::new("Phone")
        .with_serials(["A", "B"])
        .into_item(StockKind::Product)?;
    let batch = MaintenanceItem {
        stock: 2,
        serial_numbers: vec!["B".into(), "C".into()],
        ..MaintenanceItem::snapshot_of(&item, None)
    };
    let (item_id, batch_id) = (item.id.clone(), batch.id.clone());
    let snapshot = click_store::store::Snapshot {
        items: vec![item],
        maintenance: vec![batch],
        ..Default::default()
    };

    let strict = Inventory::new(MemoryStore::with_snapshot(snapshot.clone()));
    let err = strict.restore_from_maintenance(&batch_id).await.unwrap_err();
    assert!(matches!(err.invariant(), Some(InvariantViolation::DuplicateSerials { serials }) if serials == &["B"]));

    let lenient = Inventory::with_config(
        MemoryStore::with_snapshot(snapshot),
        InventoryConfig::default().with_overdraw(OverdrawPolicy::Clamp),
    );
    let restored = lenient.restore_from_maintenance(&batch_id).await?;
    assert_eq!(restored.id, item_id);
    assert_eq!(restored.serial_numbers, ["A", "B", "C"]);
    assert_eq!(restored.stock, 3);
    assert!(lenient.maintenance_items().await?.is_empty());
    assert!(lenient.verify().await?.is_empty());
    Ok(())
}
