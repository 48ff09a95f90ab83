use super::serial;
use super::SerialHolder;
use super::Taken;
use crate::config::OverdrawPolicy;
use crate::error::InvariantViolation;
use crate::model::MaintenanceItem;
use crate::model::StockItem;

/// Open a maintenance batch for units taken from `item`.
pub fn open_batch(item: &StockItem, company_id: Option<String>, taken: Taken) -> MaintenanceItem {
    let mut batch = MaintenanceItem::snapshot_of(item, company_id);
    serial::put(&mut batch, taken);
    batch
}

/// Turn the whole item into a maintenance batch. The caller deletes the item record.
pub fn send_whole(item: StockItem, company_id: Option<String>) -> MaintenanceItem {
    let mut batch = MaintenanceItem::snapshot_of(&item, company_id);
    batch.stock = item.stock;
    batch.serial_numbers = item.serial_numbers;
    batch
}

/// Serials of `batch` that are already on the shelf of `item`.
pub fn shelved_serials(batch: &MaintenanceItem, item: &StockItem) -> Vec<String> {
    batch
        .serial_numbers
        .iter()
        .filter(|s| item.holds_serial(s))
        .cloned()
        .collect()
}

/// Compute the stock item that results from restoring `batch`.
///
/// When the original item still exists the batch units are added to it and serials are appended. Otherwise the item
/// is recreated from the snapshot under its original ID.
pub fn restore(
    batch: &MaintenanceItem,
    original: Option<StockItem>,
    policy: OverdrawPolicy,
) -> Result<StockItem, InvariantViolation> {
    let Some(mut item) = original
    else {
        return Ok(batch.to_stock_item());
    };

    let present = shelved_serials(batch, &item);
    if !present.is_empty() && policy == OverdrawPolicy::Reject {
        return Err(InvariantViolation::DuplicateSerials { serials: present });
    }
    let fresh: Vec<String> = batch
        .serial_numbers
        .iter()
        .filter(|s| !present.contains(s))
        .cloned()
        .collect();

    serial::return_anonymous(&mut item, batch.anonymous());
    serial::return_serials(&mut item, fresh);
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewStockItem;
    use crate::types::StockKind;

    fn phone() -> StockItem {
        NewStockItem::new("Phone")
            .with_brand("Acme")
            .with_serials(["A", "B", "C"])
            .into_item(StockKind::Product)
            .unwrap()
    }

    #[test]
    fn serial_round_trip() {
        let mut item = phone();
        let taken = serial::remove_serials(&mut item, &["B".to_string()], OverdrawPolicy::Reject).unwrap();
        let batch = open_batch(
            &item,
            Some("X".into()),
            Taken {
                serials:   taken,
                anonymous: 0,
            },
        );
        assert_eq!(batch.stock, 1);
        assert_eq!(batch.original_product_id.as_deref(), Some(item.id.as_str()));
        assert_eq!(batch.brand.as_deref(), Some("Acme"));

        let restored = restore(&batch, Some(item), OverdrawPolicy::Reject).unwrap();
        assert_eq!(restored.stock, 3);
        assert_eq!(restored.serial_numbers, vec!["A", "C", "B"]);
    }

    #[test]
    fn restore_recreates_missing_original() {
        let item = phone();
        let id = item.id.clone();
        let batch = send_whole(item, None);
        let restored = restore(&batch, None, OverdrawPolicy::Reject).unwrap();
        assert_eq!(restored.id, id);
        assert_eq!(restored.stock, 3);
        assert_eq!(restored.brand.as_deref(), Some("Acme"));
    }

    #[test]
    fn restore_detects_duplicates() {
        let item = phone();
        let batch = send_whole(item.clone(), None);
        let err = restore(&batch, Some(item.clone()), OverdrawPolicy::Reject).unwrap_err();
        assert!(matches!(err, InvariantViolation::DuplicateSerials { .. }));

        let merged = restore(&batch, Some(item), OverdrawPolicy::Clamp).unwrap();
        assert_eq!(merged.stock, 3);
    }

    #[test]
    fn shelved_serials_are_reported() {
        let mut item = phone();
        let wanted = ["A".to_string(), "B".to_string()];
        let taken = serial::remove_serials(&mut item, &wanted, OverdrawPolicy::Reject).unwrap();
        let batch = open_batch(
            &item,
            None,
            Taken {
                serials:   taken,
                anonymous: 0,
            },
        );
        assert!(shelved_serials(&batch, &item).is_empty());

        item.serial_numbers.push("B".into());
        item.stock += 1;
        assert_eq!(shelved_serials(&batch, &item), ["B"]);

        let merged = restore(&batch, Some(item), OverdrawPolicy::Clamp).unwrap();
        assert_eq!(merged.serial_numbers, ["C", "B", "A"]);
        assert_eq!(merged.stock, 3);
    }
}
