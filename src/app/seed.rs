//! Demo data for a freshly initialized store.
use rust_decimal::Decimal;
use tracing::info;

use crate::error::InventoryError;
use crate::error::Result;
use crate::inventory::Inventory;
use crate::model::Contact;
use crate::model::NewStockItem;
use crate::store::Store;
use crate::types::StockKind;

/// Fill an empty store with a small shop: two repair companies, two products, two accessories, two customers holding
/// some units, and one unit under repair.
pub async fn seed<S: Store>(inventory: &Inventory<S>) -> Result<()> {
    if !inventory.items(None).await?.is_empty() || !inventory.customers().await?.is_empty() {
        return Err(InventoryError::invalid("the store already has data, refusing to seed it"));
    }

    let lab = inventory
        .create_company(
            Contact::new("Click Laudos")
                .with_email("contato@clicklaudos.com")
                .with_phone("+55 11 99999-0001")
                .with_address("Rua Exemplo, 123"),
        )
        .await?;
    inventory
        .create_company(
            Contact::new("Servicos Gerais SA")
                .with_email("contato@servicos.com")
                .with_phone("+55 11 99999-0002")
                .with_address("Av. Teste, 456"),
        )
        .await?;

    let multimeter = inventory
        .create_item(
            StockKind::Product,
            NewStockItem::new("Digital Multimeter")
                .with_description("Multimeter for basic measurements")
                .with_price(Decimal::new(19990, 2))
                .with_stock(10)
                .with_category("Equipment")
                .with_brand("Fluke"),
        )
        .await?;
    inventory
        .create_item(
            StockKind::Product,
            NewStockItem::new("Oscilloscope 50MHz")
                .with_description("Portable oscilloscope")
                .with_price(Decimal::new(249900, 2))
                .with_stock(2)
                .with_category("Equipment")
                .with_brand("Rigol"),
        )
        .await?;
    let test_lead = inventory
        .create_item(
            StockKind::Accessory,
            NewStockItem::new("Test Lead")
                .with_description("Universal multimeter lead")
                .with_price(Decimal::new(1550, 2))
                .with_stock(50)
                .with_brand("Generic"),
        )
        .await?;
    inventory
        .create_item(
            StockKind::Accessory,
            NewStockItem::new("BNC Cable")
                .with_description("1m BNC cable")
                .with_price(Decimal::new(2990, 2))
                .with_stock(25)
                .with_brand("Generic"),
        )
        .await?;

    let joao = inventory
        .create_customer(
            Contact::new("Joao Silva")
                .with_email("joao@example.com")
                .with_phone("+55 11 98888-1111")
                .with_address("Rua Cliente, 10"),
        )
        .await?;
    let maria = inventory
        .create_customer(
            Contact::new("Maria Oliveira")
                .with_email("maria@example.com")
                .with_phone("+55 11 97777-2222")
                .with_address("Rua Cliente, 20"),
        )
        .await?;

    inventory.assign_by_quantity(&joao.id, &multimeter.id, 1).await?;
    inventory.assign_by_quantity(&maria.id, &test_lead.id, 2).await?;
    inventory
        .send_quantity_to_maintenance(&multimeter.id, 1, Some(lab.id.as_str()))
        .await?;

    info!("seeded {} store with demo data", inventory.store().name());
    Ok(())
}
