use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::instrument;

use super::Snapshot;
use super::Store;
use crate::changes::ChangeSet;
use crate::error::Result;
use crate::model::Assignment;
use crate::model::Company;
use crate::model::Customer;
use crate::model::MaintenanceItem;
use crate::model::StockItem;
use crate::types::StockKind;

/// On-disk layout of the data file, the `db.json` shape served by the shop's JSON server.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JsonDocument {
    products:             Vec<StockItem>,
    accessories:          Vec<StockItem>,
    customers:            Vec<Customer>,
    companies:            Vec<Company>,
    #[serde(alias = "customer_products")]
    customer_products:    Vec<Assignment>,
    #[serde(alias = "customer_accessories")]
    customer_accessories: Vec<Assignment>,
    #[serde(alias = "maintenance_items")]
    maintenance_items:    Vec<MaintenanceItem>,
}

impl From<JsonDocument> for Snapshot {
    fn from(doc: JsonDocument) -> Self {
        let with_kind = |kind: StockKind| {
            move |mut item: StockItem| {
                item.kind = kind;
                item
            }
        };

        Snapshot {
            items:       doc
                .products
                .into_iter()
                .map(with_kind(StockKind::Product))
                .chain(doc.accessories.into_iter().map(with_kind(StockKind::Accessory)))
                .collect(),
            customers:   doc.customers,
            companies:   doc.companies,
            assignments: doc
                .customer_products
                .into_iter()
                .chain(doc.customer_accessories)
                .collect(),
            maintenance: doc.maintenance_items,
        }
    }
}

impl From<&Snapshot> for JsonDocument {
    fn from(snapshot: &Snapshot) -> Self {
        let (accessories, products): (Vec<StockItem>, Vec<StockItem>) = snapshot
            .items
            .iter()
            .cloned()
            .partition(|i| i.kind == StockKind::Accessory);
        // Assignments of unknown items go with products.
        let (customer_accessories, customer_products) = snapshot.assignments.iter().cloned().partition(|a| {
            Snapshot::find(&snapshot.items, &a.item_id).is_some_and(|i| i.kind == StockKind::Accessory)
        });

        JsonDocument {
            products,
            accessories,
            customers: snapshot.customers.clone(),
            companies: snapshot.companies.clone(),
            customer_products,
            customer_accessories,
            maintenance_items: snapshot.maintenance.clone(),
        }
    }
}

/// Keeps all data in a single JSON file.
///
/// The whole image lives in memory. Every write-back serializes a complete new image into a temporary file next to
/// the data file and renames it over the old one; the in-memory image is replaced only after the rename succeeded.
#[derive(Debug)]
pub struct JsonFileStore {
    path:   Arc<PathBuf>,
    data:   RwLock<Snapshot>,
    writer: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    /// Open the data file. A missing file is an empty store; it is created by the first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = Arc::new(path.into());
        let snapshot = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || Self::load(&path)).await??
        };
        debug!(
            "Loaded {} item(s), {} customer(s) from {}",
            snapshot.items.len(),
            snapshot.customers.len(),
            path.display()
        );

        Ok(Self {
            path,
            data: RwLock::new(snapshot),
            writer: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Snapshot {
        self.data.read().clone()
    }

    /// Write the current image to disk, creating the data file if it doesn't exist yet.
    pub async fn flush(&self) -> Result<()> {
        let _writer = self.writer.lock().await;
        let doc = JsonDocument::from(&*self.data.read());
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::save(&path, &doc)).await??;
        Ok(())
    }

    fn load(path: &Path) -> Result<Snapshot> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(e) => return Err(e.into()),
        };
        let doc: JsonDocument = serde_json::from_reader(BufReader::new(file))?;
        Ok(doc.into())
    }

    fn save(path: &Path, doc: &JsonDocument) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut out, doc)?;
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path)?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn items(&self) -> Result<Vec<StockItem>> {
        Ok(self.data.read().items.clone())
    }

    async fn item(&self, id: &str) -> Result<Option<StockItem>> {
        Ok(Snapshot::find(&self.data.read().items, id).cloned())
    }

    async fn customers(&self) -> Result<Vec<Customer>> {
        Ok(self.data.read().customers.clone())
    }

    async fn customer(&self, id: &str) -> Result<Option<Customer>> {
        Ok(Snapshot::find(&self.data.read().customers, id).cloned())
    }

    async fn companies(&self) -> Result<Vec<Company>> {
        Ok(self.data.read().companies.clone())
    }

    async fn company(&self, id: &str) -> Result<Option<Company>> {
        Ok(Snapshot::find(&self.data.read().companies, id).cloned())
    }

    async fn assignments(&self) -> Result<Vec<Assignment>> {
        Ok(self.data.read().assignments.clone())
    }

    async fn assignment(&self, id: &str) -> Result<Option<Assignment>> {
        Ok(Snapshot::find(&self.data.read().assignments, id).cloned())
    }

    async fn maintenance_items(&self) -> Result<Vec<MaintenanceItem>> {
        Ok(self.data.read().maintenance.clone())
    }

    async fn maintenance_item(&self, id: &str) -> Result<Option<MaintenanceItem>> {
        Ok(Snapshot::find(&self.data.read().maintenance, id).cloned())
    }

    #[instrument(level = "trace", skip(self, changes), fields(path = %self.path.display(), changes = changes.len()))]
    async fn write_back(&self, changes: ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        // Writers are serialized so that the file always reflects the latest image.
        let _writer = self.writer.lock().await;
        let next = self.data.read().applied(self.name(), changes)?;
        let doc = JsonDocument::from(&next);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::save(&path, &doc)).await??;

        *self.data.write() = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_json_server_layout() {
        let raw = r#"{
            "products": [{"id": "P1", "name": "Phone", "price": 99.5, "stock": 2, "category": "phones",
                          "serial_numbers": "A; B", "created_at": "2024-01-01T00:00:00Z"}],
            "accessories": [{"id": "X1", "name": "Case", "stock": 4}],
            "customers": [{"id": "C1", "name": "Ann"}],
            "customer_products": [{"id": "CP1", "customer_id": "C1", "product_id": "P1", "quantity": 1}],
            "customerAccessories": [{"id": "CA1", "customerId": "C1", "accessoryId": "X1", "quantity": 2}],
            "maintenance_items": []
        }"#;
        let doc: JsonDocument = serde_json::from_str(raw).unwrap();
        let snapshot = Snapshot::from(doc);

        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].serial_numbers, vec!["A", "B"]);
        assert_eq!(snapshot.items[1].kind, StockKind::Accessory);
        assert_eq!(snapshot.assignments[0].item_id, "P1");
        assert_eq!(snapshot.assignments[1].item_id, "X1");

        let back = JsonDocument::from(&snapshot);
        assert_eq!(back.products.len(), 1);
        assert_eq!(back.customer_accessories.len(), 1);
        assert_eq!(back.customer_accessories[0].id, "CA1");
    }
}
