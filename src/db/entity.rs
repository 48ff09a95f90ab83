//! Table models and their conversion from/to domain records.
//!
//! Counts are stored as 64-bit integers, prices as decimal text and serial lists as JSON array text.
pub mod assignment;
pub mod company;
pub mod customer;
pub mod maintenance_item;
pub mod stock_item;

use rust_decimal::Decimal;

use crate::error::PersistenceError;
use crate::ledger::serial;

pub(crate) fn count_from_db(what: &'static str, id: &str, value: i64) -> Result<u32, PersistenceError> {
    u32::try_from(value).map_err(|_| PersistenceError::Malformed {
        what,
        id: id.to_string(),
        value: value.to_string(),
    })
}

pub(crate) fn price_to_db(price: &Decimal) -> String {
    price.normalize().to_string()
}

pub(crate) fn price_from_db(id: &str, value: &str) -> Result<Decimal, PersistenceError> {
    if value.trim().is_empty() {
        return Ok(Decimal::ZERO);
    }
    value.trim().parse().map_err(|_| PersistenceError::Malformed {
        what:  "price",
        id:    id.to_string(),
        value: value.to_string(),
    })
}

pub(crate) fn serials_to_db(serials: &[String]) -> Result<String, PersistenceError> {
    Ok(serial::encode(serials)?)
}

pub(crate) fn serials_from_db(id: &str, value: &str) -> Result<Vec<String>, PersistenceError> {
    serial::decode(value).map_err(|_| PersistenceError::Malformed {
        what:  "serial numbers",
        id:    id.to_string(),
        value: value.to_string(),
    })
}
