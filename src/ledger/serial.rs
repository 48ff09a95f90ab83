use std::collections::HashSet;

use serde::Deserialize;
use serde::Deserializer;

use crate::config::OverdrawPolicy;
use crate::error::InvariantViolation;
use crate::error::Result;
use crate::model::Assignment;
use crate::model::MaintenanceItem;
use crate::model::StockItem;

/// Anything that holds a unit count together with the serial numbers of some of those units.
///
/// Units beyond the serial list are "anonymous": legacy quantity-only stock.
pub trait SerialHolder {
    /// Human readable name of the holder for error messages.
    fn holder(&self) -> String;
    fn units(&self) -> u32;
    fn units_mut(&mut self) -> &mut u32;
    fn serials(&self) -> &[String];
    fn serials_mut(&mut self) -> &mut Vec<String>;

    fn anonymous(&self) -> u32 {
        self.units().saturating_sub(self.serials().len() as u32)
    }
}

impl SerialHolder for StockItem {
    fn holder(&self) -> String {
        format!("{} '{}'", self.kind, self.id)
    }

    fn units(&self) -> u32 {
        self.stock
    }

    fn units_mut(&mut self) -> &mut u32 {
        &mut self.stock
    }

    fn serials(&self) -> &[String] {
        &self.serial_numbers
    }

    fn serials_mut(&mut self) -> &mut Vec<String> {
        &mut self.serial_numbers
    }
}

impl SerialHolder for Assignment {
    fn holder(&self) -> String {
        format!("assignment '{}' of customer '{}'", self.id, self.customer_id)
    }

    fn units(&self) -> u32 {
        self.quantity
    }

    fn units_mut(&mut self) -> &mut u32 {
        &mut self.quantity
    }

    fn serials(&self) -> &[String] {
        &self.serial_numbers
    }

    fn serials_mut(&mut self) -> &mut Vec<String> {
        &mut self.serial_numbers
    }
}

impl SerialHolder for MaintenanceItem {
    fn holder(&self) -> String {
        format!("maintenance item '{}'", self.id)
    }

    fn units(&self) -> u32 {
        self.stock
    }

    fn units_mut(&mut self) -> &mut u32 {
        &mut self.stock
    }

    fn serials(&self) -> &[String] {
        &self.serial_numbers
    }

    fn serials_mut(&mut self) -> &mut Vec<String> {
        &mut self.serial_numbers
    }
}

/// Units taken out of a holder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taken {
    pub serials:   Vec<String>,
    pub anonymous: u32,
}

impl Taken {
    pub fn units(&self) -> u32 {
        self.serials.len() as u32 + self.anonymous
    }

    pub fn is_empty(&self) -> bool {
        self.units() == 0
    }
}

fn cap(
    holder: &impl SerialHolder,
    requested: u32,
    available: u32,
    policy: OverdrawPolicy,
) -> Result<u32, InvariantViolation> {
    if requested <= available {
        return Ok(requested);
    }
    match policy {
        OverdrawPolicy::Clamp if available > 0 => Ok(available),
        _ => Err(InvariantViolation::Overdraw {
            holder: holder.holder(),
            requested,
            available,
        }),
    }
}

/// Take `count` units, serials first in stored order. Whatever the serials don't cover is taken as anonymous units.
pub fn take_units<H: SerialHolder>(
    holder: &mut H,
    count: u32,
    policy: OverdrawPolicy,
) -> Result<Taken, InvariantViolation> {
    let count = cap(&*holder, count, holder.units(), policy)?;
    let with_serial = (count as usize).min(holder.serials().len());
    let serials: Vec<String> = holder.serials_mut().drain(..with_serial).collect();
    *holder.units_mut() -= count;

    Ok(Taken {
        anonymous: count - serials.len() as u32,
        serials,
    })
}

/// Take `count` units that carry no serial number.
pub fn take_anonymous<H: SerialHolder>(
    holder: &mut H,
    count: u32,
    policy: OverdrawPolicy,
) -> Result<u32, InvariantViolation> {
    let count = cap(&*holder, count, holder.anonymous(), policy)?;
    *holder.units_mut() -= count;
    Ok(count)
}

/// Remove exactly the named serials. Returns the serials actually removed, in the order they were requested.
///
/// With [`OverdrawPolicy::Reject`] every serial must be held, otherwise nothing is changed. With
/// [`OverdrawPolicy::Clamp`] absent serials are skipped.
pub fn remove_serials<H: SerialHolder>(
    holder: &mut H,
    serials: &[String],
    policy: OverdrawPolicy,
) -> Result<Vec<String>, InvariantViolation> {
    let missing = missing_from(holder.serials(), serials);
    if !missing.is_empty() && policy == OverdrawPolicy::Reject {
        return Err(InvariantViolation::MissingSerials {
            holder:  holder.holder(),
            serials: missing,
        });
    }

    let wanted: HashSet<&str> = serials.iter().map(String::as_str).collect();
    let removed: Vec<String> = serials
        .iter()
        .filter(|s| holder.serials().contains(*s))
        .cloned()
        .collect();
    holder.serials_mut().retain(|s| !wanted.contains(s.as_str()));
    let units = holder.units_mut();
    *units = units.saturating_sub(removed.len() as u32);

    Ok(removed)
}

/// Append serials to the holder. Doesn't de-duplicate: the caller guarantees the serials are not there yet.
pub fn return_serials<H: SerialHolder>(holder: &mut H, serials: impl IntoIterator<Item = String>) {
    let before = holder.serials().len();
    holder.serials_mut().extend(serials);
    let added = (holder.serials().len() - before) as u32;
    *holder.units_mut() += added;
}

pub fn return_anonymous<H: SerialHolder>(holder: &mut H, count: u32) {
    *holder.units_mut() += count;
}

/// Put taken units into the holder.
pub fn put<H: SerialHolder>(holder: &mut H, taken: Taken) {
    return_anonymous(holder, taken.anonymous);
    return_serials(holder, taken.serials);
}

/// Serials of `wanted` that are not in `held`, in the order of `wanted`.
pub fn missing_from(held: &[String], wanted: &[String]) -> Vec<String> {
    let held: HashSet<&str> = held.iter().map(String::as_str).collect();
    wanted.iter().filter(|s| !held.contains(s.as_str())).cloned().collect()
}

/// Serials that occur more than once, each reported once.
pub fn duplicates<'a>(serials: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for s in serials {
        if !seen.insert(s.as_str()) && !dups.contains(s) {
            dups.push(s.clone());
        }
    }
    dups
}

/// Trim user input, drop blanks and reject duplicates.
pub fn normalize(serials: Vec<String>) -> Result<Vec<String>> {
    let serials: Vec<String> = serials
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let dups = duplicates(&serials);
    if !dups.is_empty() {
        return Err(InvariantViolation::DuplicateSerials { serials: dups }.into());
    }
    Ok(serials)
}

/// Storage encoding of a serial list: a JSON array.
pub fn encode(serials: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(serials)
}

/// Decode a stored serial list. Accepts JSON array text and the legacy `;`-delimited form.
pub fn decode(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        serde_json::from_str(raw)
    }
    else {
        Ok(split_legacy(raw))
    }
}

fn split_legacy(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Serde helper for `serialNumbers` fields: array, legacy delimited string, or null.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::List(list)) => list,
        Some(Raw::Text(text)) => split_legacy(&text),
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewStockItem;
    use crate::types::StockKind;

    fn item(serials: &[&str]) -> StockItem {
        NewStockItem::new("Phone")
            .with_serials(serials.iter().copied())
            .into_item(StockKind::Product)
            .unwrap()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn take_units_prefers_serials_in_order() {
        let mut p = item(&["A", "B", "C"]);
        let taken = take_units(&mut p, 2, OverdrawPolicy::Reject).unwrap();
        assert_eq!(taken.serials, strings(&["A", "B"]));
        assert_eq!(taken.anonymous, 0);
        assert_eq!(p.stock, 1);
        assert_eq!(p.serial_numbers, strings(&["C"]));
    }

    #[test]
    fn take_units_from_quantity_only_stock() {
        let mut p = NewStockItem::new("Cable").with_stock(5).into_item(StockKind::Accessory).unwrap();
        let taken = take_units(&mut p, 3, OverdrawPolicy::Reject).unwrap();
        assert!(taken.serials.is_empty());
        assert_eq!(taken.anonymous, 3);
        assert_eq!(p.stock, 2);
    }

    #[test]
    fn overdraw_is_rejected_or_clamped() {
        let mut p = item(&["A", "B"]);
        let err = take_units(&mut p, 3, OverdrawPolicy::Reject).unwrap_err();
        assert!(matches!(err, InvariantViolation::Overdraw { requested: 3, available: 2, .. }));
        assert_eq!(p.stock, 2, "rejected take must not change the holder");

        let taken = take_units(&mut p, 3, OverdrawPolicy::Clamp).unwrap();
        assert_eq!(taken.units(), 2);
        assert_eq!(p.stock, 0);

        // Nothing left to clamp to.
        assert!(take_units(&mut p, 1, OverdrawPolicy::Clamp).is_err());
    }

    #[test]
    fn remove_serials_exact_match() {
        let mut p = item(&["A", "B", "C"]);
        let removed = remove_serials(&mut p, &strings(&["C", "A"]), OverdrawPolicy::Reject).unwrap();
        assert_eq!(removed, strings(&["C", "A"]));
        assert_eq!(p.serial_numbers, strings(&["B"]));
        assert_eq!(p.stock, 1);
    }

    #[test]
    fn remove_serials_missing() {
        let mut p = item(&["A", "B"]);
        let err = remove_serials(&mut p, &strings(&["A", "Z"]), OverdrawPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::MissingSerials {
                holder:  p.holder(),
                serials: strings(&["Z"]),
            }
        );
        assert_eq!(p.stock, 2);

        let removed = remove_serials(&mut p, &strings(&["A", "Z"]), OverdrawPolicy::Clamp).unwrap();
        assert_eq!(removed, strings(&["A"]));
        assert_eq!(p.stock, 1);
    }

    #[test]
    fn return_appends() {
        let mut p = item(&["B"]);
        return_serials(&mut p, strings(&["A"]));
        return_anonymous(&mut p, 0);
        assert_eq!(p.serial_numbers, strings(&["B", "A"]));
        assert_eq!(p.stock, 2);
        assert!(p.check_consistency().is_ok());
    }

    #[test]
    fn take_anonymous_ignores_serials() {
        let mut a = Assignment::new("c", "p");
        a.quantity = 3;
        a.serial_numbers = strings(&["A"]);
        assert_eq!(take_anonymous(&mut a, 2, OverdrawPolicy::Reject).unwrap(), 2);
        assert_eq!(a.quantity, 1);
        assert!(take_anonymous(&mut a, 1, OverdrawPolicy::Reject).is_err());
    }

    #[test]
    fn normalize_rejects_duplicates() {
        assert_eq!(normalize(strings(&[" A ", "", "B"])).unwrap(), strings(&["A", "B"]));
        let err = normalize(strings(&["A", "B", "A", "A"])).unwrap_err();
        assert_eq!(
            err.invariant(),
            Some(&InvariantViolation::DuplicateSerials { serials: strings(&["A"]) })
        );
    }

    #[test]
    fn codec() {
        let serials = strings(&["SN-1", "SN;2"]);
        let encoded = encode(&serials).unwrap();
        assert_eq!(decode(&encoded).unwrap(), serials);
        assert_eq!(decode(" A; B ;;C ").unwrap(), strings(&["A", "B", "C"]));
        assert!(decode("").unwrap().is_empty());
        assert!(decode("[broken").is_err());
    }

    #[test]
    fn serde_accepts_legacy_forms() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default, deserialize_with = "deserialize")]
            s: Vec<String>,
        }

        let p: Probe = serde_json::from_str(r#"{"s": ["A", "B"]}"#).unwrap();
        assert_eq!(p.s, strings(&["A", "B"]));
        let p: Probe = serde_json::from_str(r#"{"s": "A;B"}"#).unwrap();
        assert_eq!(p.s, strings(&["A", "B"]));
        let p: Probe = serde_json::from_str(r#"{"s": null}"#).unwrap();
        assert!(p.s.is_empty());
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert!(p.s.is_empty());
    }
}
