use chrono::Utc;

use super::serial;
use super::SerialHolder;
use super::Taken;
use crate::config::OverdrawPolicy;
use crate::error::InvariantViolation;
use crate::model::Assignment;

/// Merge taken units into the customer's assignment for the item, or start a new one.
///
/// Quantities add up and serial sets are unioned. The assignment timestamp moves to now.
pub fn assign(existing: Option<Assignment>, customer_id: &str, item_id: &str, taken: Taken) -> Assignment {
    let mut assignment = existing.unwrap_or_else(|| Assignment::new(customer_id, item_id));
    let units = taken.units();
    let fresh: Vec<String> = taken
        .serials
        .into_iter()
        .filter(|s| !assignment.holds_serial(s))
        .collect();

    assignment.quantity += units;
    assignment.serial_numbers.extend(fresh);
    assignment.assigned_at = Utc::now();
    assignment
}

/// Take the named serials back from the customer. Returns the serials actually found.
pub fn partial_return(
    assignment: &mut Assignment,
    serials: &[String],
    policy: OverdrawPolicy,
) -> Result<Vec<String>, InvariantViolation> {
    serial::remove_serials(assignment, serials, policy)
}

/// Take back `count` units that were assigned without serial numbers.
pub fn return_quantity(
    assignment: &mut Assignment,
    count: u32,
    policy: OverdrawPolicy,
) -> Result<u32, InvariantViolation> {
    serial::take_anonymous(assignment, count, policy)
}

/// Everything the assignment holds, emptying it.
pub fn unassign(assignment: &mut Assignment) -> Taken {
    let anonymous = assignment.anonymous();
    let serials = std::mem::take(&mut assignment.serial_numbers);
    assignment.quantity = 0;
    Taken { serials, anonymous }
}

/// An assignment with no units left must be deleted.
pub fn is_settled(assignment: &Assignment) -> bool {
    assignment.quantity == 0
}

pub fn find_pair<'a>(assignments: &'a [Assignment], customer_id: &str, item_id: &str) -> Option<&'a Assignment> {
    assignments.iter().find(|a| a.is_for(customer_id, item_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taken(serials: &[&str], anonymous: u32) -> Taken {
        Taken {
            serials: serials.iter().map(|s| s.to_string()).collect(),
            anonymous,
        }
    }

    #[test]
    fn repeated_assignment_merges() {
        let first = assign(None, "C1", "P1", taken(&["A"], 0));
        let id = first.id.clone();
        let merged = assign(Some(first), "C1", "P1", taken(&["B"], 1));

        assert_eq!(merged.id, id);
        assert_eq!(merged.quantity, 3);
        assert_eq!(merged.serial_numbers, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(merged.anonymous(), 1);
    }

    #[test]
    fn merge_equals_single_assignment() {
        let twice = assign(Some(assign(None, "C1", "P1", taken(&[], 2))), "C1", "P1", taken(&[], 3));
        let once = assign(None, "C1", "P1", taken(&[], 5));
        assert_eq!(twice.quantity, once.quantity);
        assert_eq!(twice.serial_numbers, once.serial_numbers);
    }

    #[test]
    fn partial_return_settles() {
        let mut a = assign(None, "C1", "P1", taken(&["A", "B"], 0));
        let back = partial_return(&mut a, &["B".to_string()], OverdrawPolicy::Reject).unwrap();
        assert_eq!(back, vec!["B".to_string()]);
        assert_eq!(a.quantity, 1);
        assert!(!is_settled(&a));

        let rest = unassign(&mut a);
        assert_eq!(rest, taken(&["A"], 0));
        assert!(is_settled(&a));
    }

    #[test]
    fn return_quantity_only_anonymous() {
        let mut a = assign(None, "C1", "P1", taken(&["A"], 2));
        assert!(return_quantity(&mut a, 3, OverdrawPolicy::Reject).is_err());
        assert_eq!(return_quantity(&mut a, 3, OverdrawPolicy::Clamp).unwrap(), 2);
        assert_eq!(a.quantity, 1);
    }
}
