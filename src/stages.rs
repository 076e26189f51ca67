//! Fixed, ordered stage lists and the linear moves over them.
//!
//! Every stage-bearing row stores its stage as a plain string drawn from one of
//! these lists. Moves are strictly `index + 1` / `index - 1`.

use crate::errors::ServiceError;

pub const PROJECT_STAGES: &[&str] = &[
    "Enquiry",
    "Site Survey",
    "Proposal Sent",
    "Advance Received",
    "Material Procurement",
    "Installation",
    "Net Metering",
    "Subsidy Processing",
    "Commissioned",
    "Completed",
];

pub const CHITOOR_STAGES: &[&str] = &[
    "Registered",
    "Feasibility Approved",
    "Material Dispatched",
    "Installed",
    "Inspection",
    "Meter Fixed",
    "Subsidy Released",
    "Closed",
];

pub const TICKET_STATUSES: &[&str] = &["Open", "Assigned", "In Progress", "Resolved", "Closed"];

pub const DISPATCH_STATUSES: &[&str] = &["Pending", "Dispatched", "In Transit", "Delivered"];

pub const PROCUREMENT_STATUSES: &[&str] = &["Requested", "Approved", "Ordered", "Received"];

pub const TICKET_RESOLVED: &str = "Resolved";
pub const DISPATCH_DELIVERED: &str = "Delivered";
pub const PROCUREMENT_REQUESTED: &str = "Requested";
pub const PROCUREMENT_RECEIVED: &str = "Received";

/// Direction of a single-step move
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StageMove {
    Advance,
    Regress,
}

pub fn position(list: &[&str], stage: &str) -> Option<usize> {
    list.iter().position(|s| *s == stage)
}

pub fn initial(list: &'static [&'static str]) -> &'static str {
    list[0]
}

fn locate(list: &[&str], current: &str) -> Result<usize, ServiceError> {
    position(list, current)
        .ok_or_else(|| ServiceError::InvalidStatus(format!("unknown stage '{}'", current)))
}

/// Next stage after `current`
pub fn advance(list: &'static [&'static str], current: &str) -> Result<&'static str, ServiceError> {
    let idx = locate(list, current)?;
    list.get(idx + 1).copied().ok_or_else(|| {
        ServiceError::InvalidOperation(format!("'{}' is already the final stage", current))
    })
}

/// Stage before `current`
pub fn regress(list: &'static [&'static str], current: &str) -> Result<&'static str, ServiceError> {
    let idx = locate(list, current)?;
    if idx == 0 {
        return Err(ServiceError::InvalidOperation(format!(
            "'{}' is already the first stage",
            current
        )));
    }
    Ok(list[idx - 1])
}

pub fn step(
    list: &'static [&'static str],
    current: &str,
    direction: StageMove,
) -> Result<&'static str, ServiceError> {
    match direction {
        StageMove::Advance => advance(list, current),
        StageMove::Regress => regress(list, current),
    }
}

/// Validates an explicitly requested stage and returns its canonical form
pub fn ensure_valid(list: &'static [&'static str], stage: &str) -> Result<&'static str, ServiceError> {
    list.iter().copied().find(|s| *s == stage).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "'{}' is not one of: {}",
            stage,
            list.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(PROJECT_STAGES, "Enquiry", "Site Survey")]
    #[case(PROJECT_STAGES, "Commissioned", "Completed")]
    #[case(CHITOOR_STAGES, "Registered", "Feasibility Approved")]
    #[case(TICKET_STATUSES, "In Progress", "Resolved")]
    #[case(DISPATCH_STATUSES, "In Transit", "Delivered")]
    #[case(PROCUREMENT_STATUSES, "Ordered", "Received")]
    fn advance_moves_one_step(
        #[case] list: &'static [&'static str],
        #[case] from: &str,
        #[case] to: &str,
    ) {
        assert_eq!(advance(list, from).unwrap(), to);
        assert_eq!(regress(list, to).unwrap(), from);
    }

    #[test]
    fn bounds_are_invalid_operations() {
        assert_matches!(
            advance(PROJECT_STAGES, "Completed"),
            Err(ServiceError::InvalidOperation(_))
        );
        assert_matches!(
            regress(PROJECT_STAGES, "Enquiry"),
            Err(ServiceError::InvalidOperation(_))
        );
    }

    #[test]
    fn unknown_stage_is_invalid_status() {
        assert_matches!(
            advance(CHITOOR_STAGES, "Enquiry"),
            Err(ServiceError::InvalidStatus(_))
        );
        assert_matches!(
            regress(TICKET_STATUSES, "open"),
            Err(ServiceError::InvalidStatus(_))
        );
    }

    #[test]
    fn ensure_valid_rejects_non_members() {
        assert_eq!(ensure_valid(PROJECT_STAGES, "Installation").unwrap(), "Installation");
        assert_matches!(
            ensure_valid(PROJECT_STAGES, "Shipped"),
            Err(ServiceError::ValidationError(_))
        );
    }

    fn any_list() -> impl Strategy<Value = &'static [&'static str]> {
        prop_oneof![
            Just(PROJECT_STAGES),
            Just(CHITOOR_STAGES),
            Just(TICKET_STATUSES),
            Just(DISPATCH_STATUSES),
            Just(PROCUREMENT_STATUSES),
        ]
    }

    proptest! {
        #[test]
        fn regress_undoes_advance(list in any_list(), seed in 0usize..64) {
            let idx = seed % (list.len() - 1);
            let next = advance(list, list[idx]).unwrap();
            prop_assert_eq!(regress(list, next).unwrap(), list[idx]);
        }

        #[test]
        fn advance_undoes_regress(list in any_list(), seed in 0usize..64) {
            let idx = 1 + seed % (list.len() - 1);
            let prev = regress(list, list[idx]).unwrap();
            prop_assert_eq!(advance(list, prev).unwrap(), list[idx]);
        }
    }
}
