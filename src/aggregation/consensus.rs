use crate::models::{Aggregate, Consensus};

/// Derive the displayed consensus from the current session sums.
///
/// Every average and majority is taken over `session.contribution_count`;
/// the lifetime count never enters the computation.
pub fn to_consensus(aggregate: &Aggregate) -> Consensus {
    let session = &aggregate.session;
    if session.contribution_count <= 0 {
        return Consensus::empty(&aggregate.location_key);
    }

    let total = session.contribution_count;
    Consensus {
        location_key: aggregate.location_key.clone(),
        wait_time_minutes: session.wait_time_sum / total,
        is_open: aggregate.latest.is_open,
        wears_gloves: is_majority(session.glove_count, total),
        wears_mask: is_majority(session.mask_count, total),
        respects_distancing: is_majority(session.distance_count, total),
        stock_level: aggregate.latest.stock_level.clone(),
        session_contribution_count: total,
        last_contribution_date: aggregate.latest.last_contribution_date.clone(),
        last_contribution_time: aggregate.latest.last_contribution_time.clone(),
    }
}

/// Strict majority: exactly half is not enough.
pub fn is_majority(count: i64, total: i64) -> bool {
    count > total / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LatestValues, SessionTotals};

    fn aggregate(session: SessionTotals, lifetime: i64) -> Aggregate {
        Aggregate {
            location_key: "shop".into(),
            lifetime_contribution_count: lifetime,
            session,
            latest: LatestValues {
                is_open: true,
                stock_level: "full".into(),
                last_contribution_timestamp: 1_585_821_600,
                last_contribution_date: "02-04-2020".into(),
                last_contribution_time: "11:00:00".into(),
            },
        }
    }

    #[test]
    fn strict_majority_over_three() {
        assert!(!is_majority(1, 3));
        assert!(is_majority(2, 3));
    }

    #[test]
    fn exact_half_is_not_a_majority() {
        assert!(!is_majority(2, 4));
        assert!(is_majority(3, 4));
        assert!(is_majority(1, 1));
    }

    #[test]
    fn average_wait_time_truncates() {
        let consensus = to_consensus(&aggregate(
            SessionTotals {
                contribution_count: 3,
                wait_time_sum: 30,
                ..Default::default()
            },
            3,
        ));
        assert_eq!(consensus.wait_time_minutes, 10);

        let consensus = to_consensus(&aggregate(
            SessionTotals {
                contribution_count: 3,
                wait_time_sum: 29,
                ..Default::default()
            },
            3,
        ));
        assert_eq!(consensus.wait_time_minutes, 9);
    }

    #[test]
    fn majorities_use_session_count_not_lifetime_count() {
        // 2 of 3 in the session; against the lifetime count of 40 this would read false.
        let consensus = to_consensus(&aggregate(
            SessionTotals {
                contribution_count: 3,
                wait_time_sum: 0,
                glove_count: 1,
                mask_count: 2,
                distance_count: 3,
            },
            40,
        ));

        assert!(!consensus.wears_gloves);
        assert!(consensus.wears_mask);
        assert!(consensus.respects_distancing);
        assert_eq!(consensus.session_contribution_count, 3);
    }

    #[test]
    fn scalars_pass_through() {
        let consensus = to_consensus(&aggregate(
            SessionTotals {
                contribution_count: 1,
                wait_time_sum: 5,
                ..Default::default()
            },
            1,
        ));
        assert!(consensus.is_open);
        assert_eq!(consensus.stock_level, "full");
        assert_eq!(consensus.last_contribution_date, "02-04-2020");
        assert_eq!(consensus.last_contribution_time, "11:00:00");
    }

    #[test]
    fn empty_session_yields_empty_consensus() {
        let consensus = to_consensus(&aggregate(SessionTotals::default(), 5));
        assert_eq!(consensus, Consensus::empty("shop"));
    }
}
