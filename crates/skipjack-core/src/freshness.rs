//! Incarnation arithmetic and freshness predicates (§4.9).
//!
//! Pure functions, deliberately free of any table lookup, so the
//! protocol's acceptance rules stay testable without a transport.

/// `suitable-restart-counter?`
pub fn suitable_restart_counter(event_restart_counter: u64, local_restart_counter: u64) -> bool {
    event_restart_counter >= local_restart_counter
}

/// `suitable-tx?`
pub fn suitable_tx(
    event_restart_counter: u64,
    local_restart_counter: u64,
    event_tx: u64,
    local_tx: u64,
) -> bool {
    if event_restart_counter > local_restart_counter {
        true
    } else {
        event_tx > local_tx
    }
}

/// `suitable-incarnation?`: both predicates hold.
pub fn suitable_incarnation(
    event_restart_counter: u64,
    local_restart_counter: u64,
    event_tx: u64,
    local_tx: u64,
) -> bool {
    suitable_restart_counter(event_restart_counter, local_restart_counter)
        && suitable_tx(event_restart_counter, local_restart_counter, event_tx, local_tx)
}

/// As [`suitable_incarnation`], but for callers holding an `Option` local
/// incarnation (e.g. a subject not yet in the table). Absent input yields
/// `false`, never a crash (§4.9 "Nil/absent inputs yield false").
pub fn suitable_incarnation_opt(local: Option<(u64, u64)>, candidate: (u64, u64)) -> bool {
    match local {
        None => false,
        Some((local_rc, local_tx)) => {
            suitable_incarnation(candidate.0, local_rc, candidate.1, local_tx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_restart_counter_is_always_suitable_tx() {
        assert!(suitable_tx(5, 4, 0, 1000));
    }

    #[test]
    fn same_restart_counter_requires_higher_tx() {
        assert!(suitable_tx(4, 4, 10, 9));
        assert!(!suitable_tx(4, 4, 9, 9));
        assert!(!suitable_tx(4, 4, 8, 9));
    }

    #[test]
    fn lower_restart_counter_is_never_suitable() {
        assert!(!suitable_restart_counter(3, 4));
        assert!(!suitable_incarnation(3, 4, 999, 0));
    }

    #[test]
    fn incarnation_requires_both_predicates() {
        assert!(suitable_incarnation(5, 4, 0, 0));
        assert!(suitable_incarnation(4, 4, 10, 9));
        assert!(!suitable_incarnation(4, 4, 9, 9));
    }

    #[test]
    fn absent_local_incarnation_is_never_suitable() {
        assert!(!suitable_incarnation_opt(None, (0, 0)));
    }
}
