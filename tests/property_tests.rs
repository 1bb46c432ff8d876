//! Property-Based Tests for the CNC simulator
//!
//! Uses proptest for testing invariants and edge cases
//!
//! These tests verify:
//! - Sequence generation length, bounds and ordering
//! - Shuffled sequences are permutations, reproducible by seed
//! - Enumerated domains accept exactly their members
//! - Command-line parsing of numeric arguments

use cncsim::control::Command;
use cncsim::engine::{SweepOrder, generate, sequence_len};
use cncsim::types::{Domain, ExecutionState, Recipe, SpindleStatus, Value};
use proptest::prelude::*;

/// Steps that are exact in binary floating point
fn exact_step() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.125), Just(0.25), Just(0.5), Just(1.0), Just(2.0), Just(8.0)]
}

// =============================================================================
// Sequence Generator Property Tests
// =============================================================================

proptest! {
    /// Length matches the number of whole steps that fit before stop
    #[test]
    fn sequence_length_matches_step_count(
        start in -1000i32..1000,
        steps in 0usize..500,
        step in exact_step(),
    ) {
        let start = start as f64;
        let stop = start + steps as f64 * step;
        prop_assert_eq!(sequence_len(start, stop, step).unwrap(), steps);
    }

    /// Ascending values lie in [start, stop), are sorted, and step evenly
    #[test]
    fn ascending_values_are_in_range_and_sorted(
        start in -100.0f64..100.0,
        span in 0.0f64..50.0,
        step in 0.01f64..5.0,
    ) {
        let stop = start + span;
        let values = generate(start, stop, step, SweepOrder::Ascending).unwrap();
        for v in &values {
            prop_assert!(*v >= start && *v < stop, "{} outside [{}, {})", v, start, stop);
        }
        for pair in values.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    /// Decimal bounds and steps never produce stop itself
    #[test]
    fn decimal_ranges_stay_below_stop(
        start in -1000i32..1000,
        span in 1i32..200,
        step in 1i32..20,
    ) {
        let lo = start as f64 / 10.0;
        let hi = (start + span) as f64 / 10.0;
        let step = step as f64 / 10.0;

        let up = generate(lo, hi, step, SweepOrder::Ascending).unwrap();
        prop_assert!(!up.is_empty());
        prop_assert!(up.iter().all(|v| *v >= lo && *v < hi), "{:?} not in [{}, {})", up, lo, hi);

        let down = generate(hi, lo, -step, SweepOrder::Ascending).unwrap();
        prop_assert!(!down.is_empty());
        prop_assert!(down.iter().all(|v| *v > lo && *v <= hi), "{:?} not in ({}, {}]", down, lo, hi);
    }

    /// Descending ranges produce the same multiset, reported ascending
    #[test]
    fn negative_step_sorts_ascending(
        stop in -1000i32..1000,
        steps in 1usize..200,
        step in exact_step(),
    ) {
        let stop = stop as f64;
        let start = stop + steps as f64 * step;
        let values = generate(start, stop, -step, SweepOrder::Ascending).unwrap();
        prop_assert_eq!(values.len(), steps);
        prop_assert_eq!(values[values.len() - 1], start);
        for pair in values.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    /// Shuffling permutes the ascending sequence
    #[test]
    fn shuffle_is_a_permutation(
        start in -100i32..100,
        steps in 0usize..300,
        seed in any::<u64>(),
    ) {
        let start = start as f64;
        let stop = start + steps as f64;
        let ascending = generate(start, stop, 1.0, SweepOrder::Ascending).unwrap();
        let mut shuffled = generate(start, stop, 1.0, SweepOrder::seeded(seed)).unwrap();
        shuffled.sort_by(f64::total_cmp);
        prop_assert_eq!(shuffled, ascending);
    }

    /// The same seed always gives the same order
    #[test]
    fn seeded_shuffle_is_reproducible(steps in 0usize..300, seed in any::<u64>()) {
        let stop = steps as f64;
        let a = generate(0.0, stop, 1.0, SweepOrder::seeded(seed)).unwrap();
        let b = generate(0.0, stop, 1.0, SweepOrder::seeded(seed)).unwrap();
        prop_assert_eq!(a, b);
    }

    /// A step pointing away from stop is always rejected
    #[test]
    fn wrong_direction_is_rejected(
        start in -100.0f64..100.0,
        span in 0.001f64..100.0,
        step in 0.001f64..10.0,
    ) {
        prop_assert!(generate(start, start + span, -step, SweepOrder::Ascending).is_err());
        prop_assert!(generate(start, start - span, step, SweepOrder::Ascending).is_err());
    }
}

// =============================================================================
// Domain Property Tests
// =============================================================================

fn catalogue_domain() -> impl Strategy<Value = Domain> {
    prop_oneof![
        Just(Domain::of::<SpindleStatus>()),
        Just(Domain::of::<ExecutionState>()),
        Just(Domain::of::<Recipe>()),
        Just(Domain::boolean()),
    ]
}

proptest! {
    /// Every member parses back to itself, in any letter case
    #[test]
    fn enumerated_members_parse(domain in catalogue_domain(), upper in any::<bool>()) {
        for member in domain.allowed() {
            let text = if upper {
                member.to_string().to_uppercase()
            } else {
                member.to_string().to_lowercase()
            };
            let parsed = domain.parse_value(&text).unwrap();
            prop_assert_eq!(&parsed, member);
            prop_assert!(domain.admits(&parsed));
        }
    }

    /// Anything outside the member list is refused
    #[test]
    fn enumerated_rejects_non_members(domain in catalogue_domain(), text in "[a-z]{9,16}") {
        let value = Value::Text(text.clone());
        prop_assert!(!domain.admits(&value));
        prop_assert!(domain.check("v", &value).is_err());
        prop_assert!(domain.parse_value(&text).is_err());
    }

    /// Continuous domains refuse non-floats and respect bounds
    #[test]
    fn bounded_domain_admits_only_inside(lo in -100.0f64..0.0, hi in 0.0f64..100.0, v in -200.0f64..200.0) {
        let domain = Domain::bounded(lo, hi);
        prop_assert_eq!(domain.admits(&Value::Float(v)), v >= lo && v <= hi);
        prop_assert!(!domain.admits(&Value::Bool(true)));
        prop_assert!(!domain.admits(&Value::Float(f64::NAN)));
    }
}

// =============================================================================
// Command Parsing Property Tests
// =============================================================================

proptest! {
    /// Numeric arguments survive formatting and parsing
    #[test]
    fn set_for_parses_duration(secs in 0.0f64..10_000.0) {
        let line = format!("set spindle ACTIVE for {}", secs);
        match line.parse::<Command>() {
            Ok(Command::Set { duration, .. }) => prop_assert_eq!(duration, Some(secs)),
            other => prop_assert!(false, "unexpected parse {:?}", other),
        }
    }

    #[test]
    fn sweep_parses_bounds(start in -1e6f64..1e6, stop in -1e6f64..1e6, step in 0.001f64..1e3) {
        let line = format!("sweep c1 {} {} {}", start, stop, step);
        match line.parse::<Command>() {
            Ok(Command::Sweep { start: a, stop: b, step: s, order, .. }) => {
                prop_assert_eq!((a, b, s), (start, stop, step));
                prop_assert_eq!(order, SweepOrder::Ascending);
            }
            other => prop_assert!(false, "unexpected parse {:?}", other),
        }
    }
}
