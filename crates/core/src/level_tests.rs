// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::strategies::arb_level;
use proptest::prelude::*;

fn level(s: &str) -> Level {
    s.parse().unwrap()
}

#[yare::parameterized(
    top        = { "3",      &[3] },
    nested     = { "2.1",    &[2, 1] },
    deep       = { "1.4.12", &[1, 4, 12] },
)]
fn parse_components(input: &str, expected: &[u32]) {
    assert_eq!(level(input).components(), expected);
}

#[yare::parameterized(
    empty          = { "" },
    trailing_dot   = { "1." },
    leading_dot    = { ".1" },
    zero           = { "1.0" },
    not_a_number   = { "1.a" },
    negative       = { "-1" },
)]
fn parse_rejects(input: &str) {
    assert!(input.parse::<Level>().is_err());
}

#[yare::parameterized(
    numeric_not_lexical = { "2.9",   "2.10" },
    parent_before_child = { "2",     "2.1" },
    child_before_uncle  = { "2.5",   "3" },
    siblings            = { "1.1",   "1.2" },
    deep_before_next    = { "1.9.9", "1.10" },
)]
fn ordering(lower: &str, higher: &str) {
    assert!(level(lower) < level(higher), "{lower} should sort before {higher}");
}

#[test]
fn child_extends_parent() {
    let parent = Level::top(2);
    let child = parent.child(3);
    assert_eq!(child.to_string(), "2.3");
    assert_eq!(child.components(), &[2, 3]);
    assert_eq!(child.depth(), 2);
    assert_eq!(parent.depth(), 1);
}

#[test]
fn serde_as_dotted_string() {
    let json = serde_json::to_string(&level("3.2.1")).unwrap();
    assert_eq!(json, "\"3.2.1\"");
    let parsed: Level = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, level("3.2.1"));
}

proptest! {
    #[test]
    fn display_parses_back(l in arb_level()) {
        prop_assert_eq!(l.to_string().parse::<Level>().unwrap(), l);
    }

    #[test]
    fn child_sorts_after_parent_and_before_next_sibling(l in arb_level(), pos in 1u32..50) {
        let child = l.child(pos);
        prop_assert!(l < child);
        let mut next = l.components().to_vec();
        if let Some(last) = next.last_mut() {
            *last += 1;
        }
        let next = Level(next);
        prop_assert!(child < next);
    }
}
