//! End-to-end formula evaluation through `Sheet`

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tabula::prelude::*;
use tabula::SENTINEL;

fn kind(value: &Value) -> Option<ErrorKind> {
    value.get_error().map(|e| e.kind)
}

/// A1=5, A2=10 on a 10×5 sheet
fn sheet() -> Sheet {
    let mut sheet = Sheet::new(10, 5).unwrap();
    sheet.set("A1", "5").unwrap();
    sheet.set("A2", "10").unwrap();
    sheet
}

#[test]
fn test_precedence() {
    let mut sheet = sheet();
    sheet.set("A3", "=A1+A2*2").unwrap();
    assert_eq!(sheet.display("A3").unwrap(), "25");
}

#[test]
fn test_functions() {
    let mut sheet = sheet();
    sheet.set("B1", "=sum(A1;A2)").unwrap();
    sheet.set("B2", "=avg(A1;A2;A3)").unwrap();
    sheet.set("B3", "=count(A1;A2;A3)").unwrap();
    sheet.set("B4", "=if(A1<A2;\"yes\";\"no\")").unwrap();
    sheet.set("B5", "=countif(A1;A2;>4)").unwrap();
    sheet.set("B6", "=max(A1;A2)-min(A1;A2)").unwrap();

    let shown: Vec<_> = (1..=6)
        .map(|row| sheet.display(&format!("B{}", row)).unwrap())
        .collect();
    assert_eq!(shown, vec!["15", "5", "2", "yes", "2", "5"]);
}

#[test]
fn test_phrase_literals_and_overflow() {
    let mut sheet = sheet();
    sheet.set("B1", "=Hello, world").unwrap();
    sheet.set("B2", "=if(A1<A2;yes please;no)").unwrap();
    sheet.set("B3", format!("=sum({0};{0})", "9".repeat(308))).unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "Hello, world");
    assert_eq!(sheet.display("B2").unwrap(), "yes please");
    assert_eq!(sheet.display("B3").unwrap(), SENTINEL);
    assert_eq!(kind(&sheet.value("B3").unwrap()), Some(ErrorKind::InvalidNumber));
}

#[test]
fn test_invalid_formulas_are_shown_verbatim() {
    let mut sheet = sheet();
    sheet.set("C1", "=(1+2").unwrap();
    sheet.set("C2", "=1+2)").unwrap();
    assert_eq!(sheet.display("C1").unwrap(), "=(1+2");
    assert_eq!(sheet.display("C2").unwrap(), "=1+2)");
}

#[test]
fn test_failures_show_the_sentinel() {
    let mut sheet = sheet();
    for (cell, formula, expected) in [
        ("C1", "=A9+1", ErrorKind::InvalidReference),
        ("C2", "=1.2.3", ErrorKind::InvalidNumber),
        ("C3", "=nope(1)", ErrorKind::InvalidFunction),
        ("C4", "=1/0", ErrorKind::DivisionByZero),
        ("C5", "=Other:A1", ErrorKind::ExternalLookupFailure),
        ("C6", "=if(A1>A2;1)", ErrorKind::InvalidSyntax),
        ("C7", "=C7", ErrorKind::CircularReference),
    ] {
        sheet.set(cell, formula).unwrap();
        assert_eq!(sheet.display(cell).unwrap(), SENTINEL, "{}", formula);
        assert_eq!(kind(&sheet.value(cell).unwrap()), Some(expected), "{}", formula);
    }
}

#[test]
fn test_errors_propagate_through_references() {
    let mut sheet = sheet();
    sheet.set("B1", "=1/0").unwrap();
    sheet.set("B2", "=B1*2").unwrap();
    sheet.set("B3", "=sum(B2;A1)").unwrap();
    assert_eq!(kind(&sheet.value("B3").unwrap()), Some(ErrorKind::DivisionByZero));
}

#[test]
fn test_diagnostics_name_the_cause() {
    let sink = CollectingSink::new();
    let mut sheet = sheet().with_diagnostics(sink.clone());
    sheet.set("B1", "=A1+A7").unwrap();
    sheet.set("B2", "=B1").unwrap();

    sheet.display("B2").unwrap();
    assert_eq!(
        sink.messages(),
        vec!["invalid reference: A7 is empty", "invalid cell data: B1"]
    );

    // Served from the cache: nothing is reported again
    sink.clear();
    sheet.display("B2").unwrap();
    assert!(sink.messages().is_empty());
}

/// Links that record every batch they receive
#[derive(Clone, Default)]
struct RecordingLinks {
    batches: Rc<RefCell<Vec<Vec<String>>>>,
}

impl LinkResolver for RecordingLinks {
    fn resolve(&self, refs: &BTreeSet<TableRef>) -> HashMap<TableRef, String> {
        self.batches
            .borrow_mut()
            .push(refs.iter().map(|r| r.to_string()).collect());
        refs.iter()
            .filter(|r| r.table != "Locked")
            .map(|r| (r.clone(), "2".to_string()))
            .collect()
    }
}

#[test]
fn test_table_lookups_are_batched_per_formula() {
    let links = RecordingLinks::default();
    let mut sheet = sheet().with_links(links.clone());
    sheet.set("B1", "=Sales:A1*Sales:A2+Costs:A1+Sales:A1").unwrap();

    assert_eq!(sheet.display("B1").unwrap(), "8");
    assert_eq!(
        *links.batches.borrow(),
        vec![vec!["Costs:A1", "Sales:A1", "Sales:A2"]]
    );

    sheet.set("B2", "=Locked:A1+1").unwrap();
    assert_eq!(
        kind(&sheet.value("B2").unwrap()),
        Some(ErrorKind::ExternalLookupFailure)
    );
}

#[test]
fn test_table_values_are_fetched_again() {
    let links = RecordingLinks::default();
    let mut sheet = sheet().with_links(links.clone());
    sheet.set("B1", "=Sales:A1+A1").unwrap();

    sheet.display("B1").unwrap();
    sheet.display("B1").unwrap();
    assert_eq!(links.batches.borrow().len(), 2);
}

#[test]
fn test_recalculation_after_edits() {
    let mut sheet = sheet();
    sheet.set("B1", "=A1*2").unwrap();
    sheet.set("C1", "=B1+A2").unwrap();
    sheet.set("D1", "=C1+B1").unwrap();
    assert_eq!(sheet.display("D1").unwrap(), "30");

    sheet.set("A1", "1").unwrap();
    assert_eq!(sheet.display("D1").unwrap(), "14");

    sheet.set("A2", "").unwrap();
    assert_eq!(sheet.display("D1").unwrap(), SENTINEL);

    sheet.set("A2", "0").unwrap();
    assert_eq!(sheet.display("D1").unwrap(), "4");
}

#[test]
fn test_cycle_recovers_after_edit() {
    let mut sheet = sheet();
    sheet.set("B1", "=B2+1").unwrap();
    sheet.set("B2", "=B3+1").unwrap();
    sheet.set("B3", "=B1+1").unwrap();
    assert_eq!(kind(&sheet.value("B1").unwrap()), Some(ErrorKind::CircularReference));

    sheet.set("B3", "1").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "3");
}

#[test]
fn test_display_grid() {
    let mut sheet = Sheet::new(2, 2).unwrap();
    sheet.set("A1", "2").unwrap();
    sheet.set("B1", "=A1*A1").unwrap();
    sheet.set("A2", "label").unwrap();
    assert_eq!(
        sheet.display_grid(),
        vec![vec!["2", "4"], vec!["label", ""]]
    );
}

#[test]
fn test_grid_bounds() {
    assert!(Sheet::new(1, 26).is_ok());
    assert!(Sheet::new(1, 27).is_err());
    assert!(Sheet::new(0, 1).is_err());
}
