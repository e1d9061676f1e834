//! Name and number trees: node shape, key order and Limits across levels.

mod common;

use common::GrammarFolder;
use pdf_grammar::diagnostics::{Diagnostic, DiagnosticKind};
use pdf_grammar::objects::{Dictionary, Object, ObjectId, ObjectStore};
use pdf_grammar::validator::{GraphValidator, RunStats};
use pretty_assertions::assert_eq;

fn text(s: &str) -> Object {
    Object::String(s.to_string())
}

fn dest(page: i64) -> Object {
    Object::Dictionary(Dictionary::new().with("D", vec![Object::Integer(page)]))
}

fn limits(low: &str, high: &str) -> Object {
    vec![text(low), text(high)].into()
}

fn dests_grammar() -> GrammarFolder {
    GrammarFolder::new()
        .table("Catalog", &["Dests|NAME-TREE|||FALSE||||||[Dest]"])
        .table("Dest", &["D|ARRAY|||TRUE"])
}

fn run(folder: &GrammarFolder, store: &ObjectStore, catalog: Dictionary) -> (Vec<Diagnostic>, RunStats) {
    let cache = folder.cache();
    let root = Object::Dictionary(catalog);
    let mut validator = GraphValidator::new(store, &cache);
    validator.add_work_item(&root, "Catalog", "Root");
    let mut diagnostics = Vec::new();
    let stats = validator.run(&mut diagnostics).expect("run completes");
    (diagnostics, stats)
}

fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
    diagnostics.iter().map(|d| d.kind).collect()
}

#[test]
fn test_well_formed_name_tree() {
    let folder = dests_grammar();
    let mut store = ObjectStore::new();
    let left = store.add(
        Dictionary::new()
            .with("Limits", limits("a", "b"))
            .with("Names", vec![text("a"), dest(1), text("b"), dest(2)]),
    );
    let right = store.add(
        Dictionary::new()
            .with("Limits", limits("c", "d"))
            .with("Names", vec![text("c"), dest(3), text("d"), dest(4)]),
    );
    let tree = Dictionary::new().with("Kids", vec![Object::Reference(left), Object::Reference(right)]);

    let (diagnostics, stats) = run(&folder, &store, Dictionary::new().with("Dests", tree));
    assert!(diagnostics.is_empty(), "{diagnostics:#?}");
    // Catalog plus four destinations
    assert_eq!(stats.checked, 5);
}

#[test]
fn test_limits_outside_parent_is_one_violation() {
    let folder = dests_grammar();
    let mut store = ObjectStore::new();
    let leaf = store.add(
        Dictionary::new()
            .with("Limits", limits("a", "z"))
            .with("Names", vec![text("a"), dest(1), text("b"), dest(2)]),
    );
    let middle = store.add(
        Dictionary::new()
            .with("Limits", limits("a", "c"))
            .with("Kids", vec![Object::Reference(leaf)]),
    );
    let sibling = store.add(
        Dictionary::new()
            .with("Limits", limits("d", "f"))
            .with("Names", vec![text("d"), dest(3), text("e"), dest(4)]),
    );
    let tree = Dictionary::new().with(
        "Kids",
        vec![Object::Reference(middle), Object::Reference(sibling)],
    );

    let (diagnostics, _) = run(&folder, &store, Dictionary::new().with("Dests", tree));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::LimitsViolation]);
    assert_eq!(diagnostics[0].link, "NameTree<Dest>");
    assert_eq!(diagnostics[0].context, "Root/Dests/Kids[0]/Kids[0]");
    assert!(diagnostics[0].message.contains("outside parent Limits"));
}

#[test]
fn test_entries_outside_own_limits() {
    let folder = dests_grammar();
    let mut store = ObjectStore::new();
    let leaf = store.add(
        Dictionary::new()
            .with("Limits", limits("a", "b"))
            .with("Names", vec![text("a"), dest(1), text("q"), dest(2)]),
    );
    let tree = Dictionary::new().with("Kids", vec![Object::Reference(leaf)]);

    let (diagnostics, _) = run(&folder, &store, Dictionary::new().with("Dests", tree));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::LimitsViolation]);
    assert_eq!(diagnostics[0].message, "entries fall outside Limits [(a) (b)]");
}

#[test]
fn test_missing_limits_on_intermediate_node() {
    let folder = dests_grammar();
    let mut store = ObjectStore::new();
    let leaf = store.add(Dictionary::new().with("Names", vec![text("a"), dest(1)]));
    let tree = Dictionary::new()
        .with("Limits", Object::Integer(3))
        .with("Kids", vec![Object::Reference(leaf)]);

    // The root's own Limits are never checked, even when they are nonsense
    let (diagnostics, _) = run(&folder, &store, Dictionary::new().with("Dests", tree));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::LimitsViolation]);
    assert_eq!(diagnostics[0].message, "node has no Limits");
    assert_eq!(diagnostics[0].context, "Root/Dests/Kids[0]");
}

#[test]
fn test_malformed_entries() {
    let folder = dests_grammar();
    let store = ObjectStore::new();
    let tree = Dictionary::new().with(
        "Names",
        vec![
            text("a"),
            Object::Integer(5),
            Object::Name("b".into()),
            dest(1),
            text("c"),
        ],
    );

    let (diagnostics, _) = run(&folder, &store, Dictionary::new().with("Dests", tree));
    assert_eq!(
        kinds(&diagnostics),
        vec![
            DiagnosticKind::MalformedContainer,
            DiagnosticKind::TypeMismatch,
            DiagnosticKind::MalformedContainer,
        ]
    );
    assert_eq!(diagnostics[0].message, "Names has an odd number of elements (5)");
    assert_eq!(diagnostics[1].context, "Root/Dests[(a)]");
    assert_eq!(diagnostics[2].message, "Names[2] is not a valid string key");
}

#[test]
fn test_kids_must_be_an_array_of_nodes() {
    let folder = dests_grammar();
    let store = ObjectStore::new();
    let bad_kids = Dictionary::new().with("Kids", Dictionary::new());
    let (diagnostics, _) = run(&folder, &store, Dictionary::new().with("Dests", bad_kids));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::MalformedContainer]);
    assert_eq!(diagnostics[0].message, "Kids is a dictionary, expected an array");

    let dangling = Dictionary::new().with("Kids", vec![Object::Reference(ObjectId::new(40, 0))]);
    let (diagnostics, _) = run(&folder, &store, Dictionary::new().with("Dests", dangling));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::MalformedContainer]);
    assert_eq!(diagnostics[0].context, "Root/Dests/Kids[0]");
}

#[test]
fn test_mixed_node_processes_both_sides() {
    let folder = dests_grammar();
    let mut store = ObjectStore::new();
    let kid = store.add(
        Dictionary::new()
            .with("Limits", limits("m", "n"))
            .with("Names", vec![text("m"), dest(2)]),
    );
    let tree = Dictionary::new()
        .with("Names", vec![text("a"), dest(1)])
        .with("Kids", vec![Object::Reference(kid)]);

    let (diagnostics, stats) = run(&folder, &store, Dictionary::new().with("Dests", tree));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::MixedContainerNode]);
    assert_eq!(diagnostics[0].context, "Root/Dests");
    assert_eq!(stats.checked, 3);
}

#[test]
fn test_cyclic_tree_terminates() {
    let folder = dests_grammar();
    let mut store = ObjectStore::new();
    let root = ObjectId::new(1, 0);
    let kid = ObjectId::new(2, 0);
    store.insert(root, Dictionary::new().with("Kids", vec![Object::Reference(kid)]));
    store.insert(
        kid,
        Dictionary::new()
            .with("Limits", limits("a", "a"))
            .with("Names", vec![text("a"), dest(1)])
            .with("Kids", vec![Object::Reference(root)]),
    );

    let (diagnostics, stats) = run(&folder, &store, Dictionary::new().with("Dests", root));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::MixedContainerNode]);
    assert_eq!(stats.checked, 2);
    assert!(stats.suppressed >= 1);
}

#[test]
fn test_number_tree_order_and_values() {
    let folder = GrammarFolder::new()
        .table("Catalog", &["PageLabels|NUMBER-TREE|||FALSE||||||[PageLabel]"])
        .table(
            "PageLabel",
            &["S|NAME|||FALSE||||[D,R,r,A,a]", "St|INTEGER|||FALSE||||[>=1]"],
        );
    let store = ObjectStore::new();
    let label = |style: &str| Object::Dictionary(Dictionary::new().with("S", Object::Name(style.into())));
    let tree = Dictionary::new().with(
        "Nums",
        vec![
            Object::Integer(4),
            label("r"),
            Object::Integer(0),
            label("X"),
        ],
    );

    let (diagnostics, _) = run(&folder, &store, Dictionary::new().with("PageLabels", tree));
    assert_eq!(
        kinds(&diagnostics),
        vec![
            DiagnosticKind::MalformedContainer,
            DiagnosticKind::PossibleValueViolation,
        ]
    );
    assert_eq!(diagnostics[0].link, "NumberTree<PageLabel>");
    assert_eq!(diagnostics[0].message, "Nums keys are not sorted at 0");
    assert_eq!(diagnostics[1].link, "PageLabel");
    assert_eq!(diagnostics[1].key.as_deref(), Some("S"));
    assert_eq!(diagnostics[1].context, "Root/PageLabels[0]");
}

#[test]
fn test_number_tree_rejects_string_keys() {
    let folder = GrammarFolder::new()
        .table("Catalog", &["PageLabels|NUMBER-TREE|||FALSE||||||[PageLabel]"])
        .table("PageLabel", &["S|NAME|||FALSE"]);
    let store = ObjectStore::new();
    let tree = Dictionary::new().with("Nums", vec![text("0"), Dictionary::new().into()]);

    let (diagnostics, _) = run(&folder, &store, Dictionary::new().with("PageLabels", tree));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::MalformedContainer]);
    assert_eq!(diagnostics[0].message, "Nums[0] is not a valid integer key");
}
