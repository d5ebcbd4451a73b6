use std::collections::HashMap;

use proptest::prelude::*;

use super::*;
use crate::matcher::{RunStrategy, UnresolvedPolicy};
use crate::ole::doc::fixture::{Mark, word_file};

fn bindings(pairs: &[(&str, &str)]) -> Bindings {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn docx() -> Document {
    Document::new(FileFormat::Docx).unwrap()
}

#[test]
fn test_single_run_labels_resolved() {
    let mut doc = docx();
    doc.add_paragraph("Hello ${name}, today is ${day}");
    let map = bindings(&[("name", "Alice"), ("day", "Monday")]);

    let resolved = doc.substitute_in_paragraph_at(0, &map).unwrap();
    assert_eq!(doc.read_paragraph(0).unwrap(), "Hello Alice, today is Monday");
    assert_eq!(resolved, map);
}

#[test]
fn test_empty_bindings_erase_labels() {
    let mut doc = docx();
    doc.add_paragraph("A${x}B");
    let resolved = doc.substitute_in_paragraph_at(0, &Bindings::new()).unwrap();
    assert_eq!(doc.read_paragraph(0).unwrap(), "AB");
    assert!(resolved.is_empty());
}

#[test]
fn test_label_split_across_runs_untouched() {
    let mut doc = docx();
    let paragraph = doc.add_paragraph("${na");
    paragraph.add_run("me}");

    let resolved = doc.substitute_in_paragraph_at(0, &bindings(&[("name", "X")])).unwrap();
    assert!(resolved.is_empty());
    let runs: Vec<String> = doc.paragraph(0).unwrap().runs().map(Run::text).collect();
    assert_eq!(runs, vec!["${na", "me}"]);
}

#[test]
fn test_split_label_untouched_without_binding_when_preserving() {
    let engine = LabelSubstituter::default().with_unresolved(UnresolvedPolicy::Preserve);
    for map in [Bindings::new(), bindings(&[("other", "O")])] {
        let mut doc = docx();
        doc.add_paragraph("${na").add_run("me}");

        let resolved = engine.substitute_in_all_paragraphs(&mut doc, &map);
        assert!(resolved.is_empty());
        let runs: Vec<String> = doc.paragraph(0).unwrap().runs().map(Run::text).collect();
        assert_eq!(runs, vec!["${na", "me}"]);
    }
}

#[test]
fn test_split_label_with_merge_runs() {
    let mut doc = docx();
    doc.add_paragraph("${na").add_run("me}!");
    let engine = LabelSubstituter::default().with_run_strategy(RunStrategy::MergeRuns);

    let resolved = engine.substitute_in_all_paragraphs(&mut doc, &bindings(&[("name", "X")]));
    assert_eq!(resolved.get("name").map(String::as_str), Some("X"));
    assert_eq!(doc.read_paragraph(0).unwrap(), "X!");
}

#[test]
fn test_table_cell_substitution() {
    let mut doc = docx();
    let table = doc.add_table(2, 2);
    table.cell_mut(0, 0).unwrap().set_text("left");
    table.cell_mut(0, 1).unwrap().set_text("${tbl}");

    let resolved = doc.substitute_in_table_at(0, &bindings(&[("tbl", "T")])).unwrap();
    assert_eq!(resolved, bindings(&[("tbl", "T")]));
    assert_eq!(doc.read_table_cell(0, 0, 1).unwrap(), vec!["T"]);
    assert_eq!(doc.read_table_cell(0, 0, 0).unwrap(), vec!["left"]);
    assert_eq!(doc.read_table_row(0, 1).unwrap(), vec![vec![""], vec![""]]);
}

#[test]
fn test_everywhere_reports_only_resolved_labels() {
    let build = || {
        let mut doc = docx();
        doc.add_paragraph("Dear ${missing}");
        doc.add_table(1, 1).cell_mut(0, 0).unwrap().set_text("${tbl}");
        doc
    };
    let map = bindings(&[("tbl", "T")]);

    let mut erased = build();
    let resolved = erased.substitute_everywhere(&map);
    assert_eq!(resolved, map);
    assert_eq!(erased.read_paragraph(0).unwrap(), "Dear ");
    assert_eq!(erased.read_table_cell(0, 0, 0).unwrap(), vec!["T"]);

    let mut preserved = build();
    let engine = LabelSubstituter::default().with_unresolved(UnresolvedPolicy::Preserve);
    assert_eq!(engine.substitute_everywhere(&mut preserved, &map), map);
    assert_eq!(preserved.read_paragraph(0).unwrap(), "Dear ${missing}");
}

#[test]
fn test_table_paragraphs_are_not_body_paragraphs() {
    let mut doc = docx();
    doc.add_paragraph("${a}");
    doc.add_table(1, 1).cell_mut(0, 0).unwrap().set_text("${a}");

    let resolved = doc.substitute_in_all_paragraphs(&bindings(&[("a", "1")]));
    assert_eq!(resolved.len(), 1);
    assert_eq!(doc.read_paragraphs_to_list(), vec!["1"]);
    assert_eq!(doc.read_table_cell(0, 0, 0).unwrap(), vec!["${a}"]);
}

#[test]
fn test_index_errors() {
    let mut doc = docx();
    doc.add_paragraph("only");
    assert!(matches!(
        doc.read_paragraph(3),
        Err(Error::IndexOutOfRange { what: "paragraph", index: 3, len: 1 })
    ));
    assert!(matches!(doc.table(0), Err(Error::IndexOutOfRange { .. })));
    assert!(doc.substitute_in_table_at(0, &Bindings::new()).is_err());

    doc.add_table(1, 2);
    assert!(doc.read_table_cell(0, 1, 0).is_err());
    assert!(doc.read_table_cell(0, 0, 2).is_err());
}

#[test]
fn test_word_format_required() {
    assert!(matches!(Document::new(FileFormat::Xlsx), Err(Error::InvalidFormat(_))));
    let mut doc = docx();
    assert!(doc.convert(FileFormat::Xls).is_err());
    assert_eq!(doc.format(), FileFormat::Docx);
}

#[test]
fn test_docx_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("letter.docx");

    let mut doc = docx();
    doc.add_paragraph("Dear ${name},");
    doc.add_table(1, 2).cell_mut(0, 1).unwrap().set_text("${total}");
    assert!(matches!(doc.save(), Err(Error::NoSourcePath)));
    doc.save_as(&path).unwrap();

    let mut loaded = Document::open(&path).unwrap();
    assert_eq!(loaded.source(), Some(path.as_path()));
    let resolved = loaded.substitute_everywhere(&bindings(&[("name", "Bob"), ("total", "12")]));
    assert_eq!(resolved.len(), 2);
    loaded.save().unwrap();

    let reread = Document::open(&path).unwrap();
    assert_eq!(reread.read_paragraphs(), "Dear Bob,");
    assert_eq!(reread.read_table(0).unwrap(), vec![vec![vec![""], vec!["12"]]]);
    assert_eq!(reread.to_string(), "docx document: 1 paragraphs, 1 tables");
}

#[test]
fn test_doc_substitute_and_convert() {
    let bytes = word_file(&[
        ("Dear ${name},", Mark::Paragraph),
        ("${item}", Mark::Cell),
        ("", Mark::RowEnd),
    ]);
    let mut doc = Document::from_bytes(&bytes).unwrap();
    assert_eq!(doc.format(), FileFormat::Doc);
    assert!(matches!(doc.to_bytes(), Err(Error::Unsupported(_))));

    let resolved = doc.substitute_everywhere(&bindings(&[("name", "Ann"), ("item", "pen")]));
    assert_eq!(resolved.len(), 2);

    doc.convert(FileFormat::Docx).unwrap();
    let converted = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    assert_eq!(converted.format(), FileFormat::Docx);
    assert_eq!(converted.read_paragraphs_to_list(), vec!["Dear Ann,"]);
    assert_eq!(converted.read_table_cell(0, 0, 0).unwrap(), vec!["pen"]);
}

#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Label(&'static str),
}

fn piece_strategy() -> impl Strategy<Value = Piece> {
    prop_oneof![
        "[a-zA-Z ,.]{0,8}".prop_map(Piece::Text),
        prop::sample::select(vec!["a", "b", "unbound"]).prop_map(Piece::Label),
    ]
}

fn render(pieces: &[Piece], values: &HashMap<&str, &str>, keep_unbound: bool) -> (String, String) {
    let mut source = String::new();
    let mut expected = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(t) => {
                source.push_str(t);
                expected.push_str(t);
            },
            Piece::Label(key) => {
                let label = format!("${{{}}}", key);
                match values.get(key) {
                    Some(value) => expected.push_str(value),
                    None if keep_unbound => expected.push_str(&label),
                    None => {},
                }
                source.push_str(&label);
            },
        }
    }
    (source, expected)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_text_without_labels_is_untouched(text in "[a-zA-Z0-9 ,.{}]{0,40}") {
        let mut doc = docx();
        doc.add_paragraph(&text);
        let resolved = doc.substitute_everywhere(&bindings(&[("a", "1")]));
        prop_assert!(resolved.is_empty());
        prop_assert_eq!(doc.read_paragraph(0).unwrap(), text);
    }

    #[test]
    fn prop_substitution_is_idempotent(pieces in prop::collection::vec(piece_strategy(), 0..8)) {
        let values = HashMap::from([("a", "1"), ("b", "two words")]);
        let (source, expected) = render(&pieces, &values, false);
        let map = bindings(&[("a", "1"), ("b", "two words")]);

        let mut doc = docx();
        doc.add_paragraph(&source);
        doc.substitute_everywhere(&map);
        prop_assert_eq!(doc.read_paragraph(0).unwrap(), expected.clone());

        let again = doc.substitute_everywhere(&map);
        prop_assert!(again.is_empty());
        prop_assert_eq!(doc.read_paragraph(0).unwrap(), expected);
    }

    #[test]
    fn prop_preserving_substitution_is_idempotent(pieces in prop::collection::vec(piece_strategy(), 0..8)) {
        let values = HashMap::from([("a", "1"), ("b", "two words")]);
        let (source, expected) = render(&pieces, &values, true);
        let map = bindings(&[("a", "1"), ("b", "two words")]);
        let engine = LabelSubstituter::default().with_unresolved(UnresolvedPolicy::Preserve);

        let mut doc = docx();
        doc.add_paragraph(&source);
        engine.substitute_everywhere(&mut doc, &map);
        prop_assert_eq!(doc.read_paragraph(0).unwrap(), expected.clone());

        let again = engine.substitute_everywhere(&mut doc, &map);
        prop_assert!(again.is_empty());
        prop_assert_eq!(doc.read_paragraph(0).unwrap(), expected);
    }
}
