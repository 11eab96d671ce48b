use super::*;

fn read_csv(input: &str) -> Table {
    Table::from_reader(input.as_bytes(), TableFormat::Csv).unwrap()
}

// -----------------------------------------------------------------------
// Cell coercion
// -----------------------------------------------------------------------

#[test]
fn coerce_blank_and_na_tokens_to_null() {
    for raw in ["", "   ", "NaN", "nan", "N/A", "NULL", "None", "<NA>"] {
        assert_eq!(Cell::coerce(raw), Cell::Null, "raw {raw:?}");
    }
}

#[test]
fn coerce_numbers() {
    assert_eq!(Cell::coerce("42"), Cell::Int(42));
    assert_eq!(Cell::coerce(" -7 "), Cell::Int(-7));
    assert_eq!(Cell::coerce("3.5"), Cell::Float(3.5));
}

#[test]
fn coerce_infinite_float_stays_text() {
    assert_eq!(Cell::coerce("inf"), Cell::Text("inf".to_string()));
}

#[test]
fn coerce_text_is_trimmed() {
    assert_eq!(
        Cell::coerce("  great service "),
        Cell::Text("great service".to_string())
    );
}

#[test]
fn numeric_detection_covers_numeric_text() {
    assert!(Cell::Int(1).is_numeric());
    assert!(Cell::Float(0.5).is_numeric());
    assert!(Cell::Text("12.5".to_string()).is_numeric());
    assert!(!Cell::Text("twelve".to_string()).is_numeric());
    assert!(!Cell::Null.is_numeric());
}

#[test]
fn as_text_renders_whole_floats_with_decimal() {
    assert_eq!(Cell::Float(2.0).as_text().as_deref(), Some("2.0"));
    assert_eq!(Cell::Float(2.25).as_text().as_deref(), Some("2.25"));
    assert_eq!(Cell::Int(9).as_text().as_deref(), Some("9"));
    assert_eq!(Cell::Null.as_text(), None);
}

#[test]
fn cell_serializes_untagged() {
    let cells = vec![
        Cell::Null,
        Cell::Int(3),
        Cell::Text("ok".to_string()),
    ];
    let json = serde_json::to_string(&cells).unwrap();
    assert_eq!(json, r#"[null,3,"ok"]"#);
}

// -----------------------------------------------------------------------
// Reading
// -----------------------------------------------------------------------

#[test]
fn reads_headers_and_rows() {
    let table = read_csv("id,comment,score\n1,Great product,5\n2,,3\n");
    assert_eq!(table.column_names(), vec!["id", "comment", "score"]);
    assert_eq!(table.n_rows(), 2);
    let comment = table.column("comment").unwrap();
    assert_eq!(comment.cells[0], Cell::Text("Great product".to_string()));
    assert_eq!(comment.cells[1], Cell::Null);
}

#[test]
fn ragged_rows_are_padded_with_null() {
    let table = read_csv("a,b,c\n1,2\n4,5,6\n");
    assert_eq!(table.n_rows(), 2);
    assert_eq!(table.column("c").unwrap().cells[0], Cell::Null);
    assert_eq!(table.column("c").unwrap().cells[1], Cell::Int(6));
}

#[test]
fn duplicate_headers_are_disambiguated() {
    let table = read_csv("note,note,note\nx,y,z\n");
    assert_eq!(table.column_names(), vec!["note", "note.1", "note.2"]);
}

#[test]
fn reads_tab_separated_input() {
    let table =
        Table::from_reader("comment\tlabel\nfine, thanks\tpositive\n".as_bytes(), TableFormat::Tsv)
            .unwrap();
    assert_eq!(
        table.column("comment").unwrap().cells[0],
        Cell::Text("fine, thanks".to_string())
    );
}

#[test]
fn header_only_input_yields_empty_table() {
    let table = read_csv("id,comment\n");
    assert_eq!(table.n_rows(), 0);
    assert_eq!(table.columns().len(), 2);
}

#[test]
fn from_path_detects_format_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.TSV");
    std::fs::write(&path, "text\tlabel\nok\tneutral\n").unwrap();
    let table = Table::from_path(&path).unwrap();
    assert_eq!(table.column_names(), vec!["text", "label"]);
}

#[test]
fn from_path_rejects_spreadsheets() {
    let err = Table::from_path(Path::new("upload.xlsx")).unwrap_err();
    assert!(matches!(err, TableError::UnsupportedFormat(_)));
}

// -----------------------------------------------------------------------
// Format detection
// -----------------------------------------------------------------------

#[test]
fn detect_uses_content_type_when_extension_is_unknown() {
    assert_eq!(
        TableFormat::detect("upload", Some("text/csv")).unwrap(),
        TableFormat::Csv
    );
    assert_eq!(
        TableFormat::detect("upload", Some("text/tab-separated-values")).unwrap(),
        TableFormat::Tsv
    );
}

#[test]
fn detect_rejects_excel_content_type() {
    let err = TableFormat::detect(
        "upload.bin",
        Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    )
    .unwrap_err();
    assert!(matches!(err, TableError::UnsupportedFormat(ref d) if d.contains("spreadsheetml")));
}

// -----------------------------------------------------------------------
// Construction and concatenation
// -----------------------------------------------------------------------

#[test]
fn new_pads_short_columns() {
    let table = Table::new(vec![
        Column::new("a", vec![Cell::Int(1), Cell::Int(2)]),
        Column::new("b", vec![Cell::Int(3)]),
    ]);
    assert_eq!(table.n_rows(), 2);
    assert_eq!(table.column("b").unwrap().cells, vec![Cell::Int(3), Cell::Null]);
}

#[test]
fn concat_aligns_columns_by_name() {
    let first = read_csv("comment,label\nnice,pos\n");
    let second = read_csv("label,extra\nneg,x\n");
    let merged = Table::concat(&[first, second]);
    assert_eq!(merged.column_names(), vec!["comment", "label", "extra"]);
    assert_eq!(merged.n_rows(), 2);
    assert_eq!(merged.column("comment").unwrap().cells[1], Cell::Null);
    assert_eq!(
        merged.column("label").unwrap().cells,
        vec![Cell::Text("pos".to_string()), Cell::Text("neg".to_string())]
    );
    assert_eq!(merged.column("extra").unwrap().cells[0], Cell::Null);
}

#[test]
fn non_null_skips_missing_cells() {
    let column = Column::new("c", vec![Cell::Null, Cell::Int(1), Cell::Null]);
    assert_eq!(column.non_null().count(), 1);
}
