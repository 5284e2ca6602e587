use cslens::indexer::workspace::ScanOptions;
use cslens::indexer::{IndexOptions, Indexer};
use cslens::{ChangeApplier, EditRequest, ErrorKind};
use std::fs;
use tempfile::TempDir;

const CART: &str = "namespace Shop
{
    public class Cart
    {
        public void Add(int qty)
        {
            count += qty;
        }

        private int count;
    }
}
";

const ADD_ORIGINAL: &str = "public void Add(int qty)
        {
            count += qty;
        }";

fn setup(contents: &str) -> (TempDir, ChangeApplier) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Cart.cs"), contents).unwrap();
    let applier = ChangeApplier::new(dir.path()).unwrap();
    (dir, applier)
}

fn read(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join("Cart.cs")).unwrap()
}

#[test]
fn method_is_swapped_and_reindented() {
    let (dir, mut applier) = setup(CART);
    let request = EditRequest::method(
        "Cart.cs",
        ADD_ORIGINAL,
        "public void Add(int qty)\n{\n    count += qty * 2;\n}",
    );
    let outcomes = applier.apply_changes(&[request]).unwrap();
    assert!(outcomes[0].is_applied(), "{outcomes:?}");

    let expected = "namespace Shop
{
    public class Cart
    {
        public void Add(int qty)
        {
            count += qty * 2;
        }

        private int count;
    }
}
";
    assert_eq!(read(&dir), expected);
}

#[test]
fn original_text_is_compared_trimmed() {
    let (dir, mut applier) = setup(CART);
    let padded = format!("\n\n   {ADD_ORIGINAL}   \n");
    let outcomes = applier
        .apply_changes(&[EditRequest::method(
            "Cart.cs",
            &padded,
            "public void Add(int qty) => count -= qty;",
        )])
        .unwrap();
    assert!(outcomes[0].is_applied());
    let after = read(&dir);
    assert!(after.contains("        public void Add(int qty) => count -= qty;\n"));
    assert!(!after.contains("count += qty;"));
}

#[test]
fn missing_method_leaves_file_byte_identical() {
    let (dir, mut applier) = setup(CART);
    let outcomes = applier
        .apply_changes(&[EditRequest::method(
            "Cart.cs",
            "public void Remove(int qty) { }",
            "public void Remove(int qty) { count -= qty; }",
        )])
        .unwrap();
    assert_eq!(outcomes[0].error_kind(), Some(ErrorKind::NotFound));
    assert_eq!(read(&dir), CART);
}

#[test]
fn invalid_replacements_are_rejected() {
    let (dir, mut applier) = setup(CART);
    let outcomes = applier
        .apply_changes(&[
            EditRequest::method("Cart.cs", ADD_ORIGINAL, "public void Add(int qty) {"),
            EditRequest::method("Cart.cs", ADD_ORIGINAL, "void A() {} void B() {}"),
            EditRequest::class("Cart.cs", "private int count;", "int count;"),
        ])
        .unwrap();
    for outcome in &outcomes {
        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidReplacement));
    }
    assert_eq!(read(&dir), CART);
}

#[test]
fn blank_original_code_is_an_invalid_request() {
    let (dir, mut applier) = setup(CART);
    let outcomes = applier
        .apply_changes(&[EditRequest::method("Cart.cs", "  ", "void A() {}")])
        .unwrap();
    assert_eq!(outcomes[0].error_kind(), Some(ErrorKind::InvalidRequest));
    assert_eq!(read(&dir), CART);
}

#[test]
fn class_is_replaced_whole() {
    let source = "namespace Shop\n{\n    class Old { }\n\n    class Keep { }\n}\n";
    let (dir, mut applier) = setup(source);
    let outcomes = applier
        .apply_changes(&[EditRequest::class(
            "Cart.cs",
            "class Old { }",
            "class New\n{\n    int value;\n}",
        )])
        .unwrap();
    assert!(outcomes[0].is_applied());
    assert_eq!(
        read(&dir),
        "namespace Shop\n{\n    class New\n    {\n        int value;\n    }\n\n    class Keep { }\n}\n"
    );
}

#[test]
fn declaration_id_from_the_index_picks_the_duplicate() {
    let source = "class First\n{\n    void Reset() { }\n}\n\nclass Second\n{\n    void Reset() { }\n}\n";
    let (dir, mut applier) = setup(source);
    let options = IndexOptions {
        interest: String::new(),
        scan: ScanOptions {
            no_ignore: true,
            exclude_segments: Vec::new(),
            max_file_bytes: 1024 * 1024,
        },
        threads: 0,
    };
    let index = Indexer::new(dir.path(), options).run().unwrap();
    let target = index.types_named("Second")[0].methods[0].id.clone();

    let request =
        EditRequest::method("Cart.cs", "void Reset() { }", "void Reset() { Clear(); }")
            .with_target(&target);
    let outcomes = applier.apply_changes(&[request]).unwrap();
    assert!(outcomes[0].is_applied());
    assert_eq!(
        read(&dir),
        "class First\n{\n    void Reset() { }\n}\n\nclass Second\n{\n    void Reset() { Clear(); }\n}\n"
    );
}

#[test]
fn stale_declaration_id_falls_back_to_text() {
    let (dir, mut applier) = setup(CART);
    let request = EditRequest::method("Cart.cs", ADD_ORIGINAL, "public void Add(int qty) { }")
        .with_target("decl_0000000000000000");
    let outcomes = applier.apply_changes(&[request]).unwrap();
    assert!(outcomes[0].is_applied());
    assert!(read(&dir).contains("        public void Add(int qty) { }\n"));
}
