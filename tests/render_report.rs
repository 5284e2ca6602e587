use cslens::indexer::workspace::ScanOptions;
use cslens::indexer::{IndexOptions, Indexer};
use cslens::CodebaseIndex;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ORDERS: &str = r#"namespace Shop;

[Serializable]
public class Order : IEntity
{
    public int Id { get; set; }
    private decimal total, tax;
    public event EventHandler Changed;

    public void Save() { Validate(); }

    private void Validate() { }
}

public interface IEntity
{
    int Id { get; }
}
"#;

fn index(interest: &str) -> CodebaseIndex {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("Shop");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("Shop.csproj"), "<Project />").unwrap();
    fs::write(project.join("Orders.cs"), ORDERS).unwrap();
    fs::write(project.join("Status.cs"), "namespace Shop { enum Status { Open, Closed } }").unwrap();
    let options = IndexOptions {
        interest: interest.to_string(),
        scan: ScanOptions {
            no_ignore: true,
            exclude_segments: vec!["obj".to_string()],
            max_file_bytes: 1024 * 1024,
        },
        threads: 0,
    };
    Indexer::new(Path::new(dir.path()), options).run().unwrap()
}

#[test]
fn report_lists_structure_in_declaration_order() {
    let expected = concat!(
        "Project: Shop\n",
        "  Class: Order\n",
        "    Inherits/Implements: IEntity\n",
        "    Properties:\n",
        "      - Id\n",
        "    Fields:\n",
        "      - total\n",
        "      - tax\n",
        "    Events:\n",
        "      - Changed\n",
        "    Attributes:\n",
        "      - SerializableAttribute\n",
        "    Class Dependencies:\n",
        "      - Shop.IEntity\n",
        "    Methods: \n",
        "    - Save\n",
        "      Method Dependencies:\n",
        "        - Validate\n",
        "    - Validate\n",
        "\n",
        "  Interface: IEntity\n",
        "    Properties:\n",
        "      - Id\n",
        "\n",
        "  Enum: Status\n",
        "    Fields:\n",
        "      - Open\n",
        "      - Closed\n",
        "\n",
    );
    assert_eq!(index("").render(), expected);
}

#[test]
fn captured_text_replaces_structure() {
    let report = index("look at Validate and Status").to_string();
    assert!(report.contains("    - Save\n      Method Dependencies:\n        - Validate\nprivate void Validate() { }\n\n"));
    assert!(report.ends_with("enum Status { Open, Closed }\n"));
    assert!(!report.contains("Enum: Status"));
}

#[test]
fn json_report_carries_ids_and_edges() {
    let index = index("");
    let value = serde_json::to_value(index.to_report()).unwrap();
    let order = &value["projects"][0]["types"][0];
    assert_eq!(order["name"], "Order");
    assert_eq!(order["kind"], "class");
    assert!(order["id"].as_str().unwrap().starts_with("decl_"));
    assert_eq!(order["dependencies"][0], "Shop.IEntity");
    assert_eq!(value["method_dependencies"][0]["method"], "Save");
    assert_eq!(value["method_dependencies"][0]["calls"][0], "Validate");
    assert!(value.get("inconsistencies").is_none());
}
