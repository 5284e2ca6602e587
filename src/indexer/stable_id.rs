use crate::frontend::syntax::{enclosing_type, method_signature, name_of, qualified_name};
use crate::model::TypeKind;
use blake3::Hasher;
use tree_sitter::Node;

/// Compute a stable declaration ID from content only (no line numbers).
///
/// The ID is built from:
/// - `qualified`: namespace- and type-qualified name (e.g. `Acme.Orders.Save`)
/// - `signature`: parameters and return type, for methods
/// - `kind`: declaration kind (`method`, `class`, `interface`, ...)
///
/// Positions are left out, so the ID survives blank lines and code moving
/// around the file. Two overloads differ by signature.
///
/// Returns `decl_{16_hex_chars}`, the first 64 bits of the blake3 hash.
pub fn compute_decl_id(kind: &str, qualified: &str, signature: Option<&str>) -> String {
    let mut hasher = Hasher::new();

    hasher.update(qualified.as_bytes());
    hasher.update(b"\x00");

    if let Some(sig) = signature {
        hasher.update(sig.as_bytes());
    }
    hasher.update(b"\x00");

    hasher.update(kind.as_bytes());

    let hash = hasher.finalize();
    format!("decl_{}", &hash.to_hex()[..16])
}

/// ID of a type or method declaration node. The indexer and the patcher both
/// go through here, so an ID read from the index finds the same node again.
pub fn declaration_id(node: Node<'_>, source: &str) -> Option<String> {
    if let Some(kind) = TypeKind::from_node_kind(node.kind()) {
        let qualified = qualified_name(node, source)?;
        return Some(compute_decl_id(kind.as_str(), &qualified, None));
    }
    if node.kind() != "method_declaration" {
        return None;
    }
    let name = name_of(node, source)?;
    let qualified = match enclosing_type(node).and_then(|owner| qualified_name(owner, source)) {
        Some(owner) => format!("{owner}.{name}"),
        None => name,
    };
    let signature = method_signature(node, source);
    Some(compute_decl_id("method", &qualified, signature.as_deref()))
}
