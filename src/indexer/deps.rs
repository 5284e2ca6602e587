use crate::frontend::syntax::{
    descendants, descendants_pruned, is_type_declaration, name_of, qualified_name,
    type_declarations,
};
use crate::frontend::{SemanticModel, SourceUnit, SymbolKind};
use indexmap::{IndexMap, IndexSet};

/// Reference graphs of one source unit. Both maps hold an entry for every
/// declared type or method, possibly with an empty edge set.
#[derive(Debug, Default)]
pub struct UnitDependencies {
    /// Qualified type name -> qualified names of other declared types it uses.
    pub type_edges: IndexMap<String, IndexSet<String>>,
    /// Method name -> names of the methods it calls.
    pub method_edges: IndexMap<String, IndexSet<String>>,
}

pub struct DependencyCollector;

impl DependencyCollector {
    pub fn collect(unit: &SourceUnit, model: &impl SemanticModel) -> UnitDependencies {
        let mut deps = UnitDependencies::default();
        let source = unit.text();

        for decl in type_declarations(unit.root()) {
            let Some(owner) = qualified_name(decl, source) else {
                continue;
            };
            let edges = deps.type_edges.entry(owner.clone()).or_default();
            // nested types report their own references
            let nodes = descendants_pruned(decl, |node| is_type_declaration(node.kind()));
            for ident in nodes.into_iter().filter(|node| node.kind() == "identifier") {
                let Some(symbol) = model.resolve_reference(ident) else {
                    continue;
                };
                if !symbol.is_source() {
                    continue;
                }
                if let Some(target) = symbol.owning_type() {
                    if target != owner {
                        edges.insert(target.to_string());
                    }
                }
            }
        }

        for method in descendants(unit.root())
            .into_iter()
            .filter(|node| node.kind() == "method_declaration")
        {
            let Some(caller) = name_of(method, source) else {
                continue;
            };
            let edges = deps.method_edges.entry(caller.clone()).or_default();
            for call in descendants(method)
                .into_iter()
                .filter(|node| node.kind() == "invocation_expression")
            {
                let Some(target) = model.resolve_call_target(call) else {
                    continue;
                };
                if target.kind == SymbolKind::Method && target.name != caller {
                    edges.insert(target.name);
                }
            }
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{CSharpParser, SymbolTable, UnitModel};
    use std::path::Path;

    fn collect(source: &str) -> UnitDependencies {
        let mut parser = CSharpParser::new().unwrap();
        let unit = parser
            .parse("Orders.cs", Path::new("Orders.cs"), source.to_string())
            .unwrap();
        let table = SymbolTable::from_units([&unit]);
        let model = UnitModel::new(&unit, &table);
        DependencyCollector::collect(&unit, &model)
    }

    #[test]
    fn type_edges_skip_self_and_externals() {
        let deps = collect(
            "namespace Shop {\n\
               class Store { public void Save(Order o) {} }\n\
               class Order {}\n\
               class Service {\n\
                 private Store store;\n\
                 private Service self;\n\
                 public void Run() { store.Save(new Order()); Console.WriteLine(); }\n\
               }\n\
             }",
        );
        let service: Vec<_> = deps.type_edges["Shop.Service"].iter().cloned().collect();
        assert_eq!(service, vec!["Shop.Store", "Shop.Order"]);
        let store: Vec<_> = deps.type_edges["Shop.Store"].iter().cloned().collect();
        assert_eq!(store, vec!["Shop.Order"]);
        assert!(deps.type_edges["Shop.Order"].is_empty());
    }

    #[test]
    fn method_edges_are_name_keyed_without_self_calls() {
        let deps = collect(
            "class Worker {\n\
               void Run() { Step(); Run(); this.Step(); Console.WriteLine(); }\n\
               void Step() {}\n\
             }",
        );
        let run: Vec<_> = deps.method_edges["Run"].iter().cloned().collect();
        assert_eq!(run, vec!["Step", "WriteLine"]);
        assert!(deps.method_edges["Step"].is_empty());
    }
}
