//! `$expand` clause formatting.
//!
//! Expand paths are merged into a tree of navigation properties. Under V4,
//! select and order-by items whose first segment names an expanded
//! navigation move into that expansion's nested clause:
//!
//! ```text
//! Employees?$expand=Orders($expand=Customer;$select=OrderDate)
//! ```
//!
//! Under V3 every path stays a flat `/`-separated list.

use super::ExpandAssociation;
use super::ExpandLevels;
use super::ExpandOptions;
use super::OrderByColumn;
use crate::ProtocolVersion;
use crate::error::Error;
use crate::metadata::MetadataProvider;
use crate::query::FormatContext;

const WILDCARD: &str = "*";

/// Formatted expand, select and order-by clauses of one command.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Clauses {
    pub expand: Option<String>,
    pub order_by: Option<String>,
    pub select: Option<String>,
}

#[derive(Debug)]
struct ExpandNode {
    name: String,
    collection: String,
    options: ExpandOptions,
    children: Vec<ExpandNode>,
    select: Vec<String>,
    order_by: Vec<String>,
}

impl ExpandNode {
    fn new(name: String, collection: String) -> Self {
        Self {
            name,
            collection,
            options: ExpandOptions::default(),
            children: Vec::new(),
            select: Vec::new(),
            order_by: Vec::new(),
        }
    }

    fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    fn render(&self) -> String {
        let mut text = self.name.clone();
        if self.options.by_reference {
            text.push_str("/$ref");
        }

        let mut nested = Vec::new();
        if !self.children.is_empty() {
            let children: Vec<String> = self.children.iter().map(ExpandNode::render).collect();
            nested.push(format!("$expand={}", children.join(",")));
        }
        if !self.order_by.is_empty() {
            nested.push(format!("$orderby={}", self.order_by.join(",")));
        }
        if !self.select.is_empty() {
            nested.push(format!("$select={}", self.select.join(",")));
        }
        match self.options.levels {
            Some(ExpandLevels::Count(n)) => nested.push(format!("$levels={}", n)),
            Some(ExpandLevels::Max) => nested.push("$levels=max".to_string()),
            None => {}
        }

        if !nested.is_empty() {
            text.push('(');
            text.push_str(&nested.join(";"));
            text.push(')');
        }
        text
    }
}

/// Formats the expand, select and order-by clauses of `collection`.
pub(crate) fn format_clauses(
    metadata: &dyn MetadataProvider,
    collection: &str,
    protocol: ProtocolVersion,
    expand: &[ExpandAssociation],
    select: &[String],
    order_by: &[OrderByColumn],
) -> Result<Clauses, Error> {
    if !protocol.is_v4() {
        return format_flat(metadata, collection, protocol, expand, select, order_by);
    }

    let mut roots: Vec<ExpandNode> = Vec::new();
    for association in expand {
        insert_path(metadata, &mut roots, collection, &association.path, association.options)?;
    }

    let mut top_select = Vec::new();
    for path in select {
        if !thread_item(&mut roots, collection, path, metadata, protocol, Item::Select)? {
            top_select.push(FormatContext::new(metadata, collection, protocol).property_path(path)?);
        }
    }

    let mut top_order_by = Vec::new();
    for column in order_by {
        let item = Item::OrderBy(column.direction.is_descending());
        if !thread_item(&mut roots, collection, &column.path, metadata, protocol, item)? {
            let path = FormatContext::new(metadata, collection, protocol).property_path(&column.path)?;
            top_order_by.push(order_by_item(path, column.direction.is_descending()));
        }
    }

    Ok(Clauses {
        expand: join_non_empty(roots.iter().map(ExpandNode::render).collect()),
        order_by: join_non_empty(top_order_by),
        select: join_non_empty(top_select),
    })
}

/// Adds `path` to the tree, merging with already expanded prefixes.
fn insert_path(
    metadata: &dyn MetadataProvider,
    nodes: &mut Vec<ExpandNode>,
    collection: &str,
    path: &str,
    options: ExpandOptions,
) -> Result<(), Error> {
    if path == WILDCARD {
        if !nodes.iter().any(ExpandNode::is_wildcard) {
            nodes.push(ExpandNode::new(WILDCARD.to_string(), String::new()));
        }
        return Ok(());
    }

    let (segment, rest) = match path.split_once('/') {
        Some((segment, rest)) => (segment, Some(rest)),
        None => (path, None),
    };
    let name = metadata.navigation_property_exact_name(collection, segment)?;
    let index = match nodes.iter().position(|n| n.name == name) {
        Some(index) => index,
        None => {
            let partner = metadata.navigation_property_partner_name(collection, segment)?;
            nodes.push(ExpandNode::new(name, partner));
            nodes.len() - 1
        }
    };

    let node = &mut nodes[index];
    match rest {
        Some(rest) => {
            let partner = node.collection.clone();
            insert_path(metadata, &mut node.children, &partner, rest, options)
        }
        None => {
            if !options.is_default() {
                node.options = options;
            }
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Item {
    Select,
    OrderBy(bool),
}

/// Moves a multi-segment item into the deepest expansion its leading
/// segments name. Returns `false` if no expansion matches.
fn thread_item(
    nodes: &mut [ExpandNode],
    collection: &str,
    path: &str,
    metadata: &dyn MetadataProvider,
    protocol: ProtocolVersion,
    item: Item,
) -> Result<bool, Error> {
    let Some((segment, rest)) = path.split_once('/') else {
        return Ok(false);
    };
    let Ok(name) = metadata.navigation_property_exact_name(collection, segment) else {
        return Ok(false);
    };
    let Some(node) = nodes.iter_mut().find(|n| n.name == name) else {
        return Ok(false);
    };

    let partner = node.collection.clone();
    if thread_item(&mut node.children, &partner, rest, metadata, protocol, item)? {
        return Ok(true);
    }
    let resolved = FormatContext::new(metadata, &partner, protocol).property_path(rest)?;
    match item {
        Item::Select => node.select.push(resolved),
        Item::OrderBy(descending) => node.order_by.push(order_by_item(resolved, descending)),
    }
    Ok(true)
}

fn format_flat(
    metadata: &dyn MetadataProvider,
    collection: &str,
    protocol: ProtocolVersion,
    expand: &[ExpandAssociation],
    select: &[String],
    order_by: &[OrderByColumn],
) -> Result<Clauses, Error> {
    let mut paths: Vec<String> = Vec::new();
    for association in expand {
        let path = if association.path == WILDCARD {
            WILDCARD.to_string()
        } else {
            navigation_path(metadata, collection, &association.path)?
        };
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    let context = FormatContext::new(metadata, collection, protocol);
    let select = select
        .iter()
        .map(|path| context.property_path(path))
        .collect::<Result<Vec<_>, _>>()?;
    let order_by = order_by
        .iter()
        .map(|column| {
            let path = context.property_path(&column.path)?;
            Ok(order_by_item(path, column.direction.is_descending()))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(Clauses {
        expand: join_non_empty(paths),
        order_by: join_non_empty(order_by),
        select: join_non_empty(select),
    })
}

fn navigation_path(metadata: &dyn MetadataProvider, collection: &str, path: &str) -> Result<String, Error> {
    let mut collection = collection.to_string();
    let mut resolved = Vec::new();
    for segment in path.split('/') {
        resolved.push(metadata.navigation_property_exact_name(&collection, segment)?);
        collection = metadata.navigation_property_partner_name(&collection, segment)?;
    }
    Ok(resolved.join("/"))
}

fn order_by_item(path: String, descending: bool) -> String {
    if descending {
        format!("{}%20desc", path)
    } else {
        path
    }
}

fn join_non_empty(items: Vec<String>) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::clause::split_paths;
    use crate::metadata::EntityType;
    use crate::metadata::Schema;
    use crate::query::Direction;

    fn schema() -> Schema {
        Schema::new("NorthwindModel")
            .entity_type(
                EntityType::new("Employee")
                    .key(["EmployeeID"])
                    .property("EmployeeID")
                    .property("LastName")
                    .collection("Orders", "Order")
                    .collection("Subordinates", "Employee"),
            )
            .entity_type(
                EntityType::new("Order")
                    .key(["OrderID"])
                    .property("OrderID")
                    .property("OrderDate")
                    .reference("Customer", "Customer"),
            )
            .entity_type(
                EntityType::new("Customer")
                    .key(["CustomerID"])
                    .property("CustomerID")
                    .property("CompanyName"),
            )
            .entity_set("Employees", "Employee")
            .entity_set("Orders", "Order")
            .entity_set("Customers", "Customer")
    }

    fn expand(paths: &[&str]) -> Vec<ExpandAssociation> {
        split_paths(paths)
            .into_iter()
            .map(|path| ExpandAssociation {
                path,
                options: ExpandOptions::default(),
            })
            .collect()
    }

    fn columns(paths: &[&str], direction: Direction) -> Vec<OrderByColumn> {
        split_paths(paths)
            .into_iter()
            .map(|path| OrderByColumn { path, direction })
            .collect()
    }

    #[test]
    fn test_nested_expand() {
        let schema = schema();
        let clauses =
            format_clauses(&schema, "Employees", ProtocolVersion::V4, &expand(&["Orders/Customer"]), &[], &[]).unwrap();
        assert_eq!(clauses.expand.as_deref(), Some("Orders($expand=Customer)"));
    }

    #[test]
    fn test_shared_prefixes_merge() {
        let schema = schema();
        let clauses = format_clauses(
            &schema,
            "Employees",
            ProtocolVersion::V4,
            &expand(&["orders", "Orders/customer", "Subordinates"]),
            &[],
            &[],
        )
        .unwrap();
        assert_eq!(clauses.expand.as_deref(), Some("Orders($expand=Customer),Subordinates"));
    }

    #[test]
    fn test_select_and_order_by_thread_into_expansion() {
        let schema = schema();
        let select = split_paths(["LastName", "Orders/OrderDate", "Orders/Customer/CompanyName"]);
        let order_by = columns(&["Orders/OrderDate"], Direction::Desc);
        let clauses = format_clauses(
            &schema,
            "Employees",
            ProtocolVersion::V4,
            &expand(&["Orders/Customer"]),
            &select,
            &order_by,
        )
        .unwrap();
        assert_eq!(
            clauses.expand.as_deref(),
            Some("Orders($expand=Customer($select=CompanyName);$orderby=OrderDate%20desc;$select=OrderDate)")
        );
        assert_eq!(clauses.select.as_deref(), Some("LastName"));
        assert_eq!(clauses.order_by, None);
    }

    #[test]
    fn test_unmatched_items_stay_top_level() {
        let schema = schema();
        let select = split_paths(["Orders/OrderDate"]);
        let clauses = format_clauses(&schema, "Employees", ProtocolVersion::V4, &[], &select, &[]).unwrap();
        assert_eq!(clauses.expand, None);
        assert_eq!(clauses.select.as_deref(), Some("Orders/OrderDate"));
    }

    #[test]
    fn test_levels_and_references() {
        let schema = schema();
        let associations = vec![
            ExpandAssociation {
                path: "Subordinates".to_string(),
                options: ExpandOptions::levels(0),
            },
            ExpandAssociation {
                path: "Orders".to_string(),
                options: ExpandOptions::by_reference(),
            },
        ];
        let clauses = format_clauses(&schema, "Employees", ProtocolVersion::V4, &associations, &[], &[]).unwrap();
        assert_eq!(clauses.expand.as_deref(), Some("Subordinates($levels=max),Orders/$ref"));
    }

    #[test]
    fn test_v3_paths_stay_flat() {
        let schema = schema();
        let select = split_paths(["Orders/OrderDate"]);
        let clauses = format_clauses(
            &schema,
            "Employees",
            ProtocolVersion::V3,
            &expand(&["Orders/Customer"]),
            &select,
            &[],
        )
        .unwrap();
        assert_eq!(clauses.expand.as_deref(), Some("Orders/Customer"));
        assert_eq!(clauses.select.as_deref(), Some("Orders/OrderDate"));
    }

    #[test]
    fn test_wildcard_passes_through() {
        let schema = schema();
        let clauses = format_clauses(&schema, "Employees", ProtocolVersion::V4, &expand(&["*"]), &[], &[]).unwrap();
        assert_eq!(clauses.expand.as_deref(), Some("*"));
    }

    #[test]
    fn test_unknown_navigation() {
        let schema = schema();
        let err = format_clauses(&schema, "Employees", ProtocolVersion::V4, &expand(&["Invoices"]), &[], &[])
            .unwrap_err();
        assert_eq!(err.unresolved_name(), Some("Invoices"));
    }
}
