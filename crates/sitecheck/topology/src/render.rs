//! Graph-to-text rendering.
//!
//! Rendering resolves every `{placeholder}` in literal strings against
//! [`TopologyParams`], checks the graph, and writes provisioning
//! configuration text. References are written as expressions and left for
//! the provisioning engine to resolve.

use sitecheck_types::ResourceAddress;
use std::fmt;
use tracing::{debug, instrument};

use crate::error::{TopologyError, TopologyResult};
use crate::graph::Topology;
use crate::node::{Block, PropertyValue, Reference, ResourceNode};
use crate::params::TopologyParams;
use crate::template::{substitute, TemplateError};

const INDENT: &str = "  ";

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTopology {
    params: TopologyParams,
    text: String,
    /// Resolved nodes in realization order.
    ordered: Vec<ResourceNode>,
}

impl RenderedTopology {
    /// Configuration text for the provisioning engine.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &TopologyParams {
        &self.params
    }

    /// Nodes with placeholders substituted, dependencies first.
    pub fn realization_order(&self) -> &[ResourceNode] {
        &self.ordered
    }

    pub fn get(&self, address: &ResourceAddress) -> Option<&ResourceNode> {
        self.ordered.iter().find(|n| &n.address == address)
    }
}

impl fmt::Display for RenderedTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Render a topology with the given parameters.
///
/// Fails before producing any text when a parameter is empty, a placeholder
/// is unknown, a reference or `depends_on` entry names an undeclared node,
/// or the dependency relation has a cycle.
#[instrument(skip(topology, params), fields(nodes = topology.len(), suffix = params.unique_suffix))]
pub fn render(topology: &Topology, params: &TopologyParams) -> TopologyResult<RenderedTopology> {
    params.validate()?;

    let resolved: Vec<ResourceNode> = topology
        .nodes()
        .iter()
        .map(|node| resolve_node(node, params))
        .collect::<TopologyResult<_>>()?;

    let mut resolved_topology = Topology::new();
    resolved_topology.providers = topology.providers.clone();
    for node in resolved {
        resolved_topology.add(node)?;
    }

    let ordered: Vec<ResourceNode> = resolved_topology
        .realization_order()?
        .into_iter()
        .cloned()
        .collect();

    let text = write_topology(&resolved_topology.providers, &ordered);
    debug!(bytes = text.len(), "Topology rendered");

    Ok(RenderedTopology {
        params: params.clone(),
        text,
        ordered,
    })
}

fn resolve_node(node: &ResourceNode, params: &TopologyParams) -> TopologyResult<ResourceNode> {
    let mut resolved = node.clone();
    for (property, value) in resolved.properties.iter_mut() {
        resolve_value(value, params).map_err(|err| match err {
            TemplateError::Unresolved(placeholder) => TopologyError::UnresolvedPlaceholder {
                node: node.address.clone(),
                property: property.clone(),
                placeholder,
            },
            TemplateError::Unterminated => TopologyError::MalformedTemplate {
                node: node.address.clone(),
                property: property.clone(),
                template: template_of(node, property),
            },
        })?;
    }
    Ok(resolved)
}

fn template_of(node: &ResourceNode, property: &str) -> String {
    match node.get(property) {
        Some(PropertyValue::Text(t)) => t.clone(),
        Some(other) => format!("{other:?}"),
        None => String::new(),
    }
}

fn resolve_value(value: &mut PropertyValue, params: &TopologyParams) -> Result<(), TemplateError> {
    match value {
        PropertyValue::Text(t) => *t = substitute(t, params)?,
        PropertyValue::List(items) => {
            for item in items {
                resolve_value(item, params)?;
            }
        }
        PropertyValue::Blocks(blocks) => {
            for block in blocks {
                for (_, v) in block.properties.iter_mut() {
                    resolve_value(v, params)?;
                }
            }
        }
        PropertyValue::Integer(_) | PropertyValue::Bool(_) | PropertyValue::Ref(_) => {}
    }
    Ok(())
}

fn write_topology(providers: &[String], nodes: &[ResourceNode]) -> String {
    let mut out = String::new();

    for provider in providers {
        out.push_str(&format!("provider {} {{\n", quote(provider)));
        out.push_str(&format!("{INDENT}features {{}}\n"));
        out.push_str("}\n\n");
    }

    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_node(&mut out, node);
    }

    out
}

fn write_node(out: &mut String, node: &ResourceNode) {
    out.push_str(&format!(
        "resource {} {} {{\n",
        quote(node.address.resource_type()),
        quote(node.address.name())
    ));
    write_properties(out, &node.properties, 1);

    if !node.depends_on.is_empty() {
        if !node.properties.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("{INDENT}depends_on = [\n"));
        for target in &node.depends_on {
            out.push_str(&format!("{INDENT}{INDENT}{target},\n"));
        }
        out.push_str(&format!("{INDENT}]\n"));
    }

    out.push_str("}\n");
}

fn write_properties(out: &mut String, properties: &[(String, PropertyValue)], depth: usize) {
    let indent = INDENT.repeat(depth);
    let width = properties
        .iter()
        .filter(|(_, v)| !matches!(v, PropertyValue::Blocks(_)))
        .map(|(k, _)| k.len())
        .max()
        .unwrap_or(0);

    for (name, value) in properties {
        match value {
            PropertyValue::Blocks(blocks) => {
                for block in blocks {
                    if !out.ends_with("{\n") {
                        out.push('\n');
                    }
                    out.push_str(&format!("{indent}{name} {{\n"));
                    write_properties(out, &block.properties, depth + 1);
                    out.push_str(&format!("{indent}}}\n"));
                }
            }
            other => {
                out.push_str(&format!(
                    "{indent}{name:<width$} = {}\n",
                    format_value(other)
                ));
            }
        }
    }
}

fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Text(t) => quote(t),
        PropertyValue::Integer(n) => n.to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Ref(r) => format_reference(r),
        PropertyValue::List(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        PropertyValue::Blocks(blocks) => {
            let blocks: Vec<String> = blocks.iter().map(format_inline_block).collect();
            format!("[{}]", blocks.join(", "))
        }
    }
}

fn format_inline_block(block: &Block) -> String {
    let fields: Vec<String> = block
        .properties
        .iter()
        .map(|(k, v)| format!("{k} = {}", format_value(v)))
        .collect();
    format!("{{ {} }}", fields.join(", "))
}

/// `storage_os_disk.0.managed_disk_id` → `storage_os_disk[0].managed_disk_id`
fn format_reference(reference: &Reference) -> String {
    let mut out = reference.target.to_string();
    for segment in reference.attribute.split('.') {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            out.push_str(&format!("[{segment}]"));
        } else {
            out.push('.');
            out.push_str(segment);
        }
    }
    out
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '$' if chars.peek() == Some(&'{') => out.push_str("$$"),
            '%' if chars.peek() == Some(&'{') => out.push_str("%%"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
