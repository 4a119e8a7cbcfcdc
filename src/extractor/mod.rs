//! Extraction of `#[derive(Accounts)]` structs from a syntax tree
//!
//! The extractor reads struct names, `#[instruction(...)]` arguments and the
//! raw `#[account(...)]` entries of every field, then hands each field to the
//! classifier. Malformed attribute text never fails the extraction: the
//! affected field simply ends up with fewer (or no) attributes.

pub mod split;

use log::{debug, info, warn};

use crate::classifier::{self, RawField};
use crate::constants::anchor::{ACCOUNTS_MARKER, ACCOUNT_ATTRIBUTE, DERIVE_MARKER, INSTRUCTION_ATTRIBUTE};
use crate::models::{ConstraintAttribute, Constraints, InstructionArgument};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

pub use self::split::smart_split;

/// Extracts validation structs from one parsed source file
pub struct ConstraintExtractor<'a> {
    tree: &'a SyntaxTree,
    source_file: String,
}

impl<'a> ConstraintExtractor<'a> {
    pub fn new(tree: &'a SyntaxTree, source_file: impl Into<String>) -> Self {
        Self {
            tree,
            source_file: source_file.into(),
        }
    }

    /// Every `#[derive(Accounts)]` struct in the file, in source order
    pub fn extract_all_constraints(&self) -> Vec<Constraints> {
        let constraints: Vec<Constraints> = self
            .tree
            .find_all(NodeKind::StructItem)
            .into_iter()
            .filter(|node| self.has_derive_accounts(*node))
            .filter_map(|node| self.parse_constraint_struct(node))
            .collect();

        info!(
            "Found {} constraint struct(s) in {}",
            constraints.len(),
            self.source_file
        );
        constraints
    }

    /// Attribute texts attached to a node, in source order
    fn attached_attributes(&self, node: NodeId) -> Vec<&'a str> {
        let tree = self.tree;
        let mut texts: Vec<&'a str> = tree
            .scan_preceding_siblings(node, NodeKind::is_attribute_or_comment)
            .into_iter()
            .filter(|sibling| tree.kind(*sibling) == NodeKind::AttributeItem)
            .map(|sibling| tree.text(sibling))
            .collect();
        texts.reverse();
        texts
    }

    fn has_derive_accounts(&self, struct_node: NodeId) -> bool {
        self.attached_attributes(struct_node)
            .iter()
            .any(|text| text.contains(DERIVE_MARKER) && text.contains(ACCOUNTS_MARKER))
    }

    fn parse_constraint_struct(&self, struct_node: NodeId) -> Option<Constraints> {
        let Some(name_node) = self.tree.child_by_field_name(struct_node, "name") else {
            warn!("Skipping constraint struct without a name");
            return None;
        };
        let span = self.tree.span(struct_node);

        let mut constraints = Constraints::new(self.tree.text(name_node).to_string());
        constraints.source_file = Some(self.source_file.clone());
        constraints.line_start = Some(span.start_line);
        constraints.line_end = Some(span.end_line);
        constraints.instruction_args = self.parse_instruction_args(struct_node);
        constraints.accounts = self
            .field_nodes(struct_node)
            .into_iter()
            .filter_map(|field| self.parse_raw_field(field))
            .map(classifier::classify)
            .collect();

        debug!(
            "Parsed {} ({} accounts, {} instruction args)",
            constraints.name,
            constraints.accounts.len(),
            constraints.instruction_args.len()
        );
        Some(constraints)
    }

    fn parse_instruction_args(&self, struct_node: NodeId) -> Vec<InstructionArgument> {
        self.attached_attributes(struct_node)
            .into_iter()
            .find_map(|text| extract_attribute_content(text, INSTRUCTION_ATTRIBUTE))
            .map(|content| parse_instruction_args(&content))
            .unwrap_or_default()
    }

    fn field_nodes(&self, struct_node: NodeId) -> Vec<NodeId> {
        let Some(body) = self.tree.child_by_field_name(struct_node, "body") else {
            return Vec::new();
        };
        self.tree
            .children(body)
            .iter()
            .copied()
            .filter(|child| self.tree.kind(*child) == NodeKind::FieldDeclaration)
            .collect()
    }

    fn parse_raw_field(&self, field_node: NodeId) -> Option<RawField> {
        let name_node = self
            .tree
            .find_child_by_kind(field_node, NodeKind::FieldIdentifier)?;
        let Some(type_node) = self.tree.child_by_field_name(field_node, "type") else {
            debug!("Skipping field without a type at {:?}", self.tree.span(field_node));
            return None;
        };

        let line_number = self.tree.span(field_node).start_line;
        let attributes = self
            .attached_attributes(field_node)
            .into_iter()
            .filter(|text| text.starts_with("#[account"))
            .flat_map(parse_account_attribute)
            .collect();

        Some(RawField {
            name: self.tree.text(name_node).to_string(),
            type_name: self.tree.text(type_node).to_string(),
            attributes,
            line_number: Some(line_number),
            comment: self.inline_comment(line_number),
        })
    }

    fn inline_comment(&self, line_number: usize) -> Option<String> {
        let line = self.tree.line_text(line_number)?;
        line.find("//")
            .map(|start| line[start + 2..].trim().to_string())
    }
}

/// Parse the entries of one `#[account(...)]` attribute
pub fn parse_account_attribute(attr_text: &str) -> Vec<ConstraintAttribute> {
    let Some(content) = extract_attribute_content(attr_text, ACCOUNT_ATTRIBUTE) else {
        debug!("Unbalanced or empty account attribute: {}", attr_text);
        return Vec::new();
    };
    let content = remove_comments(&content);

    smart_split(&content, ',')
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) => ConstraintAttribute::with_value(key.trim(), value.trim()),
            None => ConstraintAttribute::flag(part),
        })
        .collect()
}

/// Content between the balanced parentheses of `#[<name>(...)]`
///
/// Returns `None` when the attribute is not found or its parentheses never
/// balance.
pub fn extract_attribute_content(attr_text: &str, name: &str) -> Option<String> {
    let pattern = format!("#[{}(", name);
    let start = attr_text.find(&pattern)? + pattern.len();

    let mut depth = 1;
    for (offset, ch) in attr_text[start..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(attr_text[start..start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `name: Type, ...` from an `#[instruction(...)]` body
pub fn parse_instruction_args(args_text: &str) -> Vec<InstructionArgument> {
    smart_split(args_text, ',')
        .iter()
        .filter_map(|part| {
            let (name, type_name) = part.trim().split_once(':')?;
            Some(InstructionArgument {
                name: name.trim().to_string(),
                type_name: type_name.trim().to_string(),
            })
        })
        .collect()
}

/// Strip `//` comments line by line
pub fn remove_comments(text: &str) -> String {
    text.split('\n')
        .map(|line| match line.find("//") {
            Some(index) => &line[..index],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
