//! Builds a [`SyntaxTree`] from `syn` output

use log::{debug, warn};
use proc_macro2::{Delimiter, LineColumn, TokenStream, TokenTree};
use quote::ToTokens;
use syn::parse::discouraged::Speculative;
use syn::parse::{ParseStream, Parser};
use syn::{Attribute, AttrStyle, Block, Fields, FieldsNamed, Item, ItemStruct, Stmt, Token};

use super::{Node, NodeId, NodeKind, Span, SyntaxTree};
use crate::errors::{AnalyzerError, AnalyzerResult};

const BOM: &str = "\u{feff}";

/// Parse `source` and build the tree
pub(super) fn build(source: &str) -> AnalyzerResult<SyntaxTree> {
    let source = source.strip_prefix(BOM).unwrap_or(source);
    let parsable = blank_shebang(source);

    // only lexical errors (unbalanced delimiters, unterminated literals) get here
    let file = parse_file
        .parse_str(&parsable)
        .map_err(|e| AnalyzerError::Parse(format!("{} ({:?})", e, e.span().start())))?;

    let mut builder = TreeBuilder::new(source);
    let whole = builder.span_between(0, source.len());
    let root = builder.push(NodeKind::SourceFile, whole, None);
    builder.add_attributes(root, inner(&file.attrs));
    builder.add_items(root, &file.items);
    for bounds in &file.skipped {
        let span = builder.span_of(*bounds);
        builder.push(NodeKind::OtherItem, span, Some(root));
    }
    builder.attach_comments(root, 0, source.len());

    debug!("Built syntax tree with {} nodes", builder.nodes.len());
    Ok(builder.finish())
}

/// Top-level items of a file, minus the ones that failed to parse
struct ParsedFile {
    attrs: Vec<Attribute>,
    items: Vec<Item>,
    skipped: Vec<(LineColumn, LineColumn)>,
}

/// Parse items one at a time; an item with a syntax error is skipped and
/// the rest of the file is kept
fn parse_file(input: ParseStream) -> syn::Result<ParsedFile> {
    let attrs = input.call(Attribute::parse_inner)?;
    let mut items = Vec::new();
    let mut skipped = Vec::new();

    while !input.is_empty() {
        let fork = input.fork();
        match fork.parse::<Item>() {
            Ok(item) => {
                input.advance_to(&fork);
                items.push(item);
            }
            Err(error) => {
                let bounds = skip_item(input)?;
                warn!(
                    "Skipping item at lines {}-{}: {}",
                    bounds.0.line, bounds.1.line, error
                );
                skipped.push(bounds);
            }
        }
    }

    Ok(ParsedFile {
        attrs,
        items,
        skipped,
    })
}

/// Consume tokens up to the end of the current item: a top-level `;`, or a
/// brace group with its optional trailing `;`
fn skip_item(input: ParseStream) -> syn::Result<(LineColumn, LineColumn)> {
    let mut token: TokenTree = input.parse()?;
    let start = token.span().start();
    let mut end = token.span().end();

    loop {
        match &token {
            TokenTree::Punct(punct) if punct.as_char() == ';' => break,
            TokenTree::Group(group) if group.delimiter() == Delimiter::Brace => {
                if input.peek(Token![;]) {
                    let semi: Token![;] = input.parse()?;
                    end = semi.spans[0].end();
                }
                break;
            }
            _ => {}
        }
        if input.is_empty() {
            break;
        }
        token = input.parse()?;
        end = token.span().end();
    }

    Ok((start, end))
}

/// Replace a leading `#!` line with spaces so byte offsets stay valid
fn blank_shebang(source: &str) -> String {
    if let Some(rest) = source.strip_prefix("#!") {
        if !rest.trim_start().starts_with('[') {
            let end = source.find('\n').unwrap_or(source.len());
            return format!("{}{}", " ".repeat(end), &source[end..]);
        }
    }
    source.to_string()
}

struct TreeBuilder<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            source,
            line_starts,
            nodes: Vec::new(),
        }
    }

    fn finish(self) -> SyntaxTree {
        SyntaxTree {
            source: self.source.to_string(),
            nodes: self.nodes,
            line_starts: self.line_starts,
        }
    }

    /// Byte offset of a proc-macro2 location (1-based line, 0-based char column)
    fn offset(&self, location: LineColumn) -> usize {
        let Some(&line_start) = self.line_starts.get(location.line.saturating_sub(1)) else {
            return self.source.len();
        };
        let line_end = self
            .line_starts
            .get(location.line)
            .copied()
            .unwrap_or(self.source.len());
        let line = &self.source[line_start..line_end];
        line_start
            + line
                .char_indices()
                .nth(location.column)
                .map_or(line.len(), |(i, _)| i)
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|start| *start <= offset)
    }

    fn span_between(&self, start_byte: usize, end_byte: usize) -> Span {
        Span {
            start_byte,
            end_byte,
            start_line: self.line_of(start_byte),
            end_line: self.line_of(end_byte.saturating_sub(1).max(start_byte)),
        }
    }

    fn span_of(&self, (start, end): (LineColumn, LineColumn)) -> Span {
        Span {
            start_byte: self.offset(start),
            end_byte: self.offset(end),
            start_line: start.line,
            end_line: end.line,
        }
    }

    fn push(&mut self, kind: NodeKind, span: Span, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            span,
            parent,
            children: Vec::new(),
            fields: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn push_field(&mut self, kind: NodeKind, span: Span, parent: NodeId, field: &'static str) -> NodeId {
        let id = self.push(kind, span, Some(parent));
        self.nodes[parent].fields.push((field, id));
        id
    }

    fn add_items(&mut self, parent: NodeId, items: &[Item]) {
        for item in items {
            self.add_item(parent, item);
        }
    }

    fn add_item(&mut self, parent: NodeId, item: &Item) {
        let Some(bounds) = item_bounds(item.to_token_stream()) else {
            return;
        };
        self.add_attributes(parent, outer(item_attrs(item)));
        let span = self.span_of(bounds);
        match item {
            Item::Struct(item_struct) => self.add_struct(parent, item_struct, span),
            Item::Mod(item_mod) => {
                let module = self.push(NodeKind::Module, span, Some(parent));
                if let Some((brace, items)) = &item_mod.content {
                    self.add_attributes(module, inner(&item_mod.attrs));
                    self.add_items(module, items);
                    let lo = self.offset(brace.span.open().end());
                    let hi = self.offset(brace.span.close().start());
                    self.attach_comments(module, lo, hi);
                }
            }
            Item::Fn(item_fn) => {
                let function = self.push(NodeKind::OtherItem, span, Some(parent));
                self.add_block(function, &item_fn.block);
            }
            _ => {
                self.push(NodeKind::OtherItem, span, Some(parent));
            }
        }
    }

    /// Items declared inside a function body; other statements are opaque siblings
    fn add_block(&mut self, parent: NodeId, block: &Block) {
        for stmt in &block.stmts {
            match stmt {
                Stmt::Item(item) => self.add_item(parent, item),
                _ => {
                    if let Some(bounds) = item_bounds(stmt.to_token_stream()) {
                        let span = self.span_of(bounds);
                        self.push(NodeKind::OtherItem, span, Some(parent));
                    }
                }
            }
        }
        let lo = self.offset(block.brace_token.span.open().end());
        let hi = self.offset(block.brace_token.span.close().start());
        self.attach_comments(parent, lo, hi);
    }

    fn add_attributes<'b>(&mut self, parent: NodeId, attrs: impl Iterator<Item = &'b Attribute>) {
        for attr in attrs {
            let Some(bounds) = stream_bounds(attr.to_token_stream()) else {
                continue;
            };
            let kind = if attr.path().is_ident("doc") {
                NodeKind::Comment
            } else {
                NodeKind::AttributeItem
            };
            let span = self.span_of(bounds);
            self.push(kind, span, Some(parent));
        }
    }

    fn add_struct(&mut self, parent: NodeId, item: &ItemStruct, span: Span) {
        let id = self.push(NodeKind::StructItem, span, Some(parent));
        let name_span = self.span_of((item.ident.span().start(), item.ident.span().end()));
        self.push_field(NodeKind::TypeIdentifier, name_span, id, "name");

        if let Fields::Named(named) = &item.fields {
            self.add_field_list(id, named);
        }
    }

    fn add_field_list(&mut self, struct_id: NodeId, named: &FieldsNamed) {
        let open = named.brace_token.span.open();
        let close = named.brace_token.span.close();
        let list_span = self.span_of((open.start(), close.end()));
        let list = self.push_field(NodeKind::FieldDeclarationList, list_span, struct_id, "body");

        for field in &named.named {
            let Some(bounds) = item_bounds(field.to_token_stream()) else {
                continue;
            };
            self.add_attributes(list, outer(&field.attrs));
            let span = self.span_of(bounds);
            let declaration = self.push(NodeKind::FieldDeclaration, span, Some(list));

            if let Some(ident) = &field.ident {
                let ident_span = self.span_of((ident.span().start(), ident.span().end()));
                self.push_field(NodeKind::FieldIdentifier, ident_span, declaration, "name");
            }
            if let Some(type_bounds) = stream_bounds(field.ty.to_token_stream()) {
                let type_span = self.span_of(type_bounds);
                self.push_field(NodeKind::Type, type_span, declaration, "type");
            }
        }

        let lo = self.offset(open.end());
        let hi = self.offset(close.start());
        self.attach_comments(list, lo, hi);
    }

    /// Recover comments from the gaps between the children of `parent`
    /// inside `[lo, hi)`, then put the children back into source order.
    fn attach_comments(&mut self, parent: NodeId, lo: usize, hi: usize) {
        let mut covered: Vec<(usize, usize)> = self.nodes[parent]
            .children
            .iter()
            .map(|child| (self.nodes[*child].span.start_byte, self.nodes[*child].span.end_byte))
            .collect();
        covered.sort_unstable();

        let mut gaps = Vec::new();
        let mut cursor = lo;
        for (start, end) in covered {
            if start > cursor {
                gaps.push((cursor, start));
            }
            cursor = cursor.max(end);
        }
        if hi > cursor {
            gaps.push((cursor, hi));
        }

        for (gap_start, gap_end) in gaps {
            let Some(gap) = self.source.get(gap_start..gap_end) else {
                continue;
            };
            for (start, end) in comment_ranges(gap) {
                let span = self.span_between(gap_start + start, gap_start + end);
                self.push(NodeKind::Comment, span, Some(parent));
            }
        }

        let mut children = std::mem::take(&mut self.nodes[parent].children);
        children.sort_by_key(|child| self.nodes[*child].span.start_byte);
        self.nodes[parent].children = children;
    }
}

fn outer(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| matches!(attr.style, AttrStyle::Outer))
}

fn inner(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| matches!(attr.style, AttrStyle::Inner(_)))
}

fn item_attrs(item: &Item) -> &[Attribute] {
    match item {
        Item::Const(i) => &i.attrs,
        Item::Enum(i) => &i.attrs,
        Item::ExternCrate(i) => &i.attrs,
        Item::Fn(i) => &i.attrs,
        Item::ForeignMod(i) => &i.attrs,
        Item::Impl(i) => &i.attrs,
        Item::Macro(i) => &i.attrs,
        Item::Mod(i) => &i.attrs,
        Item::Static(i) => &i.attrs,
        Item::Struct(i) => &i.attrs,
        Item::Trait(i) => &i.attrs,
        Item::TraitAlias(i) => &i.attrs,
        Item::Type(i) => &i.attrs,
        Item::Union(i) => &i.attrs,
        Item::Use(i) => &i.attrs,
        _ => &[],
    }
}

/// Start and end of a token stream
fn stream_bounds(tokens: TokenStream) -> Option<(LineColumn, LineColumn)> {
    let trees: Vec<TokenTree> = tokens.into_iter().collect();
    let first = trees.first()?;
    let last = trees.last()?;
    Some((first.span().start(), last.span().end()))
}

/// Start and end of an item's tokens, skipping its leading outer attributes
fn item_bounds(tokens: TokenStream) -> Option<(LineColumn, LineColumn)> {
    let trees: Vec<TokenTree> = tokens.into_iter().collect();
    let mut index = 0;
    while index + 1 < trees.len() && is_attribute_start(&trees[index], &trees[index + 1]) {
        index += 2;
    }
    let first = trees.get(index)?;
    let last = trees.last()?;
    Some((first.span().start(), last.span().end()))
}

fn is_attribute_start(pound: &TokenTree, group: &TokenTree) -> bool {
    matches!(pound, TokenTree::Punct(p) if p.as_char() == '#')
        && matches!(group, TokenTree::Group(g) if g.delimiter() == Delimiter::Bracket)
}

/// Byte ranges of `//` and `/* */` comments in text that contains no code
fn comment_ranges(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'/') => {
                let end = text[i..].find('\n').map_or(text.len(), |n| i + n);
                ranges.push((i, end));
                i = end;
            }
            (b'/', b'*') => {
                let mut depth = 1;
                let mut j = i + 2;
                while j < bytes.len() && depth > 0 {
                    if bytes[j] == b'/' && bytes.get(j + 1) == Some(&b'*') {
                        depth += 1;
                        j += 2;
                    } else if bytes[j] == b'*' && bytes.get(j + 1) == Some(&b'/') {
                        depth -= 1;
                        j += 2;
                    } else {
                        j += 1;
                    }
                }
                ranges.push((i, j.min(bytes.len())));
                i = j;
            }
            _ => i += 1,
        }
    }
    ranges
}
