//! Structural scan of an existing Java source file.
//!
//! The scanner is not a Java parser. It tokenizes just enough (comments,
//! string and char literals, text blocks, identifiers, punctuation) to find
//! the package, the imports, the header of the single top-level type and the
//! boundaries of its members. Member bodies are kept as source text.

use mapforge_generate::dom::UnitKind;
use mapforge_generate::{MARKER_TAG, PRESERVE_TAG};

use crate::errors::{MergeError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedImport {
    pub name: String,
    pub is_static: bool,
}

/// Header of the top-level type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedType {
    pub kind: UnitKind,
    pub name: String,
    pub annotations: Vec<String>,
    /// Whitespace-free type text, generic arguments included.
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedMember {
    /// Same key space as `Member::signature`.
    pub signature: String,
    /// Source from the start of the member's first line to its last token.
    pub text: String,
    /// Carries the marker tag and not the preserve tag.
    pub generated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Comments above the package or first import.
    pub file_comments: Vec<String>,
    pub package: Option<String>,
    pub imports: Vec<ScannedImport>,
    /// Comments between the imports and the opening brace of the type.
    pub type_comments: Vec<String>,
    pub declaration: ScannedType,
    pub members: Vec<ScannedMember>,
    /// Comments after the closing brace of the type.
    pub trailing_comments: Vec<String>,
}

impl ScannedFile {
    pub fn hand_written(&self) -> impl Iterator<Item = &ScannedMember> {
        self.members.iter().filter(|member| !member.generated)
    }

    /// Type comments without the marker tag, or with the preserve tag.
    pub fn hand_written_type_comments(&self) -> impl Iterator<Item = &String> {
        self.type_comments
            .iter()
            .filter(|comment| !is_generated(std::iter::once(comment.as_str())))
    }
}

fn is_generated<'t>(comments: impl Iterator<Item = &'t str> + Clone) -> bool {
    comments.clone().any(|text| text.contains(MARKER_TAG))
        && !comments.into_iter().any(|text| text.contains(PRESERVE_TAG))
}

pub fn scan(source: &str) -> Result<ScannedFile> {
    let tokens = lex(source)?;
    let mut cursor = Cursor {
        source,
        tokens: &tokens,
        pos: 0,
    };

    let first = cursor
        .peek()
        .ok_or_else(|| unparseable("no type declaration"))?;
    let type_comments_from = match cursor.text(first) {
        "package" | "import" => cursor.pos,
        _ => 0,
    };
    let file_comments = cursor.comments(0, type_comments_from);

    let mut package = None;
    let mut imports = Vec::new();
    loop {
        let token = cursor
            .peek()
            .ok_or_else(|| unparseable("no type declaration"))?;
        match cursor.text(token) {
            "package" => {
                cursor.bump();
                package = Some(cursor.until_semicolon()?.concat());
            }
            "import" => {
                cursor.bump();
                let mut parts = cursor.until_semicolon()?;
                let is_static = parts.first() == Some(&"static");
                if is_static {
                    parts.remove(0);
                }
                imports.push(ScannedImport {
                    name: parts.concat(),
                    is_static,
                });
            }
            ";" => cursor.bump(),
            _ => break,
        }
    }

    let header = cursor.header()?;
    let type_comments = cursor.comments(type_comments_from, cursor.pos);
    let declaration = parse_header(source, &header)?;
    let members = cursor.members()?;
    let trailing_comments = cursor.comments(cursor.pos, tokens.len());

    if let Some(token) = cursor.peek() {
        return Err(unparseable(format!(
            "unexpected '{}' after the top-level type",
            cursor.text(token)
        )));
    }

    Ok(ScannedFile {
        file_comments,
        package,
        imports,
        type_comments,
        declaration,
        members,
        trailing_comments,
    })
}

fn unparseable(reason: impl Into<String>) -> MergeError {
    MergeError::Unparseable(reason.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    Punct,
    Literal,
    Comment,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' || byte >= 0x80
}

fn lex(source: &str) -> Result<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let rest = &source[i..];
        let kind = if rest.starts_with("//") {
            i = rest.find('\n').map_or(bytes.len(), |n| i + n);
            TokenKind::Comment
        } else if rest.starts_with("/*") {
            let close = rest[2..]
                .find("*/")
                .ok_or_else(|| unparseable("unterminated comment"))?;
            i += close + 4;
            TokenKind::Comment
        } else if rest.starts_with("\"\"\"") {
            i = skip_text_block(bytes, i + 3)?;
            TokenKind::Literal
        } else if byte == b'"' || byte == b'\'' {
            i = skip_quoted(bytes, i + 1, byte)?;
            TokenKind::Literal
        } else if is_ident_byte(byte) {
            while i < bytes.len() && is_ident_byte(bytes[i]) {
                i += 1;
            }
            TokenKind::Ident
        } else {
            i += 1;
            TokenKind::Punct
        };
        tokens.push(Token {
            kind,
            start,
            end: i,
        });
    }
    Ok(tokens)
}

fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> Result<usize> {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => break,
            byte if byte == quote => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(unparseable("unterminated literal"))
}

fn skip_text_block(bytes: &[u8], mut i: usize) -> Result<usize> {
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
        } else if bytes[i..].starts_with(b"\"\"\"") {
            return Ok(i + 3);
        } else {
            i += 1;
        }
    }
    Err(unparseable("unterminated text block"))
}

struct Cursor<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn text(&self, token: Token) -> &'a str {
        &self.source[token.start..token.end]
    }

    /// Next code token, skipping comments.
    fn peek(&mut self) -> Option<Token> {
        while let Some(token) = self.tokens.get(self.pos) {
            if token.kind != TokenKind::Comment {
                return Some(*token);
            }
            self.pos += 1;
        }
        None
    }

    fn bump(&mut self) {
        if self.peek().is_some() {
            self.pos += 1;
        }
    }

    fn next_code(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// Comment tokens in `from..to`, each from the start of its line when
    /// only indentation precedes it.
    fn comments(&self, from: usize, to: usize) -> Vec<String> {
        self.tokens[from..to]
            .iter()
            .filter(|token| token.kind == TokenKind::Comment)
            .map(|token| self.source[line_start(self.source, token.start)..token.end].to_string())
            .collect()
    }

    /// `last`, or the comment after it when that comment starts on the same
    /// line.
    fn same_line_comment(&self, last: usize) -> usize {
        match self.tokens.get(last + 1) {
            Some(next)
                if next.kind == TokenKind::Comment
                    && !self.source[self.tokens[last].end..next.start].contains('\n') =>
            {
                last + 1
            }
            _ => last,
        }
    }

    fn until_semicolon(&mut self) -> Result<Vec<&'a str>> {
        let mut parts = Vec::new();
        loop {
            let token = self
                .next_code()
                .ok_or_else(|| unparseable("missing ';'"))?;
            match self.text(token) {
                ";" => return Ok(parts),
                text => parts.push(text),
            }
        }
    }

    /// Code tokens of the type header, consuming the opening brace.
    fn header(&mut self) -> Result<Vec<Token>> {
        let mut header = Vec::new();
        let mut parens = 0usize;
        loop {
            let token = self
                .next_code()
                .ok_or_else(|| unparseable("missing type body"))?;
            match self.text(token) {
                "(" => parens += 1,
                ")" => parens = parens.saturating_sub(1),
                "{" if parens == 0 => return Ok(header),
                _ => {}
            }
            header.push(token);
        }
    }

    /// Split the type body into members, consuming the closing brace.
    fn members(&mut self) -> Result<Vec<ScannedMember>> {
        let mut members = Vec::new();
        let mut open: Option<OpenMember> = None;
        let mut braces = 0usize;
        let mut parens = 0usize;

        loop {
            let index = self.pos;
            let token = *self
                .tokens
                .get(index)
                .ok_or_else(|| unparseable("unterminated type body"))?;
            self.pos += 1;

            let member = open.get_or_insert(OpenMember {
                start: index,
                assigned: false,
                has_code: false,
            });
            if token.kind == TokenKind::Comment {
                continue;
            }

            let at_member_level = braces == 0 && parens == 0;
            let ordinal = members.len();
            match self.text(token) {
                "}" if braces == 0 => {
                    if member.has_code {
                        return Err(unparseable("member not terminated"));
                    }
                    if index > member.start {
                        members.push(self.finish(member.start, index - 1, ordinal)?);
                    }
                    return Ok(members);
                }
                "(" => parens += 1,
                ")" => parens = parens.saturating_sub(1),
                "{" => braces += 1,
                "}" => {
                    braces -= 1;
                    if braces == 0 && parens == 0 && !member.assigned {
                        let last = self.same_line_comment(index);
                        self.pos = last + 1;
                        members.push(self.finish(member.start, last, ordinal)?);
                        open = None;
                        continue;
                    }
                }
                ";" if at_member_level => {
                    if member.has_code {
                        let last = self.same_line_comment(index);
                        self.pos = last + 1;
                        members.push(self.finish(member.start, last, ordinal)?);
                    }
                    open = None;
                    continue;
                }
                "=" if at_member_level => member.assigned = true,
                _ => {}
            }
            member.has_code = true;
        }
    }

    fn finish(&self, first: usize, last: usize, ordinal: usize) -> Result<ScannedMember> {
        let tokens = &self.tokens[first..=last];
        let leading: Vec<&str> = tokens
            .iter()
            .take_while(|token| token.kind == TokenKind::Comment)
            .map(|token| self.text(*token))
            .collect();
        let code: Vec<&str> = tokens
            .iter()
            .filter(|token| token.kind != TokenKind::Comment)
            .map(|token| self.text(*token))
            .collect();

        let generated = is_generated(leading.iter().copied());
        let signature = if code.is_empty() {
            format!("comment:{ordinal}")
        } else {
            signature(&code).unwrap_or_else(|| format!("block:{ordinal}"))
        };

        let start = line_start(self.source, tokens[0].start);
        let end = tokens[tokens.len() - 1].end;
        Ok(ScannedMember {
            signature,
            text: self.source[start..end].to_string(),
            generated,
        })
    }
}

struct OpenMember {
    start: usize,
    assigned: bool,
    has_code: bool,
}

/// Extend `pos` back to the start of its line when only indentation precedes
/// it.
fn line_start(source: &str, pos: usize) -> usize {
    let line = source[..pos].rfind('\n').map_or(0, |n| n + 1);
    if source[line..pos].chars().all(char::is_whitespace) {
        line
    } else {
        pos
    }
}

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "abstract",
    "static",
    "final",
    "default",
    "sealed",
    "strictfp",
    "synchronized",
    "native",
    "transient",
    "volatile",
];

/// Index after the annotations and modifiers starting at `i`.
fn skip_prefix(code: &[&str], mut i: usize) -> usize {
    loop {
        match code.get(i) {
            Some(&"@") if code.get(i + 1) != Some(&"interface") => {
                i += 2;
                while code.get(i) == Some(&".") {
                    i += 2;
                }
                if code.get(i) == Some(&"(") {
                    i = skip_balanced(code, i, "(", ")");
                }
            }
            Some(text) if MODIFIERS.contains(text) => i += 1,
            Some(&"non") if code.get(i + 1) == Some(&"-") => i += 3,
            _ => return i,
        }
    }
}

/// Index after the group opened at `i`.
fn skip_balanced(code: &[&str], mut i: usize, open: &str, close: &str) -> usize {
    let mut depth = 0usize;
    while let Some(text) = code.get(i) {
        if *text == open {
            depth += 1;
        } else if *text == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return i + 1;
            }
        }
        i += 1;
    }
    i
}

fn signature(code: &[&str]) -> Option<String> {
    let i = skip_prefix(code, 0);
    let head = *code.get(i)?;
    match head {
        "class" | "interface" | "enum" | "record" => {
            return code.get(i + 1).map(|name| format!("type:{name}"));
        }
        "@" => return code.get(i + 2).map(|name| format!("type:{name}")),
        "{" => return None,
        _ => {}
    }

    let mut angles = 0usize;
    for (pos, text) in code.iter().enumerate().skip(i) {
        match *text {
            "<" => angles += 1,
            ">" => angles = angles.saturating_sub(1),
            "(" if angles == 0 => {
                let name = code.get(pos.checked_sub(1)?)?;
                let end = skip_balanced(code, pos, "(", ")");
                let parameters = parameter_types(&code[pos + 1..end.saturating_sub(1)]);
                return Some(format!("{name}({})", parameters.join(",")));
            }
            "=" | ";" | "," | "{" if angles == 0 => {
                let mut before = pos.checked_sub(1)?;
                while code.get(before) == Some(&"]") || code.get(before) == Some(&"[") {
                    before = before.checked_sub(1)?;
                }
                return Some(format!("field:{}", code[before]));
            }
            _ => {}
        }
    }
    None
}

fn parameter_types(code: &[&str]) -> Vec<String> {
    let mut types = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth = 0usize;
    for text in code {
        match *text {
            "<" | "(" => depth += 1,
            ">" | ")" => depth = depth.saturating_sub(1),
            "," if depth == 0 => {
                types.extend(parameter_type(&current));
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(text);
    }
    types.extend(parameter_type(&current));
    types
}

fn parameter_type(code: &[&str]) -> Option<String> {
    let start = skip_prefix(code, 0);
    let rest = code.get(start..)?;
    if rest.len() < 2 {
        return None;
    }
    Some(rest[..rest.len() - 1].concat())
}

fn parse_header(source: &str, header: &[Token]) -> Result<ScannedType> {
    let code: Vec<&str> = header
        .iter()
        .map(|token| &source[token.start..token.end])
        .collect();

    let mut annotations = Vec::new();
    let mut i = 0;
    while code.get(i) == Some(&"@") && code.get(i + 1) != Some(&"interface") {
        let first = i;
        i = skip_prefix_annotation(&code, i);
        annotations.push(source[header[first].start..header[i - 1].end].to_string());
    }
    i = skip_prefix(&code, i);

    let kind = match code.get(i) {
        Some(&"class") => UnitKind::Class,
        Some(&"interface") => UnitKind::Interface,
        Some(other) => {
            return Err(unparseable(format!("unsupported top-level declaration '{other}'")));
        }
        None => return Err(unparseable("missing type keyword")),
    };
    let name = code
        .get(i + 1)
        .ok_or_else(|| unparseable("missing type name"))?
        .to_string();
    i += 2;
    if code.get(i) == Some(&"<") {
        i = skip_balanced(&code, i, "<", ">");
    }

    let mut superclass = None;
    let mut interfaces = Vec::new();
    while let Some(keyword) = code.get(i) {
        let (types, next) = type_list(&code, i + 1);
        match (*keyword, kind) {
            ("extends", UnitKind::Class) => superclass = types.into_iter().next(),
            ("extends", UnitKind::Interface) | ("implements", UnitKind::Class) => {
                interfaces.extend(types)
            }
            ("permits", _) => {}
            (other, _) => return Err(unparseable(format!("unexpected '{other}' in type header"))),
        }
        i = next;
    }

    Ok(ScannedType {
        kind,
        name,
        annotations,
        superclass,
        interfaces,
    })
}

fn skip_prefix_annotation(code: &[&str], mut i: usize) -> usize {
    i += 2;
    while code.get(i) == Some(&".") {
        i += 2;
    }
    if code.get(i) == Some(&"(") {
        i = skip_balanced(code, i, "(", ")");
    }
    i.min(code.len())
}

/// Comma-separated types up to the next header keyword.
fn type_list(code: &[&str], mut i: usize) -> (Vec<String>, usize) {
    let mut types = Vec::new();
    let mut current = String::new();
    let mut angles = 0usize;
    while let Some(text) = code.get(i) {
        match *text {
            "extends" | "implements" | "permits" if angles == 0 => break,
            "<" => angles += 1,
            ">" => angles = angles.saturating_sub(1),
            "," if angles == 0 => {
                types.push(std::mem::take(&mut current));
                i += 1;
                continue;
            }
            _ => {}
        }
        current.push_str(text);
        i += 1;
    }
    if !current.is_empty() {
        types.push(current);
    }
    (types, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPER: &str = r#"package com.example.mapper;

import static com.example.mapper.OrderDynamicSqlSupport.*;

import java.util.List;

@Mapper
public interface OrderMapper extends CommonCountMapper, Auditable<Order> {
    /**
     * @mapforge.generated
     */
    @SelectKey(statement="select nextval('orders_seq')", keyProperty="row.id", before=true, resultType=Integer.class)
    int insert(InsertStatementProvider<Order> insertStatement);

    /**
     * @mapforge.generated
     */
    default int deleteByPrimaryKey(Integer id_) {
        return delete(c ->
            c.where(id, isEqualTo(id_))
        );
    }

    // closes the order; "}" in a string must not confuse the scanner
    default void close(@Param("order") final Order order, List<Map<String, Integer>> lines) {
        String brace = "}";
        char c = '{';
    }

    /**
     * @mapforge.generated do_not_delete_during_merge
     */
    BasicColumn[] selectList = BasicColumn.columnList(id, name);
}
"#;

    #[test]
    fn scans_package_imports_and_header() {
        let file = scan(MAPPER).expect("scan");
        assert_eq!(file.package.as_deref(), Some("com.example.mapper"));
        assert_eq!(
            file.imports,
            vec![
                ScannedImport {
                    name: "com.example.mapper.OrderDynamicSqlSupport.*".to_string(),
                    is_static: true,
                },
                ScannedImport {
                    name: "java.util.List".to_string(),
                    is_static: false,
                },
            ]
        );
        assert_eq!(file.declaration.kind, UnitKind::Interface);
        assert_eq!(file.declaration.name, "OrderMapper");
        assert_eq!(file.declaration.annotations, vec!["@Mapper"]);
        assert_eq!(
            file.declaration.interfaces,
            vec!["CommonCountMapper", "Auditable<Order>"]
        );
    }

    #[test]
    fn splits_and_tags_members() {
        let file = scan(MAPPER).expect("scan");
        let summary: Vec<(&str, bool)> = file
            .members
            .iter()
            .map(|member| (member.signature.as_str(), member.generated))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("insert(InsertStatementProvider<Order>)", true),
                ("deleteByPrimaryKey(Integer)", true),
                ("close(Order,List<Map<String,Integer>>)", false),
                ("field:selectList", false),
            ]
        );

        let close = &file.members[2];
        assert!(close.text.starts_with("    // closes the order"));
        assert!(close.text.ends_with("        char c = '{';\n    }"));
    }

    #[test]
    fn class_headers_split_superclass_and_interfaces() {
        let source = "public final class Order extends Base<Order> implements java.io.Serializable, Comparable<Order> {\n    private int id;\n\n    static {\n    }\n}\n";
        let file = scan(source).expect("scan");
        assert_eq!(file.declaration.kind, UnitKind::Class);
        assert_eq!(file.declaration.superclass.as_deref(), Some("Base<Order>"));
        assert_eq!(
            file.declaration.interfaces,
            vec!["java.io.Serializable", "Comparable<Order>"]
        );
        let signatures: Vec<&str> = file.members.iter().map(|m| m.signature.as_str()).collect();
        assert_eq!(signatures, vec!["field:id", "block:1"]);
    }

    #[test]
    fn field_initializers_with_braces_end_at_the_semicolon() {
        let source = "class Holder {\n    int[] values = {1, 2};\n    Runnable task = new Runnable() {\n        public void run() {}\n    };\n}\n";
        let file = scan(source).expect("scan");
        let signatures: Vec<&str> = file.members.iter().map(|m| m.signature.as_str()).collect();
        assert_eq!(signatures, vec!["field:values", "field:task"]);
    }

    #[test]
    fn comments_outside_members_are_recorded() {
        let source = "// Copyright Example Corp.
package com.example.model;

import java.io.Serializable;

/**
 * Order placed by a customer.
 */
@Entity
public class Order implements Serializable {
    private int id; // surrogate key

    /**
     * @mapforge.generated
     */
    public int getId() {
        return id;
    }
}
// end of Order
";
        let file = scan(source).expect("scan");
        assert_eq!(file.file_comments, vec!["// Copyright Example Corp."]);
        assert_eq!(file.type_comments, vec!["/**\n * Order placed by a customer.\n */"]);
        assert_eq!(file.trailing_comments, vec!["// end of Order"]);
        assert_eq!(file.members[0].text, "    private int id; // surrogate key");
        assert!(!file.members[0].generated);
        assert!(file.members[1].generated);
        assert!(file.members[1].text.starts_with("    /**"));
    }

    #[test]
    fn tagged_type_comments_are_not_hand_written() {
        let source = "/** @mapforge.generated */\n/** Kept. */\npublic interface A {\n}\n";
        let file = scan(source).expect("scan");
        assert!(file.file_comments.is_empty());
        let kept: Vec<&String> = file.hand_written_type_comments().collect();
        assert_eq!(kept, vec!["/** Kept. */"]);
    }

    #[test]
    fn rejects_what_it_cannot_reconcile() {
        assert!(scan("public enum Status { ON, OFF }").is_err());
        assert!(scan("public class Broken {\n    void run() {\n").is_err());
        assert!(scan("class A {}\nclass B {}\n").is_err());
        assert!(scan("/* nothing here").is_err());
    }
}
