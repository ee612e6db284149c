use std::fmt::Write as _;

use super::{CompilationUnit, Field, InnerClass, Member, Method, UnitKind};

/// Javadoc tag marking a member as machine-generated. The merge scanner drops
/// tagged members from an existing file before adding the fresh ones.
pub const MARKER_TAG: &str = "@mapforge.generated";

/// Extra tag that keeps a marked member through a merge.
pub const PRESERVE_TAG: &str = "do_not_delete_during_merge";

const INDENT: &str = "    ";

/// Serialize a unit to Java source. Output depends only on the unit.
pub fn render_unit(unit: &CompilationUnit) -> String {
    let mut out = String::new();

    if !unit.file_comments.is_empty() {
        for comment in &unit.file_comments {
            let _ = writeln!(out, "{comment}");
        }
        out.push('\n');
    }

    if !unit.package().is_empty() {
        let _ = writeln!(out, "package {};", unit.package());
        out.push('\n');
    }

    if !unit.static_imports.is_empty() {
        for name in &unit.static_imports {
            let _ = writeln!(out, "import static {name};");
        }
        out.push('\n');
    }

    if !unit.imports.is_empty() {
        for name in &unit.imports {
            let _ = writeln!(out, "import {name};");
        }
        out.push('\n');
    }

    for comment in &unit.type_comments {
        let _ = writeln!(out, "{comment}");
    }
    for annotation in &unit.annotations {
        let _ = writeln!(out, "{annotation}");
    }

    out.push_str(&type_header(unit));
    out.push_str(" {\n");

    let in_interface = unit.kind == UnitKind::Interface;
    for (idx, member) in unit.members.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        render_member(&mut out, member, 1, in_interface, true);
    }

    out.push_str("}\n");
    for comment in &unit.trailing_comments {
        let _ = writeln!(out, "{comment}");
    }
    out
}

fn type_header(unit: &CompilationUnit) -> String {
    let mut header = String::from("public ");
    if unit.is_final && unit.kind == UnitKind::Class {
        header.push_str("final ");
    }
    header.push_str(unit.kind.keyword());
    header.push(' ');
    header.push_str(unit.name());

    let interfaces: Vec<String> = unit.super_interfaces.iter().map(|t| t.short_name()).collect();
    match unit.kind {
        UnitKind::Interface => {
            if !interfaces.is_empty() {
                let _ = write!(header, " extends {}", interfaces.join(", "));
            }
        }
        UnitKind::Class => {
            if let Some(superclass) = &unit.superclass {
                let _ = write!(header, " extends {}", superclass.short_name());
            }
            if !interfaces.is_empty() {
                let _ = write!(header, " implements {}", interfaces.join(", "));
            }
        }
    }
    header
}

fn render_member(out: &mut String, member: &Member, level: usize, in_interface: bool, tagged: bool) {
    let indent = INDENT.repeat(level);
    match member {
        Member::Field(field) => {
            if tagged {
                marker_doc(out, &indent);
            }
            render_field(out, field, &indent);
        }
        Member::Method(method) => {
            if tagged {
                marker_doc(out, &indent);
            }
            render_method(out, method, &indent, in_interface);
        }
        Member::InnerClass(inner) => {
            if tagged {
                marker_doc(out, &indent);
            }
            render_inner_class(out, inner, level);
        }
        Member::Verbatim(verbatim) => {
            out.push_str(&verbatim.text);
            out.push('\n');
        }
    }
}

fn marker_doc(out: &mut String, indent: &str) {
    let _ = writeln!(out, "{indent}/**");
    let _ = writeln!(out, "{indent} * {MARKER_TAG}");
    let _ = writeln!(out, "{indent} */");
}

fn render_field(out: &mut String, field: &Field, indent: &str) {
    for annotation in &field.annotations {
        let _ = writeln!(out, "{indent}{annotation}");
    }
    let mut line = format!("{indent}{}", field.visibility.keyword());
    if field.is_static {
        line.push_str("static ");
    }
    if field.is_final {
        line.push_str("final ");
    }
    let _ = write!(line, "{} {}", field.java_type.short_name(), field.name);
    if let Some(initializer) = &field.initializer {
        let _ = write!(line, " = {initializer}");
    }
    line.push(';');
    let _ = writeln!(out, "{line}");
}

fn render_method(out: &mut String, method: &Method, indent: &str, in_interface: bool) {
    for annotation in &method.annotations {
        let _ = writeln!(out, "{indent}{annotation}");
    }

    let mut line = format!("{indent}{}", method.visibility.keyword());
    if method.is_default && in_interface {
        line.push_str("default ");
    }
    if method.is_static {
        line.push_str("static ");
    }
    if method.is_abstract && !in_interface {
        line.push_str("abstract ");
    }
    if !method.constructor {
        match &method.return_type {
            Some(return_type) => line.push_str(&return_type.short_name()),
            None => line.push_str("void"),
        }
        line.push(' ');
    }
    line.push_str(&method.name);
    line.push('(');
    let parameters: Vec<String> = method
        .parameters
        .iter()
        .map(|parameter| {
            let mut text = String::new();
            for annotation in &parameter.annotations {
                text.push_str(annotation);
                text.push(' ');
            }
            let _ = write!(text, "{} {}", parameter.java_type.short_name(), parameter.name);
            text
        })
        .collect();
    line.push_str(&parameters.join(", "));
    line.push(')');

    if method.is_abstract {
        let _ = writeln!(out, "{line};");
        return;
    }

    let _ = writeln!(out, "{line} {{");
    for body_line in &method.body {
        if body_line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{indent}{INDENT}{body_line}");
        }
    }
    let _ = writeln!(out, "{indent}}}");
}

fn render_inner_class(out: &mut String, inner: &InnerClass, level: usize) {
    let indent = INDENT.repeat(level);
    let mut line = format!("{indent}{}", inner.visibility.keyword());
    if inner.is_static {
        line.push_str("static ");
    }
    if inner.is_final {
        line.push_str("final ");
    }
    let _ = write!(line, "class {}", inner.name);
    if let Some(superclass) = &inner.superclass {
        let _ = write!(line, " extends {}", superclass.short_name());
    }
    let _ = writeln!(out, "{line} {{");
    for (idx, member) in inner.members.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        render_member(out, member, level + 1, false, false);
    }
    let _ = writeln!(out, "{indent}}}");
}
