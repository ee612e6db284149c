//! Structural model of generated Java source.
//!
//! Units own their members in insertion order. Imports are kept in sorted
//! sets keyed by fully qualified name, so the same type contributed by two
//! generators is imported once.

pub mod render;

use std::collections::BTreeSet;

use mapforge_core::JavaType;

pub use render::{MARKER_TAG, PRESERVE_TAG, render_unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
    /// Package-private, or implicit in an interface.
    Default,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public ",
            Visibility::Protected => "protected ",
            Visibility::Private => "private ",
            Visibility::Default => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Interface,
    Class,
}

impl UnitKind {
    pub fn keyword(self) -> &'static str {
        match self {
            UnitKind::Interface => "interface",
            UnitKind::Class => "class",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub java_type: JavaType,
    pub annotations: Vec<String>,
}

impl Parameter {
    pub fn new(java_type: JavaType, name: &str) -> Self {
        Self {
            name: name.to_string(),
            java_type,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: &str) -> Self {
        self.annotations.push(annotation.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub java_type: JavaType,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub initializer: Option<String>,
    pub annotations: Vec<String>,
}

impl Field {
    pub fn new(java_type: JavaType, name: &str) -> Self {
        Self {
            name: name.to_string(),
            java_type,
            visibility: Visibility::Default,
            is_static: false,
            is_final: false,
            initializer: None,
            annotations: Vec::new(),
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn static_final(mut self) -> Self {
        self.is_static = true;
        self.is_final = true;
        self
    }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn initializer(mut self, initializer: impl Into<String>) -> Self {
        self.initializer = Some(initializer.into());
        self
    }
}

/// A method, constructor, or abstract interface method.
///
/// Body lines are opaque and emitted verbatim in order; the renderer adds the
/// enclosing indentation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub visibility: Visibility,
    /// `None` renders `void`, unless the method is a constructor.
    pub return_type: Option<JavaType>,
    pub constructor: bool,
    pub parameters: Vec<Parameter>,
    pub body: Vec<String>,
    pub annotations: Vec<String>,
    pub is_default: bool,
    pub is_abstract: bool,
    pub is_static: bool,
}

impl Method {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            visibility: Visibility::Default,
            return_type: None,
            constructor: false,
            parameters: Vec::new(),
            body: Vec::new(),
            annotations: Vec::new(),
            is_default: false,
            is_abstract: false,
            is_static: false,
        }
    }

    /// Interface method without a body.
    pub fn abstract_method(name: &str, return_type: JavaType) -> Self {
        let mut method = Self::new(name);
        method.return_type = Some(return_type);
        method.is_abstract = true;
        method
    }

    /// Interface method with a body.
    pub fn default_method(name: &str, return_type: JavaType) -> Self {
        let mut method = Self::new(name);
        method.return_type = Some(return_type);
        method.is_default = true;
        method
    }

    pub fn static_method(name: &str, return_type: JavaType) -> Self {
        let mut method = Self::new(name);
        method.return_type = Some(return_type);
        method.is_static = true;
        method
    }

    pub fn constructor(name: &str) -> Self {
        let mut method = Self::new(name);
        method.constructor = true;
        method.visibility = Visibility::Public;
        method
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn returning(mut self, return_type: JavaType) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    pub fn add_body_line(&mut self, line: impl Into<String>) {
        self.body.push(line.into());
    }

    pub fn add_body_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body.extend(lines.into_iter().map(Into::into));
    }

    pub fn add_annotation(&mut self, annotation: impl Into<String>) {
        self.annotations.push(annotation.into());
    }

    /// Merge signature: name plus parameter types, names and annotations stripped.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self
            .parameters
            .iter()
            .map(|p| p.java_type.short_name().replace(' ', ""))
            .collect();
        format!("{}({})", self.name, types.join(","))
    }
}

/// Static or member class nested in a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClass {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub superclass: Option<JavaType>,
    pub members: Vec<Member>,
}

impl InnerClass {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            visibility: Visibility::Public,
            is_static: true,
            is_final: true,
            superclass: None,
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Field(Field),
    Method(Method),
    InnerClass(InnerClass),
    /// Source text kept exactly as found, used for hand-written members that
    /// survive a merge.
    Verbatim(Verbatim),
}

impl Member {
    /// Key used to match members across an existing file and a fresh unit.
    pub fn signature(&self) -> String {
        match self {
            Member::Field(field) => format!("field:{}", field.name),
            Member::Method(method) => method.signature(),
            Member::InnerClass(inner) => format!("type:{}", inner.name),
            Member::Verbatim(verbatim) => verbatim.signature.clone(),
        }
    }

    pub fn is_generated(&self) -> bool {
        !matches!(self, Member::Verbatim(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verbatim {
    pub signature: String,
    pub text: String,
}

/// One output file: a top-level interface or class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub kind: UnitKind,
    pub java_type: JavaType,
    pub is_final: bool,
    pub imports: BTreeSet<String>,
    pub static_imports: BTreeSet<String>,
    pub annotations: Vec<String>,
    pub superclass: Option<JavaType>,
    pub super_interfaces: Vec<JavaType>,
    pub members: Vec<Member>,
    /// Comments above the package declaration, one source block each.
    pub file_comments: Vec<String>,
    /// Comments rendered directly above the type annotations.
    pub type_comments: Vec<String>,
    /// Comments after the closing brace of the type.
    pub trailing_comments: Vec<String>,
}

impl CompilationUnit {
    pub fn new(kind: UnitKind, java_type: JavaType) -> Self {
        Self {
            kind,
            java_type,
            is_final: false,
            imports: BTreeSet::new(),
            static_imports: BTreeSet::new(),
            annotations: Vec::new(),
            superclass: None,
            super_interfaces: Vec::new(),
            members: Vec::new(),
            file_comments: Vec::new(),
            type_comments: Vec::new(),
            trailing_comments: Vec::new(),
        }
    }

    pub fn package(&self) -> &str {
        self.java_type.package()
    }

    pub fn name(&self) -> &str {
        self.java_type.base_short_name()
    }

    pub fn file_name(&self) -> String {
        format!("{}.java", self.name())
    }

    /// Import everything needed to reference `java_type` from this unit.
    pub fn add_import(&mut self, java_type: &JavaType) {
        for name in java_type.import_names() {
            self.add_import_name(name);
        }
    }

    /// Import a fully qualified name; same-package names are skipped.
    pub fn add_import_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        let package = name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("");
        if package.is_empty() || package == self.package() || package == "java.lang" {
            return;
        }
        self.imports.insert(name);
    }

    pub fn add_static_import(&mut self, name: impl Into<String>) {
        self.static_imports.insert(name.into());
    }

    pub fn add_annotation(&mut self, annotation: impl Into<String>) {
        let annotation = annotation.into();
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
    }

    /// Add a supertype interface once, importing it.
    pub fn add_super_interface(&mut self, java_type: JavaType) {
        if !self.super_interfaces.contains(&java_type) {
            self.add_import(&java_type);
            self.super_interfaces.push(java_type);
        }
    }

    pub fn add_member(&mut self, member: Member) {
        self.members.push(member);
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.members.iter().filter_map(|member| match member {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.members.iter().filter_map(|member| match member {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods().find(|method| method.name == name)
    }

    /// A method in this unit already declares the named `@Results` map.
    pub fn declares_result_map(&self, id: &str) -> bool {
        let needle = format!("@Results(id=\"{id}\"");
        self.methods()
            .any(|method| method.annotations.iter().any(|a| a.starts_with(&needle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_collapse_into_a_set() {
        let mut unit = CompilationUnit::new(
            UnitKind::Interface,
            JavaType::new("com.example.mapper.OrderMapper"),
        );
        unit.add_import(&JavaType::list_of(JavaType::new("com.example.model.Order")));
        unit.add_import(&JavaType::new("com.example.model.Order"));
        unit.add_import(&JavaType::list_of(JavaType::string()));
        unit.add_import(&JavaType::new("com.example.mapper.OrderDynamicSqlSupport"));

        let imports: Vec<&str> = unit.imports.iter().map(String::as_str).collect();
        assert_eq!(imports, vec!["com.example.model.Order", "java.util.List"]);
    }

    #[test]
    fn method_signatures_ignore_parameter_names() {
        let mut first = Method::default_method("insert", JavaType::int());
        first.add_parameter(Parameter::new(JavaType::new("com.example.model.Order"), "row"));
        let mut second = Method::default_method("insert", JavaType::int());
        second.add_parameter(Parameter::new(JavaType::new("com.example.model.Order"), "record"));

        assert_eq!(first.signature(), "insert(Order)");
        assert_eq!(first.signature(), second.signature());
    }

    #[test]
    fn super_interfaces_are_unioned() {
        let mut unit =
            CompilationUnit::new(UnitKind::Class, JavaType::new("com.example.model.Order"));
        unit.add_super_interface(JavaType::new("java.io.Serializable"));
        unit.add_super_interface(JavaType::new("java.io.Serializable"));
        assert_eq!(unit.super_interfaces.len(), 1);
        assert!(unit.imports.contains("java.io.Serializable"));
    }
}
