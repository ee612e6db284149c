use std::fmt;

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
];

/// A (possibly parameterized) Java type referenced by generated source.
///
/// Types are compared structurally, so two generators asking for
/// `java.util.List<Foo>` produce equal values and collapse into one import.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JavaType {
    package: String,
    base_name: String,
    arguments: Vec<JavaType>,
    primitive: bool,
    array: bool,
}

impl JavaType {
    /// Parse a fully qualified type name such as
    /// `java.util.Map<java.lang.String, com.example.Foo>` or `byte[]`.
    ///
    /// The package is the run of leading segments that start with a lowercase
    /// character, so nested types (`java.util.Map.Entry`) keep their outer name.
    pub fn new(text: &str) -> Self {
        let text = text.trim();
        let (text, array) = match text.strip_suffix("[]") {
            Some(rest) => (rest.trim_end(), true),
            None => (text, false),
        };

        let (raw_name, arguments) = match text.find('<') {
            Some(open) if text.ends_with('>') => {
                let inner = &text[open + 1..text.len() - 1];
                let arguments = split_top_level(inner)
                    .into_iter()
                    .map(JavaType::new)
                    .collect();
                (&text[..open], arguments)
            }
            _ => (text, Vec::new()),
        };

        if PRIMITIVES.contains(&raw_name) {
            return Self {
                package: String::new(),
                base_name: raw_name.to_string(),
                arguments: Vec::new(),
                primitive: true,
                array,
            };
        }

        let segments: Vec<&str> = raw_name.split('.').collect();
        let split_at = segments
            .iter()
            .position(|segment| segment.starts_with(|c: char| c.is_ascii_uppercase()))
            .unwrap_or(segments.len().saturating_sub(1));

        Self {
            package: segments[..split_at].join("."),
            base_name: segments[split_at..].join("."),
            arguments,
            primitive: false,
            array,
        }
    }

    pub fn int() -> Self {
        Self::new("int")
    }

    pub fn long() -> Self {
        Self::new("long")
    }

    pub fn string() -> Self {
        Self::new("java.lang.String")
    }

    pub fn object() -> Self {
        Self::new("java.lang.Object")
    }

    pub fn list_of(element: JavaType) -> Self {
        Self::new("java.util.List").with_argument(element)
    }

    pub fn optional_of(element: JavaType) -> Self {
        Self::new("java.util.Optional").with_argument(element)
    }

    /// Add a type argument, returning the parameterized type.
    pub fn with_argument(mut self, argument: JavaType) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Same type as an array of itself.
    pub fn as_array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive && !self.array
    }

    pub fn is_boolean_primitive(&self) -> bool {
        self.is_primitive() && self.base_name == "boolean"
    }

    /// Simple name without type arguments (e.g. `List`).
    pub fn base_short_name(&self) -> &str {
        &self.base_name
    }

    /// Fully qualified name without type arguments.
    pub fn fully_qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.base_name.clone()
        } else {
            format!("{}.{}", self.package, self.base_name)
        }
    }

    /// Name as written in source, including type arguments and array marker.
    pub fn short_name(&self) -> String {
        let mut out = self.base_name.clone();
        if !self.arguments.is_empty() {
            let arguments: Vec<String> = self.arguments.iter().map(JavaType::short_name).collect();
            out.push('<');
            out.push_str(&arguments.join(", "));
            out.push('>');
        }
        if self.array {
            out.push_str("[]");
        }
        out
    }

    /// Import statements needed to reference this type, type arguments included.
    pub fn import_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_imports(&mut names);
        names
    }

    fn collect_imports(&self, names: &mut Vec<String>) {
        if !self.primitive && !self.package.is_empty() && self.package != "java.lang" {
            let outer = self.base_name.split('.').next().unwrap_or(&self.base_name);
            names.push(format!("{}.{}", self.package, outer));
        }
        for argument in &self.arguments {
            argument.collect_imports(names);
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(input[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let last = input[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}
