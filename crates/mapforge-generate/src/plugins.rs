//! Extension pipeline: ordered interceptors keyed by artifact kind.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use mapforge_config::PluginRef;
use mapforge_core::{JavaType, TableDescriptor};
use tracing::debug;

use crate::dom::{CompilationUnit, Field, Member, Method, Visibility};
use crate::generators::{Artifact, ArtifactKind};
use crate::model::{GenerationIssue, codes};

/// What an interceptor is looking at.
pub enum Subject<'a> {
    Artifact(&'a mut Artifact),
    Unit(&'a mut CompilationUnit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

/// Hook invoked for every artifact or unit of the kinds it is registered for.
///
/// Interceptors may mutate the subject; later interceptors see the mutation.
pub trait Interceptor: Send + Sync {
    fn id(&self) -> &'static str;

    fn intercept(
        &self,
        kind: ArtifactKind,
        subject: &mut Subject<'_>,
        table: &TableDescriptor,
    ) -> Verdict;
}

/// Outcome of running one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interception {
    pub invoked: usize,
    pub rejected_by: Vec<&'static str>,
}

impl Interception {
    pub fn accepted(&self) -> bool {
        self.rejected_by.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct ExtensionPipeline {
    hooks: BTreeMap<ArtifactKind, Vec<Arc<dyn Interceptor>>>,
}

impl fmt::Debug for ExtensionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: BTreeMap<&ArtifactKind, Vec<&'static str>> = self
            .hooks
            .iter()
            .map(|(kind, chain)| (kind, chain.iter().map(|i| i.id()).collect()))
            .collect();
        f.debug_struct("ExtensionPipeline")
            .field("hooks", &hooks)
            .finish()
    }
}

impl ExtensionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pipeline for the configured plugin list, in list order.
    /// Unknown ids are reported and skipped.
    pub fn from_plugins(plugins: &[PluginRef]) -> (Self, Vec<GenerationIssue>) {
        let mut pipeline = Self::new();
        let mut issues = Vec::new();
        for plugin in plugins {
            match builtin(plugin) {
                Some(hooks) => {
                    for (kind, interceptor) in hooks {
                        pipeline.register(kind, interceptor);
                    }
                }
                None => issues.push(GenerationIssue::warning(
                    codes::CONFIGURATION_ERROR,
                    format!("unknown plugin '{}' ignored", plugin.id),
                )),
            }
        }
        (pipeline, issues)
    }

    /// Append an interceptor to the chain of `kind`.
    pub fn register(&mut self, kind: ArtifactKind, interceptor: Arc<dyn Interceptor>) {
        self.hooks.entry(kind).or_default().push(interceptor);
    }

    pub fn chain_len(&self, kind: ArtifactKind) -> usize {
        self.hooks.get(&kind).map_or(0, Vec::len)
    }

    /// Run every interceptor registered for `kind`, in order.
    ///
    /// A rejection does not stop the chain: the remaining interceptors still
    /// run and the verdict is the conjunction of all responses.
    pub fn intercept(
        &self,
        kind: ArtifactKind,
        mut subject: Subject<'_>,
        table: &TableDescriptor,
    ) -> Interception {
        let mut outcome = Interception::default();
        let Some(chain) = self.hooks.get(&kind) else {
            return outcome;
        };
        for interceptor in chain {
            outcome.invoked += 1;
            if interceptor.intercept(kind, &mut subject, table) == Verdict::Reject {
                debug!(
                    table = %table.table(),
                    artifact = %kind,
                    interceptor = interceptor.id(),
                    "interceptor rejected"
                );
                outcome.rejected_by.push(interceptor.id());
            }
        }
        outcome
    }
}

fn builtin(plugin: &PluginRef) -> Option<Vec<(ArtifactKind, Arc<dyn Interceptor>)>> {
    let hooks: Vec<(ArtifactKind, Arc<dyn Interceptor>)> = match plugin.id.as_str() {
        "serializable" => {
            let suppress_interface = plugin
                .properties
                .get("suppress_java_interface")
                .is_some_and(|value| value.eq_ignore_ascii_case("true"));
            vec![(
                ArtifactKind::RecordClass,
                Arc::new(SerializableInterceptor { suppress_interface }),
            )]
        }
        "to_string" => vec![(ArtifactKind::RecordClass, Arc::new(ToStringInterceptor))],
        _ => return None,
    };
    Some(hooks)
}

/// Makes records `java.io.Serializable`.
pub struct SerializableInterceptor {
    /// Keep the version field but leave the supertype list alone.
    pub suppress_interface: bool,
}

impl Interceptor for SerializableInterceptor {
    fn id(&self) -> &'static str {
        "serializable"
    }

    fn intercept(
        &self,
        _kind: ArtifactKind,
        subject: &mut Subject<'_>,
        _table: &TableDescriptor,
    ) -> Verdict {
        let Subject::Unit(unit) = subject else {
            return Verdict::Accept;
        };
        if !self.suppress_interface {
            unit.add_super_interface(JavaType::new("java.io.Serializable"));
        }
        if !unit.fields().any(|field| field.name == "serialVersionUID") {
            let field = Field::new(JavaType::long(), "serialVersionUID")
                .visibility(Visibility::Private)
                .static_final()
                .initializer("1L");
            unit.members.insert(0, Member::Field(field));
        }
        Verdict::Accept
    }
}

/// Adds a `toString` listing every instance field.
pub struct ToStringInterceptor;

impl Interceptor for ToStringInterceptor {
    fn id(&self) -> &'static str {
        "to_string"
    }

    fn intercept(
        &self,
        _kind: ArtifactKind,
        subject: &mut Subject<'_>,
        _table: &TableDescriptor,
    ) -> Verdict {
        let Subject::Unit(unit) = subject else {
            return Verdict::Accept;
        };
        if unit.method("toString").is_some() {
            return Verdict::Accept;
        }

        let mut method = Method::new("toString")
            .visibility(Visibility::Public)
            .returning(JavaType::string());
        method.add_annotation("@Override");
        method.add_body_line("StringBuilder sb = new StringBuilder();");
        method.add_body_line("sb.append(getClass().getSimpleName());");
        method.add_body_line("sb.append(\" [\");");
        method.add_body_line("sb.append(\"Hash = \").append(hashCode());");
        let names: Vec<String> = unit
            .fields()
            .filter(|field| !field.is_static)
            .map(|field| field.name.clone())
            .collect();
        for name in names {
            method.add_body_line(format!("sb.append(\", {name}=\").append({name});"));
        }
        method.add_body_line("sb.append(\"]\");");
        method.add_body_line("return sb.toString();");
        unit.add_member(Member::Method(method));
        Verdict::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::dom::UnitKind;
    use mapforge_core::{ColumnDescriptor, FullyQualifiedTable};

    struct Recording {
        id: &'static str,
        verdict: Verdict,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Interceptor for Recording {
        fn id(&self) -> &'static str {
            self.id
        }

        fn intercept(
            &self,
            _kind: ArtifactKind,
            _subject: &mut Subject<'_>,
            _table: &TableDescriptor,
        ) -> Verdict {
            if let Ok(mut log) = self.log.lock() {
                log.push(self.id);
            }
            self.verdict
        }
    }

    fn table() -> TableDescriptor {
        TableDescriptor::new(
            FullyQualifiedTable::new(None, None, "orders"),
            vec![ColumnDescriptor::new("id", JavaType::new("java.lang.Integer"), "INTEGER")],
            vec!["id".to_string()],
        )
        .with_packages("com.example.model", "com.example.mapper")
    }

    fn record_unit() -> CompilationUnit {
        let mut unit = CompilationUnit::new(UnitKind::Class, JavaType::new("com.example.model.Orders"));
        unit.add_member(Member::Field(
            Field::new(JavaType::new("java.lang.Integer"), "id").visibility(Visibility::Private),
        ));
        unit
    }

    #[test]
    fn every_interceptor_runs_after_a_rejection() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ExtensionPipeline::new();
        for (id, verdict) in [
            ("first", Verdict::Accept),
            ("veto", Verdict::Reject),
            ("last", Verdict::Accept),
        ] {
            pipeline.register(
                ArtifactKind::RecordClass,
                Arc::new(Recording {
                    id,
                    verdict,
                    log: Arc::clone(&log),
                }),
            );
        }

        let mut unit = record_unit();
        let outcome = pipeline.intercept(ArtifactKind::RecordClass, Subject::Unit(&mut unit), &table());

        assert!(!outcome.accepted());
        assert_eq!(outcome.invoked, 3);
        assert_eq!(outcome.rejected_by, vec!["veto"]);
        assert_eq!(*log.lock().unwrap(), vec!["first", "veto", "last"]);
    }

    #[test]
    fn unregistered_kind_accepts() {
        let pipeline = ExtensionPipeline::new();
        let mut unit = record_unit();
        let outcome = pipeline.intercept(ArtifactKind::MapperInterface, Subject::Unit(&mut unit), &table());
        assert!(outcome.accepted());
        assert_eq!(outcome.invoked, 0);
    }

    #[test]
    fn builtins_mutate_the_record() {
        let plugins = vec![
            PluginRef {
                id: "serializable".to_string(),
                properties: BTreeMap::new(),
            },
            PluginRef {
                id: "to_string".to_string(),
                properties: BTreeMap::new(),
            },
            PluginRef {
                id: "equals_hash_code".to_string(),
                properties: BTreeMap::new(),
            },
        ];
        let (pipeline, issues) = ExtensionPipeline::from_plugins(&plugins);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::CONFIGURATION_ERROR);
        assert_eq!(pipeline.chain_len(ArtifactKind::RecordClass), 2);

        let mut unit = record_unit();
        let outcome = pipeline.intercept(ArtifactKind::RecordClass, Subject::Unit(&mut unit), &table());
        assert!(outcome.accepted());
        assert!(unit.imports.contains("java.io.Serializable"));
        assert_eq!(unit.members[0].signature(), "field:serialVersionUID");

        let to_string = unit.method("toString").expect("toString added");
        assert!(to_string.body.contains(&"sb.append(\", id=\").append(id);".to_string()));
        assert!(!to_string.body.iter().any(|line| line.contains("serialVersionUID")));
    }
}
