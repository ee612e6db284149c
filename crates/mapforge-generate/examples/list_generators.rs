use mapforge_core::{ColumnDescriptor, FullyQualifiedTable, JavaType, TableDescriptor};
use mapforge_generate::{ExtensionPipeline, GenerateOptions, GenerationEngine, GeneratorRegistry};

fn main() {
    for id in GeneratorRegistry::with_defaults().ids() {
        println!("{id}");
    }

    let table = TableDescriptor::new(
        FullyQualifiedTable::new(None, Some("public"), "orders"),
        vec![
            ColumnDescriptor::new("id", JavaType::new("java.lang.Integer"), "INTEGER"),
            ColumnDescriptor::new("customer_name", JavaType::string(), "VARCHAR"),
        ],
        vec!["id".to_string()],
    )
    .with_packages("com.example.model", "com.example.mapper");

    let output = GenerationEngine::new(GenerateOptions::default(), ExtensionPipeline::new())
        .generate_table(&table);
    for file in &output.files {
        println!("\n// {}\n{}", file.relative_path().display(), file.content);
    }
}
