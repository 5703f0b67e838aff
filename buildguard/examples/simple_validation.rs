//! Simple validation example: check a build against a catalog document and
//! print the report.
//! Run with: cargo run --example simple_validation [path/to/catalog.json] [part names...]

use buildguard::prelude::*;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), BuildGuardError> {
    let mut args = std::env::args().skip(1);
    let catalog_path = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/catalog.json".to_string());
    let catalog_path = Path::new(&catalog_path);

    if !catalog_path.exists() {
        eprintln!("Catalog not found: {}", catalog_path.display());
        eprintln!("Usage: cargo run --example simple_validation [path/to/catalog.json] [part names...]");
        std::process::exit(1);
    }

    let mut names: Vec<String> = args.collect();
    if names.is_empty() {
        names = vec![
            "AMD Ryzen 5 7600".to_string(),
            "ASUS ROG STRIX B650-A GAMING WIFI".to_string(),
            "EVGA 550 B5 550W".to_string(),
            "Gigabyte AORUS MASTER 8GB GeForce RTX 3070".to_string(),
        ];
    }

    let catalog = InMemoryCatalog::load(catalog_path)?;
    let result = BuildGuardCore::validate(&names, &catalog, ValidationOptions::default()).await?;

    println!("Validation results for {} parts", result.components.len());
    for diagnostic in &result.diagnostics {
        println!("  ! {}", diagnostic.message());
    }
    for detail in &result.report.details {
        println!("  - {}", detail);
    }

    if !result.report.valid {
        println!("\nIncompatible build:");
        for error in &result.report.errors {
            println!("  - {}", error);
        }
        std::process::exit(1);
    }

    println!("\nBuild is compatible.");
    Ok(())
}
