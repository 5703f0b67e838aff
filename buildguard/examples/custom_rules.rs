//! Example: extending the rule battery with a descriptor of your own
//! (without touching the engine).
//! Run with: cargo run --example custom_rules

use buildguard::catalog::ProductRecord;
use buildguard::prelude::*;
use buildguard::{AttributeKind, Check, CompatibilityRule, Operand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let catalog = InMemoryCatalog::from_products(vec![
        ProductRecord::new("ASUS TUF B650", Category::Motherboard)
            .with_attribute("socket", "AM5")
            .with_attribute("memory type", "DDR5"),
        ProductRecord::new("Ryzen 5 7600", Category::Cpu).with_attribute("socket", "AM5"),
        ProductRecord::new("Corsair Vengeance LPX 16GB DDR4", Category::Memory)
            .with_attribute("memory type", "DDR4"),
    ]);

    let memory_type = AttributeKind::Custom("memory type".to_string());
    let mut engine = CompatibilityEngine::with_default_rules();
    engine.add_rule(
        CompatibilityRule::new(
            "memory_type",
            "RAM-Motherboard",
            Check::Equal {
                left: Operand::new(Category::Memory, memory_type.clone()),
                right: Operand::new(Category::Motherboard, memory_type),
            },
        )
        .with_description("Memory generation must match the motherboard slots"),
    );

    let names: Vec<String> = ["Ryzen 5 7600", "ASUS TUF B650", "Corsair Vengeance LPX 16GB DDR4"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let result =
        BuildGuardCore::validate_with_engine(&names, &catalog, &engine, ValidationOptions::default())
            .await?;

    println!("Custom validation ran {} rules", result.report.outcomes.len());
    for outcome in &result.report.outcomes {
        println!("  [{}] {}", outcome.rule_id, outcome.outcome.message());
    }

    if !result.report.valid {
        std::process::exit(1);
    }
    Ok(())
}
