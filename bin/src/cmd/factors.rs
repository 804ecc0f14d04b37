//! Factor listing command implementation.

use ronda_factors::{FactorRegistry, available_factors};

/// Print the registered factors.
pub(crate) fn list_factors(verbose: bool) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Available Factors                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let registry = FactorRegistry::with_builtin();
    let infos = available_factors();

    for name in registry.names() {
        match infos.iter().find(|info| info.name == name) {
            Some(info) if verbose => {
                println!("  {:15} - {}", info.name, info.description);
                println!("  {:15}   category: {:?} ({})", "", info.category, info.category.description());
                println!("  {:15}   lookback: {} days", "", info.default_lookback);
                println!("  {:15}   columns:  {}", "", info.required_columns.join(", "));
                println!();
            }
            _ => println!("  {name}"),
        }
    }

    if !verbose {
        println!("\nUse --verbose for detailed factor descriptions.\n");
    }
}
