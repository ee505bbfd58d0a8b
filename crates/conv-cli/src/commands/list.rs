//! List converters in execution order

use std::path::PathBuf;

use colored::Colorize;

use super::build_service;
use crate::error::Result;

pub fn run_list_converters(rules: &[PathBuf]) -> Result<()> {
    let service = build_service(rules)?;
    let ordered = service.ordered_providers()?;

    println!("{} Converters ({}):", "=>".blue().bold(), ordered.len());
    for (index, provider) in ordered.iter().enumerate() {
        let preceding = provider.preceding_converter_ids();
        if preceding.is_empty() {
            println!(
                "   {}. {} {}",
                index + 1,
                provider.id().cyan(),
                provider.description().dimmed()
            );
        } else {
            println!(
                "   {}. {} {} (after {})",
                index + 1,
                provider.id().cyan(),
                provider.description().dimmed(),
                preceding.join(", ")
            );
        }
    }
    Ok(())
}
