//! List commands implementation

use crate::links;

/// List all supported links
pub fn list_links() {
    println!("Supported links:");
    println!();
    for link in links::available_links() {
        let aliases = if link.aliases.is_empty() {
            String::new()
        } else {
            format!(" (alias: {})", link.aliases.join(", "))
        };
        println!("  {:8} - {}{}", link.name, link.description, aliases);
    }
}
