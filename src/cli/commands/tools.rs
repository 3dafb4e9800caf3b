//! Check availability of external extraction tools.

use crate::extract::check_tools;

pub fn run() -> anyhow::Result<()> {
    for (tool, available) in check_tools() {
        if available {
            println!("  {} {}", console::style("✓").green(), tool);
        } else {
            println!(
                "  {} {} (install poppler-utils / tesseract-ocr)",
                console::style("✗").red(),
                tool
            );
        }
    }
    Ok(())
}
