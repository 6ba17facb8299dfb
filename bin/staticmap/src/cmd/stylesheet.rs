//! Stylesheet command - writes the default XSLT stylesheet

use std::{fs, path::Path};

use color_eyre::eyre::{Result, WrapErr};
use staticmap_generator::default_stylesheet;

/// Write the default sitemap stylesheet to `out`.
pub fn run(out: &Path) -> Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(out, default_stylesheet())
        .wrap_err_with(|| format!("Failed to write stylesheet: {}", out.display()))?;

    tracing::info!(path = %out.display(), "Wrote sitemap stylesheet");
    println!("  ✓ Stylesheet written to {}", out.display());
    println!("    Set [stylesheet] dir to its directory to reference it from sitemaps.");

    Ok(())
}
