//! XSLT stylesheet discovery.

use std::path::Path;

use staticmap_core::Config;
use tracing::debug;

/// File name probed in the stylesheet directory.
pub const STYLESHEET_FILE: &str = "sitemap.xsl";

/// Public URL of the sitemap stylesheet, when one is deployed.
///
/// Returns `None` unless `stylesheet.dir` contains `sitemap.xsl`. The URL is
/// downgraded to `http` when the site itself is not served over `https`.
pub fn resolve_stylesheet_url(config: &Config) -> Option<String> {
    let dir = config.stylesheet.dir.as_deref()?;
    let base = config.stylesheet.url.as_deref()?;

    if !stylesheet_exists(dir) {
        debug!(dir = %dir.display(), "no sitemap stylesheet found");
        return None;
    }

    let url = format!("{}/{STYLESHEET_FILE}", base.trim_end_matches('/'));
    Some(match_home_scheme(&url, config.home_url()))
}

fn stylesheet_exists(dir: &Path) -> bool {
    dir.join(STYLESHEET_FILE).is_file()
}

/// Downgrade an `https` asset URL when the home URL is not `https`.
pub fn match_home_scheme(asset_url: &str, home_url: &str) -> String {
    let home_is_secure = home_url
        .get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"));

    match asset_url.get(..8) {
        Some(scheme) if !home_is_secure && scheme.eq_ignore_ascii_case("https://") => {
            format!("http://{}", &asset_url[8..])
        }
        _ => asset_url.to_string(),
    }
}
