//! Sitemap XML rendering.
//!
//! Produces `urlset` documents for shards and a `sitemapindex` document
//! referencing them. Text is escaped once, when a descriptor is built; the
//! renderer writes descriptor text verbatim.

use std::fmt;

use chrono::{DateTime, Utc};
use staticmap_core::{ChangeFreq, Priority};

use crate::metadata::PageMetadata;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const URLSET_XSD: &str = "http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd";
const SITEINDEX_XSD: &str = "http://www.sitemaps.org/schemas/sitemap/0.9/siteindex.xsd";

/// Timestamp layout used by `<lastmod>`.
pub const LASTMOD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

/// Text that has already been escaped for XML.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmlText(String);

impl XmlText {
    /// Escape raw text.
    pub fn escape(raw: &str) -> Self {
        Self(escape_xml(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for XmlText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `<url>` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDescriptor {
    pub location: XmlText,
    pub last_modified: Option<DateTime<Utc>>,
    pub change_freq: Option<ChangeFreq>,
    pub priority: Option<Priority>,
}

impl PageDescriptor {
    /// Build a descriptor from a raw absolute URL. Returns `None` for an
    /// empty location.
    pub fn new(location: &str, metadata: PageMetadata) -> Option<Self> {
        if location.trim().is_empty() {
            return None;
        }
        Some(Self {
            location: XmlText::escape(location),
            last_modified: metadata.last_modified,
            change_freq: metadata.change_freq,
            priority: metadata.priority,
        })
    }
}

/// One `<sitemap>` entry of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapFileDescriptor {
    pub location: XmlText,
    pub last_modified: Option<DateTime<Utc>>,
}

impl SitemapFileDescriptor {
    pub fn new(location: &str, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            location: XmlText::escape(location),
            last_modified,
        }
    }
}

/// Renders sitemap documents.
#[derive(Debug, Clone, Default)]
pub struct SitemapRenderer {
    stylesheet_href: Option<XmlText>,
}

impl SitemapRenderer {
    /// Create a renderer. `stylesheet_href` is the raw URL of the XSLT
    /// stylesheet, if one should be referenced.
    #[must_use]
    pub fn new(stylesheet_href: Option<&str>) -> Self {
        Self {
            stylesheet_href: stylesheet_href.map(XmlText::escape),
        }
    }

    /// Render a shard as a `urlset` document.
    pub fn render_urlset(&self, pages: &[PageDescriptor]) -> String {
        // Roughly one line of 150 bytes per entry.
        let mut xml = String::with_capacity(512 + pages.len() * 150);
        self.push_preamble(&mut xml);
        xml.push_str(&format!(
            r#"<urlset xmlns:xsi="{XSI_NS}" xsi:schemaLocation="{SITEMAP_NS} {URLSET_XSD}" xmlns="{SITEMAP_NS}">"#
        ));
        xml.push('\n');

        for page in pages {
            xml.push_str("  <url><loc>");
            xml.push_str(page.location.as_str());
            xml.push_str("</loc>");
            if let Some(lastmod) = &page.last_modified {
                xml.push_str(&format!("<lastmod>{}</lastmod>", lastmod.format(LASTMOD_FORMAT)));
            }
            if let Some(freq) = &page.change_freq {
                xml.push_str(&format!("<changefreq>{freq}</changefreq>"));
            }
            if let Some(priority) = &page.priority {
                xml.push_str(&format!("<priority>{priority}</priority>"));
            }
            xml.push_str("</url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Render the `sitemapindex` document.
    pub fn render_index(&self, sitemaps: &[SitemapFileDescriptor]) -> String {
        let mut xml = String::with_capacity(512 + sitemaps.len() * 120);
        self.push_preamble(&mut xml);
        xml.push_str(&format!(
            r#"<sitemapindex xmlns:xsi="{XSI_NS}" xsi:schemaLocation="{SITEMAP_NS} {SITEINDEX_XSD}" xmlns="{SITEMAP_NS}">"#
        ));
        xml.push('\n');

        for sitemap in sitemaps {
            xml.push_str("  <sitemap><loc>");
            xml.push_str(sitemap.location.as_str());
            xml.push_str("</loc>");
            if let Some(lastmod) = &sitemap.last_modified {
                xml.push_str(&format!("<lastmod>{}</lastmod>", lastmod.format(LASTMOD_FORMAT)));
            }
            xml.push_str("</sitemap>\n");
        }

        xml.push_str("</sitemapindex>\n");
        xml
    }

    fn push_preamble(&self, xml: &mut String) {
        xml.push_str(XML_DECLARATION);
        if let Some(href) = &self.stylesheet_href {
            xml.push_str(&format!(r#"<?xml-stylesheet type="text/xsl" href="{href}"?>"#));
        }
    }
}

/// Escape special XML characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Default XSLT stylesheet rendering both document kinds as HTML tables.
#[must_use]
pub fn default_stylesheet() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<xsl:stylesheet version="1.0"
    xmlns:xsl="http://www.w3.org/1999/XSL/Transform"
    xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">

<xsl:output method="html" version="1.0" encoding="UTF-8" indent="yes"/>

<xsl:template match="/">
<html>
<head>
    <meta charset="UTF-8"/>
    <title>XML Sitemap</title>
    <style>
        body { font-family: sans-serif; color: #1f2937; margin: 2rem; }
        table { border-collapse: collapse; width: 100%; }
        th, td { text-align: left; padding: 0.4rem 0.8rem; border-bottom: 1px solid #e5e7eb; }
        th { background: #f3f4f6; }
        a { color: #2563eb; text-decoration: none; }
        .count { color: #6b7280; }
    </style>
</head>
<body>
    <h1>XML Sitemap</h1>
    <xsl:choose>
        <xsl:when test="sm:sitemapindex">
            <p class="count">This index references <xsl:value-of select="count(sm:sitemapindex/sm:sitemap)"/> sitemaps.</p>
            <table>
                <tr><th>Sitemap</th><th>Last modified</th></tr>
                <xsl:for-each select="sm:sitemapindex/sm:sitemap">
                    <tr>
                        <td><a href="{sm:loc}"><xsl:value-of select="sm:loc"/></a></td>
                        <td><xsl:value-of select="concat(substring(sm:lastmod, 1, 10), ' ', substring(sm:lastmod, 12, 5))"/></td>
                    </tr>
                </xsl:for-each>
            </table>
        </xsl:when>
        <xsl:otherwise>
            <p class="count">This sitemap contains <xsl:value-of select="count(sm:urlset/sm:url)"/> URLs.</p>
            <table>
                <tr><th>URL</th><th>Priority</th><th>Change frequency</th><th>Last modified</th></tr>
                <xsl:for-each select="sm:urlset/sm:url">
                    <tr>
                        <td><a href="{sm:loc}"><xsl:value-of select="sm:loc"/></a></td>
                        <td><xsl:value-of select="sm:priority"/></td>
                        <td><xsl:value-of select="sm:changefreq"/></td>
                        <td><xsl:value-of select="concat(substring(sm:lastmod, 1, 10), ' ', substring(sm:lastmod, 12, 5))"/></td>
                    </tr>
                </xsl:for-each>
            </table>
        </xsl:otherwise>
    </xsl:choose>
</body>
</html>
</xsl:template>

</xsl:stylesheet>
"#
}
