//! End-to-end tests for staticmap.
//!
//! These tests run full builds against in-memory and snapshot stores and
//! inspect the published files.

use std::{fs, path::Path};

use staticmap_core::{
    Config, ContentItem, ContentKind, MemoryStore, Priority, SnapshotStore,
};
use staticmap_generator::{BuildError, BuildOutcome, Builder, OutputWriter};
use tempfile::TempDir;

const HOME: &str = "https://example.com";

fn config_for(public: &TempDir) -> Config {
    let mut config = Config::new(HOME);
    config.site.public_dir = public.path().to_path_buf();
    config
}

fn post(id: u64) -> ContentItem {
    let day = id % 28 + 1;
    let minute = id % 60;
    ContentItem::new(id, ContentKind::Post, format!("post-{id}"))
        .with_date(&format!("2024-01-{day:02} 10:{minute:02}:00"))
        .with_modified(&format!("2024-02-{day:02} 10:{minute:02}:00"))
}

fn page(id: u64, slug: &str) -> ContentItem {
    ContentItem::new(id, ContentKind::Page, slug).with_date("2023-06-01 09:00:00")
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap_or_else(|e| panic!("read {name}: {e}"))
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_small_corpus_writes_single_sitemap() {
    let public = TempDir::new().unwrap();
    let store = MemoryStore::new(
        HOME,
        vec![post(1), post(2), post(3), page(10, "about")],
    );

    let outcome = Builder::new(config_for(&public), store).build().unwrap();
    let stats = outcome.stats().expect("files written");
    assert_eq!(stats.pages, 4);
    assert_eq!(stats.shards, 1);

    let dir = public.path().join("sitemaps");
    assert_eq!(listing(&dir), vec!["sitemap.xml"]);

    let xml = read(&dir, "sitemap.xml");
    assert!(xml.contains("<urlset "));
    assert!(!xml.contains("<sitemapindex"));
    assert_eq!(xml.matches("<url>").count(), 4);
    assert_eq!(xml.matches("<priority>0.6</priority>").count(), 4);
    assert_eq!(xml.matches("<changefreq>monthly</changefreq>").count(), 3);
    assert_eq!(xml.matches("<changefreq>weekly</changefreq>").count(), 1);
    assert!(xml.contains(
        "<loc>https://example.com/about/</loc><lastmod>2023-06-01T09:00:00+00:00</lastmod>"
    ));
}

#[test]
fn test_exact_capacity_has_no_index() {
    let public = TempDir::new().unwrap();
    let mut config = config_for(&public);
    config.sitemap.items_per_sitemap = 5;
    let store = MemoryStore::new(HOME, (1..=5).map(post).collect());

    Builder::new(config, store).build().unwrap();

    let dir = public.path().join("sitemaps");
    assert_eq!(listing(&dir), vec!["sitemap.xml"]);
    assert_eq!(read(&dir, "sitemap.xml").matches("<url>").count(), 5);
}

#[test]
fn test_one_over_capacity_writes_index_and_two_shards() {
    let public = TempDir::new().unwrap();
    let mut config = config_for(&public);
    config.sitemap.items_per_sitemap = 5;
    let store = MemoryStore::new(HOME, (1..=6).map(post).collect());

    let outcome = Builder::new(config, store).build().unwrap();
    let stats = outcome.stats().unwrap();
    assert_eq!(stats.shards, 2);
    assert_eq!(stats.files, 3);

    let dir = public.path().join("sitemaps");
    assert_eq!(
        listing(&dir),
        vec!["sitemap-1.xml", "sitemap-2.xml", "sitemap.xml"]
    );
    assert_eq!(read(&dir, "sitemap-1.xml").matches("<url>").count(), 5);
    assert_eq!(read(&dir, "sitemap-2.xml").matches("<url>").count(), 1);

    let index = read(&dir, "sitemap.xml");
    assert!(index.contains("<sitemapindex "));
    assert!(index.contains("siteindex.xsd"));
    assert!(index.contains(
        "<sitemap><loc>https://example.com/sitemaps/sitemap-1.xml</loc><lastmod>2024-02-07T10:06:00+00:00</lastmod></sitemap>"
    ));
    assert!(index.contains("<loc>https://example.com/sitemaps/sitemap-2.xml</loc>"));
}

#[test]
fn test_shards_preserve_store_order() {
    let public = TempDir::new().unwrap();
    let mut config = config_for(&public);
    config.sitemap.items_per_sitemap = 3;
    let store = MemoryStore::new(HOME, (1..=7).map(post).collect());

    Builder::new(config, store).build().unwrap();

    let dir = public.path().join("sitemaps");
    let locs: Vec<String> = ["sitemap-1.xml", "sitemap-2.xml", "sitemap-3.xml"]
        .iter()
        .flat_map(|name| {
            read(&dir, name)
                .lines()
                .filter_map(|line| {
                    let start = line.find("<loc>")? + "<loc>".len();
                    let end = line.find("</loc>")?;
                    Some(line[start..end].to_string())
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let expected: Vec<String> = (1..=7)
        .rev()
        .map(|id| format!("https://example.com/post-{id}/"))
        .collect();
    assert_eq!(locs, expected);
}

#[test]
fn test_rebuild_is_byte_identical() {
    let public = TempDir::new().unwrap();
    let mut config = config_for(&public);
    config.sitemap.items_per_sitemap = 4;
    let store = MemoryStore::new(HOME, (1..=10).map(post).collect());
    let builder = Builder::new(config, store);

    builder.build().unwrap();
    let dir = public.path().join("sitemaps");
    let first: Vec<(String, String)> = listing(&dir)
        .into_iter()
        .map(|name| {
            let body = read(&dir, &name);
            (name, body)
        })
        .collect();

    builder.build().unwrap();
    let second: Vec<(String, String)> = listing(&dir)
        .into_iter()
        .map(|name| {
            let body = read(&dir, &name);
            (name, body)
        })
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_ampersand_escaped_exactly_once() {
    let public = TempDir::new().unwrap();
    let mut item = post(1);
    item.permalink = Some("https://example.com/search/?q=fish&chips".to_string());
    let store = MemoryStore::new(HOME, vec![item]);

    Builder::new(config_for(&public), store).build().unwrap();

    let xml = read(&public.path().join("sitemaps"), "sitemap.xml");
    assert_eq!(
        xml.matches("<loc>https://example.com/search/?q=fish&amp;chips</loc>")
            .count(),
        1
    );
    assert!(!xml.contains("&amp;amp;"));
}

#[test]
fn test_priority_floor_applies_to_posts_only() {
    let public = TempDir::new().unwrap();
    let mut config = config_for(&public);
    config.sitemap.priority.posts = Priority::new(0.2).unwrap();
    config.sitemap.priority.pages = Priority::new(0.2).unwrap();
    config.sitemap.priority.posts_min = Priority::new(0.3).unwrap();
    let store = MemoryStore::new(HOME, vec![post(1), page(2, "contact")]);

    Builder::new(config, store).build().unwrap();

    let xml = read(&public.path().join("sitemaps"), "sitemap.xml");
    let post_line = xml.lines().find(|l| l.contains("/post-1/")).unwrap();
    let page_line = xml.lines().find(|l| l.contains("/contact/")).unwrap();
    assert!(post_line.contains("<priority>0.3</priority>"));
    assert!(page_line.contains("<priority>0.2</priority>"));
}

#[test]
fn test_empty_corpus_writes_nothing() {
    let public = TempDir::new().unwrap();
    let store = MemoryStore::new(HOME, vec![]);

    let outcome = Builder::new(config_for(&public), store).build().unwrap();
    assert_eq!(outcome, BuildOutcome::Empty { cleared: false });
    assert!(!public.path().join("sitemaps").exists());
}

#[test]
fn test_empty_corpus_keeps_or_clears_prior_output() {
    let public = TempDir::new().unwrap();
    Builder::new(config_for(&public), MemoryStore::new(HOME, vec![post(1)]))
        .build()
        .unwrap();
    let dir = public.path().join("sitemaps");

    let outcome = Builder::new(config_for(&public), MemoryStore::new(HOME, vec![]))
        .build()
        .unwrap();
    assert_eq!(outcome, BuildOutcome::Empty { cleared: false });
    assert!(dir.join("sitemap.xml").exists());

    let mut config = config_for(&public);
    config.sitemap.clear_on_empty = true;
    let outcome = Builder::new(config, MemoryStore::new(HOME, vec![]))
        .build()
        .unwrap();
    assert_eq!(outcome, BuildOutcome::Empty { cleared: true });
    assert!(!dir.exists());
}

#[test]
fn test_shrinking_corpus_removes_stale_shards() {
    let public = TempDir::new().unwrap();
    let mut config = config_for(&public);
    config.sitemap.items_per_sitemap = 2;

    Builder::new(config.clone(), MemoryStore::new(HOME, (1..=5).map(post).collect()))
        .build()
        .unwrap();
    let dir = public.path().join("sitemaps");
    assert_eq!(listing(&dir).len(), 4);

    Builder::new(config, MemoryStore::new(HOME, vec![post(1)]))
        .build()
        .unwrap();
    assert_eq!(listing(&dir), vec!["sitemap.xml"]);
}

#[test]
fn test_memory_limit_leaves_prior_output() {
    let public = TempDir::new().unwrap();
    Builder::new(config_for(&public), MemoryStore::new(HOME, vec![post(1)]))
        .build()
        .unwrap();
    let dir = public.path().join("sitemaps");
    let before = read(&dir, "sitemap.xml");

    let mut config = config_for(&public);
    config.limits.memory_limit = Some("1K".to_string());
    let err = Builder::new(config, MemoryStore::new(HOME, (1..=50).map(post).collect()))
        .build()
        .unwrap_err();

    assert!(matches!(err, BuildError::MemoryLimitExceeded { limit: 1024, .. }));
    assert_eq!(read(&dir, "sitemap.xml"), before);
    assert!(!OutputWriter::new(public.path(), "sitemaps").is_locked());
}

#[test]
fn test_stylesheet_instruction_when_deployed() {
    let public = TempDir::new().unwrap();
    let assets = TempDir::new().unwrap();
    fs::write(assets.path().join("sitemap.xsl"), "<xsl/>").unwrap();

    let mut config = config_for(&public);
    config.site.home_url = "http://example.com".to_string();
    config.stylesheet.dir = Some(assets.path().to_path_buf());
    config.stylesheet.url = Some("https://example.com/assets".to_string());
    let store = MemoryStore::new("http://example.com", vec![post(1)]);

    Builder::new(config, store).build().unwrap();

    let xml = read(&public.path().join("sitemaps"), "sitemap.xml");
    assert!(xml.starts_with(concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<?xml-stylesheet type="text/xsl" href="http://example.com/assets/sitemap.xsl"?>"#,
        "<urlset "
    )));
}

#[test]
fn test_build_from_snapshot_store() {
    let public = TempDir::new().unwrap();
    let snapshot = public.path().join("content.json");
    fs::write(
        &snapshot,
        r#"[
            {"id": 1, "type": "page", "slug": "company", "date_gmt": "2023-01-01 00:00:00"},
            {"id": 2, "type": "page", "slug": "team", "parent": 1, "date_gmt": "2023-01-02 00:00:00"},
            {"id": 3, "type": "post", "slug": "launch", "date_gmt": "2024-05-01 08:00:00",
             "modified_gmt": "0000-00-00 00:00:00"},
            {"id": 4, "type": "post", "slug": "secret", "password": "x"},
            {"id": 5, "type": "page", "slug": "home", "date_gmt": "2022-01-01 00:00:00"}
        ]"#,
    )
    .unwrap();

    let mut config = config_for(&public);
    config.site.front_page_id = Some(5);
    let store = SnapshotStore::open(&snapshot, HOME).unwrap();

    let outcome = Builder::new(config, store).build().unwrap();
    assert_eq!(outcome.stats().unwrap().pages, 3);

    let xml = read(&public.path().join("sitemaps"), "sitemap.xml");
    let locs: Vec<&str> = xml
        .lines()
        .filter_map(|line| {
            let start = line.find("<loc>")? + "<loc>".len();
            let end = line.find("</loc>")?;
            Some(&line[start..end])
        })
        .collect();
    assert_eq!(
        locs,
        vec![
            "https://example.com/launch/",
            "https://example.com/company/team/",
            "https://example.com/company/",
        ]
    );
    assert!(xml.contains("<lastmod>2024-05-01T08:00:00+00:00</lastmod>"));
}
