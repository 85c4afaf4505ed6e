//! End-to-end crawl tests against mocked sites.
//!
//! Each test builds a MockFetcher holding the listing, detail, search, and
//! player pages, runs the Crawler against a catalog in a temp dir, and checks
//! both the returned catalog and the file on disk.

use std::fs;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use racefeed_common::{CatalogEntry, SourceLabel, StreamLinks};
use racefeed_scout::crawler::Crawler;
use racefeed_scout::sites::Sites;
use racefeed_scout::store::{Catalog, CatalogStore};
use racefeed_scout::testing::*;

const LISTING: &str = "https://fullraces.com";
const SEARCH: &str = "https://watchf1full.com";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sites() -> Sites {
    Sites::new(LISTING, SEARCH).unwrap()
}

fn page_url(page: u32) -> String {
    sites().page_url(page)
}

fn search_url(title: &str) -> String {
    sites().search_url(title)
}

fn detail_url(slug: &str) -> String {
    format!("{LISTING}/news/{slug}.html")
}

fn href(slug: &str) -> String {
    format!("/news/{slug}.html")
}

fn empty_listing() -> String {
    listing_page(&[])
}

fn read_file(path: &Path) -> Vec<CatalogEntry> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn slugs(entries: &[CatalogEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.slug.as_str()).collect()
}

fn existing_entry(slug: &str, title: &str, links: &[(&str, &str)]) -> CatalogEntry {
    let mut stream_links = StreamLinks::new();
    for (label, url) in links {
        stream_links.insert(label.parse().unwrap(), *url);
    }
    CatalogEntry {
        id: format!("id-{slug}"),
        title: title.to_string(),
        link: detail_url(slug),
        thumbnail: String::new(),
        slug: slug.to_string(),
        thumbnail_slug: "/".to_string(),
        stream_links,
        extra: Default::default(),
    }
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_entry_gets_direct_and_mirrored_links() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    let title = "Monaco GP 2024";

    let fetcher = MockFetcher::new()
        .on_page(&page_url(1), &listing_page(&[listing_item(title, &href("monaco"))]))
        .on_page(&page_url(2), &empty_listing())
        .on_page(
            &detail_url("monaco"),
            &detail_page(&["https://filemoon.sx/e/moon", "//luluvdo.com/e/lulu"]),
        )
        .on_page(
            &search_url(title),
            &search_page(&[("Canadian GP 2024", "https://watchf1full.com/canada.html")]),
        );
    let mirror = MockMirror::new().on_source("https://filemoon.sx/e/moon", "https://filemoon.sx/e/copy");

    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites())
        .with_mirror(Arc::new(mirror));
    let mut catalog = Catalog::new();
    let stats = crawler.run(&mut catalog).await.unwrap();

    assert_eq!(stats.entries_saved, 1);
    assert_eq!(stats.mirrors_created, 1);

    let saved = read_file(&path);
    assert_eq!(saved.len(), 1);
    let entry = &saved[0];
    assert_eq!(entry.title, title);
    assert_eq!(entry.slug, "monaco");
    assert_eq!(entry.link, detail_url("monaco"));
    assert!(!entry.id.is_empty());

    let links = &entry.stream_links;
    assert_eq!(links.get(SourceLabel::Server1), Some("https://filemoon.sx/e/moon"));
    assert_eq!(links.get(SourceLabel::Server2), Some("https://luluvdo.com/e/lulu"));
    assert_eq!(links.get(SourceLabel::CustomServer), Some("https://filemoon.sx/e/copy"));
    assert_eq!(links.numbered_len(), 0);
    assert_eq!(links.len(), 3);
}

#[tokio::test]
async fn similar_cross_site_result_adds_numbered_links() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    let title = "F1 2024 Monaco Grand Prix Full Race";

    let fetcher = MockFetcher::new()
        .on_page(&page_url(1), &listing_page(&[listing_item(title, &href("monaco"))]))
        .on_page(&page_url(2), &empty_listing())
        .on_page(&detail_url("monaco"), &detail_page(&[]))
        .on_page(
            &search_url(title),
            &search_page(&[("Monaco GP 2024", "https://watchf1full.com/monaco.html")]),
        )
        .on_page(
            "https://watchf1full.com/monaco.html",
            &player_page(&["https://p1.example/e/1", "https://p2.example/e/2"]),
        );

    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites());
    let mut catalog = Catalog::new();
    crawler.run(&mut catalog).await.unwrap();

    let links = &catalog.get("monaco").unwrap().stream_links;
    assert_eq!(links.get(SourceLabel::Stream(3)), Some("https://p1.example/e/1"));
    assert_eq!(links.get(SourceLabel::Stream(4)), Some("https://p2.example/e/2"));
    assert_eq!(links.server1, None);
    assert_eq!(links.custom_server, None);
}

#[tokio::test]
async fn repeated_player_frames_each_get_a_label() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    let title = "Monaco GP 2024";

    let fetcher = MockFetcher::new()
        .on_page(&page_url(1), &listing_page(&[listing_item(title, &href("monaco"))]))
        .on_page(&page_url(2), &empty_listing())
        .on_page(&detail_url("monaco"), &detail_page(&[]))
        .on_page(
            &search_url(title),
            &search_page(&[("Monaco GP 2024", "https://watchf1full.com/m.html")]),
        )
        .on_page(
            "https://watchf1full.com/m.html",
            &player_page(&["https://p/a", "https://p/a", "https://p/b"]),
        );

    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites());
    let mut catalog = Catalog::new();
    crawler.run(&mut catalog).await.unwrap();

    let links = &read_file(&path)[0].stream_links;
    assert_eq!(links.get(SourceLabel::Stream(3)), Some("https://p/a"));
    assert_eq!(links.get(SourceLabel::Stream(4)), Some("https://p/a"));
    assert_eq!(links.get(SourceLabel::Stream(5)), Some("https://p/b"));
}

// ---------------------------------------------------------------------------
// Known slugs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn known_slug_is_skipped_without_network_and_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    let store = CatalogStore::new(&path);

    let known = existing_entry(
        "monaco",
        "Monaco GP 2024",
        &[("server1", "https://filemoon.sx/e/old"), ("stream3", "https://p/old")],
    );
    let before = serde_json::to_string_pretty(&known).unwrap();
    store.save(&Catalog::from_entries(vec![known])).unwrap();

    let fetcher = Arc::new(
        MockFetcher::new()
            .on_page(
                &page_url(1),
                &listing_page(&[
                    listing_item("Monaco GP 2024", &href("monaco")),
                    listing_item("Spanish GP 2024", &href("spain")),
                ]),
            )
            .on_page(&page_url(2), &empty_listing())
            .on_page(&detail_url("spain"), &detail_page(&[]))
            .on_page(&search_url("Spanish GP 2024"), &search_page(&[])),
    );
    let mirror = Arc::new(MockMirror::new());

    let mut catalog = store.load();
    let crawler = Crawler::new(fetcher.clone(), CatalogStore::new(&path), sites())
        .with_mirror(mirror.clone());
    let stats = crawler.run(&mut catalog).await.unwrap();

    assert_eq!(stats.entries_skipped, 1);
    assert_eq!(stats.entries_saved, 1);
    assert!(!fetcher.requested(&detail_url("monaco")));
    assert!(!fetcher.requested(&search_url("Monaco GP 2024")));
    assert!(mirror.calls().is_empty());

    let saved = read_file(&path);
    assert_eq!(slugs(&saved), vec!["monaco", "spain"]);
    assert_eq!(serde_json::to_string_pretty(&saved[0]).unwrap(), before);

    let raw = fs::read_to_string(&path).unwrap();
    let indented_before = before.replace('\n', "\n  ");
    assert!(raw.contains(&indented_before));
}

/// A known entry as another tool might have written it: legacy key
/// spellings, an extra field, labels out of order, and an unlabelled key.
const HAND_WRITTEN_ENTRY: &str = r#"{
    "id": "legacy-1",
    "title": "Monaco GP 2024",
    "link": "https://fullraces.com/news/monaco.html",
    "slug": "monaco",
    "date": "2024-05-26",
    "thumbnailslug": "/a/b/c.jpg",
    "streamlinks": {
      "stream3": "https://p/3",
      "server1": "https://filemoon.sx/e/old",
      "server9": "https://h/9"
    }
  }"#;

#[tokio::test]
async fn skipped_entry_survives_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    fs::write(&path, format!("[\n  {HAND_WRITTEN_ENTRY}\n]")).unwrap();
    let store = CatalogStore::new(&path);

    let fetcher = Arc::new(
        MockFetcher::new()
            .on_page(
                &page_url(1),
                &listing_page(&[
                    listing_item("Monaco GP 2024", &href("monaco")),
                    listing_item("Spanish GP 2024", &href("spain")),
                ]),
            )
            .on_page(&page_url(2), &empty_listing())
            .on_page(&detail_url("spain"), &detail_page(&[]))
            .on_page(&search_url("Spanish GP 2024"), &search_page(&[])),
    );

    let mut catalog = store.load();
    let crawler = Crawler::new(fetcher.clone(), CatalogStore::new(&path), sites());
    let stats = crawler.run(&mut catalog).await.unwrap();

    assert_eq!(stats.entries_saved, 1);
    assert!(!fetcher.requested(&detail_url("monaco")));

    let raw = fs::read_to_string(&path).unwrap();
    assert!(
        raw.starts_with(&format!("[\n  {HAND_WRITTEN_ENTRY},\n")),
        "known entry was rewritten:\n{raw}"
    );
    assert_eq!(slugs(&read_file(&path)), vec!["monaco", "spain"]);
}

#[tokio::test]
async fn refresh_keeps_fields_it_does_not_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    fs::write(&path, format!("[\n  {HAND_WRITTEN_ENTRY}\n]")).unwrap();
    let store = CatalogStore::new(&path);

    let title = "Monaco GP 2024";
    let fetcher = MockFetcher::new()
        .on_page(&page_url(1), &listing_page(&[listing_item(title, &href("monaco"))]))
        .on_page(&page_url(2), &empty_listing())
        .on_page(&detail_url("monaco"), &detail_page(&["https://filemoon.sx/e/new"]))
        .on_page(&search_url(title), &search_page(&[]));

    let mut catalog = store.load();
    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites())
        .with_refresh(vec!["monaco".to_string()]);
    crawler.run(&mut catalog).await.unwrap();

    let saved: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let monaco = &saved[0];
    assert_eq!(monaco["id"], "legacy-1");
    assert_eq!(monaco["date"], "2024-05-26");
    assert_eq!(monaco["streamLinks"]["server1"], "https://filemoon.sx/e/new");
    assert_eq!(monaco["streamLinks"]["stream3"], "https://p/3");
    assert_eq!(monaco["streamLinks"]["server9"], "https://h/9");
    assert!(monaco.get("streamlinks").is_none());
}

#[tokio::test]
async fn slug_listed_twice_in_one_run_is_saved_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");

    let fetcher = Arc::new(
        MockFetcher::new()
            .on_page(&page_url(1), &listing_page(&[listing_item("Monaco GP", &href("monaco"))]))
            .on_page(&page_url(2), &listing_page(&[listing_item("Monaco GP", &href("monaco"))]))
            .on_page(&page_url(3), &empty_listing())
            .on_page(&detail_url("monaco"), &detail_page(&[]))
            .on_page(&search_url("Monaco GP"), &search_page(&[])),
    );

    let crawler = Crawler::new(fetcher.clone(), CatalogStore::new(&path), sites());
    let mut catalog = Catalog::new();
    let stats = crawler.run(&mut catalog).await.unwrap();

    assert_eq!(stats.entries_saved, 1);
    assert_eq!(stats.entries_skipped, 1);
    assert_eq!(fetcher.requests_containing("monaco.html").len(), 1);
    assert_eq!(slugs(&read_file(&path)), vec!["monaco"]);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn interrupted_run_keeps_every_finished_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    let store = CatalogStore::new(&path);
    store
        .save(&Catalog::from_entries(vec![existing_entry("old", "Old Race", &[])]))
        .unwrap();

    let mut fetcher = MockFetcher::new()
        .on_page(
            &page_url(1),
            &listing_page(&[
                listing_item("Race A", &href("a")),
                listing_item("Race B", &href("b")),
                listing_item("Race C", &href("c")),
            ]),
        )
        .panic_on(&detail_url("c"));
    for (slug, title) in [("a", "Race A"), ("b", "Race B")] {
        fetcher = fetcher
            .on_page(&detail_url(slug), &detail_page(&["https://filemoon.to/e/x"]))
            .on_page(&search_url(title), &search_page(&[]));
    }

    let mut catalog = store.load();
    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites());
    let result = AssertUnwindSafe(crawler.run(&mut catalog)).catch_unwind().await;
    assert!(result.is_err(), "the simulated crash should abort the run");

    let saved = read_file(&path);
    assert_eq!(slugs(&saved), vec!["old", "a", "b"]);
    assert_eq!(saved[0].id, "id-old");
}

#[tokio::test]
async fn each_entry_is_written_before_the_next_starts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");

    let fetcher = MockFetcher::new()
        .on_page(
            &page_url(1),
            &listing_page(&[listing_item("Race A", &href("a")), listing_item("Race B", &href("b"))]),
        )
        .on_page(&detail_url("a"), &detail_page(&[]))
        .on_page(&search_url("Race A"), &search_page(&[]))
        .panic_on(&detail_url("b"));

    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites());
    let mut catalog = Catalog::new();
    let _ = AssertUnwindSafe(crawler.run(&mut catalog)).catch_unwind().await;

    assert_eq!(slugs(&read_file(&path)), vec!["a"]);
}

#[tokio::test]
async fn unreadable_catalog_treats_every_slug_as_new() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    fs::write(&path, "[{ truncated").unwrap();
    let store = CatalogStore::new(&path);

    let fetcher = MockFetcher::new()
        .on_page(&page_url(1), &listing_page(&[listing_item("Race A", &href("a"))]))
        .on_page(&page_url(2), &empty_listing())
        .on_page(&detail_url("a"), &detail_page(&[]))
        .on_page(&search_url("Race A"), &search_page(&[]));

    let mut catalog = store.load();
    assert!(catalog.is_empty());
    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites());
    crawler.run(&mut catalog).await.unwrap();

    assert_eq!(slugs(&read_file(&path)), vec!["a"]);
    assert_eq!(fs::read_to_string(store.unreadable_path()).unwrap(), "[{ truncated");
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_detail_page_still_searches_cross_site() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    let title = "Monaco GP 2024";

    let fetcher = Arc::new(
        MockFetcher::new()
            .on_page(&page_url(1), &listing_page(&[listing_item(title, &href("monaco"))]))
            .on_page(&page_url(2), &empty_listing())
            .on_page(
                &search_url(title),
                &search_page(&[("Monaco GP 2024", "https://watchf1full.com/m.html")]),
            )
            .on_page("https://watchf1full.com/m.html", &player_page(&["https://p/1"])),
    );
    let mirror = Arc::new(MockMirror::new());

    let crawler = Crawler::new(fetcher, CatalogStore::new(&path), sites()).with_mirror(mirror.clone());
    let mut catalog = Catalog::new();
    let stats = crawler.run(&mut catalog).await.unwrap();

    assert_eq!(stats.detail_failures, 1);
    assert!(mirror.calls().is_empty(), "no server1 means no upload");
    let links = &catalog.get("monaco").unwrap().stream_links;
    assert_eq!(links.server1, None);
    assert_eq!(links.server2, None);
    assert_eq!(links.get(SourceLabel::Stream(3)), Some("https://p/1"));
}

#[tokio::test]
async fn mirror_and_search_failures_only_drop_their_own_links() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    let title = "Monaco GP 2024";

    let fetcher = MockFetcher::new()
        .on_page(&page_url(1), &listing_page(&[listing_item(title, &href("monaco"))]))
        .on_page(&page_url(2), &empty_listing())
        .on_page(&detail_url("monaco"), &detail_page(&["https://filemoon.sx/e/moon"]));
    let mirror = MockMirror::new().failing("https://filemoon.sx/e/moon");

    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites())
        .with_mirror(Arc::new(mirror));
    let mut catalog = Catalog::new();
    let stats = crawler.run(&mut catalog).await.unwrap();

    assert_eq!(stats.mirror_failures, 1);
    assert_eq!(stats.search_failures, 1);
    let links = &read_file(&path)[0].stream_links;
    assert_eq!(links.get(SourceLabel::Server1), Some("https://filemoon.sx/e/moon"));
    assert_eq!(links.len(), 1);
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pages_are_walked_in_order_until_one_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");

    let fetcher = Arc::new(
        MockFetcher::new()
            .on_page(&page_url(1), &listing_page(&[listing_item("Race A", &href("a"))]))
            .on_page(&page_url(2), &listing_page(&[listing_item("Race B", &href("b"))]))
            .on_page(&page_url(3), &empty_listing())
            .on_page(&page_url(4), &listing_page(&[listing_item("Race D", &href("d"))]))
            .on_page(&detail_url("a"), &detail_page(&[]))
            .on_page(&detail_url("b"), &detail_page(&[]))
            .on_page(&search_url("Race A"), &search_page(&[]))
            .on_page(&search_url("Race B"), &search_page(&[])),
    );

    let crawler = Crawler::new(fetcher.clone(), CatalogStore::new(&path), sites());
    let mut catalog = Catalog::new();
    let stats = crawler.run(&mut catalog).await.unwrap();

    assert_eq!(stats.pages_crawled, 2);
    assert_eq!(slugs(&read_file(&path)), vec!["a", "b"]);
    assert!(fetcher.requested(&page_url(3)));
    assert!(!fetcher.requested(&page_url(4)));
}

#[tokio::test]
async fn failed_page_fetch_ends_crawl_and_keeps_work() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");

    // Page 2 is not registered, so fetching it fails.
    let fetcher = MockFetcher::new()
        .on_page(&page_url(1), &listing_page(&[listing_item("Race A", &href("a"))]))
        .on_page(&detail_url("a"), &detail_page(&[]))
        .on_page(&search_url("Race A"), &search_page(&[]));

    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites());
    let mut catalog = Catalog::new();
    let stats = crawler.run(&mut catalog).await.unwrap();

    assert_eq!(stats.page_failures, 1);
    assert_eq!(stats.catalog_size, 1);
    assert_eq!(slugs(&read_file(&path)), vec!["a"]);
}

#[tokio::test]
async fn page_limit_stops_early() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");

    let fetcher = Arc::new(
        MockFetcher::new()
            .on_page(&page_url(1), &listing_page(&[listing_item("Race A", &href("a"))]))
            .on_page(&page_url(2), &listing_page(&[listing_item("Race B", &href("b"))]))
            .on_page(&detail_url("a"), &detail_page(&[]))
            .on_page(&search_url("Race A"), &search_page(&[])),
    );

    let crawler =
        Crawler::new(fetcher.clone(), CatalogStore::new(&path), sites()).with_max_pages(Some(1));
    let mut catalog = Catalog::new();
    crawler.run(&mut catalog).await.unwrap();

    assert!(!fetcher.requested(&page_url(2)));
    assert_eq!(slugs(&read_file(&path)), vec!["a"]);
}

// ---------------------------------------------------------------------------
// Manual refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refreshed_slug_is_merged_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("races.json");
    let store = CatalogStore::new(&path);
    store
        .save(&Catalog::from_entries(vec![
            existing_entry(
                "monaco",
                "Monaco GP 2024",
                &[
                    ("server1", "https://filemoon.sx/e/old"),
                    ("server2", "https://luluvdo.com/e/old"),
                    ("stream3", "https://p/old"),
                ],
            ),
            existing_entry("spain", "Spanish GP 2024", &[]),
        ]))
        .unwrap();

    let title = "Monaco GP 2024";
    let fetcher = MockFetcher::new()
        .on_page(
            &page_url(1),
            &listing_page(&[
                listing_item("Spanish GP 2024", &href("spain")),
                listing_item(title, &href("monaco")),
            ]),
        )
        .on_page(&page_url(2), &empty_listing())
        .on_page(&detail_url("monaco"), &detail_page(&["https://filemoon.sx/e/new"]))
        .on_page(
            &search_url(title),
            &search_page(&[("Monaco GP 2024", "https://watchf1full.com/m.html")]),
        )
        .on_page("https://watchf1full.com/m.html", &player_page(&["https://p/new"]));

    let mut catalog = store.load();
    let crawler = Crawler::new(Arc::new(fetcher), CatalogStore::new(&path), sites())
        .with_refresh(vec!["monaco".to_string()]);
    let stats = crawler.run(&mut catalog).await.unwrap();

    assert_eq!(stats.entries_refreshed, 1);
    assert_eq!(stats.entries_skipped, 1);

    let saved = read_file(&path);
    assert_eq!(slugs(&saved), vec!["monaco", "spain"]);
    let monaco = &saved[0];
    assert_eq!(monaco.id, "id-monaco");

    let links = &monaco.stream_links;
    assert_eq!(links.get(SourceLabel::Server1), Some("https://filemoon.sx/e/new"));
    assert_eq!(links.get(SourceLabel::Server2), Some("https://luluvdo.com/e/old"));
    assert_eq!(links.get(SourceLabel::Stream(3)), Some("https://p/new"));
    assert_eq!(links.get(SourceLabel::Stream(4)), Some("https://p/old"));
}
