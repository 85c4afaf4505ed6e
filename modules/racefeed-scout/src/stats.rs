/// Stats from a crawl run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_crawled: u32,
    pub page_failures: u32,
    pub entries_seen: u32,
    pub entries_skipped: u32,
    pub entries_saved: u32,
    pub entries_refreshed: u32,
    pub detail_failures: u32,
    pub search_failures: u32,
    pub mirrors_created: u32,
    pub mirror_failures: u32,
    pub numbered_links_found: u32,
    pub catalog_size: usize,
}

impl std::fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Crawl Complete ===")?;
        writeln!(f, "Pages crawled:      {}", self.pages_crawled)?;
        if self.page_failures > 0 {
            writeln!(f, "Page failures:      {}", self.page_failures)?;
        }
        writeln!(f, "Entries seen:       {}", self.entries_seen)?;
        writeln!(f, "Already scraped:    {}", self.entries_skipped)?;
        writeln!(f, "Entries saved:      {}", self.entries_saved)?;
        if self.entries_refreshed > 0 {
            writeln!(f, "  of which refreshed: {}", self.entries_refreshed)?;
        }
        writeln!(f, "\nSources:")?;
        writeln!(f, "  Mirrors created:  {}", self.mirrors_created)?;
        writeln!(f, "  Cross-site links: {}", self.numbered_links_found)?;
        writeln!(f, "\nFailures (skipped, not retried):")?;
        writeln!(f, "  Detail pages:     {}", self.detail_failures)?;
        writeln!(f, "  Cross-site:       {}", self.search_failures)?;
        writeln!(f, "  Remote mirror:    {}", self.mirror_failures)?;
        write!(f, "\nSaved {} races", self.catalog_size)
    }
}
