/// Numeric identifier of a scraping provider.
pub type ProviderId = i64;

/// Numeric identifier of a scheduled scrape job.
pub type JobId = i64;
