// src/config/consts.rs

// Net config
pub const USER_AGENT: &str = concat!("standings_scrape/", env!("CARGO_PKG_VERSION"));
pub const TIMEOUT_SECS: u64 = 30;
pub const MAX_REDIRECTS: usize = 10;
pub const RETRIES: u32 = 2;
pub const BACKOFF_MS: u64 = 1_500; // multiplied by attempt number

// Pagination
pub const MAX_PAGES: usize = 500;

// Medals: gold / silver / bronze
pub const DEFAULT_MEDALS: (u32, u32, u32) = (4, 4, 4);

// Reference source defaults
pub const DEFAULT_ROW_SELECTOR: &str = "table tr";
pub const DEFAULT_NEXT_SELECTOR: &str = "a[rel=next]";
pub const DEFAULT_PROBLEM_GROUP: &str = "Problems";
pub const STANDINGS_SUFFIX: &str = "/standings";

// Config file
pub const DEFAULT_CONFIG_FILE: &str = "standings.toml";
