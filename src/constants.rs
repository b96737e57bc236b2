//! Application constants for Freight Manifest
//!
//! This module centralizes the heuristic tables and defaults used by the
//! extraction pipeline, organized by pipeline stage.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Overrides the translation endpoint
    pub const TRANSLATE_ENDPOINT: &str = "FREIGHT_MANIFEST_TRANSLATE_ENDPOINT";
}

/// Batch (balance) number discovery
pub mod batch {
    /// Rows in the top-left block scanned for the batch number
    pub const SCAN_ROWS: usize = 10;

    /// Columns in the top-left block scanned for the batch number
    pub const SCAN_COLUMNS: usize = 10;

    /// The cell where partners usually put the batch number (row, column), 1-indexed
    pub const WELL_KNOWN_CELL: (usize, usize) = (2, 4);

    /// Equivalent shapes of a batch number: letter, 1-5 digits, separator, letter
    pub const NUMBER_PATTERNS: [&str; 3] = [
        r"([A-Za-z][0-9]{1,5}-[A-Za-z])",
        r"([A-Za-z][0-9]{1,5}/[A-Za-z])",
        r"([A-Za-z][0-9]{1,5}\s+[A-Za-z])",
    ];

    /// Extracts the digit run of a batch number
    pub const NUMERIC_PART_PATTERN: &str = r"[A-Za-z]([0-9]{1,5})[-/\s][A-Za-z]";

    /// Labels that sit next to the batch number ("balance", "batch", bilingual form title)
    pub const KEYWORDS: [&str; 4] = ["баланс", "партия", "单据名称：", "balance"];
}

/// Data range detection
pub mod range {
    /// Client code shape: 1-4 letters, 1-7 digits, 0-2 trailing letters
    pub const CLIENT_CODE_PATTERN: &str = r"^[A-Z]{1,4}[0-9]{1,7}[A-Z]{0,2}$";

    /// Consecutive non-matching rows that confirm the end of the data
    pub const END_GAP_ROWS: usize = 3;
}

/// Column mapping
pub mod columns {
    /// Fuzzy scores must exceed this to be accepted
    pub const FUZZY_THRESHOLD: u8 = 70;

    /// Score assigned to a verbatim keyword hit
    pub const EXACT_MATCH_SCORE: u8 = 100;

    /// Column that always holds the client code
    pub const CLIENT_CODE_COLUMN: usize = 1;

    /// Column that always holds the departure date
    pub const DEPARTURE_COLUMN: usize = 3;

    /// Freight tariff cells look like "182$" or "182.5$"
    pub const FREIGHT_TARIFF_PATTERN: &str = r"^\d+(\.\d+)?\$$";
}

/// Field normalization
pub mod normalize {
    /// First decimal number inside free text, matched after digit folding
    pub const DECIMAL_PATTERN: &str = r"([0-9]+(\.[0-9]+)?)";

    /// First digit run inside a client code
    pub const DIGIT_RUN_PATTERN: &str = r"([0-9]+)";

    /// Digit zero of each non-ASCII decimal block folded to ASCII before parsing
    pub const FOLDED_DIGIT_ZEROS: [u32; 6] = [0x0660, 0x06F0, 0x0966, 0x09E6, 0x0E50, 0xFF10];

    /// Short departure date code, e.g. "0123"
    pub const SHORT_DATE_PATTERN: &str = r"^\d{4}$";
}

/// Document loading limits
pub mod loader {
    /// Largest sheet materialized as a bulk tabular view
    pub const MAX_TABULAR_CELLS: usize = 2_000_000;

    /// Leading bytes of a ZIP container (xlsx, xlsm)
    pub const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

    /// Leading bytes of an OLE compound document (xls)
    pub const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
}

/// Translation service configuration
pub mod translate {
    use super::Duration;

    /// Default mobile translate endpoint
    pub const DEFAULT_ENDPOINT: &str = "https://translate.google.com/m";

    /// CSS selector holding the translated text
    pub const RESULT_SELECTOR: &str = "div.result-container";

    /// User agent for translation requests
    pub const USER_AGENT: &str = "Freight-Manifest/0.1.0 (Manifest Import Tool)";

    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default rate limit (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Maximum retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 2;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 250;

    /// Poll interval while waiting for the rate limiter (milliseconds)
    pub const RATE_LIMIT_POLL_MS: u64 = 20;
}

/// Reporter layout
pub mod report {
    /// Product names longer than this are truncated in the overview table
    pub const NAME_WIDTH: usize = 30;

    /// Records shown in the detail section
    pub const DETAIL_RECORDS: usize = 10;

    /// Width of the banner rule
    pub const RULE_WIDTH: usize = 80;
}

/// Configuration file locations
pub mod config {
    /// Project-local config file name
    pub const LOCAL_FILE: &str = "freight-manifest.toml";

    /// Directory under the user config dir
    pub const APP_DIR: &str = "freight-manifest";

    /// Config file name inside the app dir
    pub const FILE_NAME: &str = "config.toml";
}

/// Period used when the caller supplies none
pub const DEFAULT_PERIOD_ID: &str = "unknown";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        for pattern in batch::NUMBER_PATTERNS {
            assert!(regex::Regex::new(pattern).is_ok());
        }
        assert!(regex::Regex::new(batch::NUMERIC_PART_PATTERN).is_ok());
        assert!(regex::Regex::new(range::CLIENT_CODE_PATTERN).is_ok());
        assert!(regex::Regex::new(columns::FREIGHT_TARIFF_PATTERN).is_ok());
        assert!(regex::Regex::new(normalize::DECIMAL_PATTERN).is_ok());
    }

    #[test]
    fn test_layout_invariants() {
        assert!(columns::DEPARTURE_COLUMN > columns::CLIENT_CODE_COLUMN);
        assert!(columns::FUZZY_THRESHOLD < columns::EXACT_MATCH_SCORE);
        assert!(batch::WELL_KNOWN_CELL.0 <= batch::SCAN_ROWS);
    }
}
