// src/config.rs

//! Run configuration
//!
//! Every knob for a run lives in one TOML file loaded at startup: GitHub
//! coordinates, the OCI page table, registry layout, and chunking
//! parameters. The parsed [`Config`] is immutable and threaded through
//! every component call; nothing reads ambient global state after startup
//! (the one exception is the token fallback to `GITHUB_TOKEN`, resolved
//! exactly once when the store client is built).
//!
//! [`Config::default`] carries the real OCI page table and registry
//! layout, so a freshly generated file works without edits apart from the
//! GitHub coordinates and token.

use crate::error::{Error, Result};
use crate::oci::PageFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name looked up in the working directory by default
pub const DEFAULT_CONFIG_PATH: &str = "satdex.toml";

/// Environment variable consulted when `github.token` is empty
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Top-level run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote store coordinates and credentials
    #[serde(default)]
    pub github: GithubSection,

    /// Content source origin and page table
    #[serde(default)]
    pub source: SourceSection,

    /// Registry directory layout and placeholder set
    #[serde(default)]
    pub registry: RegistrySection,

    /// Ledger partitioning parameters
    #[serde(default)]
    pub chunking: ChunkingSection,

    /// Top-level failure policy
    #[serde(default)]
    pub run: RunSection,
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to read {}: {e} (run `satdex init-config` to create one)",
                path.display()
            ))
        })?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| Error::ConfigError(format!("Invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as pretty TOML (for `init-config`)
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize configuration: {e}")))
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.source.pages.is_empty() {
            return Err(Error::ConfigError(
                "source.pages is empty; at least one page is required".to_string(),
            ));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::ConfigError(
                "chunking.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.registry.range_width == 0 {
            return Err(Error::ConfigError(
                "registry.range_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote store coordinates (GitHub contents API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSection {
    /// Repository owner (user or organization)
    #[serde(default)]
    pub owner: String,

    /// Repository name
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Target branch for every read and write
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Personal access token; falls back to the `GITHUB_TOKEN`
    /// environment variable when empty
    #[serde(default)]
    pub token: String,

    /// API base URL (override for GitHub Enterprise or tests)
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl GithubSection {
    /// Resolve the access token from config or environment
    pub fn resolve_token(&self) -> Option<String> {
        if !self.token.is_empty() {
            return Some(self.token.clone());
        }
        std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty())
    }
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: default_repo(),
            branch: default_branch(),
            token: String::new(),
            api_base: default_api_base(),
        }
    }
}

/// Content source origin and per-page declarations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Origin every page path is joined against
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Ordered page table; order defines merge order, not key order
    #[serde(default = "default_pages")]
    pub pages: Vec<PageSpec>,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            pages: default_pages(),
        }
    }
}

/// One page of the on-chain index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSpec {
    /// Content path relative to the source origin
    pub path: String,

    /// Raw encoding of this page
    pub format: PageFormat,

    /// Block height of the page's first slot
    pub offset: u64,

    /// Dense-array width for the sparse formats (ignored by `dense`)
    #[serde(default = "default_page_width")]
    pub width: usize,
}

/// Registry directory layout and placeholder file set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Directory name used both remotely and under `output_dir`
    #[serde(default = "default_registry_dir")]
    pub dir: String,

    /// Local staging root
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of numbered range files to scaffold
    #[serde(default = "default_range_files")]
    pub range_files: u64,

    /// Key span covered by each range file
    #[serde(default = "default_range_width")]
    pub range_width: u64,

    /// Index file names (each becomes `index_{name}.txt`)
    #[serde(default = "default_index_names")]
    pub index_names: Vec<String>,

    /// Chunk file names pre-seeded empty for ranges known to hold no
    /// entries yet
    #[serde(default = "default_placeholder_chunks")]
    pub placeholder_chunks: Vec<String>,
}

impl RegistrySection {
    /// Local staging directory for registry files
    pub fn local_dir(&self) -> PathBuf {
        self.output_dir.join(&self.dir)
    }
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            dir: default_registry_dir(),
            output_dir: default_output_dir(),
            range_files: default_range_files(),
            range_width: default_range_width(),
            index_names: default_index_names(),
            placeholder_chunks: default_placeholder_chunks(),
        }
    }
}

/// Ledger partitioning parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingSection {
    /// Entries per chunk file (the last chunk may be short)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Upper bound on produced chunks per run
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

impl Default for ChunkingSection {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_chunks: default_max_chunks(),
        }
    }
}

/// Top-level failure policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunSection {
    /// When true, unrecoverable errors are logged and the process still
    /// exits zero (the default is to propagate them)
    #[serde(default)]
    pub best_effort: bool,
}

fn default_repo() -> String {
    "BNS".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_origin() -> String {
    "https://ordinals.com".to_string()
}

fn default_page_width() -> usize {
    100_000
}

/// The published OCI page table: eight sparse pages, two flat-encoded
/// pages, and the dense tail starting at height 840000 (deliberately
/// below `9 * width`; the tail overlaps the last sparse page's span).
fn default_pages() -> Vec<PageSpec> {
    let table: [(&str, PageFormat, u64); 10] = [
        (
            "/content/01bba6c58af39d7f199aa2bceeaaba1ba91b23d2663bc4ef079a4b5e442dbf74i0",
            PageFormat::Sparse,
            0,
        ),
        (
            "/content/bb01dfa977a5cd0ee6e900f1d1f896b5ec4b1e3c7b18f09c952f25af6591809fi0",
            PageFormat::Sparse,
            100_000,
        ),
        (
            "/content/bb02e94f3062facf6aa2e47eeed348d017fd31c97614170dddb58fc59da304efi0",
            PageFormat::SparseFlat,
            200_000,
        ),
        (
            "/content/bb037ec98e6700e8415f95d1f5ca1fe1ba23a3f0c5cb7284d877e9ac418d0d32i0",
            PageFormat::SparseFlat,
            300_000,
        ),
        (
            "/content/bb9438f4345f223c6f4f92adf6db12a82c45d1724019ecd7b6af4fcc3f5786cei0",
            PageFormat::Sparse,
            400_000,
        ),
        (
            "/content/bb0542d4606a9e7eb4f31051e91f7696040db06ca1383dff98505618c34d7df7i0",
            PageFormat::Sparse,
            500_000,
        ),
        (
            "/content/bb06a4dffba42b6b513ddee452b40a67688562be4a1345127e4d57269e6b2ab6i0",
            PageFormat::Sparse,
            600_000,
        ),
        (
            "/content/bb076934c1c22007b315dd1dc0f8c4a2f9d52f348320cfbadc7c0bd99eaa5e18i0",
            PageFormat::Sparse,
            700_000,
        ),
        (
            "/content/bb986a1208380ec7db8df55a01c88c73a581069a51b5a2eb2734b41ba10b65c2i0",
            PageFormat::Sparse,
            800_000,
        ),
        (
            "/content/b907b51a239e3a37f29f8222fb274f828c6ebf7b93ce501a55b7171daaa75758i0",
            PageFormat::Dense,
            840_000,
        ),
    ];
    table
        .into_iter()
        .map(|(path, format, offset)| PageSpec {
            path: path.to_string(),
            format,
            offset,
            width: default_page_width(),
        })
        .collect()
}

fn default_registry_dir() -> String {
    "Registry".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./registry")
}

fn default_range_files() -> u64 {
    91
}

fn default_range_width() -> u64 {
    10_000
}

fn default_index_names() -> Vec<String> {
    [
        "A", "C", "D", "E", "F", "G", "H", "I", "J", "L", "M", "N", "NIU", "O", "P", "Q", "R",
        "S", "T", "U", "V", "W", "X", "Y", "Z", "0-9",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_placeholder_chunks() -> Vec<String> {
    vec![
        "sat_0-45015204752.txt".to_string(),
        "sat_1959805473124159-2099999997690000.txt".to_string(),
    ]
}

fn default_chunk_size() -> usize {
    9070
}

fn default_max_chunks() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_table() {
        let pages = default_pages();
        assert_eq!(pages.len(), 10);

        // Two flat pages sit in the middle of the table
        assert_eq!(pages[2].format, PageFormat::SparseFlat);
        assert_eq!(pages[3].format, PageFormat::SparseFlat);

        // The dense tail starts below 9 * width
        let tail = pages.last().unwrap();
        assert_eq!(tail.format, PageFormat::Dense);
        assert_eq!(tail.offset, 840_000);

        // Every other page is sparse at index * width
        for (i, page) in pages.iter().enumerate().take(9) {
            assert_eq!(page.offset, i as u64 * 100_000);
            if i != 2 && i != 3 {
                assert_eq!(page.format, PageFormat::Sparse);
            }
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let rendered = config.to_toml_string().unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed.source.pages.len(), config.source.pages.len());
        assert_eq!(reparsed.github.branch, "main");
        assert_eq!(reparsed.chunking.chunk_size, 9070);
        assert_eq!(reparsed.registry.index_names.len(), 26);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.source.origin, "https://ordinals.com");
        assert_eq!(config.registry.range_files, 91);
        assert_eq!(config.chunking.max_chunks, 100);
        assert!(!config.run.best_effort);
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_page_table() {
        let mut config = Config::default();
        config.source.pages.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configured_token_wins() {
        let section = GithubSection {
            token: "conf-token".to_string(),
            ..GithubSection::default()
        };
        assert_eq!(section.resolve_token().as_deref(), Some("conf-token"));
    }

    #[test]
    fn test_local_dir_joins_registry_name() {
        let registry = RegistrySection::default();
        assert_eq!(registry.local_dir(), PathBuf::from("./registry/Registry"));
    }
}
