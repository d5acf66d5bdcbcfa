use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use feedex::config::Config;
use feedex::feed::{self, ExtractOptions, Extraction};

/// Refuse to slurp local files larger than the retriever would accept.
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Get the default config file path (~/.config/feedex/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("feedex")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "feedex",
    version,
    about = "Extract RSS, Atom, RDF and JSON feeds into one normalized JSON shape"
)]
struct Args {
    /// Feed URL to fetch
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    url: Option<String>,

    /// Read the feed from a local XML or JSON file instead of fetching it
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Return the dialect-native object instead of the normalized feed
    #[arg(long)]
    raw: bool,

    /// Rewrite dates as ISO 8601 UTC
    #[arg(long)]
    iso_dates: bool,

    /// Root URL used to absolutize relative links
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// URL-prefix proxy; the encoded feed URL is appended to it
    #[arg(long, value_name = "PREFIX")]
    proxy_target: Option<String>,

    /// Config file (defaults to ~/.config/feedex/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,
}

impl Args {
    /// Layers command-line flags over the file configuration.
    fn apply_to(&self, config: &mut Config) {
        if self.raw {
            config.normalization = false;
        }
        if self.iso_dates {
            config.use_iso_date_format = true;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        if let Some(target) = &self.proxy_target {
            config.proxy_target = Some(target.clone());
        }
    }
}

/// Whether a local file should go through the JSON pipeline.
fn looks_like_json(path: &Path, content: &str) -> bool {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    by_extension || content.trim_start().starts_with('{')
}

fn extract_file(path: &Path, options: &ExtractOptions) -> Result<Extraction> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read feed file: {}", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("Feed path must be a regular file");
    }
    if metadata.len() > MAX_FILE_SIZE {
        anyhow::bail!(
            "Feed file is {} bytes (max {} bytes)",
            metadata.len(),
            MAX_FILE_SIZE
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed file: {}", path.display()))?;

    let result = if looks_like_json(path, &content) {
        feed::extract_from_json_str(&content, options)
    } else {
        feed::extract_from_xml(&content, options)
    };
    result.with_context(|| format!("Failed to extract feed from {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    args.apply_to(&mut config);
    tracing::debug!(config = ?config, "Effective configuration");

    let options = config.extract_options();
    let result = match (&args.file, &args.url) {
        (Some(path), _) => extract_file(path, &options)?,
        (None, Some(url)) => feed::extract(url, &options, &config.retriever_options())
            .await
            .with_context(|| format!("Failed to extract feed from {}", url))?,
        (None, None) => anyhow::bail!("Either a URL or --file is required"),
    };

    let output = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "feedex",
            "https://example.com/feed.xml",
            "--raw",
            "--iso-dates",
            "--base-url",
            "https://example.com",
        ]);
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert!(!config.normalization);
        assert!(config.use_iso_date_format);
        assert_eq!(config.base_url.as_deref(), Some("https://example.com"));
        assert!(config.proxy_target.is_none());
    }

    #[test]
    fn test_url_and_file_are_exclusive() {
        assert!(Args::try_parse_from(["feedex"]).is_err());
        assert!(Args::try_parse_from(["feedex", "https://a.example", "--file", "x.xml"]).is_err());
        assert!(Args::try_parse_from(["feedex", "--file", "x.xml"]).is_ok());
    }

    #[test]
    fn test_looks_like_json() {
        assert!(looks_like_json(Path::new("feed.json"), "<rss/>"));
        assert!(looks_like_json(Path::new("feed"), "  {\"version\": 1}"));
        assert!(!looks_like_json(Path::new("feed.xml"), "<rss/>"));
    }
}
