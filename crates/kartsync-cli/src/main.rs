mod import;
mod maintain;
mod scrape;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kartsync")]
#[command(about = "Go-kart parts catalog sync: scrape, download, import, maintain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape listing pages into a candidates file
    Scrape {
        /// Category recorded on every scraped candidate
        category: String,
        /// Candidates file to write (JSON array)
        output: PathBuf,
        /// Listing page URLs; pagination is followed from each
        #[arg(required = true)]
        urls: Vec<String>,
        /// YAML selector set (defaults to the storefront product-miniature markup)
        #[arg(long)]
        selectors: Option<PathBuf>,
        /// Render pages in headless Chromium (requires the `browser` feature)
        #[arg(long)]
        browser: bool,
        /// Listing pages to follow per start URL (overrides KARTSYNC_MAX_PAGES)
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// List product page URLs from a site's sitemap
    Sitemap {
        /// Site URL or sitemap.xml URL
        url: String,
        /// Keep only URLs containing this substring
        #[arg(long)]
        contains: Option<String>,
        /// Write URLs to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Download images for a candidates file into the image store
    Download {
        scraped_file: PathBuf,
    },
    /// Enrich a candidates file and merge it into the catalog
    Import {
        scraped_file: PathBuf,
        category: String,
        /// Records get ids `<id-prefix>-<slug>`
        id_prefix: String,
        /// Subcategory for records no rule classifies
        #[arg(long)]
        subcategory: Option<String>,
        /// Brand for records whose brand cannot be detected
        #[arg(long)]
        brand: Option<String>,
        /// How the batch is merged; there is no default
        #[arg(long, value_enum)]
        mode: ModeArg,
        /// Do not download images; only already-present files are linked
        #[arg(long)]
        skip_images: bool,
        /// Report what would change without downloading or writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Collapse duplicate records
    Dedup {
        #[arg(long)]
        dry_run: bool,
    },
    /// Move records whose name matches a pattern into a category
    Recategorize {
        /// Case-insensitive regular expression matched against names
        pattern: String,
        category: String,
        #[arg(long)]
        subcategory: Option<String>,
    },
    /// Correct one record's price
    SetPrice {
        id: String,
        price: String,
        /// Pre-promotion price; marks the record as discounted
        #[arg(long)]
        original: Option<String>,
    },
    /// Apply a description template to records whose name matches a pattern
    Describe {
        pattern: String,
        /// Placeholders: {name} {brand} {category} {subcategory}
        template: String,
    },
    /// Strip markup and entities from names and descriptions
    CleanText,
    /// Print catalog statistics
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Replace every record whose id starts with `<id-prefix>-`
    PrefixReplace,
    /// Add only records whose slug is not yet present
    Additive,
    /// Replace records with equal ids, add the rest
    Upsert,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = kartsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Scrape {
            category,
            output,
            urls,
            selectors,
            browser,
            max_pages,
        } => {
            scrape::run_scrape(
                &config,
                &scrape::ScrapeArgs {
                    category,
                    output,
                    urls,
                    selectors,
                    browser,
                    max_pages: max_pages.unwrap_or(config.max_pages),
                },
            )
            .await?;
        }
        Commands::Sitemap {
            url,
            contains,
            output,
        } => scrape::run_sitemap(&config, &url, contains.as_deref(), output.as_deref()).await?,
        Commands::Download { scraped_file } => {
            import::run_download(&config, &scraped_file).await?;
        }
        Commands::Import {
            scraped_file,
            category,
            id_prefix,
            subcategory,
            brand,
            mode,
            skip_images,
            dry_run,
        } => {
            import::run_import(
                &config,
                &import::ImportArgs {
                    scraped_file,
                    category,
                    id_prefix,
                    subcategory,
                    brand,
                    mode,
                    skip_images,
                    dry_run,
                },
            )
            .await?;
        }
        Commands::Dedup { dry_run } => maintain::run_dedup(&config, dry_run)?,
        Commands::Recategorize {
            pattern,
            category,
            subcategory,
        } => maintain::run_recategorize(&config, &pattern, &category, subcategory.as_deref())?,
        Commands::SetPrice {
            id,
            price,
            original,
        } => maintain::run_set_price(&config, &id, &price, original.as_deref())?,
        Commands::Describe { pattern, template } => {
            maintain::run_describe(&config, &pattern, &template)?;
        }
        Commands::CleanText => maintain::run_clean_text(&config)?,
        Commands::Stats => maintain::run_stats(&config)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
