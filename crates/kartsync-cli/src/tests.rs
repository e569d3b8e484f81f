use std::path::Path;

use kartsync_core::AppConfig;

use super::*;

/// Config rooted in a temporary directory with no politeness delays.
pub(crate) fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        catalog_path: dir.join("data/products.json"),
        images_dir: dir.join("public/images/products"),
        image_path_prefix: "/images/products".to_owned(),
        log_level: "debug".to_owned(),
        request_timeout_secs: 5,
        user_agent: "kartsync-test".to_owned(),
        fetch_delay_ms: 0,
        download_delay_ms: 0,
        download_concurrency: 1,
        max_retries: 0,
        retry_backoff_base_ms: 0,
        max_pages: 5,
    }
}

#[test]
fn no_command_is_an_error() {
    assert!(Cli::try_parse_from(["kartsync"]).is_err());
}

#[test]
fn parses_scrape_with_several_urls() {
    let cli = Cli::try_parse_from([
        "kartsync",
        "scrape",
        "brakes",
        "scraped/brakes.json",
        "https://shop.example.com/brakes",
        "https://shop.example.com/brake-discs",
        "--max-pages",
        "3",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Scrape {
            ref category,
            ref urls,
            browser: false,
            max_pages: Some(3),
            selectors: None,
            ..
        } if category == "brakes" && urls.len() == 2
    ));
}

#[test]
fn scrape_requires_a_url() {
    assert!(Cli::try_parse_from(["kartsync", "scrape", "brakes", "out.json"]).is_err());
}

#[test]
fn import_requires_mode() {
    let result = Cli::try_parse_from(["kartsync", "import", "scraped.json", "brakes", "mk"]);
    assert!(result.is_err());
}

#[test]
fn parses_import_modes() {
    for (raw, expected) in [
        ("prefix-replace", ModeArg::PrefixReplace),
        ("additive", ModeArg::Additive),
        ("upsert", ModeArg::Upsert),
    ] {
        let cli = Cli::try_parse_from([
            "kartsync",
            "import",
            "scraped.json",
            "brakes",
            "mk",
            "--mode",
            raw,
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Import { mode, .. } if mode == expected));
    }
}

#[test]
fn rejects_unknown_mode() {
    let result = Cli::try_parse_from([
        "kartsync",
        "import",
        "scraped.json",
        "brakes",
        "mk",
        "--mode",
        "replace-all",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_import_flags() {
    let cli = Cli::try_parse_from([
        "kartsync",
        "import",
        "scraped.json",
        "brakes",
        "mk",
        "--mode",
        "additive",
        "--brand",
        "CRG",
        "--skip-images",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Import {
            brand: Some(ref b),
            skip_images: true,
            dry_run: true,
            subcategory: None,
            ..
        } if b == "CRG"
    ));
}

#[test]
fn parses_set_price_with_original() {
    let cli = Cli::try_parse_from([
        "kartsync",
        "set-price",
        "mk-crg-pad",
        "8990",
        "--original",
        "10990",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::SetPrice { ref id, ref price, original: Some(ref o) }
            if id == "mk-crg-pad" && price == "8990" && o == "10990"
    ));
}

#[test]
fn parses_maintenance_commands() {
    assert!(matches!(
        Cli::try_parse_from(["kartsync", "dedup", "--dry-run"]).unwrap().command,
        Commands::Dedup { dry_run: true }
    ));
    assert!(matches!(
        Cli::try_parse_from(["kartsync", "clean-text"]).unwrap().command,
        Commands::CleanText
    ));
    assert!(matches!(
        Cli::try_parse_from(["kartsync", "stats"]).unwrap().command,
        Commands::Stats
    ));
}

#[test]
fn parses_sitemap_filter() {
    let cli = Cli::try_parse_from([
        "kartsync",
        "sitemap",
        "https://shop.example.com",
        "--contains",
        "/brakes/",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Sitemap { contains: Some(ref c), output: None, .. } if c == "/brakes/"
    ));
}
