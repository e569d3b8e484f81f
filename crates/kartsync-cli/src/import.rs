//! `download` and `import` command handlers.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use kartsync_catalog::{merge, CatalogRepository, MergeMode, MergeReport};
use kartsync_core::{AppConfig, ProductRecord, ScrapedCandidate};
use kartsync_scraper::{
    enrich, image_file_name, AssetDownloader, BrandTable, DownloadJob, DownloadOptions,
    DownloadOutcome, DownloadReport, EnrichContext, HttpTransport, RuleTable, TokioClock,
};

use crate::scrape::retry_policy;
use crate::ModeArg;

#[derive(Debug)]
pub(crate) struct ImportArgs {
    pub(crate) scraped_file: PathBuf,
    pub(crate) category: String,
    pub(crate) id_prefix: String,
    pub(crate) subcategory: Option<String>,
    pub(crate) brand: Option<String>,
    pub(crate) mode: ModeArg,
    pub(crate) skip_images: bool,
    pub(crate) dry_run: bool,
}

fn read_candidates(path: &Path) -> anyhow::Result<Vec<ScrapedCandidate>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

fn download_jobs(candidates: &[ScrapedCandidate]) -> Vec<DownloadJob> {
    candidates
        .iter()
        .filter_map(|c| {
            let url = c.image_url.as_deref()?.trim();
            (!url.is_empty()).then(|| DownloadJob {
                slug: c.effective_slug(),
                url: url.to_owned(),
            })
        })
        .collect()
}

fn build_downloader(config: &AppConfig) -> anyhow::Result<AssetDownloader> {
    let transport = HttpTransport::new(config.request_timeout_secs, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
    Ok(AssetDownloader::new(
        Arc::new(transport),
        Arc::new(TokioClock),
        DownloadOptions {
            images_dir: config.images_dir.clone(),
            delay: Duration::from_millis(config.download_delay_ms),
            concurrency: config.download_concurrency,
            retry: retry_policy(config),
        },
    ))
}

async fn download_images(
    config: &AppConfig,
    candidates: &[ScrapedCandidate],
) -> anyhow::Result<DownloadReport> {
    let downloader = build_downloader(config)?;
    let report = downloader.download_all(&download_jobs(candidates)).await?;
    for (slug, outcome) in &report.outcomes {
        if let DownloadOutcome::Failed(e) = outcome {
            tracing::warn!(slug = %slug, error = %e, "image download failed");
        }
    }
    Ok(report)
}

/// Download every candidate's image into the image store.
///
/// # Errors
///
/// Returns an error if the candidates file cannot be read or the image
/// directory cannot be created. Individual download failures are reported,
/// not returned.
pub(crate) async fn run_download(config: &AppConfig, scraped_file: &Path) -> anyhow::Result<()> {
    let candidates = read_candidates(scraped_file)?;
    let report = download_images(config, &candidates).await?;
    println!(
        "images: {} downloaded, {} already present, {} failed",
        report.downloaded, report.skipped, report.failed
    );
    Ok(())
}

fn merge_mode(mode: ModeArg, id_prefix: &str) -> MergeMode {
    match mode {
        ModeArg::PrefixReplace => MergeMode::PrefixReplace {
            prefix: format!("{id_prefix}-"),
        },
        ModeArg::Additive => MergeMode::Additive,
        ModeArg::Upsert => MergeMode::Upsert,
    }
}

/// Enriches the usable candidates; a record links its local image only when
/// the file is on disk.
fn build_batch(
    config: &AppConfig,
    args: &ImportArgs,
    candidates: &[ScrapedCandidate],
    rules: &RuleTable,
    brands: &BrandTable,
) -> Vec<ProductRecord> {
    candidates
        .iter()
        .map(|candidate| {
            let local_image = candidate.image_url.is_some()
                && config
                    .images_dir
                    .join(image_file_name(&candidate.effective_slug()))
                    .is_file();
            let ctx = EnrichContext {
                category: &args.category,
                subcategory: args.subcategory.as_deref(),
                brand: args.brand.as_deref(),
                id_prefix: &args.id_prefix,
                image_path_prefix: &config.image_path_prefix,
                local_image,
                rules,
                brands,
            };
            enrich(candidate, &ctx)
        })
        .collect()
}

/// Keeps the first record for each id and returns how many repeats were
/// dropped.
fn drop_repeated_ids(batch: Vec<ProductRecord>) -> (Vec<ProductRecord>, usize) {
    let mut seen = HashSet::new();
    let mut repeated = 0usize;
    let kept = batch
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.id.clone());
            if !fresh {
                repeated += 1;
                tracing::warn!(id = %record.id, "repeated product in scraped file; keeping the first");
            }
            fresh
        })
        .collect();
    (kept, repeated)
}

/// Enrich a candidates file and merge the batch into the catalog.
///
/// # Errors
///
/// Returns an error if the candidates file cannot be read, the image store
/// cannot be prepared, or the merge is rejected (for example on an id
/// conflict). A rejected merge leaves the catalog file unchanged.
pub(crate) async fn run_import(config: &AppConfig, args: &ImportArgs) -> anyhow::Result<()> {
    let all = read_candidates(&args.scraped_file)?;
    let total = all.len();
    let candidates: Vec<ScrapedCandidate> = all.into_iter().filter(|c| !c.flagged).collect();
    let flagged = total - candidates.len();
    if flagged > 0 {
        tracing::warn!(flagged, "skipping candidates without a usable price");
    }
    if candidates.is_empty() {
        println!("nothing to import from {}", args.scraped_file.display());
        return Ok(());
    }

    if args.skip_images || args.dry_run {
        tracing::info!("image download skipped");
    } else {
        let report = download_images(config, &candidates).await?;
        println!(
            "images: {} downloaded, {} already present, {} failed",
            report.downloaded, report.skipped, report.failed
        );
    }

    let rules = RuleTable::go_kart_default();
    let brands = BrandTable::kart_default();
    let (batch, repeated) =
        drop_repeated_ids(build_batch(config, args, &candidates, &rules, &brands));
    let mode = merge_mode(args.mode, &args.id_prefix);
    let repo = CatalogRepository::new(&config.catalog_path);

    let report = if args.dry_run {
        let mut preview = repo.load()?;
        merge(&mut preview, batch, &mode)?
    } else {
        repo.update(|catalog| merge(catalog, batch, &mode))?
    };

    print_report(&report, &mode, flagged, repeated, args.dry_run, repo.path());
    Ok(())
}

fn print_report(
    report: &MergeReport,
    mode: &MergeMode,
    flagged: usize,
    repeated: usize,
    dry_run: bool,
    path: &Path,
) {
    let verb = if dry_run { "would merge" } else { "merged" };
    println!(
        "{verb} into {} ({mode}): {} removed, {} inserted, {} replaced, {} skipped, {flagged} unpriced, {repeated} repeated",
        path.display(),
        report.removed,
        report.inserted,
        report.replaced,
        report.skipped,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_config;

    fn args(mode: ModeArg) -> ImportArgs {
        ImportArgs {
            scraped_file: PathBuf::from("scraped.json"),
            category: "brakes".to_owned(),
            id_prefix: "mk".to_owned(),
            subcategory: None,
            brand: Some("CRG".to_owned()),
            mode,
            skip_images: true,
            dry_run: false,
        }
    }

    #[test]
    fn prefix_replace_mode_uses_dashed_prefix() {
        assert_eq!(
            merge_mode(ModeArg::PrefixReplace, "mk"),
            MergeMode::PrefixReplace {
                prefix: "mk-".to_owned()
            }
        );
        assert_eq!(merge_mode(ModeArg::Upsert, "mk"), MergeMode::Upsert);
    }

    #[test]
    fn jobs_only_for_candidates_with_images() {
        let mut with = ScrapedCandidate::new("Pad A", "1");
        with.image_url = Some("https://cdn.example.com/a.jpg".to_owned());
        let mut blank = ScrapedCandidate::new("Pad B", "1");
        blank.image_url = Some("  ".to_owned());
        let without = ScrapedCandidate::new("Pad C", "1");

        let jobs = download_jobs(&[with, blank, without]);

        assert_eq!(
            jobs,
            vec![DownloadJob {
                slug: "pad-a".to_owned(),
                url: "https://cdn.example.com/a.jpg".to_owned(),
            }]
        );
    }

    #[test]
    fn local_image_linked_only_when_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.images_dir).unwrap();
        std::fs::write(config.images_dir.join("pad-a.jpg"), b"jpeg").unwrap();

        let mut present = ScrapedCandidate::new("Pad A", "1000");
        present.image_url = Some("https://cdn.example.com/a.jpg".to_owned());
        let mut missing = ScrapedCandidate::new("Pad B", "1000");
        missing.image_url = Some("https://cdn.example.com/b.jpg".to_owned());

        let batch = build_batch(
            &config,
            &args(ModeArg::Additive),
            &[present, missing],
            &RuleTable::go_kart_default(),
            &BrandTable::kart_default(),
        );

        assert_eq!(batch[0].id, "mk-pad-a");
        assert!(batch[0].image_local.is_some());
        assert!(batch[1].image_local.is_none());
    }

    #[tokio::test]
    async fn import_skips_flagged_and_writes_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut flagged = ScrapedCandidate::new("Pad B", "");
        flagged.flagged = true;
        let scraped = dir.path().join("scraped.json");
        std::fs::write(
            &scraped,
            serde_json::to_string(&[ScrapedCandidate::new("Pad A", "1000"), flagged]).unwrap(),
        )
        .unwrap();

        let mut import = args(ModeArg::Additive);
        import.scraped_file = scraped;
        run_import(&config, &import).await.unwrap();

        let catalog = CatalogRepository::new(&config.catalog_path).load().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.products[0].id, "mk-pad-a");
        assert_eq!(catalog.products[0].category, "brakes");
    }

    #[tokio::test]
    async fn dry_run_leaves_catalog_absent() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let scraped = dir.path().join("scraped.json");
        std::fs::write(
            &scraped,
            serde_json::to_string(&[ScrapedCandidate::new("Pad A", "1000")]).unwrap(),
        )
        .unwrap();

        let mut import = args(ModeArg::Upsert);
        import.scraped_file = scraped;
        import.dry_run = true;
        run_import(&config, &import).await.unwrap();

        assert!(!config.catalog_path.exists());
    }

    #[tokio::test]
    async fn repeated_slug_in_scraped_file_keeps_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let scraped = dir.path().join("scraped.json");
        std::fs::write(
            &scraped,
            serde_json::to_string(&[
                ScrapedCandidate::new("Pad A", "1000"),
                ScrapedCandidate::new("Pad B", "2000"),
                ScrapedCandidate::new("Pad A", "1500"),
            ])
            .unwrap(),
        )
        .unwrap();

        for mode in [ModeArg::PrefixReplace, ModeArg::Upsert] {
            let mut import = args(mode);
            import.scraped_file = scraped.clone();
            run_import(&config, &import).await.unwrap();

            let catalog = CatalogRepository::new(&config.catalog_path).load().unwrap();
            assert_eq!(catalog.len(), 2);
            assert_eq!(catalog.find_by_id("mk-pad-a").unwrap().price, "1000");
        }
    }
}
