// src/cli.rs
use std::{fs, path::{Path, PathBuf}};

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Result, WrapErr, bail};

use crate::{
    config::options::{AppOptions, ExportFormat},
    core::net::{Fetcher, HttpFetcher, StaticFetcher},
    file,
    progress::LogProgress,
    scrape::{self, Ingestion},
    specs,
    standings::Contest,
};

#[derive(Debug, Parser)]
#[command(name = "standings", version, about = "Fetch contest standings and print them in canonical form")]
pub struct Args {
    /// Source to use (see --list-resources)
    #[arg(long, default_value = specs::html_table::RESOURCE)]
    pub resource: String,

    /// Contest page; `<url>/standings` is tried after --standings-url
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub standings_url: Option<String>,

    /// Read the standings page from a saved HTML file instead of the network
    #[arg(long, conflicts_with_all = ["url", "standings_url"])]
    pub file: Option<PathBuf>,

    #[arg(long, default_value = "contest")]
    pub key: String,

    /// Appended to every member key
    #[arg(long)]
    pub season: Option<String>,

    /// CSS selector of table rows (header row first)
    #[arg(long)]
    pub selector: Option<String>,

    /// CSS selector of the next-page link
    #[arg(long)]
    pub next_selector: Option<String>,

    /// Only keep these members (repeatable)
    #[arg(long = "user")]
    pub users: Vec<String>,

    /// TOML options file (default: ./standings.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,

    #[arg(long)]
    pub pretty: bool,

    /// Output file or directory (default: stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// -v info, -vv debug, -vvv trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long)]
    pub list_resources: bool,
}

pub fn run(args: Args) -> Result<()> {
    let registry = specs::registry();
    if args.list_resources {
        for r in registry.resources() {
            println!("{r}");
        }
        return Ok(());
    }

    let mut opts = AppOptions::load_or_default(args.config.as_deref())?;
    if let Some(f) = args.format {
        opts.export.format = f;
    }
    opts.export.pretty |= args.pretty;

    let (contest, fetcher) = contest_and_fetcher(&args, &opts)?;
    let users = (!args.users.is_empty()).then_some(args.users.as_slice());
    let job = Ingestion { resource: &args.resource, contest, users };

    let mut progress = LogProgress::default();
    let standings = scrape::run(&registry, job, fetcher, &opts, Some(&mut progress))
        .wrap_err_with(|| format!("ingesting {} standings", args.resource))?;

    file::export_standings(&standings, &opts.export, args.out.as_deref())?;
    Ok(())
}

fn contest_and_fetcher(args: &Args, opts: &AppOptions) -> Result<(Contest, Box<dyn Fetcher>)> {
    let mut contest = Contest {
        key: args.key.clone(),
        url: args.url.clone().unwrap_or_default(),
        standings_url: args.standings_url.clone(),
        season: args.season.clone(),
        ..Default::default()
    };
    if let Some(sel) = &args.selector {
        contest.info.insert(s!("row_selector"), sel.clone());
    }
    if let Some(sel) = &args.next_selector {
        contest.info.insert(s!("next_selector"), sel.clone());
    }

    if let Some(path) = &args.file {
        let (url, body) = load_file(path)?;
        contest.standings_url = Some(url.clone());
        let fetcher: Box<dyn Fetcher> = Box::new(StaticFetcher::new().with_page(url, body));
        return Ok((contest, fetcher));
    }

    if contest.url.is_empty() && contest.standings_url.is_none() {
        bail!("one of --url, --standings-url or --file is required");
    }
    let fetcher: Box<dyn Fetcher> = Box::new(HttpFetcher::new(&opts.fetch).wrap_err("building http client")?);
    Ok((contest, fetcher))
}

/// Saved page and a `file://` URL for it, so relative links still resolve.
fn load_file(path: &Path) -> Result<(String, String)> {
    let body = fs::read_to_string(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    let abs = fs::canonicalize(path).wrap_err_with(|| format!("resolving {}", path.display()))?;
    let url = url::Url::from_file_path(&abs)
        .map_err(|_| color_eyre::eyre::eyre!("not an absolute path: {}", abs.display()))?;
    Ok((url.to_string(), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_repeatable_users_and_format() {
        let args = Args::try_parse_from([
            "standings", "--url", "https://x.test/c/1", "--user", "a", "--user", "b", "--format", "csv", "-vv",
        ])
        .unwrap();
        assert_eq!(args.users, ["a", "b"]);
        assert_eq!(args.format, Some(ExportFormat::Csv));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.resource, "html_table");
    }

    #[test]
    fn file_conflicts_with_url() {
        assert!(Args::try_parse_from(["standings", "--file", "a.html", "--url", "https://x.test"]).is_err());
    }

    #[test]
    fn contest_needs_some_location() {
        let args = Args::try_parse_from(["standings"]).unwrap();
        assert!(contest_and_fetcher(&args, &AppOptions::default()).is_err());
    }
}
