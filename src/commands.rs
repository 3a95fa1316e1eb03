use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::cli::ListArgs;
use crate::collector::{self, GetOptions, ListOptions};
use crate::daterange::{parse_day, DateRange};
use crate::fetch::{Fetcher, SearchOptions};
use crate::orchestrator::{run_days, RunSummary};
use crate::output::write_json_stdout;
use crate::reader::{merge_files, MergeInput};
use crate::settings::Settings;
use crate::slack::SlackWebClient;
use crate::{AppError, BuildInfo, Result};

/// Settings from file and environment, with `--token` applied last.
pub fn load_settings(config: Option<&Path>, token: Option<String>) -> Result<Settings> {
    let mut settings = Settings::load(config)?;
    settings.apply_env();
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        settings.token = token.trim().to_string();
    }
    Ok(settings)
}

fn fetcher(settings: &Settings) -> Result<Fetcher> {
    settings.validate()?;
    let client = SlackWebClient::new(&settings.token)?;
    Ok(Fetcher::new(Arc::new(client)))
}

pub async fn run_get(settings: &Settings, url: String, with_thread: bool) -> Result<()> {
    let fetcher = fetcher(settings)?;
    let thread = collector::get(&fetcher, &GetOptions { url, with_thread }).await?;
    write_json_stdout(&thread)
}

/// Everything a `list` run needs once CLI flags are layered over settings
#[derive(Debug)]
pub struct ListPlan {
    pub range: DateRange,
    pub options: ListOptions,
    pub parallel: usize,
    pub output_dir: PathBuf,
}

pub fn plan_list(settings: &Settings, args: ListArgs) -> Result<ListPlan> {
    let range = match (&args.day, &args.month, &args.from, &args.to) {
        (Some(day), None, None, None) => DateRange::day(parse_day(day)?),
        (None, Some(month), None, None) => DateRange::month(month)?,
        (None, None, Some(from), Some(to)) => DateRange::custom(from, to)?,
        _ => {
            return Err(AppError::InvalidDateRange(
                "use exactly one of --day, --month or --from/--to".to_string(),
            ));
        }
    };

    let author = args
        .author
        .or_else(|| Some(settings.author.clone()))
        .filter(|a| !a.trim().is_empty());
    let pick = |flag: Vec<String>, configured: &Vec<String>| {
        if flag.is_empty() {
            configured.clone()
        } else {
            flag
        }
    };

    let search = SearchOptions {
        author,
        mentions: pick(args.mention, &settings.mentions),
        channels: pick(args.channel, &settings.channels),
        exclude_channels: pick(args.exclude_channel, &settings.exclude_channels),
        ..Default::default()
    };

    Ok(ListPlan {
        range,
        options: ListOptions {
            search,
            with_thread: args.thread,
        },
        parallel: args.parallel.unwrap_or(settings.collect.parallel).max(1),
        output_dir: args.output_dir.unwrap_or_else(|| settings.output_dir()),
    })
}

pub async fn run_list(settings: &Settings, args: ListArgs) -> Result<()> {
    let plan = plan_list(settings, args)?;
    let fetcher = fetcher(settings)?;
    let days = plan.range.days();

    info!(
        "collecting {} day(s) from {} to {} with {} worker(s)",
        days.len(),
        plan.range.start,
        plan.range.end,
        plan.parallel
    );

    let results = run_days(&fetcher, &plan.options, days, plan.parallel, &plan.output_dir).await?;
    let summary = RunSummary::report(&results, &plan.output_dir).into_result()?;

    info!(
        "done: {} thread(s) across {} day(s)",
        summary.threads,
        summary.total - summary.failed
    );
    Ok(())
}

/// Directory from the positional argument, else `--dir`.
pub fn merge_input(
    directory: Option<PathBuf>,
    dir: Option<PathBuf>,
    pattern: String,
    recursive: bool,
) -> Result<MergeInput> {
    let dir = directory.or(dir).ok_or(AppError::MissingDirectory)?;
    Ok(MergeInput {
        dir,
        pattern,
        recursive,
    })
}

pub fn run_merge(input: MergeInput) -> Result<()> {
    let report = merge_files(&input)?;
    let result = &report.result;

    info!(
        "read {} file(s), {} failed",
        report.files_read, report.files_failed
    );
    info!(
        "threads: {} -> {} ({} duplicate)",
        result.original_thread_count, result.merged_thread_count, result.duplicate_threads
    );
    info!(
        "messages: {} -> {} ({} duplicate)",
        result.original_message_count, result.merged_message_count, result.duplicate_messages
    );

    write_json_stdout(&result.threads)
}

pub fn run_version() {
    println!("{}", BuildInfo::current());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn list_args() -> ListArgs {
        ListArgs {
            day: Some("2025-01-15".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_settings_token_flag_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "token = \"from-file\"\n").unwrap();

        let settings = load_settings(Some(&path), Some("from-flag".to_string())).unwrap();

        assert_eq!(settings.token, "from-flag");
    }

    #[test]
    fn test_plan_list_day() {
        let plan = plan_list(&Settings::default(), list_args()).unwrap();

        assert_eq!(plan.range.days(), vec![NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()]);
        assert_eq!(plan.parallel, 1);
        assert_eq!(plan.output_dir, PathBuf::from("logs"));
        assert!(plan.options.search.author.is_none());
    }

    #[test]
    fn test_plan_list_flags_override_settings() {
        let mut settings = Settings {
            author: "U1".to_string(),
            channels: vec!["general".to_string()],
            mentions: vec!["@team".to_string()],
            ..Default::default()
        };
        settings.collect.parallel = 3;

        let args = ListArgs {
            author: Some("U2".to_string()),
            channel: vec!["dev".to_string()],
            parallel: Some(0),
            thread: true,
            output_dir: Some(PathBuf::from("out")),
            ..list_args()
        };
        let plan = plan_list(&settings, args).unwrap();

        assert_eq!(plan.options.search.author.as_deref(), Some("U2"));
        assert_eq!(plan.options.search.channels, vec!["dev"]);
        assert_eq!(plan.options.search.mentions, vec!["@team"]);
        assert!(plan.options.with_thread);
        assert_eq!(plan.parallel, 1);
        assert_eq!(plan.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_plan_list_uses_configured_parallel() {
        let mut settings = Settings::default();
        settings.collect.parallel = 4;

        let plan = plan_list(&settings, list_args()).unwrap();

        assert_eq!(plan.parallel, 4);
    }

    #[test]
    fn test_plan_list_month_and_range() {
        let month = ListArgs {
            month: Some("2025-02".to_string()),
            ..Default::default()
        };
        assert_eq!(plan_list(&Settings::default(), month).unwrap().range.days().len(), 28);

        let custom = ListArgs {
            from: Some("2025-01-30".to_string()),
            to: Some("2025-02-02".to_string()),
            ..Default::default()
        };
        assert_eq!(plan_list(&Settings::default(), custom).unwrap().range.days().len(), 4);
    }

    #[test]
    fn test_plan_list_invalid_range() {
        let err = plan_list(&Settings::default(), ListArgs::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange(_)));

        let reversed = ListArgs {
            from: Some("2025-02-02".to_string()),
            to: Some("2025-01-30".to_string()),
            ..Default::default()
        };
        let err = plan_list(&Settings::default(), reversed).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange(_)));
    }

    #[tokio::test]
    async fn test_run_list_requires_token() {
        let err = run_list(&Settings::default(), list_args()).await.unwrap_err();
        assert!(matches!(err, AppError::MissingToken));
    }

    #[test]
    fn test_merge_input_prefers_positional_dir() {
        let input = merge_input(
            Some(PathBuf::from("positional")),
            Some(PathBuf::from("flag")),
            "*.json".to_string(),
            false,
        )
        .unwrap();
        assert_eq!(input.dir, PathBuf::from("positional"));
    }

    #[test]
    fn test_merge_input_dir_flag() {
        let input = merge_input(None, Some(PathBuf::from("flag")), "*.json".to_string(), true).unwrap();
        assert_eq!(input.dir, PathBuf::from("flag"));
        assert!(input.recursive);
    }

    #[test]
    fn test_merge_input_requires_a_directory() {
        let err = merge_input(None, None, "*.json".to_string(), false).unwrap_err();
        assert!(matches!(err, AppError::MissingDirectory));
        assert_eq!(
            err.to_string(),
            "directory required: specify as argument or use --dir flag"
        );
    }
}
