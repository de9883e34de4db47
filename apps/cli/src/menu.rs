//! Numbered interactive menu shown when no subcommand is given.

use std::io::{self, BufRead, Write};

use chrono::NaiveDate;
use color_eyre::eyre::Result;

use filingcast_artifacts::parse_date_token;
use filingcast_core::schedule::{self, JsonScheduleStore};
use filingcast_core::{BatchOptions, StageSelection};
use filingcast_shared::{AppConfig, Stage};

use crate::commands::{cmd_quote, cmd_reset, cmd_run, print_schedule};

const MENU: &str = "
  1) Full pipeline
  2) Acquire documents
  3) Extract sections
  4) Narrate
  5) Render videos
  6) Publish videos
  7) Reset (archive all artifacts)
  8) Schedule settings
  9) Check metrics
  0) Exit";

/// Loop until the operator exits. Action errors are reported, not fatal.
pub(crate) async fn run_menu(config: &AppConfig) -> Result<()> {
    loop {
        println!("{MENU}");
        let Some(choice) = prompt("Select")? else {
            return Ok(());
        };

        let result = match choice.as_str() {
            "1" => run_with_filters(config, StageSelection::All).await,
            "2" => run_with_filters(config, StageSelection::Only(Stage::Acquire)).await,
            "3" => run_stage(config, Stage::Extract).await,
            "4" => run_stage(config, Stage::Narrate).await,
            "5" => run_stage(config, Stage::Render).await,
            "6" => run_stage(config, Stage::Publish).await,
            "7" => reset(config),
            "8" => schedule_menu(config),
            "9" => check_metrics(config).await,
            "0" | "q" => return Ok(()),
            other => {
                println!("  Unknown choice '{other}'");
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("  Error: {e}");
        }
    }
}

async fn run_with_filters(config: &AppConfig, selection: StageSelection) -> Result<()> {
    let Some(date_filter) = prompt_date()? else {
        return Ok(());
    };
    let Some(limit) = prompt_limit(config.batch.default_limit)? else {
        return Ok(());
    };

    let options = BatchOptions {
        date_filter,
        limit: Some(limit),
        selection,
        visibility: config.publish.visibility,
        ..Default::default()
    };
    cmd_run(config, &options).await
}

async fn run_stage(config: &AppConfig, stage: Stage) -> Result<()> {
    let options = BatchOptions {
        selection: StageSelection::Only(stage),
        visibility: config.publish.visibility,
        ..Default::default()
    };
    cmd_run(config, &options).await
}

fn reset(config: &AppConfig) -> Result<()> {
    if confirm("Move all artifacts to the archive?")? {
        cmd_reset(config)
    } else {
        println!("  Reset cancelled.");
        Ok(())
    }
}

fn schedule_menu(config: &AppConfig) -> Result<()> {
    let store = JsonScheduleStore::new(&config.paths.schedule_file);
    loop {
        print_schedule(&schedule::load_or_init(&store), store.path());
        println!("  1) Toggle automatic runs\n  2) Set time\n  3) Set item limit\n  0) Back");

        let Some(choice) = prompt("Select")? else {
            return Ok(());
        };
        match choice.as_str() {
            "1" => {
                schedule::toggle_enabled(&store)?;
            }
            "2" => {
                if let Some(time) = prompt("Time (HH:MM)")? {
                    schedule::set_time(&store, &time)?;
                }
            }
            "3" => {
                if let Some(limit) = prompt("Item limit")? {
                    match limit.parse::<usize>() {
                        Ok(limit) => {
                            schedule::set_item_limit(&store, limit)?;
                        }
                        Err(_) => println!("  '{limit}' is not a number"),
                    }
                }
            }
            "0" | "q" | "" => return Ok(()),
            other => println!("  Unknown choice '{other}'"),
        }
    }
}

async fn check_metrics(config: &AppConfig) -> Result<()> {
    let Some(names) = prompt("Company names (comma separated)")? else {
        return Ok(());
    };
    let companies: Vec<String> = names
        .split([',', '、'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    cmd_quote(config, &companies).await
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Print `label: ` and read one trimmed line. `None` on end of input.
fn prompt(label: &str) -> Result<Option<String>> {
    print!("  {label}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Yes/no question, defaulting to no.
pub(crate) fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{question} [y/N]"))?;
    Ok(matches!(
        answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("y" | "yes")
    ))
}

/// `Some(None)` for "no filter"; outer `None` on end of input.
fn prompt_date() -> Result<Option<Option<NaiveDate>>> {
    loop {
        let Some(input) = prompt("Date (YYYYMMDD, blank for all)")? else {
            return Ok(None);
        };
        if input.is_empty() {
            return Ok(Some(None));
        }
        match parse_date_token(&input) {
            Some(date) => return Ok(Some(Some(date))),
            None => println!("  '{input}' is not a YYYYMMDD date"),
        }
    }
}

fn prompt_limit(default: usize) -> Result<Option<usize>> {
    loop {
        let Some(input) = prompt(&format!("Item limit [{default}]"))? else {
            return Ok(None);
        };
        if input.is_empty() {
            return Ok(Some(default));
        }
        match input.parse::<usize>() {
            Ok(limit) if limit > 0 => return Ok(Some(limit)),
            _ => println!("  Enter a positive number"),
        }
    }
}
