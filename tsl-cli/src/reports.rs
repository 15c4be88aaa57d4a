use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::json;
use tsl_engine::{Editor, Leaderboard, LoadedList, Pack, RouletteRun};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
    Csv,
}

impl ReportFormat {
    pub fn parse(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "markdown" => Self::Markdown,
            "csv" => Self::Csv,
            _ => Self::Console,
        }
    }
}

/// 1-based standings; equal totals share the first position of their run.
pub fn standings(board: &Leaderboard) -> Vec<usize> {
    let mut out = Vec::with_capacity(board.players.len());
    for (index, player) in board.players.iter().enumerate() {
        let standing = match (index.checked_sub(1), out.last()) {
            (Some(prev), Some(&last))
                if board.players[prev].total.total_cmp(&player.total).is_eq() =>
            {
                last
            }
            _ => index + 1,
        };
        out.push(standing);
    }
    out
}

pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(out: &mut dyn Write, fields: &[String]) -> Result<()> {
    let row: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
    writeln!(out, "{}", row.join(","))?;
    Ok(())
}

fn md_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn write_json(out: &mut dyn Write, value: &serde_json::Value) -> Result<()> {
    let json_output = serde_json::to_string_pretty(value)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn write_leaderboard(
    out: &mut dyn Write,
    format: ReportFormat,
    list: &str,
    board: &Leaderboard,
    limit: Option<usize>,
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let shown = limit.unwrap_or(board.players.len()).min(board.players.len());
    let players = &board.players[..shown];
    let standings = standings(board);

    match format {
        ReportFormat::Json => write_json(
            out,
            &json!({
                "list": list,
                "generated_at": generated_at.to_rfc3339(),
                "players": players,
                "errors": board.errors,
            }),
        ),
        ReportFormat::Csv => {
            csv_row(
                out,
                &[
                    "standing", "user", "total", "verified", "completed", "progressed",
                ]
                .map(String::from),
            )?;
            for (player, standing) in players.iter().zip(&standings) {
                csv_row(
                    out,
                    &[
                        standing.to_string(),
                        player.user.clone(),
                        format!("{:.3}", player.total),
                        player.verified.len().to_string(),
                        player.completed.len().to_string(),
                        player.progressed.len().to_string(),
                    ],
                )?;
            }
            Ok(())
        }
        ReportFormat::Markdown => {
            writeln!(out, "# Leaderboard: {list}\n")?;
            writeln!(out, "_Generated {}_\n", generated_at.to_rfc3339())?;
            if players.is_empty() {
                writeln!(out, "_No players._")?;
            } else {
                writeln!(out, "| # | Player | Score | Verified | Completed | Progressed |")?;
                writeln!(out, "|---|--------|-------|----------|-----------|------------|")?;
                for (player, standing) in players.iter().zip(&standings) {
                    writeln!(
                        out,
                        "| {standing} | {} | {:.3} | {} | {} | {} |",
                        md_cell(&player.user),
                        player.total,
                        player.verified.len(),
                        player.completed.len(),
                        player.progressed.len()
                    )?;
                }
            }
            if !board.errors.is_empty() {
                writeln!(out, "\n## Failed levels\n")?;
                for id in &board.errors {
                    writeln!(out, "- `{id}`")?;
                }
            }
            Ok(())
        }
        ReportFormat::Console => {
            writeln!(out, "{}", format!("🏆 Leaderboard: {list}").bright_cyan().bold())?;
            writeln!(out, "{}", "==========================".cyan())?;
            if players.is_empty() {
                writeln!(out, "No players.")?;
            }
            for (player, standing) in players.iter().zip(&standings) {
                writeln!(
                    out,
                    "{:>4}. {:<24} {:>10.3}  ({} verified, {} completed, {} progressed)",
                    standing,
                    player.user.bold(),
                    player.total,
                    player.verified.len(),
                    player.completed.len(),
                    player.progressed.len()
                )?;
            }
            if shown < board.players.len() {
                writeln!(out, "… {} more", board.players.len() - shown)?;
            }
            write_failures_console(out, board.errors.iter().map(ToString::to_string))
        }
    }
}

fn write_failures_console(
    out: &mut dyn Write,
    failures: impl Iterator<Item = String>,
) -> Result<()> {
    let failures: Vec<String> = failures.collect();
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("⚠️  {} levels failed to load", failures.len())
            .yellow()
            .bold()
    )?;
    for failure in failures {
        writeln!(out, "   • {}", failure.red())?;
    }
    Ok(())
}

pub fn write_levels(
    out: &mut dyn Write,
    format: ReportFormat,
    list: &LoadedList,
    generated_at: DateTime<Utc>,
) -> Result<()> {
    match format {
        ReportFormat::Json => {
            let levels: Vec<serde_json::Value> = list
                .slots
                .iter()
                .enumerate()
                .map(|(index, slot)| match slot {
                    Ok(level) => json!({ "rank": index + 1, "level": level }),
                    Err(failure) => json!({ "rank": index + 1, "failure": failure }),
                })
                .collect();
            write_json(
                out,
                &json!({
                    "list": list.name,
                    "generated_at": generated_at.to_rfc3339(),
                    "levels": levels,
                }),
            )
        }
        ReportFormat::Csv => {
            csv_row(
                out,
                &[
                    "rank", "path", "name", "verifier", "percent_to_qualify", "records", "source",
                    "fallback", "error",
                ]
                .map(String::from),
            )?;
            for (index, slot) in list.slots.iter().enumerate() {
                let rank = (index + 1).to_string();
                let row = match slot {
                    Ok(level) => [
                        rank,
                        level.path.to_string(),
                        level.name.clone(),
                        level.verifier.clone(),
                        level.percent_to_qualify.to_string(),
                        level.records.len().to_string(),
                        level.source.clone(),
                        level.fallback.to_string(),
                        String::new(),
                    ],
                    Err(failure) => [
                        rank,
                        failure.id.to_string(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        failure.to_string(),
                    ],
                };
                csv_row(out, &row)?;
            }
            Ok(())
        }
        ReportFormat::Markdown => {
            writeln!(out, "# Levels: {}\n", list.name)?;
            writeln!(out, "| # | Level | Verifier | Qualify | Records |")?;
            writeln!(out, "|---|-------|----------|---------|---------|")?;
            for (index, slot) in list.slots.iter().enumerate() {
                let rank = index + 1;
                match slot {
                    Ok(level) => writeln!(
                        out,
                        "| {rank} | {} | {} | {}% | {} |",
                        md_cell(&level.name),
                        md_cell(&level.verifier),
                        level.percent_to_qualify,
                        level.records.len()
                    )?,
                    Err(failure) => {
                        writeln!(out, "| {rank} | ❌ `{}` | | | |", failure.id)?;
                    }
                }
            }
            Ok(())
        }
        ReportFormat::Console => {
            writeln!(out, "{}", format!("📜 Levels: {}", list.name).bright_cyan().bold())?;
            writeln!(out, "{}", "==========================".cyan())?;
            for (rank, level) in list.levels() {
                let marker = if level.fallback {
                    format!(" [{}]", level.source).yellow().to_string()
                } else {
                    String::new()
                };
                writeln!(
                    out,
                    "{rank:>4}. {:<32} by {:<20} {:>3}%  {} records{marker}",
                    level.name.bold(),
                    level.verifier,
                    level.percent_to_qualify,
                    level.records.len()
                )?;
            }
            write_failures_console(
                out,
                list.failures()
                    .map(|(rank, failure)| format!("#{rank} {failure}")),
            )
        }
    }
}

pub fn write_roulette(
    out: &mut dyn Write,
    format: ReportFormat,
    run: &RouletteRun,
    seed: u64,
    generated_at: DateTime<Utc>,
) -> Result<()> {
    match format {
        ReportFormat::Json => write_json(
            out,
            &json!({
                "seed": seed,
                "generated_at": generated_at.to_rfc3339(),
                "run": run,
            }),
        ),
        ReportFormat::Csv => {
            csv_row(out, &["order", "rank", "name", "video"].map(String::from))?;
            for (index, level) in run.levels.iter().enumerate() {
                csv_row(
                    out,
                    &[
                        (index + 1).to_string(),
                        level.rank.to_string(),
                        level.name.clone(),
                        level.video.clone(),
                    ],
                )?;
            }
            Ok(())
        }
        ReportFormat::Markdown => {
            writeln!(out, "# Roulette (seed {seed})\n")?;
            for (index, level) in run.levels.iter().enumerate() {
                writeln!(
                    out,
                    "{}. **{}** (#{}) at least {}%",
                    index + 1,
                    md_cell(&level.name),
                    level.rank,
                    index + 1
                )?;
            }
            Ok(())
        }
        ReportFormat::Console => {
            writeln!(out, "{}", format!("🎲 Roulette (seed {seed})").bright_cyan().bold())?;
            writeln!(out, "{}", "==========================".cyan())?;
            if run.levels.is_empty() {
                writeln!(out, "No levels in the selected pools.")?;
            }
            for (index, level) in run.levels.iter().enumerate() {
                writeln!(
                    out,
                    "{:>3}% {} (#{}) {}",
                    index + 1,
                    level.name.bold(),
                    level.rank,
                    level.video.dimmed()
                )?;
            }
            Ok(())
        }
    }
}

pub fn write_editors(
    out: &mut dyn Write,
    format: ReportFormat,
    editors: Option<&[Editor]>,
) -> Result<()> {
    let editors = editors.unwrap_or_default();
    match format {
        ReportFormat::Json => write_json(out, &json!(editors)),
        ReportFormat::Csv => {
            csv_row(out, &["role", "name", "link"].map(String::from))?;
            for editor in editors {
                csv_row(
                    out,
                    &[
                        editor.role.clone(),
                        editor.name.clone(),
                        editor.link.clone().unwrap_or_default(),
                    ],
                )?;
            }
            Ok(())
        }
        ReportFormat::Markdown => {
            writeln!(out, "# List Editors\n")?;
            if editors.is_empty() {
                writeln!(out, "_No editor roster available._")?;
            }
            for editor in editors {
                match &editor.link {
                    Some(link) => writeln!(out, "- {}: [{}]({link})", editor.role, editor.name)?,
                    None => writeln!(out, "- {}: {}", editor.role, editor.name)?,
                }
            }
            Ok(())
        }
        ReportFormat::Console => {
            writeln!(out, "{}", "🛠️  List Editors".bright_cyan().bold())?;
            if editors.is_empty() {
                writeln!(out, "No editor roster available.")?;
            }
            for editor in editors {
                writeln!(out, "  {:<12} {}", editor.role.dimmed(), editor.name.bold())?;
            }
            Ok(())
        }
    }
}

pub fn write_packs(out: &mut dyn Write, format: ReportFormat, packs: &[Pack]) -> Result<()> {
    match format {
        ReportFormat::Json => write_json(out, &json!(packs)),
        ReportFormat::Csv => {
            csv_row(out, &["id", "name", "description", "levels"].map(String::from))?;
            for pack in packs {
                let levels: Vec<String> = pack.levels.iter().map(ToString::to_string).collect();
                csv_row(
                    out,
                    &[
                        pack.id.clone(),
                        pack.name.clone(),
                        pack.description.clone(),
                        levels.join(";"),
                    ],
                )?;
            }
            Ok(())
        }
        ReportFormat::Markdown => {
            writeln!(out, "# Packs\n")?;
            if packs.is_empty() {
                writeln!(out, "_No packs._")?;
            }
            for pack in packs {
                writeln!(out, "## {}\n", pack.name)?;
                if !pack.description.is_empty() {
                    writeln!(out, "{}\n", pack.description)?;
                }
                for id in &pack.levels {
                    writeln!(out, "- `{id}`")?;
                }
                writeln!(out)?;
            }
            Ok(())
        }
        ReportFormat::Console => {
            writeln!(out, "{}", "📦 Packs".bright_cyan().bold())?;
            if packs.is_empty() {
                writeln!(out, "No packs.")?;
            }
            for pack in packs {
                writeln!(out, "  {} ({} levels)", pack.name.bold(), pack.levels.len())?;
            }
            Ok(())
        }
    }
}
