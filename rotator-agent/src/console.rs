//! Line-oriented operator console and dashboard list view.

use std::fmt::Write as _;

use anyhow::Context;
use rotator_core::{
    DashboardDescriptor, DashboardId, RotationHandle, RotationPhase,
    RotationSnapshot,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Id(DashboardId),
    /// 1-based position as printed by `list`.
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    List,
    Select(Target),
    Refresh,
    Pause,
    Resume,
    Help,
    Quit,
}

const HELP: &str =
    "commands: list | select <id|#n> | refresh | pause | resume | quit";

/// Parses one console line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let command = match (verb.to_ascii_lowercase().as_str(), argument) {
        ("list" | "ls", None) => ConsoleCommand::List,
        ("select" | "show", Some(raw)) => {
            ConsoleCommand::Select(parse_target(raw)?)
        }
        ("select" | "show", None) => {
            return Err("select needs a dashboard id or #position".into());
        }
        ("refresh", None) => ConsoleCommand::Refresh,
        ("pause", None) => ConsoleCommand::Pause,
        ("resume", None) => ConsoleCommand::Resume,
        ("help" | "?", None) => ConsoleCommand::Help,
        ("quit" | "exit", None) => ConsoleCommand::Quit,
        (other, Some(_)) if !matches!(other, "select" | "show") => {
            return Err(format!("{other} takes no argument"));
        }
        (other, _) => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(command))
}

fn parse_target(raw: &str) -> Result<Target, String> {
    match raw.strip_prefix('#') {
        Some(position) => position
            .parse::<usize>()
            .ok()
            .filter(|position| *position > 0)
            .map(Target::Position)
            .ok_or_else(|| format!("'{raw}' is not a valid position")),
        None => Ok(Target::Id(DashboardId::from(raw))),
    }
}

/// Resolves a target against the list currently on display.
pub fn resolve_target(
    target: &Target,
    snapshot: &RotationSnapshot,
) -> Option<DashboardId> {
    match target {
        Target::Id(id) => snapshot.position_of(id).map(|_| id.clone()),
        Target::Position(position) => snapshot
            .descriptors
            .get(position.checked_sub(1)?)
            .map(|descriptor| descriptor.id.clone()),
    }
}

/// Renders the dashboard list with the current entry marked.
pub fn render_table(snapshot: &RotationSnapshot) -> String {
    let mut out = String::new();
    if snapshot.is_empty() {
        let _ = writeln!(out, "no dashboards ({})", snapshot.phase);
        return out;
    }

    let position = snapshot.current_index.map(|idx| idx + 1).unwrap_or(0);
    let _ = writeln!(
        out,
        "{} ({}/{})",
        snapshot.phase,
        position,
        snapshot.len()
    );

    out.push_str(&render_rows(
        &snapshot.descriptors,
        snapshot.current_index,
    ));
    out
}

/// Renders descriptors as aligned columns, marking `current` with `>`.
pub fn render_rows(
    descriptors: &[DashboardDescriptor],
    current: Option<usize>,
) -> String {
    let rows: Vec<[String; 5]> = descriptors
        .iter()
        .enumerate()
        .map(|(idx, descriptor)| {
            [
                (idx + 1).to_string(),
                descriptor.id.to_string(),
                descriptor.title.clone(),
                descriptor
                    .dwell
                    .map(|dwell| humantime::format_duration(dwell).to_string())
                    .unwrap_or_else(|| "-".into()),
                descriptor.url.to_string(),
            ]
        })
        .collect();
    let header = ["#", "ID", "TITLE", "DWELL", "URL"].map(String::from);

    let mut widths = [0usize; 5];
    for row in std::iter::once(&header).chain(rows.iter()) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut write_row = |marker: &str, row: &[String; 5]| {
        let _ = write!(out, "{marker} ");
        for (idx, (cell, width)) in row.iter().zip(widths).enumerate() {
            if idx + 1 == row.len() {
                let _ = writeln!(out, "{cell}");
            } else {
                let _ = write!(out, "{cell:<width$}  ");
            }
        }
    };

    write_row(" ", &header);
    for (idx, row) in rows.iter().enumerate() {
        let marker = if current == Some(idx) { ">" } else { " " };
        write_row(marker, row);
    }
    out
}

/// Reads commands from stdin until `quit`. When stdin closes the console
/// goes quiet and the rotation keeps running.
pub async fn run(handle: &RotationHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        let Some(line) =
            lines.next_line().await.context("failed to read stdin")?
        else {
            debug!("stdin closed; console disabled");
            std::future::pending::<()>().await;
            return Ok(());
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            ConsoleCommand::List => {
                print!("{}", render_table(&handle.snapshot()))
            }
            ConsoleCommand::Select(target) => {
                match resolve_target(&target, &handle.snapshot()) {
                    Some(id) => handle.select(id).await?,
                    None => println!("no such dashboard"),
                }
            }
            ConsoleCommand::Refresh => handle.refresh().await?,
            ConsoleCommand::Pause => handle.pause().await?,
            ConsoleCommand::Resume => handle.resume().await?,
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => return Ok(()),
        }
    }
}

/// Logs every change of dashboard or phase published by the runtime.
pub async fn log_transitions(
    mut snapshots: watch::Receiver<RotationSnapshot>,
    shutdown: CancellationToken,
) {
    let mut previous = snapshots.borrow_and_update().clone();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let current = snapshots.borrow_and_update().clone();
        if current.current_id() != previous.current_id()
            && let Some(descriptor) = current.current()
        {
            info!(
                dashboard = %descriptor.id,
                title = %descriptor.title,
                position =
                    current.current_index.map(|idx| idx + 1).unwrap_or(0),
                of = current.len(),
                "now showing"
            );
        }
        if current.phase != previous.phase {
            match current.phase {
                RotationPhase::Error => warn!(
                    failures = current.current_failures,
                    "dashboard failed to load"
                ),
                RotationPhase::Idle if !previous.is_empty() => {
                    warn!("rotation idle; waiting for configuration")
                }
                phase => debug!(%phase, "phase"),
            }
        }
        previous = current;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use url::Url;

    use super::*;

    fn snapshot() -> RotationSnapshot {
        let descriptors: Vec<_> = ["ci", "ops"]
            .iter()
            .map(|id| {
                let url = Url::parse(&format!("https://{id}.example.com/"))
                    .expect("url");
                DashboardDescriptor::from_url(url).with_id(*id)
            })
            .collect();
        let mut descriptors = descriptors;
        descriptors[0] = descriptors[0]
            .clone()
            .with_title("Build status")
            .with_dwell(Duration::from_secs(45));
        RotationSnapshot {
            descriptors: Arc::from(descriptors),
            current_index: Some(1),
            phase: RotationPhase::Scrolling,
            current_failures: 0,
            page: 3,
        }
    }

    #[test]
    fn parses_console_commands() {
        assert_eq!(parse_command("list"), Ok(Some(ConsoleCommand::List)));
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(
            parse_command("select ops"),
            Ok(Some(ConsoleCommand::Select(Target::Id("ops".into()))))
        );
        assert_eq!(
            parse_command("SELECT #2"),
            Ok(Some(ConsoleCommand::Select(Target::Position(2))))
        );
        assert_eq!(parse_command("quit"), Ok(Some(ConsoleCommand::Quit)));
        assert!(parse_command("select").is_err());
        assert!(parse_command("select #0").is_err());
        assert!(parse_command("pause now").is_err());
        assert!(parse_command("reboot").is_err());
    }

    #[test]
    fn resolves_ids_and_positions() {
        let snapshot = snapshot();

        assert_eq!(
            resolve_target(&Target::Position(1), &snapshot),
            Some(DashboardId::from("ci"))
        );
        assert_eq!(
            resolve_target(&Target::Id("ops".into()), &snapshot),
            Some(DashboardId::from("ops"))
        );
        assert_eq!(resolve_target(&Target::Position(3), &snapshot), None);
        assert_eq!(resolve_target(&Target::Id("nope".into()), &snapshot), None);
    }

    #[test]
    fn table_marks_current_dashboard() {
        let table = render_table(&snapshot());
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines[0], "scrolling (2/2)");
        assert!(lines[1].contains("TITLE"));
        assert!(lines[2].starts_with("  1"));
        assert!(lines[2].contains("Build status"));
        assert!(lines[2].contains("45s"));
        assert!(lines[3].starts_with("> 2"));
        assert!(lines[3].ends_with("https://ops.example.com/"));
    }

    #[test]
    fn empty_table_reports_phase() {
        assert_eq!(
            render_table(&RotationSnapshot::default()),
            "no dashboards (idle)\n"
        );
    }
}
