use colored::Colorize;
use padbackup::commands::run::RunReport;
use padbackup::commands::status::SiteStatus;
use padbackup::commands::{CmdMessage, MessageLevel, SiteReport};
use padbackup::config::BackupConfig;

pub(super) fn render_messages(messages: &[CmdMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        let line = match message.level {
            MessageLevel::Info => message.content.dimmed(),
            MessageLevel::Success => message.content.green(),
            MessageLevel::Warning => message.content.yellow(),
            MessageLevel::Error => message.content.red(),
        };
        out.push_str(&format!("{}\n", line));
    }
    out
}

pub(super) fn render_site_report(report: &SiteReport) -> String {
    render_messages(&report.messages)
}

pub(super) fn render_run_report(report: &RunReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(site) => out.push_str(&render_site_report(site)),
            Err(e) => out.push_str(&render_messages(&[CmdMessage::error(format!(
                "line {} ({}): {}",
                outcome.line, outcome.text, e
            ))])),
        }
    }
    let summary = format!(
        "{} target(s): {} ok, {} failed, {} commit(s)",
        report.outcomes.len(),
        report.succeeded(),
        report.failed(),
        report.committed()
    );
    let summary = if report.failed() > 0 {
        CmdMessage::warning(summary)
    } else {
        CmdMessage::info(summary)
    };
    out.push_str(&render_messages(&[summary]));
    out
}

pub(super) fn render_status(status: &SiteStatus) -> String {
    let mut out = format!("{}\n", status.site.to_string().bold());
    match &status.last_commit {
        None => out.push_str("  never backed up\n"),
        Some(commit) => {
            let when = commit
                .recorded_at()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| commit.timestamp.to_string());
            out.push_str(&format!("  last backup:  {} ({})\n", when, status.last_backup));
            out.push_str(&format!("  last version: {}\n", commit.version));
            out.push_str(&format!("  authors:      {}\n", commit.authors.join(", ")));
        }
    }
    if let Some((pad, version)) = &status.pad_version {
        out.push_str(&format!("  pad {}: version {}\n", pad, version));
    }
    out
}

pub(super) fn render_config(config: &BackupConfig) -> String {
    let log_file = config
        .log_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let rows: [(&str, String); 14] = [
        ("format", config.format.clone()),
        ("delay_secs", config.delay_secs.to_string()),
        ("race_window_secs", config.race_window_secs.to_string()),
        ("out_of_order_commit", config.out_of_order_commit.to_string()),
        ("timezone", config.timezone.clone()),
        ("data_dir", config.data_dir.display().to_string()),
        ("api_keys_file", config.api_keys_file.display().to_string()),
        ("backup_list_file", config.backup_list_file.display().to_string()),
        ("host", config.host.clone()),
        ("scheme", config.scheme.clone()),
        ("request_timeout_secs", config.request_timeout_secs.to_string()),
        ("author_name", config.author_name.clone()),
        ("author_email", config.author_email.clone()),
        ("log_file", log_file),
    ];
    rows.iter()
        .map(|(key, value)| format!("{} = {}\n", key, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use padbackup::commands::run::TargetOutcome;
    use padbackup::error::BackupError;
    use padbackup::model::{CommitMessage, SiteName};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn run_report_lists_failures_and_summary() {
        plain();
        let mut ok = SiteReport::new(SiteName::main());
        ok.add_message(CmdMessage::info("main: up to date"));
        let report = RunReport {
            outcomes: vec![
                TargetOutcome {
                    line: 1,
                    text: "/*".to_string(),
                    result: Ok(ok),
                },
                TargetOutcome {
                    line: 2,
                    text: "team/x".to_string(),
                    result: Err(BackupError::MissingCredentials("team".to_string())),
                },
            ],
        };
        let out = render_run_report(&report);
        assert!(out.contains("main: up to date\n"));
        assert!(out.contains("line 2 (team/x): No API key for site \"team\""));
        assert!(out.ends_with("2 target(s): 1 ok, 1 failed, 0 commit(s)\n"));
    }

    #[test]
    fn status_of_a_backed_up_site() {
        plain();
        let status = SiteStatus {
            site: SiteName::new("team").unwrap(),
            last_backup: 1_000_000_000.0,
            last_commit: Some(CommitMessage {
                timestamp: 1_000_000_000.0,
                version: 5,
                authors: vec!["Ann".to_string(), "Bo".to_string()],
            }),
            pad_version: None,
        };
        let out = render_status(&status);
        assert!(out.starts_with("team\n"));
        assert!(out.contains("2001-09-09 01:46:40 UTC"));
        assert!(out.contains("last version: 5"));
        assert!(out.contains("Ann, Bo"));
    }

    #[test]
    fn status_of_a_new_site() {
        plain();
        let status = SiteStatus {
            site: SiteName::main(),
            last_backup: 0.0,
            last_commit: None,
            pad_version: None,
        };
        assert_eq!(render_status(&status), "main\n  never backed up\n");
    }

    #[test]
    fn config_lists_every_key() {
        let out = render_config(&BackupConfig::default());
        assert!(out.contains("format = html\n"));
        assert!(out.contains("timezone = +0800\n"));
        assert!(out.contains("log_file = \n"));
        assert_eq!(out.lines().count(), 14);
    }
}
