use std::io::Stdout;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::constants::CHAT_WRAP_WIDTH;
use crate::history::NavigationRecord;
use crate::navigation::NavigationResolver;
use crate::session::Session;
use crate::settings::cloak::{self, CloakProfile, TerminalChrome, PRESETS};
use crate::settings::Settings;
use crate::support::{ChatProvider, SupportError};
use crate::utils::{format_age, truncate_str};
use crate::{CloakAction, Command, HistoryAction, SettingsAction};

/// Width of the title column in history listings.
const TITLE_COLUMN: usize = 28;

/// Main application state.
pub struct App {
    session: Session,
    resolver: NavigationResolver,
    provider: ChatProvider,
    chrome: TerminalChrome<Stdout>,
}

impl App {
    pub fn new(config: Config, no_ai: bool) -> Result<Self> {
        let session = Session::open(Some(&config.database_path)).with_context(|| {
            format!("could not open state store at {}", config.database_path.display())
        })?;
        info!(path = %config.database_path.display(), "state store opened");

        let provider = if no_ai {
            ChatProvider::Unconfigured
        } else {
            ChatProvider::from_config(&config.ai)
        };
        debug!(ready = provider.is_ready(), "support provider");

        Ok(Self {
            session,
            resolver: NavigationResolver::new(&config),
            provider,
            chrome: TerminalChrome::new(std::io::stdout()),
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Go { input } => self.go(&input.join(" ")),
            Command::History { action } => self.history(action),
            Command::Settings { action } => self.settings(action),
            Command::Cloak { action } => self.cloak(action),
            Command::Support { message } => self.support(&message.join(" ")).await,
            Command::ResetAll { yes } => self.reset_all(yes),
        }
    }

    // ── Navigation ────────────────────────────────────────────────

    fn go(&mut self, input: &str) -> Result<()> {
        let settings = self.session.settings.get();
        let navigation = self
            .resolver
            .navigate(input, &settings, &mut self.session.history)
            .context("failed to record navigation")?;

        let Some(nav) = navigation else {
            bail!("nothing to navigate to: input is empty");
        };

        let record = &nav.resolution.record;
        println!("{} [{}]", record.title, record.icon);
        if nav.resolution.searched {
            println!("  searched: {}", input.trim());
        }
        println!("  resolved: {}", nav.resolution.target_url);
        println!("  redirect: {}", nav.redirect_url);
        if !nav.recorded {
            println!("  (history saving is off)");
        }
        Ok(())
    }

    // ── History ───────────────────────────────────────────────────

    fn history(&mut self, action: HistoryAction) -> Result<()> {
        let history = &mut self.session.history;
        match action {
            HistoryAction::List { limit } => {
                let log = history.list();
                let shown = limit.unwrap_or(log.len());
                print_records(log.iter().take(shown));
                if log.is_empty() {
                    println!("No history yet.");
                }
            }
            HistoryAction::Search { query } => {
                let found = history.search(&query);
                if found.is_empty() {
                    println!("No history matches '{}'.", query);
                }
                print_records(found.iter());
            }
            HistoryAction::Remove { id } => {
                if history.remove(&id)? {
                    println!("Removed {}.", id);
                } else {
                    println!("No record with id {}.", id);
                }
            }
            HistoryAction::Clear => {
                history.clear()?;
                println!("History cleared.");
            }
            HistoryAction::Prune { days } => {
                let retention = match days {
                    Some(d) if d >= 0 => Some(Duration::try_days(d).unwrap_or(Duration::MAX)),
                    Some(d) => bail!("--days must not be negative (got {})", d),
                    None => self.session.settings.get().auto_clear_history.retention(),
                };
                let Some(retention) = retention else {
                    println!("Auto-clear has no age limit; nothing pruned.");
                    return Ok(());
                };
                // A cutoff before the earliest representable instant matches nothing.
                let removed = match Utc::now().checked_sub_signed(retention) {
                    Some(cutoff) => history.prune_before(cutoff)?,
                    None => 0,
                };
                println!("Pruned {} record(s).", removed);
            }
        }
        Ok(())
    }

    // ── Settings ──────────────────────────────────────────────────

    fn settings(&mut self, action: SettingsAction) -> Result<()> {
        match action {
            SettingsAction::Show => print_settings(&self.session.settings.get())?,
            SettingsAction::Set { assignments } => {
                // Merge into a full object first; the store only takes whole values.
                let mut settings = self.session.settings.get();
                for assignment in &assignments {
                    let Some((key, value)) = assignment.split_once('=') else {
                        bail!(
                            "expected KEY=VALUE, got '{}' (keys: {})",
                            assignment,
                            Settings::FIELDS.join(", ")
                        );
                    };
                    settings.set_field(key.trim(), value)?;
                }
                self.session.settings.replace(&settings)?;
                print_settings(&settings)?;
            }
            SettingsAction::Reset => {
                self.session.settings.reset()?;
                println!("Settings restored to defaults.");
            }
        }
        Ok(())
    }

    // ── Cloak ─────────────────────────────────────────────────────

    fn cloak(&mut self, action: CloakAction) -> Result<()> {
        match action {
            CloakAction::Show => print_cloak(&self.session.cloak.get()),
            CloakAction::Set {
                title,
                icon_type,
                icon_url,
                css,
            } => {
                let profile = CloakProfile {
                    title,
                    icon_type,
                    custom_icon_url: icon_url,
                    favicon: None,
                    custom_css: css,
                };
                self.update_cloak(&profile)?;
            }
            CloakAction::Preset { name } => {
                let Some(preset) = cloak::preset(&name) else {
                    let names: Vec<_> = PRESETS.iter().map(|p| p.name).collect();
                    bail!("unknown preset '{}' (available: {})", name, names.join(", "));
                };
                self.update_cloak(&preset.profile())?;
            }
            CloakAction::Presets => {
                for preset in PRESETS {
                    println!("{:<18} {}", preset.name, preset.title);
                }
            }
            CloakAction::Apply => {
                cloak::apply(&self.session.cloak.get(), &mut self.chrome)
                    .context("failed to set terminal title")?;
            }
            CloakAction::Reset => {
                self.session.cloak.reset()?;
                cloak::apply(&self.session.cloak.get(), &mut self.chrome)
                    .context("failed to set terminal title")?;
                println!("Cloak restored to default.");
            }
        }
        Ok(())
    }

    fn update_cloak(&mut self, profile: &CloakProfile) -> Result<()> {
        let title_changed = self.session.cloak.replace(profile)?;
        if title_changed {
            cloak::apply(profile, &mut self.chrome).context("failed to set terminal title")?;
        }
        print_cloak(profile);
        Ok(())
    }

    // ── Support ───────────────────────────────────────────────────

    async fn support(&self, message: &str) -> Result<()> {
        match self.provider.process_chat_message(message, &[]).await {
            Ok(reply) => {
                println!("{}", textwrap::fill(&reply.message, CHAT_WRAP_WIDTH));
                if reply.should_escalate {
                    println!();
                    println!("This conversation has been flagged for a human agent.");
                }
                Ok(())
            }
            Err(SupportError::NotConfigured) => bail!(
                "{}. Use the history and settings commands in the meantime.",
                SupportError::NotConfigured
            ),
            Err(e) => Err(e.into()),
        }
    }

    // ── Reset ─────────────────────────────────────────────────────

    fn reset_all(&mut self, yes: bool) -> Result<()> {
        if !yes {
            bail!("this deletes all history, settings and cloak data; re-run with --yes");
        }
        self.session.clear_all_data()?;
        cloak::apply(&self.session.cloak.get(), &mut self.chrome)
            .context("failed to set terminal title")?;
        println!("All local data cleared.");
        Ok(())
    }
}

// ── Output ────────────────────────────────────────────────────────

fn print_records<'a>(records: impl Iterator<Item = &'a NavigationRecord>) {
    let now = Utc::now();
    for record in records {
        println!(
            "{:<36}  {:<width$}  {:<13}  {:>9}  {}",
            record.id,
            truncate_str(&record.title, TITLE_COLUMN),
            record.icon,
            format_age(record.timestamp, now),
            record.url,
            width = TITLE_COLUMN,
        );
    }
}

fn print_settings(settings: &Settings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings).context("failed to format settings")?;
    println!("{}", json);
    Ok(())
}

fn print_cloak(profile: &CloakProfile) {
    println!("title:     {}", profile.title);
    println!("icon type: {}", profile.icon_type);
    if let Some(href) = profile.icon_href() {
        println!("icon:      {}", href);
    }
    if let Some(css) = &profile.custom_css {
        println!("css:       {}", css);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Icon;

    fn app_in(dir: &tempfile::TempDir) -> App {
        let config = Config {
            database_path: dir.path().join("state.db"),
            ..Config::default()
        };
        App::new(config, true).unwrap()
    }

    fn seed(app: &mut App) {
        app.session
            .history
            .append(NavigationRecord {
                timestamp: Utc::now() - Duration::days(1),
                ..NavigationRecord::new("https://a.com/", "A", Icon::Globe)
            })
            .unwrap();
    }

    // ── History prune ─────────────────────────────────────────────

    #[test]
    fn prune_with_huge_day_count_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        seed(&mut app);

        app.history(HistoryAction::Prune {
            days: Some(1_000_000_000),
        })
        .unwrap();
        app.history(HistoryAction::Prune { days: Some(i64::MAX) }).unwrap();

        assert_eq!(app.session.history.list().len(), 1);
    }

    #[test]
    fn prune_zero_days_removes_older_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        seed(&mut app);

        app.history(HistoryAction::Prune { days: Some(0) }).unwrap();

        assert!(app.session.history.list().is_empty());
    }

    #[test]
    fn prune_negative_days_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        seed(&mut app);

        assert!(app.history(HistoryAction::Prune { days: Some(-1) }).is_err());
        assert_eq!(app.session.history.list().len(), 1);
    }
}
