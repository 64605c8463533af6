//! Command implementations for the newsbot CLI.
//!
//! Every editing command runs one full cycle: fetch the current file,
//! apply the edit in memory, save it back guarded by the fetched revision.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use newsbot_config::config::{default_config_dir, default_config_path};
use newsbot_config::palette::{find_color, COLOR_PALETTE};
use newsbot_config::sync::DEFAULT_COMMIT_MESSAGE;
use newsbot_config::{
    AppConfig, ConfigDocument, ConfigSession, Credential, CredentialStore, FetchStatus,
    GitHubContents, KeyValueStore, SyncError,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{KeywordAction, ReceiverAction};

type Session = ConfigSession<GitHubContents, Box<dyn KeyValueStore>>;

/// Loaded settings plus where they came from.
pub struct App {
    config: AppConfig,
    config_dir: PathBuf,
}

impl App {
    /// Load settings from `path` or the default location.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(default_config_path);
        let config = AppConfig::load_or_default(&path)?;
        let config_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_dir);

        Ok(Self { config, config_dir })
    }

    fn session(&self) -> Session {
        let backend = self.config.credential_backend(&self.config_dir);
        let store = CredentialStore::with_key(backend, self.config.credentials.key.clone());
        let commit_message = if self.config.github.commit_message.trim().is_empty() {
            DEFAULT_COMMIT_MESSAGE.to_string()
        } else {
            self.config.github.commit_message.clone()
        };

        ConfigSession::new(GitHubContents::from_config(&self.config.github), store)
            .with_commit_message(commit_message)
    }
}

/// Run `f` while showing a spinner.
fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = f();
    spinner.finish_and_clear();
    result
}

fn require_credential(session: &Session) -> Result<Credential> {
    session.load_credential().with_context(|| {
        format!(
            "No GitHub credential stored. Run {} first.",
            "newsbot setup".cyan()
        )
    })
}

/// Fetch the remote file into the session.
fn connect(session: &Session, credential: &Credential) -> Result<FetchStatus> {
    let status = with_spinner("Loading config from GitHub...", || {
        session.fetch_remote(credential)
    });

    match status {
        Ok(status) => Ok(status),
        Err(SyncError::AuthInvalid) => {
            println!(
                "{}",
                "✗ Token is invalid. The stored credential has been removed.".red()
            );
            bail!("Run `newsbot setup` again with a valid token")
        }
        Err(e) => Err(e).context("Cannot load config from GitHub"),
    }
}

/// Save the session's document back to GitHub.
fn save(session: &Session, credential: &Credential) -> Result<()> {
    let saved = with_spinner("Saving to GitHub...", || session.save_remote(credential));

    match saved {
        Ok(revision) => {
            println!(
                "  {} Saved {} (revision {})",
                "✓".green(),
                format!("{}/{}", credential.owner, credential.repo).bold(),
                short_sha(revision.as_str()).dimmed()
            );
            Ok(())
        }
        // GitHub's message is shown as-is
        Err(SyncError::Remote { message, .. }) => {
            bail!("Save failed: {}", message)
        }
        Err(e) => Err(e).context("Save failed"),
    }
}

/// Fetch, apply `edit`, save.
fn update<F>(app: &App, edit: F) -> Result<()>
where
    F: FnOnce(&mut ConfigDocument) -> Result<String>,
{
    let session = app.session();
    let credential = require_credential(&session)?;
    connect(&session, &credential)?;

    let description = session.try_edit(edit)?;
    println!("  {} {}", "•".cyan(), description);

    save(&session, &credential)
}

/// Convert a 1-based position from the command line.
fn position(index: usize, len: usize, what: &str) -> Result<usize> {
    if index == 0 || index > len {
        bail!("There is no {} #{} (list has {})", what, index, len);
    }
    Ok(index - 1)
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

fn on_off(enabled: bool) -> colored::ColoredString {
    if enabled {
        "on".green()
    } else {
        "off".dimmed()
    }
}

/// `#rrggbb` to RGB, for the color swatch.
fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn swatch(color: &str) -> colored::ColoredString {
    match hex_rgb(color) {
        Some((r, g, b)) => "●".truecolor(r, g, b),
        None => "●".normal(),
    }
}

fn resolve_color(color: &str) -> Result<&'static str> {
    find_color(color).with_context(|| {
        format!(
            "'{}' is not a palette color (see {})",
            color,
            "newsbot palette".cyan()
        )
    })
}

// ============ SETUP / RESET ============

pub fn setup(
    app: &App,
    owner: Option<String>,
    repo: Option<String>,
    token: Option<String>,
) -> Result<()> {
    println!("{}", "GitHub Setup".cyan().bold());

    let owner = match owner {
        Some(owner) => owner,
        None => Input::<String>::new()
            .with_prompt("Repository owner")
            .interact_text()?,
    };
    let repo = match repo {
        Some(repo) => repo,
        None => Input::<String>::new()
            .with_prompt("Repository name")
            .interact_text()?,
    };
    let token = match token {
        Some(token) => token,
        None => Password::new()
            .with_prompt("Personal access token")
            .interact()?,
    };

    let credential = Credential::new(&owner, &repo, &token);
    if !credential.is_complete() {
        bail!("Owner, repository and token are all required");
    }

    let session = app.session();
    session.save_credential(&credential)?;
    println!("  {} Saved credential", "✓".green());

    match connect(&session, &credential)? {
        FetchStatus::Existing(revision) => println!(
            "  {} Connected as {} (revision {})",
            "✓".green(),
            format!("@{}", credential.owner).bold(),
            short_sha(revision.as_str()).dimmed()
        ),
        FetchStatus::FirstRun => {
            println!(
                "  {} Connected as {}",
                "✓".green(),
                format!("@{}", credential.owner).bold()
            );
            println!(
                "  {}",
                "No config file yet; the first save will create it with the default keywords."
                    .yellow()
            );
        }
    }

    Ok(())
}

pub fn reset(app: &App, yes: bool) -> Result<()> {
    let confirmed = yes
        || Confirm::new()
            .with_prompt("Remove the stored GitHub token?")
            .default(false)
            .interact()?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    app.session().clear_credential()?;
    println!("  {} Credential removed", "✓".green());
    Ok(())
}

// ============ SHOW / EXPORT / PALETTE ============

pub fn show(app: &App) -> Result<()> {
    let session = app.session();
    let credential = require_credential(&session)?;
    let status = connect(&session, &credential)?;
    let doc = session.document();

    let revision = match &status {
        FetchStatus::Existing(revision) => short_sha(revision.as_str()).to_string(),
        FetchStatus::FirstRun => "not created yet".to_string(),
    };
    println!(
        "{}  {}/{}  {}",
        format!("@{}", credential.owner).bold(),
        credential.owner,
        credential.repo,
        format!("({})", revision).dimmed()
    );

    println!("\n{}", "Keywords".cyan().bold());
    if doc.keywords.is_empty() {
        println!("  {}", "No keywords.".dimmed());
    }
    for (idx, keyword) in doc.keywords.iter().enumerate() {
        println!(
            "  {}. {} {}  {}  {}",
            (idx + 1).to_string().cyan(),
            swatch(&keyword.color),
            keyword.name.white().bold(),
            keyword.color.dimmed(),
            on_off(keyword.enabled)
        );
    }

    println!("\n{}", "Receivers".cyan().bold());
    if doc.receivers.is_empty() {
        println!("  {}", "No extra receivers.".dimmed());
    }
    for (idx, receiver) in doc.receivers.iter().enumerate() {
        println!(
            "  {}. {}  {}",
            (idx + 1).to_string().cyan(),
            receiver.email,
            on_off(receiver.enabled)
        );
    }

    println!("\n{}", "Settings".cyan().bold());
    println!(
        "  similarity_threshold      {}",
        doc.settings.similarity_threshold
    );
    println!(
        "  max_articles_per_keyword  {}",
        doc.settings.max_articles_per_keyword
    );
    println!();

    Ok(())
}

pub fn export(app: &App, output: &Path) -> Result<()> {
    let session = app.session();
    let credential = require_credential(&session)?;
    connect(&session, &credential)?;

    let prepared = session.prepare_for_save()?;
    std::fs::write(output, &prepared.content)
        .with_context(|| format!("Cannot write {}", output.display()))?;

    println!("  {} Wrote {}", "✓".green(), output.display());
    Ok(())
}

pub fn palette() -> Result<()> {
    for (idx, color) in COLOR_PALETTE.iter().enumerate() {
        println!("  {:>2}. {} {}", idx + 1, swatch(color), color);
    }
    Ok(())
}

// ============ EDITING ============

pub fn keyword(app: &App, action: KeywordAction) -> Result<()> {
    match action {
        KeywordAction::Add {
            name,
            color,
            disabled,
        } => {
            if name.trim().is_empty() {
                bail!("Keyword cannot be empty");
            }
            let color = color.as_deref().map(resolve_color).transpose()?;
            update(app, |doc| {
                let keyword = doc.add_keyword(name.clone());
                if let Some(color) = color {
                    keyword.color = color.to_string();
                }
                keyword.enabled = !disabled;
                Ok(format!("Added keyword '{}' ({})", name, keyword.color))
            })
        }
        KeywordAction::Remove { index } => update(app, |doc| {
            let i = position(index, doc.keywords.len(), "keyword")?;
            let removed = doc.keywords.remove(i);
            Ok(format!("Removed keyword '{}'", removed.name))
        }),
        KeywordAction::Rename { index, name } => update(app, |doc| {
            let i = position(index, doc.keywords.len(), "keyword")?;
            let old = std::mem::replace(&mut doc.keywords[i].name, name.clone());
            Ok(format!("Renamed keyword '{}' to '{}'", old, name))
        }),
        KeywordAction::Toggle { index } => update(app, |doc| {
            let i = position(index, doc.keywords.len(), "keyword")?;
            let keyword = &mut doc.keywords[i];
            keyword.enabled = !keyword.enabled;
            Ok(format!(
                "Keyword '{}' is now {}",
                keyword.name,
                if keyword.enabled { "on" } else { "off" }
            ))
        }),
        KeywordAction::Color { index, color } => {
            let color = resolve_color(&color)?;
            update(app, |doc| {
                let i = position(index, doc.keywords.len(), "keyword")?;
                doc.keywords[i].color = color.to_string();
                Ok(format!("Keyword '{}' is now {}", doc.keywords[i].name, color))
            })
        }
    }
}

pub fn receiver(app: &App, action: ReceiverAction) -> Result<()> {
    match action {
        ReceiverAction::Add { email } => {
            if email.trim().is_empty() {
                bail!("Email cannot be empty");
            }
            update(app, |doc| {
                doc.add_receiver(email.clone());
                Ok(format!("Added receiver {}", email))
            })
        }
        ReceiverAction::Remove { index } => update(app, |doc| {
            let i = position(index, doc.receivers.len(), "receiver")?;
            let removed = doc.receivers.remove(i);
            Ok(format!("Removed receiver {}", removed.email))
        }),
        ReceiverAction::Set { index, email } => update(app, |doc| {
            let i = position(index, doc.receivers.len(), "receiver")?;
            let old = std::mem::replace(&mut doc.receivers[i].email, email.clone());
            Ok(format!("Changed receiver {} to {}", old, email))
        }),
        ReceiverAction::Toggle { index } => update(app, |doc| {
            let i = position(index, doc.receivers.len(), "receiver")?;
            let receiver = &mut doc.receivers[i];
            receiver.enabled = !receiver.enabled;
            Ok(format!(
                "Receiver {} is now {}",
                receiver.email,
                if receiver.enabled { "on" } else { "off" }
            ))
        }),
    }
}

pub fn settings(app: &App, similarity: Option<f64>, max_articles: Option<u32>) -> Result<()> {
    if similarity.is_none() && max_articles.is_none() {
        bail!("Nothing to change (use --similarity and/or --max-articles)");
    }

    update(app, |doc| {
        if let Some(similarity) = similarity {
            doc.settings.similarity_threshold = similarity;
        }
        if let Some(max_articles) = max_articles {
            doc.settings.max_articles_per_keyword = max_articles;
        }
        // Values outside the accepted range are replaced on save
        let effective = doc.settings.normalized();
        Ok(format!(
            "similarity_threshold = {}, max_articles_per_keyword = {}",
            effective.similarity_threshold, effective.max_articles_per_keyword
        ))
    })
}
