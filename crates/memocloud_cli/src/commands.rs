//! Command execution over a memo repository.
//!
//! # Invariants
//! - Every command except `login` and `logout` requires a persisted session.
//! - Commands that write memos reconcile the cache mirror with the remote
//!   store first, so cache-only memos are pushed instead of overwritten.
//!   When the remote store is unreachable they fall back to the cache.

use std::error::Error;
use std::path::Path;

use log::warn;

use crate::cli::Commands;
use memocloud_core::{
    derive_memo_preview, BlockKind, LoadSource, LocalCache, MarkupEditor, Memo, MemoError,
    MemoRepository, RemoteStore, RichTextEditor,
};

pub(crate) type CliResult<T> = Result<T, Box<dyn Error>>;

/// Runs one parsed command against `repo`.
pub(crate) fn execute<S: RemoteStore, C: LocalCache>(
    repo: &mut MemoRepository<S, C>,
    command: Commands,
) -> CliResult<()> {
    match command {
        Commands::Login { username, password } => login(repo, &username, &password),
        Commands::Logout => {
            repo.logout()?;
            println!("logged out");
            Ok(())
        }
        command => {
            if !repo.restore_session()? {
                return Err("not logged in; run `memocloud login` first".into());
            }
            match &command {
                Commands::Sync => {}
                Commands::New { .. } | Commands::Edit { .. } | Commands::Delete { .. } => {
                    sync_or_load(repo)?;
                }
                _ => load(repo)?,
            }
            dispatch(repo, command)
        }
    }
}

fn dispatch<S: RemoteStore, C: LocalCache>(
    repo: &mut MemoRepository<S, C>,
    command: Commands,
) -> CliResult<()> {
    match command {
        Commands::List => {
            list(repo);
            Ok(())
        }
        Commands::Show { id } => {
            let memo = repo
                .get(&id)
                .ok_or_else(|| format!("memo not found: {id}"))?;
            show(memo);
            Ok(())
        }
        Commands::New { title, body } => {
            repo.create_memo();
            let report = repo.save_current(title, body)?;
            warn_if_present(report.warning.as_deref());
            println!("{}", report.memo.id);
            Ok(())
        }
        Commands::Edit {
            id,
            title,
            body,
            todo,
            rule,
            link,
            attach,
        } => {
            let memo = repo.open(&id)?.clone();
            let mut editor = MarkupEditor::new(body.unwrap_or_else(|| memo.markup().to_string()));
            for text in todo {
                editor.insert_block(BlockKind::TodoItem(text));
            }
            if rule {
                editor.insert_block(BlockKind::HorizontalRule);
            }
            if let Some(url) = link {
                editor.insert_link(&url)?;
            }
            if let Some(path) = attach {
                let (url, name) = upload(repo, &path)?;
                editor.move_to_end();
                editor.insert_block(BlockKind::Attachment { url, name });
            }

            let report = repo.save_current(title.unwrap_or(memo.title), editor.into_markup())?;
            warn_if_present(report.warning.as_deref());
            println!("saved {}", report.memo.id);
            Ok(())
        }
        Commands::Delete { id } => {
            let report = repo.delete(&id)?;
            warn_if_present(report.warning.as_deref());
            if !report.removed {
                return Err(format!("memo not found: {id}").into());
            }
            println!("deleted {id}");
            Ok(())
        }
        Commands::Upload { file } => {
            let (url, _) = upload(repo, &file)?;
            println!("{url}");
            Ok(())
        }
        Commands::Sync => {
            let report = repo.reconcile()?;
            print_reconcile(&report.push_failed, &report.skipped);
            println!(
                "pushed {} memo(s), {} total",
                report.pushed.len(),
                report.total
            );
            Ok(())
        }
        Commands::Login { .. } | Commands::Logout => Ok(()),
    }
}

fn login<S: RemoteStore, C: LocalCache>(
    repo: &mut MemoRepository<S, C>,
    username: &str,
    password: &str,
) -> CliResult<()> {
    let outcome = repo.login(username, password)?;
    if !outcome.remote_reachable {
        eprintln!("warning: remote store unreachable; working from the local cache");
    }
    load(repo)?;
    println!("logged in, {} memo(s)", repo.memos().len());
    Ok(())
}

fn load<S: RemoteStore, C: LocalCache>(repo: &mut MemoRepository<S, C>) -> CliResult<()> {
    let report = repo.load_all()?;
    if report.source == LoadSource::LocalCache {
        warn_if_present(report.warning.as_deref());
    }
    for file in &report.skipped {
        eprintln!("warning: skipped unreadable memo file {file}");
    }
    Ok(())
}

/// Merges the cache mirror into the remote store before a write, or loads
/// the cached collection when the remote store cannot be listed.
fn sync_or_load<S: RemoteStore, C: LocalCache>(repo: &mut MemoRepository<S, C>) -> CliResult<()> {
    match repo.reconcile() {
        Ok(report) => {
            print_reconcile(&report.push_failed, &report.skipped);
            Ok(())
        }
        Err(MemoError::RemoteUnavailable(err)) => {
            warn!(
                "event=cli_sync module=cli status=fallback source=local_cache error={}",
                err
            );
            load(repo)
        }
        Err(err) => Err(err.into()),
    }
}

fn print_reconcile(push_failed: &[String], skipped: &[String]) {
    for id in push_failed {
        eprintln!("warning: could not push {id}");
    }
    for file in skipped {
        eprintln!("warning: skipped unreadable memo file {file}");
    }
}

fn upload<S: RemoteStore, C: LocalCache>(
    repo: &mut MemoRepository<S, C>,
    path: &Path,
) -> CliResult<(String, String)> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let url = repo.upload_attachment(&bytes, &name)?;
    Ok((url, name))
}

fn list<S: RemoteStore, C: LocalCache>(repo: &MemoRepository<S, C>) {
    for memo in repo.memos() {
        println!(
            "{}  {}  {}",
            memo.id,
            memo.updated_at.format("%Y-%m-%d %H:%M"),
            display_title(memo)
        );
        if let Some(preview) = derive_memo_preview(&memo.content) {
            println!("    {preview}");
        }
    }
}

fn show(memo: &Memo) {
    println!("{}", display_title(memo));
    println!("id:      {}", memo.id);
    println!("created: {}", memo.created_at.to_rfc3339());
    println!("updated: {}", memo.updated_at.to_rfc3339());
    println!();
    println!("{}", memo.markup());
}

fn display_title(memo: &Memo) -> &str {
    if memo.title.trim().is_empty() {
        "(untitled)"
    } else {
        &memo.title
    }
}

fn warn_if_present(warning: Option<&str>) {
    if let Some(warning) = warning {
        eprintln!("warning: {warning}");
    }
}
