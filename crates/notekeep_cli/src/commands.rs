//! Command handlers.

use crate::editor::CommandEditor;
use crate::Command;
use clap::Args;
use notekeep_core::{
    compose, open_repository, ConflictPolicy, EditOutcome, EditService, FileClaimRegistry,
    KeyTagResolver, LockManager, Note, NoteRepository,
};
use std::collections::BTreeSet;
use std::error::Error;
use std::path::PathBuf;

pub type CliResult = Result<(), Box<dyn Error>>;

pub struct Context {
    pub config: notekeep_core::Config,
    pub config_path: PathBuf,
}

impl Context {
    fn editor(&self, override_name: Option<&str>) -> std::io::Result<CommandEditor> {
        CommandEditor::new(override_name.unwrap_or(&self.config.editor))
    }

    fn locks(&self) -> LockManager<FileClaimRegistry> {
        LockManager::new(FileClaimRegistry::new(&self.config.registry_file))
    }
}

#[derive(Args)]
pub struct NewArgs {
    /// Note content; opens the editor when omitted
    content: Option<String>,
    /// Unique alias for the new note
    #[arg(short, long)]
    tag: Option<String>,
    /// Start from the content of an existing note
    #[arg(long, value_name = "KEY|TAG", conflicts_with = "content")]
    from: Option<String>,
    /// Editor to use instead of the configured one
    #[arg(long)]
    editor: Option<String>,
}

#[derive(Args)]
pub struct ModArgs {
    /// Key, key prefix, or tag of the note
    #[arg(required_unless_present = "latest")]
    target: Option<String>,
    /// Edit the last accessed note
    #[arg(short, long, conflicts_with = "target")]
    latest: bool,
    /// Editor to use instead of the configured one
    #[arg(long)]
    editor: Option<String>,
}

#[derive(Args)]
pub struct TargetArgs {
    /// Key, key prefix, or tag of the note
    target: String,
}

#[derive(Args)]
pub struct LsArgs {
    /// Only show notes whose key or tag starts with this prefix
    prefix: Option<String>,
    /// Print only tags or short keys
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args)]
pub struct RmArgs {
    /// Keys, key prefixes, or tags of the notes
    #[arg(required = true)]
    targets: Vec<String>,
}

#[derive(Args)]
pub struct TagArgs {
    /// Key, key prefix, or current tag of the note
    target: String,
    /// New tag
    new_tag: String,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Set the default editor
    #[arg(long)]
    editor: Option<String>,
    /// Set the edit conflict policy (refuse | read-only)
    #[arg(long, value_name = "POLICY")]
    conflict_policy: Option<ConflictPolicy>,
}

#[derive(Args)]
pub struct UnlockArgs {
    /// Key (or key prefix / tag) to release
    target: String,
}

pub fn run(command: Command, ctx: &Context) -> CliResult {
    match command {
        Command::New(args) => new_note(args, ctx),
        Command::Mod(args) => mod_note(args, ctx),
        Command::Cat(args) => cat_note(args, ctx),
        Command::Ls(args) => list_notes(args, ctx),
        Command::Rm(args) => remove_notes(args, ctx),
        Command::Tag(args) => rename_tag(args, ctx),
        Command::Config(args) => configure(args, ctx),
        Command::Locks => list_locks(ctx),
        Command::Unlock(args) => unlock(args, ctx),
        Command::Version => {
            println!("notekeep {}", notekeep_core::core_version());
            Ok(())
        }
    }
}

fn new_note(args: NewArgs, ctx: &Context) -> CliResult {
    let mut repo = open_repository(&ctx.config)?;
    if let Some(tag) = args.tag.as_deref() {
        // Fail before the user spends time in the editor.
        KeyTagResolver::new(repo.store().buffer()).validate_new_tag(tag)?;
    }

    let content = match args.content {
        Some(content) => require_content(Some(content))?,
        None => {
            let initial = match args.from.as_deref() {
                Some(from) => {
                    let key = repo.resolve(from)?;
                    repo.get(&key)?.content
                }
                None => String::new(),
            };
            let mut editor = ctx.editor(args.editor.as_deref())?;
            require_content(compose(&initial, &mut editor)?)?
        }
    };

    let key = repo.create(&content, args.tag.as_deref())?;
    println!("{}", notekeep_core::model::note::short_key(&key));
    Ok(())
}

/// Refuses missing or whitespace-only note content.
fn require_content(content: Option<String>) -> Result<String, Box<dyn Error>> {
    match content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err("empty content, nothing was saved".into()),
    }
}

fn mod_note(args: ModArgs, ctx: &Context) -> CliResult {
    let mut repo = open_repository(&ctx.config)?;
    let key = match args.target.as_deref() {
        Some(target) if !args.latest => repo.resolve(target)?,
        _ => repo.last_accessed()?.key,
    };

    let locks = ctx.locks();
    let mut editor = ctx.editor(args.editor.as_deref())?;
    let outcome = EditService::new(&mut repo, &locks, ctx.config.conflict_policy)
        .edit(&key, &mut editor)?;
    if let EditOutcome::Discarded(note) = outcome {
        eprintln!(
            "note {} is open in another session; changes were discarded",
            note.label()
        );
    }
    Ok(())
}

fn cat_note(args: TargetArgs, ctx: &Context) -> CliResult {
    let mut repo = open_repository(&ctx.config)?;
    let key = repo.resolve(&args.target)?;
    let note = repo.get(&key)?;
    print!("{}", note.content);
    if !note.content.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn list_notes(args: LsArgs, ctx: &Context) -> CliResult {
    let repo = open_repository(&ctx.config)?;
    let wanted: Option<BTreeSet<String>> = args.prefix.as_deref().map(|prefix| {
        KeyTagResolver::new(repo.store().buffer())
            .suggest(prefix)
            .into_iter()
            .collect()
    });
    let notes: Vec<Note> = repo
        .list()
        .into_iter()
        .filter(|note| match &wanted {
            Some(wanted) => {
                wanted.contains(&note.key)
                    || note.tag.as_ref().is_some_and(|tag| wanted.contains(tag))
            }
            None => true,
        })
        .collect();

    if args.quiet {
        for note in &notes {
            println!("{}", note.label());
        }
        return Ok(());
    }

    println!(
        "{:<12} {:<20} {:<20} {:>7} {:>8}",
        "KEY", "TAG", "LAST UPDATE", "VERSION", "SIZE"
    );
    for note in &notes {
        println!(
            "{:<12} {:<20} {:<20} {:>7} {:>8}",
            note.short_key(),
            note.tag.as_deref().unwrap_or("-"),
            note.last_update.format("%Y-%m-%d %H:%M:%S"),
            note.version,
            note.content.len()
        );
    }
    Ok(())
}

fn remove_notes(args: RmArgs, ctx: &Context) -> CliResult {
    let mut repo = open_repository(&ctx.config)?;
    let locks = ctx.locks();
    for target in &args.targets {
        let key = repo.resolve(target)?;
        if locks.is_claimed(&key)? {
            return Err(notekeep_core::StoreError::AlreadyInUse(key).into());
        }
        let removed = repo.remove(&key)?;
        println!("{}", removed.label());
    }
    Ok(())
}

fn rename_tag(args: TagArgs, ctx: &Context) -> CliResult {
    let mut repo = open_repository(&ctx.config)?;
    let key = repo.resolve(&args.target)?;
    repo.rename_tag(&key, &args.new_tag)?;
    Ok(())
}

fn configure(args: ConfigArgs, ctx: &Context) -> CliResult {
    let mut config = ctx.config.clone();
    let mut changed = false;
    if let Some(editor) = args.editor {
        config.editor = editor;
        changed = true;
    }
    if let Some(policy) = args.conflict_policy {
        config.conflict_policy = policy;
        changed = true;
    }
    if changed {
        config.save(&ctx.config_path)?;
        log::info!("event=config_save module=cli status=ok");
    }

    println!("config file:     {}", ctx.config_path.display());
    println!("data file:       {}", config.data_file.display());
    println!("lock registry:   {}", config.registry_file.display());
    println!("log directory:   {}", config.log_dir.display());
    println!("editor:          {}", config.editor);
    println!("conflict policy: {}", config.conflict_policy);
    Ok(())
}

fn list_locks(ctx: &Context) -> CliResult {
    for key in ctx.locks().claimed()? {
        println!("{key}");
    }
    Ok(())
}

fn unlock(args: UnlockArgs, ctx: &Context) -> CliResult {
    // The note may be gone already; fall back to the raw key.
    let key = match open_repository(&ctx.config)?.resolve(&args.target) {
        Ok(key) => key,
        Err(notekeep_core::StoreError::NotFound(_)) => args.target,
        Err(err) => return Err(err.into()),
    };
    if !ctx.locks().force_release(&key)? {
        return Err(format!("key `{key}` is not claimed").into());
    }
    Ok(())
}
