//! External editor process launcher.

use notekeep_core::{Editor, EditorFlags};
use std::io;
use std::path::Path;
use std::process::Command;

/// Runs a terminal editor and blocks until it exits.
///
/// `command_line` may carry arguments, e.g. `code --wait`.
#[derive(Debug, Clone)]
pub struct CommandEditor {
    program: String,
    args: Vec<String>,
}

impl CommandEditor {
    pub fn new(command_line: &str) -> io::Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "editor command is empty")
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Editor for CommandEditor {
    fn edit(&mut self, path: &Path, flags: EditorFlags) -> io::Result<()> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if flags.read_only {
            match read_only_flag(&self.program) {
                Some(flag) => {
                    command.arg(flag);
                }
                None => log::warn!(
                    "event=editor_run module=cli status=no_read_only_flag editor={}",
                    self.program
                ),
            }
        }

        log::debug!(
            "event=editor_run module=cli status=start editor={} read_only={}",
            self.program,
            flags.read_only
        );
        let status = command.arg(path).status()?;
        if !status.success() {
            return Err(io::Error::other(format!(
                "editor `{}` exited with {status}",
                self.program
            )));
        }
        Ok(())
    }
}

/// Flag that opens `program` in view-only mode.
fn read_only_flag(program: &str) -> Option<&'static str> {
    let name = Path::new(program)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(program);
    match name {
        "nano" => Some("-v"),
        "vi" | "vim" | "nvim" | "view" => Some("-R"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{read_only_flag, CommandEditor};

    #[test]
    fn command_line_is_split_into_program_and_args() {
        let editor = CommandEditor::new("code --wait").unwrap();
        assert_eq!(editor.program(), "code");
        assert_eq!(editor.args, vec!["--wait"]);
        assert!(CommandEditor::new("   ").is_err());
    }

    #[test]
    fn read_only_flags_match_known_editors() {
        assert_eq!(read_only_flag("nano"), Some("-v"));
        assert_eq!(read_only_flag("/usr/bin/nvim"), Some("-R"));
        assert_eq!(read_only_flag("vim"), Some("-R"));
        assert_eq!(read_only_flag("code"), None);
    }
}
