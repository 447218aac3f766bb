//! External command templates with `{name}` placeholders

use std::ffi::OsStr;
use std::process::Command;

/// A program plus arguments in which `{name}` placeholders are substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// `None` for an empty argument vector
    pub fn parse(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Substitute placeholders and build a ready-to-spawn command.
    ///
    /// Unknown placeholders are left untouched.
    pub fn render(&self, vars: &[(&str, &OsStr)]) -> Command {
        let mut command = Command::new(&self.program);
        for arg in &self.args {
            command.arg(substitute(arg, vars));
        }
        command
    }

    /// Arguments after substitution, for logging
    pub fn rendered_args(&self, vars: &[(&str, &OsStr)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| substitute(arg, vars).to_string_lossy().into_owned())
            .collect()
    }
}

fn substitute(arg: &str, vars: &[(&str, &OsStr)]) -> std::ffi::OsString {
    // A whole-argument placeholder keeps non-UTF-8 paths intact
    for (name, value) in vars {
        if arg.len() == name.len() + 2
            && arg.starts_with('{')
            && arg.ends_with('}')
            && &arg[1..arg.len() - 1] == *name
        {
            return value.to_os_string();
        }
    }

    let mut text = arg.to_string();
    for (name, value) in vars {
        let placeholder = format!("{{{}}}", name);
        if text.contains(&placeholder) {
            text = text.replace(&placeholder, &value.to_string_lossy());
        }
    }
    text.into()
}
