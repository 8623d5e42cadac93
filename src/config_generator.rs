//! Icinga2 `CheckCommand` generation from the plugin's clap definition.

use clap::ArgAction;

use crate::{Resource, ServiceState};

pub struct CommandDescription {
    arguments: Vec<ArgumentDescription>,
}

pub struct ArgumentDescription {
    flag: String,
    var: String,
    description: Option<String>,
    is_flag: bool,
    default_value: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ToIcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("error converting to command description: {0}")]
    CommandDescriptionFromError(#[from] CommandDescriptionFromError),
}

impl CommandDescription {
    /// Renders the definition for a plugin installed at `executable`. Custom variables are
    /// prefixed with `name`.
    pub fn to_icinga_command(&self, name: &str, executable: &str) -> String {
        let mut out = format!("object CheckCommand \"{name}\" {{\n");

        out.push_str(&format!("  command = [ \"{}\" ]\n", escape_string(executable)));
        out.push_str("  arguments = {\n");
        for arg in &self.arguments {
            out.push_str(&format!("    \"{}\" = {{\n", arg.flag));

            if arg.is_flag {
                out.push_str(&format!("      set_if = \"${}_{}$\"\n", name, arg.var));
            } else {
                out.push_str(&format!("      value = \"${}_{}$\"\n", name, arg.var));
            }

            if let Some(description) = &arg.description {
                out.push_str(&format!(
                    "      description = \"{}\"\n",
                    escape_string(description)
                ));
            }

            out.push_str("    }\n");
        }
        out.push_str("  }\n");

        let defaults: Vec<_> = self
            .arguments
            .iter()
            .filter(|arg| !arg.is_flag)
            .filter_map(|arg| arg.default_value.as_ref().map(|value| (arg, value)))
            .collect();
        if !defaults.is_empty() {
            out.push('\n');
        }
        for (arg, default_value) in defaults {
            out.push_str(&format!(
                "  vars.{}_{} = \"{}\"\n",
                name,
                arg.var,
                escape_string(default_value)
            ));
        }

        out.push_str("}\n");
        out
    }
}

fn escape_string(s: &str) -> String {
    s.replace('"', "\\\"").replace('$', "$$")
}

#[derive(Debug, thiserror::Error)]
pub enum CommandDescriptionFromError {
    #[error("argument {0} has neither a short nor a long flag")]
    MissingFlag(String),
}

impl TryFrom<&clap::Command> for CommandDescription {
    type Error = CommandDescriptionFromError;

    fn try_from(cmd: &clap::Command) -> Result<Self, Self::Error> {
        let mut arguments = Vec::new();

        for arg in cmd.get_arguments() {
            if arg.is_hide_set()
                || matches!(arg.get_action(), ArgAction::Help | ArgAction::Version)
            {
                continue;
            }

            // Flags are spelled the way the plugin documents them: `-H`, `-cert`.
            let flag = match (arg.get_short(), arg.get_long()) {
                (Some(short), _) => format!("-{short}"),
                (None, Some(long)) => format!("-{long}"),
                (None, None) => {
                    return Err(CommandDescriptionFromError::MissingFlag(
                        arg.get_id().to_string(),
                    ))
                }
            };

            let var = arg.get_id().as_str().replace('-', "_");
            let description = arg.get_help().map(|s| s.to_string());
            // `-debug` style switches: plain `SetTrue` or an optional `=value` defaulting to true
            let is_flag = matches!(arg.get_action(), ArgAction::SetTrue)
                || arg
                    .get_default_missing_values()
                    .first()
                    .and_then(|v| v.to_str())
                    == Some("true");

            let default_value = arg
                .get_default_values()
                .first()
                .and_then(|v| v.to_str())
                .map(|s| s.to_string());

            arguments.push(ArgumentDescription {
                flag,
                var,
                description,
                is_flag,
                default_value,
            });
        }

        Ok(CommandDescription { arguments })
    }
}

/// The Icinga2 command definition for `cmd`, pointing at the running executable.
pub fn icinga_command_config(
    name: &str,
    cmd: &clap::Command,
) -> Result<String, ToIcingaCommandError> {
    let description = CommandDescription::try_from(cmd)?;
    let current_exe = std::env::current_exe()?;
    let executable = current_exe
        .to_str()
        .ok_or(ToIcingaCommandError::InvalidExecutablePath)?;

    Ok(description.to_icinga_command(name, executable))
}

/// Prints the Icinga2 command definition and exits.
pub fn print_icinga_command_config_and_exit(name: &str, cmd: &clap::Command) -> ! {
    match icinga_command_config(name, cmd) {
        Ok(out) => {
            println!("{}", out.trim());
            std::process::exit(0);
        }
        Err(err) => Resource::new(ServiceState::Unknown)
            .with_description(err.to_string())
            .print_and_exit(),
    }
}
