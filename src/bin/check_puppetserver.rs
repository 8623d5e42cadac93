//! Checks a Puppet Server environment through `/puppet/v3/status`.

use clap::{CommandFactory, Parser};

use check_puppetserver::check::run_plugin;
use check_puppetserver::config::{self, CommonArgs, Target};
use check_puppetserver::config_generator::print_icinga_command_config_and_exit;

/// Asks a Puppet Server whether it is alive for a Puppet environment.
#[derive(Parser)]
#[command(name = "check_puppetserver", version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Puppet environment to ask for
    #[arg(short = 'e', default_value = "production")]
    environment: String,
}

fn main() {
    let cli: Cli = config::parse_or_exit();

    if cli.common.print_icinga_command {
        print_icinga_command_config_and_exit("puppetserver", &Cli::command());
    }

    run_plugin(cli.common, Target::Environment(cli.environment)).print_and_exit()
}
