//! Checks that a Puppet Server status URI answers.

use clap::{CommandFactory, Parser};

use check_puppetserver::check::run_plugin;
use check_puppetserver::config::{self, CommonArgs, Target};
use check_puppetserver::config_generator::print_icinga_command_config_and_exit;
use check_puppetserver::query::SERVICES_STATUS_PATH;

/// Asks a Puppet Server status URI for a non-empty HTTP 200 answer.
#[derive(Parser)]
#[command(name = "check_puppetserver_services", version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Status URI to query
    #[arg(short = 'u', default_value = SERVICES_STATUS_PATH)]
    uri: String,
}

fn main() {
    let cli: Cli = config::parse_or_exit();

    if cli.common.print_icinga_command {
        print_icinga_command_config_and_exit("puppetserver_services", &Cli::command());
    }

    run_plugin(cli.common, Target::Uri(cli.uri)).print_and_exit()
}
