use leakscan_client::commands::analyze::{self, AnalyzeRunOptions};
use leakscan_client::commands::import::{self, ImportListOptions, ImportRunOptions};
use leakscan_client::commands::init::{self, InitRunOptions};
use leakscan_client::commands::report::{self, ReportRunOptions};
use leakscan_client::{ClientResult, SuccessEnvelope};

use crate::cli::{AnalyzeArgs, Cli, Commands};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    let home = cli.home.as_deref();
    match &cli.command {
        Commands::Init => init::run_with_options(InitRunOptions {
            home_override: home,
        }),
        Commands::Import {
            path,
            account,
            dry_run,
            json: _,
        } => import::run_with_options(ImportRunOptions {
            path: path.clone(),
            account: account.clone(),
            dry_run: *dry_run,
            home_override: home,
            stdin_override: None,
        }),
        Commands::ImportList { .. } => import::list_with_options(ImportListOptions {
            home_override: home,
        }),
        Commands::Analyze(args) => analyze::run_with_options(analyze_options(args, cli)),
        Commands::Recurring(args) => analyze::recurring_with_options(analyze_options(args, cli)),
        Commands::Creep(args) => analyze::creep_with_options(analyze_options(args, cli)),
        Commands::Trials(args) => analyze::trials_with_options(analyze_options(args, cli)),
        Commands::Report {
            account,
            out,
            thresholds,
        } => report::run_with_options(ReportRunOptions {
            account: account.clone(),
            out: Some(out.clone()),
            policy: Some(thresholds.policy()),
            home_override: home,
        }),
    }
}

fn analyze_options<'a>(args: &AnalyzeArgs, cli: &'a Cli) -> AnalyzeRunOptions<'a> {
    AnalyzeRunOptions {
        account: args.account.clone(),
        from: args.from.as_ref().map(|value| value.as_str().to_string()),
        to: args.to.as_ref().map(|value| value.as_str().to_string()),
        policy: Some(args.thresholds.policy()),
        home_override: cli.home.as_deref(),
    }
}
