use crate::cli::Commands;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    match command {
        Commands::Import { json, .. } | Commands::ImportList { json } => {
            OutputMode::from_flag(*json)
        }
        Commands::Analyze(args)
        | Commands::Recurring(args)
        | Commands::Creep(args)
        | Commands::Trials(args) => OutputMode::from_flag(args.json),
        Commands::Init | Commands::Report { .. } => OutputMode::Text,
    }
}
