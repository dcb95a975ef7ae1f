use clap::{Args, Parser, Subcommand};

use crate::profile::{ModelOverrides, ProfileUpdate};

#[derive(Parser, Debug)]
#[command(name = "cm", version, about = "Claude Code model configuration manager: store API profiles, switch between them and launch claude", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new model configuration. The token is prompted for (hidden) when -t is omitted.
    Add(AddArgs),
    /// Add a model configuration from a provider preset (anthropic, openrouter, openai, xiaomi, custom)
    Provider(ProviderArgs),
    /// List all model configurations (marks the current one)
    #[command(alias = "ls")]
    List,
    /// Switch to a model configuration and launch claude
    Use {
        /// Model name (a picker is shown if omitted)
        name: Option<String>,
        /// Only switch, do not launch claude
        #[arg(long)]
        no_launch: bool,
        /// Arguments passed through to claude
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        claude_args: Vec<String>,
    },
    /// Launch claude with the current model configuration
    Run {
        /// Arguments passed through to claude (e.g. cm run -- --resume)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        claude_args: Vec<String>,
    },
    /// Show the current model configuration
    Current,
    /// Remove a model configuration
    #[command(alias = "rm")]
    Remove {
        /// Model name
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Update a model configuration (prompts for changes when no option is given)
    Update(UpdateArgs),
    /// Show configuration change history
    History {
        /// Number of records to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Interactive mode for managing models
    #[command(alias = "i")]
    Interactive,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Model name
    #[arg(short, long)]
    pub name: String,
    /// Anthropic API token
    #[arg(short, long)]
    pub token: Option<String>,
    /// Anthropic base URL
    #[arg(short, long)]
    pub base_url: String,
    /// Model description
    #[arg(short, long)]
    pub description: Option<String>,
    /// Default Opus model
    #[arg(long)]
    pub opus_model: Option<String>,
    /// Default Sonnet model
    #[arg(long)]
    pub sonnet_model: Option<String>,
    /// Default Haiku model
    #[arg(long)]
    pub haiku_model: Option<String>,
}

impl AddArgs {
    pub fn overrides(&self) -> ModelOverrides {
        ModelOverrides {
            opus: self.opus_model.clone(),
            sonnet: self.sonnet_model.clone(),
            haiku: self.haiku_model.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ProviderArgs {
    /// Preset key (a picker is shown if omitted)
    pub preset: Option<String>,
    /// Name for the new model configuration
    #[arg(short, long)]
    pub name: Option<String>,
    /// API key for the provider
    #[arg(short, long)]
    pub token: Option<String>,
    /// Base URL (required for the custom preset)
    #[arg(short, long)]
    pub base_url: Option<String>,
    /// List the available presets and exit
    #[arg(long)]
    pub list: bool,
}

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Model name to update (a picker is shown if omitted)
    pub name: Option<String>,
    /// New name for the model
    #[arg(short = 'n', long)]
    pub new_name: Option<String>,
    /// New API token
    #[arg(short, long)]
    pub token: Option<String>,
    /// New base URL
    #[arg(short, long)]
    pub base_url: Option<String>,
    /// New description (empty string removes it)
    #[arg(short, long)]
    pub description: Option<String>,
    /// Default Opus model
    #[arg(long, conflicts_with = "clear_opus_model")]
    pub opus_model: Option<String>,
    /// Default Sonnet model
    #[arg(long, conflicts_with = "clear_sonnet_model")]
    pub sonnet_model: Option<String>,
    /// Default Haiku model
    #[arg(long, conflicts_with = "clear_haiku_model")]
    pub haiku_model: Option<String>,
    /// Remove the default Opus model
    #[arg(long)]
    pub clear_opus_model: bool,
    /// Remove the default Sonnet model
    #[arg(long)]
    pub clear_sonnet_model: bool,
    /// Remove the default Haiku model
    #[arg(long)]
    pub clear_haiku_model: bool,
}

impl UpdateArgs {
    /// The patch described by the command-line options; empty when none were given.
    pub fn to_update(&self) -> ProfileUpdate {
        fn override_patch(value: &Option<String>, clear: bool) -> Option<Option<String>> {
            if clear {
                Some(None)
            } else {
                value.clone().map(Some)
            }
        }

        ProfileUpdate {
            name: self.new_name.clone(),
            token: self.token.clone(),
            base_url: self.base_url.clone(),
            description: self.description.clone(),
            opus_model: override_patch(&self.opus_model, self.clear_opus_model),
            sonnet_model: override_patch(&self.sonnet_model, self.clear_sonnet_model),
            haiku_model: override_patch(&self.haiku_model, self.clear_haiku_model),
        }
    }
}
