//! Command handlers behind the `cm` binary: prompts, output and launching.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Result, bail};
use crossterm::style::Stylize;
use rpassword::read_password;

use crate::cli::{AddArgs, Commands, ProviderArgs, UpdateArgs};
use crate::error::CmError;
use crate::history::ChangeAction;
use crate::launcher::Launcher;
use crate::profile::{
    Profile, ProfileUpdate, format_model, format_model_full, local_time, mask_token,
};
use crate::providers::{PROVIDERS, Provider, find_provider};
use crate::registry::ProfileRegistry;
use crate::tui;

/// Run one parsed command. `None` launches claude with the current model.
pub fn run(registry: &ProfileRegistry, command: Option<Commands>) -> Result<ExitCode> {
    match command {
        None => auto_launch(registry, &[]),
        Some(Commands::Run { claude_args }) => auto_launch(registry, &claude_args),
        Some(Commands::Add(args)) => add(registry, args),
        Some(Commands::Provider(args)) => add_from_provider(registry, args),
        Some(Commands::List) => list(registry),
        Some(Commands::Use {
            name,
            no_launch,
            claude_args,
        }) => use_model(registry, name, no_launch, &claude_args),
        Some(Commands::Current) => current(registry),
        Some(Commands::Remove { name, yes }) => remove(registry, &name, yes),
        Some(Commands::Update(args)) => update(registry, args),
        Some(Commands::History { limit }) => history(registry, limit),
        Some(Commands::Interactive) => interactive(registry),
    }
}

/// Prompt user for input
fn prompt_input(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Prompt user for password input (hidden input)
fn prompt_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let password = read_password()?;
    Ok(password.trim().to_string())
}

/// Ask a yes/no question; an empty answer picks `default`.
fn confirm(prompt: &str, default: bool) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let answer = prompt_input(&format!("{prompt} {hint} "))?;
    Ok(parse_yes_no(&answer).unwrap_or(default))
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Resolve a picker answer: a 1-based index or an exact model name.
fn parse_selection(input: &str, models: &[Profile]) -> Option<String> {
    let input = input.trim();
    if let Ok(index) = input.parse::<usize>()
        && (1..=models.len()).contains(&index)
    {
        return Some(models[index - 1].name.clone());
    }
    models
        .iter()
        .find(|m| m.name == input)
        .map(|m| m.name.clone())
}

/// Numbered picker over the configured models.
fn select_model(models: &[Profile], message: &str) -> Result<String> {
    if models.is_empty() {
        bail!("No models available");
    }
    println!("{}", message.blue());
    for (i, model) in models.iter().enumerate() {
        match &model.description {
            Some(description) => println!("  {}) {} - {}", i + 1, model.name, description),
            None => println!("  {}) {}", i + 1, model.name),
        }
    }
    loop {
        let answer = prompt_input("> ")?;
        if let Some(name) = parse_selection(&answer, models) {
            return Ok(name);
        }
        println!("{}", "Please enter a number from the list or a model name.".yellow());
    }
}

/// Child exit codes outside 0..=255 become a generic failure.
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

fn print_model_configs(profile: &Profile, indent: &str) {
    let overrides = profile.overrides();
    if overrides.is_empty() {
        return;
    }
    println!("{}", format!("{indent}Model configurations:").dark_grey());
    for (label, model) in overrides.entries() {
        println!("{}", format!("{indent}- {label}: {model}").dark_grey());
    }
}

/// Launch claude for `profile`, printing installation guidance when it is missing.
pub fn launch_profile(profile: &Profile, claude_args: &[String]) -> Result<ExitCode> {
    println!(
        "{}",
        format!("\n🚀 Launching claude with model: {}", profile.name.as_str().bold()).blue()
    );
    println!(
        "{}",
        format!(
            "   Description: {}",
            profile.description.as_deref().unwrap_or("N/A")
        )
        .dark_grey()
    );
    print_model_configs(profile, "   ");
    println!();

    match Launcher::default().launch(profile, claude_args) {
        Ok(code) => Ok(ExitCode::from(exit_byte(code))),
        Err(err @ CmError::LaunchNotFound { .. }) => {
            eprintln!("{}", format!("❌ Error: {err}.").red());
            println!("{}", "\nPlease ensure claude is installed:".yellow());
            println!("{}", "  npm install -g @anthropic-ai/claude-code\n".dark_grey());
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn auto_launch(registry: &ProfileRegistry, claude_args: &[String]) -> Result<ExitCode> {
    if registry.list_models()?.is_empty() {
        println!(
            "{}",
            "No models configured. Use \"cm add\" to add one.".yellow()
        );
        return Ok(ExitCode::SUCCESS);
    }
    let Some(profile) = registry.get_current_model()? else {
        println!(
            "{}",
            "No model currently selected. Use \"cm use <name>\" to select one.".yellow()
        );
        return Ok(ExitCode::SUCCESS);
    };
    launch_profile(&profile, claude_args)
}

fn add(registry: &ProfileRegistry, args: AddArgs) -> Result<ExitCode> {
    let token = match &args.token {
        Some(token) => token.clone(),
        None => prompt_password("API Token: ")?,
    };
    let overrides = args.overrides();
    let profile = registry.add_model(
        &args.name,
        &token,
        &args.base_url,
        args.description.as_deref(),
        overrides,
    )?;

    println!("{}", "✓ Model added successfully!".green());
    println!("{}", format!("  Name: {}", profile.name).dark_grey());
    print_model_configs(&profile, "  ");
    Ok(ExitCode::SUCCESS)
}

fn print_providers() {
    println!("{}", "\nAvailable providers:".blue());
    for (i, provider) in PROVIDERS.iter().enumerate() {
        println!(
            "  {}) {:<11} {}",
            i + 1,
            provider.key,
            format!("{} - {}", provider.name, provider.description).dark_grey()
        );
    }
    println!();
}

fn select_provider() -> Result<&'static Provider> {
    print_providers();
    loop {
        let answer = prompt_input("Select a provider: ")?;
        let by_index = answer
            .parse::<usize>()
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| PROVIDERS.get(i));
        if let Some(provider) = by_index.or_else(|| find_provider(&answer)) {
            return Ok(provider);
        }
        println!("{}", "Unknown provider, try again.".yellow());
    }
}

fn add_from_provider(registry: &ProfileRegistry, args: ProviderArgs) -> Result<ExitCode> {
    if args.list {
        print_providers();
        return Ok(ExitCode::SUCCESS);
    }

    let provider = match &args.preset {
        Some(key) => match find_provider(key) {
            Some(provider) => provider,
            None => bail!(
                "Unknown provider \"{key}\". Run \"cm provider --list\" to see the presets."
            ),
        },
        None => select_provider()?,
    };

    let name = match args.name {
        Some(name) => name,
        None => prompt_input(&format!("Model name [{}]: ", provider.key))?,
    };
    let name = if name.is_empty() {
        provider.key.to_string()
    } else {
        name
    };
    let base_url = match args.base_url {
        Some(url) => url,
        None if provider.needs_base_url() => prompt_input("Base URL: ")?,
        None => provider.base_url.to_string(),
    };
    let token = match args.token {
        Some(token) => token,
        None => prompt_password(&format!("{} API key: ", provider.name))?,
    };

    let profile = registry.add_model(
        &name,
        &token,
        &base_url,
        Some(provider.description),
        provider.overrides(),
    )?;

    println!("{}", "\n✓ Model added successfully!".green());
    println!("{}", format!("  Name: {}", profile.name).dark_grey());
    println!("{}", format!("  Provider: {}", provider.name).dark_grey());
    println!("{}", format!("  Base URL: {}", profile.base_url).dark_grey());

    if confirm("Switch to this model and launch claude?", false)? {
        let selected = registry.switch_model(&profile.name)?;
        println!("{}", format!("\n✓ Switched to model: {}", selected.name).green());
        return launch_profile(&selected, &[]);
    }
    Ok(ExitCode::SUCCESS)
}

fn list(registry: &ProfileRegistry) -> Result<ExitCode> {
    let data = registry.store().read_store()?;
    if data.models.is_empty() {
        println!(
            "{}",
            "No models configured. Use \"cm add\" to add one.".yellow()
        );
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "\nConfigured Models:".blue());
    for model in &data.models {
        println!("{}", format_model(model, data.is_current(&model.name)));
    }
    println!();
    Ok(ExitCode::SUCCESS)
}

fn use_model(
    registry: &ProfileRegistry,
    name: Option<String>,
    no_launch: bool,
    claude_args: &[String],
) -> Result<ExitCode> {
    let name = match name {
        Some(name) => name,
        None => {
            let models = registry.list_models()?;
            if models.is_empty() {
                println!(
                    "{}",
                    "No models configured. Use \"cm add\" to add one.".yellow()
                );
                return Ok(ExitCode::SUCCESS);
            }
            select_model(&models, "Select a model to switch to:")?
        }
    };

    let selected = registry.switch_model(&name)?;
    println!("{}", format!("✓ Switched to model: {}", selected.name).green());
    if no_launch {
        return Ok(ExitCode::SUCCESS);
    }
    launch_profile(&selected, claude_args)
}

fn current(registry: &ProfileRegistry) -> Result<ExitCode> {
    let Some(model) = registry.get_current_model()? else {
        println!("{}", "No model is currently selected.".yellow());
        return Ok(ExitCode::SUCCESS);
    };

    println!("{}", "\nCurrent Model:".green());
    println!("{}", format!("  Name: {}", model.name).bold());
    if let Some(description) = &model.description {
        println!("  Description: {description}");
    }
    println!("  Base URL: {}", model.base_url);
    println!("  Token: {}", mask_token(&model.token));
    if let Some(last_used) = model.last_used {
        println!("{}", format!("  Last used: {}", local_time(last_used)).dark_grey());
    }
    print_model_configs(&model, "  ");
    println!();
    Ok(ExitCode::SUCCESS)
}

fn remove(registry: &ProfileRegistry, name: &str, yes: bool) -> Result<ExitCode> {
    if !yes && !confirm(&format!("Are you sure you want to remove model \"{name}\"?"), false)? {
        println!("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    registry.remove_model(name)?;
    println!("{}", format!("✓ Model \"{name}\" removed successfully!").green());
    Ok(ExitCode::SUCCESS)
}

/// Keep `current` when the answer is blank or unchanged.
fn changed(answer: String, current: &str) -> Option<String> {
    if answer.is_empty() || answer == current {
        None
    } else {
        Some(answer)
    }
}

/// Blank keeps the override, `-` removes it, anything else replaces it.
fn changed_override(answer: String, current: Option<&str>) -> Option<Option<String>> {
    match answer.as_str() {
        "" => None,
        "-" if current.is_some() => Some(None),
        "-" => None,
        value if Some(value) == current => None,
        _ => Some(Some(answer)),
    }
}

fn prompt_updates(model: &Profile) -> Result<ProfileUpdate> {
    println!("{}", "\nCurrent model configuration:".blue());
    println!("{}", format_model_full(model, false));
    println!();

    let name = prompt_input(&format!("New name [{}]: ", model.name))?;
    let token = prompt_password("New token (leave blank to keep current): ")?;
    let base_url = prompt_input(&format!("New base URL [{}]: ", model.base_url))?;
    let description = prompt_input(&format!(
        "New description [{}] ('-' to remove): ",
        model.description.as_deref().unwrap_or("")
    ))?;

    let mut update = ProfileUpdate {
        name: changed(name, &model.name),
        token: changed(token, &model.token),
        base_url: changed(base_url, &model.base_url),
        description: match description.as_str() {
            "" => None,
            "-" => model.description.as_ref().map(|_| String::new()),
            _ => changed(description, model.description.as_deref().unwrap_or("")),
        },
        ..Default::default()
    };

    if confirm("Configure default models for Opus, Sonnet, and Haiku?", false)? {
        let ask = |label: &str, current: Option<&str>| -> Result<Option<Option<String>>> {
            let answer = prompt_input(&format!(
                "Default {label} model [{}] ('-' to remove): ",
                current.unwrap_or("")
            ))?;
            Ok(changed_override(answer, current))
        };
        update.opus_model = ask("Opus", model.opus_model.as_deref())?;
        update.sonnet_model = ask("Sonnet", model.sonnet_model.as_deref())?;
        update.haiku_model = ask("Haiku", model.haiku_model.as_deref())?;
    }
    Ok(update)
}

fn update(registry: &ProfileRegistry, args: UpdateArgs) -> Result<ExitCode> {
    let name = match &args.name {
        Some(name) => name.clone(),
        None => {
            let models = registry.list_models()?;
            if models.is_empty() {
                println!(
                    "{}",
                    "No models configured. Use \"cm add\" to add one.".yellow()
                );
                return Ok(ExitCode::SUCCESS);
            }
            select_model(&models, "Select a model to update:")?
        }
    };

    let Some(model) = registry.get_model(&name)? else {
        return Err(CmError::not_found(name).into());
    };

    let from_flags = args.to_update();
    let update = if from_flags.is_empty() {
        prompt_updates(&model)?
    } else {
        from_flags
    };
    if update.is_empty() {
        println!("{}", "No changes made.".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    let changes = update.describe();
    let updated = registry.update_model(&name, update)?;
    println!("{}", "✓ Model updated successfully!".green());
    println!("{}", format!("  Name: {}", updated.name).dark_grey());
    println!("{}", "\nChanges made:".dark_grey());
    for (field, value) in changes {
        println!("{}", format!("  {field}: {value}").dark_grey());
    }
    println!();
    Ok(ExitCode::SUCCESS)
}

fn history(registry: &ProfileRegistry, limit: usize) -> Result<ExitCode> {
    let log = registry.history().get_history()?;
    if log.is_empty() {
        println!("{}", "No change history available.".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "\nChange History:".blue());
    for change in log.recent(limit) {
        let action = change.action.as_str().to_uppercase();
        let action = match change.action.known() {
            Some(ChangeAction::Add) => action.green(),
            Some(ChangeAction::Remove) => action.red(),
            _ => action.yellow(),
        };
        println!(
            "  {} {} {} {}",
            local_time(change.timestamp).dark_grey(),
            action,
            change.model_name,
            format!("- {}", change.details).dark_grey()
        );
    }
    println!();
    Ok(ExitCode::SUCCESS)
}

fn interactive(registry: &ProfileRegistry) -> Result<ExitCode> {
    match tui::launch_tui(registry)? {
        Some(profile) => launch_profile(&profile, &[]),
        None => {
            println!("{}", "Goodbye!".blue());
            Ok(ExitCode::SUCCESS)
        }
    }
}
