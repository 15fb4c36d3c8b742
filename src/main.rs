use anyhow::{Context, Result};
use chrono::{Local, Timelike};
use clap::{Parser, Subcommand};

use daybrief_core::Config;
use daybrief_dashboard::{
    greeting, Dashboard, DashboardCommand, DashboardSnapshot, SettingsStore, UserSettings,
};
use daybrief_providers::{NewsCategory, NewsItem, Providers};

#[derive(Parser, Debug)]
#[command(name = "daybrief", version, about = "Location, weather and headlines at a glance")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh everything and print the dashboard (default)
    Show,
    /// Manage tech news interests
    Interests {
        #[command(subcommand)]
        action: InterestAction,
    },
    /// Set the display name used in the greeting
    Name { name: String },
    /// Change the colour theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Print stored settings without fetching anything
    Settings,
}

#[derive(Subcommand, Debug)]
enum InterestAction {
    Add { topic: String },
    Remove { topic: String },
}

#[derive(Subcommand, Debug)]
enum ThemeAction {
    Toggle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    daybrief_core::init()?;

    let (config, _) = Config::load_validated()?;
    tracing::debug!("Using config directory {}", config.config_dir.display());

    let providers = Providers::from_config(&config).context("Failed to build HTTP client")?;
    let store = SettingsStore::on_disk(config.settings_dir());
    let dashboard = Dashboard::new(providers, store);

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => {
            dashboard.refresh().await;
            print_dashboard(&dashboard.snapshot());
        }
        Command::Settings => print_settings(&dashboard.settings()),
        Command::Interests { action } => {
            let command = match action {
                InterestAction::Add { topic } => DashboardCommand::AddInterest(topic),
                InterestAction::Remove { topic } => DashboardCommand::RemoveInterest(topic),
            };
            apply(&dashboard, command).await;
        }
        Command::Name { name } => apply(&dashboard, DashboardCommand::SetDisplayName(name)).await,
        Command::Theme {
            action: ThemeAction::Toggle,
        } => apply(&dashboard, DashboardCommand::ToggleTheme).await,
    }

    Ok(())
}

async fn apply(dashboard: &Dashboard, command: DashboardCommand) {
    dashboard.dispatch(command).await;
    let snapshot = dashboard.snapshot();
    print_settings(&snapshot.settings);
    println!();
    print_news(&snapshot);
}

fn print_dashboard(snapshot: &DashboardSnapshot) {
    println!(
        "{}\n",
        greeting(Local::now().hour(), &snapshot.settings.display_name)
    );

    match (&snapshot.location, &snapshot.errors.location) {
        (Some(location), _) => println!("Location: {}", location.display_name()),
        (None, Some(error)) => println!("Location: {}", error),
        (None, None) => println!("Location: unknown"),
    }

    match (&snapshot.weather, &snapshot.errors.weather) {
        (Some(weather), _) => {
            println!(
                "Weather:  {}°C, {} (wind {:.0} km/h)",
                weather.temperature, weather.condition, weather.wind_speed
            );
        }
        (None, Some(error)) => println!("Weather:  {}", error),
        (None, None) => println!("Weather:  unavailable"),
    }
    println!();

    print_news(snapshot);
}

fn print_news(snapshot: &DashboardSnapshot) {
    for category in NewsCategory::ALL {
        let items = snapshot.news.get(category);
        println!("== {} ==", category.title());
        if items.is_empty() {
            println!("  (no stories)");
        }
        for item in items {
            print_item(item);
        }
        println!();
    }
}

fn print_item(item: &NewsItem) {
    match item.published_at {
        Some(at) => println!("  - {} [{}]", item.title, at.format("%Y-%m-%d")),
        None => println!("  - {}", item.title),
    }
    println!("    {}", item.link);
}

fn print_settings(settings: &UserSettings) {
    let name = if settings.display_name.is_empty() {
        "(not set)"
    } else {
        settings.display_name.as_str()
    };
    println!("Name:      {}", name);
    println!("Theme:     {}", settings.theme.as_str());
    println!("Interests: {}", settings.interests.join(", "));

    let suggestions = settings.suggested_topics(5);
    if !suggestions.is_empty() {
        println!("Try:       {}", suggestions.join(", "));
    }
}
