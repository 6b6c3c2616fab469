use std::fs::File;
use std::sync::Arc;

use tracing::{error, info, info_span, level_filters::LevelFilter};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use api::{ClashApi, RiotApi};
use commands::{admin_commands::AdminCommands, CommandsContainer};
use config::Config;
use poise::{serenity_prelude as serenity, CreateReply};
use state::JsonStore;

/// Rendering of the announcement message and its interactive controls.
mod announcement;
/// Utilities for interacting with the Riot Clash API.
mod api;
/// The pending/approved gate in front of every newly detected event.
mod approval;
/// All the commands that the bot can run.
mod commands;
/// Environment-derived runtime configuration.
mod config;
/// Component interaction dispatch for signups and approval decisions.
mod event_handler;
/// Per-guild reconciliation and the fetch/gate/broadcast pipeline.
mod reconcile;
/// The per-day role signup state machine.
mod rsvp;
/// The once-daily check trigger.
mod scheduler;
/// The persisted state document and its store.
mod state;
/// Grouping of the fetched schedule into one upcoming event.
mod window;

/// Stores data used by the bot.
///
/// Accessible by all bot commands through Context.
#[derive(Debug, Clone)]
pub struct Data<P> {
    pub store: Arc<JsonStore>,
    pub api: P,
    pub config: Config,
}

impl<P> Data<P>
where
    P: ClashApi,
{
    /// Create a new data struct with a given store and Clash API.
    fn new(store: JsonStore, api: P, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            api,
            config,
        }
    }
}

/// Convenience type for the bot's data with generics filled in.
pub type BotData = Data<RiotApi>;

/// A thread-safe Error type used by the bot.
pub type BotError = anyhow::Error;

/// A context that gives the bot information about the action that invoked it.
///
/// It also includes other useful data such as the state store.
/// You can access the data in commands by using ``ctx.data()``.
pub type BotContext<'a> = poise::Context<'a, BotData, BotError>;

#[tokio::main]
async fn main() {
    if let Err(e) = setup_tracing() {
        panic!("Error trying to setup tracing: {}", e);
    }

    if let Err(e) = run().await {
        panic!("Error trying to run the bot: {}", e);
    }
}

/// The main function that runs the bot.
async fn run() -> Result<(), BotError> {
    let setup_span = info_span!("bot_setup");
    let _guard = setup_span.enter();
    // Load the .env file only in the development environment (bypassed with the --release flag)
    #[cfg(debug_assertions)]
    dotenv::dotenv().ok();

    let discord_token =
        std::env::var("DISCORD_TOKEN").expect("Expected DISCORD_TOKEN as an environment variable");
    info!("Successfully loaded Discord Token");

    let riot_token =
        std::env::var("RIOT_API_KEY").expect("Expected RIOT_API_KEY as an environment variable");
    info!("Successfully loaded Riot API Key");

    let config = Config::from_env()?;
    let store = JsonStore::load(&config.state_file);
    info!("Loaded state from {}", config.state_file.display());

    let riot_api = RiotApi::new(&riot_token, &config.region);
    let data = Data::new(store, riot_api, config);

    let commands = AdminCommands::get_all();
    commands.iter().for_each(|c| info!("Command: {}", c.name));

    let intents = serenity::GatewayIntents::non_privileged();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler::event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    let error_msg = match error {
                        poise::FrameworkError::NotAnOwner { .. }
                        | poise::FrameworkError::GuildOnly { .. }
                        | poise::FrameworkError::DmOnly { .. }
                        | poise::FrameworkError::UnknownCommand { .. } => return,
                        poise::FrameworkError::CommandCheckFailed { ref error, .. } => {
                            match error {
                                Some(error) => format!("{}", error),
                                None => return,
                            }
                        }
                        poise::FrameworkError::Command { ref error, .. } => {
                            error!("Error in command: {:?}", error);
                            "Something went wrong. Please let the bot maintainers know if the issue persists.".to_string()
                        }
                        ref other => {
                            error!("Framework error: {:?}", other);
                            return;
                        }
                    };
                    let ctx = match error.ctx() {
                        Some(ctx) => ctx,
                        None => {
                            error!("No context in this error");
                            return;
                        }
                    };
                    if let Err(e) = ctx
                        .send(CreateReply::default().content(error_msg).ephemeral(true))
                        .await
                    {
                        error!("Error sending error message to user: {}", e);
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Ready as {}", ready.user.name);

                tokio::spawn(scheduler::run_daily_checks(ctx.clone(), data.clone()));

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(discord_token, intents)
        .framework(framework)
        .await?;

    client.start().await?;

    Ok(())
}

/// Sets up the tracing subscriber for the bot.
fn setup_tracing() -> Result<(), BotError> {
    if cfg!(debug_assertions) {
        let filter = EnvFilter::from_default_env()
            .add_directive("none".parse()?)
            .add_directive("clash_bot=info".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::NONE)
            .pretty()
            .init();

        return Ok(());
    }

    let log_file = File::create("debug.log")?;

    // Set up tracing with a filter that only logs errors in production
    tracing_subscriber::fmt::fmt()
        .with_span_events(FmtSpan::NONE)
        .with_max_level(LevelFilter::ERROR)
        .with_writer(log_file)
        .pretty()
        .init();

    Ok(())
}
