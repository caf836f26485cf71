//! ChatFlow
//!
//! Terminal front end: drives one conversation over stdin/stdout

use std::path::Path;
use std::sync::Arc;
use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use ChatFlow::{
    config::Settings,
    flow::UserInput,
    services::TrackerService,
    state::{ConversationController, Reply, StepPrompt},
    utils::logging,
    ChatFlowError, FlowRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard keeps the file writer alive
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", ChatFlow::info());

    let registry = Arc::new(build_registry(&settings).await?);
    info!(tenants = ?registry.tenant_ids(), "Flow registry ready");

    let trackers = TrackerService::from_config(&settings.tracking)?;
    let mut controller = ConversationController::new(registry, trackers.tracker.clone(), &settings);

    let tenant_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| settings.conversation.default_tenant.clone());
    let opened = controller.open(&tenant_id)?;
    let mut handle = opened.handle;
    println!("{}", opened.greeting);
    print_prompt(&opened.prompt);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "/quit" => break,
            "/reset" => {
                let opened = controller.reset(handle)?;
                handle = opened.handle;
                println!("{}", opened.greeting);
                print_prompt(&opened.prompt);
                continue;
            }
            _ => {}
        }

        let input = parse_input(&controller.prompt(handle)?, line);
        match controller.respond(handle, input).await {
            Ok(reply) => print_reply(&reply),
            Err(ChatFlowError::EmptyInput { .. }) => {
                if let Some(message) = controller.re_prompt(handle)? {
                    println!("{}", message);
                }
            }
            Err(ChatFlowError::InvalidTransition { .. }) => {
                println!("Please pick one of the options above.");
            }
            Err(ChatFlowError::FlowExhausted { .. }) => {
                println!("This conversation has finished. Type /reset to start over.");
            }
            Err(e) => {
                error!(error = %e, "Conversation failed");
                return Err(e.into());
            }
        }
    }

    controller.close(handle)?;
    if !trackers.flush(settings.tracking.timeout()).await {
        warn!("Tracking events were still pending at shutdown");
    }

    info!("ChatFlow has been shut down.");
    Ok(())
}

async fn build_registry(settings: &Settings) -> anyhow::Result<FlowRegistry> {
    let mut registry = if settings.flows.include_builtin {
        FlowRegistry::with_builtin_tenants()?
    } else {
        FlowRegistry::new()
    };

    if let Some(dir) = &settings.flows.directory {
        let report = registry
            .load_directory(Path::new(dir))
            .await
            .with_context(|| format!("failed to read flow directory {}", dir))?;
        for failure in &report.failures {
            warn!(source = %failure.source.display(), error = %failure.error, "Skipped flow definition");
        }
    }

    Ok(registry)
}

/// A number picks the matching option; anything else is sent as typed
fn parse_input(prompt: &StepPrompt, line: &str) -> UserInput {
    if let StepPrompt::Options { options } = prompt {
        let picked = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| options.get(index));
        return match picked {
            Some(text) => UserInput::option(text),
            None if options.iter().any(|option| option == line) => UserInput::option(line),
            None => UserInput::text(line),
        };
    }
    UserInput::text(line)
}

fn print_reply(reply: &Reply) {
    println!("{}", reply.message);
    for url in reply.links() {
        println!("🔗 {}", url);
    }
    print_prompt(&reply.prompt);
}

fn print_prompt(prompt: &StepPrompt) {
    match prompt {
        StepPrompt::Options { options } => {
            for (index, option) in options.iter().enumerate() {
                println!("  {}. {}", index + 1, option);
            }
        }
        StepPrompt::Input { placeholder, .. } => println!("  ({})", placeholder),
        StepPrompt::Finished => println!("  (finished, type /reset to start over)"),
    }
}
