//! # taskcraft CLI
//!
//! Command-line interface for running the taskcraft agent against the demo
//! email tools.
//!
//! Usage:
//!   taskcraft <task>
//!   taskcraft run <task>
//!   taskcraft tools
//!   taskcraft prompt
//!   taskcraft mail list [query]
//!   taskcraft mail read <id>
//!
//! Examples:
//!   taskcraft "Send a status update to ops@example.com"
//!   taskcraft "List all emails about the weekly report"
//!   taskcraft mail list weekly
//!
//! Provider selection comes from the environment: TASKCRAFT_PROVIDER
//! ("openai" or "anthropic"), the matching API key, and optionally
//! TASKCRAFT_MODEL / TASKCRAFT_BASE_URL.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskcraft_agent::{AgentConfig, ExecuteOptions, TaskAgent};
use taskcraft_codeact::prompt::PromptBuilder;
use taskcraft_codeact::provider::AnyProvider;
use taskcraft_codeact::tools::ToolProvider;
use taskcraft_mail::{demo_tools, MailStore, DEFAULT_LIST_LIMIT};

#[derive(Parser)]
#[command(name = "taskcraft")]
#[command(author, version, about = "taskcraft - LLM task-execution agent")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Task to execute (when not using subcommands)
    #[arg(trailing_var_arg = true)]
    task: Vec<String>,

    /// Mailbox directory for the demo email tools
    #[arg(short, long, global = true, default_value = ".taskcraft_mail")]
    mail_dir: String,

    /// Enable verbose output (show the state log and raw metrics)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show the final answer
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task
    Run {
        /// The task description
        #[arg(trailing_var_arg = true, required = true)]
        task: Vec<String>,

        /// Maximum number of model rounds
        #[arg(short, long, default_value = "15")]
        recursion_limit: usize,

        /// Newly created variables kept for the next turn
        #[arg(short, long, default_value = "4")]
        keep_vars: usize,
    },
    /// List the bound tools and apps
    Tools,
    /// Print the assembled system prompt
    Prompt,
    /// Inspect the demo mailbox
    Mail {
        #[command(subcommand)]
        command: MailCommands,
    },
}

#[derive(Subcommand)]
enum MailCommands {
    /// List captured messages, newest first
    List {
        /// Optional case-insensitive substring filter
        query: Option<String>,
    },
    /// Show the full record for a message id
    Read { id: String },
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let clipped: String = s.chars().take(max_chars).collect();
        format!("{}…", clipped)
    }
}

fn open_store(mail_dir: &str) -> Arc<MailStore> {
    match MailStore::new(mail_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Failed to open mailbox at {}: {}", mail_dir, e);
            std::process::exit(1);
        }
    }
}

async fn run_task(
    task: &str,
    mail_dir: &str,
    recursion_limit: usize,
    keep_vars: usize,
    verbose: bool,
    quiet: bool,
) {
    let store = open_store(mail_dir);
    let tools = demo_tools(store);

    let model = match AnyProvider::from_env() {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Provider configuration error: {}", e);
            eprintln!("Set TASKCRAFT_PROVIDER (openai|anthropic) and the matching API key.");
            std::process::exit(1);
        }
    };

    let mut agent =
        TaskAgent::new(tools, model).with_config(AgentConfig { verbose: !quiet });

    if let Err(e) = agent.initialize().await {
        eprintln!("Failed to initialize agent: {}", e);
        std::process::exit(1);
    }

    let opts = ExecuteOptions {
        recursion_limit,
        keep_last_n_vars: keep_vars,
        show_progress: !quiet,
        ..Default::default()
    };

    match agent.execute(task, opts).await {
        Ok(outcome) => {
            if quiet {
                println!("{}", outcome.answer);
            }

            if verbose {
                println!("\nState Log:");
                for message in &outcome.state_messages {
                    let rendered =
                        serde_json::to_string_pretty(&message.content).unwrap_or_default();
                    for line in rendered.lines().take(15) {
                        println!("    {}", line);
                    }
                    if rendered.lines().count() > 15 {
                        println!("    ... (truncated)");
                    }
                }
            }

            if outcome.metrics.error.is_some() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn list_tools(mail_dir: &str) {
    let tools = demo_tools(open_store(mail_dir));

    match tools.apps().await {
        Ok(apps) => {
            println!("Apps:");
            for app in apps {
                println!(
                    "  - {} ({}): {}",
                    app.name,
                    app.kind,
                    app.description.as_deref().unwrap_or("(no description)")
                );
            }
        }
        Err(e) => eprintln!("Failed to list apps: {}", e),
    }

    match tools.tools().await {
        Ok(specs) => {
            println!("Tools:");
            for spec in specs {
                println!("  - {}: {}", spec.name, truncate(&spec.description, 80));
            }
        }
        Err(e) => eprintln!("Failed to list tools: {}", e),
    }
}

async fn show_prompt(mail_dir: &str) {
    let tools = demo_tools(open_store(mail_dir));

    let specs = match tools.tools().await {
        Ok(specs) => specs,
        Err(e) => {
            eprintln!("Failed to load tools: {}", e);
            std::process::exit(1);
        }
    };
    let apps = tools.apps().await.unwrap_or_default();

    println!("{}", PromptBuilder::new(&specs, &apps).build());
}

fn list_mail(mail_dir: &str, query: Option<&str>) {
    let store = open_store(mail_dir);

    match store.list(query, DEFAULT_LIST_LIMIT) {
        Ok(messages) => {
            if messages.is_empty() {
                println!("(no messages)");
                return;
            }
            for message in messages {
                println!(
                    "  {}  {}  {} -> {}",
                    message.id,
                    truncate(&message.subject, 40),
                    message.from_addr,
                    message.to.join(", ")
                );
            }
        }
        Err(e) => {
            eprintln!("Failed to list mailbox: {}", e);
            std::process::exit(1);
        }
    }
}

fn read_mail(mail_dir: &str, id: &str) {
    let store = open_store(mail_dir);

    match store.get(id) {
        Ok(message) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&message).unwrap_or_default()
            );
        }
        Err(e) => {
            eprintln!("Failed to read message {}: {}", id, e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Tools) => {
            list_tools(&cli.mail_dir).await;
            return;
        }
        Some(Commands::Prompt) => {
            show_prompt(&cli.mail_dir).await;
            return;
        }
        Some(Commands::Mail { command }) => {
            match command {
                MailCommands::List { query } => list_mail(&cli.mail_dir, query.as_deref()),
                MailCommands::Read { id } => read_mail(&cli.mail_dir, &id),
            }
            return;
        }
        Some(Commands::Run {
            task,
            recursion_limit,
            keep_vars,
        }) => {
            let task_str = task.join(" ");
            run_task(
                &task_str,
                &cli.mail_dir,
                recursion_limit,
                keep_vars,
                cli.verbose,
                cli.quiet,
            )
            .await;
            return;
        }
        None => {
            if cli.task.is_empty() {
                eprintln!("Error: No task provided.");
                eprintln!("Usage: taskcraft [OPTIONS] <TASK>...");
                eprintln!("       taskcraft run <TASK>...");
                eprintln!("       taskcraft tools");
                eprintln!("       taskcraft prompt");
                eprintln!("       taskcraft mail list [QUERY]");
                eprintln!("       taskcraft mail read <ID>");
                eprintln!("\nExamples:");
                eprintln!("  taskcraft \"Send a status update to ops@example.com\"");
                eprintln!("  taskcraft mail list weekly");
                eprintln!("  taskcraft --help");
                std::process::exit(1);
            }
        }
    }

    // Default: run task from positional args
    let task_str = cli.task.join(" ");
    run_task(&task_str, &cli.mail_dir, 15, 4, cli.verbose, cli.quiet).await;
}
