use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use couplefin::commands;
use couplefin::config::Config;
use couplefin::invite::{MailTransport, NotifyError};
use couplefin::output;
use couplefin::quiz::{load_catalog, QuestionCatalog, Role};
use couplefin::scoring::ScoringRules;
use couplefin::store::{
    load_store, save_store, ContentKind, SessionId, SessionStore, StoreError, StoreState,
};
use couplefin::tui::{self, QuizApp, QuizOutcome, Theme};

const EXIT_SUCCESS: i32 = 0;
const EXIT_STORE: i32 = 1;
const EXIT_MAIL: i32 = 2;
const EXIT_INCOMPLETE: i32 = 3;
const EXIT_CONFIG: i32 = 4;

/// Missing or unusable settings, reported with the config exit code
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct ConfigError(String);

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a config file interactively
    Init,
    /// Manage user profiles
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// Start a new session and print the invite link
    Start,
    /// Join a session as the partner
    Join {
        /// Session id from the invite link
        session: String,
    },
    /// Answer the questionnaire (interactive unless --set is given)
    Answer {
        session: String,
        /// Answer without the TUI, e.g. --set q01=3 (repeatable)
        #[arg(long = "set", value_name = "QUESTION=VALUE")]
        set: Vec<String>,
        /// Submit right after recording the answers
        #[arg(long)]
        submit: bool,
    },
    /// Mark your answers as final
    Submit {
        session: String,
        /// Submit even if some questions are unanswered
        #[arg(long)]
        force: bool,
    },
    /// Show who a session is waiting on
    Status { session: String },
    /// Wait until both sides have submitted, then show the result
    Wait {
        session: String,
        /// Give up after this long, e.g. "5m"
        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,
    },
    /// Show the compatibility report for a completed session
    Result {
        session: String,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// Also list agreement per question
        #[arg(long)]
        breakdown: bool,
    },
    /// Your most recent sessions
    Dashboard {
        /// Number of sessions to show (defaults to `recent_limit`)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Invite your partner to a session
    #[command(group(ArgGroup::new("channel").required(true).args(["email", "whatsapp", "print"])))]
    Invite {
        session: String,
        /// Send an email invitation
        #[arg(long, value_name = "ADDRESS")]
        email: Option<String>,
        /// Open a WhatsApp share link
        #[arg(long)]
        whatsapp: bool,
        /// Just print the invite link
        #[arg(long)]
        print: bool,
    },
    /// Send a test message through the configured mail transport
    TestMail,
    /// Premium content
    Premium {
        #[command(subcommand)]
        action: PremiumCommand,
    },
    /// Print the question catalog
    Questions,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register a new user
    Register { email: String },
    /// Show the current user's profile
    Show,
    /// Upgrade a user to premium
    Upgrade { email: Option<String> },
}

#[derive(Subcommand, Debug)]
enum PremiumCommand {
    /// List premium content (premium members only)
    List,
    /// Add a premium content item
    Add {
        title: String,
        /// pdf, ai, template or ebook
        #[arg(long, value_parser = ContentKind::from_str)]
        kind: ContentKind,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        url: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Format {
    Table,
    Tsv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "couplefin")]
#[command(about = "Financial compatibility quiz for couples", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/couplefin/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the store (overrides `data_dir`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Act as this user (overrides `user`)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Everything a command needs, loaded once in `main`
struct App {
    config: Config,
    catalog: QuestionCatalog,
    rules: ScoringRules,
    store: StoreState,
    store_path: PathBuf,
    user_flag: Option<String>,
    use_colors: bool,
    /// Set by commands that change the store
    dirty: bool,
}

impl App {
    fn user(&self) -> anyhow::Result<String> {
        commands::resolve_user(self.user_flag.as_deref(), self.config.user.as_deref())
            .map_err(|e| ConfigError(format!("{:#}", e)).into())
    }

    fn session_id(&self, input: &str) -> anyhow::Result<SessionId> {
        let user = self.user()?;
        commands::resolve_session(&self.store, &user, input)
    }

    fn data_dir(&self) -> &Path {
        self.store_path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn transport(&self) -> MailTransport {
        MailTransport::from_config(self.config.mail.as_ref(), self.data_dir())
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+); an earlier
    // install is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    couplefin::logging::init_logging(cli.verbose);

    if let Commands::Init = cli.command {
        if let Err(e) = couplefin::config::init::run_init_wizard(cli.config) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let config = match couplefin::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate at startup, listing every problem
    if let Err(errors) = config.validate() {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let catalog = match load_catalog(config.questions.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Question catalog error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let store_path = config.store_path(cli.data_dir.as_deref());
    let store = match load_store(&store_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load store at {}: {}", store_path.display(), e);
            std::process::exit(EXIT_STORE);
        }
    };

    tracing::debug!(
        config = ?cli.config,
        store = %store_path.display(),
        questions = catalog.len(),
        "starting"
    );

    let rules = config.effective_scoring().rules();
    let mut app = App {
        config,
        catalog,
        rules,
        store,
        store_path,
        user_flag: cli.user,
        use_colors: output::should_use_colors(),
        dirty: false,
    };

    let result = run(cli.command, &mut app).await;

    // Save even when the command failed part-way (e.g. an invite recorded as failed)
    if app.dirty {
        if let Err(e) = save_store(&app.store_path, &app.store) {
            eprintln!("Failed to save store at {}: {}", app.store_path.display(), e);
            std::process::exit(EXIT_STORE);
        }
    }

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(store_error) = error.downcast_ref::<StoreError>() {
        match store_error {
            StoreError::Incomplete { .. } => EXIT_INCOMPLETE,
            _ => EXIT_STORE,
        }
    } else if error.downcast_ref::<NotifyError>().is_some() {
        EXIT_MAIL
    } else if error.downcast_ref::<ConfigError>().is_some() {
        EXIT_CONFIG
    } else {
        EXIT_STORE
    }
}

async fn run(command: Commands, app: &mut App) -> anyhow::Result<()> {
    match command {
        Commands::Init => unreachable!("handled before config is loaded"),

        Commands::User { action } => match action {
            UserCommand::Register { email } => {
                let profile = commands::register_user(&mut app.store, &email)?;
                app.dirty = true;
                println!("Registered {}", profile.email);
            }
            UserCommand::Show => {
                let profile = app.store.user(&app.user()?)?;
                println!("{}", profile.email);
                println!("  Member since: {}", profile.created_at.format("%Y-%m-%d"));
                println!(
                    "  Membership:   {}",
                    if profile.is_premium { "premium" } else { "free" }
                );
            }
            UserCommand::Upgrade { email } => {
                let email = match email {
                    Some(email) => email,
                    None => app.user()?,
                };
                let profile = commands::upgrade_user(&mut app.store, &email)?;
                app.dirty = true;
                println!("{} is now a premium member", profile.email);
            }
        },

        Commands::Start => {
            let user = app.user()?;
            let (session, link) =
                commands::start_session(&mut app.store, &user, &app.config.base_url)?;
            app.dirty = true;
            println!("Started session {}", session.id);
            println!("Invite link: {}", link);
        }

        Commands::Join { session } => {
            let user = app.user()?;
            let id = app.session_id(&session)?;
            let session = commands::join_session(&mut app.store, id, &user)?;
            app.dirty = true;
            println!("Joined session {} started by {}", session.id, session.owner);
        }

        Commands::Answer {
            session,
            set,
            submit,
        } => {
            let id = app.session_id(&session)?;
            if set.is_empty() {
                answer_interactively(app, id).await?;
            } else {
                let user = app.user()?;
                let assignments = set
                    .iter()
                    .map(|s| commands::parse_assignment(s))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                let count = commands::apply_answers(
                    &mut app.store,
                    &app.catalog,
                    app.rules.scale,
                    id,
                    &user,
                    &assignments,
                )?;
                app.dirty = true;
                println!("Recorded {} answers", count);

                if submit {
                    let status =
                        commands::submit_answers(&mut app.store, &app.catalog, id, &user, false)?;
                    println!("Answers submitted. Session is {}.", status);
                }
            }
        }

        Commands::Submit { session, force } => {
            let user = app.user()?;
            let id = app.session_id(&session)?;
            let status = commands::submit_answers(&mut app.store, &app.catalog, id, &user, force)?;
            app.dirty = true;
            println!("Answers submitted. Session is {}.", status);
        }

        Commands::Status { session } => {
            let id = app.session_id(&session)?;
            let session = app.store.session(id)?;
            println!("{}", output::format_session_status(&session, app.catalog.len()));
        }

        Commands::Wait { session, timeout } => {
            let id = app.session_id(&session)?;
            let interval = app.config.poll_interval()?;
            let store_path = app.store_path.clone();

            eprintln!("Waiting for session {} to complete...", id);
            // Re-read the store each time: the partner writes it from another process
            commands::wait_for_completion(
                || load_store(&store_path).and_then(|store| store.session(id)),
                interval,
                timeout,
            )
            .await?;

            app.store = load_store(&app.store_path)?;
            print_report(app, id, Format::Table, false)?;
        }

        Commands::Result {
            session,
            format,
            breakdown,
        } => {
            let id = app.session_id(&session)?;
            print_report(app, id, format, breakdown)?;
        }

        Commands::Dashboard { limit } => {
            let user = app.user()?;
            let limit = limit.unwrap_or(app.config.recent_limit);
            let rows = commands::dashboard(&app.store, &app.catalog, &app.rules, &user, limit);
            println!(
                "{}",
                output::format_session_table(&rows, Utc::now(), app.use_colors)
            );
        }

        Commands::Invite {
            session,
            email,
            whatsapp,
            print,
        } => {
            let id = app.session_id(&session)?;
            if let Some(recipient) = email {
                let sender = app.user()?;
                let transport = app.transport();
                // The invite is recorded before delivery, whatever the outcome
                app.dirty = true;
                let (invite, delivery) = commands::send_invite(
                    &mut app.store,
                    &transport,
                    id,
                    &sender,
                    &recipient,
                    &app.config.base_url,
                )
                .await?;
                println!(
                    "Invitation sent to {} via {}",
                    invite.recipient_email,
                    transport.describe()
                );
                if let Some(message_id) = delivery.message_id {
                    println!("  Message id: {}", message_id);
                }
            } else if whatsapp {
                let url = commands::whatsapp_invite(&app.config.base_url, id)?;
                println!("{}", url);
                if let Err(e) = couplefin::browser::open_url(&url) {
                    couplefin::stderr_buffer::warn(format!(
                        "Could not open a browser ({:#}). Open the link above instead.",
                        e
                    ));
                }
            } else if print {
                let link = couplefin::invite::invite_link(&app.config.base_url, id)?;
                println!("{}", link);
            }
        }

        Commands::TestMail => {
            let to = match app.config.mail.as_ref().and_then(|m| m.from.clone()) {
                Some(from) => from,
                None => app.user()?,
            };
            let transport = app.transport();
            let delivery = commands::send_test_mail(&transport, &to).await?;
            println!("Test message sent to {} via {}", to, transport.describe());
            if let Some(message_id) = delivery.message_id {
                println!("  Message id: {}", message_id);
            }
        }

        Commands::Premium { action } => match action {
            PremiumCommand::List => {
                let user = app.user()?;
                let items = commands::premium_content_for(&app.store, &user)?;
                println!("{}", output::format_premium_list(&items, app.use_colors));
            }
            PremiumCommand::Add {
                title,
                kind,
                description,
                url,
            } => {
                let content = commands::add_premium_content(
                    &mut app.store,
                    &title,
                    &description,
                    kind,
                    &url,
                )?;
                app.dirty = true;
                println!("Added {} \"{}\"", content.kind.label(), content.title);
            }
        },

        Commands::Questions => {
            println!(
                "{}",
                output::format_catalog(&app.catalog, app.rules.scale, app.use_colors)
            );
        }
    }

    Ok(())
}

fn print_report(app: &App, id: SessionId, format: Format, breakdown: bool) -> anyhow::Result<()> {
    let report = commands::session_report(&app.store, &app.catalog, &app.rules, id)?;
    match format {
        Format::Table => {
            println!("{}", output::format_report(&report, app.use_colors));
            if breakdown && !report.breakdown.is_empty() {
                println!();
                println!(
                    "{}",
                    output::format_breakdown(&report, &app.catalog, app.use_colors)
                );
            }
        }
        Format::Tsv => println!("{}", output::format_report_tsv(&report)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// Run the questionnaire TUI for the current user's side of a session
async fn answer_interactively(app: &mut App, id: SessionId) -> anyhow::Result<()> {
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        anyhow::bail!("No terminal for the questionnaire. Use --set QUESTION=VALUE instead.");
    }

    let user = app.user()?;
    let (session, role) = commands::role_in_session(&app.store, id, &user)?;
    if session.is_submitted(role) {
        return Err(StoreError::AlreadySubmitted { role }.into());
    }

    let short_id: String = id.to_string().chars().take(8).collect();
    let title = match role {
        Role::Owner => format!("session {}", short_id),
        Role::Partner => format!("session {} with {}", short_id, session.owner),
    };
    let quiz = QuizApp::new(
        title,
        &app.catalog,
        app.rules.scale,
        session.answers_for(role).clone(),
        tui::resolve_theme(Theme::Auto),
    );

    let (answers, submit) = match tui::run_quiz(quiz).await? {
        QuizOutcome::Aborted => {
            println!("Nothing saved.");
            return Ok(());
        }
        QuizOutcome::Saved(answers) => (answers, false),
        QuizOutcome::Submitted(answers) => (answers, true),
    };

    let assignments: Vec<(String, i32)> = answers
        .iter()
        .filter(|(question_id, _)| app.catalog.get(question_id).is_some())
        .map(|(question_id, value)| (question_id.to_string(), value))
        .collect();
    let count = commands::apply_answers(
        &mut app.store,
        &app.catalog,
        app.rules.scale,
        id,
        &user,
        &assignments,
    )?;
    app.dirty = true;
    println!("Saved {} answers", count);

    if submit {
        let status = commands::submit_answers(&mut app.store, &app.catalog, id, &user, false)?;
        println!("Answers submitted. Session is {}.", status);
    }
    Ok(())
}
