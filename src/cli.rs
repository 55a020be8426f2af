// src/cli.rs
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::board::{source_name, JobBoard};
use crate::bridge::{
    AlwaysConsent, AuthState, Consent, ConsentAction, ContentScript, HttpBackground, Popup,
    WindowMessage,
};
use crate::client::{BackendClient, DEFAULT_PAYMENT_AMOUNT};
use crate::config::{AppConfig, ProviderConfig};
use crate::form::{
    resolve_field_name, scrape_form_fields, AutofillData, FieldKind, FormFiller, FormSurface,
};
use crate::page::{load_page, PageDocument};
use crate::store::ExtensionStore;

#[derive(Parser)]
#[command(name = "jobfill")]
#[command(about = "Scrape job postings and auto-fill application forms")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Extension storage file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Answer yes to every consent prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify a page and list its form fields
    Inspect { page: String },
    /// Extract job data from a page and store it
    Scrape { page: String },
    /// Auto-fill the first form of a page
    Fill {
        page: String,
        /// Use autofill data from a JSON file instead of the backend
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Generate one answer per field from a resume, then fill
    Generate {
        page: String,
        /// Resume data as JSON
        #[arg(long)]
        resume: PathBuf,
    },
    /// Send a form's markup to the backend for analysis
    Analyze {
        page: String,
        #[arg(long, default_value_t = 0)]
        form: usize,
    },
    /// Locally stored jobs
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
    /// Web app authentication
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// Save the LLM provider used for scraping
    Provider {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        key: Option<String>,
    },
    /// Profile questions and answers
    Onboarding {
        #[command(subcommand)]
        command: OnboardingCommand,
    },
    /// Resume upload
    Cv {
        #[command(subcommand)]
        command: CvCommand,
    },
    /// Browse scraped jobs on the backend
    Board {
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "tech")]
        technologies: Vec<String>,
        /// Re-scrape all sources first
        #[arg(long)]
        refresh: bool,
    },
    /// Payment flow
    Payment {
        #[command(subcommand)]
        command: PaymentCommand,
    },
    /// Admin-only views
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand)]
pub enum JobsCommand {
    List,
    Clear,
}

#[derive(Subcommand)]
pub enum AuthCommand {
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        payment_intent: Option<String>,
    },
    Logout,
    /// Check the stored token against the backend
    Status,
    /// Consume a raw window message, e.g. {"type":"AUTH_TOKEN_UPDATE","token":"..."}
    SyncToken { message: String },
    /// Print the web app address
    Open,
}

#[derive(Subcommand)]
pub enum OnboardingCommand {
    Get,
    /// Save answers from a JSON file
    Save { file: PathBuf },
    Questions,
}

#[derive(Subcommand)]
pub enum CvCommand {
    Upload { file: PathBuf },
}

#[derive(Subcommand)]
pub enum PaymentCommand {
    Intent {
        #[arg(long, default_value_t = DEFAULT_PAYMENT_AMOUNT)]
        amount: u64,
    },
}

#[derive(Subcommand)]
pub enum AdminCommand {
    Users,
    Stats,
    Onboarding,
}

/// y/n confirmation on stdin
struct StdinConsent;

impl Consent for StdinConsent {
    fn confirm(&self, action: ConsentAction) -> bool {
        eprint!("{} [y/N] ", action.prompt());
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

struct App {
    config: AppConfig,
    store: ExtensionStore,
    client: BackendClient,
    background: Arc<HttpBackground>,
    assume_yes: bool,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let mut config = AppConfig::load(cli.config.as_deref())?;
        if let Some(store) = &cli.store {
            config.store_path = store.clone();
        }
        if let Some(url) = &cli.api_url {
            config.api_base_url = url.clone();
        }
        debug!("Using configuration: {:?}", config);

        let store = ExtensionStore::file(&config.store_path);
        let client = BackendClient::new(&config.api_base_url)?;
        let background = Arc::new(HttpBackground::new(
            client.clone(),
            store.clone(),
            config.endpoints.clone(),
        ));

        Ok(Self {
            config,
            store,
            client,
            background,
            assume_yes: cli.yes,
        })
    }

    fn content_script(&self) -> ContentScript {
        let consent: Box<dyn Consent> = if self.assume_yes {
            Box::new(AlwaysConsent)
        } else {
            Box::new(StdinConsent)
        };
        ContentScript::new(self.background.clone(), self.store.clone())
            .with_consent(consent)
            .with_content_limit(self.config.content_limit)
            .with_highlight_duration(self.config.highlight_duration())
    }

    fn popup(&self) -> Popup {
        Popup::new(self.background.clone(), self.store.clone())
            .with_provider_defaults(self.config.provider.clone())
    }

    async fn authorized_client(&self) -> Result<BackendClient> {
        let token = self
            .store
            .auth_token()
            .await?
            .context("Not logged in. Run `jobfill auth login` first")?;
        Ok(self.client.authorized(&token))
    }

    async fn provider(&self) -> Result<ProviderConfig> {
        self.store.provider_config(&self.config.provider).await
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let app = App::new(&cli)?;

    match cli.command {
        Command::Inspect { page } => inspect(&load_page(&page).await?),

        Command::Scrape { page } => {
            let page = load_page(&page).await?;
            let content = app.content_script();
            show_badge(&content, &page);
            let mut popup = app.popup();
            let response = popup.scrape_current_page(&content, &page).await;
            print_popup_logs(&popup);
            print_json(&response)
        }

        Command::Fill { page, data } => {
            let page = load_page(&page).await?;
            match data {
                Some(path) => {
                    fill_from_file(&page, &path, app.config.highlight_duration()).await
                }
                None => {
                    let content = app.content_script();
                    show_badge(&content, &page);
                    let mut popup = app.popup();
                    let response = popup.auto_fill_current_form(&content, &page).await;
                    print_popup_logs(&popup);
                    print_json(&response)
                }
            }
        }

        Command::Generate { page, resume } => {
            let page = load_page(&page).await?;
            let resume_data = read_json(&resume).await?;
            let provider = app.provider().await?;
            let response = app
                .content_script()
                .generate_and_fill(&page, &resume_data, &provider)
                .await;
            print_json(&response)
        }

        Command::Analyze { page, form } => {
            let page = load_page(&page).await?;
            let forms = page.forms();
            let target = forms
                .get(form)
                .with_context(|| format!("Page has no form #{} ({} forms)", form, forms.len()))?;
            let provider = app.provider().await?;
            let response = app.content_script().analyze_form(target, &provider).await;
            print_json(&response)
        }

        Command::Jobs { command } => {
            let mut popup = app.popup();
            match command {
                JobsCommand::List => {
                    let jobs = popup.stored_jobs().await;
                    if jobs.is_empty() {
                        println!("No jobs stored yet");
                    }
                    for job in jobs {
                        println!(
                            "{} | {} | {} | {}",
                            job.title(),
                            job.company(),
                            job.scraped_at.format("%Y-%m-%d"),
                            job.url
                        );
                    }
                }
                JobsCommand::Clear => popup.clear_stored_jobs().await,
            }
            print_popup_logs(&popup);
            Ok(())
        }

        Command::Auth { command } => handle_auth(&app, command).await,

        Command::Provider { name, key } => {
            app.store
                .set_provider_config(&ProviderConfig {
                    api_provider: name,
                    api_key: key,
                })
                .await?;
            let provider = app.provider().await?;
            println!(
                "Provider: {} (API key {})",
                provider.api_provider.as_deref().unwrap_or("unset"),
                if provider.has_api_key() { "set" } else { "missing" }
            );
            Ok(())
        }

        Command::Onboarding { command } => {
            let client = app.authorized_client().await?;
            match command {
                OnboardingCommand::Get => print_json(&client.get_onboarding().await?),
                OnboardingCommand::Save { file } => {
                    let answers = read_json(&file).await?;
                    println!("{}", client.save_onboarding(&answers).await?);
                    Ok(())
                }
                OnboardingCommand::Questions => print_json(&client.onboarding_questions().await?),
            }
        }

        Command::Cv { command } => match command {
            CvCommand::Upload { file } => {
                let client = app.authorized_client().await?;
                print_json(&client.upload_cv(&file).await?)
            }
        },

        Command::Board {
            search,
            technologies,
            refresh,
        } => {
            let client = app.authorized_client().await?;
            if refresh {
                info!("Refreshing job sources");
                client.refresh_jobs().await?;
            }
            let board = JobBoard::from_sources(client.list_jobs().await?);
            let matches = board.filter(search.as_deref().unwrap_or(""), &technologies);
            println!(
                "{} jobs ({} remote), showing {}",
                board.total(),
                board.remote_count(),
                matches.len()
            );
            for job in matches {
                println!(
                    "{} [{}] {} {}",
                    job.title,
                    if job.is_remote { "Remote" } else { "On-site" },
                    source_name(&job.source),
                    job.link
                );
            }
            Ok(())
        }

        Command::Payment { command } => match command {
            PaymentCommand::Intent { amount } => {
                print_json(&app.client.create_payment_intent(amount).await?)
            }
        },

        Command::Admin { command } => {
            let client = app.authorized_client().await?;
            match command {
                AdminCommand::Users => print_json(&client.admin_users().await?),
                AdminCommand::Stats => print_json(&client.admin_stats().await?),
                AdminCommand::Onboarding => print_json(&client.admin_onboarding_data().await?),
            }
        }
    }
}

async fn handle_auth(app: &App, command: AuthCommand) -> Result<()> {
    let content = app.content_script();
    match command {
        AuthCommand::Login { email, password } => {
            let auth = app.client.login(&email, &password).await?;
            broadcast_token(&content, &auth.access_token).await?;
            println!("✅ Logged in as {}", email);
        }
        AuthCommand::Register {
            email,
            password,
            payment_intent,
        } => {
            let auth = app
                .client
                .register(&email, &password, payment_intent)
                .await?;
            broadcast_token(&content, &auth.access_token).await?;
            println!("✅ Registered {}", email);
        }
        AuthCommand::Logout => {
            let mut popup = app.popup();
            popup.logout().await?;
            print_popup_logs(&popup);
        }
        AuthCommand::Status => {
            let mut popup = app.popup();
            let state = popup.check_auth_status().await;
            print_popup_logs(&popup);
            println!("{}", state.describe());
            if let AuthState::Authenticated(user) = state {
                println!("   {} ({})", user.email, user.role);
            }
        }
        AuthCommand::SyncToken { message } => {
            let value: Value =
                serde_json::from_str(&message).context("Window message is not valid JSON")?;
            if content.on_window_message(&value).await? {
                println!("Auth token synced with extension");
            } else {
                println!("Message ignored");
            }
        }
        AuthCommand::Open => println!("Open {} in your browser to log in", app.config.web_app_url),
    }
    Ok(())
}

/// Hand the token to the extension the way the web app does
async fn broadcast_token(content: &ContentScript, token: &str) -> Result<()> {
    let message = serde_json::to_value(WindowMessage::AuthTokenUpdate {
        token: token.to_string(),
    })?;
    content.on_window_message(&message).await?;
    Ok(())
}

fn inspect(page: &PageDocument) -> Result<()> {
    let forms = page.forms();
    println!("URL:   {}", page.url());
    println!("Title: {}", page.title());
    println!("Kind:  {:?}", page.kind());
    println!("Forms: {}", forms.len());
    print_json(&page.summary())?;
    print_json(&scrape_form_fields(&forms))
}

async fn fill_from_file(page: &PageDocument, path: &Path, highlight: Duration) -> Result<()> {
    let data: AutofillData = serde_json::from_value(read_json(path).await?)
        .context("Autofill data must be a JSON object")?;

    let mut forms = page.forms();
    if forms.is_empty() {
        anyhow::bail!("No forms found on page");
    }
    let mut form = forms.swap_remove(0).with_highlight_duration(highlight);
    let outcome = FormFiller::new().fill(&mut form, &data);
    let highlighted = form.highlighted();

    for (index, control) in form.controls().iter().enumerate() {
        let state = if matches!(control.kind(), FieldKind::Radio | FieldKind::Checkbox) {
            control.checked.to_string()
        } else {
            control.value.clone()
        };
        println!(
            "{:>3}{} {:<10} {:<24} {}",
            index + 1,
            if highlighted.contains(&index) { "*" } else { " " },
            control.kind().as_str(),
            resolve_field_name(control),
            state
        );
    }
    println!("{}", outcome.message());
    let reverted = form.settle_highlights().await;
    debug!("Reverted {} highlights", reverted);
    print_json(&outcome)
}

fn show_badge(content: &ContentScript, page: &PageDocument) {
    if let Some(badge) = content.detect_page(page) {
        eprintln!("{}", badge.text);
    }
}

fn print_popup_logs(popup: &Popup) {
    for entry in popup.logs() {
        eprintln!("{}", entry);
    }
    let status = popup.status();
    debug!("Popup status: {} ({:?})", status.text, status.kind);
}

async fn read_json(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
    println!("{}", rendered);
    Ok(())
}
