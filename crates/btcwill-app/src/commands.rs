//! CLI commands, one user flow per invocation.

use anyhow::{Context, Result};
use btcwill_api::{ApiClient, TokenStore, WillBackend};
use btcwill_app::{App, ClientConfig, PaymentMethod, SubmitOutcome};
use btcwill_form::{EntryId, FieldRef, Group, WillRecord, Wizard};
use chrono::Utc;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    Login { email: String },
    Register { email: String },
    Logout,
    Wills,
    Submit { file: PathBuf },
    Update { id: u64, file: PathBuf },
    Download { id: u64, dir: PathBuf },
    Delete { id: u64, confirmed: bool },
    Checkout { plan: String, method: PaymentMethod },
    Manage,
    Return { query: String },
}

impl Command {
    /// Parse the positional arguments left after global options
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Status);
        };
        let positional: Vec<&String> = rest.iter().filter(|a| !a.starts_with("--")).collect();
        let arg = |i: usize, what: &str| -> Result<String> {
            positional
                .get(i)
                .map(|s| s.to_string())
                .with_context(|| format!("`{}` requires <{}>", name, what))
        };

        let command = match name.as_str() {
            "status" => Command::Status,
            "login" => Command::Login {
                email: arg(0, "email")?,
            },
            "register" => Command::Register {
                email: arg(0, "email")?,
            },
            "logout" => Command::Logout,
            "wills" | "list" => Command::Wills,
            "submit" => Command::Submit {
                file: PathBuf::from(arg(0, "file")?),
            },
            "update" => Command::Update {
                id: parse_id(&arg(0, "id")?)?,
                file: PathBuf::from(arg(1, "file")?),
            },
            "download" => Command::Download {
                id: parse_id(&arg(0, "id")?)?,
                dir: positional
                    .get(1)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(".")),
            },
            "delete" => Command::Delete {
                id: parse_id(&arg(0, "id")?)?,
                confirmed: rest.iter().any(|a| a == "--yes"),
            },
            "checkout" => Command::Checkout {
                plan: arg(0, "plan")?,
                method: arg(1, "stripe|btcpay")?.parse()?,
            },
            "manage" => Command::Manage,
            "return" => Command::Return {
                query: arg(0, "query")?,
            },
            other => anyhow::bail!("Unknown command: {}", other),
        };
        Ok(command)
    }
}

fn parse_id(s: &str) -> Result<u64> {
    s.parse()
        .with_context(|| format!("Invalid will id: {}", s))
}

/// Run one command against the configured backend
pub async fn run(command: Command, config: &ClientConfig) -> Result<()> {
    let client = ApiClient::new(&config.api.base_url, config.timeout())
        .context("Failed to create HTTP client")?;
    let store = TokenStore::new(&config.storage.data_dir);
    let mut app = App::new(client, store, config.settings());

    if !matches!(command, Command::Login { .. } | Command::Register { .. }) {
        app.startup().await;
    }

    let result = execute(&mut app, command).await;

    if let Some(notice) = app.take_notice() {
        if notice.is_error() {
            eprintln!("{}", notice);
        } else {
            println!("{}", notice);
        }
    }
    result
}

async fn execute<B: WillBackend>(app: &mut App<B>, command: Command) -> Result<()> {
    let needs_login = !matches!(
        command,
        Command::Login { .. } | Command::Register { .. } | Command::Logout | Command::Status
    );
    if needs_login && !app.is_authenticated() {
        anyhow::bail!("Not logged in. Run `btcwill login <email>` first.");
    }

    match command {
        Command::Status => print_status(app),
        Command::Login { email } => {
            let password = read_secret("Password: ")?;
            app.login(&email, &password).await?;
        }
        Command::Register { email } => {
            let password = read_secret("Password: ")?;
            let confirm = read_secret("Confirm password: ")?;
            app.register(&email, &password, &confirm).await?;
        }
        Command::Logout => app.logout(),
        Command::Wills => {
            app.load_dashboard().await?;
            print_wills(app);
        }
        Command::Submit { file } => {
            let record = read_record(&file)?;
            app.open_creator().await?;
            app.wizard_mut().populate(&record);
            drop_blank_entries(app.wizard_mut());
            submit(app).await?;
        }
        Command::Update { id, file } => {
            let record = read_record(&file)?;
            app.edit_will(id).await?;
            app.wizard_mut().populate(&record);
            submit(app).await?;
        }
        Command::Download { id, dir } => {
            let path = app.download_will(id, &dir).await?;
            println!("{}", path.display());
        }
        Command::Delete { id, confirmed } => {
            if !confirmed {
                println!("Re-run with --yes to delete will {}.", id);
            }
            app.delete_will(id, confirmed).await?;
        }
        Command::Checkout { plan, method } => {
            app.select_plan(&plan);
            let url = app.checkout(method).await?;
            println!("{}", url);
        }
        Command::Manage => {
            let url = app.manage_subscription().await?;
            println!("{}", url);
        }
        Command::Return { query } => {
            app.handle_return_params(&query).await;
        }
    }
    Ok(())
}

/// Walk the wizard to its final step and submit
async fn submit<B: WillBackend>(app: &mut App<B>) -> Result<()> {
    let wizard = app.wizard_mut();
    while wizard.current_step() < wizard.total_steps() {
        let step = wizard.current_step();
        if let Err(e) = wizard.next() {
            for field in wizard.invalid_fields() {
                eprintln!("  missing: {}", describe(wizard, field));
            }
            return Err(e).with_context(|| {
                format!("Step {} ({}) is incomplete", step, wizard.layout().step_title(step))
            });
        }
    }

    let summary = app.wizard().review();
    println!(
        "Submitting will for {} ({} wallets, {} exchanges, {} + {} beneficiaries, {} trusted contacts)",
        summary.testator,
        summary.wallets,
        summary.exchanges,
        summary.primary_beneficiaries,
        summary.contingent_beneficiaries,
        summary.trusted_contacts
    );

    match app.submit_will().await? {
        SubmitOutcome::Saved(saved) => {
            if let Some(id) = saved.id {
                println!("Will id: {}", id);
            }
        }
        SubmitOutcome::Pdf(pdf) => {
            let path = PathBuf::from(format!(
                "bitcoin_will_session_{}.pdf",
                Utc::now().date_naive().format("%Y-%m-%d")
            ));
            std::fs::write(&path, pdf)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Remove seeded entries the will file left untouched
fn drop_blank_entries(wizard: &mut Wizard) {
    for group in Group::ALL {
        let blank: Vec<EntryId> = wizard
            .form()
            .section(group)
            .entries()
            .iter()
            .filter(|e| e.fields().is_blank())
            .map(|e| e.id())
            .collect();
        for id in blank {
            if let Err(e) = wizard.remove_entry(id) {
                log::warn!("Could not drop blank {:?} entry: {}", group, e);
            }
        }
    }
}

fn describe(wizard: &Wizard, field: &FieldRef) -> String {
    match field {
        FieldRef::Scalar(name) => name.to_string(),
        FieldRef::Entry {
            group,
            entry,
            field,
        } => {
            let label = wizard
                .form()
                .section(*group)
                .label_of(*entry)
                .unwrap_or_default();
            format!("{} / {}", label, field)
        }
    }
}

fn read_record(path: &Path) -> Result<WillRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    WillRecord::from_json(&text).with_context(|| format!("Invalid will file {}", path.display()))
}

/// `BTCWILL_PASSWORD` if set, else one line from stdin
fn read_secret(label: &str) -> Result<Zeroizing<String>> {
    if let Ok(v) = std::env::var("BTCWILL_PASSWORD") {
        return Ok(Zeroizing::new(v));
    }
    eprint!("{}", label);
    std::io::stderr().flush().ok();

    let mut line = Zeroizing::new(String::new());
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

fn print_status<B: WillBackend>(app: &App<B>) {
    let Some(user) = app.user() else {
        println!("Not logged in.");
        return;
    };
    println!("Logged in as {}", user.email);

    match app.subscription() {
        Some(s) if s.active => {
            let plan = s.plan_name.as_deref().unwrap_or("unknown plan");
            match s.period_end() {
                Some(end) => println!("Subscription: active ({}), renews {}", plan, end.format("%Y-%m-%d")),
                None => println!("Subscription: active ({})", plan),
            }
        }
        Some(_) => println!("Subscription: inactive. Subscribe to create and download wills."),
        None => println!("Subscription: unknown"),
    }
    println!("Wills: {}", app.wills().len());
}

fn print_wills<B: WillBackend>(app: &App<B>) {
    if app.wills().is_empty() {
        println!("No wills created yet. Create your first Bitcoin will!");
        return;
    }
    for will in app.wills() {
        let created = will
            .created_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:>6}  {:<24}  {:<20}  {:<10}  {}",
            will.id, will.title, will.testator_name, will.status, created
        );
    }
}
