//! polyclinic - terminal frontend for the polyclinic management backend
//!
//! Patient lookup, derivations between departments and warehouse requests,
//! driven by the same remote-backed selector on every screen.

use std::fs::OpenOptions;

use chrono::NaiveDate;
use clap::Parser;
use colored::Colorize;
use log::{error, info, warn};
use simplelog::{LevelFilter, WriteLogger};

use polyclinic::core::departments::DepartmentNames;
use polyclinic::core::history::{DateRange, PatientHistory};
use polyclinic::core::http::ApiClient;
use polyclinic::core::resource::{KeyedResource, Resource};
use polyclinic::core::session::{self, Permission, PermissionCheck, Session, SessionCache};
use polyclinic::core::warehouse::{pending_for, RequestDraft, Warehouse};
use polyclinic::error::{PolyclinicError, Result};
use polyclinic::selector::{FetchPhase, FnSource, PointerHub, RemoteSelector};
use polyclinic::storage::config;
use polyclinic::storage::credentials::CredentialStore;
use polyclinic::types::{
    AppState, Config, Department, Derivation, Id, Medication, MenuItem, Patient, WarehouseRequest,
};
use polyclinic::ui::format::{derivation_line, format_date, history_line, parse_date, request_lines};
use polyclinic::ui::menu;
use polyclinic::ui::notice::Notices;
use polyclinic::ui::prompt::{self, fetch_with_spinner, PromptExit, Selection};
use polyclinic::utils::paths::{ensure_app_dirs, get_log_path};

/// Terminal frontend for the polyclinic backend
#[derive(Parser, Debug)]
#[command(name = "polyclinic")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Go straight to patient search
    #[arg(short, long)]
    patients: bool,

    /// Go straight to derivations by department
    #[arg(short = 'D', long)]
    derivations: bool,

    /// Go straight to medication stock
    #[arg(short, long)]
    medications: bool,

    /// Go straight to warehouse requests
    #[arg(short, long)]
    warehouse: bool,

    /// Print a patient's history and exit
    #[arg(long, value_name = "PATIENT_ID")]
    history: Option<Id>,

    /// History entries on or after this date (dd/mm/yyyy)
    #[arg(long, value_parser = parse_date_arg, requires = "history")]
    from: Option<NaiveDate>,

    /// History entries on or before this date (dd/mm/yyyy)
    #[arg(long, value_parser = parse_date_arg, requires = "history")]
    to: Option<NaiveDate>,

    /// Ask for credentials even if a token is stored
    #[arg(long)]
    login: bool,

    /// Forget the stored token and exit
    #[arg(long, conflicts_with = "login")]
    logout: bool,

    /// Edit the configuration file
    #[arg(short, long)]
    edit: bool,

    /// Backend URL for this run only
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
}

fn parse_date_arg(input: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(input).ok_or_else(|| format!("invalid date '{}', expected dd/mm/yyyy", input))
}

/// Determine initial state from CLI options
fn determine_initial_state(cli: &Cli, has_token: bool) -> AppState {
    if cli.login || !has_token {
        return AppState::Login;
    }
    if cli.patients {
        return AppState::Patients;
    }
    if cli.derivations {
        return AppState::Derivations;
    }
    if cli.medications {
        return AppState::Medications;
    }
    if cli.warehouse {
        return AppState::Warehouse;
    }
    AppState::Init
}

fn init_logging(cfg: &Config) -> anyhow::Result<()> {
    let level = config::log_level(cfg)?;
    if level == LevelFilter::Off {
        return Ok(());
    }
    let file = OpenOptions::new().create(true).append(true).open(get_log_path())?;
    WriteLogger::init(level, simplelog::Config::default(), file)?;
    Ok(())
}

/// Everything the screens share
struct App {
    client: ApiClient,
    hub: PointerHub,
    notices: Notices,
    session: SessionCache,
}

impl App {
    /// Logged-in user. `Unauthorized` once any call has hit a 401.
    async fn session(&mut self) -> Result<Session> {
        self.session.get(&self.client).await
    }
}

fn department_selector(selection: &Selection<Department>) -> RemoteSelector<Department> {
    RemoteSelector::new("Department", selection.sink())
        .placeholder("Search department")
        .required(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    ensure_app_dirs().await?;

    if cli.edit {
        let cfg = config::load_config().await?;
        config::edit_config(&cfg.editor).await?;
        return Ok(());
    }

    let mut cfg = config::load_config().await?;
    if let Some(url) = &cli.api_url {
        cfg.api_url = url.trim_end_matches('/').to_string();
    }
    init_logging(&cfg)?;
    info!("starting against {}", cfg.api_url);

    let client = ApiClient::from_config(&cfg, CredentialStore::default_location())?;

    if cli.logout {
        session::logout(&client).await?;
        println!("{}", "Logged out.".green());
        return Ok(());
    }

    if let Some(patient_id) = cli.history {
        let range = DateRange::new(cli.from, cli.to)?;
        print_history(&client, patient_id, &range).await?;
        return Ok(());
    }

    let has_token = client.credentials().load().await?.is_some();
    let mut app = App {
        client,
        hub: PointerHub::new(),
        notices: Notices::new(cfg.notice_seconds),
        session: SessionCache::new(),
    };

    let mut state = determine_initial_state(&cli, has_token);

    while state != AppState::Exit {
        app.notices.show();

        let next = match state {
            AppState::Init => main_menu(&mut app).await,
            AppState::Login => login_screen(&mut app).await,
            AppState::Patients => patients_screen(&mut app).await,
            AppState::Derivations => derivations_screen(&mut app).await,
            AppState::Medications => medications_screen(&mut app).await,
            AppState::Warehouse => warehouse_screen(&mut app).await,
            AppState::Exit => break,
        };

        state = match next {
            Ok(next) => next,
            Err(PolyclinicError::Unauthorized) => {
                warn!("session rejected, asking for credentials");
                app.session.forget();
                app.notices.error(&PolyclinicError::Unauthorized);
                AppState::Login
            }
            Err(e) => {
                error!("{:?} failed: {}", state, e);
                app.notices.error(&e);
                // A broken main menu has nowhere to fall back to
                if state == AppState::Init {
                    app.notices.show();
                    AppState::Exit
                } else {
                    AppState::Init
                }
            }
        };
    }

    Ok(())
}

async fn main_menu(app: &mut App) -> Result<AppState> {
    let session = app.session().await?;
    println!("{} {}", "Logged in as".dimmed(), session.user.name.bold());

    let mut items = Vec::new();
    if session.allows(Permission::ViewPatients) {
        items.push(MenuItem { label: "🧑 Patients".into(), value: AppState::Patients });
    }
    if session.allows(Permission::ManageDerivations) {
        items.push(MenuItem { label: "🔀 Derivations".into(), value: AppState::Derivations });
    }
    if session.allows(Permission::ViewStock) {
        items.push(MenuItem { label: "💊 Medication stock".into(), value: AppState::Medications });
    }
    if session.allows(Permission::RequestStock) || session.allows(Permission::ApproveRequests) {
        items.push(MenuItem { label: "📦 Warehouse requests".into(), value: AppState::Warehouse });
    }
    items.push(MenuItem { label: "🔑 Switch user".into(), value: AppState::Login });

    Ok(menu::choose(&items, "Select Action").unwrap_or(AppState::Exit))
}

/// The stored token is only replaced by a successful login
async fn login_screen(app: &mut App) -> Result<AppState> {
    let Some(username) = menu::ask("Username (empty to quit)", true) else {
        return Ok(AppState::Exit);
    };
    if username.trim().is_empty() {
        return Ok(AppState::Exit);
    }
    let Ok(password) = dialoguer::Password::new().with_prompt("Password").interact() else {
        return Ok(AppState::Exit);
    };

    match session::login(&app.client, &username, &password).await {
        Ok(user) => {
            app.session.forget();
            app.notices.success(format!("Welcome, {}", user.name));
            Ok(AppState::Init)
        }
        Err(e) => {
            app.notices.error(&e);
            app.notices.show();
            Ok(if menu::confirm("Try again?") { AppState::Login } else { AppState::Exit })
        }
    }
}

async fn print_history(client: &ApiClient, patient_id: Id, range: &DateRange) -> Result<()> {
    let history = PatientHistory::load(client, patient_id).await?;
    let patient = &history.patient;

    println!();
    println!("{} {}", patient.full_name().bold(), format!("[{}]", patient.identification).dimmed());
    if let Some(born) = patient.birth_date {
        println!("{} {}", "Born".dimmed(), format_date(born));
    }

    let entries = history.within(range);
    if entries.is_empty() {
        println!("{}", "No history in this period.".yellow());
    }
    for entry in entries {
        println!("  {}", history_line(entry));
    }
    println!();
    Ok(())
}

async fn patients_screen(app: &mut App) -> Result<AppState> {
    let patients = Resource::<Patient>::new(app.client.clone());
    // Keyed by the server-side search term; no key lists everyone
    let source: FnSource<_, String> = FnSource::new(move |term: Option<String>| {
        let patients = patients.clone();
        async move {
            match term {
                Some(term) => patients.search_dedup(&["name", "identification"], &term).await,
                None => patients.get_all().await,
            }
        }
    });

    let selection = Selection::new();
    let mut selector: RemoteSelector<Patient, String> = RemoteSelector::new("Patient", selection.sink())
        .placeholder("Filter by name or identification")
        .required(true);
    selector.attach(&app.hub);

    loop {
        let Some(term) = menu::ask("Search patients (empty for all)", true) else {
            break;
        };
        let term = term.trim();
        let key = (!term.is_empty()).then(|| term.to_string());
        let ticket = match selector.set_key(key) {
            Some(ticket) => Some(ticket),
            None if selector.phase() == FetchPhase::Idle => Some(selector.begin()),
            None => None,
        };
        if let Some(ticket) = ticket {
            fetch_with_spinner(&mut selector, ticket, &source).await;
        }

        while prompt::run(&mut selector, &app.hub, &selection) == PromptExit::Chosen {
            let Some(patient) = selection.get() else {
                break;
            };
            print_history(&app.client, patient.id, &DateRange::default()).await?;
        }
        if !menu::confirm("Search again?") {
            break;
        }
    }
    Ok(AppState::Init)
}

async fn derivations_screen(app: &mut App) -> Result<AppState> {
    let departments = Resource::<Department>::new(app.client.clone());
    let department = Selection::new();
    let mut department_selector = department_selector(&department);
    let ticket = department_selector.mount(&app.hub);
    fetch_with_spinner(&mut department_selector, ticket, &departments).await;
    let names = DepartmentNames::new(department_selector.items());

    let incoming = KeyedResource::new(Resource::<Derivation>::new(app.client.clone()), "department-to");
    let derivation = Selection::new();
    let mut derivation_selector: RemoteSelector<Derivation, Id> =
        RemoteSelector::new("Incoming derivation", derivation.sink()).placeholder("Search by date or reason");
    // Nothing to list until a department is picked
    derivation_selector.attach(&app.hub);

    while prompt::run(&mut department_selector, &app.hub, &department) == PromptExit::Chosen {
        let Some(dept) = department.get() else {
            break;
        };
        if let Some(ticket) = derivation_selector.set_key(Some(dept.id)) {
            fetch_with_spinner(&mut derivation_selector, ticket, &incoming).await;
        }

        println!("{} {}", "Derivations into".dimmed(), dept.name.bold());
        for d in derivation_selector.items() {
            println!("  {}", derivation_line(d, &names));
        }

        if prompt::run(&mut derivation_selector, &app.hub, &derivation) == PromptExit::Chosen {
            if let Some(d) = derivation.get() {
                println!("{}", derivation_line(&d, &names).bold());
                println!("  {} {}", "Patient".dimmed(), d.patient_id);
                if !d.reason.is_empty() {
                    println!("  {} {}", "Reason".dimmed(), d.reason);
                }
            }
        }
    }
    Ok(AppState::Init)
}

async fn medications_screen(app: &mut App) -> Result<AppState> {
    let medications = Resource::<Medication>::new(app.client.clone());
    let selection = Selection::new();
    let mut selector = RemoteSelector::new("Medication", selection.sink()).placeholder("Search medication");
    let ticket = selector.mount(&app.hub);
    fetch_with_spinner(&mut selector, ticket, &medications).await;

    while prompt::run(&mut selector, &app.hub, &selection) == PromptExit::Chosen {
        if let Some(m) = selection.get() {
            let stock = if m.stock > 0 { m.stock.to_string().green() } else { "out of stock".red() };
            println!("{} {} {}", m.name.bold(), stock, m.unit.dimmed());
        }
    }
    Ok(AppState::Init)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WarehouseAction {
    NewRequest,
    Review,
}

async fn warehouse_screen(app: &mut App) -> Result<AppState> {
    let session = app.session().await?;

    let mut items = Vec::new();
    if session.allows(Permission::RequestStock) {
        items.push(MenuItem { label: "📝 New request".into(), value: WarehouseAction::NewRequest });
    }
    if session.allows(Permission::ApproveRequests) {
        items.push(MenuItem { label: "✅ Review pending requests".into(), value: WarehouseAction::Review });
    }

    match menu::choose(&items, "Warehouse") {
        Some(WarehouseAction::NewRequest) => new_request(app, &session).await?,
        Some(WarehouseAction::Review) => review_requests(app, &session).await?,
        None => {}
    }
    Ok(AppState::Init)
}

/// The user's own department, or one picked from the list
async fn requesting_department(app: &mut App, session: &Session) -> Option<Id> {
    if let Some(id) = session.user.department_id {
        return Some(id);
    }
    let departments = Resource::<Department>::new(app.client.clone());
    let selection = Selection::new();
    let mut selector = department_selector(&selection);
    let ticket = selector.mount(&app.hub);
    fetch_with_spinner(&mut selector, ticket, &departments).await;
    match prompt::run(&mut selector, &app.hub, &selection) {
        PromptExit::Chosen => selection.get().map(|d| d.id),
        PromptExit::Dismissed => None,
    }
}

async fn new_request(app: &mut App, session: &Session) -> Result<()> {
    let Some(department_id) = requesting_department(app, session).await else {
        return Err(PolyclinicError::NoSelection);
    };
    let mut draft = RequestDraft::for_department(department_id);

    let medications = Resource::<Medication>::new(app.client.clone());
    let selection = Selection::new();
    let mut selector = RemoteSelector::new("Medication", selection.sink())
        .placeholder("Search medication")
        .required(true);
    let ticket = selector.mount(&app.hub);
    fetch_with_spinner(&mut selector, ticket, &medications).await;

    loop {
        if prompt::run(&mut selector, &app.hub, &selection) == PromptExit::Chosen {
            if let Some(m) = selection.get() {
                let answer = menu::ask(&format!("Quantity of {} ({} in stock)", m.name, m.stock), false)
                    .unwrap_or_default();
                match answer.trim().parse::<i64>() {
                    Ok(quantity) => draft.add_line(m.id, quantity),
                    Err(_) => {
                        app.notices.error(&PolyclinicError::validation(format!("'{}' is not a quantity", answer.trim())));
                        app.notices.show();
                    }
                }
            }
        }
        if !menu::confirm("Add another medication?") {
            break;
        }
    }

    draft.validate()?;
    if !menu::confirm(&format!("Submit request with {} line(s)?", draft.lines.len())) {
        return Ok(());
    }
    let request = Warehouse::new(app.client.clone()).submit(&draft).await?;
    app.notices.success(format!("Request #{} submitted ({})", request.id, request.status.label()));
    Ok(())
}

async fn review_requests(app: &mut App, session: &Session) -> Result<()> {
    let warehouse = Warehouse::new(app.client.clone());

    let departments = Resource::<Department>::new(app.client.clone()).get_all().await?;
    let names = DepartmentNames::new(&departments);
    let medications = Resource::<Medication>::new(app.client.clone()).get_all().await?;

    let selection = Selection::new();
    let mut selector: RemoteSelector<WarehouseRequest> = RemoteSelector::new("Pending request", selection.sink());
    if let Some(dept) = session.user.department_id {
        selector = selector.with_post_filter(move |requests| pending_for(requests, dept));
    }
    let ticket = selector.mount(&app.hub);
    fetch_with_spinner(&mut selector, ticket, warehouse.requests()).await;

    while prompt::run(&mut selector, &app.hub, &selection) == PromptExit::Chosen {
        let Some(request) = selection.get() else {
            break;
        };
        for line in request_lines(&request, &names, &medications) {
            println!("{}", line);
        }
        if request.status.is_final() {
            continue;
        }

        let actions = vec![
            MenuItem { label: "Approve".to_string(), value: true },
            MenuItem { label: "Reject".to_string(), value: false },
        ];
        let updated = match menu::choose(&actions, "Decision") {
            Some(true) => warehouse.approve(request.id).await?,
            Some(false) => {
                let reason = menu::ask("Reason", false).unwrap_or_default();
                warehouse.reject(request.id, &reason).await?
            }
            None => continue,
        };
        app.notices.success(format!("Request #{} is now {}", updated.id, updated.status.label()));
        app.notices.show();

        let ticket = selector.begin();
        fetch_with_spinner(&mut selector, ticket, warehouse.requests()).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_without_token_is_login() {
        let cli = Cli::parse_from(["polyclinic", "--patients"]);
        assert_eq!(determine_initial_state(&cli, false), AppState::Login);
        assert_eq!(determine_initial_state(&cli, true), AppState::Patients);
    }

    #[test]
    fn test_history_flags_parse_dates() {
        let cli = Cli::parse_from(["polyclinic", "--history", "7", "--from", "01/02/2024"]);
        assert_eq!(cli.history, Some(7));
        assert_eq!(cli.from, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert!(Cli::try_parse_from(["polyclinic", "--history", "7", "--to", "yesterday"]).is_err());
    }
}
