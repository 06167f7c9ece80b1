use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use storefront_checkout::{
    CheckoutBackend, CheckoutConfig, CheckoutRedirect, HttpBackend, NavigationStateMachine, Notice,
    PollOutcome, PollState, PollerConfig, ScriptedBackend, ScriptedStatus,
};
use storefront_core::navigation::SESSION_QUERY_PARAM;
use storefront_core::{
    FormField, Module, NavigationState, Package, PackageCatalog, PresentationMode,
};

use crate::cli::{CheckoutArgs, Cli, Commands};

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = CheckoutConfig::from_env().context("Failed to load configuration")?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url.trim_end_matches('/').to_string();
    }
    if let Some(url) = cli.origin_url {
        config.origin_url = url.trim_end_matches('/').to_string();
    }

    match cli.command {
        Commands::Catalog => catalog(&PackageCatalog::standard(), cli.json),
        Commands::Checkout(args) => checkout(&config, &args, cli.json).await,
        Commands::Resume { return_url } => {
            let backend = Arc::new(HttpBackend::from_config(&config)?);
            let mut nav = NavigationStateMachine::new(backend, &config);
            resume(&mut nav, &config, &return_url, cli.json).await
        }
        Commands::Demo => demo(config, cli.json).await,
    }
}

fn catalog(catalog: &PackageCatalog, json: bool) -> Result<()> {
    let packages: Vec<&Package> = catalog.iter().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    for package in packages {
        println!(
            "{} ({}) - {}, {} modules",
            package.name, package.id, package.price, package.module_count
        );
        for feature in &package.features {
            println!("    • {feature}");
        }
    }
    Ok(())
}

async fn checkout(config: &CheckoutConfig, args: &CheckoutArgs, json: bool) -> Result<()> {
    let backend = Arc::new(HttpBackend::from_config(config)?);
    let mut nav = NavigationStateMachine::new(backend, config);

    nav.select_package(&args.package)?;
    fill_form(&mut nav, args)?;

    match nav.submit().await {
        Ok(redirect) => {
            print_redirect(&redirect, json)?;
            Ok(())
        }
        Err(e) => {
            print_notices(&nav.take_notices());
            Err(e.into())
        }
    }
}

fn fill_form(nav: &mut NavigationStateMachine, args: &CheckoutArgs) -> Result<()> {
    for (field, value) in [
        (FormField::Name, &args.name),
        (FormField::Email, &args.email),
        (FormField::Skills, &args.skills),
        (FormField::Passion, &args.passion),
        (FormField::WeeklyTime, &args.weekly_time),
        (FormField::TargetIncome, &args.income),
        (FormField::Experience, &args.experience),
    ] {
        nav.set_field(field, value.as_str())?;
    }
    Ok(())
}

#[derive(Serialize)]
struct ResumeReport<'a> {
    state: NavigationState,
    outcome: Option<PollOutcome>,
    mode: PresentationMode,
    modules: &'a [Module],
    notices: Vec<NoticeReport>,
}

#[derive(Serialize)]
struct NoticeReport {
    #[serde(flatten)]
    notice: Notice,
    message: String,
}

impl From<Notice> for NoticeReport {
    fn from(notice: Notice) -> Self {
        let message = notice.message();
        Self { notice, message }
    }
}

/// Pick up the flow from a return URL: confirm the payment and list the modules
async fn resume(
    nav: &mut NavigationStateMachine,
    config: &CheckoutConfig,
    return_url: &str,
    json: bool,
) -> Result<()> {
    let outcome = match nav.start(return_url) {
        NavigationState::Success => Some(confirm(nav, config.poll).await?),
        NavigationState::Cancel => {
            if !json {
                println!("Payment cancelled. Nothing was charged.");
            }
            nav.acknowledge_cancel()?;
            None
        }
        _ => {
            if !json {
                println!("No payment to resume in {return_url}");
            }
            None
        }
    };

    let notices: Vec<NoticeReport> =
        nav.take_notices().into_iter().map(NoticeReport::from).collect();

    if json {
        let report = ResumeReport {
            state: nav.state(),
            outcome,
            mode: nav.mode(),
            modules: nav.modules(),
            notices,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for notice in &notices {
        println!("⚠ {}", notice.message);
    }
    if let Some(PollOutcome::Cancelled { .. }) = outcome {
        println!("Stopped before the payment was confirmed.");
    }
    if nav.state() == NavigationState::Modules {
        print_modules(nav)?;
    }
    Ok(())
}

/// Confirm the payment; Ctrl-C stops the pending retries
async fn confirm(nav: &mut NavigationStateMachine, poll: PollerConfig) -> Result<PollOutcome> {
    let interrupt = nav.cancellation_handle();
    let on_ctrl_c = tokio::spawn(cancel_on_ctrl_c(interrupt));

    let mut progress = nav.poll_progress();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let state = *progress.borrow_and_update();
            if let PollState::Polling { attempt } = state {
                tracing::info!(attempt, max_attempts = poll.max_attempts, "Checking payment");
            }
        }
    });

    let outcome = nav.confirm_payment().await;
    on_ctrl_c.abort();
    reporter.abort();

    Ok(outcome?)
}

async fn cancel_on_ctrl_c(token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Interrupted, cancelling payment confirmation");
        token.cancel();
    }
}

fn print_modules(nav: &mut NavigationStateMachine) -> Result<()> {
    match nav.mode() {
        PresentationMode::Demo => println!("🎯 Demo modules"),
        PresentationMode::FullTest => println!("🚀 Full trial modules"),
        PresentationMode::Standard => println!("✅ Payment confirmed, your modules:"),
    }

    let ids: Vec<String> = nav.modules().iter().map(|m| m.id.clone()).collect();
    for id in ids {
        let title = nav.open_module(&id)?.title.clone();
        println!("\n## {title}\n");
        for line in nav.viewer().body_lines() {
            println!("  {line}");
        }
        nav.close_module();
    }
    Ok(())
}

fn print_redirect(redirect: &CheckoutRedirect, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(redirect)?);
    } else {
        println!("Continue to payment: {}", redirect.url);
    }
    Ok(())
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("⚠ {notice}");
    }
}

/// Full flow against the scripted backend: the first two status checks are
/// still pending, the third one is paid
async fn demo(mut config: CheckoutConfig, json: bool) -> Result<()> {
    config.poll.interval = Duration::from_millis(300);

    let mut modules = vec![Module::new(
        "demo_info",
        "🎯 Mode Démo",
        "Aperçu gratuit de trois modules.\nLe test complet débloque tout le pack DSA Express.",
    )];
    modules.extend(ScriptedBackend::sample_modules());

    let backend: Arc<dyn CheckoutBackend> = Arc::new(
        ScriptedBackend::new()
            .with_statuses([ScriptedStatus::Pending, ScriptedStatus::Pending, ScriptedStatus::Paid])
            .with_modules(modules),
    );
    let mut nav = NavigationStateMachine::new(backend, &config);

    nav.select_package("starter")?;
    for (name, value) in [
        ("prenom", "Alex"),
        ("email", "alex@example.com"),
        ("competences", "Rédaction, réseaux sociaux"),
        ("passion", "Cuisine végétarienne"),
        ("temps_semaine", "5-10 heures"),
        ("revenu_vise", "1000-3000€"),
        ("niveau_experience", "Débutant"),
    ] {
        nav.set_named(name, value)?;
    }

    let redirect = nav.submit().await?;
    if !json {
        println!("Continue to payment: {}", redirect.url);
    }

    let session_id = redirect
        .session_id
        .context("scripted backend returned no session id")?;
    let return_url = format!("{}/?{SESSION_QUERY_PARAM}={session_id}", config.origin_url);
    resume(&mut nav, &config, &return_url, json).await?;

    if nav.mode().is_demo() {
        let package = nav.begin_full_trial()?;
        if !json {
            println!("\nFull trial available with {} ({})", package.name, package.price);
        }
    }
    Ok(())
}
