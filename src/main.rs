//! woispace - command line client for WOI learning flows

mod cli;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{AuthArgs, Cli, Cmd};
use woispace::{
    api::{ApiClient, ApiError, AuthApi, HttpContentApi, HttpLearningApi},
    cache::create_cache,
    config::Config,
    models::{AnswerType, AuthTokens},
    services::{ContentService, EnrollmentFlow, FlowError, LearningService, Session},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "woispace=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load_with_env(&cli.config)?;
    tracing::debug!(base_url = %config.api.base_url, "configuration loaded");

    let session = Arc::new(session_from_args(&cli.auth));
    let client = Arc::new(ApiClient::new(&config.api, &config.auth, session.clone())?);

    if !session.is_authenticated() {
        let (Some(email), Some(password)) = (&cli.auth.email, &cli.auth.password) else {
            bail!("not signed in: set WOISPACE_TOKEN or WOISPACE_EMAIL and WOISPACE_PASSWORD");
        };
        AuthApi::new(client.clone())
            .login(email, password)
            .await
            .context("Sign-in failed")?;
    }

    let cache = create_cache(&config.cache);
    let learning = Arc::new(LearningService::new(
        Arc::new(HttpLearningApi::new(client.clone())),
        cache.clone(),
    ));
    let content = Arc::new(ContentService::new(Arc::new(HttpContentApi::new(client.clone())), cache));

    let result = run(cli.cmd, &config, learning, content, &session).await;
    if let Some(route) = result.as_ref().err().and_then(login_redirect) {
        eprintln!("Session expired, sign in again ({})", route);
    }
    result
}

/// Login route carried by an authentication failure anywhere in the chain
fn login_redirect(error: &anyhow::Error) -> Option<String> {
    error.chain().find_map(|cause| {
        let api = match cause.downcast_ref::<FlowError>() {
            Some(flow) => flow.api_error(),
            None => cause.downcast_ref::<ApiError>(),
        };
        api.and_then(|e| e.redirect_route()).map(String::from)
    })
}

async fn run(
    cmd: Cmd,
    config: &Config,
    learning: Arc<LearningService>,
    content: Arc<ContentService>,
    session: &Session,
) -> Result<()> {
    let Some(enrollment_id) = cmd.enrollment() else {
        let user_id = session.user_id().context("user id unknown; set WOISPACE_USER_ID")?;
        for enrollment in learning.enrollments_for_user(user_id).await? {
            let state = if enrollment.is_completed() { "completed" } else { "open" };
            println!(
                "{:>6}  template {:<5} section {:<5} started {}  {}",
                enrollment.id, enrollment.template_id, enrollment.section_id, enrollment.started_at, state
            );
        }
        return Ok(());
    };

    let mut flow = EnrollmentFlow::new(learning, content, config);

    // Ctrl-C is only caught while loading
    flow.load_until(enrollment_id, tokio::signal::ctrl_c())
        .await
        .with_context(|| format!("Failed to load enrollment {}", enrollment_id))?;

    match cmd {
        Cmd::Status { .. } => print_status(&flow),
        Cmd::Read { step, .. } => {
            select(&mut flow, step)?;
            flow.load_step_content().await?;
            match flow.paragraph() {
                Some(paragraph) => {
                    println!("# {}\n", paragraph.title().unwrap_or("(untitled)"));
                    println!("{}", paragraph.content().unwrap_or_default());
                }
                None => println!("(no published text)"),
            }
            if let Some(question) = flow.current_step().and_then(|s| s.question_text.as_deref()) {
                println!("\nReflection question: {}", question);
            }
        }
        Cmd::Impression { text, step, .. } => {
            select(&mut flow, step)?;
            save(&mut flow, AnswerType::PictureQuestion, &text).await?;
        }
        Cmd::Reflection { text, step, .. } => {
            select(&mut flow, step)?;
            save(&mut flow, AnswerType::Reflection, &text).await?;
        }
        Cmd::CompleteStep { step, force, .. } => {
            select(&mut flow, step)?;
            if !force && !flow.can_complete_step() {
                bail!("write an impression and a reflection first, or pass --force");
            }
            flow.complete_step().await?;
            print_status(&flow);
        }
        Cmd::Complete { .. } => {
            if !flow.can_complete_flow() {
                bail!("not every step is completed yet");
            }
            let target = flow.complete_flow().await?;
            println!("Enrollment completed, continue at {}", target.route());
        }
        Cmd::Enrollments => {}
    }

    Ok(())
}

fn session_from_args(auth: &AuthArgs) -> Session {
    match &auth.token {
        Some(token) => Session::with_tokens(
            auth.user_id,
            AuthTokens {
                token: token.clone(),
                refresh_token: auth.refresh_token.clone().unwrap_or_default(),
                expires_at: None,
            },
        ),
        None => Session::new(),
    }
}

fn select(flow: &mut EnrollmentFlow, step: Option<usize>) -> Result<()> {
    if let Some(index) = step {
        flow.select_step(index)?;
    }
    Ok(())
}

async fn save(flow: &mut EnrollmentFlow, kind: AnswerType, text: &str) -> Result<()> {
    let saved = match kind {
        AnswerType::PictureQuestion => flow.save_impression(text).await?,
        AnswerType::Reflection => flow.save_reflection(text).await?,
    };
    if !saved {
        bail!("nothing to save: the text is empty");
    }
    print_status(flow);
    Ok(())
}

fn print_status(flow: &EnrollmentFlow) {
    let current = flow.current_index();
    for (index, step) in flow.steps().iter().enumerate() {
        let marker = if Some(index) == current { ">" } else { " " };
        let status = flow.status_of(index).unwrap_or_default();
        let answered = |kind| {
            if flow.answers_for(step.id).iter().any(|a| a.answer_type == kind) {
                "x"
            } else {
                " "
            }
        };
        println!(
            "{} {:>2}. step {:<5} [{}] impression [{}] reflection  {}",
            marker,
            index + 1,
            step.id,
            answered(AnswerType::PictureQuestion),
            answered(AnswerType::Reflection),
            status
        );
    }
    println!(
        "Progress: {}/{} substeps ({:.0}%)",
        flow.completed_substeps(),
        flow.total_substeps(),
        flow.progress_percentage()
    );
}
