//! Command handlers. Each runs against an already-restored session.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use taskdesk_core::models::{Registration, Role, TodoFilter, TodoRequest, UserFilters, UserRequest};
use taskdesk_core::{ApiError, AppContext, SessionState};

use crate::cli::{RegisterArgs, TodoCommand, UserCommand, UserListArgs};
use crate::format;

pub async fn login(ctx: &mut AppContext, login: Option<String>) -> Result<()> {
    let login = match login.or_else(|| ctx.config.last_login.clone()) {
        Some(login) => login,
        None => prompt("Login: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", login))
        .context("Failed to read password")?;

    match ctx.session.sign_in(&login, &password).await {
        Ok(state) => {
            ctx.config.last_login = Some(login.clone());
            if let Err(e) = ctx.config.save() {
                warn!(error = %e, "Failed to save config");
            }
            match state.profile() {
                Some(profile) => println!("Signed in as {}", profile.username),
                None => println!("Signed in as {} (profile unavailable)", login),
            }
            Ok(())
        }
        Err(ApiError::InvalidCredentials) => bail!("Invalid login or password"),
        Err(e) => Err(e).context("Sign-in failed"),
    }
}

pub async fn register(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    let password = rpassword::prompt_password("Choose a password: ").context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Repeat password: ").context("Failed to read password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let registration = Registration {
        login: args.login.clone(),
        username: args.username,
        password,
        email: args.email,
        phone_number: args.phone,
    };
    ctx.session
        .sign_up(&registration)
        .await
        .context("Registration failed")?;
    println!("Account created. Run `taskdesk login --login {}` to sign in.", args.login);
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    if !ctx.store.is_active() {
        println!("Not signed in");
        return Ok(());
    }
    ctx.session.sign_out().await;
    println!("Signed out");
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.session.state() {
        SessionState::Authenticated(Some(profile)) => println!("{}", format::profile_details(&profile)),
        SessionState::Authenticated(None) => println!("Signed in (profile unavailable)"),
        SessionState::Loading | SessionState::Anonymous => println!("Not signed in"),
    }
    Ok(())
}

pub async fn todos(ctx: &AppContext, command: TodoCommand) -> Result<()> {
    require_session(ctx)?;
    let api = &ctx.api;

    match command {
        TodoCommand::List { filter } => print_todos(ctx, filter.into()).await?,
        TodoCommand::Add { title } => {
            let title = title.trim();
            if title.is_empty() {
                bail!("Task title cannot be empty");
            }
            let todo = api.create_todo(title).await.context("Failed to add task")?;
            println!("Added task {}", todo.id);
        }
        TodoCommand::Done { id } => {
            api.update_todo(id, &TodoRequest::done(true))
                .await
                .context("Failed to update task")?;
            println!("Task {} done", id);
        }
        TodoCommand::Undo { id } => {
            api.update_todo(id, &TodoRequest::done(false))
                .await
                .context("Failed to update task")?;
            println!("Task {} back in progress", id);
        }
        TodoCommand::Rename { id, title } => {
            api.update_todo(id, &TodoRequest::title(title))
                .await
                .context("Failed to rename task")?;
            println!("Task {} renamed", id);
        }
        TodoCommand::Delete { id } => {
            api.delete_todo(id).await.context("Failed to delete task")?;
            println!("Task {} deleted", id);
        }
        TodoCommand::Watch { filter, interval } => {
            let period = interval
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| ctx.config.poll_interval());
            watch_todos(ctx, filter.into(), period).await?;
        }
    }
    Ok(())
}

async fn print_todos(ctx: &AppContext, filter: TodoFilter) -> Result<()> {
    let list = ctx.api.list_todos(filter).await.context("Failed to load tasks")?;
    if list.data.is_empty() {
        println!("No tasks");
    }
    for todo in &list.data {
        println!("{}", format::todo_line(todo));
    }
    if let Some(ref info) = list.info {
        println!("\n{}", format::todo_summary(info));
    }
    Ok(())
}

/// Poll the task list until Ctrl-C, until the session ends, or until a
/// request fails for a reason other than the network or the server.
async fn watch_todos(ctx: &AppContext, filter: TodoFilter, period: std::time::Duration) -> Result<()> {
    let mut session = ctx.projection.subscribe();
    let mut ticker = tokio::time::interval(period);
    info!(period_secs = period.as_secs(), "Watching tasks");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                println!("--- {} ---", chrono::Local::now().format("%H:%M:%S"));
                match print_todos(ctx, filter).await {
                    Ok(()) => {}
                    Err(e) if is_transient(&e) => eprintln!("{:#}", e),
                    Err(e) => return Err(e),
                }
            }
            changed = session.changed() => {
                if changed.is_err() || *session.borrow() == SessionState::Anonymous {
                    bail!("Session ended");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                return Ok(());
            }
        }
    }
}

pub async fn users(ctx: &AppContext, command: UserCommand) -> Result<()> {
    require_session(ctx)?;
    if let Some(profile) = ctx.session.state().profile() {
        if !profile.is_admin() {
            bail!("Account administration requires the ADMIN role");
        }
    }
    let api = &ctx.api;

    match command {
        UserCommand::List(args) => {
            let page = api
                .list_users(&user_filters(args))
                .await
                .context("Failed to load users")?;
            for user in &page.data {
                println!("{}", format::user_line(user));
            }
            println!("\n{} of {} accounts", page.data.len(), page.meta.total_amount);
        }
        UserCommand::Show { id } => {
            let user = api.get_user(id).await.context("Failed to load user")?;
            println!("{}", format::user_details(&user));
        }
        UserCommand::Edit {
            id,
            username,
            email,
            phone,
        } => {
            let update = UserRequest {
                username,
                email,
                phone_number: phone,
            };
            if update.is_empty() {
                bail!("Nothing to change; pass --username, --email or --phone");
            }
            let user = api.update_user(id, &update).await.context("Failed to update user")?;
            println!("{}", format::user_details(&user));
        }
        UserCommand::Roles { id, roles } => {
            let roles = roles
                .iter()
                .map(|r| Role::parse(r).with_context(|| format!("Unknown role: {}", r)))
                .collect::<Result<Vec<_>>>()?;
            let user = api
                .update_user_roles(id, roles)
                .await
                .context("Failed to update roles")?;
            println!("{}", format::user_details(&user));
        }
        UserCommand::Block { id } => {
            api.block_user(id).await.context("Failed to block user")?;
            println!("User {} blocked", id);
        }
        UserCommand::Unblock { id } => {
            api.unblock_user(id).await.context("Failed to unblock user")?;
            println!("User {} unblocked", id);
        }
        UserCommand::Delete { id } => {
            api.delete_user(id).await.context("Failed to delete user")?;
            println!("User {} deleted", id);
        }
    }
    Ok(())
}

fn user_filters(args: UserListArgs) -> UserFilters {
    UserFilters {
        search: args.search,
        sort_by: args.sort_by,
        sort_order: args.sort_order.map(Into::into),
        is_blocked: args.blocked,
        limit: args.limit,
        offset: args.offset,
    }
}

fn require_session(ctx: &AppContext) -> Result<()> {
    if ctx.session.state().is_authenticated() {
        Ok(())
    } else {
        bail!("Not signed in. Run `taskdesk login` first.")
    }
}

/// Network and 5xx failures are worth retrying on the next poll.
fn is_transient(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_network_or_server)
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;

    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("No value entered");
    }
    Ok(value)
}
