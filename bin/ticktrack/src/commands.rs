//! Command handlers.  Everything except `login` and `register` needs a
//! stored session.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, bail};
use ticktrack_api::{
    Api, ApiClient, Task, TaskCreate, TaskPatch, TaskUpdate, User, UserCreate, UserPatch,
    UserUpdate,
};
use ticktrack_core::{
    RECENT_LIMIT, Session, SessionStore, TaskBoard, TaskFilter, TimerService, format_elapsed,
    parse_elapsed,
};
use tracing::{info, warn};

use crate::cli::{Command, ListArgs, LoginArgs, TaskCommand, UserCommand};
use crate::config::Config;

pub struct App {
    config: Config,
    client: Arc<ApiClient>,
    session: Session<ApiClient>,
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Arc::new(
            Api::new()
                .set_base_url(config.api_url.as_str())
                .set_timeout_secs(config.http_timeout_secs)
                .build()?,
        );
        let session = Session::open(
            SessionStore::new(config.session_file.clone()),
            Arc::clone(&client),
        )?;
        Ok(Self {
            config,
            client,
            session,
        })
    }

    pub async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Login(args) => self.login(args).await,
            Command::Logout => self.logout(),
            Command::Whoami => {
                print_user(&self.session.require_user()?);
                Ok(())
            }
            Command::Register {
                name,
                email,
                password,
            } => self.register(name, email, password).await,
            Command::Dashboard => self.dashboard().await,
            Command::Tasks(args) => self.list(args).await,
            Command::Task(cmd) => self.task(cmd).await,
            Command::User(cmd) => self.user(cmd).await,
        }
    }

    async fn login(&self, args: LoginArgs) -> anyhow::Result<()> {
        let user = match (args.email, args.id) {
            (Some(email), _) => self.session.login_by_email(&email).await?,
            (None, Some(id)) => self.session.login_by_id(&id).await?,
            (None, None) => bail!("pass --email or --id"),
        };
        println!("Logged in as {} <{}>", user.name, user.email);
        Ok(())
    }

    fn logout(&self) -> anyhow::Result<()> {
        self.session.logout()?;
        println!("Logged out");
        Ok(())
    }

    async fn register(&self, name: String, email: String, password: String) -> anyhow::Result<()> {
        let user = self
            .client
            .create_user(&UserCreate {
                name,
                email,
                password,
            })
            .await?;
        self.session.set_user(user.clone())?;
        println!("Registered and logged in as {} <{}>", user.name, user.email);
        Ok(())
    }

    /// A board holding the current user's tasks, without background loops.
    async fn board(&self) -> anyhow::Result<TaskBoard<ApiClient>> {
        let user = self.session.require_user()?;
        let timers = Arc::new(TimerService::unscheduled(Arc::clone(&self.client)));
        let board = TaskBoard::new(Arc::clone(&self.client), timers)
            .with_policy(self.config.toggle_policy());
        board.load(&user.id).await?;
        Ok(board)
    }

    async fn dashboard(&self) -> anyhow::Result<()> {
        let board = self.board().await?;
        let stats = board.stats();
        println!("Tasks      {}", stats.total_tasks);
        println!("Total time {}", format_elapsed(stats.total_time as i64));
        println!("Running    {}", stats.running);
        println!("Completed  {}", stats.completed);

        let recent = board.recent(RECENT_LIMIT);
        if !recent.is_empty() {
            println!("\nRecent:");
            for task in &recent {
                print_task_row(task);
            }
        }
        Ok(())
    }

    async fn list(&self, args: ListArgs) -> anyhow::Result<()> {
        let board = self.board().await?;
        let filter = TaskFilter {
            status: args.status,
            completion: args.completion,
            user_id: self.session.current_user_id(),
            sort: args.sort,
        };
        let tasks = board.filtered(&filter);
        if tasks.is_empty() {
            println!("No tasks");
        }
        for task in &tasks {
            print_task_row(task);
        }
        Ok(())
    }

    async fn task(&self, cmd: TaskCommand) -> anyhow::Result<()> {
        let user = self.session.require_user()?;
        match cmd {
            TaskCommand::Add { name, description } => {
                let task = self
                    .client
                    .create_task(&TaskCreate {
                        user_id: user.id,
                        name,
                        description,
                    })
                    .await?;
                println!("Created task {}", task.id);
            }
            TaskCommand::Show { id } => print_task(&self.client.get_task(&id).await?),
            TaskCommand::Edit {
                id,
                name,
                description,
            } => {
                let current = self.client.get_task(&id).await?;
                let mut update = TaskUpdate::from_task(&current);
                if let Some(name) = name {
                    update.name = name;
                }
                if let Some(description) = description {
                    update.description = description;
                }
                print_task(&self.client.update_task(&id, &update).await?);
            }
            TaskCommand::Remove { id } => {
                self.board().await?.remove(&id).await?;
                println!("Deleted task {id}");
            }
            TaskCommand::SetTime { id, time } => {
                let Some(seconds) = parse_elapsed(&time) else {
                    bail!("invalid time {time:?}; use HH:MM:SS, MM:SS or seconds");
                };
                let task = self.client.update_time(&id, seconds).await?;
                println!("{} {}", task.name, format_elapsed(task.elapsed_time as i64));
            }
            TaskCommand::Toggle { id } => {
                let board = self.board().await?;
                let running = board
                    .get(&id)
                    .with_context(|| format!("task {id} does not belong to {}", user.email))?
                    .is_running;
                if !running {
                    // A timer only counts while this process lives.
                    return self.track(&user, &id).await;
                }
                let task = board.toggle(&id).await?;
                board.timers().settle().await;
                println!("Paused {} at {}", task.name, format_elapsed(task.elapsed_time as i64));
            }
            TaskCommand::Complete { id, undo } => {
                let board = self.board().await?;
                board.set_completed(&id, !undo)?;
                let task = self.client.patch_task(&id, &TaskPatch::completed(!undo)).await?;
                board.upsert(task.clone());
                print_task_row(&task);
            }
            TaskCommand::Track { id } => self.track(&user, &id).await?,
        }
        Ok(())
    }

    /// Run the timer with live output, pausing it again on Ctrl-C.
    async fn track(&self, user: &User, task_id: &str) -> anyhow::Result<()> {
        let timers = Arc::new(TimerService::new(
            Arc::clone(&self.client),
            self.config.timer_config(),
        ));
        let board = TaskBoard::new(Arc::clone(&self.client), timers)
            .with_policy(self.config.toggle_policy());
        board.load(&user.id).await?;

        let task = board
            .get(task_id)
            .with_context(|| format!("task {task_id} does not belong to {}", user.email))?;
        if !task.is_running {
            board.toggle(task_id).await?;
        }
        info!(task_id, "tracking in foreground");

        let mut elapsed = board.watch(task_id);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        println!("Tracking {} (Ctrl-C to pause)", task.name);
        loop {
            render_live(&task.name, *elapsed.borrow_and_update());
            tokio::select! {
                changed = elapsed.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                signal = &mut ctrl_c => {
                    if let Err(e) = signal {
                        warn!(error = %e, "failed to listen for Ctrl-C");
                    }
                    break;
                }
            }
        }
        println!();

        let paused = board.toggle(task_id).await;
        board.close().await;
        let task = paused?;
        println!("Paused {} at {}", task.name, format_elapsed(task.elapsed_time as i64));
        Ok(())
    }

    async fn user(&self, cmd: UserCommand) -> anyhow::Result<()> {
        let me = self.session.require_user()?;
        match cmd {
            UserCommand::Show { id } => {
                let id = id.unwrap_or(me.id);
                print_user(&self.client.get_user(&id).await?);
            }
            UserCommand::Find { email } => print_user(&self.client.user_by_email(&email).await?),
            UserCommand::Edit {
                name,
                email,
                password,
            } => {
                let user = match password {
                    Some(password) => {
                        let update = UserUpdate {
                            name: name.unwrap_or(me.name),
                            email: email.unwrap_or(me.email),
                            password: Some(password),
                        };
                        self.client.update_user(&me.id, &update).await?
                    }
                    None => {
                        if name.is_none() && email.is_none() {
                            bail!("nothing to change; pass --name, --email or --password");
                        }
                        self.client.patch_user(&me.id, &UserPatch { name, email }).await?
                    }
                };
                self.session.set_user(user.clone())?;
                print_user(&user);
            }
            UserCommand::Remove { yes } => {
                if !yes {
                    bail!("this deletes {} permanently; pass --yes to confirm", me.email);
                }
                self.client.delete_user(&me.id).await?;
                self.session.logout()?;
                println!("Deleted account {}", me.email);
            }
        }
        Ok(())
    }
}

fn print_user(user: &User) {
    println!("{} <{}> (id {})", user.name, user.email, user.id);
}

fn print_task_row(task: &Task) {
    let state = if task.is_running { "▶" } else { "■" };
    let done = if task.is_completed() { "✓" } else { " " };
    println!(
        "{state} {done} {}  {:<10}  {}",
        format_elapsed(task.elapsed_time as i64),
        task.id,
        task.name
    );
}

fn print_task(task: &Task) {
    println!("{}", task.name);
    println!("  id          {}", task.id);
    println!("  time        {}", format_elapsed(task.elapsed_time as i64));
    println!("  running     {}", task.is_running);
    println!("  completed   {}", task.is_completed());
    if !task.description.is_empty() {
        println!("  description {}", task.description);
    }
}

fn render_live(name: &str, elapsed: u64) {
    let mut out = std::io::stdout().lock();
    // A closed stdout only loses the live line.
    let _ = write!(out, "\r{name}  {}", format_elapsed(elapsed as i64));
    let _ = out.flush();
}
