// Namaa - local faith and productivity tracker
// Entry point and command dispatch

mod cli;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands, PrayerCommand, QuranCommand, ReminderCommand, TaskCommand};
use directories::ProjectDirs;
use namaa::app::{setup, AppState};
use namaa::database::{
    NewQuote, NewQuranGoal, NewReminder, NewTask, Prayer, PrayerUpdate, User,
};
use namaa::services::{FocusTimer, Phase, TimerDriver, TimerEvent};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "namaa=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    tracing::info!("Starting Namaa");
    let state = setup(&data_dir).await?;

    run(&state, cli.command).await
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "namaa", "namaa")
        .context("Could not determine a data directory; pass --data-dir")?;
    Ok(dirs.data_dir().to_path_buf())
}

async fn signed_in(state: &AppState) -> Result<User> {
    state
        .auth
        .current_user()
        .await?
        .context("Not logged in. Run `namaa login` or `namaa signup` first")
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Signup {
            username,
            name,
            password,
        } => match state.auth.signup(&username, &password, &name).await? {
            Some(user) => println!("Welcome, {}!", user.name),
            None => bail!("Username '{}' is already taken", username),
        },

        Commands::Login { username, password } => {
            match state.auth.login(&username, &password).await? {
                Some(user) => println!("Signed in as {}", user.name),
                None => bail!("Invalid username or password"),
            }
        }

        Commands::Logout => {
            state.auth.logout().await?;
            println!("Signed out");
        }

        Commands::Whoami => match state.auth.current_user().await? {
            Some(user) => println!("{} ({})", user.name, user.username),
            None => println!("Not logged in"),
        },

        Commands::Task(command) => run_task(state, command).await?,
        Commands::Prayer(command) => run_prayer(state, command).await?,
        Commands::Quran(command) => run_quran(state, command).await?,
        Commands::Reminder(command) => run_reminder(state, command).await?,

        Commands::Quote { category, add } => {
            if let Some(text) = add {
                let quote = state.quotes.add(NewQuote::custom(text)).await?;
                println!("Added quote {}", quote.id);
            } else if let Some(quote) = state.quotes.random(category.map(Into::into)).await? {
                match quote.author {
                    Some(author) => println!("\"{}\"\n  - {}", quote.text, author),
                    None => println!("\"{}\"", quote.text),
                }
            } else {
                println!("No quotes in that category");
            }
        }

        Commands::Progress { date } => {
            let user = signed_in(state).await?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let settings = state.settings.get(&user.id).await?;
            let today = state.progress.daily_progress(&user.id, date).await?;
            let week = state.progress.weekly_summary(&user.id, date).await?;

            if !settings.daily_intention.is_empty() {
                println!("Intention: {}", settings.daily_intention);
            }
            println!("Progress for {}", date);
            println!("  Tasks    {:>5.0}%", today.tasks);
            println!("  Prayers  {:>5.0}%", today.prayers);
            println!("  Quran    {:>5.0}%", today.quran);
            println!("  Lessons  {:>5.0}%", today.lessons);
            println!("Week of {}", week.week_start);
            for day in &week.days {
                println!(
                    "  {}  tasks {}/{}  prayers {}/5{}",
                    day.date.format("%a %d"),
                    day.tasks_completed,
                    day.tasks_total,
                    day.prayers_completed,
                    if day.has_lesson { "  lesson" } else { "" }
                );
            }
        }

        Commands::Export { dir } => {
            let user = signed_in(state).await?;
            let dir = dir.unwrap_or_else(|| state.backups_dir());
            let path = state.backup.export_to_file(&user.id, &dir).await?;
            println!("Backup written to {}", path.display());
        }

        Commands::Import { path } => {
            let user = signed_in(state).await?;
            let imported = state.backup.import_from_file(&user.id, &path).await?;
            let names: Vec<_> = imported.iter().map(|c| c.name()).collect();
            println!("Imported: {}", names.join(", "));
        }

        Commands::Reset { yes } => {
            let user = signed_in(state).await?;
            if !yes {
                bail!("This deletes all of your data. Re-run with --yes to confirm");
            }
            state.backup.reset_all(&user.id).await?;
            println!("All data for {} deleted", user.username);
        }

        Commands::Focus {
            focus_minutes,
            break_minutes,
            cycles,
        } => run_focus(state, focus_minutes, break_minutes, cycles).await?,
    }

    Ok(())
}

async fn run_task(state: &AppState, command: TaskCommand) -> Result<()> {
    let user = signed_in(state).await?;

    match command {
        TaskCommand::Add {
            title,
            priority,
            due,
        } => {
            let task = state
                .tasks
                .add(
                    &user.id,
                    NewTask {
                        title,
                        completed: false,
                        priority,
                        due_date: due,
                    },
                )
                .await?;
            println!("Added task {}", task.id);
        }

        TaskCommand::List { filter } => {
            let today = Local::now().date_naive();
            let tasks = state
                .tasks
                .list_filtered(&user.id, filter.into(), today)
                .await?;
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in tasks {
                println!(
                    "[{}] {}  {:?}{}  {}",
                    if task.completed { "x" } else { " " },
                    task.title,
                    task.priority,
                    task.due_date
                        .map(|d| format!(" due {}", d))
                        .unwrap_or_default(),
                    task.id
                );
            }
        }

        TaskCommand::Done { id } => {
            if !state.tasks.toggle(&user.id, &id).await? {
                bail!("No task with id {}", id);
            }
        }

        TaskCommand::Delete { id } => {
            if !state.tasks.delete(&user.id, &id).await? {
                bail!("No task with id {}", id);
            }
        }
    }

    Ok(())
}

async fn run_prayer(state: &AppState, command: PrayerCommand) -> Result<()> {
    let user = signed_in(state).await?;
    let today = Local::now().date_naive();

    let day = match command {
        PrayerCommand::Mark { prayer, date, undo } => {
            state
                .prayers
                .update(
                    &user.id,
                    date.unwrap_or(today),
                    PrayerUpdate::mark(prayer, !undo),
                )
                .await?
        }
        PrayerCommand::Show { date } => state.prayers.get(&user.id, date.unwrap_or(today)).await?,
    };

    println!("Prayers on {}", day.date);
    for prayer in Prayer::ALL {
        println!(
            "  [{}] {:?}",
            if day.is_prayed(prayer) { "x" } else { " " },
            prayer
        );
    }
    println!("  {}/5 completed", day.completed_count());
    Ok(())
}

async fn run_quran(state: &AppState, command: QuranCommand) -> Result<()> {
    let user = signed_in(state).await?;

    let goal = match command {
        QuranCommand::Goal {
            goal_type,
            quantity,
        } => Some(
            state
                .quran
                .save(&user.id, NewQuranGoal { goal_type, quantity })
                .await?,
        ),
        QuranCommand::Toggle { unit } => {
            if unit == 0 {
                bail!("Units are numbered from 1");
            }
            state.quran.toggle_progress(&user.id, unit - 1).await?
        }
        QuranCommand::Show => state.quran.get(&user.id).await?,
        QuranCommand::Clear => {
            state.quran.remove(&user.id).await?;
            None
        }
    };

    match goal {
        Some(goal) => println!(
            "{} x {:?}: {}/{} done ({:.0}%)",
            goal.quantity,
            goal.goal_type,
            goal.progress.len(),
            goal.quantity,
            goal.completion_percent()
        ),
        None => println!("No Quran goal set"),
    }
    Ok(())
}

async fn run_reminder(state: &AppState, command: ReminderCommand) -> Result<()> {
    let user = signed_in(state).await?;

    match command {
        ReminderCommand::Add {
            title,
            time,
            repeat,
            kind,
        } => {
            let reminder = state
                .reminders
                .add(
                    &user.id,
                    NewReminder {
                        title,
                        time,
                        repeat: repeat.into(),
                        kind: kind.into(),
                        enabled: true,
                    },
                )
                .await?;
            println!("Added reminder {}", reminder.id);
        }

        ReminderCommand::List => {
            for r in state.reminders.list(&user.id).await? {
                println!(
                    "{} {}  {:?}/{:?}{}  {}",
                    r.time.format("%H:%M"),
                    r.title,
                    r.repeat,
                    r.kind,
                    if r.enabled { "" } else { " (off)" },
                    r.id
                );
            }
        }

        ReminderCommand::Delete { id } => {
            if !state.reminders.delete(&user.id, &id).await? {
                bail!("No reminder with id {}", id);
            }
        }

        ReminderCommand::Watch => {
            let (tx, mut rx) = mpsc::channel(16);
            let handle = state
                .reminders
                .clone()
                .start_scheduler(state.auth.clone(), tx);
            println!("Watching reminders, press Ctrl-C to stop");

            loop {
                tokio::select! {
                    fired = rx.recv() => match fired {
                        Some(event) => println!(
                            "{}  {}",
                            event.fired_at.format("%H:%M"),
                            event.reminder.title
                        ),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            handle.abort();
        }
    }

    Ok(())
}

async fn run_focus(
    state: &AppState,
    focus_minutes: u32,
    break_minutes: u32,
    cycles: u32,
) -> Result<()> {
    let timer = FocusTimer::with_durations(focus_minutes, break_minutes)?;
    let mut driver = TimerDriver::new(timer).with_log(state.focus_log.clone());
    let (tx, mut rx) = mpsc::channel(4);

    for cycle in 1..=cycles {
        for phase in [Phase::Focus, Phase::Break] {
            if phase == Phase::Break && cycle == cycles {
                break;
            }
            let minutes = match phase {
                Phase::Focus => focus_minutes,
                Phase::Break => break_minutes,
            };
            println!("{:?} for {} minutes", phase, minutes);

            driver.start(tx.clone()).await;
            tokio::select! {
                event = rx.recv() => {
                    if let Some(TimerEvent::PhaseCompleted { completed, .. }) = event {
                        println!("\x07{:?} complete", completed);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    driver.pause().await;
                    println!("Stopped");
                    return Ok(());
                }
            }
        }
    }

    println!(
        "Sessions today: {}, total focus time: {} minutes",
        state.focus_log.today_count().await?,
        state.focus_log.total_minutes().await?
    );
    Ok(())
}
