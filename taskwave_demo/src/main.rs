use std::error::Error;
use std::sync::Arc;

use taskwave::memory::{MemoryAuth, MemoryStore};
use taskwave::{SignupRequest, TaskDraft, TaskFilter, TaskWave};

const EMAIL: &str = "demo@example.com";
const PASSWORD: &str = "correct horse battery staple";

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let auth = Arc::new(MemoryAuth::new());
    let store = Arc::new(MemoryStore::new());
    let mut app = TaskWave::builder(auth.clone(), store.clone()).build();

    let receipt = app
        .sign_up(SignupRequest::new(EMAIL, PASSWORD, PASSWORD))
        .await?;
    println!("{}", receipt.notice);

    // Stand in for the user clicking the link in that email.
    auth.mark_verified(EMAIL);

    let session = app.sign_in(EMAIL, PASSWORD).await?;
    log::debug!("session established for {}", session.user);
    println!("Signed in as {} ({})", session.email, session.user);
    println!();
    println!("Type a title to add a task, 'done N' to toggle, 'rm N' to delete.");
    println!("An empty line quits.");

    loop {
        let mut input = String::new();
        match std::io::stdin().read_line(&mut input) {
            Ok(_) => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    break;
                }
                if let Err(e) = handle_command(&mut app, trimmed) {
                    println!("error: {e}");
                }
                print_list(&app);
            }
            Err(error) => {
                println!("error: {error}");
            }
        }
    }

    // The authoritative view: whatever the background writes managed to
    // commit, re-keyed under server-assigned ids.
    app.tasks().load().await?;
    println!();
    println!("Store says:");
    print_list(&app);

    app.sign_out().await?;
    Ok(())
}

fn handle_command(app: &mut TaskWave, line: &str) -> Result<(), Box<dyn Error>> {
    if let Some(index) = line.strip_prefix("done ") {
        let id = nth_task_id(app, index.trim().parse()?)?;
        let completed = app.tasks().toggle(&id)?;
        println!("{}", if completed { "completed" } else { "reopened" });
    } else if let Some(index) = line.strip_prefix("rm ") {
        let id = nth_task_id(app, index.trim().parse()?)?;
        app.tasks().delete(&id)?;
    } else {
        app.tasks().create(TaskDraft::new(line))?;
    }
    Ok(())
}

fn nth_task_id(app: &TaskWave, index: usize) -> Result<taskwave::TaskId, Box<dyn Error>> {
    app.tasks_ref()
        .tasks()
        .get(index)
        .map(|t| t.id.clone())
        .ok_or_else(|| format!("no task #{index}").into())
}

fn print_list(app: &TaskWave) {
    let reconciler = app.tasks_ref();
    for (i, task) in reconciler.tasks().iter().enumerate() {
        let mark = if task.completed { "x" } else { " " };
        println!("{i:>3} [{mark}] {} ({})", task.title, task.id);
    }
    println!(
        "    {} pending, {} completed",
        reconciler.filter(TaskFilter::Pending).len(),
        reconciler.completed_count()
    );
}
