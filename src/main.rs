use std::path::PathBuf;

use clap::Parser;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use sightline::app::{Action, App};
use sightline::{ModelManager, ModelSpec};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Endpoint of the hosted annotateImage callable function
    #[arg(
        long,
        default_value = "https://us-central1-sightline-demo.cloudfunctions.net/annotateImage"
    )]
    endpoint: String,

    /// Directory for downloaded model files (defaults to the platform cache)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let manager = match &args.cache_dir {
        Some(dir) => ModelManager::new(dir)?,
        None => ModelManager::new_default()?,
    };
    let spec = ModelSpec::sentiment();

    if args.fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove(&spec.name)?;
    }

    let (mut app, mut events) = App::new(manager, spec, &args.endpoint);

    println!("sightline - sentiment analysis and landmark recognition");
    for line in app.help() {
        println!("{}", line);
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut input = stdin.lines();

    loop {
        print_prompt(&app);

        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    break; // stdin closed
                };
                match app.handle_command(&line) {
                    Ok(Action::Continue(lines)) => {
                        for line in lines {
                            println!("{}", line);
                        }
                    }
                    Ok(Action::Quit) => break,
                    Err(e) => println!("Error: {}", e),
                }
            }
            event = events.recv() => {
                // The sender lives in `app`, so recv() cannot return None here
                if let Some(event) = event {
                    for line in app.handle_event(event) {
                        println!("{}", line);
                    }
                }
            }
        }
    }

    info!("Exiting");
    Ok(())
}

fn print_prompt(app: &App) {
    use std::io::Write;
    print!("[{}] > ", app.screen().prompt());
    let _ = std::io::stdout().flush();
}
