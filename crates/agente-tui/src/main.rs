use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use agente_core::{ebook, Config, Role, Session, Storage};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

const DEFAULT_LOG_FILTER: &str = "agente=info,agente_core=info";

#[derive(Parser)]
#[command(name = "agente")]
#[command(version, about = "Agente Cirúrgico: consultoria de vendas SPIN no terminal")]
struct Cli {
    /// Directory for the saved user, chat history and log file
    #[arg(long, global = true, env = "AGENTE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save your name and start a session
    Login {
        /// Your name
        name: String,
    },
    /// Forget the saved name (chat history is kept)
    Logout,
    /// Send one message to the agent and print the reply
    Ask {
        /// Your message
        message: String,
    },
    /// Print the saved conversation
    History {
        /// Wipe the conversation instead of printing it
        #[arg(long)]
        clear: bool,
    },
    /// Read the SPIN e-book
    Ebook {
        /// Chapter number to print; lists chapters when omitted
        #[arg(short, long)]
        chapter: Option<String>,
    },
    /// Generate and play the spoken SPIN summary
    Podcast,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_result = Config::load();
    let mut config = match &config_result {
        Ok(config) => config.clone(),
        Err(_) => {
            let mut config = Config::new();
            config.apply_env();
            config
        }
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let data_dir = config.resolve_data_dir()?;
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("could not create data directory {}", data_dir.display()))?;

    let interactive = cli.command.is_none();
    init_tracing(interactive.then(|| data_dir.join("agente.log")).as_deref())?;

    if let Err(e) = config_result {
        warn!(error = %e, "could not load config file, using defaults");
    }
    info!(data_dir = %data_dir.display(), "starting");

    let session = Session::start(
        config,
        Storage::open(&data_dir),
        agente_core::audio::default_output(),
    );

    match cli.command {
        None => run_tui(session).await,
        Some(Commands::Login { name }) => login(session, &name),
        Some(Commands::Logout) => logout(session),
        Some(Commands::Ask { message }) => ask(session, &message).await,
        Some(Commands::History { clear }) => history(session, clear),
        Some(Commands::Ebook { chapter }) => read_ebook(chapter.as_deref()),
        Some(Commands::Podcast) => podcast(session).await,
    }
}

/// Logs go to a file while the TUI owns the terminal, to stderr otherwise
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("could not open log file {}", path.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .init();
        }
        None => {
            registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

async fn run_tui(session: Session) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(session);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            let Some(event) = events.next().await else {
                break;
            };
            handler::handle_event(&mut app, event)?;
            app.poll_tasks().await;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    app.shutdown();
    tui::restore()?;
    result
}

fn login(mut session: Session, name: &str) -> Result<()> {
    session.login(name)?;
    println!("Olá, {}. Sessão iniciada.", session.user().name);
    Ok(())
}

fn logout(mut session: Session) -> Result<()> {
    if !session.is_authenticated() {
        println!("Nenhuma sessão ativa.");
        return Ok(());
    }
    session.logout();
    println!("Sessão encerrada.");
    Ok(())
}

async fn ask(mut session: Session, message: &str) -> Result<()> {
    if !session.is_authenticated() {
        bail!("not logged in: run `agente login <name>` first");
    }
    if !session.has_client() {
        warn!("no API key configured, set GEMINI_API_KEY");
    }

    session.ensure_transcript();
    match session.send_message(message).await {
        Some(reply) => println!("{}", reply.text),
        None => bail!("message is empty"),
    }
    Ok(())
}

fn history(mut session: Session, clear: bool) -> Result<()> {
    if clear {
        session.clear_history();
        println!("Memória da conversa apagada.");
        return Ok(());
    }

    if session.transcript().is_empty() {
        println!("Nenhuma conversa salva.");
        return Ok(());
    }

    let user_name = session.user().name.clone();
    for msg in session.transcript() {
        let who = match msg.role {
            Role::User if user_name.is_empty() => "Você",
            Role::User => user_name.as_str(),
            Role::Model => "Agente",
        };
        println!(
            "[{}] {}:\n{}\n",
            msg.timestamp.format("%Y-%m-%d %H:%M"),
            who,
            msg.text
        );
    }
    Ok(())
}

fn read_ebook(chapter: Option<&str>) -> Result<()> {
    let Some(id) = chapter else {
        println!("{}\n{}\n", ebook::EBOOK_TITLE, ebook::EBOOK_SUBTITLE);
        for chapter in ebook::chapters() {
            println!("  {}. {}", chapter.id, chapter.title);
        }
        return Ok(());
    };

    let Some(chapter) = ebook::chapter(id) else {
        bail!(
            "no chapter {}: choose 1 to {}",
            id,
            ebook::chapters().len()
        );
    };

    println!("{}. {}\n", chapter.id, chapter.title);
    println!("{}\n", chapter.content);
    if let Some(url) = chapter.image_url {
        println!("Imagem: {}\n", url);
    }
    println!("{}", ebook::CHAPTER_MISSION);
    Ok(())
}

async fn podcast(mut session: Session) -> Result<()> {
    println!("Gerando podcast...");
    session.play_podcast().await?;
    println!("Tocando (Ctrl+C para parar)");

    let mut ticker = tokio::time::interval(Duration::from_millis(200));
    while session.is_playing() {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                session.stop_audio();
                break;
            }
        }
    }
    Ok(())
}
