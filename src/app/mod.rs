//! The three-screen shell: named actions dispatched from a single event
//! loop, with background work re-entering the loop as [`UiEvent`]s.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::AppError;
use crate::landmark::{HttpsCallable, LandmarkError, LandmarkRecognizer};
use crate::model_manager::{DownloadConditions, ModelManager, ModelSpec};
use crate::sentiment::{render_transcript_entry, SentimentSession, SessionState};

/// The navigable screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Sentiment,
    Landmark,
}

impl Screen {
    /// The navigation graph: both feature screens reachable from home, and
    /// home reachable back from each. No cross-feature edge exists.
    pub fn can_navigate_to(self, to: Screen) -> bool {
        matches!(
            (self, to),
            (Screen::Home, Screen::Sentiment)
                | (Screen::Home, Screen::Landmark)
                | (Screen::Sentiment, Screen::Home)
                | (Screen::Landmark, Screen::Home)
        )
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Sentiment => "sentiment",
            Screen::Landmark => "landmark",
        }
    }
}

/// Completions delivered from background tasks back into the dispatch loop.
/// All visible state mutation happens when these are handled, never on the
/// worker that produced them.
#[derive(Debug)]
pub enum UiEvent {
    ModelReady,
    SentimentResult(String),
    LandmarkResult(String),
    Failure(String),
}

/// What the dispatch loop should do after a command.
#[derive(Debug)]
pub enum Action {
    Continue(Vec<String>),
    Quit,
}

pub struct App {
    screen: Screen,
    session: SentimentSession,
    manager: ModelManager,
    spec: ModelSpec,
    recognizer: Arc<LandmarkRecognizer<HttpsCallable>>,
    selected_image: Option<(PathBuf, Vec<u8>)>,
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl App {
    pub fn new(
        manager: ModelManager,
        spec: ModelSpec,
        endpoint: &str,
    ) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Self {
            screen: Screen::Home,
            session: SentimentSession::new(),
            manager,
            spec,
            recognizer: Arc::new(LandmarkRecognizer::new(HttpsCallable::new(endpoint))),
            selected_image: None,
            tx,
        };
        (app, rx)
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn help(&self) -> Vec<String> {
        let commands = match self.screen {
            Screen::Home => "sentiment | landmark | quit",
            Screen::Sentiment => "analyze <text> | back",
            Screen::Landmark => "select <path> | analyze | back",
        };
        vec![format!("[{}] commands: {}", self.screen.prompt(), commands)]
    }

    /// Dispatches one named action for the current screen.
    pub fn handle_command(&mut self, line: &str) -> Result<Action, AppError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Action::Continue(vec![]));
        }
        if line == "help" {
            return Ok(Action::Continue(self.help()));
        }

        let (command, argument) = match line.split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };

        match (self.screen, command) {
            (Screen::Home, "sentiment") => Ok(Action::Continue(self.enter_sentiment())),
            (Screen::Home, "landmark") => Ok(Action::Continue(self.navigate(Screen::Landmark))),
            (Screen::Home, "quit") => Ok(Action::Quit),

            (Screen::Sentiment, "analyze") => {
                self.classify(argument)?;
                Ok(Action::Continue(vec![]))
            }
            (Screen::Sentiment, "back") => Ok(Action::Continue(self.navigate(Screen::Home))),

            (Screen::Landmark, "select") => Ok(Action::Continue(self.select_image(argument)?)),
            (Screen::Landmark, "analyze") => {
                self.recognize()?;
                Ok(Action::Continue(vec![]))
            }
            (Screen::Landmark, "back") => Ok(Action::Continue(self.navigate(Screen::Home))),

            _ => Err(AppError::UnknownCommand(line.to_string())),
        }
    }

    /// Renders a background completion. Runs on the dispatch loop.
    pub fn handle_event(&mut self, event: UiEvent) -> Vec<String> {
        match event {
            UiEvent::ModelReady => vec!["Sentiment model ready.".to_string()],
            UiEvent::SentimentResult(entry) => entry.lines().map(str::to_string).collect(),
            UiEvent::LandmarkResult(block) => block.lines().map(str::to_string).collect(),
            UiEvent::Failure(message) => vec![format!("Error: {}", message)],
        }
    }

    fn navigate(&mut self, to: Screen) -> Vec<String> {
        debug_assert!(self.screen.can_navigate_to(to));
        if self.screen == Screen::Landmark {
            // Screen-local state does not survive navigation
            self.selected_image = None;
        }
        self.screen = to;
        vec![format!("-- {} --", to.prompt())]
    }

    /// Entering the sentiment screen kicks off the model download once per
    /// session; later entries find the session already past Unloaded.
    fn enter_sentiment(&mut self) -> Vec<String> {
        let mut lines = self.navigate(Screen::Sentiment);

        if self.session.state() == SessionState::Unloaded {
            let session = self.session.clone();
            let manager = self.manager.clone();
            let spec = self.spec.clone();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let event = match session
                    .prepare(&manager, &spec, DownloadConditions::default())
                    .await
                {
                    Ok(()) => UiEvent::ModelReady,
                    Err(e) => UiEvent::Failure(format!(
                        "Model download failed, please check your connection. ({})",
                        e
                    )),
                };
                let _ = tx.send(event);
            });
            lines.push("Downloading sentiment model...".to_string());
        }

        lines
    }

    /// Classification runs on a blocking worker; the ranked result re-enters
    /// the loop as a transcript entry. Not-Ready sessions reject immediately.
    fn classify(&self, text: &str) -> Result<(), AppError> {
        if text.is_empty() {
            return Err(AppError::Sentiment(
                crate::sentiment::SentimentError::Validation("Input text cannot be empty".into()),
            ));
        }

        let session = self.session.clone();
        let text = text.to_string();
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            let event = match session.classify(&text) {
                Ok(categories) => {
                    UiEvent::SentimentResult(render_transcript_entry(&text, &categories))
                }
                Err(e) => UiEvent::Failure(e.to_string()),
            };
            let _ = tx.send(event);
        });
        Ok(())
    }

    fn select_image(&mut self, path: &str) -> Result<Vec<String>, AppError> {
        if path.is_empty() {
            return Err(AppError::Landmark(LandmarkError::NoImage));
        }
        let path = PathBuf::from(path);
        let bytes = std::fs::read(&path)?;
        let shown = path.display().to_string();
        self.selected_image = Some((path, bytes));
        Ok(vec![format!("Selected image: {}", shown)])
    }

    fn recognize(&self) -> Result<(), AppError> {
        let (_, bytes) = self
            .selected_image
            .as_ref()
            .ok_or(AppError::Landmark(LandmarkError::NoImage))?;

        let recognizer = Arc::clone(&self.recognizer);
        let bytes = bytes.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = match recognizer.recognize(&bytes).await {
                Ok(landmark) => UiEvent::LandmarkResult(landmark.render()),
                Err(e) => UiEvent::Failure(e.to_string()),
            };
            let _ = tx.send(event);
        });
        Ok(())
    }
}
