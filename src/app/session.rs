use crate::core::coordinator::RequestCoordinator;
use crate::core::view::{PresentationAdapter, ViewState};
use crate::domain::model::{Gender, OperationMode, RequestParameters};
use crate::domain::ports::KeyValueStore;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_country_code;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

pub const HELP_TEXT: &str = "\
Commands:
  a                 search with strategy A
  b                 search with strategy B
  compare           run both strategies and time them
  users             fetch users from the directory
  gender <g>        any | male | female
  country <XX>      two-letter nationality filter
  show              redraw the current view
  help              this text
  quit              leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(OperationMode),
    SetGender(Gender),
    SetCountry(String),
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next().unwrap_or_default();

        let command = match verb.as_str() {
            "a" => Command::Run(OperationMode::StrategyA),
            "b" => Command::Run(OperationMode::StrategyB),
            "compare" | "c" => Command::Run(OperationMode::Comparison),
            "users" | "u" => Command::Run(OperationMode::AuxiliaryFetch),
            "gender" | "g" => Command::SetGender(arg.parse()?),
            "country" | "nat" => {
                validate_country_code("country", arg)?;
                Command::SetCountry(arg.to_ascii_uppercase())
            }
            "show" | "s" => Command::Show,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => {
                return Err(AppError::InvalidConfigValueError {
                    field: "command".to_string(),
                    value: other.to_string(),
                    reason: "unknown command, type 'help'".to_string(),
                })
            }
        };
        Ok(command)
    }
}

/// Interactive loop: owns the filters the user edits and hands a copy to every
/// operation it starts.
pub struct Session<S: KeyValueStore + 'static> {
    coordinator: RequestCoordinator<S>,
    params: RequestParameters,
    // redraw tasks of started operations; drained before `run` returns
    in_flight: Vec<JoinHandle<()>>,
}

impl<S: KeyValueStore + 'static> Session<S> {
    pub fn new(coordinator: RequestCoordinator<S>, params: RequestParameters) -> Self {
        Self {
            coordinator,
            params,
            in_flight: Vec::new(),
        }
    }

    pub fn params(&self) -> &RequestParameters {
        &self.params
    }

    pub fn coordinator(&self) -> &RequestCoordinator<S> {
        &self.coordinator
    }

    pub fn view(&self) -> ViewState {
        PresentationAdapter::view(&self.coordinator.snapshot(), &self.params)
    }

    /// Applies one command; `false` means the session should end.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Run(mode) => self.dispatch(mode),
            Command::SetGender(gender) => self.params.gender = gender,
            Command::SetCountry(country) => self.params.country_code = country,
            Command::Show => println!("{}", PresentationAdapter::render(&self.view())),
            Command::Help => println!("{}", HELP_TEXT),
            Command::Quit => return false,
        }
        true
    }

    fn dispatch(&mut self, mode: OperationMode) {
        let Some(handle) = self.coordinator.start_operation(mode, self.params.clone()) else {
            return;
        };

        println!("{}", PresentationAdapter::render(&self.view()));

        // redraw once the operation settled
        let coordinator = self.coordinator.clone();
        let params = self.params.clone();
        self.in_flight.retain(|task| !task.is_finished());
        self.in_flight.push(tokio::spawn(async move {
            if let Err(e) = handle.await {
                tracing::warn!("{} operation ended abnormally: {}", mode, e);
            }
            let view = PresentationAdapter::view(&coordinator.snapshot(), &params);
            println!("{}", PresentationAdapter::render(&view));
        }));
    }

    /// Waits for every started operation to settle and draw its final view.
    async fn drain(&mut self) {
        let pending: Vec<_> = self.in_flight.drain(..).collect();
        if !pending.is_empty() {
            tracing::info!("Waiting for {} running operation(s) to settle", pending.len());
        }
        for task in pending {
            if let Err(e) = task.await {
                tracing::warn!("Redraw task failed: {}", e);
            }
        }
    }

    pub async fn run<R: AsyncRead + Unpin>(&mut self, input: R) -> Result<()> {
        println!("{}", PresentationAdapter::render(&self.view()));
        println!("{}", HELP_TEXT);

        let mut lines = BufReader::new(input).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line.parse::<Command>() {
                Ok(command) => {
                    if !self.apply(command) {
                        break;
                    }
                }
                Err(e) => println!("{}", e.user_friendly_message()),
            }
        }

        // input ended or quit: let running operations finish before returning
        self.drain().await;
        tracing::info!("Session closed");
        Ok(())
    }
}
