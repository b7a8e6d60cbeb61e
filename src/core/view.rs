//! Maps coordinator state into what the terminal session draws.

use crate::domain::model::{CoordinatorState, OperationMode, RequestParameters, StrategyId};
use std::fmt::Write;

pub const LOADING_TEXT: &str = "Loading...";
pub const NO_RESULTS_TEXT: &str = "No results";
pub const NO_USERS_TEXT: &str = "No users available";

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody<T> {
    Loading,
    Items(Vec<T>),
    Empty(&'static str),
    /// Nothing to show: the slot is empty while another operation runs.
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonCard {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCard {
    pub key: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub mode: OperationMode,
    pub label: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeopleSection {
    pub strategy: StrategyId,
    pub title: String,
    pub body: SectionBody<PersonCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub filters: String,
    pub buttons: Vec<ActionButton>,
    pub timings: Vec<(StrategyId, f64)>,
    pub people_sections: Vec<PeopleSection>,
    pub users: SectionBody<UserCard>,
}

pub struct PresentationAdapter;

impl PresentationAdapter {
    pub fn view(state: &CoordinatorState, params: &RequestParameters) -> ViewState {
        let buttons = [
            (OperationMode::StrategyA, "Search with strategy A"),
            (OperationMode::StrategyB, "Search with strategy B"),
            (OperationMode::Comparison, "Compare A vs B"),
            (OperationMode::AuxiliaryFetch, "Fetch users from directory"),
        ]
        .into_iter()
        .map(|(mode, idle_label)| ActionButton {
            mode,
            label: if state.is_loading(mode) {
                LOADING_TEXT.to_string()
            } else {
                idle_label.to_string()
            },
            disabled: state.is_busy,
        })
        .collect();

        let people_sections = StrategyId::ALL
            .into_iter()
            .map(|strategy| PeopleSection {
                strategy,
                title: format!("Results with {}", strategy),
                body: Self::people_body(state, strategy),
            })
            .collect();

        ViewState {
            filters: format!(
                "gender={} country={} results={}",
                params.gender, params.country_code, params.result_count
            ),
            buttons,
            timings: StrategyId::ALL
                .into_iter()
                .map(|s| (s, state.timing(s)))
                .collect(),
            people_sections,
            users: Self::users_body(state),
        }
    }

    fn people_body(state: &CoordinatorState, strategy: StrategyId) -> SectionBody<PersonCard> {
        let people = state.people(strategy);
        if !people.is_empty() {
            return SectionBody::Items(
                people
                    .iter()
                    .enumerate()
                    .map(|(i, person)| PersonCard {
                        key: person
                            .uuid()
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("#{}", i)),
                        name: person.display_name(),
                    })
                    .collect(),
            );
        }

        match state.active_mode {
            Some(mode) if state.is_busy && mode.strategies().contains(&strategy) => {
                SectionBody::Loading
            }
            _ if state.is_busy => SectionBody::Blank,
            _ => SectionBody::Empty(NO_RESULTS_TEXT),
        }
    }

    fn users_body(state: &CoordinatorState) -> SectionBody<UserCard> {
        if !state.auxiliary_users.is_empty() {
            return SectionBody::Items(
                state
                    .auxiliary_users
                    .iter()
                    .map(|user| UserCard {
                        key: user.id,
                        name: user.full_name(),
                        email: user.email.clone(),
                        phone: user.phone.clone(),
                        country: user.address.country.clone(),
                        image: user.image.clone(),
                    })
                    .collect(),
            );
        }

        if state.is_loading(OperationMode::AuxiliaryFetch) {
            SectionBody::Loading
        } else if state.is_busy {
            SectionBody::Blank
        } else {
            SectionBody::Empty(NO_USERS_TEXT)
        }
    }

    pub fn render(view: &ViewState) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Random People ({}) ===", view.filters);

        for button in &view.buttons {
            let marker = if button.disabled { "x" } else { " " };
            let _ = writeln!(out, "[{}] {}", marker, button.label);
        }

        for (strategy, ms) in &view.timings {
            let _ = writeln!(out, "{} last timed run: {:.2} ms", strategy, ms);
        }

        for section in &view.people_sections {
            let _ = writeln!(out, "\n--- {} ---", section.title);
            render_body(&mut out, &section.body, |out, card| {
                let _ = writeln!(out, "  {} ({})", card.name, card.key);
            });
        }

        let _ = writeln!(out, "\n--- Users from the directory ---");
        render_body(&mut out, &view.users, |out, card| {
            let _ = writeln!(
                out,
                "  {} <{}> {} [{}]",
                card.name, card.email, card.phone, card.country
            );
        });

        out
    }
}

fn render_body<T>(out: &mut String, body: &SectionBody<T>, line: impl Fn(&mut String, &T)) {
    match body {
        SectionBody::Loading => {
            let _ = writeln!(out, "  {}", LOADING_TEXT);
        }
        SectionBody::Items(items) => items.iter().for_each(|item| line(out, item)),
        SectionBody::Empty(text) => {
            let _ = writeln!(out, "  {}", text);
        }
        SectionBody::Blank => {}
    }
}
