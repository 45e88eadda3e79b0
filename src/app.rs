use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::config::Config;
use crate::domain::models::{Participant, QuestionSet};
use crate::flow::consent::{ConsentFlow, AGE_MAX, AGE_MIN, EDUCATION_OPTIONS, GENDER_OPTIONS};
use crate::flow::login::LoginFlow;
use crate::flow::summary::summary_rows;
use crate::flow::survey::{SurveyFlow, SurveyState};
use crate::services::api::ApiClient;
use crate::session::SessionStore;

const BAR_WIDTH: usize = 30;

const STEPS: [(&str, &str); 3] = [
    ("Log in", "Confirm your participant ID."),
    ("Consent", "Share demographics and agree to participate."),
    ("BFI-2 Survey", "Complete the personality inventory."),
];

enum Nav {
    Continue,
    Quit,
}

/// Top-level controller. Owns the session store, the API client and the
/// current participant, and threads them into each screen; screens never
/// reach for ambient state.
pub struct App {
    api: ApiClient,
    store: SessionStore,
    user: Option<Participant>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            api: ApiClient::new(config.api_base.clone()),
            store: SessionStore::new(config.session_file.clone()),
            user: None,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.user = self.store.load();
        println!("Reflection Lab");
        println!("Help us study how collaboration with AI teams shapes self-perceived personality.");

        loop {
            let nav = match self.user.clone() {
                None => self.login_screen().await?,
                Some(user) if !user.has_consented() => self.consent_screen(&user).await?,
                Some(user) => self.survey_screen(&user).await?,
            };
            if matches!(nav, Nav::Quit) {
                return Ok(());
            }
        }
    }

    /// Persist-and-replace, mirroring the session rules: saving is
    /// best-effort, signing out always clears the file.
    fn set_user(&mut self, next: Option<Participant>) {
        match &next {
            Some(user) => {
                if let Err(err) = self.store.save(user) {
                    tracing::warn!("failed to persist session: {err}");
                }
            }
            None => self.store.clear(),
        }
        self.user = next;
    }

    fn print_header(&self, step: usize) {
        println!();
        match &self.user {
            Some(user) => println!("Participant {}", user.participant_id),
            None => println!("Not signed in"),
        }
        for (index, (label, description)) in STEPS.iter().enumerate() {
            let marker = if index == step { "=>" } else { "  " };
            println!("{marker} {label} - {description}");
        }
        println!();
    }

    async fn login_screen(&mut self) -> anyhow::Result<Nav> {
        let mut flow = LoginFlow::new();
        loop {
            self.print_header(0);
            println!("{}", flow.mode.heading());
            println!("{}", flow.mode.lead());
            println!("{}", flow.mode.switch_hint());
            println!("Type 'quit' to leave.");
            if let Some(message) = flow.error() {
                println!("! {message}");
            }

            let Some(participant_id) = prompt("Participant ID (e.g. PM-042): ")? else {
                return Ok(Nav::Quit);
            };
            match participant_id.as_str() {
                "quit" => return Ok(Nav::Quit),
                "switch" => {
                    flow.mode.toggle();
                    continue;
                }
                _ => {}
            }
            let Some(passcode) = prompt("Passcode (at least 4 characters): ")? else {
                return Ok(Nav::Quit);
            };

            if let Some(user) = flow.submit(&self.api, &participant_id, &passcode).await {
                self.set_user(Some(user));
                return Ok(Nav::Continue);
            }
        }
    }

    async fn consent_screen(&mut self, user: &Participant) -> anyhow::Result<Nav> {
        let mut flow = ConsentFlow::new(user);
        loop {
            self.print_header(1);
            println!("Consent and demographics");
            println!("Provide a few details for the study record, then acknowledge consent.");
            if let Some(message) = flow.error() {
                println!("! {message}");
            }

            let Some(alias) = prompt_with_default("Name alias", &flow.form.alias)? else {
                return Ok(Nav::Quit);
            };
            flow.form.alias = alias;

            let Some(age) = prompt_age(flow.form.age)? else {
                return Ok(Nav::Quit);
            };
            flow.form.age = age;

            let Some(education) = prompt_choice("Education", &EDUCATION_OPTIONS, &flow.form.education)?
            else {
                return Ok(Nav::Quit);
            };
            flow.form.education = education;

            let Some(gender) = prompt_choice("Gender", &GENDER_OPTIONS, &flow.form.gender)? else {
                return Ok(Nav::Quit);
            };
            flow.form.gender = gender;

            let Some(acknowledged) = prompt_yes_no(
                "I have read the consent form and agree to participate in this study.",
                flow.form.acknowledged,
            )?
            else {
                return Ok(Nav::Quit);
            };
            flow.form.acknowledged = acknowledged;

            if let Some(updated) = flow.submit(&self.api, user.id).await {
                self.set_user(Some(updated));
                return Ok(Nav::Continue);
            }
            // Failure path: the loop re-renders with the inline error and
            // every entered value still in place.
        }
    }

    async fn survey_screen(&mut self, user: &Participant) -> anyhow::Result<Nav> {
        self.print_header(2);
        println!("Big Five Inventory-2");
        println!("Loading survey...");

        let mut flow = SurveyFlow::new();
        flow.load(&self.api, user.id).await;

        if let SurveyState::Answering = flow.state() {
            return self.answer_pages(user, flow).await;
        }
        match flow.state() {
            SurveyState::Completed { response } => {
                println!("You have already completed this survey. Here is your baseline profile.");
                render_summary(&response.scored.summary);
            }
            SurveyState::Failed { message } => println!("! {message}"),
            _ => println!("Survey unavailable."),
        }
        self.end_screen()
    }

    async fn answer_pages(&mut self, user: &Participant, mut flow: SurveyFlow) -> anyhow::Result<Nav> {
        if let Some(set) = flow.question_set() {
            println!("{}", set.instructions);
        }

        loop {
            if flow.total_pages() == 0 {
                println!("Survey unavailable.");
                return self.end_screen();
            }

            println!();
            println!(
                "Page {} of {} ({}% complete)",
                flow.page() + 1,
                flow.total_pages(),
                flow.progress()
            );
            if let Some(set) = flow.question_set() {
                render_scale(set);
            }

            let items: Vec<(i64, String)> = flow
                .current_items()
                .iter()
                .map(|item| (item.id, item.text.clone()))
                .collect();
            for (id, text) in &items {
                let Some(value) = prompt_likert(text, flow.answer_for(*id))? else {
                    return Ok(Nav::Quit);
                };
                flow.answer(*id, value);
            }

            if flow.is_last_page() {
                let Some(choice) = prompt("Submit survey, go back, or quit? [s/p/q]: ")? else {
                    return Ok(Nav::Quit);
                };
                match choice.as_str() {
                    "p" if flow.can_go_prev() => {
                        flow.prev_page();
                        continue;
                    }
                    "q" => return Ok(Nav::Quit),
                    "" | "s" => {}
                    _ => {
                        println!("! Enter s, p or q.");
                        continue;
                    }
                }

                println!("Submitting...");
                if let Some(response) = flow.submit(&self.api, user.id).await {
                    self.print_header(2);
                    println!("Survey complete");
                    println!(
                        "Thank you for finishing the baseline questionnaire. \
                         Your responses have been recorded securely."
                    );
                    render_summary(&response.scored.summary);
                    return self.end_screen();
                }
                if let Some(message) = flow.submit_error() {
                    println!("! {message}");
                }
                // Answers stay intact; the same page renders again and
                // submission is re-enabled.
            } else {
                let Some(choice) = prompt("Next page, previous page, or quit? [n/p/q]: ")? else {
                    return Ok(Nav::Quit);
                };
                match choice.as_str() {
                    "p" if flow.can_go_prev() => flow.prev_page(),
                    "q" => return Ok(Nav::Quit),
                    "" | "n" => flow.next_page(),
                    _ => println!("! Enter n, p or q."),
                }
            }
        }
    }

    fn end_screen(&mut self) -> anyhow::Result<Nav> {
        loop {
            let Some(choice) = prompt("Return to start, sign out, or quit? [r/s/q]: ")? else {
                return Ok(Nav::Quit);
            };
            match choice.as_str() {
                "" | "r" => return Ok(Nav::Continue),
                "s" => {
                    self.set_user(None);
                    return Ok(Nav::Continue);
                }
                "q" => return Ok(Nav::Quit),
                _ => println!("! Enter r, s or q."),
            }
        }
    }
}

fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_with_default(label: &str, current: &str) -> io::Result<Option<String>> {
    let full = if current.is_empty() {
        format!("{label}: ")
    } else {
        format!("{label} [{current}]: ")
    };
    let Some(input) = prompt(&full)? else {
        return Ok(None);
    };
    if input.is_empty() && !current.is_empty() {
        return Ok(Some(current.to_string()));
    }
    Ok(Some(input))
}

/// Outer None is end-of-input; the inner option is the (optional) age.
fn prompt_age(current: Option<i32>) -> io::Result<Option<Option<i32>>> {
    let shown = current.map(|age| age.to_string()).unwrap_or_default();
    loop {
        let label = format!("Age ({AGE_MIN}-{AGE_MAX}, optional)");
        let full = if shown.is_empty() {
            format!("{label}: ")
        } else {
            format!("{label} [{shown}]: ")
        };
        let Some(input) = prompt(&full)? else {
            return Ok(None);
        };
        if input.is_empty() {
            return Ok(Some(current));
        }
        match input.parse::<i32>() {
            Ok(age) => return Ok(Some(Some(age))),
            Err(_) => println!("! Age must be a number."),
        }
    }
}

fn prompt_choice(label: &str, options: &[&str], current: &str) -> io::Result<Option<String>> {
    println!("{label}:");
    for (index, option) in options.iter().enumerate() {
        println!("  {}. {option}", index + 1);
    }
    loop {
        let full = if current.is_empty() {
            "Select one: ".to_string()
        } else {
            format!("Select one [{current}]: ")
        };
        let Some(input) = prompt(&full)? else {
            return Ok(None);
        };
        if input.is_empty() && !current.is_empty() {
            return Ok(Some(current.to_string()));
        }
        if let Ok(index) = input.parse::<usize>() {
            if (1..=options.len()).contains(&index) {
                return Ok(Some(options[index - 1].to_string()));
            }
        }
        println!("! Enter a number between 1 and {}.", options.len());
    }
}

fn prompt_yes_no(label: &str, current: bool) -> io::Result<Option<bool>> {
    let hint = if current { "Y/n" } else { "y/N" };
    loop {
        let Some(input) = prompt(&format!("{label} [{hint}]: "))? else {
            return Ok(None);
        };
        match input.to_lowercase().as_str() {
            "" => return Ok(Some(current)),
            "y" | "yes" => return Ok(Some(true)),
            "n" | "no" => return Ok(Some(false)),
            _ => println!("! Answer y or n."),
        }
    }
}

fn prompt_likert(text: &str, current: Option<u8>) -> io::Result<Option<u8>> {
    loop {
        let full = match current {
            Some(value) => format!("{text} [1-5, Enter keeps {value}]: "),
            None => format!("{text} [1-5]: "),
        };
        let Some(input) = prompt(&full)? else {
            return Ok(None);
        };
        if input.is_empty() {
            if let Some(value) = current {
                return Ok(Some(value));
            }
        } else if let Ok(value) = input.parse::<u8>() {
            if (1..=5).contains(&value) {
                return Ok(Some(value));
            }
        }
        println!("! Choose a value from 1 to 5.");
    }
}

fn render_scale(set: &QuestionSet) {
    for (value, label) in &set.scale {
        println!("  {value} = {label}");
    }
    println!();
}

fn render_summary(summary: &BTreeMap<String, f64>) {
    let rows = summary_rows(summary);
    if rows.is_empty() {
        return;
    }
    println!();
    for row in rows {
        let filled = (row.ratio * BAR_WIDTH as f64).round() as usize;
        println!(
            "  {:<18} {:>5.2}  [{}{}]",
            row.label,
            row.value,
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled)
        );
    }
}
