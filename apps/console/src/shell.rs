//! Line commands understood by the console.

use domain::{auth::Registration, intake::Gender};

#[derive(Debug, PartialEq)]
pub enum Action {
    Help,
    Status,
    Login { email: String, password: String },
    Register(Registration),
    Name(String),
    Age(String),
    Gender(Gender),
    Symptom(String),
    DropSymptom(usize),
    Condition(String),
    Next,
    Back,
    Search,
    Pick(String),
    Prescribe,
    Reset,
    Logout,
    Confirm,
    Cancel,
    Quit,
}

pub const HELP: &str = "\
commands:
  login <email> <password>
  register <email> <password> <name...>
  name <text> | age <years> | gender <male|female|other>
  symptom <text> | drop <index> | condition <name>
  next | back | search | pick <medicine> | prescribe | reset
  logout | confirm | cancel | status | help | quit";

pub fn parse(line: &str) -> Result<Action, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let action = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => Action::Help,
        "status" => Action::Status,
        "login" => {
            let (email, password) = two_words(rest).ok_or("usage: login <email> <password>")?;
            Action::Login { email, password }
        }
        "register" => {
            let (email, tail) = rest.split_once(char::is_whitespace).ok_or(REGISTER_USAGE)?;
            let (password, name) = tail
                .trim()
                .split_once(char::is_whitespace)
                .ok_or(REGISTER_USAGE)?;
            Action::Register(Registration {
                name: name.trim().to_string(),
                email: email.to_string(),
                password: password.to_string(),
                ..Default::default()
            })
        }
        "name" => Action::Name(rest.to_string()),
        "age" => Action::Age(rest.to_string()),
        "gender" => Action::Gender(rest.parse().map_err(|e: domain::Error| e.to_string())?),
        "symptom" => Action::Symptom(rest.to_string()),
        "drop" => Action::DropSymptom(rest.parse().map_err(|_| "usage: drop <index>")?),
        "condition" => Action::Condition(rest.to_string()),
        "next" => Action::Next,
        "back" => Action::Back,
        "search" => Action::Search,
        "pick" => Action::Pick(rest.to_string()),
        "prescribe" => Action::Prescribe,
        "reset" => Action::Reset,
        "logout" => Action::Logout,
        "confirm" => Action::Confirm,
        "cancel" => Action::Cancel,
        "quit" | "exit" => Action::Quit,
        other => return Err(format!("unknown command {:?}, try help", other)),
    };
    Ok(action)
}

const REGISTER_USAGE: &str = "usage: register <email> <password> <name...>";

fn two_words(rest: &str) -> Option<(String, String)> {
    let mut parts = rest.split_whitespace();
    let first = parts.next()?.to_string();
    let second = parts.next()?.to_string();
    Some((first, second))
}
