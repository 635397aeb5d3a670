use std::sync::Arc;

use anyhow::Context;
use domain::{
    auth::Credentials, config::Settings, navigator::Navigator, notify::NotificationKind,
    store::FileStore, Backend, Screen,
};
use remote::HttpBackend;
use tokio::io::{AsyncBufReadExt, BufReader};

mod shell;

use shell::Action;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let settings = Settings::from_env();
    let store = FileStore::open(&settings.session_file)
        .await
        .with_context(|| format!("opening {}", settings.session_file.display()))?;
    let http = Arc::new(HttpBackend::new(&settings.api_url, settings.http_timeout)?);

    let navigator = Navigator::new(
        Arc::new(store),
        Backend::new(http.clone(), http.clone(), http),
        &settings,
    );

    let mut toasts = navigator.notifications().subscribe();
    tokio::spawn(async move {
        while toasts.changed().await.is_ok() {
            if let Some(toast) = toasts.borrow_and_update().clone() {
                let marker = match toast.kind {
                    NotificationKind::Success => "ok",
                    NotificationKind::Error => "!!",
                };
                println!("[{}] {}", marker, toast.message);
            }
        }
    });

    let screen = navigator.start().await?;
    println!("{}", shell::HELP);
    println!("screen: {}", screen);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let action = match shell::parse(&line) {
            Ok(Action::Quit) => break,
            Ok(action) => action,
            Err(usage) => {
                println!("{}", usage);
                continue;
            }
        };

        if let Err(e) = run(&navigator, action).await {
            println!("error: {}", e);
        }
        println!("screen: {}", navigator.screen());
    }

    Ok(())
}

async fn run(navigator: &Navigator, action: Action) -> Result<(), domain::Error> {
    match action {
        Action::Help => println!("{}", shell::HELP),
        Action::Status => print_status(navigator).await,
        Action::Login { email, password } => {
            navigator.login(Credentials::new(email, password)).await?;
        }
        Action::Register(registration) => {
            navigator.register(registration).await?;
        }
        Action::Name(name) => {
            navigator.set_patient_name(name).await?;
        }
        Action::Age(age) => {
            navigator.set_patient_age(age).await?;
        }
        Action::Gender(gender) => {
            navigator.set_patient_gender(gender).await?;
        }
        Action::Symptom(text) => {
            navigator.add_symptom(text).await?;
        }
        Action::DropSymptom(index) => {
            navigator.remove_symptom(index).await?;
        }
        Action::Condition(condition) => {
            navigator.toggle_condition(condition).await?;
        }
        Action::Next => {
            let before = navigator.screen();
            if navigator.proceed().await? == Screen::Home && before == Screen::Home {
                println!("fill in name, age, gender and at least one symptom first");
            }
        }
        Action::Back => {
            navigator.back().await?;
        }
        Action::Search => {
            let outcome = navigator.search_medicines().await?;
            println!("diagnosis: {}", outcome.diagnosis);
            for medicine in &outcome.medicines {
                println!("  - {} ({}, {})", medicine.name, medicine.recommended_dosage, medicine.timing);
            }
        }
        Action::Pick(name) => {
            navigator.toggle_medicine(name).await?;
        }
        Action::Prescribe => {
            let document = navigator.generate_prescription().await?;
            println!("{}", document.prescription_html);
        }
        Action::Reset => {
            navigator.reset().await?;
        }
        Action::Logout => {
            navigator.request_logout()?;
            println!("log out and discard this intake? confirm | cancel");
        }
        Action::Confirm => {
            navigator.confirm_logout().await?;
        }
        Action::Cancel => navigator.cancel_logout(),
        Action::Quit => {}
    }
    Ok(())
}

async fn print_status(navigator: &Navigator) {
    let auth = navigator.auth();
    println!("auth: {}", auth.state().as_str());
    if let Some(user) = auth.user() {
        println!("user: {} <{}>", user.name, user.email);
    }
    if let Some(error) = auth.inline_error() {
        println!("auth error: {}", error);
    }

    let intake = navigator.intake().await;
    println!("patient: {:?}", intake.patient);
    for (i, symptom) in intake.symptoms.iter().enumerate() {
        println!("  symptom {}: {}", i, symptom);
    }
    println!("conditions: {}", intake.health_conditions.join(", "));
    println!("selected: {}", intake.selected_medicines.join(", "));
}
