use anyhow::{Context, bail};
use mailsort::client::{ClassificationClient, ClassifierApi};
use mailsort::config::{API_URL_ENV, Config};
use mailsort::form::{EmailMetadata, validate_file};
use mailsort::models::{self, ClassificationResult, PromptItem};
use std::env;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

const RULE: &str =
    "--------------------------------------------------------------------------------";

fn usage(program: &str) {
    eprintln!("Usage: {} <file.txt|file.pdf|-> [--subject S] [--sender S] [--recipient S]", program);
    eprintln!("       {} --history [limit]", program);
    eprintln!("       {} --emails [limit]", program);
    eprintln!("       {} --show <email_id>", program);
    eprintln!("       {} --prompt <prompt_id>", program);
    eprintln!("       {} --active <type> <category>", program);
    eprintln!("       {} --prompt-count", program);
    eprintln!("       {} --health", program);
    eprintln!("Use '-' to read the email text from stdin.");
}

fn print_result(result: &ClassificationResult) {
    let email = &result.email;
    let classification = &result.classification;

    println!("Email #{}", email.id);
    println!("Subject: {}", email.subject.as_deref().unwrap_or("(No Subject)"));
    println!("Sender: {}", email.sender.as_deref().unwrap_or("Sender not provided"));
    if let Some(file_name) = &email.file_name {
        println!("File: {}", file_name);
    }
    println!("{}", RULE);
    println!("Category: {}", classification.category);
    if let Some(sub) = &classification.subcategory {
        println!("Subcategory: {}", models::subcategory_label(sub));
    }
    println!("Confidence: {}%", classification.confidence_percent());
    println!("Processing time: {}", classification.processing_time_label());
    println!(
        "Classified at: {}",
        models::format_timestamp(&classification.created_at)
    );
    println!("{}", RULE);
    println!("SUGGESTED RESPONSE:");
    println!(
        "{}",
        classification
            .suggested_response
            .as_deref()
            .unwrap_or("(None)")
    );
}

fn print_prompt(prompt: &PromptItem) {
    println!("Prompt #{} (v{})", prompt.id, prompt.version);
    println!("Type: {}", models::humanize(&prompt.prompt_type));
    println!("Category: {}", prompt.category);
    if let Some(sub) = &prompt.subcategory {
        println!("Subcategory: {}", models::subcategory_label(sub));
    }
    println!("Active: {}", if prompt.is_active { "yes" } else { "no" });
    println!("Created: {}", models::format_timestamp(&prompt.created_at));
    println!("{}", RULE);
    println!("{}", prompt.content);
}

fn parse_limit(value: Option<&String>, default: u32) -> anyhow::Result<u32> {
    match value {
        Some(v) => v.parse().with_context(|| format!("Invalid limit '{}'", v)),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
        std::process::exit(1);
    }

    let mut config = Config::load();
    config.apply_overrides(env::var(API_URL_ENV).ok(), None);
    let client = ClassificationClient::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )?;

    match args[1].as_str() {
        "--prompt" => {
            let Some(id) = args.get(2) else {
                usage(&args[0]);
                std::process::exit(1);
            };
            let id: i64 = id
                .parse()
                .with_context(|| format!("Invalid prompt id '{}'", id))?;
            print_prompt(&client.get_prompt(id).await?);
        }
        "--active" => {
            let (Some(prompt_type), Some(category)) = (args.get(2), args.get(3)) else {
                usage(&args[0]);
                std::process::exit(1);
            };
            print_prompt(&client.active_prompt(prompt_type, category).await?);
        }
        "--prompt-count" => {
            println!("{} prompt(s)", client.prompt_count().await?);
        }
        "--health" => {
            client.health().await?;
            println!("Backend at {} is up", client.base_url());
        }
        "--history" => {
            let limit = parse_limit(args.get(2), config.api.page_size)?;
            let items = client.history(0, limit).await?;
            if items.is_empty() {
                println!("No emails classified yet");
            }
            for item in items {
                println!(
                    "#{:<5} {:<12} {:>4}  {}  {}",
                    item.email_id,
                    item.classification_category.as_deref().unwrap_or("-"),
                    item.classification_confidence
                        .map(|c| format!("{}%", models::confidence_percent(c)))
                        .unwrap_or_default(),
                    models::format_timestamp(&item.created_at),
                    item.email_subject.as_deref().unwrap_or("(No Subject)"),
                );
            }
            if let Ok(total) = client.history_count().await {
                println!("{} classification(s) in total", total);
            }
        }
        "--emails" => {
            let limit = parse_limit(args.get(2), config.api.page_size)?;
            for email in client.list_emails(0, limit).await? {
                println!(
                    "#{:<5} {}  {}",
                    email.id,
                    models::format_timestamp(&email.created_at),
                    email.subject.as_deref().unwrap_or("(No Subject)"),
                );
            }
        }
        "--show" => {
            let Some(id) = args.get(2) else {
                usage(&args[0]);
                std::process::exit(1);
            };
            let id: i64 = id
                .parse()
                .with_context(|| format!("Invalid email id '{}'", id))?;
            let result = client.get_email(id).await?;
            print_result(&result);
            println!("{}", RULE);
            println!("CONTENT:");
            println!("{}", result.email.content);
        }
        source => {
            let (mut subject, mut sender, mut recipient) = (String::new(), String::new(), String::new());
            let mut rest = args[2..].iter();
            while let Some(flag) = rest.next() {
                let slot = match flag.as_str() {
                    "--subject" => &mut subject,
                    "--sender" => &mut sender,
                    "--recipient" => &mut recipient,
                    other => bail!("Unknown option '{}'", other),
                };
                *slot = rest
                    .next()
                    .cloned()
                    .with_context(|| format!("{} needs a value", flag))?;
            }
            let metadata = EmailMetadata::new(&subject, &sender, &recipient);

            let result = if source == "-" {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .context("Failed to read stdin")?;
                if content.trim().is_empty() {
                    bail!("Please enter the email content");
                }
                client.upload_text(&content, &metadata).await?
            } else {
                let file = validate_file(Path::new(source))?;
                client.upload_file(&file, &metadata).await?
            };
            print_result(&result);
        }
    }

    Ok(())
}
