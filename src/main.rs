//! DilemmAI CLI
//!
//! Interactive by default. Run with: cargo run
//! One-shot: dilemmai questions "What should I eat?" Pizza Sushi --json

use anyhow::{bail, Context, Result};
use dilemmai::{
    ChatCompletionProvider, Change, ClarificationQuestion, Config, DecisionEngine, Dilemma,
    DilemmaSession, OptionRef, SessionState, Stage,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let json_output = args.iter().any(|a| a == "--json");
    let positional = positional_args(&args);

    match args.get(1).map(|s| s.as_str()) {
        None | Some("--repl") => run_repl().await,
        Some("--check-config") => run_check_config(),
        Some("--help") | Some("-h") | Some("help") => {
            print_usage();
            Ok(())
        }
        Some("questions") => run_questions_cmd(&positional[1..], json_output).await,
        Some("decide") => run_decide_cmd(&positional[1..], json_output).await,
        Some(other) => {
            print_usage();
            bail!("unknown command: {}", other)
        }
    }
}

/// Arguments after the program name, minus the output flags we understand
fn positional_args(args: &[String]) -> Vec<String> {
    args.iter()
        .skip(1)
        .filter(|a| a.as_str() != "--json")
        .cloned()
        .collect()
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dilemmai=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    println!("DilemmAI - let AI make your choices smarter, not random");
    println!();
    println!("Usage:");
    println!("  dilemmai                                  Interactive session");
    println!("  dilemmai questions <purpose> <opt>... [--json]");
    println!("                                            Generate clarification questions");
    println!("  dilemmai decide <purpose> <opt>... [--json]");
    println!("                                            Decide without clarification");
    println!("  dilemmai --check-config                   Validate configuration");
    println!();
    println!("Configuration: DILEMMAI_API_KEY (required), DILEMMAI_API_URL, DILEMMAI_MODEL,");
    println!("DILEMMAI_TEMPERATURE, DILEMMAI_TIMEOUT_SECS, DILEMMAI_STRICT_DECISION");
}

fn build_engine(config: &Config) -> Result<DecisionEngine> {
    let provider = ChatCompletionProvider::new(config.provider.clone())?;
    Ok(DecisionEngine::new(Arc::new(provider)).with_strictness(config.strictness))
}

fn load_config() -> Result<Config> {
    Config::from_env().context("configuration error")
}

// ============================================================================
// One-shot Commands
// ============================================================================

fn run_check_config() -> Result<()> {
    let config = load_config()?;
    println!("API key:     set");
    println!("Endpoint:    {}", config.provider.api_url);
    println!("Model:       {}", config.provider.model);
    println!("Temperature: {}", config.provider.temperature);
    println!("Timeout:     {}s", config.provider.timeout.as_secs());
    println!("Strictness:  {:?}", config.strictness);
    Ok(())
}

/// Split `<purpose> <opt>...` into a validated input-stage state
fn one_shot_state(args: &[String]) -> Result<SessionState> {
    let Some((purpose, options)) = args.split_first() else {
        bail!("usage: <purpose> <option> <option>...");
    };
    let mut state = SessionState::new();
    state.initialize();
    state.set_purpose(purpose)?;
    for option in options {
        state.add_option(option)?;
    }
    state.check_advance(Stage::Questions)?;
    Ok(state)
}

async fn run_questions_cmd(args: &[String], json_output: bool) -> Result<()> {
    let state = one_shot_state(args)?;
    let engine = build_engine(&load_config()?)?;
    let dilemma = state.dilemma();

    let questions = engine
        .generate_questions(&dilemma.purpose, &dilemma.options)
        .await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&questions)?);
    } else {
        print_questions(&questions, &dilemma.answers);
    }
    Ok(())
}

async fn run_decide_cmd(args: &[String], json_output: bool) -> Result<()> {
    let state = one_shot_state(args)?;
    let engine = build_engine(&load_config()?)?;
    let dilemma = state.dilemma();

    let decision = engine
        .get_final_decision(&dilemma.purpose, &dilemma.options, &dilemma.answers)
        .await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        print_decision(&decision);
    }
    Ok(())
}

// ============================================================================
// Interactive Mode
// ============================================================================

async fn run_repl() -> Result<()> {
    use std::io::{self, BufRead, Write};

    let config = load_config()?;
    let mut session = DilemmaSession::new(build_engine(&config)?);
    tracing::info!(session = %session.id(), model = %config.provider.model, "session started");

    println!("DilemmAI");
    println!("========");
    println!("Let AI make your choices smarter, not random. Type /help for commands.\n");
    redraw(&session, Change::Reset);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}> ", session.stage());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        match handle_line(&mut session, line).await {
            Ok(change) => redraw(&session, change),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

async fn handle_line(session: &mut DilemmaSession, line: &str) -> Result<Change> {
    if !line.starts_with('/') {
        return handle_plain(session, line);
    }

    let (cmd, arg) = match line.split_once(' ') {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    match cmd {
        "/help" => {
            print_help();
            Ok(Change::None)
        }
        "/purpose" => Ok(session.set_purpose(arg)?),
        "/add" => add_options(session, arg),
        "/remove" => {
            let target = match arg.strip_prefix('#').map(|n| n.parse::<usize>()) {
                Some(Ok(n)) if n > 0 => OptionRef::Index(n - 1),
                Some(_) => bail!("usage: /remove <option> or /remove #<number>"),
                None => OptionRef::Value(arg.to_string()),
            };
            let change = session.remove_option(target)?;
            if change.is_none() {
                println!("No such option: {}", arg);
            }
            Ok(change)
        }
        "/next" => {
            println!("Thinking of questions...");
            Ok(session.submit_inputs().await?)
        }
        "/answer" => answer(session, arg),
        "/decide" => {
            println!("Deciding...");
            Ok(session.submit_answers().await?)
        }
        "/show" => {
            print_dilemma(session.dilemma());
            Ok(Change::None)
        }
        "/json" => {
            println!("{}", serde_json::to_string_pretty(session.dilemma())?);
            Ok(Change::None)
        }
        "/restart" => Ok(session.restart()),
        _ => bail!("unknown command: {}. Try /help", cmd),
    }
}

/// Plain text means different things per stage
fn handle_plain(session: &mut DilemmaSession, line: &str) -> Result<Change> {
    match session.stage() {
        Stage::Input if session.dilemma().purpose.is_empty() => Ok(session.set_purpose(line)?),
        Stage::Input => add_options(session, line),
        Stage::Questions => answer(session, line),
        Stage::Final => {
            println!("Type /restart to decide something else.");
            Ok(Change::None)
        }
    }
}

/// Add each comma-separated entry as its own option
fn add_options(session: &mut DilemmaSession, list: &str) -> Result<Change> {
    let mut change = Change::None;
    for entry in list.split(',') {
        if !session.add_option(entry)?.is_none() {
            change = Change::Options;
        }
    }
    Ok(change)
}

/// `<question#> <choice#|choice text>`
fn answer(session: &mut DilemmaSession, arg: &str) -> Result<Change> {
    let (q, choice) = arg
        .split_once(' ')
        .map(|(q, c)| (q.trim(), c.trim()))
        .context("usage: <question#> <choice#> (e.g. \"1 2\")")?;

    let index: usize = q.parse().context("question number expected")?;
    let question = index
        .checked_sub(1)
        .and_then(|i| session.dilemma().questions.get(i))
        .cloned()
        .with_context(|| format!("no question #{}", index))?;

    let choice = resolve_choice(&question, choice)?;
    Ok(session.record_answer(&question.text, &choice)?)
}

/// Map user input onto one of the question's options
fn resolve_choice(question: &ClarificationQuestion, input: &str) -> Result<String> {
    if question.options.is_empty() {
        return Ok(input.to_string());
    }
    if let Ok(n) = input.parse::<usize>() {
        if let Some(option) = n.checked_sub(1).and_then(|i| question.options.get(i)) {
            return Ok(option.clone());
        }
    }
    if let Some(option) = question
        .options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(input))
    {
        return Ok(option.clone());
    }
    bail!(
        "choose one of: {}",
        question
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| format!("{}) {}", i + 1, o))
            .collect::<Vec<_>>()
            .join("  ")
    )
}

// ============================================================================
// Rendering
// ============================================================================

fn redraw(session: &DilemmaSession, change: Change) {
    let dilemma = session.dilemma();
    match change {
        Change::None | Change::Decision | Change::Questions => {}
        Change::Purpose => {
            println!("Deciding: {}", dilemma.purpose);
            if dilemma.options.is_empty() {
                println!("Now enter your options (comma-separated is fine).");
            }
        }
        Change::Options => print_options(&dilemma.options),
        Change::Answers => {
            let answered = dilemma.questions.len() - dilemma.unanswered().len();
            println!("Answered {}/{}", answered, dilemma.questions.len());
            if dilemma.unanswered().is_empty() {
                println!("All set. Type /decide for the result.");
            }
        }
        Change::Stage { to: Stage::Questions, .. } => {
            print_questions(&dilemma.questions, &dilemma.answers);
            if dilemma.questions.is_empty() {
                println!("No clarification needed. Type /decide for the result.");
            } else {
                println!("Answer with <question#> <choice#>, then /decide.");
            }
        }
        Change::Stage { to: Stage::Final, .. } => {
            if let Some(decision) = &dilemma.decision {
                print_decision(decision);
            }
            println!("Type /restart to decide something else.");
        }
        Change::Stage { .. } => {}
        Change::Reset => println!("What do you want to decide?"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <text>                  Set the question, then add options");
    println!("  /purpose <text>         Change the question");
    println!("  /add <a>, <b>           Add options");
    println!("  /remove <opt|#n>        Remove an option");
    println!("  /next                   Get clarification questions");
    println!("  <q#> <choice#>          Answer a question (or /answer)");
    println!("  /decide                 Get the decision");
    println!("  /show                   Show the current dilemma");
    println!("  /json                   Dump the dilemma as JSON");
    println!("  /restart                Start over");
    println!("  quit                    Exit");
}

fn print_options(options: &[String]) {
    if options.is_empty() {
        println!("No options yet.");
        return;
    }
    let tags: Vec<String> = options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("[{}] {}", i + 1, o))
        .collect();
    println!("Options: {}", tags.join("  "));
    if options.len() >= 2 {
        println!("Add more, or type /next for questions.");
    }
}

fn print_questions(questions: &[ClarificationQuestion], answers: &dilemmai::Answers) {
    for (i, q) in questions.iter().enumerate() {
        println!("\n{}. {}", i + 1, q.text);
        for (j, option) in q.options.iter().enumerate() {
            let marker = if answers.get(&q.text) == Some(option.as_str()) { "*" } else { " " };
            println!("  {}{}) {}", marker, j + 1, option);
        }
    }
    if !questions.is_empty() {
        println!();
    }
}

fn print_decision(decision: &dilemmai::Decision) {
    println!("\n┌──────────────────────────────────────────────────────────────┐");
    println!("│ DECISION                                                     │");
    println!("└──────────────────────────────────────────────────────────────┘");
    println!("  {}", decision.decision);
    println!("  {}", wrap_text(&decision.reason, 60, "  "));
    println!();
}

fn print_dilemma(dilemma: &Dilemma) {
    println!("Stage:    {}", dilemma.stage);
    println!(
        "Question: {}",
        if dilemma.purpose.is_empty() { "(not set)" } else { dilemma.purpose.as_str() }
    );
    print_options(&dilemma.options);
    if dilemma.stage != Stage::Input {
        print_questions(&dilemma.questions, &dilemma.answers);
    }
    if let Some(decision) = &dilemma.decision {
        print_decision(decision);
    }
}

/// Greedy word wrap; continuation lines start with `indent`
fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        match lines.last_mut() {
            Some(current) if current.len() + 1 + word.len() <= width => {
                current.push(' ');
                current.push_str(word);
            }
            _ => lines.push(word.to_string()),
        }
    }
    lines.join(&format!("\n{indent}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_keeps_unknown_dashed_args() {
        let args = argv(&["dilemmai", "decide", "Which mode?", "--json", "--verbose-mode", "quiet"]);
        assert_eq!(
            positional_args(&args),
            argv(&["decide", "Which mode?", "--verbose-mode", "quiet"])
        );
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("", 10, "  "), "");
        assert_eq!(wrap_text("short one", 10, "  "), "short one");
        assert_eq!(
            wrap_text("the quick brown fox jumps", 10, "> "),
            "the quick\n> brown fox\n> jumps"
        );
        assert_eq!(wrap_text("unbreakablewordhere ok", 5, ""), "unbreakablewordhere\nok");
    }
}
