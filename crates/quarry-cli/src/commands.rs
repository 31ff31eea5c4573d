use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{bail, Result};
use quarry_core::config::CONFIG_FILE_NAME;
use quarry_core::research::{Clarification, ReportFormat, ResearchReport};
use quarry_core::{Config, ResearchRunner};
use tokio::sync::mpsc;

use crate::display;

/// Options for `quarry research`.
pub struct ResearchArgs {
    pub topic: String,
    pub no_questions: bool,
    pub answers: Vec<String>,
    pub output: Option<PathBuf>,
    pub format: ReportFormat,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    tracing::debug!(
        provider = %config.llm.provider,
        search = %config.search.provider,
        max_iterations = config.research.max_iterations,
        "configuration loaded"
    );
    Ok(config)
}

pub async fn research(config: &Config, args: ResearchArgs) -> Result<()> {
    let topic = args.topic.trim();
    if topic.is_empty() {
        bail!("Research topic must not be empty");
    }

    let runner = ResearchRunner::from_config(config)?;

    let clarifications = if args.no_questions {
        Vec::new()
    } else {
        let questions = ask_questions(&runner, topic).await;
        if args.answers.is_empty() {
            prompt_answers(&questions)?
        } else {
            pair_answers(questions, args.answers)
        }
    };

    let (sink, events) = mpsc::unbounded_channel();
    let feed = tokio::spawn(display::render_events(events));
    let outcome = runner.run(topic, &clarifications, sink).await;
    feed.await?;

    let report = ResearchReport::new(topic, &outcome.report, &outcome.findings)
        .with_usage(outcome.tokens_used, outcome.completed_steps);

    println!();
    println!("{}", report.to_markdown());

    if let Some(output) = args.output {
        let path = if output.is_dir() {
            output.join(report.file_name(args.format))
        } else {
            output
        };
        std::fs::write(&path, report.render(args.format))?;
        println!("Saved report to {}", path.display());
    }

    Ok(())
}

pub async fn questions(config: &Config, topic: &str) -> Result<()> {
    let runner = ResearchRunner::from_config(config)?;
    let questions = ask_questions(&runner, topic.trim()).await;

    if questions.is_empty() {
        println!("No clarifying questions generated.");
        return Ok(());
    }
    for (i, question) in questions.iter().enumerate() {
        println!("{}. {}", i + 1, question);
    }
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", CONFIG_FILE_NAME);
    }

    std::fs::write(path, Config::default_config_string())?;
    println!("Created {}", CONFIG_FILE_NAME);
    println!("Set OPENROUTER_API_KEY and EXA_API_KEY, or add api_key entries to the file.");
    Ok(())
}

async fn ask_questions(runner: &ResearchRunner, topic: &str) -> Vec<String> {
    let spinner = display::spinner("Generating clarifying questions");
    let questions = runner.generate_questions(topic).await;
    spinner.finish_and_clear();
    questions
}

/// Pairs `--answer` values with the generated questions in order.
fn pair_answers(questions: Vec<String>, answers: Vec<String>) -> Vec<Clarification> {
    if questions.len() != answers.len() {
        tracing::warn!(
            questions = questions.len(),
            answers = answers.len(),
            "answer count does not match the generated questions, unmatched entries are ignored"
        );
    }

    questions
        .into_iter()
        .zip(answers)
        .map(|(question, answer)| Clarification::new(question, answer))
        .collect()
}

/// Reads one answer per question from stdin. Blank answers are skipped.
fn prompt_answers(questions: &[String]) -> Result<Vec<Clarification>> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    println!("Answer a few questions to focus the research (leave blank to skip):\n");
    let stdin = io::stdin();
    let mut clarifications = Vec::new();

    for question in questions {
        print!("{}\n> ", question);
        io::stdout().flush()?;

        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer)? == 0 {
            break;
        }
        let answer = answer.trim();
        if !answer.is_empty() {
            clarifications.push(Clarification::new(question.as_str(), answer));
        }
    }
    println!();

    Ok(clarifications)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_answers_paired_in_order() {
        let pairs = pair_answers(strings(&["Scope?", "Depth?"]), strings(&["servers", "intro"]));
        assert_eq!(
            pairs,
            vec![
                Clarification::new("Scope?", "servers"),
                Clarification::new("Depth?", "intro"),
            ]
        );
    }

    #[test]
    fn test_extra_answers_ignored() {
        let pairs = pair_answers(strings(&["Scope?"]), strings(&["servers", "intro", "more"]));
        assert_eq!(pairs, vec![Clarification::new("Scope?", "servers")]);

        assert!(pair_answers(Vec::new(), strings(&["orphan"])).is_empty());
    }
}
