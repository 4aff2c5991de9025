use clap::{Parser, Subcommand};
use fitfact::infrastructure::logging::init_logging;
use fitfact::infrastructure::services::AnswerSource;
use fitfact::AppConfig;

#[derive(Parser)]
#[command(name = "fitfact", about = "Evidence-grounded fitness Q&A engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question through the full pipeline
    Ask { question: String },
    /// Run one maintenance pass and print the report
    Maintain,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let cli = Cli::parse();
    let (engine, scheduler) = fitfact::build_engine(&config)?;

    match cli.command {
        Command::Ask { question } => {
            let response = engine.answer(&question).await?;

            println!("{}", response.answer.answer_text);
            println!();

            match response.source {
                AnswerSource::ExactCache => println!("(served from cache)"),
                AnswerSource::FuzzyCache { similarity } => {
                    println!("(served from cache, similarity {similarity:.2})")
                }
                AnswerSource::Generated { strategy, degraded } => {
                    let strategy = strategy.unwrap_or_else(|| "partial".to_string());
                    if degraded {
                        println!("(generated via {strategy}, limited evidence)");
                    } else {
                        println!("(generated via {strategy})");
                    }
                }
            }
            println!(
                "confidence {:.2}, {}ms",
                response.answer.confidence, response.query.latency_ms
            );
        }
        Command::Maintain => {
            let report = scheduler.run_once().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
