// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — trains / resumes / evaluates a VQA model
//   2. `ask`   — loads a checkpoint and answers one question

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use commands::{Commands, TrainArgs, AskArgs};

#[derive(Parser, Debug)]
#[command(
    name = "vqa-trainer",
    version = "0.1.0",
    about = "Train a visual question answering model on COCO VQA, then ask it questions."
)]
pub struct Cli {
    /// The subcommand to run (train or ask)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case; the CLI layer only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => Self::run_train(args),
            Commands::Ask(args)   => Self::run_ask(args),
        }
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting {} run on data in: {}", args.model, args.data_path);

        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Done. Checkpoint up to date.");
        Ok(())
    }

    fn run_ask(args: AskArgs) -> Result<()> {
        use crate::application::ask_use_case::AskUseCase;

        let use_case = AskUseCase::new(&args.checkpoint, args.device)?;
        let answers  = use_case.answer(Path::new(&args.image), &args.question, args.top_k)?;

        println!("\nQuestion: {}", args.question);
        for (rank, (answer, p)) in answers.iter().enumerate() {
            println!("{:>2}. {:<20} {:.3}", rank + 1, answer, p);
        }
        Ok(())
    }
}
