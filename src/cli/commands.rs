// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `ask`, and all their
// configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing or malformed args
//   - type conversion (string → usize, f64, ModelKind, ...)

use clap::{Args, Subcommand};

use crate::application::train_use_case::RunConfig;
use crate::ml::{backend::DeviceKind, model::ModelKind};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train (or evaluate) a VQA model on the COCO VQA splits
    Train(TrainArgs),

    /// Answer a question about an image using a trained checkpoint
    Ask(AskArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Architecture
    #[arg(long, value_enum, default_value = "simple")]
    pub model: ModelKind,

    /// Summary sub-directory under --runs-dir [default: the model name]
    #[arg(long)]
    pub tensorboard_dir: Option<String>,

    /// Checkpoint directory [default: <model>_ckpt]
    #[arg(long, alias = "ckpnt")]
    pub checkpoint: Option<String>,

    /// Prefix of train2014/, val2014/ and the question / annotation JSON files
    #[arg(long, default_value = "./")]
    pub data_path: String,

    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 5e-4)]
    pub lr: f64,

    /// Only run a validation pass with the checkpointed model
    #[arg(long)]
    pub eval: bool,

    /// Tensor backend
    #[arg(long, value_enum, default_value = "wgpu")]
    pub device: DeviceKind,

    /// Images are resized to image_size × image_size
    #[arg(long, default_value_t = 224)]
    pub image_size: u32,

    /// Most frequent answers kept as classes; everything else is "Other"
    #[arg(long, default_value_t = 5216)]
    pub num_answers: usize,

    #[arg(long, default_value_t = 10_000)]
    pub question_vocab_size: usize,

    /// Question length in tokens, [CLS] included
    #[arg(long, default_value_t = 24)]
    pub max_question_len: usize,

    /// DataLoader worker threads
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,

    /// Shuffle seed of the training loader
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value = "runs")]
    pub runs_dir: String,
}

/// Convert CLI TrainArgs into the application-layer RunConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for RunConfig {
    fn from(a: TrainArgs) -> Self {
        let model = a.model.to_string();
        RunConfig {
            model:               a.model,
            data_path:           a.data_path,
            run_name:            a.tensorboard_dir.unwrap_or_else(|| model.clone()),
            runs_dir:            a.runs_dir,
            checkpoint:          a.checkpoint.unwrap_or_else(|| format!("{model}_ckpt")),
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            lr:                  a.lr,
            eval:                a.eval,
            device:              a.device,
            image_size:          a.image_size,
            num_answers:         a.num_answers,
            question_vocab_size: a.question_vocab_size,
            max_question_len:    a.max_question_len,
            num_workers:         a.num_workers,
            seed:                a.seed,
        }
    }
}

/// All arguments for the `ask` command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Image file to ask about
    #[arg(long)]
    pub image: String,

    /// The natural language question to answer
    #[arg(long)]
    pub question: String,

    /// Checkpoint directory written by `train`
    #[arg(long, default_value = "simple_ckpt")]
    pub checkpoint: String,

    /// Number of ranked answers to print
    #[arg(long, default_value_t = 5)]
    pub top_k: usize,

    #[arg(long, value_enum, default_value = "wgpu")]
    pub device: DeviceKind,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn train_config(args: &[&str]) -> RunConfig {
        let mut argv = vec!["vqa-trainer", "train"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Train(a) => a.into(),
            Commands::Ask(_)   => panic!("expected train"),
        }
    }

    #[test]
    fn test_defaults_follow_model_name() {
        let cfg = train_config(&["--model", "transformer"]);
        assert_eq!(cfg.model, ModelKind::Transformer);
        assert_eq!(cfg.run_name, "transformer");
        assert_eq!(cfg.checkpoint, "transformer_ckpt");
        assert_eq!(cfg.batch_size, 256);
        assert_eq!(cfg.epochs, 10);
        assert!((cfg.lr - 5e-4).abs() < 1e-12);
        assert!(!cfg.eval);
    }

    #[test]
    fn test_explicit_paths_and_eval() {
        let cfg = train_config(&[
            "--tensorboard-dir", "exp", "--ckpnt", "best", "--eval",
            "--device", "cpu", "--data-path", "/data/",
        ]);
        assert_eq!(cfg.model, ModelKind::Simple);
        assert_eq!(cfg.run_name, "exp");
        assert_eq!(cfg.checkpoint, "best");
        assert_eq!(cfg.device, DeviceKind::Cpu);
        assert_eq!(cfg.data_path, "/data/");
        assert!(cfg.eval);
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let err = Cli::try_parse_from(["vqa-trainer", "train", "--model", "resnet"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("invalid value 'resnet'"), "{msg}");
        assert!(msg.contains("simple") && msg.contains("transformer"), "{msg}");
    }

    #[test]
    fn test_gpu_is_an_alias_for_wgpu() {
        let cli = Cli::try_parse_from(["vqa-trainer", "ask", "--image", "a.jpg", "--question", "q?", "--device", "gpu"]).unwrap();
        match cli.command {
            Commands::Ask(args) => assert_eq!(args.device, DeviceKind::Wgpu),
            other => panic!("expected ask, got {other:?}"),
        }
    }
}
