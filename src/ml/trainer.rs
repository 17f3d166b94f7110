// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam.
//
//   - Training runs on B (Autodiff<...>) for gradients
//   - model.valid() returns the model on B::InnerBackend, so the
//     validation batcher also produces InnerBackend tensors
//   - Loss is BCE with logits against the multi-hot answer tensor
//   - A prediction counts as correct when its argmax is ANY of the
//     ground-truth answers (see stats.rs)
//   - The train loader is rebuilt every epoch over a seeded global
//     shuffle cut to whole batches (drop_last); Burn's worker split
//     would otherwise leave one partial batch per worker
//
// Resume rules:
//   - a checkpoint restores weights, Adam state, epoch and best_acc
//   - `--eval`, or a checkpoint already past `epochs`, runs a single
//     validation pass and stops
//   - after each epoch: val_acc >= best → full save with epoch + 1,
//     otherwise only the stored epoch counter moves forward

use anyhow::Result;
use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::transform::{PartialDataset, ShuffledDataset},
    },
    module::AutodiffModule,
    nn::loss::BinaryCrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::sync::Arc;

use crate::application::train_use_case::RunConfig;
use crate::data::{
    batcher::{VqaBatch, VqaBatcher},
    dataset::{VqaDataset, VqaItem},
    preprocessor::ImagePreprocessor,
};
use crate::domain::answer_vocab::AnswerVocab;
use crate::infra::{
    checkpoint::{CheckpointManager, TrainingState},
    metrics::{EpochMetrics, MetricsLogger},
    summary::SummaryWriter,
};
use crate::ml::{
    baseline::{BaselineNet, BaselineNetConfig},
    model::{ModelKind, VqaModel},
    stats::{score_batch, PassStats},
    transformer::{TransformerNet, TransformerNetConfig},
};

/// Validation images / questions written to the summaries per epoch
const SHOWN_EXAMPLES: usize = 3;
/// Most frequent predictions printed after each pass
const TOP_PREDICTIONS: usize = 10;

// ── Adam optimiser ────────────────────────────────────────────────────────────
// m = β1*m + (1-β1)*g        (β1 = 0: no momentum)
// v = β2*v + (1-β2)*g²
// θ = θ - lr * m / (√v + ε)
pub fn optimizer_config() -> AdamConfig {
    AdamConfig::new()
        .with_beta_1(0.0)
        .with_beta_2(0.9)
        .with_epsilon(1e-8)
}

pub fn baseline_config(question_vocab: usize, num_classes: usize) -> BaselineNetConfig {
    BaselineNetConfig::new(question_vocab, num_classes)
}

pub fn transformer_config(
    question_vocab:   usize,
    num_classes:      usize,
    max_question_len: usize,
) -> TransformerNetConfig {
    TransformerNetConfig::new(question_vocab, num_classes, max_question_len)
}

/// Build the model named by `cfg.model` and run the full loop on `B`.
pub fn run_training<B: AutodiffBackend>(
    cfg:           &RunConfig,
    train_dataset: VqaDataset,
    val_dataset:   VqaDataset,
    ckpt_manager:  CheckpointManager,
    device:        B::Device,
) -> Result<()> {
    let question_vocab = train_dataset.question_vocab_size();
    let num_classes    = train_dataset.answer_vocab().num_classes();

    let mut trainer = Trainer::<B>::new(cfg, train_dataset, val_dataset, ckpt_manager, device.clone())?;

    match cfg.model {
        ModelKind::Simple => {
            let model: BaselineNet<B> = baseline_config(question_vocab, num_classes).init(&device);
            tracing::info!("Model ready: simple, {} parameters", model.num_params());
            let optim = optimizer_config().init::<B, BaselineNet<B>>();
            trainer.run(model, optim)?;
        }
        ModelKind::Transformer => {
            let model: TransformerNet<B> =
                transformer_config(question_vocab, num_classes, cfg.max_question_len).init(&device);
            tracing::info!("Model ready: transformer, {} parameters", model.num_params());
            let optim = optimizer_config().init::<B, TransformerNet<B>>();
            trainer.run(model, optim)?;
        }
    }

    tracing::info!("Training complete!");
    Ok(())
}

/// Burn hands each worker a contiguous slice of `len / workers`
/// items; using a worker count that divides the batch count keeps
/// every slice a whole number of batches.
fn train_workers(num_batches: usize, requested: usize) -> usize {
    (1..=requested.min(num_batches).max(1))
        .rev()
        .find(|w| num_batches % w == 0)
        .unwrap_or(1)
}

pub struct Trainer<B: AutodiffBackend> {
    cfg:           RunConfig,
    device:        B::Device,
    answers:       Arc<AnswerVocab>,
    train_dataset: Arc<VqaDataset>,
    train_batcher: VqaBatcher<B>,
    val_loader:    Arc<dyn DataLoader<VqaBatch<B::InnerBackend>>>,
    train_batches: usize,
    val_batches:   usize,
    checkpoint:    CheckpointManager,
    writer:        SummaryWriter,
    metrics:       MetricsLogger,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(
        cfg:           &RunConfig,
        train_dataset: VqaDataset,
        val_dataset:   VqaDataset,
        checkpoint:    CheckpointManager,
        device:        B::Device,
    ) -> Result<Self> {
        let answers      = train_dataset.answer_vocab().clone();
        let preprocessor = ImagePreprocessor::new(cfg.image_size);
        let batch_size   = cfg.batch_size.max(1);

        // Training drops the trailing partial batch
        let train_batches = train_dataset.sample_count() / batch_size;
        let val_batches   = val_dataset.sample_count().div_ceil(batch_size);

        // ── Training batcher (AutodiffBackend); loader built per epoch ────────
        let train_batcher = VqaBatcher::<B>::new(device.clone(), preprocessor, answers.clone());

        // ── Validation data loader (InnerBackend — no autodiff overhead) ──────
        let val_batcher = VqaBatcher::<B::InnerBackend>::new(device.clone(), preprocessor, answers.clone());
        let val_builder = DataLoaderBuilder::new(val_batcher).batch_size(batch_size);
        let val_loader  = if cfg.num_workers > 0 {
            val_builder.num_workers(cfg.num_workers).build(val_dataset)
        } else {
            val_builder.build(val_dataset)
        };

        let writer  = SummaryWriter::new(cfg.summary_dir())?;
        let metrics = MetricsLogger::new(cfg.summary_dir())?;

        Ok(Self {
            cfg: cfg.clone(),
            device,
            answers,
            train_dataset: Arc::new(train_dataset),
            train_batcher,
            val_loader,
            train_batches,
            val_batches,
            checkpoint,
            writer,
            metrics,
        })
    }

    pub fn run<M, O>(&mut self, model: M, optim: O) -> Result<M>
    where
        M: AutodiffModule<B> + VqaModel<B>,
        <M as AutodiffModule<B>>::InnerModule: VqaModel<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        let mut model       = model;
        let mut optim       = optim;
        let mut start_epoch = 0;
        let mut best_acc    = -1.0;

        if self.checkpoint.exists() {
            let (m, o, state) = self
                .checkpoint
                .load::<B, M, O>(self.cfg.model, model, optim, &self.device)?;
            model       = m;
            optim       = o;
            start_epoch = state.epoch;
            best_acc    = state.best_acc;
        }

        // ── Evaluation only ───────────────────────────────────────────────────
        if self.cfg.eval || start_epoch >= self.cfg.epochs {
            tracing::info!("Evaluating checkpoint (epoch {})", start_epoch);
            let stats = self.eval_pass(&model.valid(), start_epoch)?;
            println!(
                "Evaluation | val_loss={:.4} | val_acc={:.1}%",
                stats.mean_loss(), stats.accuracy() * 100.0,
            );
            self.writer.flush()?;
            return Ok(model);
        }

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in start_epoch..self.cfg.epochs {
            println!("Epoch: {}/{}", epoch + 1, self.cfg.epochs);

            let (trained, train_stats) = self.train_pass(model, &mut optim, epoch)?;
            model = trained;

            // model.valid() drops autodiff and puts dropout / batch norm
            // into inference mode
            println!("\nValidation");
            let val_stats = self.eval_pass(&model.valid(), epoch)?;

            let row = EpochMetrics::new(
                epoch + 1,
                train_stats.mean_loss(),
                train_stats.accuracy(),
                val_stats.mean_loss(),
                val_stats.accuracy(),
            );
            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
                row.epoch, self.cfg.epochs,
                row.train_loss, row.train_acc * 100.0,
                row.val_loss,   row.val_acc * 100.0,
            );
            self.metrics.log(&row)?;

            if row.is_improvement(best_acc) {
                println!("Saving Checkpoint");
                let state = TrainingState {
                    epoch:    epoch + 1,
                    best_acc: row.val_acc,
                    model:    self.cfg.model,
                };
                self.checkpoint.save::<B, M, O>(&model, &optim, &state)?;
                best_acc = row.val_acc;
            } else {
                println!("Updating Checkpoint");
                self.checkpoint.bump_epoch()?;
            }
            self.writer.flush()?;
        }

        Ok(model)
    }

    fn train_pass<M, O>(&mut self, model: M, optim: &mut O, epoch: usize) -> Result<(M, PassStats)>
    where
        M: AutodiffModule<B> + VqaModel<B>,
        O: Optimizer<M, B>,
    {
        let loss_fn = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&self.device);
        let loader    = self.train_loader(epoch);
        let mut model = model;
        let mut stats = PassStats::new();

        for (step, batch) in loader.iter().enumerate() {
            let scores = model.forward(batch.images, batch.questions, batch.padding_mask);
            let loss   = loss_fn.forward(scores.clone(), batch.answers.clone());
            let (hits, preds) = score_batch(scores, batch.answers);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(self.cfg.lr, model, grads);

            stats.record(loss_val, hits, &preds);
            let global = epoch * self.train_batches + step;
            self.writer.add_scalar("Loss/train", loss_val, global)?;
            self.writer.add_scalar("Acc/train", stats.accuracy(), global)?;
        }

        self.finish_pass("train", &stats)?;
        Ok((model, stats))
    }

    /// Loader over this epoch's shuffle of the training set, holding
    /// only `train_batches` full batches.
    fn train_loader(&self, epoch: usize) -> Arc<dyn DataLoader<VqaBatch<B>>> {
        let batch_size = self.cfg.batch_size.max(1);
        let shuffled   = ShuffledDataset::<Arc<VqaDataset>, VqaItem>::with_seed(
            self.train_dataset.clone(),
            self.cfg.seed.wrapping_add(epoch as u64),
        );
        let full_batches = PartialDataset::<_, VqaItem>::new(
            shuffled, 0, self.train_batches * batch_size,
        );

        let builder = DataLoaderBuilder::new(self.train_batcher.clone()).batch_size(batch_size);
        match train_workers(self.train_batches, self.cfg.num_workers) {
            0 | 1   => builder.build(full_batches),
            workers => builder.num_workers(workers).build(full_batches),
        }
    }

    fn eval_pass<V>(&mut self, model: &V, epoch: usize) -> Result<PassStats>
    where
        V: VqaModel<B::InnerBackend>,
    {
        let loss_fn = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init::<B::InnerBackend>(&self.device);
        let loader    = self.val_loader.clone();
        let mut stats = PassStats::new();

        for (step, batch) in loader.iter().enumerate() {
            let scores = model.forward(
                batch.images.clone(),
                batch.questions.clone(),
                batch.padding_mask.clone(),
            );
            let loss = loss_fn.forward(scores.clone(), batch.answers.clone());
            let (hits, preds) = score_batch(scores, batch.answers.clone());

            let loss_val: f64 = loss.into_scalar().elem::<f64>();
            stats.record(loss_val, hits, &preds);

            let global = epoch * self.val_batches + step;
            self.writer.add_scalar("Loss/val", loss_val, global)?;
            self.writer.add_scalar("Acc/val", stats.accuracy(), global)?;

            if step == 0 {
                self.log_examples(&batch, &preds, epoch)?;
            }
        }

        self.finish_pass("val", &stats)?;
        Ok(stats)
    }

    /// Image, question, first ground-truth answer and prediction of
    /// the first few validation samples.
    fn log_examples(
        &mut self,
        batch: &VqaBatch<B::InnerBackend>,
        preds: &[usize],
        epoch: usize,
    ) -> Result<()> {
        let shown = SHOWN_EXAMPLES.min(batch.len());
        for i in 0..shown {
            let step = epoch * SHOWN_EXAMPLES + i;
            let gt   = batch.answer_ids[i]
                .first()
                .map(|&id| self.answers.answer(id).to_string())
                .unwrap_or_else(|| "<none>".to_string());
            let predicted = self.answers.answer(preds[i]).to_string();

            self.writer.add_image(&format!("Image{i}"), &batch.originals[i], step)?;
            self.writer.add_text(&format!("Question{i}"), &batch.question_text[i], step)?;
            self.writer.add_text(&format!("GT Answer{i}"), &gt, step)?;
            self.writer.add_text(&format!("Predicted Answer{i}"), &predicted, step)?;
        }
        Ok(())
    }

    fn finish_pass(&mut self, mode: &str, stats: &PassStats) -> Result<()> {
        let top: Vec<&str> = stats
            .top_predictions(TOP_PREDICTIONS)
            .into_iter()
            .map(|id| self.answers.answer(id))
            .collect();
        println!("{:?}", top);

        let histogram: Vec<(String, usize)> = stats
            .histogram()
            .into_iter()
            .map(|(id, n)| (self.answers.answer(id).to_string(), n))
            .collect();
        let path = self.writer.write_histogram(mode, &histogram)?;
        tracing::debug!("Prediction histogram written to '{}'", path.display());

        println!("{:.4}", stats.accuracy());
        tracing::info!(
            "{} pass: {} samples, loss={:.4}, acc={:.4}",
            mode, stats.samples(), stats.mean_loss(), stats.accuracy()
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::VqaRecord;
    use crate::infra::tokenizer_store::{QuestionTokenizer, TokenizerStore};
    use crate::ml::backend::DeviceKind;
    use burn::{
        backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
        data::dataloader::batcher::Batcher,
    };
    use image::RgbImage;
    use std::fs;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn vocab() -> Arc<AnswerVocab> {
        Arc::new(AnswerVocab::new(vec!["yes".into(), "no".into()]))
    }

    fn item(tokens: Vec<u32>, answers: Vec<usize>) -> VqaItem {
        VqaItem {
            question_id: 0,
            question:    "q".to_string(),
            token_ids:   tokens,
            answer_ids:  answers,
            image:       RgbImage::new(8, 8),
        }
    }

    #[test]
    fn test_loss_decreases_on_fixed_batch() {
        let device  = NdArrayDevice::Cpu;
        let batcher = VqaBatcher::<TestBackend>::new(device, ImagePreprocessor::new(8), vocab());
        let batch   = batcher.batch(vec![
            item(vec![2, 3, 4], vec![0]),
            item(vec![2, 5],    vec![1]),
            item(vec![2, 6, 7], vec![0, 2]),
            item(vec![2, 8],    vec![1]),
        ]);

        let mut model: BaselineNet<TestBackend> = BaselineNetConfig::new(10, 3)
            .with_base_channels(4)
            .with_word_dim(8)
            .with_hidden_dim(16)
            .with_dropout(0.0)
            .init(&device);
        let mut optim = optimizer_config().init::<TestBackend, BaselineNet<TestBackend>>();
        let loss_fn   = BinaryCrossEntropyLossConfig::new().with_logits(true).init(&device);

        let mut losses = Vec::new();
        for _ in 0..30 {
            let scores = model.forward(
                batch.images.clone(),
                batch.questions.clone(),
                batch.padding_mask.clone(),
            );
            let loss = loss_fn.forward(scores, batch.answers.clone());
            losses.push(loss.clone().into_scalar().elem::<f64>());

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(1e-2, model, grads);
        }

        let first = losses[0];
        let last  = *losses.last().unwrap();
        assert!(last < first, "loss did not decrease: {first} -> {last}");
    }

    fn record(i: usize, answers: &[&str]) -> VqaRecord {
        VqaRecord::new(
            i as u64, i as u64,
            format!("is there a cat number {i}?"),
            answers.iter().map(|a| a.to_string()).collect(),
            // missing file → blank image
            format!("/nonexistent/{i}.jpg"),
        )
    }

    fn records(n: usize) -> Vec<VqaRecord> {
        (0..n)
            .map(|i| record(i, &[if i % 2 == 0 { "yes" } else { "no" }]))
            .collect()
    }

    fn tiny_config(root: &std::path::Path, batch_size: usize, num_workers: usize, epochs: usize) -> RunConfig {
        RunConfig {
            checkpoint:  root.join("ckpt").display().to_string(),
            runs_dir:    root.join("runs").display().to_string(),
            run_name:    "tiny".to_string(),
            batch_size,
            epochs,
            device:      DeviceKind::Cpu,
            image_size:  8,
            num_workers,
            ..RunConfig::default()
        }
    }

    fn run_with(cfg: &RunConfig, train: Vec<VqaRecord>, val: Vec<VqaRecord>) {
        let ckpt = CheckpointManager::new(&cfg.checkpoint);
        let questions: Vec<&str> = train.iter().map(|r| r.question.as_str()).collect();
        let tok = TokenizerStore::new(ckpt.dir()).load_or_build(&questions, 50).unwrap();
        let tok = QuestionTokenizer::new(tok, cfg.max_question_len);
        let pre = ImagePreprocessor::new(cfg.image_size);
        let train = VqaDataset::new(train, tok.clone(), vocab(), pre);
        let val   = VqaDataset::new(val, tok, vocab(), pre);
        run_training::<TestBackend>(cfg, train, val, ckpt, Default::default()).unwrap();
    }

    fn run(cfg: &RunConfig) {
        run_with(cfg, records(4), records(3));
    }

    fn scalar_rows(cfg: &RunConfig, tag: &str) -> Vec<String> {
        fs::read_to_string(cfg.summary_dir().join("scalars.csv"))
            .unwrap()
            .lines()
            .filter(|l| l.starts_with(&format!("{tag},")))
            .map(String::from)
            .collect()
    }

    fn text_entries(cfg: &RunConfig) -> Vec<(String, usize, String)> {
        fs::read_to_string(cfg.summary_dir().join("text.jsonl"))
            .unwrap()
            .lines()
            .map(|l| {
                let v: serde_json::Value = serde_json::from_str(l).unwrap();
                (
                    v["tag"].as_str().unwrap().to_string(),
                    v["step"].as_u64().unwrap() as usize,
                    v["text"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_train_workers_divide_batch_count() {
        assert_eq!(train_workers(4, 4), 4);
        assert_eq!(train_workers(6, 4), 3);
        assert_eq!(train_workers(7, 4), 1);
        assert_eq!(train_workers(1, 4), 1);
        assert_eq!(train_workers(0, 4), 1);
        assert_eq!(train_workers(5, 0), 1);
    }

    #[test]
    fn test_only_full_batches_are_trained_with_several_workers() {
        // 4 samples, batch 3: one full batch, the remainder is dropped
        let tmp = tempfile::tempdir().unwrap();
        let cfg = tiny_config(tmp.path(), 3, 2, 1);
        run_with(&cfg, records(4), records(2));
        assert_eq!(scalar_rows(&cfg, "Loss/train").len(), 1);

        // 7 samples, batch 3, 2 workers: two full batches
        let tmp = tempfile::tempdir().unwrap();
        let cfg = tiny_config(tmp.path(), 3, 2, 1);
        run_with(&cfg, records(7), records(2));
        let rows = scalar_rows(&cfg, "Loss/train");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.starts_with("Loss/train,0,")));
        assert!(rows.iter().any(|r| r.starts_with("Loss/train,1,")));
    }

    #[test]
    fn test_train_resume_and_evaluate() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(tmp.path(), 2, 1, 2);

        run(&cfg);
        let ckpt  = CheckpointManager::new(&cfg.checkpoint);
        let state = ckpt.load_state().unwrap();
        assert_eq!(state.epoch, 2);
        assert_eq!(state.model, ModelKind::Simple);
        assert!((0.0..=1.0).contains(&state.best_acc));

        let metrics_csv = cfg.summary_dir().join("metrics.csv");
        assert_eq!(fs::read_to_string(&metrics_csv).unwrap().lines().count(), 3);
        assert!(cfg.summary_dir().join("histogram_val.csv").exists());
        assert!(cfg.summary_dir().join("images/Image0_0.png").exists());

        // already at `epochs`: one validation pass, no new epoch row
        run(&cfg);
        assert_eq!(ckpt.load_state().unwrap().epoch, 2);
        assert_eq!(fs::read_to_string(&metrics_csv).unwrap().lines().count(), 3);

        // one more epoch continues from the checkpoint
        cfg.epochs = 3;
        run(&cfg);
        assert_eq!(ckpt.load_state().unwrap().epoch, 3);
        assert_eq!(fs::read_to_string(&metrics_csv).unwrap().lines().count(), 4);
    }

    #[test]
    fn test_non_improving_epoch_keeps_best_weights() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(tmp.path(), 2, 1, 1);
        run(&cfg);

        // no accuracy can beat 2.0, so the next epoch must not save
        let ckpt = CheckpointManager::new(&cfg.checkpoint);
        let unreachable = TrainingState { epoch: 1, best_acc: 2.0, model: ModelKind::Simple };
        fs::write(
            ckpt.dir().join("state.json"),
            serde_json::to_string(&unreachable).unwrap(),
        )
        .unwrap();
        let weights = fs::read(ckpt.dir().join("model.mpk.gz")).unwrap();

        cfg.epochs = 2;
        run(&cfg);

        let state = ckpt.load_state().unwrap();
        assert_eq!(state.epoch, 2);
        assert_eq!(state.best_acc, 2.0);
        assert_eq!(fs::read(ckpt.dir().join("model.mpk.gz")).unwrap(), weights);
    }

    #[test]
    fn test_validation_examples_are_logged() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = tiny_config(tmp.path(), 2, 1, 1);
        // first validation batch: an unannotated question and a "no"
        let val = vec![record(0, &[]), record(1, &["no"]), record(2, &["yes"])];
        run_with(&cfg, records(4), val.clone());

        let entries = text_entries(&cfg);
        let at = |tag: &str, step: usize| at_step(&entries, tag, step);

        assert_eq!(at("Question0", 0).as_deref(), Some("is there a cat number 0?"));
        assert_eq!(at("GT Answer0", 0).as_deref(), Some("<none>"));
        assert_eq!(at("Question1", 1).as_deref(), Some("is there a cat number 1?"));
        assert_eq!(at("GT Answer1", 1).as_deref(), Some("no"));
        let predicted = at("Predicted Answer1", 1).unwrap();
        assert!(["yes", "no", "Other"].contains(&predicted.as_str()));
        // only two samples in the first batch
        assert!(entries.iter().all(|(t, _, _)| t != "Question2"));

        // evaluation-only rerun logs at epoch 1 → steps 3 and 4
        run_with(&cfg, records(4), val);
        assert_eq!(at_step(&text_entries(&cfg), "Question0", 3).as_deref(), Some("is there a cat number 0?"));
        assert!(cfg.summary_dir().join("images/Image1_4.png").exists());
    }

    fn at_step(entries: &[(String, usize, String)], tag: &str, step: usize) -> Option<String> {
        entries
            .iter()
            .find(|(t, s, _)| t == tag && *s == step)
            .map(|(_, _, text)| text.clone())
    }
}
