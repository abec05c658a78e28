// mnist_pixelcnn.rs
// PixelCNN on binarized MNIST, CPU-only, trained with RMSProp + gradient
// clipping; after training, samples images pixel-by-pixel and completes
// occluded test images.
//
// Expected files:
//   <data_dir>/train-images.idx3-ubyte
//   <data_dir>/t10k-images.idx3-ubyte
//
// Output:
//   - <log_dir>/training_loss_pixelcnn.txt (step,train_loss,test_loss)
//   - <log_dir>/pixelcnn.ckpt (resumable snapshot)
//   - <sample_dir>/sample_<step>.png, <sample_dir>/occlusion_<step>.png

use pixelcnn_mnist::checkpoint::{load_checkpoint, save_checkpoint, Checkpoint};
use pixelcnn_mnist::config::{load_config, PixelCnnConfig};
use pixelcnn_mnist::dataset::{MnistData, Split, MNIST_H, MNIST_W};
use pixelcnn_mnist::generate::{generate, generate_occlusions};
use pixelcnn_mnist::loss::{sigmoid_cross_entropy_grad, sigmoid_cross_entropy_with_logits};
use pixelcnn_mnist::model::PixelCnn;
use pixelcnn_mnist::utils::{save_image_grid, SimpleRng};
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process;
use std::time::Instant;

const DEFAULT_CONFIG: &str = "config/pixelcnn_mnist.json";

fn main() {
    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = load_config(&config_path).unwrap_or_else(|e| {
        eprintln!("Could not load config {}: {}", config_path, e);
        process::exit(1);
    });

    let policy = config.binarization_policy();
    let mut rng = SimpleRng::new(config.random_seed);
    if config.random_seed == 0 {
        // Seed 0 requests a nondeterministic run.
        rng.reseed_from_time();
    }

    println!("Loading MNIST from {}...", config.data_dir);
    let data_dir = Path::new(&config.data_dir);
    let mut train = MnistData::load(data_dir, Split::Train, policy, &mut rng)
        .unwrap_or_else(|e| {
            eprintln!("{}", e);
            process::exit(1);
        });
    let mut test = MnistData::load(data_dir, Split::Test, policy, &mut rng).unwrap_or_else(|e| {
        eprintln!("{}", e);
        process::exit(1);
    });
    println!("Train: {} | Test: {}", train.count(), test.count());

    let mut model = PixelCnn::new(&config, MNIST_H, MNIST_W, 1, &mut rng);
    println!(
        "PixelCNN: {} layers, {} parameters{}",
        model.num_layers(),
        model.parameter_count(),
        if config.use_gpu {
            " (use_gpu ignored: CPU-only build)"
        } else {
            ""
        }
    );

    // Resume from the latest snapshot if one exists.
    let log_dir = Path::new(&config.log_dir);
    let mut start_step = 0usize;
    let mut train_losses: Vec<f32> = Vec::new();
    let mut test_losses: Vec<f32> = Vec::new();
    match load_checkpoint(log_dir) {
        Ok(Some(ckpt)) => {
            model.import_state(&ckpt.layers).unwrap_or_else(|e| {
                eprintln!("Checkpoint does not match this model: {}", e);
                process::exit(1);
            });
            start_step = ckpt.step + 1;
            train_losses = ckpt.train_losses;
            test_losses = ckpt.test_losses;
            println!("Resumed from step {}", ckpt.step);
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Could not read checkpoint: {}", e);
            process::exit(1);
        }
    }

    if config.is_train {
        train_model(
            &config,
            &mut model,
            &mut train,
            &mut test,
            &mut rng,
            start_step,
            &mut train_losses,
            &mut test_losses,
        );
    }

    write_samples(&config, &model, &mut test, &mut rng, config.max_step);
}

#[allow(clippy::too_many_arguments)]
fn train_model(
    config: &PixelCnnConfig,
    model: &mut PixelCnn,
    train: &mut MnistData,
    test: &mut MnistData,
    rng: &mut SimpleRng,
    start_step: usize,
    train_losses: &mut Vec<f32>,
    test_losses: &mut Vec<f32>,
) {
    let image_size = MNIST_H * MNIST_W;
    let batch = config.batch_size;

    let log_dir = Path::new(&config.log_dir);
    fs::create_dir_all(log_dir).ok();
    let log_file = File::create(log_dir.join("training_loss_pixelcnn.txt")).unwrap_or_else(|_| {
        eprintln!("Could not create the training log file");
        process::exit(1);
    });
    let mut log = BufWriter::new(log_file);

    let mut optimizers = model.make_optimizers(config.learning_rate);

    // Training buffers (reused each step to avoid allocations).
    let mut batch_inputs = vec![0.0f32; batch * image_size];
    let mut grad_logits = vec![0.0f32; batch * image_size];

    println!(
        "Training: steps {}..{} batch={} lr={} grad_clip={}",
        start_step, config.max_step, batch, config.learning_rate, config.grad_clip
    );

    let mut interval_loss = 0.0f32;
    let mut interval_steps = 0usize;

    for step in start_step..config.max_step {
        let start_time = Instant::now();
        train.next_batch(batch, rng, &mut batch_inputs);

        // Forward, loss, gradient at the logits.
        let output = model.forward(&batch_inputs, batch);
        let loss = sigmoid_cross_entropy_with_logits(&output.logits, &batch_inputs);
        sigmoid_cross_entropy_grad(&output.logits, &batch_inputs, &mut grad_logits);

        // Backward, then clip-and-apply through RMSProp.
        model.backward(&batch_inputs, &output, &grad_logits, batch);
        model.apply_gradients(&mut optimizers, config.grad_clip);

        interval_loss += loss;
        interval_steps += 1;

        if config.display {
            println!(
                "step {} | loss={:.6} | time={:.3}s",
                step,
                loss,
                start_time.elapsed().as_secs_f32()
            );
        }

        if (step + 1) % config.test_step == 0 {
            let avg_train = interval_loss / interval_steps as f32;
            let avg_test = evaluate_loss(model, test, batch, rng);
            interval_loss = 0.0;
            interval_steps = 0;

            train_losses.push(avg_train);
            test_losses.push(avg_test);

            println!(
                "step {} | train_loss={:.6} | test_loss={:.6}",
                step, avg_train, avg_test
            );
            writeln!(log, "{},{},{}", step, avg_train, avg_test).ok();
        }

        if (step + 1) % config.save_step == 0 {
            let ckpt = Checkpoint {
                step,
                layers: model.export_state(),
                train_losses: train_losses.clone(),
                test_losses: test_losses.clone(),
            };
            match save_checkpoint(log_dir, &ckpt) {
                Ok(path) => println!("Saved checkpoint to {}", path.display()),
                Err(e) => eprintln!("Could not save checkpoint: {}", e),
            }
        }
    }
}

// Average test loss over full batches of the test split.
fn evaluate_loss(model: &PixelCnn, test: &mut MnistData, batch: usize, rng: &mut SimpleRng) -> f32 {
    let image_size = MNIST_H * MNIST_W;
    let num_batches = (test.count() / batch).max(1);
    let mut batch_inputs = vec![0.0f32; batch * image_size];

    let mut total = 0.0f32;
    for _ in 0..num_batches {
        test.next_batch(batch, rng, &mut batch_inputs);
        let output = model.forward(&batch_inputs, batch);
        total += sigmoid_cross_entropy_with_logits(&output.logits, &batch_inputs);
    }
    total / num_batches as f32
}

// Sample a fresh batch and complete occluded test images; both go to the
// sample directory as thumbnail grids.
fn write_samples(
    config: &PixelCnnConfig,
    model: &PixelCnn,
    test: &mut MnistData,
    rng: &mut SimpleRng,
    step: usize,
) {
    let policy = config.binarization_policy();
    let n = config.batch_size;
    let grid_cols = (n as f32).sqrt().ceil() as usize;
    let grid_rows = (n + grid_cols - 1) / grid_cols;

    let sample_dir = Path::new(&config.sample_dir);
    fs::create_dir_all(sample_dir).ok();

    println!("Generating {} samples ({} forward passes)...", n, MNIST_H * MNIST_W);
    let samples = generate(model, n, MNIST_H, MNIST_W, policy, rng);
    let path = sample_dir.join(format!("sample_{}.png", step));
    match save_image_grid(&samples, n, MNIST_H, MNIST_W, grid_rows, grid_cols, &path) {
        Ok(p) => println!("Wrote {}", p.display()),
        Err(e) => eprintln!("Could not write sample grid: {}", e),
    }

    println!("Completing occluded test images...");
    let seeds = test.first_images(n);
    let completed = generate_occlusions(model, seeds, n, MNIST_H, MNIST_W, policy, rng);
    let path = sample_dir.join(format!("occlusion_{}.png", step));
    match save_image_grid(&completed, n, MNIST_H, MNIST_W, grid_rows, grid_cols, &path) {
        Ok(p) => println!("Wrote {}", p.display()),
        Err(e) => eprintln!("Could not write occlusion grid: {}", e),
    }
}
