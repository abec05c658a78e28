//! Tests for checkpoint persistence: save/load round trips, resumption step,
//! and restoring a model's parameters exactly.

use pixelcnn_mnist::checkpoint::{load_checkpoint, save_checkpoint, Checkpoint};
use pixelcnn_mnist::config::PixelCnnConfig;
use pixelcnn_mnist::model::PixelCnn;
use pixelcnn_mnist::utils::SimpleRng;
use tempfile::TempDir;

fn tiny_config() -> PixelCnnConfig {
    PixelCnnConfig {
        hidden_dims: 4,
        recurrent_length: 1,
        out_hidden_dims: 4,
        out_recurrent_length: 1,
        ..Default::default()
    }
}

#[test]
fn test_save_load_round_trip() {
    let dir = TempDir::new().expect("temp dir");

    let mut rng = SimpleRng::new(3);
    let model = PixelCnn::new(&tiny_config(), 6, 6, 1, &mut rng);

    let ckpt = Checkpoint {
        step: 41,
        layers: model.export_state(),
        train_losses: vec![0.7, 0.6],
        test_losses: vec![0.71, 0.62],
    };
    let path = save_checkpoint(dir.path(), &ckpt).expect("save");
    assert!(path.exists());

    let loaded = load_checkpoint(dir.path())
        .expect("load")
        .expect("checkpoint present");
    assert_eq!(loaded.step, 41);
    assert_eq!(loaded.train_losses, vec![0.7, 0.6]);
    assert_eq!(loaded.layers.len(), model.num_layers());
    for (a, b) in loaded.layers.iter().zip(ckpt.layers.iter()) {
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.biases, b.biases);
    }
}

#[test]
fn test_load_from_empty_directory_is_none() {
    let dir = TempDir::new().expect("temp dir");
    assert!(load_checkpoint(dir.path()).expect("load").is_none());
}

#[test]
fn test_restored_model_reproduces_outputs() {
    let dir = TempDir::new().expect("temp dir");

    let mut rng = SimpleRng::new(13);
    let model = PixelCnn::new(&tiny_config(), 6, 6, 1, &mut rng);

    let ckpt = Checkpoint {
        step: 0,
        layers: model.export_state(),
        train_losses: Vec::new(),
        test_losses: Vec::new(),
    };
    save_checkpoint(dir.path(), &ckpt).expect("save");

    // A differently-initialized model restored from the snapshot must agree
    // with the original on every logit.
    let mut rng2 = SimpleRng::new(999);
    let mut restored = PixelCnn::new(&tiny_config(), 6, 6, 1, &mut rng2);
    let loaded = load_checkpoint(dir.path()).expect("load").expect("present");
    restored.import_state(&loaded.layers).expect("import");

    let input: Vec<f32> = (0..36).map(|i| (i % 2) as f32).collect();
    assert_eq!(
        model.forward(&input, 1).logits,
        restored.forward(&input, 1).logits
    );
}

#[test]
fn test_overwrite_keeps_latest_snapshot() {
    let dir = TempDir::new().expect("temp dir");

    let mut rng = SimpleRng::new(3);
    let model = PixelCnn::new(&tiny_config(), 6, 6, 1, &mut rng);

    for step in [10usize, 20] {
        let ckpt = Checkpoint {
            step,
            layers: model.export_state(),
            train_losses: Vec::new(),
            test_losses: Vec::new(),
        };
        save_checkpoint(dir.path(), &ckpt).expect("save");
    }

    let loaded = load_checkpoint(dir.path()).expect("load").expect("present");
    assert_eq!(loaded.step, 20);
}
